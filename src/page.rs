//! Assembles a complete HTML page for a [`Post`] from its [`Outline`]: the
//! document head, the page header, the optional table of contents, and the
//! article (intro followed by one `<section>` per chapter).

use std::fmt::{self, Write};

use crate::htmlrenderer;
use crate::inline::escape;
use crate::markdown::Outline;
use crate::post::{Post, DATE_FORMAT};
use crate::toc;

/// Applies the stored (or preferred) color theme before first paint.
const THEME_BOOTSTRAP: &str = concat!(
    "(function(){var t=null;try{t=localStorage.getItem(\"theme\");}catch(e){}",
    "if(t!==\"light\"&&t!==\"dark\"){t=window.matchMedia&&",
    "window.matchMedia(\"(prefers-color-scheme: dark)\").matches?\"dark\":\"light\";}",
    "document.documentElement.setAttribute(\"data-theme\",t);})();"
);

/// Flips the color theme and remembers the choice.
const THEME_TOGGLE: &str = concat!(
    "var r=document.documentElement,t=r.getAttribute('data-theme')==='dark'?'light':'dark';",
    "r.setAttribute('data-theme',t);try{localStorage.setItem('theme',t);}catch(e){}"
);

/// Site-wide values every page needs. Built once per build from
/// [`crate::config::Config`].
#[derive(Debug, Clone)]
pub struct Site {
    pub title: String,

    /// The `lang` attribute of every page.
    pub language: String,

    /// The path of the site root, e.g. `/` or `/notes/`. Used for the site
    /// link in the page header.
    pub root_path: String,

    /// Stylesheet hrefs, linked in order.
    pub stylesheets: Vec<String>,
}

/// Renders the page for `post`.
pub fn render(site: &Site, post: &Post, outline: &Outline) -> Result<String, fmt::Error> {
    let mut html = String::with_capacity(post.body.len() * 2 + 2048);
    push_html(&mut html, site, post, outline)?;
    Ok(html)
}

/// Writes the page for `post` into `w`.
pub fn push_html<W: Write>(w: &mut W, site: &Site, post: &Post, outline: &Outline) -> fmt::Result {
    on_head(w, site, post)?;
    w.write_str("<body>\n")?;
    on_header(w, site, post)?;
    w.write_str("<main class=\"page\">\n")?;
    if post.show_contents {
        toc::push_html(w, outline, post.number_chapters)?;
    }
    on_article(w, post, outline)?;
    w.write_str("</main>\n</body>\n</html>\n")
}

fn on_head<W: Write>(w: &mut W, site: &Site, post: &Post) -> fmt::Result {
    writeln!(w, "<!DOCTYPE html>\n<html lang=\"{}\">\n<head>", escape(&site.language))?;
    w.write_str("<meta charset=\"utf-8\">\n")?;
    w.write_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n")?;
    writeln!(w, "<title>{} | {}</title>", escape(&post.title), escape(&site.title))?;
    writeln!(w, "<meta name=\"description\" content=\"{}\">", escape(&post.description))?;
    writeln!(w, "<script>{}</script>", THEME_BOOTSTRAP)?;
    for href in &site.stylesheets {
        writeln!(w, "<link rel=\"stylesheet\" href=\"{}\">", escape(href))?;
    }
    w.write_str("</head>\n")
}

fn on_header<W: Write>(w: &mut W, site: &Site, post: &Post) -> fmt::Result {
    w.write_str("<header class=\"page-header\">\n<nav class=\"site-nav\">\n")?;
    writeln!(
        w,
        "<a class=\"site-link\" href=\"{}\">{}</a>",
        escape(&site.root_path),
        escape(&site.title)
    )?;
    writeln!(
        w,
        "<button class=\"theme-toggle\" type=\"button\" aria-label=\"Toggle color theme\" onclick=\"{}\">&#9680;</button>",
        THEME_TOGGLE
    )?;
    w.write_str("</nav>\n")?;
    writeln!(w, "<h1 class=\"page-title\">{}</h1>", escape(&post.title))?;
    writeln!(w, "<p class=\"page-description\">{}</p>", escape(&post.description))?;
    writeln!(
        w,
        "<time class=\"page-date\" datetime=\"{}\">{}</time>",
        post.date.format(DATE_FORMAT),
        post.formatted_date()
    )?;
    w.write_str("</header>\n")
}

fn on_article<W: Write>(w: &mut W, post: &Post, outline: &Outline) -> fmt::Result {
    w.write_str("<article class=\"post\">\n")?;
    htmlrenderer::push_html(w, &outline.intro)?;
    for (i, chapter) in outline.chapters.iter().enumerate() {
        writeln!(w, "<section class=\"chapter\" id=\"{}\">", chapter.anchor)?;
        writeln!(
            w,
            "<h2>{}</h2>",
            toc::chapter_label(i + 1, chapter, post.number_chapters)
        )?;
        htmlrenderer::push_html(w, &chapter.blocks)?;
        w.write_str("</section>\n")?;
    }
    w.write_str("</article>\n")
}
