//! Renders the table-of-contents aside for a post. The contents mirror the
//! [`Outline`]: one entry per chapter, with its subsections nested below it
//! as deeply as they nest in the outline.

use std::fmt::{self, Write};

use crate::inline;
use crate::markdown::{Chapter, Outline, Subsection};

/// Shown in place of the list when a post has no chapters.
pub const NO_CHAPTERS: &str = "No chapters";

/// Writes the `<aside>` holding the table of contents.
pub fn push_html<W: Write>(w: &mut W, outline: &Outline, number_chapters: bool) -> fmt::Result {
    w.write_str("<aside class=\"toc\">\n<nav aria-label=\"Contents\">\n<h2>Contents</h2>\n")?;
    if outline.chapters.is_empty() {
        writeln!(w, "<p class=\"toc-empty\">{}</p>", NO_CHAPTERS)?;
    } else {
        w.write_str("<ul class=\"toc-chapters\">\n")?;
        for (i, chapter) in outline.chapters.iter().enumerate() {
            on_chapter(w, i + 1, chapter, number_chapters)?;
        }
        w.write_str("</ul>\n")?;
    }
    w.write_str("</nav>\n</aside>\n")
}

/// The display label of a chapter: its rendered title, prefixed with its
/// 1-based `ordinal` when chapters are numbered.
pub fn chapter_label(ordinal: usize, chapter: &Chapter, number_chapters: bool) -> String {
    match number_chapters {
        true => format!("{}. {}", ordinal, inline::render(&chapter.title)),
        false => inline::render(&chapter.title),
    }
}

fn on_chapter<W: Write>(
    w: &mut W,
    ordinal: usize,
    chapter: &Chapter,
    number_chapters: bool,
) -> fmt::Result {
    write!(
        w,
        "<li><a href=\"#{}\">{}</a>",
        chapter.anchor,
        chapter_label(ordinal, chapter, number_chapters)
    )?;
    on_subsections(w, &chapter.subsections)?;
    w.write_str("</li>\n")
}

fn on_subsections<W: Write>(w: &mut W, subsections: &[Subsection]) -> fmt::Result {
    if subsections.is_empty() {
        return Ok(());
    }
    w.write_str("\n<ul>\n")?;
    for subsection in subsections {
        write!(
            w,
            "<li><a href=\"#{}\">{}</a>",
            subsection.anchor,
            inline::render(&subsection.title)
        )?;
        on_subsections(w, &subsection.children)?;
        w.write_str("</li>\n")?;
    }
    w.write_str("</ul>\n")
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::markdown::structure;

    fn toc(body: &str, number_chapters: bool) -> String {
        let mut out = String::new();
        push_html(&mut out, &structure(body), number_chapters).unwrap();
        out
    }

    /// The deepest `<ul>` nesting in `html`, not counting the chapter list.
    fn max_depth(html: &str) -> usize {
        let (mut depth, mut max) = (0usize, 0usize);
        let mut rest = html;
        while let Some(i) = rest.find("<ul") {
            let close = rest.find("</ul>");
            match close {
                Some(c) if c < i => {
                    depth -= 1;
                    rest = &rest[c + 5..];
                }
                _ => {
                    depth += 1;
                    max = max.max(depth);
                    rest = &rest[i + 3..];
                }
            }
        }
        max - 1
    }

    #[test]
    fn test_toc_mirrors_outline() {
        assert_eq!(
            "<aside class=\"toc\">\n<nav aria-label=\"Contents\">\n<h2>Contents</h2>\n\
             <ul class=\"toc-chapters\">\n\
             <li><a href=\"#chapter-setup\">1. Setup</a>\n<ul>\n\
             <li><a href=\"#section-install\">Install</a>\n<ul>\n\
             <li><a href=\"#section-on-linux\">On <em>Linux</em></a></li>\n</ul>\n</li>\n\
             </ul>\n</li>\n\
             <li><a href=\"#chapter-usage\">2. Usage</a></li>\n\
             </ul>\n</nav>\n</aside>\n",
            toc("## Setup\n### Install\n#### On *Linux*\n## Usage\ntext\n", true)
        );
    }

    #[test]
    fn test_unnumbered_labels() {
        let html = toc("## Setup\n", false);
        assert!(html.contains("<a href=\"#chapter-setup\">Setup</a>"));
    }

    #[test]
    fn test_depth_matches_subsection_depth() {
        assert_eq!(0, max_depth(&toc("## A\n", false)));
        assert_eq!(1, max_depth(&toc("## A\n### B\n### C\n", false)));
        assert_eq!(3, max_depth(&toc("## A\n### B\n#### C\n###### D\n### E\n", false)));
        assert_eq!(2, max_depth(&toc("## A\n### B\n###### C\n## F\n#### G\n", false)));
    }

    #[test]
    fn test_no_chapters() {
        let html = toc("just an intro\n", true);
        assert!(html.contains("<p class=\"toc-empty\">No chapters</p>"));
        assert!(!html.contains("<ul"));
    }
}
