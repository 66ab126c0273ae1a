//! Renders [`Block`]s into HTML. Each block renders on its own, without
//! looking at its neighbours; inline content goes through
//! [`crate::inline::render`].

use std::fmt::{self, Write};

use crate::inline;
use crate::markdown::Block;

/// Renders a sequence of blocks, one after another.
pub fn push_html<W: Write>(w: &mut W, blocks: &[Block]) -> fmt::Result {
    for block in blocks {
        render_block(w, block)?;
    }
    Ok(())
}

/// Renders a single block followed by a newline.
pub fn render_block<W: Write>(w: &mut W, block: &Block) -> fmt::Result {
    match block {
        Block::Paragraph(text) => writeln!(w, "<p>{}</p>", inline::render(text)),
        Block::UnorderedList(items) => {
            w.write_str("<ul>\n")?;
            on_items(w, items)?;
            w.write_str("</ul>\n")
        }
        Block::OrderedList { start, items } => {
            match *start {
                1 => w.write_str("<ol>\n")?,
                _ => writeln!(w, r#"<ol start="{}">"#, start)?,
            }
            on_items(w, items)?;
            w.write_str("</ol>\n")
        }
        Block::Quote(text) => {
            w.write_str("<blockquote>\n")?;
            for paragraph in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
                writeln!(w, "<p>{}</p>", inline::render(paragraph))?;
            }
            w.write_str("</blockquote>\n")
        }
        Block::Code { language, code } => {
            match language {
                None => w.write_str("<pre><code>")?,
                Some(language) => write!(
                    w,
                    r#"<pre><code class="language-{}">"#,
                    inline::escape(language)
                )?,
            }
            writeln!(w, "{}</code></pre>", inline::escape(code))
        }
        Block::Heading {
            level,
            text,
            anchor,
        } => match anchor {
            Some(anchor) => writeln!(
                w,
                r#"<h{} id="{}">{}</h{}>"#,
                level,
                anchor,
                inline::render(text),
                level
            ),
            None => writeln!(w, "<h{}>{}</h{}>", level, inline::render(text), level),
        },
    }
}

fn on_items<W: Write>(w: &mut W, items: &[String]) -> fmt::Result {
    for item in items {
        writeln!(w, "<li>{}</li>", inline::render(item))?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn html(block: Block) -> String {
        let mut out = String::new();
        render_block(&mut out, &block).unwrap();
        out
    }

    #[test]
    fn test_paragraph() {
        assert_eq!(
            "<p>Some <strong>bold</strong>\ntext</p>\n",
            html(Block::Paragraph(String::from("Some **bold**\ntext")))
        );
    }

    #[test]
    fn test_lists() {
        assert_eq!(
            "<ul>\n<li>a</li>\n<li><em>b</em></li>\n</ul>\n",
            html(Block::UnorderedList(vec![String::from("a"), String::from("*b*")]))
        );
        assert_eq!(
            "<ol>\n<li>one</li>\n</ol>\n",
            html(Block::OrderedList {
                start: 1,
                items: vec![String::from("one")],
            })
        );
        assert_eq!(
            "<ol start=\"4\">\n<li>four</li>\n</ol>\n",
            html(Block::OrderedList {
                start: 4,
                items: vec![String::from("four")],
            })
        );
    }

    #[test]
    fn test_quote_paragraphs() {
        assert_eq!(
            "<blockquote>\n<p>first</p>\n<p>second</p>\n</blockquote>\n",
            html(Block::Quote(String::from("first\n\nsecond")))
        );
    }

    #[test]
    fn test_code_is_escaped_not_rendered() {
        assert_eq!(
            "<pre><code class=\"language-html\">&lt;p&gt;**hi**&lt;/p&gt;\n&amp;</code></pre>\n",
            html(Block::Code {
                language: Some(String::from("html")),
                code: String::from("<p>**hi**</p>\n&"),
            })
        );
        assert_eq!(
            "<pre><code>x</code></pre>\n",
            html(Block::Code {
                language: None,
                code: String::from("x"),
            })
        );
    }

    #[test]
    fn test_headings() {
        assert_eq!(
            "<h3 id=\"section-setup\">Set <code>up</code></h3>\n",
            html(Block::Heading {
                level: 3,
                text: String::from("Set `up`"),
                anchor: Some(String::from("section-setup")),
            })
        );
        assert_eq!(
            "<h1>Top</h1>\n",
            html(Block::Heading {
                level: 1,
                text: String::from("Top"),
                anchor: None,
            })
        );
    }

    #[test]
    fn test_push_html() {
        let mut out = String::new();
        push_html(
            &mut out,
            &[
                Block::Paragraph(String::from("a")),
                Block::Paragraph(String::from("b")),
            ],
        )
        .unwrap();
        assert_eq!("<p>a</p>\n<p>b</p>\n", out);
    }
}
