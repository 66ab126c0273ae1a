//! Renders inline Markdown (code spans, `http(s)` links, bold, and italic)
//! into HTML fragments. The passes run in a fixed order over text that has
//! already been escaped, so no pass ever sees markup produced by another:
//!
//! 1. escape `&`, `<`, `>`, `"`, and `'`
//! 2. set code spans aside behind placeholders
//! 3. set links aside behind placeholders (their labels get emphasis)
//! 4. `**bold**`
//! 5. `*italic*`
//! 6. put the code spans and links back

use pulldown_cmark::escape::escape_html;
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Delimits placeholder indices. Stripped from input before rendering.
const PLACEHOLDER: char = '\u{0}';

static CODE_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("valid code span pattern"));

static LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\[\]]+)\]\((https?://[^\s()]+)\)").expect("valid link pattern")
});

static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid bold pattern"));

static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*]+)\*").expect("valid italic pattern"));

static STASHED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x00(\d+)\x00").expect("valid placeholder pattern"));

/// Renders one span of inline Markdown as HTML.
pub fn render(text: &str) -> String {
    let mut stash: Vec<String> = Vec::new();

    let escaped = escape(&text.replace(PLACEHOLDER, ""));

    let coded = CODE_SPAN.replace_all(&escaped, |caps: &Captures| {
        push(&mut stash, format!("<code>{}</code>", &caps[1]))
    });

    let linked = LINK.replace_all(&coded, |caps: &Captures| {
        let label = restore(&emphasize(&caps[1]), &stash);
        push(&mut stash, format!(r#"<a href="{}">{}</a>"#, &caps[2], label))
    });

    restore(&emphasize(&linked), &stash)
}

/// Escapes the five HTML-sensitive characters.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    // Writing into a `String` can't fail.
    let _ = escape_html(&mut escaped, text);
    escaped.replace('\'', "&#39;")
}

fn emphasize(text: &str) -> String {
    let bold = BOLD.replace_all(text, "<strong>$1</strong>");
    ITALIC.replace_all(&bold, "<em>$1</em>").into_owned()
}

fn push(stash: &mut Vec<String>, html: String) -> String {
    stash.push(html);
    format!("{}{}{}", PLACEHOLDER, stash.len() - 1, PLACEHOLDER)
}

fn restore(text: &str, stash: &[String]) -> String {
    STASHED
        .replace_all(text, |caps: &Captures| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|i| stash.get(i))
                .cloned()
                .unwrap_or_default()
        })
        .into_owned()
}
