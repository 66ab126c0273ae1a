//! Splits a source document into its frontmatter fields and its Markdown
//! body. The frontmatter is a flat block of `key: value` lines fenced by `---`
//! lines:
//!
//! ```md
//! ---
//! title: "Hello, world!"
//! description: A first post
//! date: 2026-01-01
//! ---
//! ## Hello
//!
//! World
//! ```
//!
//! Values may be wrapped in single or double quotes; the quotes are stripped.
//! Field validation (required keys, dates) happens later in
//! [`crate::post::Post::from_frontmatter`].

use std::collections::BTreeMap;
use std::fmt;

const FENCE: &str = "---";

/// The raw result of splitting a document: string fields and the body text
/// with leading blank lines removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frontmatter<'a> {
    pub fields: BTreeMap<String, String>,
    pub body: &'a str,
}

impl<'a> Frontmatter<'a> {
    /// Returns the value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

/// Splits `input` into [`Frontmatter`] fields and body.
pub fn split(input: &str) -> Result<Frontmatter<'_>> {
    let mut lines = LineCursor::new(input);

    match lines.next() {
        Some((_, line)) if line.trim_end() == FENCE => {}
        _ => return Err(Error::MalformedFrontMatter),
    }

    let mut fields = BTreeMap::new();
    loop {
        let (number, line) = lines.next().ok_or(Error::MalformedFrontMatter)?;
        let line = line.trim_end();
        if line == FENCE {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        let (key, value) =
            line.split_once(':').ok_or_else(|| Error::InvalidFrontMatterLine {
                line_number: number,
                line: line.to_owned(),
            })?;
        fields.insert(key.trim().to_owned(), unquote(value.trim()).to_owned());
    }

    Ok(Frontmatter {
        fields,
        body: trim_leading_blank_lines(lines.rest()),
    })
}

/// Parses an optional boolean flag. Accepts `true` and `false` in any case;
/// an empty or absent value yields `default`.
pub fn parse_flag(key: &str, value: Option<&str>, default: bool) -> Result<bool> {
    let value = match value.map(str::trim) {
        None | Some("") => return Ok(default),
        Some(value) => value,
    };
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(Error::InvalidBooleanFlag {
            key: key.to_owned(),
            value: value.to_owned(),
        })
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

fn trim_leading_blank_lines(body: &str) -> &str {
    let mut rest = body;
    while let Some(end) = rest.find('\n') {
        if !rest[..end].trim().is_empty() {
            break;
        }
        rest = &rest[end + 1..];
    }
    if rest.trim().is_empty() {
        ""
    } else {
        rest
    }
}

/// Walks `input` line by line while remembering where the unread remainder
/// starts, so the body can be returned as a borrowed slice.
struct LineCursor<'a> {
    input: &'a str,
    offset: usize,
    line_number: usize,
}

impl<'a> LineCursor<'a> {
    fn new(input: &'a str) -> Self {
        LineCursor {
            input,
            offset: 0,
            line_number: 0,
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.offset..]
    }
}

impl<'a> Iterator for LineCursor<'a> {
    type Item = (usize, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.rest();
        if rest.is_empty() {
            return None;
        }
        let (line, consumed) = match rest.find('\n') {
            Some(end) => (&rest[..end], end + 1),
            None => (rest, rest.len()),
        };
        self.offset += consumed;
        self.line_number += 1;
        Some((self.line_number, line.strip_suffix('\r').unwrap_or(line)))
    }
}

/// Represents the result of a frontmatter operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem with a document's frontmatter block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Returned when the document doesn't begin with a `---` line or the
    /// block is never closed.
    MalformedFrontMatter,

    /// Returned when a line inside the block has no `:` separator.
    InvalidFrontMatterLine { line_number: usize, line: String },

    /// Returned when a boolean flag is neither `true`, `false`, nor empty.
    InvalidBooleanFlag { key: String, value: String },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MalformedFrontMatter => write!(
                f,
                "document must begin with a `---` line and close the frontmatter with another `---` line"
            ),
            Error::InvalidFrontMatterLine { line_number, line } => write!(
                f,
                "frontmatter line {} has no `key: value` separator: `{}`",
                line_number, line
            ),
            Error::InvalidBooleanFlag { key, value } => write!(
                f,
                "frontmatter field `{}` must be `true` or `false`, found `{}`",
                key, value
            ),
        }
    }
}

impl std::error::Error for Error {}
