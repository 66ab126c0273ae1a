//! Defines the [`Post`] type, the validated form of a source document. A
//! [`Post`] is built from the loosely-typed [`crate::frontmatter`] fields so
//! that the rest of the pipeline never has to check for missing keys.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::frontmatter::{self, Frontmatter};

/// The format of the `date` frontmatter field.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single document, identified by its category slug and its own slug (the
/// name of the directory holding its `index.md`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    /// The slug of the category directory the post lives in.
    pub category_slug: String,

    /// The name of the post's bundle directory.
    pub slug: String,

    pub title: String,
    pub description: String,
    pub date: NaiveDate,

    /// The category label from the frontmatter. Defaults to the category
    /// slug.
    pub category: String,

    /// Whether chapter headings and contents entries get a `1. ` style
    /// ordinal.
    pub number_chapters: bool,

    /// Whether the page gets a table-of-contents aside.
    pub show_contents: bool,

    /// The Markdown body, frontmatter removed.
    pub body: String,

    /// The `index.md` the post was read from.
    pub source_path: PathBuf,
}

impl Post {
    /// Splits `input` and validates its frontmatter into a [`Post`].
    pub fn from_source(
        category_slug: &str,
        slug: &str,
        source_path: &Path,
        input: &str,
    ) -> Result<Post> {
        Post::from_frontmatter(
            frontmatter::split(input)?,
            category_slug,
            slug,
            source_path,
        )
    }

    /// Validates raw frontmatter fields. `title`, `description`, and `date`
    /// must be present and non-empty; `date` must be an ISO calendar date.
    pub fn from_frontmatter(
        frontmatter: Frontmatter<'_>,
        category_slug: &str,
        slug: &str,
        source_path: &Path,
    ) -> Result<Post> {
        let required = |field: &'static str| -> Result<String> {
            match frontmatter.get(field).map(str::trim) {
                Some(value) if !value.is_empty() => Ok(value.to_owned()),
                _ => Err(Error::MissingField {
                    field,
                    path: source_path.to_owned(),
                }),
            }
        };

        let title = required("title")?;
        let description = required("description")?;
        let raw_date = required("date")?;
        let date = NaiveDate::parse_from_str(&raw_date, DATE_FORMAT).map_err(|err| {
            Error::InvalidDate {
                value: raw_date.clone(),
                path: source_path.to_owned(),
                err,
            }
        })?;

        let category = match frontmatter.get("category").map(str::trim) {
            Some(label) if !label.is_empty() => label.to_owned(),
            _ => category_slug.to_owned(),
        };

        Ok(Post {
            category_slug: category_slug.to_owned(),
            slug: slug.to_owned(),
            title,
            description,
            date,
            category,
            number_chapters: frontmatter::parse_flag(
                "numberChapters",
                frontmatter.get("numberChapters"),
                false,
            )?,
            show_contents: frontmatter::parse_flag(
                "showContents",
                frontmatter.get("showContents"),
                true,
            )?,
            body: frontmatter.body.to_owned(),
            source_path: source_path.to_owned(),
        })
    }

    /// The output location of the post relative to the site root, e.g.
    /// `essays/hello/`.
    pub fn url_path(&self) -> String {
        format!("{}/{}/", self.category_slug, self.slug)
    }

    /// The post date in its long display form.
    pub fn formatted_date(&self) -> String {
        format_date(self.date)
    }
}

/// Formats a date for display, e.g. `January 1, 2026`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Represents the result of a [`Post`]-validation operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem turning a source document into a [`Post`].
#[derive(Debug)]
pub enum Error {
    /// Returned when the frontmatter block can't be split or a flag is
    /// invalid.
    Frontmatter(frontmatter::Error),

    /// Returned when a required field is absent or empty.
    MissingField { field: &'static str, path: PathBuf },

    /// Returned when the `date` field isn't a valid calendar date.
    InvalidDate {
        value: String,
        path: PathBuf,
        err: chrono::ParseError,
    },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Frontmatter(err) => err.fmt(f),
            Error::MissingField { field, path } => write!(
                f,
                "missing required frontmatter field `{}` in '{}'",
                field,
                path.display()
            ),
            Error::InvalidDate { value, path, err } => write!(
                f,
                "invalid date `{}` in '{}': {}",
                value,
                path.display(),
                err
            ),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Frontmatter(err) => Some(err),
            Error::MissingField { .. } => None,
            Error::InvalidDate { err, .. } => Some(err),
        }
    }
}

impl From<frontmatter::Error> for Error {
    /// Converts a [`frontmatter::Error`] into an [`Error`]. This allows us to
    /// use the `?` operator on [`frontmatter::split`].
    fn from(err: frontmatter::Error) -> Error {
        Error::Frontmatter(err)
    }
}
