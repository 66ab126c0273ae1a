//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output static site: parsing and validating every post
//! ([`crate::parser`]), rendering and writing post pages ([`crate::write`]),
//! copying the static assets, and generating the post index and RSS feed
//! ([`crate::feed`]).

use std::fmt;
use std::time::Instant;

use tracing::info;

use crate::config::Config;
use crate::feed::{self, index_entries, write_feed, write_index, FeedConfig};
use crate::parser::{self, Parser};
use crate::write::{self, copy_static_files, Writer};

/// The name of the output subdirectory holding static assets.
pub const STATIC_OUTPUT_DIRECTORY: &str = "static";

/// What a build produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub posts: usize,
    pub static_files: usize,
}

/// Builds the site from a [`Config`]. Every post is parsed and validated
/// before anything is written, so a malformed post or a duplicate output path
/// aborts the build with the output directory untouched.
pub fn build_site(config: &Config) -> Result<Summary> {
    let started = Instant::now();

    let documents = Parser::new(&config.content_directory, &config.output_directory)
        .parse_posts(&config.categories)?;

    let site = config.site();
    Writer { site: &site }.write_documents(&documents)?;

    let static_files = copy_static_files(
        &config.static_directory,
        &config.static_files,
        &config.output_directory.join(STATIC_OUTPUT_DIRECTORY),
    )?;

    let entries = index_entries(&documents, config.root_path());
    write_index(&config.output_directory.join(&config.index_file), &entries)?;
    write_feed(
        &config.output_directory.join(&config.feed_file),
        &FeedConfig {
            title: &config.title,
            description: &config.description,
            language: &config.language,
            home_page: &config.base_url,
        },
        &entries,
    )?;

    info!(
        posts = documents.len(),
        static_files,
        elapsed_ms = started.elapsed().as_millis() as u64,
        output = %config.output_directory.display(),
        "built site"
    );
    Ok(Summary {
        posts: documents.len(),
        static_files,
    })
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during parsing, writing,
/// or generating the post index and feed.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors during parsing.
    Parse(parser::Error),

    /// Returned for errors writing pages and copying files.
    Write(write::Error),

    /// Returned for errors writing the post index or feed.
    Feed(feed::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
            Error::Feed(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(err) => Some(err),
            Error::Write(err) => Some(err),
            Error::Feed(err) => Some(err),
        }
    }
}

impl From<parser::Error> for Error {
    /// Converts [`parser::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: parser::Error) -> Error {
        Error::Parse(err)
    }
}

impl From<write::Error> for Error {
    /// Converts [`write::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: write::Error) -> Error {
        Error::Write(err)
    }
}

impl From<feed::Error> for Error {
    /// Converts [`feed::Error`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: feed::Error) -> Error {
        Error::Feed(err)
    }
}
