//! Support for the corpus-level outputs: the JSON post index and the RSS
//! feed. Both list the same [`IndexEntry`]s in the same order, newest first.

use std::fmt;

use chrono::NaiveDate;
use rss::{Category as RssCategory, Channel, Guid, Item};
use serde::Serialize;
use url::Url;

use crate::parser::Document;
use crate::write::{self, write_atomic};

/// One post in the post index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub title: String,
    pub date: NaiveDate,
    pub formatted_date: String,
    pub description: String,

    /// The frontmatter category label.
    pub category: String,

    /// The configured display name of the category.
    pub category_name: String,
    pub category_slug: String,
    pub category_order: i64,

    /// The path of the post page from the host root, e.g.
    /// `/notes/essays/hello/`.
    pub url: String,
    pub number_chapters: bool,
    pub show_contents: bool,
}

impl IndexEntry {
    /// Builds the entry for `document`. `root_path` is the path of the site
    /// root (see [`crate::config::Config::root_path`]).
    pub fn new(document: &Document, root_path: &str) -> IndexEntry {
        let post = &document.post;
        IndexEntry {
            title: post.title.clone(),
            date: post.date,
            formatted_date: post.formatted_date(),
            description: post.description.clone(),
            category: post.category.clone(),
            category_name: document.category.name.clone(),
            category_slug: document.category.slug.clone(),
            category_order: document.category.order,
            url: format!("{}{}", root_path, post.url_path()),
            number_chapters: post.number_chapters,
            show_contents: post.show_contents,
        }
    }
}

/// Builds the post index: one entry per document, newest first. Posts from
/// the same day keep the order they were found in.
pub fn index_entries(documents: &[Document], root_path: &str) -> Vec<IndexEntry> {
    let mut entries: Vec<IndexEntry> = documents
        .iter()
        .map(|document| IndexEntry::new(document, root_path))
        .collect();
    entries.sort_by(|a, b| b.date.cmp(&a.date));
    entries
}

/// Bundled configuration for creating a feed.
pub struct FeedConfig<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub language: &'a str,

    /// The absolute URL of the site root. Entry links are resolved against
    /// it.
    pub home_page: &'a Url,
}

/// Formats a date as an RFC-822 timestamp at midnight UTC.
pub fn rfc822_date(date: NaiveDate) -> String {
    date.format("%a, %d %b %Y 00:00:00 +0000").to_string()
}

/// Creates the RSS channel for `entries`, keeping their order.
pub fn feed(config: &FeedConfig, entries: &[IndexEntry]) -> Result<Channel> {
    let mut items = Vec::with_capacity(entries.len());
    for entry in entries {
        let link = config.home_page.join(&entry.url)?.to_string();
        items.push(Item {
            title: Some(entry.title.clone()),
            link: Some(link.clone()),
            description: Some(entry.description.clone()),
            guid: Some(Guid {
                value: link,
                permalink: true,
            }),
            pub_date: Some(rfc822_date(entry.date)),
            categories: vec![RssCategory {
                name: entry.category_name.clone(),
                domain: None,
            }],
            ..Item::default()
        });
    }

    Ok(Channel {
        title: config.title.to_owned(),
        link: config.home_page.to_string(),
        description: config.description.to_owned(),
        language: Some(config.language.to_owned()),
        // the newest post, so unchanged input yields an unchanged feed
        last_build_date: entries.iter().map(|e| e.date).max().map(rfc822_date),
        items,
        ..Channel::default()
    })
}

/// Serializes the post index as pretty-printed JSON.
pub fn index_json(entries: &[IndexEntry]) -> Result<Vec<u8>> {
    let mut json = serde_json::to_vec_pretty(entries)?;
    json.push(b'\n');
    Ok(json)
}

/// Serializes the feed as RSS 2.0 XML.
pub fn feed_xml(config: &FeedConfig, entries: &[IndexEntry]) -> Result<Vec<u8>> {
    Ok(feed(config, entries)?.write_to(Vec::new())?)
}

/// Atomically writes the post index to `path`.
pub fn write_index(path: &std::path::Path, entries: &[IndexEntry]) -> Result<()> {
    write_atomic(path, &index_json(entries)?)?;
    Ok(())
}

/// Atomically writes the feed to `path`.
pub fn write_feed(path: &std::path::Path, config: &FeedConfig, entries: &[IndexEntry]) -> Result<()> {
    write_atomic(path, &feed_xml(config, entries)?)?;
    Ok(())
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem creating the post index or the feed.
#[derive(Debug)]
pub enum Error {
    /// Returned when an entry URL can't be resolved against the home page.
    UrlParse(url::ParseError),

    /// Returned when the index can't be serialized.
    Json(serde_json::Error),

    /// Returned when the feed can't be serialized.
    Rss(rss::Error),

    /// Returned when either file can't be written.
    Write(write::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UrlParse(err) => err.fmt(f),
            Error::Json(err) => err.fmt(f),
            Error::Rss(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::UrlParse(err) => Some(err),
            Error::Json(err) => Some(err),
            Error::Rss(err) => Some(err),
            Error::Write(err) => Some(err),
        }
    }
}

impl From<url::ParseError> for Error {
    /// Converts [`url::ParseError`]s into [`Error`]. This allows us to use the
    /// `?` operator when resolving entry links.
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

impl From<serde_json::Error> for Error {
    /// Converts [`serde_json::Error`]s into [`Error`]. This allows us to use
    /// the `?` operator when serializing the index.
    fn from(err: serde_json::Error) -> Error {
        Error::Json(err)
    }
}

impl From<rss::Error> for Error {
    /// Converts [`rss::Error`]s into [`Error`]. This allows us to use the `?`
    /// operator when serializing the feed.
    fn from(err: rss::Error) -> Error {
        Error::Rss(err)
    }
}

impl From<write::Error> for Error {
    /// Converts [`write::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator when writing either file.
    fn from(err: write::Error) -> Error {
        Error::Write(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Category;
    use crate::post::Post;
    use std::path::{Path, PathBuf};

    fn document(slug: &str, date: &str) -> Document {
        let post = Post::from_source(
            "essays",
            slug,
            Path::new("index.md"),
            &format!(
                "---\ntitle: {}\ndescription: About {}\ndate: {}\nnumberChapters: true\n---\n",
                slug, slug, date
            ),
        )
        .unwrap();
        Document {
            post,
            category: Category {
                slug: String::from("essays"),
                name: String::from("Essays"),
                order: 3,
            },
            output_directory: PathBuf::from("public/essays").join(slug),
            attachments: Vec::new(),
        }
    }

    fn home_page() -> Url {
        Url::parse("https://example.org/notes/").unwrap()
    }

    fn config(home_page: &Url) -> FeedConfig<'_> {
        FeedConfig {
            title: "Field Notes",
            description: "Things & stuff",
            language: "en",
            home_page,
        }
    }

    #[test]
    fn test_entries_newest_first_with_stable_ties() {
        let documents = vec![
            document("jan", "2026-01-01"),
            document("tie-a", "2026-01-15"),
            document("feb", "2026-02-01"),
            document("tie-b", "2026-01-15"),
        ];
        let entries = index_entries(&documents, "/notes/");
        assert_eq!(
            vec!["feb", "tie-a", "tie-b", "jan"],
            entries.iter().map(|e| e.title.as_str()).collect::<Vec<_>>()
        );
        assert_eq!("/notes/essays/feb/", entries[0].url);
    }

    #[test]
    fn test_index_json_keys() -> Result<()> {
        let entries = index_entries(&[document("hello", "2026-01-01")], "/");
        let json: serde_json::Value = serde_json::from_slice(&index_json(&entries)?)?;
        assert_eq!(
            serde_json::json!([{
                "title": "hello",
                "date": "2026-01-01",
                "formattedDate": "January 1, 2026",
                "description": "About hello",
                "category": "essays",
                "categoryName": "Essays",
                "categorySlug": "essays",
                "categoryOrder": 3,
                "url": "/essays/hello/",
                "numberChapters": true,
                "showContents": true,
            }]),
            json
        );
        Ok(())
    }

    #[test]
    fn test_feed_items() -> Result<()> {
        let documents = vec![document("jan", "2026-01-01"), document("feb", "2026-02-01")];
        let entries = index_entries(&documents, "/notes/");
        let home_page = home_page();
        let channel = feed(&config(&home_page), &entries)?;

        assert_eq!("https://example.org/notes/", channel.link);
        assert_eq!(Some("Sun, 01 Feb 2026 00:00:00 +0000"), channel.last_build_date.as_deref());
        let first = &channel.items[0];
        assert_eq!(Some("feb"), first.title.as_deref());
        assert_eq!(Some("https://example.org/notes/essays/feb/"), first.link.as_deref());
        assert_eq!(first.link.as_deref(), first.guid.as_ref().map(|g| g.value.as_str()));
        assert_eq!(Some("Sun, 01 Feb 2026 00:00:00 +0000"), first.pub_date.as_deref());
        assert_eq!(Some("Thu, 01 Jan 2026 00:00:00 +0000"), channel.items[1].pub_date.as_deref());

        let xml = String::from_utf8(feed_xml(&config(&home_page), &entries)?).unwrap();
        assert!(xml.contains("<rss version=\"2.0\""));
        assert!(xml.contains("Things &amp; stuff"));
        assert!(xml.find("essays/feb/").unwrap() < xml.find("essays/jan/").unwrap());
        Ok(())
    }
}
