//! Defines the [`Parser`], [`Document`], and [`Error`] types: the discovery
//! half of a build. The parser walks every configured category directory,
//! validates each post bundle it finds, and checks that no two posts resolve
//! to the same output location. Nothing is written here, so a bad post aborts
//! the build before any output exists.

use std::collections::HashMap;
use std::fmt;
use std::fs::read_dir;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::config::Category;
use crate::post::{self, Post};

/// The name of the document file inside a post bundle directory.
pub const DOCUMENT_FILE: &str = "index.md";

/// A source file and the location it's copied to.
pub type StaticFile = (PathBuf, PathBuf);

/// A validated post together with everything needed to write it out.
#[derive(Debug, Clone)]
pub struct Document {
    pub post: Post,

    /// The category the post was found in.
    pub category: Category,

    /// `{output_directory}/{category}/{slug}`. The page is written to
    /// `index.html` inside it.
    pub output_directory: PathBuf,

    /// Every file in the bundle other than `index.md` files, mapped into
    /// `output_directory`.
    pub attachments: Vec<StaticFile>,
}

/// Parses [`Document`]s from a content directory.
pub struct Parser<'a> {
    /// Holds one subdirectory per category slug.
    content_directory: &'a Path,

    /// The root of the rendered site.
    output_directory: &'a Path,
}

impl<'a> Parser<'a> {
    /// Constructs a new parser. See fields on [`Parser`] for argument
    /// descriptions.
    pub fn new(content_directory: &'a Path, output_directory: &'a Path) -> Parser<'a> {
        Parser {
            content_directory,
            output_directory,
        }
    }

    /// Parses the posts of every category, in category order and then by
    /// bundle directory name. Each category directory must exist; entries
    /// inside it that aren't directories holding an `index.md` are skipped.
    pub fn parse_posts(&self, categories: &[Category]) -> Result<Vec<Document>> {
        let mut documents = Vec::new();
        let mut seen: HashMap<(String, String), PathBuf> = HashMap::new();

        for category in categories {
            let category_directory = self.content_directory.join(&category.slug);
            if !category_directory.is_dir() {
                return Err(Error::MissingCategoryDirectory {
                    category: category.slug.clone(),
                    path: category_directory,
                });
            }

            let mut bundles = Vec::new();
            for result in read_dir(&category_directory)? {
                let entry = result?;
                if Self::is_bundle(&entry)? {
                    bundles.push(entry.path());
                } else {
                    debug!(path = %entry.path().display(), "skipping non-post entry");
                }
            }
            bundles.sort();

            for bundle in bundles {
                let document = self.parse_post_bundle(category, &bundle)?;
                let key = (
                    document.post.category_slug.clone(),
                    document.post.slug.clone(),
                );
                if let Some(first) = seen.get(&key) {
                    return Err(Error::DuplicateOutputPath {
                        category: key.0,
                        slug: key.1,
                        first: first.clone(),
                        second: document.post.source_path,
                    });
                }
                seen.insert(key, document.post.source_path.clone());
                documents.push(document);
            }
        }

        Ok(documents)
    }

    fn parse_post_bundle(&self, category: &Category, bundle: &Path) -> Result<Document> {
        let source_path = bundle.join(DOCUMENT_FILE);
        let slug = bundle
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::InvalidFileName(bundle.to_owned()))?;

        // We want to make sure we can parse a post before we collect its
        // attachments.
        let post = self.parse_post(&category.slug, slug, &source_path)?;
        debug!(category = %category.slug, slug, "parsed post");

        let output_directory = self.output_directory.join(&category.slug).join(slug);
        let mut attachments = Vec::new();
        for result in WalkDir::new(bundle).sort_by_file_name() {
            let entry = result?;
            if entry.file_type().is_file() && entry.file_name() != DOCUMENT_FILE {
                let relative = entry
                    .path()
                    .strip_prefix(bundle)
                    .map_err(|_| Error::InvalidFileName(entry.path().to_owned()))?;
                debug!(path = %entry.path().display(), "found attachment");
                attachments.push((entry.path().to_owned(), output_directory.join(relative)));
            }
        }

        Ok(Document {
            post,
            category: category.clone(),
            output_directory,
            attachments,
        })
    }

    fn parse_post(&self, category_slug: &str, slug: &str, source_path: &Path) -> Result<Post> {
        let parse = || -> Result<Post> {
            let input = std::fs::read_to_string(source_path)?;
            Ok(Post::from_source(category_slug, slug, source_path, &input)?)
        };
        parse().map_err(|e| {
            Error::Annotated(
                format!("parsing post `{}`", source_path.display()),
                Box::new(e),
            )
        })
    }

    fn is_bundle(entry: &std::fs::DirEntry) -> std::io::Result<bool> {
        Ok(entry.file_type()?.is_dir() && entry.path().join(DOCUMENT_FILE).is_file())
    }
}

/// Represents the result of a [`Document`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error discovering or parsing [`Document`]s.
#[derive(Debug)]
pub enum Error {
    /// Returned when a post fails validation.
    Post(post::Error),

    /// Returned when two posts resolve to the same category/slug pair.
    DuplicateOutputPath {
        category: String,
        slug: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// Returned when a configured category has no directory.
    MissingCategoryDirectory { category: String, path: PathBuf },

    /// Returned when a bundle directory name isn't valid UTF-8.
    InvalidFileName(PathBuf),

    /// Returned for other I/O errors.
    Io(std::io::Error),

    /// Returned for WalkDir I/O errors.
    WalkDir(walkdir::Error),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Post(err) => err.fmt(f),
            Error::DuplicateOutputPath {
                category,
                slug,
                first,
                second,
            } => write!(
                f,
                "'{}' and '{}' both resolve to `{}/{}/`",
                first.display(),
                second.display(),
                category,
                slug
            ),
            Error::MissingCategoryDirectory { category, path } => write!(
                f,
                "missing directory '{}' for category `{}`",
                path.display(),
                category
            ),
            Error::InvalidFileName(path) => write!(f, "invalid file name: {:?}", path),
            Error::Io(err) => err.fmt(f),
            Error::WalkDir(err) => err.fmt(f),
            Error::Annotated(annotation, err) => write!(f, "{}: {}", annotation, err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Post(err) => Some(err),
            Error::DuplicateOutputPath { .. } => None,
            Error::MissingCategoryDirectory { .. } => None,
            Error::InvalidFileName(_) => None,
            Error::Io(err) => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<post::Error> for Error {
    /// Converts a [`post::Error`] into an [`Error`]. It allows us to use the
    /// `?` operator on [`Post::from_source`].
    fn from(err: post::Error) -> Error {
        Error::Post(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for directory walks.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    fn category(slug: &str) -> Category {
        Category {
            slug: slug.to_owned(),
            name: slug.to_uppercase(),
            order: 0,
        }
    }

    fn write_post(content: &Path, category: &str, slug: &str, date: &str) -> std::io::Result<()> {
        let dir = content.join(category).join(slug);
        fs::create_dir_all(&dir)?;
        fs::write(
            dir.join(DOCUMENT_FILE),
            format!(
                "---\ntitle: {}\ndescription: about {}\ndate: {}\n---\n## One\ntext\n",
                slug, slug, date
            ),
        )
    }

    #[test]
    fn test_parse_posts() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let content = dir.path().join("content");
        let out = dir.path().join("public");
        write_post(&content, "essays", "beta", "2026-01-02")?;
        write_post(&content, "essays", "alpha", "2026-01-01")?;
        write_post(&content, "notes", "gamma", "2026-01-03")?;
        fs::create_dir_all(content.join("essays").join("beta").join("img"))?;
        fs::write(content.join("essays").join("beta").join("img").join("a.png"), b"png")?;
        fs::write(content.join("essays").join("beta").join("data.csv"), b"1,2")?;
        // not posts
        fs::create_dir_all(content.join("essays").join("drafts"))?;
        fs::write(content.join("essays").join("README.txt"), b"hi")?;

        let documents =
            Parser::new(&content, &out).parse_posts(&[category("essays"), category("notes")])?;

        assert_eq!(
            vec!["alpha", "beta", "gamma"],
            documents.iter().map(|d| d.post.slug.as_str()).collect::<Vec<_>>()
        );
        let beta = &documents[1];
        assert_eq!(out.join("essays").join("beta"), beta.output_directory);
        assert_eq!("ESSAYS", beta.category.name);
        assert_eq!(
            vec![
                (
                    content.join("essays/beta/data.csv"),
                    out.join("essays/beta/data.csv")
                ),
                (
                    content.join("essays/beta/img/a.png"),
                    out.join("essays/beta/img/a.png")
                ),
            ],
            beta.attachments
        );
        assert!(documents[0].attachments.is_empty());
        Ok(())
    }

    #[test]
    fn test_nested_documents_are_not_attachments() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let content = dir.path().join("content");
        let out = dir.path().join("public");
        write_post(&content, "essays", "alpha", "2026-01-01")?;
        let nested = content.join("essays").join("alpha").join("sub");
        fs::create_dir_all(&nested)?;
        fs::write(nested.join(DOCUMENT_FILE), "draft\n")?;
        fs::write(nested.join("notes.txt"), "kept")?;

        let documents = Parser::new(&content, &out).parse_posts(&[category("essays")])?;
        assert_eq!(
            vec![(
                content.join("essays/alpha/sub/notes.txt"),
                out.join("essays/alpha/sub/notes.txt")
            )],
            documents[0].attachments
        );
        Ok(())
    }

    #[test]
    fn test_missing_category_directory() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        match Parser::new(dir.path(), dir.path()).parse_posts(&[category("nowhere")]) {
            Err(Error::MissingCategoryDirectory { category, .. }) => {
                assert_eq!("nowhere", category)
            }
            other => panic!("wanted MissingCategoryDirectory, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_duplicate_output_path() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        write_post(dir.path(), "essays", "same", "2026-01-01")?;
        match Parser::new(dir.path(), dir.path())
            .parse_posts(&[category("essays"), category("essays")])
        {
            Err(Error::DuplicateOutputPath { category, slug, .. }) => {
                assert_eq!(("essays", "same"), (category.as_str(), slug.as_str()))
            }
            other => panic!("wanted DuplicateOutputPath, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_invalid_post_is_annotated() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        let bundle = dir.path().join("essays").join("broken");
        fs::create_dir_all(&bundle)?;
        fs::write(bundle.join(DOCUMENT_FILE), "no frontmatter here\n")?;

        let err = Parser::new(dir.path(), dir.path())
            .parse_posts(&[category("essays")])
            .unwrap_err();
        match &err {
            Error::Annotated(_, inner) => assert!(matches!(
                **inner,
                Error::Post(post::Error::Frontmatter(_))
            )),
            other => panic!("wanted Annotated, got {:?}", other),
        }
        assert!(err.to_string().contains("broken"));
        Ok(())
    }
}
