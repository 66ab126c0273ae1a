//! Responsible for rendering [`Document`]s and putting every output file in
//! place. Generated files are written atomically: the bytes go to a temporary
//! file in the destination directory which is then renamed over the
//! destination, so a process serving the output directory never sees a
//! partially written file.

use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::markdown;
use crate::page::{self, Site};
use crate::parser::{Document, StaticFile};

/// The name of the rendered page inside a post's output directory.
pub const PAGE_FILE: &str = "index.html";

/// Renders and writes [`Document`]s.
pub struct Writer<'a> {
    /// Site-wide values for page assembly.
    pub site: &'a Site,
}

impl Writer<'_> {
    /// Structures and renders `document`, copies its attachments, and writes
    /// the page to `{output_directory}/index.html`.
    pub fn write_document(&self, document: &Document) -> Result<()> {
        let outline = markdown::structure(&document.post.body);
        let html = page::render(self.site, &document.post, &outline)?;
        copy_files(&document.attachments)?;
        write_atomic(&document.output_directory.join(PAGE_FILE), html.as_bytes())
    }

    /// Writes every document. Stops at the first failure.
    pub fn write_documents(&self, documents: &[Document]) -> Result<()> {
        documents.iter().try_for_each(|document| {
            debug!(url = %document.post.url_path(), "writing post");
            self.write_document(document)
        })
    }
}

/// Writes `contents` to `path` through a temporary file in the same
/// directory. Missing parent directories are created.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| Error::InvalidPath(path.to_owned()))?;
    std::fs::create_dir_all(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))?;
    }
    file.persist(path).map_err(|e| Error::Persist {
        path: path.to_owned(),
        err: e.error,
    })?;
    Ok(())
}

/// Copies each `(source, destination)` pair, creating destination
/// directories as needed.
pub fn copy_files(files: &[StaticFile]) -> Result<()> {
    for (source, destination) in files {
        if let Some(dir) = destination.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::copy(source, destination).map_err(|err| Error::Copy {
            source: source.clone(),
            destination: destination.clone(),
            err,
        })?;
    }
    Ok(())
}

/// Copies the named files from `source_directory` into
/// `destination_directory`. Files that don't exist are skipped.
pub fn copy_static_files(
    source_directory: &Path,
    files: &[PathBuf],
    destination_directory: &Path,
) -> Result<usize> {
    let present: Vec<StaticFile> = files
        .iter()
        .filter_map(|file| {
            let source = source_directory.join(file);
            match source.is_file() {
                true => Some((source, destination_directory.join(file))),
                false => {
                    debug!(path = %source.display(), "skipping missing static file");
                    None
                }
            }
        })
        .collect();
    copy_files(&present)?;
    Ok(present.len())
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// An error assembling a page.
    Render(fmt::Error),

    /// Returned when a temporary file can't be renamed into place.
    Persist { path: PathBuf, err: io::Error },

    /// Returned when an attachment or static file can't be copied.
    Copy {
        source: PathBuf,
        destination: PathBuf,
        err: io::Error,
    },

    /// Returned when an output path has no parent directory.
    InvalidPath(PathBuf),

    /// An error writing the output files.
    Io(io::Error),
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to use the
    /// `?` operator for fallible I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<fmt::Error> for Error {
    /// Converts a [`fmt::Error`] into an [`Error`]. This allows us to use the
    /// `?` operator on [`page::render`].
    fn from(err: fmt::Error) -> Error {
        Error::Render(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Render(err) => write!(f, "rendering page: {}", err),
            Error::Persist { path, err } => {
                write!(f, "moving page into place at '{}': {}", path.display(), err)
            }
            Error::Copy {
                source,
                destination,
                err,
            } => write!(
                f,
                "copying '{}' to '{}': {}",
                source.display(),
                destination.display(),
                err
            ),
            Error::InvalidPath(path) => write!(f, "invalid output path: {:?}", path),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Render(err) => Some(err),
            Error::Persist { err, .. } => Some(err),
            Error::Copy { err, .. } => Some(err),
            Error::InvalidPath(_) => None,
            Error::Io(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    #[test]
    fn test_write_atomic_creates_and_replaces() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("a").join("b").join("page.html");

        write_atomic(&path, b"first")?;
        assert_eq!("first", fs::read_to_string(&path)?);
        write_atomic(&path, b"second")?;
        assert_eq!("second", fs::read_to_string(&path)?);

        // no temporary files left behind
        let names: Vec<_> = fs::read_dir(path.parent().unwrap())?
            .map(|e| e.map(|e| e.file_name()))
            .collect::<io::Result<_>>()?;
        assert_eq!(vec![std::ffi::OsString::from("page.html")], names);
        Ok(())
    }

    #[test]
    fn test_copy_static_files_skips_missing() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let source = dir.path().join("static");
        let destination = dir.path().join("public").join("static");
        fs::create_dir_all(&source)?;
        fs::write(source.join("style.css"), "body{}")?;

        let copied = copy_static_files(
            &source,
            &[PathBuf::from("style.css"), PathBuf::from("theme.js")],
            &destination,
        )?;
        assert_eq!(1, copied);
        assert_eq!("body{}", fs::read_to_string(destination.join("style.css"))?);
        assert!(!destination.join("theme.js").exists());
        Ok(())
    }

    #[test]
    fn test_copy_files_reports_missing_source() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let result = copy_files(&[(dir.path().join("nope"), dir.path().join("out"))]);
        assert!(matches!(result, Err(Error::Copy { .. })));
        Ok(())
    }
}
