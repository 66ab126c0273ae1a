use anyhow::{anyhow, Result};
use std::path::Path;

/// Reads a whole file, naming its `kind` in the error.
pub fn read(path: &Path, kind: &str) -> Result<String> {
    match std::fs::read_to_string(path) {
        Err(e) => Err(anyhow!("Reading {} file `{}`: {}", kind, path.display(), e)),
        Ok(contents) => Ok(contents),
    }
}
