//! Per-import staging directory for converter input and output.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::error::ShelfError;
use crate::library::BookFormat;

const MARKUP_FILE: &str = "paper.html";
const BOOK_STEM: &str = "paper";

/// A uniquely named scratch directory owned by one import.
///
/// The directory and everything in it is removed when the value is dropped,
/// so the fetched markup and the converted book never outlive the import,
/// whether it succeeded or failed.
#[derive(Debug)]
pub struct ScratchSpace {
    dir: TempDir,
}

impl ScratchSpace {
    /// Create a fresh scratch directory, under `parent` if given, otherwise
    /// under the system temporary directory.
    pub fn create(parent: Option<&Path>) -> Result<Self, ShelfError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("arxiv-shelf-");
        let dir = match parent {
            Some(parent) => {
                std::fs::create_dir_all(parent).map_err(ShelfError::Scratch)?;
                builder.tempdir_in(parent)
            }
            None => builder.tempdir(),
        }
        .map_err(ShelfError::Scratch)?;

        tracing::debug!(path = %dir.path().display(), "Created scratch directory");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Where the fetched markup is staged
    pub fn markup_path(&self) -> PathBuf {
        self.dir.path().join(MARKUP_FILE)
    }

    /// Where the converter writes the book
    pub fn book_path(&self, format: BookFormat) -> PathBuf {
        self.dir
            .path()
            .join(format!("{}.{}", BOOK_STEM, format.extension()))
    }

    /// Write fetched markup to [`Self::markup_path`], replacing any previous content
    pub async fn write_markup(&self, markup: &[u8]) -> Result<PathBuf, ShelfError> {
        let path = self.markup_path();
        tokio::fs::write(&path, markup)
            .await
            .map_err(ShelfError::Scratch)?;
        Ok(path)
    }

    /// Remove the directory now, reporting failures instead of ignoring them
    pub fn close(self) -> Result<(), ShelfError> {
        self.dir.close().map_err(ShelfError::Scratch)
    }
}
