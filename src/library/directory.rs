//! Plain-directory library store.
//!
//! Books are filed as `<root>/<first author>/<title> (<arXiv id>)/<title>.<ext>`
//! with a `metadata.json` next to them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ShelfError;
use crate::library::{
    BookFormat, BookMetadata, LibraryEntry, LibraryStore, FALLBACK_AUTHOR, FALLBACK_TITLE,
};
use crate::utils::sanitize_path_component;

const METADATA_FILE: &str = "metadata.json";

/// Contents of `metadata.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredBook {
    #[serde(flatten)]
    pub metadata: BookMetadata,

    /// Format tag to file name within the book directory
    pub formats: BTreeMap<String, String>,
}

/// A library that is just a directory tree.
#[derive(Debug, Clone)]
pub struct DirectoryLibrary {
    root: PathBuf,
}

impl DirectoryLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory a book with this metadata is filed under
    pub fn book_dir(&self, metadata: &BookMetadata) -> PathBuf {
        let author = metadata
            .authors
            .first()
            .and_then(|a| sanitize_path_component(a))
            .unwrap_or_else(|| FALLBACK_AUTHOR.to_string());
        let title = sanitize_path_component(&metadata.title)
            .unwrap_or_else(|| FALLBACK_TITLE.to_string());
        let leaf = match metadata.arxiv_id.as_deref().and_then(sanitize_path_component) {
            Some(id) => format!("{} ({})", title, id),
            None => title,
        };
        self.root.join(author).join(leaf)
    }

    /// Read back the metadata stored for a book directory
    pub async fn read_metadata(book_dir: &Path) -> Result<StoredBook, ShelfError> {
        let raw = tokio::fs::read(book_dir.join(METADATA_FILE))
            .await
            .map_err(|e| ShelfError::RegistrationFailed(e.to_string()))?;
        serde_json::from_slice(&raw).map_err(|e| ShelfError::RegistrationFailed(e.to_string()))
    }
}

fn io_failure(action: &str, path: &Path, err: std::io::Error) -> ShelfError {
    ShelfError::RegistrationFailed(format!("cannot {} {}: {}", action, path.display(), err))
}

#[async_trait]
impl LibraryStore for DirectoryLibrary {
    fn name(&self) -> &str {
        "directory"
    }

    async fn add_book(
        &self,
        metadata: &BookMetadata,
        formats: &BTreeMap<BookFormat, PathBuf>,
    ) -> Result<LibraryEntry, ShelfError> {
        if formats.is_empty() {
            return Err(ShelfError::RegistrationFailed(
                "no book files to add".to_string(),
            ));
        }

        let dir = self.book_dir(metadata);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| io_failure("create", &dir, e))?;

        let stem = sanitize_path_component(&metadata.title)
            .unwrap_or_else(|| FALLBACK_TITLE.to_string());
        let mut stored = BTreeMap::new();
        for (format, source) in formats {
            let file_name = format!("{}.{}", stem, format.extension());
            let target = dir.join(&file_name);
            tokio::fs::copy(source, &target)
                .await
                .map_err(|e| io_failure("copy", source, e))?;
            stored.insert(format.tag().to_string(), file_name);
        }

        let record = StoredBook {
            metadata: metadata.clone(),
            formats: stored,
        };
        let json = serde_json::to_vec_pretty(&record)
            .map_err(|e| ShelfError::RegistrationFailed(e.to_string()))?;
        let metadata_path = dir.join(METADATA_FILE);
        tokio::fs::write(&metadata_path, json)
            .await
            .map_err(|e| io_failure("write", &metadata_path, e))?;

        tracing::debug!(dir = %dir.display(), "Filed book in directory library");
        Ok(LibraryEntry {
            location: dir.display().to_string(),
        })
    }
}
