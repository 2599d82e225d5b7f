//! Registering converted books with the user's library.
//!
//! The [`LibraryStore`] trait is the seam between the import pipeline and the
//! collection that owns the books. Two stores ship with the crate:
//!
//! - [`CalibreLibrary`] adds books through calibre's `calibredb` command
//! - [`DirectoryLibrary`] files books into a plain directory tree with a
//!   `metadata.json` beside each one

mod calibre;
mod directory;

pub use calibre::{CalibreLibrary, DEFAULT_CALIBREDB};
pub use directory::DirectoryLibrary;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{LibraryBackend, LibraryConfig};
use crate::error::ShelfError;
use crate::models::{PaperRecord, DEFAULT_ARXIV_ID, DEFAULT_PUBLISHED, DEFAULT_SUMMARY};

/// Title used when a record has none
pub const FALLBACK_TITLE: &str = "Unknown Title";

/// Author used when a record has none
pub const FALLBACK_AUTHOR: &str = "Unknown Author";

/// Packaged e-book formats the converter can be asked for
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum BookFormat {
    #[default]
    Epub,
    Azw3,
    Mobi,
    Pdf,
}

impl BookFormat {
    /// Format tag as the library knows it (e.g. `"EPUB"`)
    pub fn tag(&self) -> &'static str {
        match self {
            BookFormat::Epub => "EPUB",
            BookFormat::Azw3 => "AZW3",
            BookFormat::Mobi => "MOBI",
            BookFormat::Pdf => "PDF",
        }
    }

    /// File extension, which is also what tells the converter the target format
    pub fn extension(&self) -> &'static str {
        match self {
            BookFormat::Epub => "epub",
            BookFormat::Azw3 => "azw3",
            BookFormat::Mobi => "mobi",
            BookFormat::Pdf => "pdf",
        }
    }
}

impl std::fmt::Display for BookFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl std::str::FromStr for BookFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "epub" => Ok(BookFormat::Epub),
            "azw3" => Ok(BookFormat::Azw3),
            "mobi" => Ok(BookFormat::Mobi),
            "pdf" => Ok(BookFormat::Pdf),
            other => Err(format!("unsupported book format: {}", other)),
        }
    }
}

/// Minimal metadata registered with a book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookMetadata {
    pub title: String,
    pub authors: Vec<String>,
    pub published: Option<String>,
    pub arxiv_id: Option<String>,
    pub arxiv_url: Option<String>,
    pub summary: Option<String>,
    pub tags: Vec<String>,
}

impl BookMetadata {
    /// Metadata for a search result; placeholder values are dropped.
    pub fn from_record(record: &PaperRecord) -> Self {
        let title = match record.title.trim() {
            "" => FALLBACK_TITLE.to_string(),
            title => title.to_string(),
        };

        let mut authors: Vec<String> = record.author_list().into_iter().map(String::from).collect();
        if authors.is_empty() {
            authors.push(FALLBACK_AUTHOR.to_string());
        }

        let known = |value: &str, placeholder: &str| {
            (value != placeholder && !value.trim().is_empty()).then(|| value.to_string())
        };

        Self {
            title,
            authors,
            published: known(&record.published, DEFAULT_PUBLISHED),
            arxiv_id: known(&record.arxiv_id, DEFAULT_ARXIV_ID),
            arxiv_url: record.has_url().then(|| record.arxiv_url.clone()),
            summary: known(&record.summary, DEFAULT_SUMMARY),
            tags: vec!["arXiv".to_string()],
        }
    }
}

/// Where a registered book ended up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryEntry {
    /// Store-specific location (book id, directory, ...)
    pub location: String,
}

/// A collection that accepts new books.
#[async_trait]
pub trait LibraryStore: Send + Sync + std::fmt::Debug {
    /// Human-readable name of this store
    fn name(&self) -> &str;

    /// Add one book, available in each of `formats`, under `metadata`.
    ///
    /// The files are copied; the caller keeps ownership of the originals.
    async fn add_book(
        &self,
        metadata: &BookMetadata,
        formats: &BTreeMap<BookFormat, PathBuf>,
    ) -> Result<LibraryEntry, ShelfError>;
}

/// Open the store described by the configuration
pub fn open_library(config: &LibraryConfig) -> Arc<dyn LibraryStore> {
    let path = config.resolved_path();
    match config.backend {
        LibraryBackend::Calibre => {
            Arc::new(CalibreLibrary::new(path).calibredb(config.calibredb.clone()))
        }
        LibraryBackend::Directory => Arc::new(DirectoryLibrary::new(path)),
    }
}
