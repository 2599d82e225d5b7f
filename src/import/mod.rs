//! Turning a selected search result into a book in the library.
//!
//! An import runs four steps in order, each of which either succeeds or ends
//! the import with its own error:
//!
//! 1. resolve the record to the URL of its HTML rendering
//! 2. fetch that document into a fresh [`ScratchSpace`]
//! 3. convert it with the configured [`Converter`]
//! 4. register the book with the [`LibraryStore`]
//!
//! [`ImportPipeline::run`] executes the steps on the caller's task.
//! [`ImportPipeline::spawn`] executes them on a background task and streams
//! [`ImportEvent`]s back so an interactive caller stays responsive.

mod convert;
mod fetch;
mod scratch;

pub use convert::{Converter, EbookConvert, DEFAULT_CONVERTER, DEFAULT_CONVERT_TIMEOUT};
pub use fetch::DocumentFetcher;
pub use scratch::ScratchSpace;

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::ShelfError;
use crate::library::{BookFormat, BookMetadata, LibraryStore};
use crate::models::PaperRecord;
use crate::sources::PaperSource;

/// State of one import while it is in flight
#[derive(Debug, Clone)]
pub struct ConversionJob {
    /// URL the document is fetched from
    pub source_url: String,
    /// Staged markup
    pub markup_path: PathBuf,
    /// Converted book
    pub book_path: PathBuf,
    /// The record being imported
    pub record: PaperRecord,
}

/// Result of a completed import
#[derive(Debug, Clone, Serialize)]
pub struct ImportOutcome {
    pub record: PaperRecord,
    pub document_url: String,
    pub format: BookFormat,
    /// Where the library put the book
    pub location: String,
}

/// Progress reported by a background import
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportEvent {
    Resolved { url: String },
    Fetched { bytes: usize },
    Converted { path: PathBuf },
    Registered { location: String },
}

/// Resolve, fetch, convert and register one paper.
#[derive(Debug)]
pub struct ImportPipeline {
    source: Arc<dyn PaperSource>,
    fetcher: DocumentFetcher,
    converter: Arc<dyn Converter>,
    library: Arc<dyn LibraryStore>,
    format: BookFormat,
    scratch_parent: Option<PathBuf>,
}

impl ImportPipeline {
    pub fn new(
        source: Arc<dyn PaperSource>,
        fetcher: DocumentFetcher,
        converter: Arc<dyn Converter>,
        library: Arc<dyn LibraryStore>,
    ) -> Self {
        Self {
            source,
            fetcher,
            converter,
            library,
            format: BookFormat::default(),
            scratch_parent: None,
        }
    }

    /// Book format to convert to
    pub fn format(mut self, format: BookFormat) -> Self {
        self.format = format;
        self
    }

    /// Directory under which per-import scratch directories are created
    pub fn scratch_parent(mut self, parent: Option<PathBuf>) -> Self {
        self.scratch_parent = parent;
        self
    }

    /// Import `record` on the current task.
    pub async fn run(&self, record: &PaperRecord) -> Result<ImportOutcome, ShelfError> {
        self.execute(record, None).await
    }

    /// Import `record` on a background task.
    pub fn spawn(self: &Arc<Self>, record: PaperRecord) -> ImportHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let pipeline = Arc::clone(self);
        let task = tokio::spawn(async move { pipeline.execute(&record, Some(&tx)).await });
        ImportHandle { events: rx, task }
    }

    async fn execute(
        &self,
        record: &PaperRecord,
        events: Option<&mpsc::UnboundedSender<ImportEvent>>,
    ) -> Result<ImportOutcome, ShelfError> {
        let notify = |event: ImportEvent| {
            if let Some(tx) = events {
                // The receiver may have gone away; the import still completes
                let _ = tx.send(event);
            }
        };

        let document_url = self.source.resolve_document_url(record);
        if !record.has_url() {
            tracing::warn!(
                title = %record.title,
                "Record has no paper URL; the document fetch will fail"
            );
        }
        notify(ImportEvent::Resolved {
            url: document_url.clone(),
        });

        let scratch = ScratchSpace::create(self.scratch_parent.as_deref())?;
        let job = ConversionJob {
            source_url: document_url.clone(),
            markup_path: scratch.markup_path(),
            book_path: scratch.book_path(self.format),
            record: record.clone(),
        };

        let markup = self.fetcher.fetch_markup(&job.source_url).await?;
        notify(ImportEvent::Fetched {
            bytes: markup.len(),
        });
        scratch.write_markup(&markup).await?;

        let book = self
            .converter
            .convert(&job.markup_path, &job.book_path)
            .await?;
        notify(ImportEvent::Converted { path: book.clone() });

        let metadata = BookMetadata::from_record(&job.record);
        let formats = BTreeMap::from([(self.format, book)]);
        let entry = self
            .library
            .add_book(&metadata, &formats)
            .await
            .inspect_err(|e| {
                tracing::warn!(library = self.library.name(), error = %e, "Registration failed");
            })?;
        notify(ImportEvent::Registered {
            location: entry.location.clone(),
        });

        if let Err(e) = scratch.close() {
            tracing::warn!(error = %e, "Could not remove scratch directory");
        }

        tracing::info!(
            arxiv_id = %job.record.arxiv_id,
            location = %entry.location,
            "Imported paper"
        );

        Ok(ImportOutcome {
            record: job.record,
            document_url,
            format: self.format,
            location: entry.location,
        })
    }
}

/// A running background import
#[derive(Debug)]
pub struct ImportHandle {
    events: mpsc::UnboundedReceiver<ImportEvent>,
    task: JoinHandle<Result<ImportOutcome, ShelfError>>,
}

impl ImportHandle {
    /// Next progress event; `None` once the import has finished
    pub async fn next_event(&mut self) -> Option<ImportEvent> {
        self.events.recv().await
    }

    /// Wait for the import to finish
    pub async fn finish(self) -> Result<ImportOutcome, ShelfError> {
        self.task
            .await
            .map_err(|e| ShelfError::TaskFailed(e.to_string()))?
    }
}
