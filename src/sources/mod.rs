//! Paper sources: where search results and their full-text documents come from.
//!
//! This module defines the [`PaperSource`] trait that the search session and
//! the import pipeline talk to. [`ArxivSource`] is the production
//! implementation; [`MockSource`] returns canned records for tests.

mod arxiv;
mod feed;
pub mod mock;

pub use arxiv::{resolve_document_url, ArxivSource, ARXIV_API_URL};
pub use feed::{normalize_title, parse_feed, ATOM_NS};
pub use mock::MockSource;

use async_trait::async_trait;

use crate::error::ShelfError;
use crate::models::{PaperRecord, SearchRequest};

/// A searchable repository of papers.
#[async_trait]
pub trait PaperSource: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source
    fn id(&self) -> &str;

    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Run one search and return the records in the order the service sent them
    async fn search(&self, request: &SearchRequest) -> Result<Vec<PaperRecord>, ShelfError>;

    /// URL of the full-text rendering of a record.
    ///
    /// Records that carry no recognisable paper URL are passed through
    /// unchanged; fetching such a URL is expected to fail.
    fn resolve_document_url(&self, record: &PaperRecord) -> String {
        record.arxiv_url.clone()
    }
}
