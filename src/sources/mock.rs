//! Mock source for testing purposes.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::error::ShelfError;
use crate::models::{PaperRecord, SearchRequest};
use crate::sources::PaperSource;

/// A mock source that returns predefined records and remembers the
/// requests it received.
#[derive(Debug, Default)]
pub struct MockSource {
    records: Mutex<Vec<PaperRecord>>,
    fail_with: Mutex<Option<String>>,
    requests: Mutex<Vec<SearchRequest>>,
}

impl MockSource {
    /// Create a new mock source with no records.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock source that returns the given records.
    pub fn with_records(records: Vec<PaperRecord>) -> Self {
        let source = Self::new();
        source.set_records(records);
        source
    }

    /// Set the records to return.
    pub fn set_records(&self, records: Vec<PaperRecord>) {
        *self.records.lock().unwrap() = records;
    }

    /// Make every following search fail with a parse error carrying `message`.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.fail_with.lock().unwrap() = Some(message.into());
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<SearchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaperSource for MockSource {
    fn id(&self) -> &str {
        "mock"
    }

    fn name(&self) -> &str {
        "Mock Source"
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<PaperRecord>, ShelfError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(message) = self.fail_with.lock().unwrap().clone() {
            return Err(ShelfError::ParseFailed(message));
        }
        Ok(self.records.lock().unwrap().clone())
    }

    /// Rewrites `/abs/` to `/html/` on any host, so records can point at a
    /// local test server.
    fn resolve_document_url(&self, record: &PaperRecord) -> String {
        record.arxiv_url.replacen("/abs/", "/html/", 1)
    }
}

/// Helper function to create a record for testing.
pub fn make_record(arxiv_url: &str, title: &str) -> PaperRecord {
    let mut record = PaperRecord::from_url(arxiv_url);
    record.title = title.to_string();
    record
}
