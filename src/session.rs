//! Interactive search state: the current result list and which entry is selected.

use std::sync::Arc;

use crate::error::ShelfError;
use crate::models::{PaperRecord, SearchRequest};
use crate::sources::PaperSource;

/// Holds the results of the most recent search.
///
/// A new search clears the previous results before it is sent, so a failed
/// search leaves the session empty rather than showing stale entries.
#[derive(Debug)]
pub struct SearchSession {
    source: Arc<dyn PaperSource>,
    results: Vec<PaperRecord>,
    selected: Option<usize>,
}

impl SearchSession {
    pub fn new(source: Arc<dyn PaperSource>) -> Self {
        Self {
            source,
            results: Vec::new(),
            selected: None,
        }
    }

    /// Search for `terms` and replace the result list.
    ///
    /// Blank terms fail with [`ShelfError::EmptyQuery`] without touching the
    /// network or the current results. Otherwise the first record, if any, is
    /// selected.
    pub async fn search(&mut self, terms: &str) -> Result<&[PaperRecord], ShelfError> {
        let request = SearchRequest::new(terms)?;

        self.results.clear();
        self.selected = None;

        tracing::info!(terms = request.terms(), source = self.source.id(), "Searching");
        let records = self.source.search(&request).await?;
        tracing::debug!(count = records.len(), "Search returned");

        self.results = records;
        if !self.results.is_empty() {
            self.selected = Some(0);
        }
        Ok(&self.results)
    }

    pub fn results(&self) -> &[PaperRecord] {
        &self.results
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Select the record at `index` (0-based)
    pub fn select(&mut self, index: usize) -> Result<&PaperRecord, ShelfError> {
        let record = self.results.get(index).ok_or(ShelfError::NoSelection)?;
        self.selected = Some(index);
        Ok(record)
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    /// The selected record
    pub fn selected(&self) -> Result<&PaperRecord, ShelfError> {
        self.selected
            .and_then(|i| self.results.get(i))
            .ok_or(ShelfError::NoSelection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::mock::{make_record, MockSource};

    fn records(n: usize) -> Vec<PaperRecord> {
        (1..=n)
            .map(|i| {
                make_record(
                    &format!("http://arxiv.org/abs/2101.{:05}v1", i),
                    &format!("Paper {}", i),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_search_selects_first() {
        let source = Arc::new(MockSource::with_records(records(3)));
        let mut session = SearchSession::new(source.clone());

        let results = session.search("  graph neural networks ").await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(session.selected_index(), Some(0));
        assert_eq!(session.selected().unwrap().title, "Paper 1");

        let requests = source.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].terms(), "graph neural networks");
    }

    #[tokio::test]
    async fn test_empty_query_sends_nothing() {
        let source = Arc::new(MockSource::with_records(records(2)));
        let mut session = SearchSession::new(source.clone());
        session.search("first").await.unwrap();

        let err = session.search("   ").await.unwrap_err();
        assert!(matches!(err, ShelfError::EmptyQuery));
        assert_eq!(source.requests().len(), 1);
        // Previous results are kept
        assert_eq!(session.results().len(), 2);
    }

    #[tokio::test]
    async fn test_no_results() {
        let mut session = SearchSession::new(Arc::new(MockSource::new()));
        assert!(session.search("nothing").await.unwrap().is_empty());
        assert!(session.is_empty());
        assert!(matches!(session.selected(), Err(ShelfError::NoSelection)));
    }

    #[tokio::test]
    async fn test_failed_search_clears_results() {
        let source = Arc::new(MockSource::with_records(records(2)));
        let mut session = SearchSession::new(source.clone());
        session.search("first").await.unwrap();

        source.fail_with("unexpected end of document");
        let err = session.search("second").await.unwrap_err();
        assert!(matches!(err, ShelfError::ParseFailed(_)));
        assert!(session.is_empty());
        assert_eq!(session.selected_index(), None);
    }

    #[tokio::test]
    async fn test_new_search_replaces_results() {
        let source = Arc::new(MockSource::with_records(records(5)));
        let mut session = SearchSession::new(source.clone());
        session.search("first").await.unwrap();
        session.select(4).unwrap();

        source.set_records(records(2));
        session.search("second").await.unwrap();
        assert_eq!(session.results().len(), 2);
        assert_eq!(session.selected_index(), Some(0));
    }

    #[tokio::test]
    async fn test_select() {
        let mut session = SearchSession::new(Arc::new(MockSource::with_records(records(10))));
        session.search("anything").await.unwrap();

        assert_eq!(session.select(2).unwrap().title, "Paper 3");
        assert_eq!(session.selected().unwrap().arxiv_id, "2101.00003v1");
        assert!(matches!(session.select(10), Err(ShelfError::NoSelection)));
        // A bad pick keeps the previous selection
        assert_eq!(session.selected_index(), Some(2));
    }
}
