//! Paper record model produced by search and consumed by the import pipeline.

use serde::{Deserialize, Serialize};

pub const DEFAULT_TITLE: &str = "No title available";
pub const DEFAULT_AUTHORS: &str = "Unknown authors";
pub const DEFAULT_SUMMARY: &str = "No abstract available";
pub const DEFAULT_PUBLISHED: &str = "Unknown date";
pub const DEFAULT_ARXIV_ID: &str = "Unknown ID";
pub const DEFAULT_ARXIV_URL: &str = "N/A";

/// One normalized, display-ready search result.
///
/// Every field always holds either an extracted value or its documented
/// default; none is ever empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRecord {
    /// Title with newlines collapsed to single spaces
    pub title: String,

    /// Author display names joined with ", "
    pub authors: String,

    /// Abstract text
    pub summary: String,

    /// Publication date (`YYYY-MM-DD`)
    pub published: String,

    /// Last path segment of the canonical identifier URL
    pub arxiv_id: String,

    /// Canonical identifier URL
    pub arxiv_url: String,
}

impl Default for PaperRecord {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            authors: DEFAULT_AUTHORS.to_string(),
            summary: DEFAULT_SUMMARY.to_string(),
            published: DEFAULT_PUBLISHED.to_string(),
            arxiv_id: DEFAULT_ARXIV_ID.to_string(),
            arxiv_url: DEFAULT_ARXIV_URL.to_string(),
        }
    }
}

impl PaperRecord {
    /// Build a record from a canonical identifier URL alone; every other
    /// field takes its default.
    pub fn from_url(url: &str) -> Self {
        let mut record = Self::default();
        record.set_identifier(url);
        record
    }

    /// Set `arxiv_url` and `arxiv_id` from an identifier URL.
    ///
    /// Blank input leaves both defaults in place. A URL ending in `/` yields
    /// an empty last segment, so the id keeps its default.
    pub(crate) fn set_identifier(&mut self, url: &str) {
        let url = url.trim();
        if url.is_empty() {
            return;
        }
        self.arxiv_url = url.to_string();
        if let Some(id) = url.rsplit('/').next().filter(|s| !s.is_empty()) {
            self.arxiv_id = id.to_string();
        }
    }

    /// Author names as a vector (empty when the authors are unknown)
    pub fn author_list(&self) -> Vec<&str> {
        if self.authors == DEFAULT_AUTHORS {
            return Vec::new();
        }
        self.authors
            .split(", ")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Whether the record carries a usable identifier URL
    pub fn has_url(&self) -> bool {
        self.arxiv_url != DEFAULT_ARXIV_URL
    }
}
