//! Search request model.

use serde::{Deserialize, Serialize};

use crate::error::ShelfError;

/// Number of results requested per search
pub const RESULT_LIMIT: usize = 10;

/// Offset of the first requested result
pub const RESULT_OFFSET: usize = 0;

/// Sort order for search results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    /// Value used in the `sortOrder` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ascending",
            SortOrder::Descending => "descending",
        }
    }
}

/// Sort field for search results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    Relevance,
    LastUpdatedDate,
    SubmittedDate,
}

impl SortBy {
    /// Value used in the `sortBy` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Relevance => "relevance",
            SortBy::LastUpdatedDate => "lastUpdatedDate",
            SortBy::SubmittedDate => "submittedDate",
        }
    }
}

/// A fully-formed search request.
///
/// Built once from the user's terms with fixed paging and ordering, then
/// handed to a source. There are no setters: the request cannot change after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    terms: String,
    offset: usize,
    limit: usize,
    sort_by: SortBy,
    sort_order: SortOrder,
}

impl SearchRequest {
    /// Build a request for the given search terms.
    ///
    /// Terms are trimmed; an empty result is rejected with
    /// [`ShelfError::EmptyQuery`] so no request is ever sent for it.
    pub fn new(terms: &str) -> Result<Self, ShelfError> {
        let terms = terms.trim();
        if terms.is_empty() {
            return Err(ShelfError::EmptyQuery);
        }

        Ok(Self {
            terms: terms.to_string(),
            offset: RESULT_OFFSET,
            limit: RESULT_LIMIT,
            sort_by: SortBy::Relevance,
            sort_order: SortOrder::Descending,
        })
    }

    pub fn terms(&self) -> &str {
        &self.terms
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn sort_by(&self) -> SortBy {
        self.sort_by
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    /// Query parameters in the order the search API documents them
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("search_query", self.terms.clone()),
            ("start", self.offset.to_string()),
            ("max_results", self.limit.to_string()),
            ("sortBy", self.sort_by.as_str().to_string()),
            ("sortOrder", self.sort_order.as_str().to_string()),
        ]
    }

    /// Form-encoded query string (spaces become `+`)
    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query_pairs())
            .finish()
    }
}
