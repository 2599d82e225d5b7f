//! Core data models for search requests and paper records.

mod paper;
mod search;

pub use paper::{
    PaperRecord, DEFAULT_ARXIV_ID, DEFAULT_ARXIV_URL, DEFAULT_AUTHORS, DEFAULT_PUBLISHED,
    DEFAULT_SUMMARY, DEFAULT_TITLE,
};
pub use search::{SearchRequest, SortBy, SortOrder, RESULT_LIMIT, RESULT_OFFSET};
