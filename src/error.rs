//! Error type shared by the search and import pipelines.

/// Errors that can occur while searching arXiv or importing a paper.
///
/// Each variant is terminal for the operation that produced it; nothing in
/// the crate retries.
#[derive(Debug, thiserror::Error)]
pub enum ShelfError {
    /// The search terms were empty after trimming
    #[error("Please enter search terms.")]
    EmptyQuery,

    /// No record is selected, or the requested pick is out of range
    #[error("No paper selected")]
    NoSelection,

    /// Network, timeout or HTTP status error while querying the search API
    #[error("Search failed: {0}")]
    SearchFailed(#[source] reqwest::Error),

    /// The search response is not a well-formed XML document
    #[error("Failed to parse search response: {0}")]
    ParseFailed(String),

    /// Network, timeout or HTTP status error while fetching the rendered paper
    #[error("Failed to fetch {url}: {source}")]
    DocumentFetchFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The external converter is missing, failed, or timed out
    #[error("Conversion failed: {0}")]
    ConversionFailed(String),

    /// The library store rejected the book
    #[error("Failed to add book to library: {0}")]
    RegistrationFailed(String),

    /// The scratch staging area could not be prepared
    #[error("Scratch directory error: {0}")]
    Scratch(#[source] std::io::Error),

    /// A background import task stopped before reporting a result
    #[error("Import task stopped: {0}")]
    TaskFailed(String),
}

impl From<quick_xml::Error> for ShelfError {
    fn from(err: quick_xml::Error) -> Self {
        ShelfError::ParseFailed(format!("XML: {}", err))
    }
}
