//! arXiv research source implementation.

use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, OnceLock};

use crate::error::ShelfError;
use crate::models::{PaperRecord, SearchRequest};
use crate::sources::{parse_feed, PaperSource};
use crate::utils::HttpClient;

/// Base URL for arXiv API
pub const ARXIV_API_URL: &str = "http://export.arxiv.org/api/query";

/// `abs/` right after the scheme and host of an arxiv.org paper URL
fn abs_path_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(https?://arxiv\.org/)abs/").expect("abs path pattern is valid")
    })
}

/// Rewrite a paper's abstract-page URL into its HTML full-text URL.
///
/// Only an `abs/` segment directly after `arxiv.org` is rewritten, and only
/// once. Anything else (other hosts, the `"N/A"` placeholder) comes back as is.
///
/// ```
/// use arxiv_shelf::sources::resolve_document_url;
///
/// assert_eq!(
///     resolve_document_url("http://arxiv.org/abs/1234.5678"),
///     "http://arxiv.org/html/1234.5678"
/// );
/// assert_eq!(resolve_document_url("N/A"), "N/A");
/// ```
pub fn resolve_document_url(arxiv_url: &str) -> String {
    abs_path_pattern()
        .replace(arxiv_url, "${1}html/")
        .into_owned()
}

/// arXiv research source
///
/// Supports:
/// - Search by free-text terms through the Atom export API
/// - Resolving a result to its HTML full-text rendering
#[derive(Debug, Clone)]
pub struct ArxivSource {
    client: Arc<HttpClient>,
    endpoint: String,
}

impl ArxivSource {
    /// Create with a custom HTTP client and endpoint (configuration and tests)
    pub fn with_client(client: Arc<HttpClient>, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// Search endpoint this source queries
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Full request URL for a search
    pub fn request_url(&self, request: &SearchRequest) -> String {
        let separator = if self.endpoint.contains('?') { '&' } else { '?' };
        format!("{}{}{}", self.endpoint, separator, request.to_query_string())
    }

    /// Fetch the raw Atom response for a search.
    ///
    /// One attempt only; any network failure, timeout or error status is
    /// reported as [`ShelfError::SearchFailed`].
    pub async fn fetch(&self, request: &SearchRequest) -> Result<Vec<u8>, ShelfError> {
        let url = self.request_url(request);
        tracing::debug!(%url, "Searching arXiv");

        self.client
            .get_bytes(&url, &[("Accept", "application/atom+xml")])
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "arXiv search request failed");
                ShelfError::SearchFailed(e)
            })
    }
}

#[async_trait]
impl PaperSource for ArxivSource {
    fn id(&self) -> &str {
        "arxiv"
    }

    fn name(&self) -> &str {
        "arXiv"
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<PaperRecord>, ShelfError> {
        let body = self.fetch(request).await?;
        parse_feed(&body).inspect_err(|e| {
            tracing::warn!(error = %e, bytes = body.len(), "arXiv response could not be parsed");
        })
    }

    fn resolve_document_url(&self, record: &PaperRecord) -> String {
        resolve_document_url(&record.arxiv_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>arXiv Search Results</title>
  <entry>
    <id>http://arxiv.org/abs/2301.12345v1</id>
    <title>Test Paper Title</title>
    <summary>Test abstract</summary>
    <published>2023-01-15T10:00:00Z</published>
    <author><name>Test Author</name></author>
    <link rel="alternate" type="text/html" href="http://arxiv.org/abs/2301.12345v1"/>
  </entry>
</feed>"#;

    fn source_for(server: &mockito::Server) -> ArxivSource {
        let client = Arc::new(HttpClient::new().unwrap());
        ArxivSource::with_client(client, format!("{}/api/query", server.url()))
    }

    #[test]
    fn test_resolve_document_url() {
        assert_eq!(
            resolve_document_url("http://arxiv.org/abs/1234.5678"),
            "http://arxiv.org/html/1234.5678"
        );
        assert_eq!(
            resolve_document_url("https://arxiv.org/abs/2301.12345v2"),
            "https://arxiv.org/html/2301.12345v2"
        );
    }

    #[test]
    fn test_resolve_document_url_first_occurrence_only() {
        assert_eq!(
            resolve_document_url("http://arxiv.org/abs/abs/1"),
            "http://arxiv.org/html/abs/1"
        );
    }

    #[test]
    fn test_resolve_document_url_passthrough() {
        assert_eq!(resolve_document_url("N/A"), "N/A");
        assert_eq!(
            resolve_document_url("http://arxiv.org/pdf/1234.5678"),
            "http://arxiv.org/pdf/1234.5678"
        );
        assert_eq!(
            resolve_document_url("http://example.org/papers/abs/1"),
            "http://example.org/papers/abs/1"
        );
        assert_eq!(
            resolve_document_url("http://mirror.example/abs/1234.5678"),
            "http://mirror.example/abs/1234.5678"
        );
        assert_eq!(
            resolve_document_url("http://export.arxiv.org/abs/1234.5678"),
            "http://export.arxiv.org/abs/1234.5678"
        );
    }

    #[test]
    fn test_request_url() {
        let source = ArxivSource::with_client(Arc::new(HttpClient::new().unwrap()), ARXIV_API_URL);
        let request = SearchRequest::new("quantum computing").unwrap();
        assert_eq!(
            source.request_url(&request),
            "http://export.arxiv.org/api/query?search_query=quantum+computing&start=0&max_results=10&sortBy=relevance&sortOrder=descending"
        );
    }

    #[tokio::test]
    async fn test_search_with_mock_http() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/query")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("search_query".into(), "quantum computing".into()),
                Matcher::UrlEncoded("start".into(), "0".into()),
                Matcher::UrlEncoded("max_results".into(), "10".into()),
                Matcher::UrlEncoded("sortBy".into(), "relevance".into()),
                Matcher::UrlEncoded("sortOrder".into(), "descending".into()),
            ]))
            .match_header("user-agent", crate::utils::DEFAULT_USER_AGENT)
            .with_status(200)
            .with_header("content-type", "application/atom+xml")
            .with_body(FEED)
            .create_async()
            .await;

        let source = source_for(&server);
        let request = SearchRequest::new("quantum computing").unwrap();
        let records = source.search(&request).await.unwrap();

        mock.assert_async().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Test Paper Title");
        assert_eq!(records[0].authors, "Test Author");
        assert_eq!(records[0].published, "2023-01-15");
        assert_eq!(records[0].arxiv_id, "2301.12345v1");
    }

    #[tokio::test]
    async fn test_search_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/query")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let source = source_for(&server);
        let request = SearchRequest::new("anything").unwrap();
        let err = source.search(&request).await.unwrap_err();
        assert!(matches!(err, ShelfError::SearchFailed(_)));
    }

    #[tokio::test]
    async fn test_search_connection_refused() {
        let client = Arc::new(HttpClient::new().unwrap());
        let source = ArxivSource::with_client(client, "http://127.0.0.1:9/api/query");
        let request = SearchRequest::new("anything").unwrap();
        let err = source.search(&request).await.unwrap_err();
        assert!(matches!(err, ShelfError::SearchFailed(_)));
    }

    #[tokio::test]
    async fn test_search_malformed_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/query")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("Rate exceeded.")
            .create_async()
            .await;

        let source = source_for(&server);
        let request = SearchRequest::new("anything").unwrap();
        let err = source.search(&request).await.unwrap_err();
        assert!(matches!(err, ShelfError::ParseFailed(_)));
    }
}
