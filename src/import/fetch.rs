//! Fetching the rendered full-text document of a paper.

use std::sync::Arc;

use crate::error::ShelfError;
use crate::utils::HttpClient;

/// Downloads a paper's HTML rendering.
#[derive(Debug, Clone)]
pub struct DocumentFetcher {
    client: Arc<HttpClient>,
}

impl DocumentFetcher {
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self { client }
    }

    /// One GET for `url`; no retry.
    pub async fn fetch_markup(&self, url: &str) -> Result<Vec<u8>, ShelfError> {
        tracing::debug!(%url, "Fetching document");

        let markup = self.client.get_bytes(url, &[]).await.map_err(|source| {
            tracing::warn!(%url, error = %source, "Document fetch failed");
            ShelfError::DocumentFetchFailed {
                url: url.to_string(),
                source,
            }
        })?;

        tracing::debug!(%url, bytes = markup.len(), "Fetched document");
        Ok(markup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher() -> DocumentFetcher {
        DocumentFetcher::new(Arc::new(HttpClient::new().unwrap()))
    }

    #[tokio::test]
    async fn test_fetch_markup() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/html/1706.03762")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<html><body>paper</body></html>")
            .create_async()
            .await;

        let markup = fetcher()
            .fetch_markup(&format!("{}/html/1706.03762", server.url()))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(markup, b"<html><body>paper</body></html>");
    }

    #[tokio::test]
    async fn test_fetch_markup_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/html/0000.00000")
            .with_status(404)
            .create_async()
            .await;

        let url = format!("{}/html/0000.00000", server.url());
        let err = fetcher().fetch_markup(&url).await.unwrap_err();
        match err {
            ShelfError::DocumentFetchFailed { url: failed, .. } => assert_eq!(failed, url),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_placeholder_url_fails() {
        let err = fetcher().fetch_markup("N/A").await.unwrap_err();
        assert!(matches!(err, ShelfError::DocumentFetchFailed { .. }));
    }
}
