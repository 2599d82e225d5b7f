//! Utility modules shared by the search and import pipelines.
//!
//! - [`HttpClient`]: HTTP client carrying the timeout and user-agent policy
//! - [`sanitize_path_component`]: make a title or name safe as a file name
//! - [`truncate_chars`]: character-aware truncation for display
//!
//! ```rust,no_run
//! use arxiv_shelf::utils::HttpClient;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new()?;
//! let body = client.get_bytes("https://arxiv.org/html/1706.03762", &[]).await?;
//! # Ok(())
//! # }
//! ```

mod http;
mod text;

pub use http::{HttpClient, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
pub use text::{sanitize_path_component, truncate_chars};
