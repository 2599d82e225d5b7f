//! # arxiv-shelf
//!
//! Search arXiv and add papers to an e-book library.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Search requests and paper records
//! - [`sources`]: The arXiv search API and its Atom feed parser behind the [`PaperSource`] trait
//! - [`session`]: The result list of the latest search and the current selection
//! - [`import`]: Fetch a paper's HTML rendering, convert it, and register the book
//! - [`library`]: calibre and plain-directory book stores
//! - [`ui`]: Terminal rendering
//! - [`utils`]: HTTP client and text helpers
//! - [`config`]: Configuration management

pub mod config;
pub mod error;
pub mod import;
pub mod library;
pub mod models;
pub mod session;
pub mod sources;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use error::ShelfError;
pub use import::{ImportOutcome, ImportPipeline};
pub use models::{PaperRecord, SearchRequest};
pub use session::SearchSession;
pub use sources::{ArxivSource, PaperSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
