//! Error types for feedscout.

use thiserror::Error;

/// Common error type for feedscout.
#[derive(Error, Debug)]
pub enum FeedscoutError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Feed fetch error (network, status, size caps).
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Feed or OPML parse error.
    #[error("parse error: {0}")]
    Parse(String),

    /// Cache store error (corrupt or unwritable cache files).
    #[error("cache error: {0}")]
    Cache(String),

    /// Search engine error.
    ///
    /// Raised for structural problems (bad internal state, pattern
    /// compilation), never for a query that merely matches nothing.
    #[error("search error: {0}")]
    Search(String),

    /// Search deadline exceeded.
    #[error("search timed out after {0} ms")]
    SearchTimeout(u64),

    /// HTTP server error.
    #[error("server error: {0}")]
    Server(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),
}

impl From<serde_json::Error> for FeedscoutError {
    fn from(e: serde_json::Error) -> Self {
        FeedscoutError::Cache(e.to_string())
    }
}

impl From<reqwest::Error> for FeedscoutError {
    fn from(e: reqwest::Error) -> Self {
        FeedscoutError::Fetch(e.to_string())
    }
}

/// Result type alias for feedscout operations.
pub type Result<T> = std::result::Result<T, FeedscoutError>;
