//! Error types for polyfade-feed.

use thiserror::Error;

/// Feed error types.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Feed disconnected: {0}")]
    Disconnected(String),

    #[error("Price fetch failed: {0}")]
    FetchFailed(String),

    #[error("Invalid price from source: {0}")]
    InvalidPrice(String),
}

/// Result type alias for feed operations.
pub type FeedResult<T> = std::result::Result<T, FeedError>;
