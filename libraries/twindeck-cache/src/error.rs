//! Error types for the song cache.

use thiserror::Error;

/// Errors that can occur while filling the cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Server returned {status} for {url}")]
    Status { status: u16, url: String },

    /// File name reduces to nothing usable
    #[error("Invalid cache file name: {0:?}")]
    InvalidFileName(String),

    /// IO error while writing the file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
