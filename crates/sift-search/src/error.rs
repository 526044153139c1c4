//! Error types for search construction.
//!
//! Per-file read failures never surface here; they are absorbed at the
//! single-file level so one unreadable file cannot abort a tree-wide
//! search.

use thiserror::Error;

/// Errors that can occur while setting up a search.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Query pattern could not be compiled
    #[error("invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;
