//! Error types for patch parsing.

use serde::Serialize;
use thiserror::Error;

/// Errors that abort parsing of an entire patch stream.
///
/// Malformed file sections do not end up here; they are recorded per
/// section as [`SectionError`] so that independent sections in the same
/// stream can still be parsed.
#[derive(Debug, Error)]
pub enum PatchError {
    /// I/O failure reading the caller-supplied patch stream
    #[error("failed to read patch stream: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for patch operations.
pub type Result<T> = std::result::Result<T, PatchError>;

/// Recoverable failure of one file section within a patch stream.
///
/// Parsing skips to the next `---` header after recording one of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("patch section at line {line}: {message}")]
pub struct SectionError {
    /// 1-based line number in the patch stream where the section failed
    pub line: usize,
    pub message: String,
}
