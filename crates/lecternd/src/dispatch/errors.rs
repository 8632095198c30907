//! Error types for the per-connection session loop.

use std::io;

use thiserror::Error;

/// Errors surfaced while reading or writing session frames.
///
/// These are transport-level failures; routing failures never appear here
/// because every routed request produces a response envelope instead.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A request line exceeded the maximum allowed size.
    #[error("request too large: {size} bytes exceeds {limit} byte limit")]
    LineTooLarge { size: usize, limit: usize },

    /// IO error during read or write.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Frame serialization failed.
    #[error("failed to serialize frame: {0}")]
    Serialize(#[from] serde_json::Error),
}
