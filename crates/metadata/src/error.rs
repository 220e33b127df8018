//! Metadata error types.

use std::path::PathBuf;

/// Errors produced while loading, validating or rewriting metadata.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("malformed token metadata filename: {} (expected a positive integer stem)", .0.display())]
    MalformedTokenMetadataFilename(PathBuf),

    #[error("token indices are not contiguous in 1..={count}: missing {missing:?}, out of range {unexpected:?}")]
    NonContiguousTokenIndices {
        count: usize,
        missing: Vec<u64>,
        unexpected: Vec<u64>,
    },
}
