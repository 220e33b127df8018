//! Publish error types.

use std::path::PathBuf;
use std::time::Duration;

/// Outcome of a single file that was not published.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssetError {
    #[error("unsupported content type: {extension:?}")]
    UnsupportedContentType { extension: String },

    #[error("upload failed: {0}")]
    UploadFailure(String),

    #[error("upload timed out after {0:?}")]
    Timeout(Duration),

    #[error("read failed: {0}")]
    Read(String),

    #[error("cancelled")]
    Cancelled,

    #[error("file not found")]
    Missing,
}

/// Errors produced by a publish call as a whole.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("{} required asset(s) not published: {}", .failures.len(), format_failures(.failures))]
    RequiredAssetsFailed { failures: Vec<(String, AssetError)> },

    #[error("cancelled")]
    Cancelled,
}

fn format_failures(failures: &[(String, AssetError)]) -> String {
    failures
        .iter()
        .map(|(path, err)| format!("{path} ({err})"))
        .collect::<Vec<_>>()
        .join(", ")
}
