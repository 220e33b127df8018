//! Deploy error types.

use mintdeploy_metadata::MetadataError;
use mintdeploy_publish::PublishError;

use crate::types::{DeploymentResult, Stage};

/// Errors produced by a pipeline stage.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("missing configuration: {}", .keys.join(", "))]
    MissingConfiguration { keys: Vec<String> },

    #[error("invalid job: {0}")]
    InvalidJob(String),

    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("publish error: {0}")]
    Publish(#[from] PublishError),

    #[error("deployment tool failed: {reason} (exit status {}): {}", display_status(.result.process_exit_status), .result.stderr.trim_end())]
    ExternalProcessFailure {
        reason: String,
        result: Box<DeploymentResult>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cancelled")]
    Cancelled,
}

fn display_status(status: Option<i32>) -> String {
    status.map_or_else(|| "none".to_string(), |s| s.to_string())
}

/// A pipeline run that stopped at `stage`.
#[derive(Debug, thiserror::Error)]
#[error("deployment failed during {stage}: {cause}")]
pub struct PipelineFailure {
    pub stage: Stage,
    #[source]
    pub cause: DeployError,
}
