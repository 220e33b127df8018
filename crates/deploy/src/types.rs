//! Pipeline stages, events and results.

use std::fmt;

/// Stage of a deployment run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Init,
    PublishingImages,
    RewritingContractMetadata,
    PublishingContractMetadata,
    RewritingTokenMetadata,
    PublishingTokenMetadata,
    Invoking,
    Done,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::PublishingImages => "publishing images",
            Self::RewritingContractMetadata => "rewriting contract metadata",
            Self::PublishingContractMetadata => "publishing contract metadata",
            Self::RewritingTokenMetadata => "rewriting token metadata",
            Self::PublishingTokenMetadata => "publishing token metadata",
            Self::Invoking => "invoking deployment tool",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress reported while a job runs.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// A stage began.
    StageStarted { stage: Stage },
    /// A file was uploaded.
    AssetPublished {
        stage: Stage,
        path: String,
        url: String,
    },
    /// A file was not uploaded. Fatal only if the file was required.
    AssetFailed {
        stage: Stage,
        path: String,
        error: String,
    },
    /// The run finished successfully.
    Completed,
    /// The run stopped at `stage`.
    Failed { stage: Stage, error: String },
}

/// Outcome of the deployment tool invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentResult {
    pub contract_metadata_uri: String,
    pub token_base_uri: String,
    pub symbol: String,
    /// `None` when the process never ran to completion.
    pub process_exit_status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Result of a successful pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutcome {
    pub collection_name: String,
    pub symbol: String,
    pub token_count: usize,
    pub token_base_uri: String,
    pub contract_metadata_uri: String,
    /// `None` in metadata-only runs.
    pub deployment: Option<DeploymentResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_ordered() {
        assert!(Stage::Init < Stage::PublishingImages);
        assert!(Stage::PublishingTokenMetadata < Stage::Invoking);
        assert!(Stage::Invoking < Stage::Done);
    }

    #[test]
    fn stage_display() {
        assert_eq!(Stage::RewritingTokenMetadata.to_string(), "rewriting token metadata");
    }
}
