//! A collection deployment job and its on-disk layout.
//!
//! ```text
//! {artifacts_root}/{collection}/images/contract/{image,banner_image,featured_image}.jpeg
//! {artifacts_root}/{collection}/images/tokens/{1..N}.jpeg
//! {artifacts_root}/{collection}/metadata/contract/metadata.json
//! {artifacts_root}/{collection}/metadata/tokens/{1..N}.json
//! ```
//!
//! Remote keys mirror the layout under [`REMOTE_ROOT`], whatever the local
//! artifacts root is called.

use std::path::{Path, PathBuf};

use crate::error::DeployError;

/// Key prefix of every published object.
pub const REMOTE_ROOT: &str = "deployment-artifacts";

/// Default local artifacts directory.
pub const DEFAULT_ARTIFACTS_ROOT: &str = "deployment-artifacts";

pub const CONTRACT_METADATA_FILE: &str = "metadata.json";

/// One collection to publish and deploy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionDeploymentJob {
    artifacts_root: PathBuf,
    collection_name: String,
    metadata_only: bool,
}

impl CollectionDeploymentJob {
    /// Creates a job, rejecting names that cannot be used as a single path
    /// segment.
    pub fn new(
        artifacts_root: impl Into<PathBuf>,
        collection_name: impl Into<String>,
    ) -> Result<Self, DeployError> {
        let collection_name = collection_name.into();

        if collection_name.trim().is_empty() {
            return Err(DeployError::InvalidJob("collection name is blank".into()));
        }
        if collection_name == "." || collection_name == ".." {
            return Err(DeployError::InvalidJob(format!(
                "collection name {collection_name:?} is not a directory name"
            )));
        }
        if collection_name
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_control())
        {
            return Err(DeployError::InvalidJob(format!(
                "collection name {collection_name:?} contains a path separator or control character"
            )));
        }

        Ok(Self {
            artifacts_root: artifacts_root.into(),
            collection_name,
            metadata_only: false,
        })
    }

    /// Publishes and rewrites everything but skips the deployment tool.
    pub fn with_metadata_only(mut self, metadata_only: bool) -> Self {
        self.metadata_only = metadata_only;
        self
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    pub fn metadata_only(&self) -> bool {
        self.metadata_only
    }

    pub fn artifacts_root(&self) -> &Path {
        &self.artifacts_root
    }

    pub fn collection_dir(&self) -> PathBuf {
        self.artifacts_root.join(&self.collection_name)
    }

    pub fn images_dir(&self) -> PathBuf {
        self.collection_dir().join("images")
    }

    pub fn contract_metadata_file(&self) -> PathBuf {
        self.collection_dir()
            .join("metadata")
            .join("contract")
            .join(CONTRACT_METADATA_FILE)
    }

    pub fn token_metadata_dir(&self) -> PathBuf {
        self.collection_dir().join("metadata").join("tokens")
    }

    /// `deployment-artifacts/{collection}`
    fn remote_base(&self) -> String {
        format!("{REMOTE_ROOT}/{}", self.collection_name)
    }

    pub fn images_key_base(&self) -> String {
        format!("{}/images", self.remote_base())
    }

    pub fn contract_images_key_base(&self) -> String {
        format!("{}/images/contract", self.remote_base())
    }

    pub fn token_images_key_base(&self) -> String {
        format!("{}/images/tokens", self.remote_base())
    }

    pub fn contract_metadata_key_base(&self) -> String {
        format!("{}/metadata/contract", self.remote_base())
    }

    pub fn contract_metadata_key(&self) -> String {
        format!("{}/{CONTRACT_METADATA_FILE}", self.contract_metadata_key_base())
    }

    pub fn token_metadata_key_base(&self) -> String {
        format!("{}/metadata/tokens", self.remote_base())
    }
}
