//! Data types for publishing.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use mintdeploy_storage::ContentType;

use crate::error::{AssetError, PublishError};

/// Which scanned files must be published for the call to succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Required {
    /// Every scanned file.
    All,
    /// No file; failures are reported but never fatal.
    Nothing,
    /// These relative paths must exist and be published. Other files are
    /// extraneous.
    Paths(BTreeSet<String>),
}

impl Required {
    /// Builds a `Paths` set from relative paths.
    pub fn paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Paths(paths.into_iter().map(Into::into).collect())
    }
}

/// A single publish call.
#[derive(Debug, Clone)]
pub struct PublishRequest {
    /// Local file or directory.
    pub source: PathBuf,
    /// Remote key prefix; each file lands at `{key_base}/{relative_path}`.
    pub key_base: String,
    pub required: Required,
}

impl PublishRequest {
    /// Creates a request where every file is required.
    pub fn new(source: impl Into<PathBuf>, key_base: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            key_base: key_base.into(),
            required: Required::All,
        }
    }

    /// Replaces the required set.
    pub fn with_required(mut self, required: Required) -> Self {
        self.required = required;
        self
    }

    /// Remote key for a relative path.
    pub fn key_for(&self, relative_path: &str) -> String {
        let base = self.key_base.trim_end_matches('/');
        if base.is_empty() {
            relative_path.to_string()
        } else {
            format!("{base}/{relative_path}")
        }
    }
}

/// A file that was uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedAsset {
    pub local_relative_path: String,
    pub key: String,
    pub remote_url: String,
    pub content_type: ContentType,
}

/// Per-file outcomes of a publish call, keyed by relative path.
#[derive(Debug, Clone, Default)]
pub struct PublishReport {
    outcomes: BTreeMap<String, Result<PublishedAsset, AssetError>>,
}

impl PublishReport {
    pub(crate) fn record(
        &mut self,
        relative_path: String,
        outcome: Result<PublishedAsset, AssetError>,
    ) {
        self.outcomes.insert(relative_path, outcome);
    }

    /// Number of files with an outcome.
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// All outcomes ordered by relative path.
    pub fn outcomes(&self) -> impl Iterator<Item = (&str, &Result<PublishedAsset, AssetError>)> {
        self.outcomes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Successfully published assets.
    pub fn published(&self) -> impl Iterator<Item = &PublishedAsset> {
        self.outcomes.values().filter_map(|o| o.as_ref().ok())
    }

    /// Files that were not published.
    pub fn failures(&self) -> Vec<(&str, &AssetError)> {
        self.outcomes
            .iter()
            .filter_map(|(k, v)| v.as_ref().err().map(|e| (k.as_str(), e)))
            .collect()
    }

    /// Mapping from local relative path to remote URL.
    pub fn urls(&self) -> BTreeMap<String, String> {
        self.published()
            .map(|a| (a.local_relative_path.clone(), a.remote_url.clone()))
            .collect()
    }

    /// Remote URL of a published relative path.
    pub fn url(&self, relative_path: &str) -> Option<&str> {
        match self.outcomes.get(relative_path) {
            Some(Ok(asset)) => Some(asset.remote_url.as_str()),
            _ => None,
        }
    }

    /// Fails if any required file is absent or was not published.
    pub fn check_required(&self, required: &Required) -> Result<(), PublishError> {
        let failures: Vec<(String, AssetError)> = match required {
            Required::Nothing => Vec::new(),
            Required::All => self
                .failures()
                .into_iter()
                .map(|(path, err)| (path.to_string(), err.clone()))
                .collect(),
            Required::Paths(paths) => paths
                .iter()
                .filter_map(|path| match self.outcomes.get(path) {
                    None => Some((path.clone(), AssetError::Missing)),
                    Some(Err(err)) => Some((path.clone(), err.clone())),
                    Some(Ok(_)) => None,
                })
                .collect(),
        };

        if failures.is_empty() {
            Ok(())
        } else {
            Err(PublishError::RequiredAssetsFailed { failures })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(path: &str) -> PublishedAsset {
        PublishedAsset {
            local_relative_path: path.into(),
            key: format!("base/{path}"),
            remote_url: format!("https://cdn.test/base/{path}"),
            content_type: ContentType::Image,
        }
    }

    fn sample_report() -> PublishReport {
        let mut report = PublishReport::default();
        report.record("tokens/1.jpeg".into(), Ok(asset("tokens/1.jpeg")));
        report.record(
            "notes.txt".into(),
            Err(AssetError::UnsupportedContentType {
                extension: "txt".into(),
            }),
        );
        report
    }

    #[test]
    fn key_for_joins_base() {
        let req = PublishRequest::new("/tmp/x", "deployment-artifacts/apes/images/");
        assert_eq!(
            req.key_for("tokens/1.jpeg"),
            "deployment-artifacts/apes/images/tokens/1.jpeg"
        );
        let bare = PublishRequest::new("/tmp/x", "");
        assert_eq!(bare.key_for("1.jpeg"), "1.jpeg");
    }

    #[test]
    fn urls_only_contain_published() {
        let report = sample_report();
        let urls = report.urls();
        assert_eq!(urls.len(), 1);
        assert_eq!(urls["tokens/1.jpeg"], "https://cdn.test/base/tokens/1.jpeg");
        assert_eq!(report.url("notes.txt"), None);
        assert_eq!(report.failures().len(), 1);
    }

    #[test]
    fn extraneous_failure_not_fatal_for_paths() {
        let report = sample_report();
        assert!(report.check_required(&Required::paths(["tokens/1.jpeg"])).is_ok());
        assert!(report.check_required(&Required::Nothing).is_ok());
        assert!(report.check_required(&Required::All).is_err());
    }

    #[test]
    fn missing_required_path_reported() {
        let report = sample_report();
        let err = report
            .check_required(&Required::paths(["tokens/1.jpeg", "tokens/2.jpeg"]))
            .unwrap_err();
        match err {
            PublishError::RequiredAssetsFailed { failures } => {
                assert_eq!(failures, vec![("tokens/2.jpeg".to_string(), AssetError::Missing)]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
