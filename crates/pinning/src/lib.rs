//! Content-addressed pinning of collection assets.
//!
//! [`Pinner`] is the capability the CLI uses to pin a file or a folder to
//! IPFS; [`PinataClient`] implements it over the Pinata HTTP API.

mod pinata;

use std::collections::BTreeMap;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

pub use pinata::{Client as PinataClient, DEFAULT_TIMEOUT, PinataCredentials};

/// Errors from the pinning service.
#[derive(Debug, thiserror::Error)]
pub enum PinError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("pinning API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("scan error: {0}")]
    Scan(#[from] mintdeploy_publish::PublishError),

    #[error("nothing to pin in {0}")]
    Empty(String),

    #[error("invalid API credentials")]
    InvalidCredentials,
}

/// Metadata attached to a pin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinOptions {
    /// Display name of the pin.
    pub name: String,
    /// Searchable key/value tags.
    pub keyvalues: BTreeMap<String, String>,
    pub cid_version: u8,
}

impl PinOptions {
    /// Options tagged with the collection the pin belongs to.
    pub fn for_collection(name: &str) -> Self {
        Self {
            name: name.to_string(),
            keyvalues: BTreeMap::from([("collection".to_string(), name.to_string())]),
            cid_version: 1,
        }
    }
}

/// Result of a successful pin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinResult {
    #[serde(rename = "IpfsHash")]
    pub ipfs_hash: String,
    #[serde(rename = "PinSize", default)]
    pub pin_size: u64,
    #[serde(rename = "Timestamp", default)]
    pub timestamp: String,
}

/// Future returned by [`Pinner`] methods.
pub type PinFuture<'a> = Pin<Box<dyn Future<Output = Result<PinResult, PinError>> + Send + 'a>>;

/// Capability to pin content to a content-addressed network.
pub trait Pinner: Send + Sync {
    /// Pins a single file.
    fn pin_file<'a>(&'a self, path: &'a Path, options: &'a PinOptions) -> PinFuture<'a>;

    /// Pins a directory tree as one content-addressed folder.
    fn pin_folder<'a>(&'a self, dir: &'a Path, options: &'a PinOptions) -> PinFuture<'a>;
}
