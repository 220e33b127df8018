//! Pinata API client.
//!
//! Async HTTP client using `reqwest` with API key header authentication.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use mintdeploy_publish::scan_source;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use serde_json::json;
use tracing::{debug, info};

use crate::{PinError, PinFuture, PinOptions, PinResult, Pinner};

const DEFAULT_BASE_URL: &str = "https://api.pinata.cloud";

/// Default per-request timeout. Folder pins upload every file in one body.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Pinata API key pair.
#[derive(Clone)]
pub struct PinataCredentials {
    pub api_key: String,
    pub secret_api_key: String,
}

impl fmt::Debug for PinataCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinataCredentials")
            .field("api_key", &self.api_key)
            .field("secret_api_key", &"<redacted>")
            .finish()
    }
}

/// Pinata API client.
pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

impl Client {
    /// Creates a new client with the given credentials and request timeout.
    pub fn new(credentials: &PinataCredentials, timeout: Duration) -> Result<Self, PinError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "pinata_api_key",
            HeaderValue::from_str(&credentials.api_key).map_err(|_| PinError::InvalidCredentials)?,
        );
        headers.insert(
            "pinata_secret_api_key",
            HeaderValue::from_str(&credentials.secret_api_key)
                .map_err(|_| PinError::InvalidCredentials)?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Sets a custom base URL (for testing).
    #[cfg(test)]
    pub(crate) fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Pins one file.
    pub async fn pin_file(&self, path: &Path, options: &PinOptions) -> Result<PinResult, PinError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| PinError::Empty(path.display().to_string()))?;
        let data = tokio::fs::read(path).await?;

        let form = Form::new().part("file", Part::bytes(data).file_name(name));
        self.pin(form, options).await
    }

    /// Pins a directory; every file is sent under `{folder}/{relative_path}`.
    pub async fn pin_folder(&self, dir: &Path, options: &PinOptions) -> Result<PinResult, PinError> {
        let folder = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| PinError::Empty(dir.display().to_string()))?;

        let source = dir.to_path_buf();
        let files = tokio::task::spawn_blocking(move || scan_source(&source))
            .await
            .map_err(std::io::Error::other)??;
        if files.is_empty() {
            return Err(PinError::Empty(dir.display().to_string()));
        }

        let mut form = Form::new();
        for file in files {
            let data = tokio::fs::read(&file.path).await?;
            let part = Part::bytes(data).file_name(format!("{folder}/{}", file.relative_path));
            form = form.part("file", part);
        }

        self.pin(form, options).await
    }

    /// Adds pin metadata/options to the form and posts it.
    async fn pin(&self, form: Form, options: &PinOptions) -> Result<PinResult, PinError> {
        let metadata = json!({
            "name": options.name,
            "keyvalues": options.keyvalues,
        });
        let pin_options = json!({ "cidVersion": options.cid_version });

        let form = form
            .text("pinataMetadata", metadata.to_string())
            .text("pinataOptions", pin_options.to_string());

        let url = format!("{}/pinning/pinFileToIPFS", self.base_url);
        debug!(name = %options.name, "pinning to IPFS");

        let resp = self.http.post(&url).multipart(form).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PinError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.bytes().await?;
        let result: PinResult = serde_json::from_slice(&body)?;
        info!(name = %options.name, cid = %result.ipfs_hash, size = result.pin_size, "pinned");
        Ok(result)
    }
}

impl Pinner for Client {
    fn pin_file<'a>(&'a self, path: &'a Path, options: &'a PinOptions) -> PinFuture<'a> {
        Box::pin(Client::pin_file(self, path, options))
    }

    fn pin_folder<'a>(&'a self, dir: &'a Path, options: &'a PinOptions) -> PinFuture<'a> {
        Box::pin(Client::pin_folder(self, dir, options))
    }
}
