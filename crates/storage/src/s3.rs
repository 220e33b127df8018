//! S3-compatible object store client.
//!
//! Async HTTP client using `reqwest` with SigV4 header signing.

use std::fmt;
use std::time::Duration;

use chrono::Utc;
use reqwest::Url;
use reqwest::header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE, HeaderValue};
use tracing::debug;

use crate::content_type::ContentType;
use crate::signing::{SigningRequest, encode_key, sha256_hex};
use crate::{ObjectStore, PutFuture, StorageError};

const SERVICE: &str = "s3";

/// Access key pair for the object store.
#[derive(Clone)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

/// Connection settings for an S3 bucket.
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    /// Overrides the virtual-hosted AWS URL, e.g. `http://127.0.0.1:9000/bucket`.
    pub endpoint: Option<String>,
    pub credentials: Credentials,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl S3Config {
    /// Base URL under which object keys are addressed.
    pub fn base_url(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{}.s3.{}.amazonaws.com", self.bucket, self.region),
        }
    }
}

/// S3 object store client.
pub struct S3Client {
    http: reqwest::Client,
    base_url: String,
    host: String,
    region: String,
    credentials: Credentials,
}

impl S3Client {
    /// Creates a client for the configured bucket.
    pub fn new(config: S3Config) -> Result<Self, StorageError> {
        let base_url = config.base_url();
        let parsed = Url::parse(&base_url)
            .map_err(|e| StorageError::InvalidEndpoint(format!("{base_url}: {e}")))?;

        let host = match (parsed.host_str(), parsed.port()) {
            (Some(h), Some(p)) => format!("{h}:{p}"),
            (Some(h), None) => h.to_string(),
            (None, _) => return Err(StorageError::InvalidEndpoint(base_url)),
        };

        let http = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            base_url,
            host,
            region: config.region,
            credentials: config.credentials,
        })
    }

    /// Uploads an object, overwriting any existing object at `key`.
    pub async fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: ContentType,
    ) -> Result<(), StorageError> {
        let url = self.object_url(key);
        let parsed =
            Url::parse(&url).map_err(|e| StorageError::InvalidEndpoint(format!("{url}: {e}")))?;

        let canonical_uri = parsed.path().to_string();
        let payload_hash = sha256_hex(&body);
        let amz_date = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();

        let signing = SigningRequest {
            method: "PUT",
            canonical_uri: &canonical_uri,
            headers: vec![
                ("host".into(), self.host.clone()),
                ("x-amz-content-sha256".into(), payload_hash.clone()),
                ("x-amz-date".into(), amz_date.clone()),
            ],
            payload_hash: &payload_hash,
        };
        let authorization =
            signing.authorization(&self.credentials, &self.region, SERVICE, &amz_date);

        debug!(key, bytes = body.len(), content_type = %content_type, "PUT object");

        let resp = self
            .http
            .put(parsed)
            .header(AUTHORIZATION, authorization)
            .header("x-amz-content-sha256", payload_hash)
            .header("x-amz-date", amz_date)
            .header(CONTENT_TYPE, content_type.mime())
            .header(CONTENT_DISPOSITION, content_disposition(key)?)
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StorageError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

impl ObjectStore for S3Client {
    fn put_object<'a>(
        &'a self,
        key: &'a str,
        body: Vec<u8>,
        content_type: ContentType,
    ) -> PutFuture<'a> {
        Box::pin(self.put(key, body, content_type))
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, encode_key(key))
    }
}

/// `inline; filename="{key}"`, falling back to the encoded key when the
/// raw key is not a valid header value.
fn content_disposition(key: &str) -> Result<HeaderValue, StorageError> {
    HeaderValue::from_str(&format!("inline; filename=\"{key}\""))
        .or_else(|_| HeaderValue::from_str(&format!("inline; filename=\"{}\"", encode_key(key))))
        .map_err(|_| StorageError::InvalidHeader("content-disposition"))
}
