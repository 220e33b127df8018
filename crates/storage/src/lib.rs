//! Durable object storage for published collection assets.
//!
//! The deploy pipeline only needs two things from storage: put an object
//! under a key, and know the canonical public URL of a key. Those are
//! expressed by the [`ObjectStore`] capability trait. [`S3Client`] is the
//! production implementation (SigV4-signed `PUT` against an S3-compatible
//! endpoint); tests use in-memory mocks.

mod content_type;
mod s3;
mod signing;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

use std::future::Future;
use std::pin::Pin;

pub use content_type::ContentType;
pub use s3::{Credentials, S3Client, S3Config};
pub use signing::{SigningRequest, encode_key};

/// Errors from the object store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("storage API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("invalid header value for {0}")]
    InvalidHeader(&'static str),
}

/// Future returned by [`ObjectStore::put_object`].
pub type PutFuture<'a> = Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + 'a>>;

/// Capability to write objects to durable storage.
///
/// Writes are overwrites: putting the same key twice replaces the object,
/// no versioning is introduced.
pub trait ObjectStore: Send + Sync {
    /// Uploads `body` under `key` with the given content type.
    fn put_object<'a>(
        &'a self,
        key: &'a str,
        body: Vec<u8>,
        content_type: ContentType,
    ) -> PutFuture<'a>;

    /// Returns the canonical public URL for `key`.
    ///
    /// Must be a pure function of the key.
    fn object_url(&self, key: &str) -> String;
}
