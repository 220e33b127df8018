//! Asset publishing: scan, upload, collect per-file outcomes.
//!
//! The publisher walks a local file or directory, resolves each entry's
//! content type against the storage allowlist and uploads it under a
//! deterministic key. Uploads run with bounded parallelism and every file
//! produces an outcome; the caller decides which files are required.

pub mod error;
pub mod publisher;
pub mod scanner;
pub mod types;

pub use error::{AssetError, PublishError};
pub use publisher::{AssetPublisher, PublishOptions};
pub use scanner::{LocalFile, scan_source};
pub use types::{PublishReport, PublishRequest, PublishedAsset, Required};

/// Default number of concurrent uploads.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Default per-upload timeout.
pub const DEFAULT_UPLOAD_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(60);
