//! Bounded-parallel uploader.

use std::sync::Arc;
use std::time::Duration;

use mintdeploy_storage::{ContentType, ObjectStore};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{AssetError, PublishError};
use crate::scanner::{LocalFile, scan_source};
use crate::types::{PublishReport, PublishRequest, PublishedAsset};
use crate::{DEFAULT_CONCURRENCY, DEFAULT_UPLOAD_TIMEOUT};

/// Tuning for a publisher.
#[derive(Debug, Clone, Copy)]
pub struct PublishOptions {
    /// Maximum uploads in flight at once.
    pub concurrency: usize,
    /// Timeout applied to each upload.
    pub upload_timeout: Duration,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            upload_timeout: DEFAULT_UPLOAD_TIMEOUT,
        }
    }
}

/// Uploads local files to an [`ObjectStore`].
#[derive(Clone)]
pub struct AssetPublisher {
    store: Arc<dyn ObjectStore>,
    options: PublishOptions,
    cancel: CancellationToken,
}

impl AssetPublisher {
    /// Creates a publisher with its own cancellation token.
    pub fn new(store: Arc<dyn ObjectStore>, options: PublishOptions) -> Self {
        Self {
            store,
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Shares an external cancellation token.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Canonical URL for a remote key.
    pub fn object_url(&self, key: &str) -> String {
        self.store.object_url(key)
    }

    /// Publishes the request and enforces its required set.
    pub async fn publish(&self, request: &PublishRequest) -> Result<PublishReport, PublishError> {
        let report = self.publish_all(request).await?;
        report.check_required(&request.required)?;
        Ok(report)
    }

    /// Publishes every file under the request source and returns all
    /// outcomes without checking the required set.
    ///
    /// Fails as a whole only on scan errors or cancellation.
    pub async fn publish_all(&self, request: &PublishRequest) -> Result<PublishReport, PublishError> {
        if self.cancel.is_cancelled() {
            return Err(PublishError::Cancelled);
        }

        let source = request.source.clone();
        let files = tokio::task::spawn_blocking(move || scan_source(&source))
            .await
            .map_err(std::io::Error::other)??;

        debug!(source = %request.source.display(), files = files.len(), "scan complete");

        let semaphore = Arc::new(Semaphore::new(self.options.concurrency.max(1)));
        let mut tasks = JoinSet::new();
        let mut report = PublishReport::default();

        for file in files {
            let Some(content_type) = ContentType::from_path(&file.path) else {
                let extension = file
                    .path
                    .extension()
                    .map(|e| e.to_string_lossy().into_owned())
                    .unwrap_or_default();
                warn!(path = %file.relative_path, "unsupported content type, not uploaded");
                report.record(
                    file.relative_path,
                    Err(AssetError::UnsupportedContentType { extension }),
                );
                continue;
            };

            let key = request.key_for(&file.relative_path);
            let store = Arc::clone(&self.store);
            let semaphore = Arc::clone(&semaphore);
            let cancel = self.cancel.clone();
            let timeout = self.options.upload_timeout;

            tasks.spawn(async move {
                let outcome =
                    upload_one(store, semaphore, cancel, timeout, &file, key, content_type).await;
                (file.relative_path, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let (relative_path, outcome) = joined.map_err(std::io::Error::other)?;
            match &outcome {
                Ok(asset) => debug!(path = %relative_path, url = %asset.remote_url, "published"),
                Err(e) => warn!(path = %relative_path, error = %e, "not published"),
            }
            report.record(relative_path, outcome);
        }

        let cancelled = report
            .failures()
            .iter()
            .any(|(_, e)| matches!(e, AssetError::Cancelled));
        if cancelled {
            return Err(PublishError::Cancelled);
        }

        info!(
            key_base = %request.key_base,
            published = report.published().count(),
            failed = report.failures().len(),
            "publish finished"
        );

        Ok(report)
    }
}

async fn upload_one(
    store: Arc<dyn ObjectStore>,
    semaphore: Arc<Semaphore>,
    cancel: CancellationToken,
    timeout: Duration,
    file: &LocalFile,
    key: String,
    content_type: ContentType,
) -> Result<PublishedAsset, AssetError> {
    let _permit = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(AssetError::Cancelled),
        permit = semaphore.acquire_owned() => permit.map_err(|_| AssetError::Cancelled)?,
    };

    // Checked again: the token may have fired while waiting for a permit.
    if cancel.is_cancelled() {
        return Err(AssetError::Cancelled);
    }

    let body = tokio::fs::read(&file.path)
        .await
        .map_err(|e| AssetError::Read(e.to_string()))?;

    match tokio::time::timeout(timeout, store.put_object(&key, body, content_type)).await {
        Ok(Ok(())) => Ok(PublishedAsset {
            local_relative_path: file.relative_path.clone(),
            remote_url: store.object_url(&key),
            key,
            content_type,
        }),
        Ok(Err(e)) => Err(AssetError::UploadFailure(e.to_string())),
        Err(_) => Err(AssetError::Timeout(timeout)),
    }
}
