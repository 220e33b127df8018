//! Deploy orchestrator for a single collection.
//!
//! Runs the stages strictly in order and stops at the first failure. Every
//! check that can fail without side effects (job layout, RPC configuration,
//! token index contiguity) happens in `Init`, before the first upload.

use std::sync::Arc;

use mintdeploy_metadata::{
    BANNER_IMAGE_FILE, CONTRACT_IMAGE_FILE, FEATURED_IMAGE_FILE, RewrittenToken,
    rewrite_contract_metadata_file, rewrite_token_metadata_batch, scan_token_indices,
    token_image_file,
};
use mintdeploy_publish::{AssetPublisher, PublishOptions, PublishReport, PublishRequest, Required};
use mintdeploy_storage::ObjectStore;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::{DeployError, PipelineFailure};
use crate::invoker::{DeploymentInvoker, InvokerConfig};
use crate::job::CollectionDeploymentJob;
use crate::symbol::derive_symbol;
use crate::types::{PipelineEvent, PipelineOutcome, Stage};

/// Everything a run needs besides the job, built once by the caller.
#[derive(Clone)]
pub struct DeployContext {
    pub store: Arc<dyn ObjectStore>,
    pub publish: PublishOptions,
    pub invoker: InvokerConfig,
}

/// Orchestrates the deployment of one collection.
pub struct DeploymentOrchestrator {
    publisher: AssetPublisher,
    invoker: DeploymentInvoker,
    events_tx: mpsc::Sender<PipelineEvent>,
    events_rx: Option<mpsc::Receiver<PipelineEvent>>,
    cancel: CancellationToken,
}

impl DeploymentOrchestrator {
    /// Creates a new orchestrator.
    pub fn new(context: DeployContext) -> Self {
        let (events_tx, events_rx) = mpsc::channel(256);
        let cancel = CancellationToken::new();
        Self {
            publisher: AssetPublisher::new(context.store, context.publish)
                .with_cancel(cancel.clone()),
            invoker: DeploymentInvoker::new(context.invoker),
            events_tx,
            events_rx: Some(events_rx),
            cancel,
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<PipelineEvent>> {
        self.events_rx.take()
    }

    /// Returns a cancellation token for this deployment.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs every stage of `job`.
    pub async fn run(
        &self,
        job: &CollectionDeploymentJob,
    ) -> Result<PipelineOutcome, PipelineFailure> {
        match self.run_stages(job).await {
            Ok(outcome) => {
                self.emit(PipelineEvent::Completed);
                info!(
                    collection = %outcome.collection_name,
                    symbol = %outcome.symbol,
                    tokens = outcome.token_count,
                    token_base_uri = %outcome.token_base_uri,
                    contract_metadata_uri = %outcome.contract_metadata_uri,
                    "deployment completed"
                );
                Ok(outcome)
            }
            Err(failure) => {
                error!(stage = %failure.stage, error = %failure.cause, "deployment failed");
                self.emit(PipelineEvent::Failed {
                    stage: failure.stage,
                    error: failure.cause.to_string(),
                });
                Err(failure)
            }
        }
    }

    async fn run_stages(
        &self,
        job: &CollectionDeploymentJob,
    ) -> Result<PipelineOutcome, PipelineFailure> {
        let collection = job.collection_name();

        self.enter(Stage::Init)?;
        let token_count = self.init(job).await.map_err(at(Stage::Init))?;
        info!(collection, tokens = token_count, "job validated");

        self.enter(Stage::PublishingImages)?;
        let images = PublishRequest::new(job.images_dir(), job.images_key_base())
            .with_required(required_images(token_count));
        self.publish(Stage::PublishingImages, &images).await?;

        self.enter(Stage::RewritingContractMetadata)?;
        let contract_image_base = self.publisher.object_url(&job.contract_images_key_base());
        let contract_file = job.contract_metadata_file();
        let name = collection.to_string();
        blocking(move || rewrite_contract_metadata_file(&contract_file, &name, &contract_image_base))
            .await
            .map_err(at(Stage::RewritingContractMetadata))?;

        self.enter(Stage::PublishingContractMetadata)?;
        let contract = PublishRequest::new(
            job.contract_metadata_file(),
            job.contract_metadata_key_base(),
        );
        self.publish(Stage::PublishingContractMetadata, &contract).await?;
        let contract_metadata_uri = self.publisher.object_url(&job.contract_metadata_key());

        self.enter(Stage::RewritingTokenMetadata)?;
        let token_image_base = self.publisher.object_url(&job.token_images_key_base());
        let token_dir = job.token_metadata_dir();
        let rewritten =
            blocking(move || rewrite_token_metadata_batch(&token_dir, &token_image_base))
                .await
                .map_err(at(Stage::RewritingTokenMetadata))?;
        debug!(tokens = rewritten.len(), "token metadata ready");

        self.enter(Stage::PublishingTokenMetadata)?;
        let tokens = PublishRequest::new(job.token_metadata_dir(), job.token_metadata_key_base())
            .with_required(required_token_documents(&rewritten));
        self.publish(Stage::PublishingTokenMetadata, &tokens).await?;
        let token_base_uri = self.publisher.object_url(&job.token_metadata_key_base());

        let symbol = derive_symbol(collection);
        let mut outcome = PipelineOutcome {
            collection_name: collection.to_string(),
            symbol,
            token_count,
            token_base_uri,
            contract_metadata_uri,
            deployment: None,
        };

        if job.metadata_only() {
            info!(collection, "metadata-only run, skipping deployment tool");
            return Ok(outcome);
        }

        self.enter(Stage::Invoking)?;
        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(DeployError::Cancelled),
            result = self.invoker.invoke(
                &outcome.token_base_uri,
                &outcome.contract_metadata_uri,
                collection,
                &outcome.symbol,
            ) => result,
        };
        outcome.deployment = Some(result.map_err(at(Stage::Invoking))?);

        Ok(outcome)
    }

    /// Side-effect-free validation. Returns the number of tokens.
    async fn init(&self, job: &CollectionDeploymentJob) -> Result<usize, DeployError> {
        let collection_dir = job.collection_dir();
        if !collection_dir.is_dir() {
            return Err(DeployError::InvalidJob(format!(
                "collection directory not found: {}",
                collection_dir.display()
            )));
        }

        if !job.metadata_only() {
            self.invoker.preflight()?;
        }

        let contract_file = job.contract_metadata_file();
        if !contract_file.is_file() {
            return Err(DeployError::InvalidJob(format!(
                "contract metadata not found: {}",
                contract_file.display()
            )));
        }

        let token_dir = job.token_metadata_dir();
        let tokens = blocking(move || scan_token_indices(&token_dir)).await?;
        Ok(tokens.len())
    }

    /// Publishes one request, reporting every file outcome as an event.
    async fn publish(
        &self,
        stage: Stage,
        request: &PublishRequest,
    ) -> Result<PublishReport, PipelineFailure> {
        let report = self
            .publisher
            .publish_all(request)
            .await
            .map_err(at(stage))?;

        for (path, outcome) in report.outcomes() {
            let event = match outcome {
                Ok(asset) => PipelineEvent::AssetPublished {
                    stage,
                    path: path.to_string(),
                    url: asset.remote_url.clone(),
                },
                Err(e) => PipelineEvent::AssetFailed {
                    stage,
                    path: path.to_string(),
                    error: e.to_string(),
                },
            };
            self.emit(event);
        }

        report
            .check_required(&request.required)
            .map_err(at(stage))?;
        Ok(report)
    }

    /// Announces a stage, failing it if the run was cancelled.
    fn enter(&self, stage: Stage) -> Result<(), PipelineFailure> {
        if self.cancel.is_cancelled() {
            return Err(PipelineFailure {
                stage,
                cause: DeployError::Cancelled,
            });
        }
        info!(%stage, "stage started");
        self.emit(PipelineEvent::StageStarted { stage });
        Ok(())
    }

    /// Events are dropped when nobody drains the channel.
    fn emit(&self, event: PipelineEvent) {
        if let Err(e) = self.events_tx.try_send(event) {
            debug!(error = %e, "pipeline event dropped");
        }
    }
}

/// Contract images plus one image per token, relative to the images dir.
fn required_images(token_count: usize) -> Required {
    let contract = [CONTRACT_IMAGE_FILE, BANNER_IMAGE_FILE, FEATURED_IMAGE_FILE]
        .into_iter()
        .map(|file| format!("contract/{file}"));
    let tokens = (1..=token_count as u64).map(|i| format!("tokens/{}", token_image_file(i)));
    Required::paths(contract.chain(tokens))
}

/// The rewritten token documents, by file name within the token dir.
fn required_token_documents(rewritten: &[RewrittenToken]) -> Required {
    Required::paths(
        rewritten
            .iter()
            .filter_map(|t| t.path.file_name())
            .map(|name| name.to_string_lossy().into_owned()),
    )
}

fn at<E: Into<DeployError>>(stage: Stage) -> impl FnOnce(E) -> PipelineFailure {
    move |cause| PipelineFailure {
        stage,
        cause: cause.into(),
    }
}

/// Runs synchronous filesystem work off the async runtime.
async fn blocking<T, E, F>(f: F) -> Result<T, DeployError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<DeployError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(std::io::Error::other)?
        .map_err(Into::into)
}
