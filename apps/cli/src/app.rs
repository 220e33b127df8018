//! Command handlers: wire settings into the library crates and report
//! progress.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use mintdeploy_deploy::{
    CollectionDeploymentJob, DeployContext, DeploymentOrchestrator, PipelineEvent,
};
use mintdeploy_pinning::{PinOptions, PinataClient, Pinner};
use mintdeploy_storage::S3Client;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::Settings;

/// Publishes a collection and, unless `metadata_only`, deploys its contract.
pub async fn deploy(
    settings: &Settings,
    artifacts_root: PathBuf,
    collection_name: String,
    metadata_only: bool,
) -> anyhow::Result<()> {
    let resolved = settings.resolve_deploy(metadata_only)?;
    let job = CollectionDeploymentJob::new(artifacts_root, collection_name)?
        .with_metadata_only(metadata_only);

    let store = Arc::new(S3Client::new(resolved.storage)?);
    let mut orchestrator = DeploymentOrchestrator::new(DeployContext {
        store,
        publish: resolved.publish,
        invoker: resolved.invoker,
    });

    let events = orchestrator.take_events();
    let reporter = tokio::spawn(report_events(events));
    watch_ctrl_c(orchestrator.cancel_token());

    let result = orchestrator.run(&job).await;
    drop(orchestrator);
    let _ = reporter.await;

    let outcome = result?;
    println!("collection:            {}", outcome.collection_name);
    println!("symbol:                {}", outcome.symbol);
    println!("tokens:                {}", outcome.token_count);
    println!("token base URI:        {}", outcome.token_base_uri);
    println!("contract metadata URI: {}", outcome.contract_metadata_uri);
    if let Some(deployment) = &outcome.deployment {
        print!("{}", deployment.stdout);
    }
    Ok(())
}

/// What to pin.
#[derive(Debug, Clone, Copy)]
pub enum PinTarget {
    File,
    Folder,
}

/// Pins a file or a folder and prints its content identifier.
pub async fn pin(
    settings: &Settings,
    target: PinTarget,
    path: &Path,
    name: Option<String>,
) -> anyhow::Result<()> {
    let resolved = settings.resolve_pinning()?;
    let client = PinataClient::new(&resolved.credentials, resolved.timeout)?;

    let name = name.unwrap_or_else(|| {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    let options = PinOptions::for_collection(&name);

    let pinner: &dyn Pinner = &client;
    let result = match target {
        PinTarget::File => pinner.pin_file(path, &options).await?,
        PinTarget::Folder => pinner.pin_folder(path, &options).await?,
    };

    println!("{}", result.ipfs_hash);
    Ok(())
}

/// Logs pipeline events until the orchestrator is dropped.
async fn report_events(events: Option<mpsc::Receiver<PipelineEvent>>) {
    let Some(mut events) = events else {
        return;
    };

    while let Some(event) = events.recv().await {
        match event {
            PipelineEvent::StageStarted { stage } => tracing::info!("{stage}"),
            PipelineEvent::AssetPublished { path, url, .. } => {
                tracing::info!(%path, %url, "published")
            }
            PipelineEvent::AssetFailed { stage, path, error } => {
                tracing::warn!(%stage, %path, %error, "not published")
            }
            PipelineEvent::Completed => tracing::info!("done"),
            PipelineEvent::Failed { stage, error } => {
                tracing::error!(%stage, %error, "failed")
            }
        }
    }
}

/// Cancels the run on Ctrl+C.
fn watch_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling");
            cancel.cancel();
        }
    });
}
