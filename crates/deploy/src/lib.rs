//! Collection deploy pipeline.
//!
//! [`DeploymentOrchestrator`] runs a [`CollectionDeploymentJob`] through a
//! fixed sequence of stages: publish images, rewrite and publish contract
//! metadata, rewrite and publish token metadata, then invoke the external
//! deployment tool with the resulting URIs. Progress is reported as
//! [`PipelineEvent`]s and any failure stops the run at the stage it occurred.

pub mod error;
pub mod invoker;
pub mod job;
pub mod orchestrator;
pub mod symbol;
pub mod types;

pub use error::{DeployError, PipelineFailure};
pub use invoker::{DeploymentInvoker, InvokerConfig};
pub use job::{CollectionDeploymentJob, DEFAULT_ARTIFACTS_ROOT, REMOTE_ROOT};
pub use orchestrator::{DeployContext, DeploymentOrchestrator};
pub use symbol::derive_symbol;
pub use types::{DeploymentResult, PipelineEvent, PipelineOutcome, Stage};
