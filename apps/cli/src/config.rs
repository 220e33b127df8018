//! CLI configuration.
//!
//! Settings are read from an optional TOML file (`./mintdeploy.toml` by
//! default) and then overridden by environment variables, which may come
//! from a `.env` file. Every required key that is still unset is reported in
//! a single error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use mintdeploy_deploy::invoker::{
    DEFAULT_CHAIN, DEFAULT_FORWARD_ENV, DEFAULT_PROGRAM, DEFAULT_SCRIPT, DEFAULT_SIGNATURE,
    RPC_URL_ENV,
};
use mintdeploy_deploy::{DeployError, InvokerConfig};
use mintdeploy_pinning::PinataCredentials;
use mintdeploy_publish::PublishOptions;
use mintdeploy_storage::{Credentials, S3Config};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "mintdeploy.toml";
pub const DEFAULT_DOTENV_FILE: &str = ".env";

/// All CLI settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub publish: PublishSettings,
    #[serde(default)]
    pub deploy: DeploySettings,
    #[serde(default)]
    pub pinning: PinningSettings,
}

/// Object store connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
    /// Custom S3-compatible endpoint, bucket included in the path.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_storage_timeout")]
    pub timeout_secs: u64,
}

/// Upload tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishSettings {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

/// Deployment tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploySettings {
    #[serde(default)]
    pub rpc_url: Option<String>,
    #[serde(default = "default_program")]
    pub program: PathBuf,
    #[serde(default = "default_chain")]
    pub chain: String,
    #[serde(default = "default_script")]
    pub script: String,
    #[serde(default = "default_signature")]
    pub signature: String,
    /// Contracts project directory the tool runs in.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    #[serde(default = "default_deploy_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_forward_env")]
    pub forward_env: Vec<String>,
}

/// Pinning service API keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinningSettings {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub secret_api_key: Option<String>,
    #[serde(default = "default_pinning_timeout")]
    pub timeout_secs: u64,
}

fn default_storage_timeout() -> u64 {
    60
}

fn default_pinning_timeout() -> u64 {
    mintdeploy_pinning::DEFAULT_TIMEOUT.as_secs()
}

fn default_concurrency() -> usize {
    mintdeploy_publish::DEFAULT_CONCURRENCY
}

fn default_program() -> PathBuf {
    PathBuf::from(DEFAULT_PROGRAM)
}

fn default_chain() -> String {
    DEFAULT_CHAIN.into()
}

fn default_script() -> String {
    DEFAULT_SCRIPT.into()
}

fn default_signature() -> String {
    DEFAULT_SIGNATURE.into()
}

fn default_deploy_timeout() -> u64 {
    15 * 60
}

fn default_forward_env() -> Vec<String> {
    DEFAULT_FORWARD_ENV.iter().map(|s| s.to_string()).collect()
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            bucket: None,
            region: None,
            access_key_id: None,
            secret_access_key: None,
            endpoint: None,
            timeout_secs: default_storage_timeout(),
        }
    }
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            rpc_url: None,
            program: default_program(),
            chain: default_chain(),
            script: default_script(),
            signature: default_signature(),
            working_dir: None,
            timeout_secs: default_deploy_timeout(),
            forward_env: default_forward_env(),
        }
    }
}

impl Default for PinningSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            secret_api_key: None,
            timeout_secs: default_pinning_timeout(),
        }
    }
}

/// Storage, publish and invoker settings with every required key present.
#[derive(Debug, Clone)]
pub struct ResolvedDeploy {
    pub storage: S3Config,
    pub publish: PublishOptions,
    pub invoker: InvokerConfig,
}

/// Pinning API keys and request timeout.
#[derive(Debug, Clone)]
pub struct ResolvedPinning {
    pub credentials: PinataCredentials,
    pub timeout: Duration,
}

/// Loads `KEY=value` lines from a dotenv file into the process environment.
///
/// Variables already set in the environment win. Returns `false` when the
/// file does not exist.
pub fn load_dotenv(path: &Path) -> anyhow::Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    dotenvy::from_path(path)?;
    tracing::debug!(path = %path.display(), "environment file loaded");
    Ok(true)
}

impl Settings {
    /// Loads settings from `path`.
    ///
    /// A missing file yields defaults unless `explicit` is set, in which case
    /// the caller asked for that file and its absence is an error.
    pub fn load(path: &Path, explicit: bool) -> anyhow::Result<Self> {
        if !path.exists() {
            if explicit {
                anyhow::bail!("config file not found: {}", path.display());
            }
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(settings)
    }

    /// Overrides settings with non-empty environment values.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let overrides: [(&str, &mut Option<String>); 8] = [
            ("AWS_BUCKET", &mut self.storage.bucket),
            ("AWS_REGION", &mut self.storage.region),
            ("AWS_ACCESS_KEY_ID", &mut self.storage.access_key_id),
            ("AWS_SECRET_ACCESS_KEY", &mut self.storage.secret_access_key),
            ("AWS_ENDPOINT_URL", &mut self.storage.endpoint),
            (RPC_URL_ENV, &mut self.deploy.rpc_url),
            ("PINATA_API_KEY", &mut self.pinning.api_key),
            ("PINATA_SECRET_API_KEY", &mut self.pinning.secret_api_key),
        ];
        for (key, slot) in overrides {
            if let Some(value) = get(key) {
                *slot = Some(value);
            }
        }
    }

    /// Settings for a deploy run. The RPC endpoint is only required when
    /// the deployment tool will run.
    pub fn resolve_deploy(&self, metadata_only: bool) -> Result<ResolvedDeploy, DeployError> {
        let mut missing = Vec::new();
        let storage = self.resolve_storage(&mut missing);
        if !metadata_only && present(&self.deploy.rpc_url).is_none() {
            missing.push(RPC_URL_ENV.to_string());
        }

        match storage {
            Some(storage) if missing.is_empty() => Ok(ResolvedDeploy {
                storage,
                publish: PublishOptions {
                    concurrency: self.publish.concurrency.max(1),
                    ..PublishOptions::default()
                },
                invoker: InvokerConfig {
                    program: self.deploy.program.clone(),
                    chain: self.deploy.chain.clone(),
                    rpc_url: present(&self.deploy.rpc_url).map(str::to_string),
                    script: self.deploy.script.clone(),
                    signature: self.deploy.signature.clone(),
                    working_dir: self.deploy.working_dir.clone(),
                    forward_env: self.deploy.forward_env.clone(),
                    timeout: Duration::from_secs(self.deploy.timeout_secs),
                },
            }),
            _ => Err(DeployError::MissingConfiguration { keys: missing }),
        }
    }

    /// Pinning API keys and timeout.
    pub fn resolve_pinning(&self) -> Result<ResolvedPinning, DeployError> {
        match (
            present(&self.pinning.api_key),
            present(&self.pinning.secret_api_key),
        ) {
            (Some(api_key), Some(secret_api_key)) => Ok(ResolvedPinning {
                credentials: PinataCredentials {
                    api_key: api_key.to_string(),
                    secret_api_key: secret_api_key.to_string(),
                },
                timeout: Duration::from_secs(self.pinning.timeout_secs),
            }),
            (api_key, secret) => {
                let mut keys = Vec::new();
                if api_key.is_none() {
                    keys.push("PINATA_API_KEY".to_string());
                }
                if secret.is_none() {
                    keys.push("PINATA_SECRET_API_KEY".to_string());
                }
                Err(DeployError::MissingConfiguration { keys })
            }
        }
    }

    fn resolve_storage(&self, missing: &mut Vec<String>) -> Option<S3Config> {
        let s = &self.storage;
        let bucket = present(&s.bucket);
        let region = present(&s.region);
        let access_key_id = present(&s.access_key_id);
        let secret_access_key = present(&s.secret_access_key);

        for (key, value) in [
            ("AWS_BUCKET", bucket),
            ("AWS_REGION", region),
            ("AWS_ACCESS_KEY_ID", access_key_id),
            ("AWS_SECRET_ACCESS_KEY", secret_access_key),
        ] {
            if value.is_none() {
                missing.push(key.to_string());
            }
        }

        Some(S3Config {
            bucket: bucket?.to_string(),
            region: region?.to_string(),
            endpoint: present(&s.endpoint).map(str::to_string),
            credentials: Credentials {
                access_key_id: access_key_id?.to_string(),
                secret_access_key: secret_access_key?.to_string(),
            },
            timeout: Duration::from_secs(s.timeout_secs),
        })
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}
