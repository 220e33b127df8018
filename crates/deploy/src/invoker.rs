//! External deployment tool invocation.
//!
//! Runs `forge script` with a typed argument list. The child gets a cleared
//! environment plus an explicit allowlist of forwarded variables, so
//! secrets reach the tool only when named in the configuration.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::DeployError;
use crate::types::DeploymentResult;

/// Environment key the RPC endpoint is read from.
pub const RPC_URL_ENV: &str = "SEPOLIA_RPC_URL";

pub const DEFAULT_PROGRAM: &str = "forge";
pub const DEFAULT_CHAIN: &str = "sepolia";
pub const DEFAULT_SCRIPT: &str = "script/MultiToken.s.sol:MultiTokenScript";
pub const DEFAULT_SIGNATURE: &str = "deploy(string memory _baseURI, string memory _contractMetedataURI, string memory _name, string memory _symbol)";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Variables forwarded to the tool unless configured otherwise.
pub const DEFAULT_FORWARD_ENV: &[&str] = &["PATH", "HOME", "PRIVATE_KEY", "ETHERSCAN_API_KEY"];

/// How the deployment tool is run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokerConfig {
    pub program: PathBuf,
    pub chain: String,
    pub rpc_url: Option<String>,
    pub script: String,
    pub signature: String,
    /// Working directory of the tool, normally the contracts project.
    pub working_dir: Option<PathBuf>,
    /// Names of environment variables passed through to the tool.
    pub forward_env: Vec<String>,
    pub timeout: Duration,
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_PROGRAM),
            chain: DEFAULT_CHAIN.into(),
            rpc_url: None,
            script: DEFAULT_SCRIPT.into(),
            signature: DEFAULT_SIGNATURE.into(),
            working_dir: None,
            forward_env: DEFAULT_FORWARD_ENV.iter().map(|s| s.to_string()).collect(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Runs the deployment tool for a published collection.
#[derive(Debug, Clone)]
pub struct DeploymentInvoker {
    config: InvokerConfig,
}

impl DeploymentInvoker {
    pub fn new(config: InvokerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &InvokerConfig {
        &self.config
    }

    /// Checks that everything needed to invoke is configured.
    pub fn preflight(&self) -> Result<(), DeployError> {
        self.rpc_url().map(|_| ())
    }

    fn rpc_url(&self) -> Result<&str, DeployError> {
        match self.config.rpc_url.as_deref() {
            Some(url) if !url.trim().is_empty() => Ok(url),
            _ => Err(DeployError::MissingConfiguration {
                keys: vec![RPC_URL_ENV.to_string()],
            }),
        }
    }

    /// Arguments passed to the tool, positional URIs last.
    pub fn build_args(
        &self,
        token_base_uri: &str,
        contract_metadata_uri: &str,
        collection_name: &str,
        symbol: &str,
    ) -> Result<Vec<String>, DeployError> {
        let rpc_url = self.rpc_url()?;

        Ok(vec![
            "script".into(),
            "--chain".into(),
            self.config.chain.clone(),
            "--rpc-url".into(),
            rpc_url.to_string(),
            "--broadcast".into(),
            "--verify".into(),
            "-vvvv".into(),
            self.config.script.clone(),
            "--sig".into(),
            self.config.signature.clone(),
            token_base_uri.to_string(),
            contract_metadata_uri.to_string(),
            collection_name.to_string(),
            symbol.to_string(),
        ])
    }

    /// Runs the tool and waits for it to exit.
    ///
    /// Exit status 0 is success. A non-zero exit, a launch failure or a
    /// timeout yields [`DeployError::ExternalProcessFailure`] carrying the
    /// captured output verbatim.
    pub async fn invoke(
        &self,
        token_base_uri: &str,
        contract_metadata_uri: &str,
        collection_name: &str,
        symbol: &str,
    ) -> Result<DeploymentResult, DeployError> {
        let args = self.build_args(token_base_uri, contract_metadata_uri, collection_name, symbol)?;

        let mut result = DeploymentResult {
            contract_metadata_uri: contract_metadata_uri.to_string(),
            token_base_uri: token_base_uri.to_string(),
            symbol: symbol.to_string(),
            ..DeploymentResult::default()
        };

        let mut cmd = tokio::process::Command::new(&self.config.program);
        cmd.args(&args)
            .env_clear()
            .envs(forwarded_env(&self.config.forward_env, |name| {
                std::env::var_os(name)
            }))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.config.working_dir {
            cmd.current_dir(dir);
        }

        info!(
            program = %self.config.program.display(),
            chain = %self.config.chain,
            script = %self.config.script,
            collection = collection_name,
            symbol,
            "invoking deployment tool"
        );

        let output = match tokio::time::timeout(self.config.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(DeployError::ExternalProcessFailure {
                    reason: format!(
                        "failed to launch {}: {e}",
                        self.config.program.display()
                    ),
                    result: Box::new(result),
                });
            }
            Err(_) => {
                warn!(timeout = ?self.config.timeout, "deployment tool timed out, killed");
                return Err(DeployError::ExternalProcessFailure {
                    reason: format!("timed out after {:?}", self.config.timeout),
                    result: Box::new(result),
                });
            }
        };

        result.process_exit_status = output.status.code();
        result.stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        result.stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        debug!(stdout = %result.stdout, stderr = %result.stderr, "deployment tool output");

        if !output.status.success() {
            return Err(DeployError::ExternalProcessFailure {
                reason: format!("exited with {}", output.status),
                result: Box::new(result),
            });
        }

        info!(status = ?result.process_exit_status, "deployment tool finished");
        Ok(result)
    }
}

/// Collects the allowlisted variables that are set, in allowlist order.
fn forwarded_env<F>(names: &[String], lookup: F) -> Vec<(String, OsString)>
where
    F: Fn(&str) -> Option<OsString>,
{
    names
        .iter()
        .filter_map(|name| lookup(name).map(|value| (name.clone(), value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> InvokerConfig {
        InvokerConfig {
            rpc_url: Some("https://rpc.sepolia.test".into()),
            ..InvokerConfig::default()
        }
    }

    #[test]
    fn preflight_requires_rpc_url() {
        let invoker = DeploymentInvoker::new(InvokerConfig::default());
        match invoker.preflight().unwrap_err() {
            DeployError::MissingConfiguration { keys } => assert_eq!(keys, vec!["SEPOLIA_RPC_URL"]),
            other => panic!("unexpected error: {other:?}"),
        }

        let blank = DeploymentInvoker::new(InvokerConfig {
            rpc_url: Some("  ".into()),
            ..InvokerConfig::default()
        });
        assert!(blank.preflight().is_err());

        assert!(DeploymentInvoker::new(configured()).preflight().is_ok());
    }

    #[test]
    fn args_in_fixed_order() {
        let invoker = DeploymentInvoker::new(configured());
        let args = invoker
            .build_args("https://cdn/tokens", "https://cdn/contract.json", "Cool Apes", "CA")
            .unwrap();

        assert_eq!(
            args,
            vec![
                "script",
                "--chain",
                "sepolia",
                "--rpc-url",
                "https://rpc.sepolia.test",
                "--broadcast",
                "--verify",
                "-vvvv",
                "script/MultiToken.s.sol:MultiTokenScript",
                "--sig",
                DEFAULT_SIGNATURE,
                "https://cdn/tokens",
                "https://cdn/contract.json",
                "Cool Apes",
                "CA",
            ]
        );
    }

    #[test]
    fn only_allowlisted_env_forwarded() {
        let names = vec!["PRIVATE_KEY".to_string(), "PATH".to_string(), "HOME".to_string()];
        let env = forwarded_env(&names, |name| match name {
            "PATH" => Some("/usr/bin".into()),
            "PRIVATE_KEY" => Some("0xabc".into()),
            "AWS_SECRET_ACCESS_KEY" => Some("leak".into()),
            _ => None,
        });

        assert_eq!(
            env,
            vec![
                ("PRIVATE_KEY".to_string(), OsString::from("0xabc")),
                ("PATH".to_string(), OsString::from("/usr/bin")),
            ]
        );
    }

    #[tokio::test]
    async fn launch_failure_is_process_failure() {
        let invoker = DeploymentInvoker::new(InvokerConfig {
            program: "/nonexistent/forge".into(),
            ..configured()
        });

        match invoker.invoke("t", "c", "Apes", "AS").await.unwrap_err() {
            DeployError::ExternalProcessFailure { reason, result } => {
                assert!(reason.contains("failed to launch"));
                assert_eq!(result.process_exit_status, None);
                assert_eq!(result.symbol, "AS");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    /// Runs `/bin/sh` as the tool; the first argument, `script`, resolves
    /// to a shell file in the working directory.
    #[cfg(unix)]
    fn fake_tool(body: &str) -> (tempfile::TempDir, InvokerConfig) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("script"), body).unwrap();
        let config = InvokerConfig {
            program: "/bin/sh".into(),
            working_dir: Some(dir.path().to_path_buf()),
            ..configured()
        };
        (dir, config)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn success_captures_output() {
        let (_dir, config) = fake_tool("printf '%s\\n' \"$@\"\n");
        let invoker = DeploymentInvoker::new(config);

        let result = invoker
            .invoke("https://cdn/tokens", "https://cdn/contract.json", "Cool Apes", "CA")
            .await
            .unwrap();

        assert_eq!(result.process_exit_status, Some(0));
        let lines: Vec<&str> = result.stdout.lines().collect();
        assert_eq!(lines[0], "--chain");
        assert_eq!(
            &lines[lines.len() - 4..],
            ["https://cdn/tokens", "https://cdn/contract.json", "Cool Apes", "CA"]
        );
        assert!(lines.contains(&DEFAULT_SIGNATURE));
        assert_eq!(result.token_base_uri, "https://cdn/tokens");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nonzero_exit_keeps_stderr_verbatim() {
        let (_dir, config) =
            fake_tool("echo 'simulating'\nprintf 'revert: insufficient funds' >&2\nexit 1\n");
        let invoker = DeploymentInvoker::new(config);

        match invoker.invoke("t", "c", "Apes", "AS").await.unwrap_err() {
            DeployError::ExternalProcessFailure { result, .. } => {
                assert_eq!(result.process_exit_status, Some(1));
                assert_eq!(result.stderr, "revert: insufficient funds");
                assert_eq!(result.stdout, "simulating\n");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn timeout_kills_tool() {
        let (_dir, mut config) = fake_tool("exec sleep 5\n");
        config.timeout = Duration::from_millis(200);
        let invoker = DeploymentInvoker::new(config);

        let started = std::time::Instant::now();
        match invoker.invoke("t", "c", "Apes", "AS").await.unwrap_err() {
            DeployError::ExternalProcessFailure { reason, result } => {
                assert!(reason.contains("timed out"));
                assert_eq!(result.process_exit_status, None);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
