//! mintdeploy entry point.

mod app;
mod config;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use mintdeploy_deploy::DEFAULT_ARTIFACTS_ROOT;
use tracing_subscriber::EnvFilter;

use crate::app::PinTarget;
use crate::config::{DEFAULT_CONFIG_FILE, DEFAULT_DOTENV_FILE, Settings};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish a collection's assets and deploy its contract
    Deploy {
        /// Collection name; also the directory under the artifacts root
        #[arg(long)]
        collection_name: String,
        /// Local artifacts directory
        #[arg(long, default_value = DEFAULT_ARTIFACTS_ROOT)]
        artifacts_root: PathBuf,
        /// Publish and rewrite metadata without running the deployment tool
        #[arg(long)]
        metadata_only: bool,
    },
    /// Pin content to IPFS
    Pin {
        #[command(subcommand)]
        target: PinCommand,
    },
}

#[derive(Subcommand)]
enum PinCommand {
    /// Pin a single file
    File {
        path: PathBuf,
        /// Pin name (defaults to the file name)
        #[arg(long)]
        name: Option<String>,
    },
    /// Pin a directory as one folder
    Folder {
        path: PathBuf,
        /// Pin name (defaults to the directory name)
        #[arg(long)]
        name: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let explicit = cli.config.is_some();
    let config_path = cli
        .config
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let mut settings = Settings::load(&config_path, explicit)?;
    config::load_dotenv(Path::new(DEFAULT_DOTENV_FILE))?;
    settings.apply_env(|key| std::env::var(key).ok());

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        match cli.command {
            Commands::Deploy {
                collection_name,
                artifacts_root,
                metadata_only,
            } => app::deploy(&settings, artifacts_root, collection_name, metadata_only).await,
            Commands::Pin { target } => match target {
                PinCommand::File { path, name } => {
                    app::pin(&settings, PinTarget::File, &path, name).await
                }
                PinCommand::Folder { path, name } => {
                    app::pin(&settings, PinTarget::Folder, &path, name).await
                }
            },
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deploy_defaults() {
        let cli = Cli::try_parse_from(["mintdeploy", "deploy", "--collection-name", "Cool Apes"])
            .unwrap();
        match cli.command {
            Commands::Deploy {
                collection_name,
                artifacts_root,
                metadata_only,
            } => {
                assert_eq!(collection_name, "Cool Apes");
                assert_eq!(artifacts_root, PathBuf::from("deployment-artifacts"));
                assert!(!metadata_only);
            }
            _ => panic!("expected deploy"),
        }
        assert!(cli.config.is_none());
    }

    #[test]
    fn collection_name_required() {
        assert!(Cli::try_parse_from(["mintdeploy", "deploy"]).is_err());
    }

    #[test]
    fn pin_folder_with_global_config() {
        let cli = Cli::try_parse_from([
            "mintdeploy",
            "pin",
            "folder",
            "deployment-artifacts/Apes/metadata/tokens",
            "--config",
            "custom.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        assert!(matches!(
            cli.command,
            Commands::Pin {
                target: PinCommand::Folder { name: None, .. }
            }
        ));
    }
}
