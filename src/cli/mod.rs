use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

pub mod archive;
pub mod init_config;
pub mod logging;
pub mod version;

use permafy::config::{default_config_path, PermafyConfig};

#[derive(Parser)]
#[command(name = "permafy")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Archive IPFS content permanently on Arweave", long_about = None)]
pub struct Cli {
    /// Path to config file (default: ~/.config/permafy/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a local file to IPFS and archive it on Arweave
    Add {
        /// File to upload
        file: PathBuf,

        /// Mime type recorded in the Content-Type tag
        #[arg(long)]
        content_type: Option<String>,
    },

    /// Archive content already on IPFS
    Pin {
        /// Content identifier (CIDv0 or CIDv1)
        cid: String,
    },

    /// Archive many CIDs in rate-limited batches
    PinMany {
        /// Content identifiers
        cids: Vec<String>,

        /// Read additional CIDs from a file, one per line
        #[arg(long)]
        from_file: Option<PathBuf>,
    },

    /// Look up an existing Arweave copy of a CID without writing anything
    Find {
        /// Content identifier
        cid: String,
    },

    /// Write a default configuration file
    InitConfig {
        /// Destination (defaults to --config or the standard location)
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

/// Load configuration and apply environment overrides.
fn load_config(path: Option<&Path>) -> Result<PermafyConfig, Box<dyn std::error::Error>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    let mut config = PermafyConfig::load_or_default(&path)?;
    config.apply_env();
    Ok(config)
}

pub async fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Version => {
            version::execute();
            Ok(())
        }
        Commands::InitConfig { path } => init_config::execute(path.or(cli.config)),
        command => {
            let config = load_config(cli.config.as_deref())?;
            logging::init(&config.logging)?;

            match command {
                Commands::Add { file, content_type } => {
                    archive::add(&config, &file, content_type.as_deref()).await
                }
                Commands::Pin { cid } => archive::pin(&config, &cid).await,
                Commands::PinMany { cids, from_file } => {
                    archive::pin_many(&config, cids, from_file.as_deref()).await
                }
                Commands::Find { cid } => archive::find(&config, &cid).await,
                Commands::Version | Commands::InitConfig { .. } => Ok(()),
            }
        }
    }
}
