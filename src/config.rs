//! Permafy configuration file handling
//!
//! Configuration files are TOML. Every section has defaults, so an empty file
//! is a valid configuration. After loading, the IPFS endpoint can be
//! overridden from the environment (`IPFS_API_HOST`, `IPFS_API_PORT`,
//! `IPFS_API_PROTOCOL`).
//!
//! Wallet key material is never stored in this file: it comes from
//! `AR_WALLET_JSON` or from the JWK file named by `arweave.wallet_file`.

use crate::arweave::{Wallet, WalletError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default log level
const DEFAULT_LOG_LEVEL: &str = "info";

/// 10 MiB
pub const DEFAULT_MAX_FILE_SIZE: usize = 1024 * 1024 * 10;

/// Environment variable holding the wallet JWK.
pub const WALLET_ENV: &str = "AR_WALLET_JSON";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {reason}")]
    Read { path: String, reason: String },

    #[error("Failed to parse config file '{path}': {reason}")]
    Parse { path: String, reason: String },

    #[error("Failed to write config file '{path}': {reason}")]
    Write { path: String, reason: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Please set AR_WALLET_JSON environment variable or arweave.wallet_file")]
    MissingWallet,

    #[error(transparent)]
    Wallet(#[from] WalletError),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PermafyConfig {
    #[serde(default)]
    pub ipfs: IpfsConfig,

    #[serde(default)]
    pub arweave: ArweaveConfig,

    #[serde(default)]
    pub archive: ArchiveConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// IPFS HTTP API endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpfsConfig {
    pub host: String,
    pub port: u16,
    pub protocol: String,

    /// Timeout for fetching a file by CID
    pub fetch_timeout_secs: u64,
}

impl Default for IpfsConfig {
    fn default() -> Self {
        Self {
            host: "ipfs.infura.io".to_string(),
            port: 5001,
            protocol: "https".to_string(),
            fetch_timeout_secs: 50,
        }
    }
}

impl IpfsConfig {
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// Arweave gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArweaveConfig {
    pub host: String,
    pub port: u16,
    pub protocol: String,

    /// Path to a JWK wallet file (used when AR_WALLET_JSON is unset)
    pub wallet_file: Option<PathBuf>,

    /// Results requested per GraphQL page
    pub query_page_size: u32,

    /// Upper bound on GraphQL pages followed per tag query
    pub max_query_pages: u32,
}

impl Default for ArweaveConfig {
    fn default() -> Self {
        Self {
            host: "arweave.net".to_string(),
            port: 443,
            protocol: "https".to_string(),
            wallet_file: None,
            query_page_size: 100,
            max_query_pages: 10,
        }
    }
}

impl ArweaveConfig {
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }
}

/// Archival policy and rate limiting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Largest payload accepted when archiving an existing CID (bytes)
    pub max_file_size: usize,

    /// Items processed concurrently in bulk archival
    pub batch_size: usize,

    /// Pause between bulk batches
    pub batch_delay_ms: u64,

    /// Ledger candidates compared during deduplication
    pub max_dedup_checks: usize,

    /// Timeout for fetching a file by CID (copied from `[ipfs]` at startup)
    #[serde(skip)]
    pub fetch_timeout: Duration,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            batch_size: 10,
            batch_delay_ms: 30,
            max_dedup_checks: 5,
            fetch_timeout: IpfsConfig::default().fetch_timeout(),
        }
    }
}

impl ArchiveConfig {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    /// Size limit in human readable form, e.g. `10MiB`.
    pub fn max_file_size_text(&self) -> String {
        format_size(self.max_file_size)
    }
}

/// Render a byte count using the largest binary unit that divides it evenly.
pub fn format_size(bytes: usize) -> String {
    const UNITS: [(usize, &str); 3] = [(1 << 30, "GiB"), (1 << 20, "MiB"), (1 << 10, "KiB")];
    UNITS
        .iter()
        .find(|(unit, _)| bytes >= *unit && bytes % unit == 0)
        .map(|(unit, name)| format!("{}{}", bytes / unit, name))
        .unwrap_or_else(|| format!("{}B", bytes))
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: None,
        }
    }
}

impl PermafyConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let config: PermafyConfig = toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |reason: String| ConfigError::Write {
            path: path.display().to_string(),
            reason,
        };

        let contents = toml::to_string_pretty(self).map_err(|e| write_err(e.to_string()))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
        }

        fs::write(path, contents).map_err(|e| write_err(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.archive.batch_size == 0 {
            return Err(ConfigError::Invalid("archive.batch_size must be at least 1".into()));
        }
        if self.archive.max_dedup_checks == 0 {
            return Err(ConfigError::Invalid(
                "archive.max_dedup_checks must be at least 1".into(),
            ));
        }
        if self.archive.max_file_size == 0 {
            return Err(ConfigError::Invalid("archive.max_file_size must be positive".into()));
        }
        Ok(())
    }

    /// Apply `IPFS_API_*` overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply `IPFS_API_*` overrides from an arbitrary lookup.
    ///
    /// Empty values are ignored; an unparsable or zero port keeps the configured one.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(host) = get("IPFS_API_HOST") {
            self.ipfs.host = host;
        }
        if let Some(port) = get("IPFS_API_PORT")
            .and_then(|p| p.parse::<u16>().ok())
            .filter(|&p| p != 0)
        {
            self.ipfs.port = port;
        }
        if let Some(protocol) = get("IPFS_API_PROTOCOL") {
            self.ipfs.protocol = protocol;
        }
    }

    /// Archive policy with the IPFS fetch timeout filled in.
    pub fn archive_config(&self) -> ArchiveConfig {
        ArchiveConfig {
            fetch_timeout: self.ipfs.fetch_timeout(),
            ..self.archive.clone()
        }
    }

    /// Load the signing wallet from the environment or `arweave.wallet_file`.
    pub fn load_wallet(&self) -> Result<Wallet, ConfigError> {
        self.load_wallet_from(std::env::var(WALLET_ENV).ok())
    }

    /// Load the signing wallet, preferring inline JWK text when given.
    pub fn load_wallet_from(&self, jwk_json: Option<String>) -> Result<Wallet, ConfigError> {
        match (jwk_json.filter(|j| !j.trim().is_empty()), &self.arweave.wallet_file) {
            (Some(json), _) => Ok(Wallet::from_jwk_json(&json)?),
            (None, Some(path)) => Ok(Wallet::from_file(path)?),
            (None, None) => Err(ConfigError::MissingWallet),
        }
    }

    /// Generate default configuration content as a string with comments
    pub fn generate_default_toml() -> String {
        r#"# Permafy Configuration
#
# Wallet key material is NOT stored here. Provide it through the
# AR_WALLET_JSON environment variable (JWK text) or point
# arweave.wallet_file at a JWK file.

[ipfs]
# IPFS HTTP API endpoint. Overridden by IPFS_API_HOST, IPFS_API_PORT
# and IPFS_API_PROTOCOL when set.
host = "ipfs.infura.io"
port = 5001
protocol = "https"

# Seconds to wait when fetching a file by CID
fetch_timeout_secs = 50

[arweave]
host = "arweave.net"
port = 443
protocol = "https"

# wallet_file = "/etc/permafy/wallet.json"

# Tag search paging
query_page_size = 100
max_query_pages = 10

[archive]
# Largest payload accepted when archiving an existing CID (10 MiB)
max_file_size = 10485760

# Bulk archival: items in flight per batch and pause between batches.
# These follow the IPFS/Arweave service rate limits.
batch_size = 10
batch_delay_ms = 30

# Oldest ledger candidates compared when checking for an existing copy
max_dedup_checks = 5

[logging]
# Log level: trace, debug, info, warn, error (RUST_LOG takes precedence)
level = "info"

# Log file path (optional, logs to stderr if not specified)
# file = "/var/log/permafy/permafy.log"
"#
        .to_string()
    }

    /// Create and save a default configuration file
    pub fn create_default(config_path: &Path) -> Result<(), ConfigError> {
        let write_err = |reason: String| ConfigError::Write {
            path: config_path.display().to_string(),
            reason,
        };

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
        }

        fs::write(config_path, Self::generate_default_toml()).map_err(|e| write_err(e.to_string()))
    }
}

/// Get the default config file path
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("permafy")
        .join("config.toml")
}
