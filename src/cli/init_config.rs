use permafy::config::{default_config_path, PermafyConfig};
use std::path::PathBuf;

/// Write a commented default configuration file.
///
/// Refuses to overwrite an existing file.
pub fn execute(path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let path = path.unwrap_or_else(default_config_path);

    if path.exists() {
        return Err(format!("config file already exists: {}", path.display()).into());
    }

    PermafyConfig::create_default(&path)?;
    println!("📝 Created default configuration: {}", path.display());
    println!("   Set AR_WALLET_JSON or arweave.wallet_file before archiving.");
    Ok(())
}
