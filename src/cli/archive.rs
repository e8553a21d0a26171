//! Archival commands wired to the live IPFS and Arweave endpoints.

use permafy::archive::{Archiver, DedupResolver};
use permafy::arweave::ArweaveHttpClient;
use permafy::config::PermafyConfig;
use permafy::content_id::parse_cid;
use permafy::ipfs::IpfsHttpClient;
use permafy::sniff::MagicSniffer;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

type LiveArchiver = Archiver<IpfsHttpClient, ArweaveHttpClient>;

fn build_archiver(config: &PermafyConfig) -> Result<LiveArchiver, Box<dyn std::error::Error>> {
    let wallet = config.load_wallet()?;
    info!(address = %wallet.address(), ipfs = %config.ipfs.base_url(), arweave = %config.arweave.base_url(), "loaded wallet");

    let ipfs = Arc::new(IpfsHttpClient::new(&config.ipfs)?);
    let ledger = Arc::new(ArweaveHttpClient::new(&config.arweave)?);
    Ok(Archiver::new(ipfs, ledger, Arc::new(wallet), config.archive_config()))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Read CIDs from a file, one per line. Blank lines are skipped.
pub fn read_cid_list(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

pub async fn add(
    config: &PermafyConfig,
    file: &Path,
    content_type: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = tokio::fs::read(file)
        .await
        .map_err(|e| format!("failed to read {}: {}", file.display(), e))?;

    let archiver = build_archiver(config)?;
    let outcome = archiver.archive_new_bytes(data, content_type).await?;
    print_json(&outcome)
}

pub async fn pin(config: &PermafyConfig, cid: &str) -> Result<(), Box<dyn std::error::Error>> {
    let archiver = build_archiver(config)?;
    let outcome = archiver.archive_existing(cid).await?;
    print_json(&outcome)
}

pub async fn pin_many(
    config: &PermafyConfig,
    mut cids: Vec<String>,
    from_file: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = from_file {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
        cids.extend(read_cid_list(&contents));
    }

    if cids.is_empty() {
        return Err("no CIDs given".into());
    }

    let archiver = build_archiver(config)?;
    let outcomes = archiver.archive_many_existing(&cids).await?;
    print_json(&outcomes)
}

#[derive(Serialize)]
struct FindResult<'a> {
    hash: &'a str,
    id: Option<String>,
}

pub async fn find(config: &PermafyConfig, cid: &str) -> Result<(), Box<dyn std::error::Error>> {
    let cid = parse_cid(cid).ok_or_else(|| format!("Invalid CID: {}", cid))?;

    let resolver = DedupResolver::new(
        Arc::new(IpfsHttpClient::new(&config.ipfs)?),
        Arc::new(ArweaveHttpClient::new(&config.arweave)?),
        Arc::new(MagicSniffer),
        &config.archive_config(),
    );

    let found = resolver.find_existing(&cid).await?;
    if found.is_none() {
        eprintln!("not found");
    }
    print_json(&FindResult {
        hash: cid.as_str(),
        id: found.map(|id| id.to_string()),
    })
}
