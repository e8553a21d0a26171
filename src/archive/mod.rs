//! Archival workflows: IPFS content to tagged Arweave transactions.
//!
//! - `archive_new_bytes`: add to IPFS, then write to Arweave (no dedup)
//! - `archive_existing`: fetch a CID, size-check, dedup, then write
//! - `archive_many_existing`: validate all CIDs, then archive in rate-limited
//!   batches with per-item soft failure

pub mod batch;
pub mod dedup;
pub mod outcome;

pub use batch::run_batched;
pub use dedup::DedupResolver;
pub use outcome::{ArchiveError, ArchiveOutcome, ArchiveRecord};

use crate::arweave::{Ledger, Signer, CONTENT_TYPE_TAG, IPFS_ADD_TAG};
use crate::config::ArchiveConfig;
use crate::content_id::{parse_cid, ContentId};
use crate::ipfs::{fetch_file, IpfsError, PeerStorage};
use crate::sniff::{ContentTypeSniffer, MagicSniffer};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{error, info};

/// Archives IPFS content to Arweave.
///
/// Adapters are injected and shared with the dedup resolver; nothing here is
/// mutated after construction.
pub struct Archiver<P: ?Sized, L: ?Sized> {
    ipfs: Arc<P>,
    ledger: Arc<L>,
    signer: Arc<dyn Signer>,
    sniffer: Arc<dyn ContentTypeSniffer>,
    resolver: DedupResolver<P, L>,
    config: ArchiveConfig,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "archival task panicked".to_string())
}

impl<P, L> Archiver<P, L>
where
    P: PeerStorage + ?Sized,
    L: Ledger + ?Sized,
{
    /// Create an archiver using the built-in magic-number sniffer.
    pub fn new(ipfs: Arc<P>, ledger: Arc<L>, signer: Arc<dyn Signer>, config: ArchiveConfig) -> Self {
        Self::with_sniffer(ipfs, ledger, signer, Arc::new(MagicSniffer), config)
    }

    pub fn with_sniffer(
        ipfs: Arc<P>,
        ledger: Arc<L>,
        signer: Arc<dyn Signer>,
        sniffer: Arc<dyn ContentTypeSniffer>,
        config: ArchiveConfig,
    ) -> Self {
        let resolver = DedupResolver::new(ipfs.clone(), ledger.clone(), sniffer.clone(), &config);
        Self {
            ipfs,
            ledger,
            signer,
            sniffer,
            resolver,
            config,
        }
    }

    pub fn resolver(&self) -> &DedupResolver<P, L> {
        &self.resolver
    }

    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    /// Add new bytes to IPFS and write them to Arweave.
    ///
    /// No existing-copy check is made on this path. An unparsable CID from
    /// IPFS is an error, as are transport failures and rejected submissions.
    pub async fn archive_new_bytes(
        &self,
        data: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<ArchiveOutcome, ArchiveError> {
        let added = self.ipfs.add(data.clone()).await?;
        let hash = added
            .first()
            .map(|f| f.hash.clone())
            .ok_or_else(|| ArchiveError::UnexpectedIpfsResponse("empty add response".into()))?;

        let cid = parse_cid(&hash).ok_or(ArchiveError::UnexpectedIpfsResponse(hash))?;
        info!(cid = %cid, size = data.len(), "added file to IPFS");

        self.write_to_ledger(&cid, data, content_type).await
    }

    /// Archive the bytes behind an existing CID.
    ///
    /// Invalid CIDs, content missing from IPFS and oversized content are
    /// reported as `Failed`. Transport failures and rejected submissions are
    /// errors.
    pub async fn archive_existing(&self, cid: &str) -> Result<ArchiveOutcome, ArchiveError> {
        let Some(cid) = parse_cid(cid) else {
            return Ok(ArchiveOutcome::failed(ArchiveError::InvalidCid(cid.to_string()).to_string()));
        };

        let fetched = fetch_file(
            &*self.ipfs,
            &*self.sniffer,
            &cid,
            self.config.fetch_timeout,
            self.config.max_file_size,
        )
        .await;
        let file = match fetched {
            Ok(file) => file,
            Err(IpfsError::TooLarge { .. }) => {
                return Ok(ArchiveOutcome::failed(format!(
                    "File is too large, maximum size is: {}",
                    self.config.max_file_size_text()
                )));
            }
            Err(_) => {
                return Ok(ArchiveOutcome::failed(format!(
                    "Unable to find {} on IPFS Network",
                    cid
                )));
            }
        };

        if let Some(tx_id) = self.resolver.find_existing(&cid).await? {
            return Ok(ArchiveOutcome::archived(cid, tx_id, true));
        }

        let content_type = file.file_type.map(|t| t.mime);
        self.write_to_ledger(&cid, file.data, content_type.as_deref())
            .await
    }

    /// Archive many existing CIDs.
    ///
    /// Every CID is validated before any network call; one invalid CID fails
    /// the whole call. After that, each item's error or panic becomes a
    /// `Failed` outcome for that item only. Outcomes are in input order.
    pub async fn archive_many_existing<S>(
        &self,
        cids: &[S],
    ) -> Result<Vec<ArchiveOutcome>, ArchiveError>
    where
        S: AsRef<str>,
    {
        if let Some(invalid) = cids.iter().find(|c| parse_cid(c.as_ref()).is_none()) {
            return Err(ArchiveError::InvalidCid(invalid.as_ref().to_string()));
        }

        info!(
            count = cids.len(),
            batch_size = self.config.batch_size,
            "archiving existing CIDs"
        );

        let outcomes = run_batched(
            cids,
            self.config.batch_size,
            self.config.batch_delay(),
            |cid| self.archive_existing_soft(cid.as_ref()),
        )
        .await;
        Ok(outcomes)
    }

    async fn archive_existing_soft(&self, cid: &str) -> ArchiveOutcome {
        match AssertUnwindSafe(self.archive_existing(cid)).catch_unwind().await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                error!(cid, error = %e, "archival failed");
                ArchiveOutcome::failed(e.to_string())
            }
            Err(payload) => {
                let message = panic_message(&*payload);
                error!(cid, error = %message, "archival panicked");
                ArchiveOutcome::failed(message)
            }
        }
    }

    async fn write_to_ledger(
        &self,
        cid: &ContentId,
        data: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<ArchiveOutcome, ArchiveError> {
        let mut tx = self
            .ledger
            .create_transaction(data, self.signer.as_ref())
            .await?;

        if let Some(content_type) = content_type {
            tx.add_tag(CONTENT_TYPE_TAG, content_type);
        }
        tx.add_tag(IPFS_ADD_TAG, cid.as_str());

        self.ledger.sign(&mut tx, self.signer.as_ref()).await?;
        let resp = self.ledger.submit(&tx).await?;

        if !resp.is_success() {
            return Err(ArchiveError::SubmitRejected {
                status: resp.status,
                status_text: resp.status_text,
            });
        }

        let Some(tx_id) = tx.id else {
            return Err(ArchiveError::Ledger(crate::arweave::LedgerError::InvalidResponse(
                "submitted transaction has no id".into(),
            )));
        };
        info!(cid = %cid, tx_id = %tx_id, size = tx.data.len(), "archived file to Arweave");
        Ok(ArchiveOutcome::archived(cid.clone(), tx_id, false))
    }
}
