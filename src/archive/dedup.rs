//! Existing-copy discovery on Arweave.
//!
//! ## Algorithm
//!
//! 1. Tag search for `IPFS-Add = <cid>` (newest first)
//! 2. No candidates: not archived
//! 3. Start one IPFS fetch of the authoritative bytes, shared by every check
//! 4. Walk candidates oldest first, at most `max_checks` of them
//! 5. A candidate matches when its data digest equals the IPFS digest
//!
//! IPFS being unavailable and digest mismatches resolve to "not found". A
//! ledger fault (tag search or candidate data fetch) is an error, so a
//! transport failure never causes a duplicate write. A non-matching
//! transaction is never returned.

use super::outcome::ArchiveError;
use crate::arweave::{Ledger, TxId, IPFS_ADD_TAG};
use crate::config::ArchiveConfig;
use crate::content_id::ContentId;
use crate::digest::ContentDigest;
use crate::ipfs::{fetch_file, PeerStorage};
use crate::sniff::ContentTypeSniffer;
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Decides whether a CID's bytes already live on the ledger.
pub struct DedupResolver<P: ?Sized, L: ?Sized> {
    ipfs: Arc<P>,
    ledger: Arc<L>,
    sniffer: Arc<dyn ContentTypeSniffer>,
    max_checks: usize,
    fetch_timeout: Duration,
    max_file_size: usize,
}

impl<P, L> DedupResolver<P, L>
where
    P: PeerStorage + ?Sized,
    L: Ledger + ?Sized,
{
    /// Takes the check cap, fetch timeout and size limit from `config`.
    pub fn new(
        ipfs: Arc<P>,
        ledger: Arc<L>,
        sniffer: Arc<dyn ContentTypeSniffer>,
        config: &ArchiveConfig,
    ) -> Self {
        Self {
            ipfs,
            ledger,
            sniffer,
            max_checks: config.max_dedup_checks,
            fetch_timeout: config.fetch_timeout,
            max_file_size: config.max_file_size,
        }
    }

    /// Find a ledger transaction holding exactly the bytes of `cid`.
    ///
    /// Errors when the tag search or a candidate data fetch fails. An
    /// unavailable IPFS source is reported as `None` before any ledger error.
    pub async fn find_existing(&self, cid: &ContentId) -> Result<Option<TxId>, ArchiveError> {
        let candidates = self.ledger.query_by_tag(IPFS_ADD_TAG, cid.as_str()).await?;
        if candidates.is_empty() {
            return Ok(None);
        }

        // Polled alongside the first candidate fetch; later checks reuse the output.
        let source = fetch_file(
            &*self.ipfs,
            &*self.sniffer,
            cid,
            self.fetch_timeout,
            self.max_file_size,
        )
        .map(|file| file.ok().map(|f| ContentDigest::of(&f.data)))
        .shared();

        info!(
            cid = %cid,
            candidates = candidates.len(),
            max_checks = self.max_checks,
            "checking ledger for existing copy"
        );

        for tx_id in candidates.iter().rev().take(self.max_checks) {
            let (ledger_data, source_digest) =
                futures::join!(self.ledger.fetch_data(tx_id), source.clone());

            let Some(source_digest) = source_digest else {
                warn!(cid = %cid, "source bytes unavailable from IPFS, treating as not archived");
                return Ok(None);
            };

            let ledger_data = ledger_data.map_err(|e| {
                warn!(cid = %cid, tx_id = %tx_id, error = %e, "failed to fetch candidate data");
                e
            })?;

            let ledger_digest = ContentDigest::of(&ledger_data);
            if ledger_digest == source_digest {
                info!(cid = %cid, tx_id = %tx_id, "found file already on Arweave with matching data");
                return Ok(Some(tx_id.clone()));
            }

            warn!(
                cid = %cid,
                tx_id = %tx_id,
                ledger_digest = %ledger_digest,
                source_digest = %source_digest,
                ledger_size = ledger_data.len(),
                "data mismatch between IPFS and Arweave for the same CID"
            );
        }

        debug!(cid = %cid, "no matching copy on Arweave");
        Ok(None)
    }
}
