//! IPFS peer-storage integration.
//!
//! - `PeerStorage` trait for fetch/store by content identifier
//! - HTTP API client for production
//! - In-memory mock for tests

pub mod http;
pub mod mock;
pub mod traits;

pub use http::IpfsHttpClient;
pub use mock::MockPeerStorage;
pub use traits::{AddedFile, IpfsError, IpfsResult, PeerStorage};

use crate::content_id::ContentId;
use crate::sniff::{ContentTypeSniffer, FileType};
use std::time::Duration;
use tracing::warn;

/// Bytes fetched from IPFS together with their detected type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFile {
    pub data: Vec<u8>,
    pub file_type: Option<FileType>,
}

/// Fetch a file of at most `max_size` bytes and sniff its content type.
///
/// Failures (timeout, not found, transport, too large) are logged and
/// returned. Callers treat everything except [`IpfsError::TooLarge`] as "not
/// available on the network".
pub async fn fetch_file<P>(
    storage: &P,
    sniffer: &dyn ContentTypeSniffer,
    cid: &ContentId,
    timeout: Duration,
    max_size: usize,
) -> IpfsResult<FetchedFile>
where
    P: PeerStorage + ?Sized,
{
    match storage.cat_limited(cid, timeout, max_size).await {
        Ok(data) => {
            let file_type = sniffer.detect(&data);
            Ok(FetchedFile { data, file_type })
        }
        Err(e) => {
            warn!(cid = %cid, error = %e, "failed to fetch from IPFS");
            Err(e)
        }
    }
}
