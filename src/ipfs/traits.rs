//! Trait abstraction for the IPFS peer-storage network.
//!
//! Enables mock implementations for unit testing.

use crate::content_id::ContentId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One entry of an `add` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddedFile {
    pub path: String,
    pub hash: String,
    pub size: u64,
}

/// Result type for IPFS operations.
pub type IpfsResult<T> = Result<T, IpfsError>;

/// IPFS operation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IpfsError {
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IPFS API returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),

    #[error("Content exceeds the {limit} byte limit")]
    TooLarge { limit: usize },
}

/// Peer-storage gateway.
#[async_trait]
pub trait PeerStorage: Send + Sync {
    /// Fetch the bytes addressed by `cid`, giving up after `timeout`.
    async fn cat(&self, cid: &ContentId, timeout: Duration) -> IpfsResult<Vec<u8>>;

    /// Like `cat`, but fails with [`IpfsError::TooLarge`] once the content
    /// passes `max_size` bytes. Adapters that stream should stop reading there.
    async fn cat_limited(
        &self,
        cid: &ContentId,
        timeout: Duration,
        max_size: usize,
    ) -> IpfsResult<Vec<u8>> {
        let data = self.cat(cid, timeout).await?;
        if data.len() > max_size {
            return Err(IpfsError::TooLarge { limit: max_size });
        }
        Ok(data)
    }

    /// Store bytes, returning the added entries (the first one is the file itself).
    async fn add(&self, data: Vec<u8>) -> IpfsResult<Vec<AddedFile>>;
}
