//! Mock IPFS node for testing.

use super::traits::*;
use crate::content_id::ContentId;
use async_trait::async_trait;
use cid::multihash::Multihash;
use cid::Cid;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Multihash code for sha2-256.
const SHA2_256: u64 = 0x12;

/// In-memory IPFS node addressing content by CIDv0.
#[derive(Clone, Default)]
pub struct MockPeerStorage {
    state: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    blocks: HashMap<String, Vec<u8>>,
    failing: HashSet<String>,
    cat_calls: HashMap<String, usize>,
    add_calls: usize,
    add_override: Option<String>,
}

/// CIDv0 for a payload (sha2-256 multihash of the raw bytes).
pub fn cid_for(data: &[u8]) -> ContentId {
    let digest = Sha256::digest(data);
    let mh = Multihash::<64>::wrap(SHA2_256, &digest).expect("32-byte digest fits");
    ContentId::from(Cid::new_v0(mh).expect("sha2-256 multihash is a valid v0 CID"))
}

impl MockPeerStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store bytes directly (for test setup), returning their CID.
    pub fn put(&self, data: &[u8]) -> ContentId {
        let cid = cid_for(data);
        self.put_at(&cid, data.to_vec());
        cid
    }

    /// Store bytes under an arbitrary identifier.
    pub fn put_at(&self, cid: &ContentId, data: Vec<u8>) {
        let mut s = self.state.lock().unwrap();
        s.blocks.insert(cid.as_str().to_string(), data);
    }

    /// Make every `cat` of this identifier fail with a network error.
    pub fn fail_cat(&self, cid: &ContentId) {
        let mut s = self.state.lock().unwrap();
        s.failing.insert(cid.as_str().to_string());
    }

    /// Make `add` report this hash instead of the real one.
    pub fn override_add_hash(&self, hash: &str) {
        let mut s = self.state.lock().unwrap();
        s.add_override = Some(hash.to_string());
    }

    pub fn cat_calls(&self, cid: &ContentId) -> usize {
        let s = self.state.lock().unwrap();
        s.cat_calls.get(cid.as_str()).copied().unwrap_or(0)
    }

    pub fn total_cat_calls(&self) -> usize {
        let s = self.state.lock().unwrap();
        s.cat_calls.values().sum()
    }

    pub fn add_calls(&self) -> usize {
        self.state.lock().unwrap().add_calls
    }
}

#[async_trait]
impl PeerStorage for MockPeerStorage {
    async fn cat(&self, cid: &ContentId, _timeout: Duration) -> IpfsResult<Vec<u8>> {
        let mut s = self.state.lock().unwrap();
        *s.cat_calls.entry(cid.as_str().to_string()).or_default() += 1;

        if s.failing.contains(cid.as_str()) {
            return Err(IpfsError::Network("connection reset".to_string()));
        }
        s.blocks
            .get(cid.as_str())
            .cloned()
            .ok_or_else(|| IpfsError::NotFound(cid.to_string()))
    }

    async fn add(&self, data: Vec<u8>) -> IpfsResult<Vec<AddedFile>> {
        let cid = cid_for(&data);
        let mut s = self.state.lock().unwrap();
        s.add_calls += 1;

        let hash = s
            .add_override
            .clone()
            .unwrap_or_else(|| cid.as_str().to_string());
        let size = data.len() as u64;
        s.blocks.insert(cid.as_str().to_string(), data);

        Ok(vec![AddedFile {
            path: hash.clone(),
            hash,
            size,
        }])
    }
}
