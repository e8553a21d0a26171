//! Mock Arweave gateway and signer for testing.

use super::traits::*;
use super::transaction::{DraftTransaction, Tag, TxId};
use super::wallet::{Signer, WalletError};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Deterministic signer: the "signature" is SHA-256 of the message.
#[derive(Debug, Clone)]
pub struct StaticSigner {
    owner: Vec<u8>,
}

impl StaticSigner {
    pub fn new() -> Self {
        Self {
            owner: vec![0xab; 64],
        }
    }
}

impl Default for StaticSigner {
    fn default() -> Self {
        Self::new()
    }
}

impl Signer for StaticSigner {
    fn owner(&self) -> &[u8] {
        &self.owner
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, WalletError> {
        Ok(Sha256::digest(message).to_vec())
    }
}

struct StoredTx {
    id: TxId,
    tags: Vec<Tag>,
    data: Vec<u8>,
}

#[derive(Default)]
struct MockState {
    /// Oldest first.
    txs: Vec<StoredTx>,
    failing_fetch: HashSet<TxId>,
    failing_query: bool,
    submit_status: Option<(u16, String)>,
    next_id: u64,
    anchors_issued: u64,
    query_calls: usize,
    fetched: Vec<TxId>,
    submitted: Vec<DraftTransaction>,
}

/// In-memory ledger. Queries return newest first, like the gateway.
#[derive(Clone, Default)]
pub struct MockLedger {
    state: Arc<Mutex<MockState>>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an existing transaction tagged `IPFS-Add = cid` (for test setup).
    /// Later calls are newer.
    pub fn insert(&self, cid: &str, data: &[u8]) -> TxId {
        let mut s = self.state.lock().unwrap();
        s.next_id += 1;
        let id = TxId(format!("mock-tx-{}", s.next_id));
        s.txs.push(StoredTx {
            id: id.clone(),
            tags: vec![Tag::new("IPFS-Add", cid)],
            data: data.to_vec(),
        });
        id
    }

    /// Make `fetch_data` fail for this transaction.
    pub fn fail_fetch(&self, id: &TxId) {
        self.state.lock().unwrap().failing_fetch.insert(id.clone());
    }

    /// Make every tag query fail.
    pub fn fail_queries(&self) {
        self.state.lock().unwrap().failing_query = true;
    }

    /// Respond to submissions with this status instead of 200 OK.
    pub fn set_submit_status(&self, status: u16, text: &str) {
        self.state.lock().unwrap().submit_status = Some((status, text.to_string()));
    }

    pub fn query_calls(&self) -> usize {
        self.state.lock().unwrap().query_calls
    }

    /// Transaction ids passed to `fetch_data`, in call order.
    pub fn fetched(&self) -> Vec<TxId> {
        self.state.lock().unwrap().fetched.clone()
    }

    /// Every transaction passed to `submit`, accepted or not.
    pub fn submitted(&self) -> Vec<DraftTransaction> {
        self.state.lock().unwrap().submitted.clone()
    }

    pub fn submit_calls(&self) -> usize {
        self.state.lock().unwrap().submitted.len()
    }
}

#[async_trait]
impl Ledger for MockLedger {
    async fn query_by_tag(&self, name: &str, value: &str) -> LedgerResult<Vec<TxId>> {
        let mut s = self.state.lock().unwrap();
        s.query_calls += 1;
        if s.failing_query {
            return Err(LedgerError::Network("graphql unavailable".to_string()));
        }

        let wanted = Tag::new(name, value);
        Ok(s.txs
            .iter()
            .rev()
            .filter(|tx| tx.tags.contains(&wanted))
            .map(|tx| tx.id.clone())
            .collect())
    }

    async fn fetch_data(&self, id: &TxId) -> LedgerResult<Vec<u8>> {
        let mut s = self.state.lock().unwrap();
        s.fetched.push(id.clone());
        if s.failing_fetch.contains(id) {
            return Err(LedgerError::Network("gateway timeout".to_string()));
        }
        s.txs
            .iter()
            .find(|tx| &tx.id == id)
            .map(|tx| tx.data.clone())
            .ok_or_else(|| LedgerError::NotFound(id.clone()))
    }

    async fn create_transaction(
        &self,
        data: Vec<u8>,
        signer: &dyn Signer,
    ) -> LedgerResult<DraftTransaction> {
        let mut s = self.state.lock().unwrap();
        s.anchors_issued += 1;
        let anchor = s.anchors_issued.to_be_bytes().to_vec();
        Ok(DraftTransaction::new(
            data,
            signer.owner().to_vec(),
            anchor,
            "1000".to_string(),
        ))
    }

    async fn submit(&self, tx: &DraftTransaction) -> LedgerResult<SubmitResponse> {
        let mut s = self.state.lock().unwrap();
        s.submitted.push(tx.clone());

        let id = tx
            .id
            .clone()
            .ok_or_else(|| LedgerError::InvalidResponse("transaction is not signed".into()))?;

        let (status, status_text) = s
            .submit_status
            .clone()
            .unwrap_or((200, "OK".to_string()));
        if (200..300).contains(&status) {
            s.txs.push(StoredTx {
                id,
                tags: tx.tags.clone(),
                data: tx.data.clone(),
            });
        }
        Ok(SubmitResponse {
            status,
            status_text,
        })
    }
}
