//! Trait abstraction for the Arweave permanent ledger.
//!
//! Enables mock implementations for unit testing.

use super::transaction::{DraftTransaction, TxId};
use super::wallet::{Signer, WalletError};
use async_trait::async_trait;

/// Gateway response to a transaction submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResponse {
    pub status: u16,
    pub status_text: String,
}

impl SubmitResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Ledger operation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Gateway returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Transaction not found: {0}")]
    NotFound(TxId),

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),

    #[error("Signing failed: {0}")]
    Signing(#[from] WalletError),
}

/// Permanent-ledger gateway.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Ids of transactions carrying tag `name = value`, newest first.
    async fn query_by_tag(&self, name: &str, value: &str) -> LedgerResult<Vec<TxId>>;

    /// Raw data of a transaction.
    async fn fetch_data(&self, id: &TxId) -> LedgerResult<Vec<u8>>;

    /// Build an unsigned data transaction owned by `signer`.
    async fn create_transaction(
        &self,
        data: Vec<u8>,
        signer: &dyn Signer,
    ) -> LedgerResult<DraftTransaction>;

    /// Sign a draft transaction.
    async fn sign(&self, tx: &mut DraftTransaction, signer: &dyn Signer) -> LedgerResult<()> {
        tx.sign(signer)?;
        Ok(())
    }

    /// Submit a signed transaction. Non-2xx statuses are returned, not raised.
    async fn submit(&self, tx: &DraftTransaction) -> LedgerResult<SubmitResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_response_success_range() {
        let ok = |status| SubmitResponse {
            status,
            status_text: String::new(),
        };
        assert!(ok(200).is_success());
        assert!(ok(208).is_success());
        assert!(ok(299).is_success());
        assert!(!ok(199).is_success());
        assert!(!ok(300).is_success());
        assert!(!ok(400).is_success());
    }

    #[test]
    fn test_ledger_error_from_wallet_error() {
        let err: LedgerError = WalletError::SigningFailed.into();
        assert_eq!(err.to_string(), "Signing failed: Signing failed");
    }
}
