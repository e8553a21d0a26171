//! Arweave permanent-ledger integration.
//!
//! This module provides:
//! - `Ledger` trait for tag search, data fetch and transaction submission
//! - Format-2 transaction building and signing
//! - JWK wallet loading
//! - Gateway HTTP client and an in-memory mock

pub mod http;
pub mod mock;
pub mod traits;
pub mod transaction;
pub mod wallet;

pub use http::ArweaveHttpClient;
pub use mock::{MockLedger, StaticSigner};
pub use traits::{Ledger, LedgerError, LedgerResult, SubmitResponse};
pub use transaction::{DraftTransaction, Tag, TxId};
pub use wallet::{Signer, Wallet, WalletError};

/// Tag holding the IPFS CID a transaction archives.
pub const IPFS_ADD_TAG: &str = "IPFS-Add";

/// Tag holding the archived payload's mime type.
pub const CONTENT_TYPE_TAG: &str = "Content-Type";
