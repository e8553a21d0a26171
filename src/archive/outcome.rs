//! Archival results and errors.

use crate::arweave::{LedgerError, TxId};
use crate::content_id::ContentId;
use crate::ipfs::IpfsError;
use serde::{Serialize, Serializer};

/// Fatal archival errors.
///
/// Expected conditions (not found, too large) are reported as
/// [`ArchiveOutcome::Failed`] instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArchiveError {
    #[error("Invalid CID: {0}")]
    InvalidCid(String),

    #[error("Unexpected response putting file to ipfs: {0}")]
    UnexpectedIpfsResponse(String),

    #[error("Error posting file to Arweave: {status} - {status_text}")]
    SubmitRejected { status: u16, status_text: String },

    #[error(transparent)]
    Ipfs(#[from] IpfsError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// A CID paired with the Arweave transaction holding its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRecord {
    pub content_id: ContentId,
    pub tx_id: TxId,
    /// True when an existing transaction was found and nothing was written.
    pub already_existed: bool,
}

/// Result of a single archival operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveOutcome {
    Archived(ArchiveRecord),
    Failed { message: String },
}

impl ArchiveOutcome {
    pub fn archived(content_id: ContentId, tx_id: TxId, already_existed: bool) -> Self {
        Self::Archived(ArchiveRecord {
            content_id,
            tx_id,
            already_existed,
        })
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Archived(_))
    }

    pub fn record(&self) -> Option<&ArchiveRecord> {
        match self {
            Self::Archived(record) => Some(record),
            Self::Failed { .. } => None,
        }
    }

    pub fn tx_id(&self) -> Option<&TxId> {
        self.record().map(|r| &r.tx_id)
    }

    pub fn already_existed(&self) -> bool {
        self.record().is_some_and(|r| r.already_existed)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Archived(_) => None,
            Self::Failed { message } => Some(message),
        }
    }
}

/// Wire shape: `{ok, hash, id, alreadyPinned?}` or `{ok, error}`.
#[derive(Serialize)]
#[serde(untagged)]
enum OutcomeJson<'a> {
    Archived {
        ok: bool,
        hash: &'a str,
        id: &'a str,
        #[serde(rename = "alreadyPinned", skip_serializing_if = "Option::is_none")]
        already_pinned: Option<bool>,
    },
    Failed {
        ok: bool,
        error: &'a str,
    },
}

impl Serialize for ArchiveOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match self {
            Self::Archived(record) => OutcomeJson::Archived {
                ok: true,
                hash: record.content_id.as_str(),
                id: record.tx_id.as_str(),
                already_pinned: record.already_existed.then_some(true),
            },
            Self::Failed { message } => OutcomeJson::Failed {
                ok: false,
                error: message,
            },
        };
        wire.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content_id::parse_cid;
    use serde_json::json;

    const CID: &str = "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG";

    #[test]
    fn test_outcome_json_archived() {
        let outcome = ArchiveOutcome::archived(parse_cid(CID).unwrap(), TxId::new("tx1"), false);
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({ "ok": true, "hash": CID, "id": "tx1" })
        );
    }

    #[test]
    fn test_outcome_json_already_pinned() {
        let outcome = ArchiveOutcome::archived(parse_cid(CID).unwrap(), TxId::new("tx1"), true);
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({ "ok": true, "hash": CID, "id": "tx1", "alreadyPinned": true })
        );
        assert!(outcome.already_existed());
    }

    #[test]
    fn test_outcome_json_failed() {
        let outcome = ArchiveOutcome::failed("nope");
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({ "ok": false, "error": "nope" })
        );
        assert!(!outcome.is_ok());
        assert_eq!(outcome.error(), Some("nope"));
        assert!(outcome.tx_id().is_none());
    }

    #[test]
    fn test_submit_rejected_message() {
        let err = ArchiveError::SubmitRejected {
            status: 400,
            status_text: "Bad Request".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Error posting file to Arweave: 400 - Bad Request"
        );
    }
}
