//! IPFS content identifier parsing.
//!
//! A `ContentId` is only ever constructed through [`parse_cid`], so holding
//! one means the string decoded as a CID. The original string is kept
//! verbatim because it is what gets written into (and queried from) the
//! `IPFS-Add` ledger tag.

use cid::Cid;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A syntactically valid IPFS content identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentId {
    raw: String,
    cid: Cid,
}

impl ContentId {
    /// The identifier exactly as supplied.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The decoded CID.
    pub fn cid(&self) -> &Cid {
        &self.cid
    }

    /// CID version (0 for base58 `Qm...` identifiers, 1 otherwise).
    pub fn version(&self) -> u64 {
        self.cid.version().into()
    }

    /// Multicodec of the addressed content (0x70 dag-pb, 0x55 raw, ...).
    pub fn codec(&self) -> u64 {
        self.cid.codec()
    }
}

impl From<Cid> for ContentId {
    fn from(cid: Cid) -> Self {
        Self {
            raw: cid.to_string(),
            cid,
        }
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for ContentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

/// Try to parse a CID string.
///
/// Never panics and never returns an error: any decode failure yields `None`.
pub fn parse_cid(raw: &str) -> Option<ContentId> {
    Cid::from_str(raw).ok().map(|cid| ContentId {
        raw: raw.to_string(),
        cid,
    })
}
