//! Permafy - permanent archival of IPFS content on Arweave
//!
//! Content addressed on IPFS is written to the Arweave ledger as a signed
//! transaction tagged with its CID, so it survives after every IPFS node
//! stops pinning it.
//!
//! Key principles:
//! - IPFS bytes are authoritative; a ledger copy counts only if its digest matches
//! - Re-archiving a CID reuses an existing matching transaction
//! - Bulk archival validates every CID up front, then fails softly per item
//! - Network services sit behind traits with in-memory mocks for tests

pub mod archive;
pub mod arweave;
pub mod config;
pub mod content_id;
pub mod digest;
pub mod ipfs;
pub mod sniff;

#[cfg(test)]
mod proptests;

pub use archive::{ArchiveError, ArchiveOutcome, ArchiveRecord, Archiver};
pub use content_id::{parse_cid, ContentId};
