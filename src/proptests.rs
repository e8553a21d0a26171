//! Property-based tests
//!
//! Tests for:
//! - CID parsing: never panics, preserves the input text
//! - Digest: equality exactly when bytes are equal
//! - Transactions: chunk coverage, data root and deep hash determinism
//! - Bulk archival: results in input order, failures stay in place

use crate::archive::{run_batched, ArchiveOutcome, Archiver};
use crate::arweave::transaction::{
    chunk_data, data_root, deep_hash, DeepHashItem, DraftTransaction, MAX_CHUNK_SIZE,
};
use crate::arweave::{MockLedger, StaticSigner};
use crate::config::ArchiveConfig;
use crate::content_id::parse_cid;
use crate::digest::ContentDigest;
use crate::ipfs::mock::cid_for;
use crate::ipfs::MockPeerStorage;
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
}

// ============================================================================
// CID PARSING
// ============================================================================

proptest! {
    /// Arbitrary text either parses or is rejected; it never panics.
    #[test]
    fn parse_cid_never_panics(raw in ".{0,80}") {
        if let Some(cid) = parse_cid(&raw) {
            prop_assert_eq!(cid.as_str(), raw.as_str());
        }
    }

    /// Base58-looking noise with a v0 prefix is handled without panicking.
    #[test]
    fn parse_cid_v0_shaped_noise(tail in "[1-9A-HJ-NP-Za-km-z]{0,60}") {
        let raw = format!("Qm{}", tail);
        let _ = parse_cid(&raw);
    }

    /// Every CID derived from content parses back as version 0.
    #[test]
    fn derived_cids_always_parse(data in prop::collection::vec(any::<u8>(), 0..512)) {
        let cid = cid_for(&data);
        let parsed = parse_cid(cid.as_str());
        prop_assert!(parsed.is_some());
        prop_assert_eq!(parsed.unwrap().version(), 0);
    }
}

// ============================================================================
// DIGEST
// ============================================================================

proptest! {
    #[test]
    fn digest_equality_matches_byte_equality(
        a in prop::collection::vec(any::<u8>(), 0..256),
        b in prop::collection::vec(any::<u8>(), 0..256),
    ) {
        prop_assert_eq!(ContentDigest::of(&a) == ContentDigest::of(&b), a == b);
        prop_assert_eq!(ContentDigest::of(&a), ContentDigest::of(&a.clone()));
    }

    /// Changing any single byte changes the digest.
    #[test]
    fn digest_detects_single_byte_change(
        data in prop::collection::vec(any::<u8>(), 1..256),
        index in any::<prop::sample::Index>(),
        flip in 1u8..=255,
    ) {
        let mut changed = data.clone();
        let i = index.index(changed.len());
        changed[i] ^= flip;
        prop_assert_ne!(ContentDigest::of(&data), ContentDigest::of(&changed));
    }
}

// ============================================================================
// TRANSACTIONS
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Chunks are contiguous, cover the payload and respect the size cap.
    #[test]
    fn chunks_cover_payload(len in 0usize..(3 * MAX_CHUNK_SIZE + 100)) {
        let data = vec![7u8; len];
        let chunks = chunk_data(&data);

        prop_assert!(!chunks.is_empty());
        prop_assert_eq!(chunks[0].min_byte_range, 0);
        prop_assert_eq!(chunks.last().unwrap().max_byte_range, len);
        for pair in chunks.windows(2) {
            prop_assert_eq!(pair[0].max_byte_range, pair[1].min_byte_range);
        }
        for chunk in &chunks {
            prop_assert!(chunk.max_byte_range - chunk.min_byte_range <= MAX_CHUNK_SIZE);
        }
    }

    #[test]
    fn data_root_deterministic_and_sensitive(
        data in prop::collection::vec(any::<u8>(), 1..4096),
        index in any::<prop::sample::Index>(),
    ) {
        let root = data_root(&data);
        prop_assert_eq!(root.len(), 32);
        prop_assert_eq!(&root, &data_root(&data));

        let mut changed = data.clone();
        let i = index.index(changed.len());
        changed[i] = changed[i].wrapping_add(1);
        prop_assert_ne!(root, data_root(&changed));
    }

    /// A blob and a one-element list holding it hash differently.
    #[test]
    fn deep_hash_distinguishes_structure(data in prop::collection::vec(any::<u8>(), 0..128)) {
        let blob = DeepHashItem::Blob(&data);
        let list = DeepHashItem::List(vec![DeepHashItem::Blob(&data)]);
        prop_assert_eq!(deep_hash(&blob), deep_hash(&blob.clone()));
        prop_assert_ne!(deep_hash(&blob), deep_hash(&list));
    }

    /// Signing is deterministic for a fixed signer, and tags are covered.
    #[test]
    fn signature_covers_tags(
        data in prop::collection::vec(any::<u8>(), 0..512),
        value in "[a-zA-Z0-9]{1,46}",
    ) {
        let signer = StaticSigner::new();
        let mut a = DraftTransaction::new(data.clone(), Vec::new(), vec![1; 32], "10".into());
        let mut b = a.clone();
        a.sign(&signer).unwrap();
        b.sign(&signer).unwrap();
        prop_assert_eq!(&a.id, &b.id);

        b.add_tag("IPFS-Add", &value);
        prop_assert!(!b.is_signed());
        b.sign(&signer).unwrap();
        prop_assert_ne!(&a.id, &b.id);
    }
}

// ============================================================================
// BULK ORDERING
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn run_batched_preserves_order(
        items in prop::collection::vec(any::<u32>(), 0..60),
        batch_size in 1usize..15,
    ) {
        let results = runtime().block_on(run_batched(&items, batch_size, Duration::ZERO, |n| async move {
            tokio::time::sleep(Duration::from_micros(u64::from(n % 7))).await;
            *n
        }));
        prop_assert_eq!(results, items);
    }

    /// Missing CIDs fail in place without disturbing their neighbours.
    #[test]
    fn bulk_outcomes_align_with_input(present in prop::collection::vec(any::<bool>(), 1..25)) {
        let ipfs = MockPeerStorage::new();
        let ledger = MockLedger::new();
        let cids: Vec<String> = present
            .iter()
            .enumerate()
            .map(|(i, &stored)| {
                let bytes = format!("payload {}", i).into_bytes();
                if stored { ipfs.put(&bytes) } else { cid_for(&bytes) }.to_string()
            })
            .collect();

        let archiver = Archiver::new(
            Arc::new(ipfs),
            Arc::new(ledger),
            Arc::new(StaticSigner::new()),
            ArchiveConfig { batch_size: 4, batch_delay_ms: 0, ..ArchiveConfig::default() },
        );
        let outcomes = runtime().block_on(archiver.archive_many_existing(&cids)).unwrap();

        prop_assert_eq!(outcomes.len(), cids.len());
        for ((outcome, cid), &stored) in outcomes.iter().zip(&cids).zip(&present) {
            match outcome {
                ArchiveOutcome::Archived(record) => {
                    prop_assert!(stored);
                    prop_assert_eq!(record.content_id.as_str(), cid.as_str());
                }
                ArchiveOutcome::Failed { message } => {
                    prop_assert!(!stored);
                    prop_assert!(message.contains(cid.as_str()));
                }
            }
        }
    }
}
