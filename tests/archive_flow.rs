//! Archival Flow Integration Tests
//!
//! End-to-end scenarios against the public API, using MockPeerStorage and
//! MockLedger in place of the IPFS node and the Arweave gateway:
//! 1. New bytes round trip through IPFS
//! 2. Re-archiving an existing CID reuses the first transaction
//! 3. Missing and oversized content fail without ledger writes
//! 4. Bulk archival: up-front validation and per-item soft failure
//! 5. Dedup among decoys, and with IPFS unavailable

use permafy::archive::{ArchiveError, ArchiveOutcome, Archiver};
use permafy::arweave::{Ledger, MockLedger, StaticSigner, TxId};
use permafy::config::ArchiveConfig;
use permafy::ipfs::mock::cid_for;
use permafy::ipfs::{MockPeerStorage, PeerStorage};
use permafy::parse_cid;
use std::sync::Arc;
use std::time::Duration;

fn setup() -> (MockPeerStorage, MockLedger, Archiver<MockPeerStorage, MockLedger>) {
    let ipfs = MockPeerStorage::new();
    let ledger = MockLedger::new();
    let archiver = Archiver::new(
        Arc::new(ipfs.clone()),
        Arc::new(ledger.clone()),
        Arc::new(StaticSigner::new()),
        ArchiveConfig::default(),
    );
    (ipfs, ledger, archiver)
}

/// Scenario 1: bytes added through the archiver come back unchanged from IPFS
#[tokio::test]
async fn test_new_bytes_round_trip() {
    let (ipfs, ledger, archiver) = setup();

    for payload in [Vec::new(), b"hello permaweb".to_vec(), vec![0x5a; 300 * 1024]] {
        let outcome = archiver.archive_new_bytes(payload.clone(), None).await.unwrap();
        let record = outcome.record().unwrap();

        let fetched = ipfs
            .cat(&record.content_id, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(fetched, payload);

        let stored = ledger.fetch_data(&record.tx_id).await.unwrap();
        assert_eq!(stored, payload);
    }
}

/// Scenario 2: second archival of the same CID is a dedup hit
#[tokio::test]
async fn test_archive_existing_twice_reuses_transaction() {
    let (ipfs, ledger, archiver) = setup();
    let cid = ipfs.put(b"an essay worth keeping");

    let first = archiver.archive_existing(cid.as_str()).await.unwrap();
    let second = archiver.archive_existing(cid.as_str()).await.unwrap();

    assert!(first.is_ok());
    assert!(!first.already_existed());
    assert!(second.already_existed());
    assert_eq!(first.tx_id(), second.tx_id());
    assert_eq!(ledger.submit_calls(), 1);

    let json = serde_json::to_value(&second).unwrap();
    assert_eq!(json["alreadyPinned"], true);
    assert_eq!(json["hash"], cid.as_str());
}

/// Scenario 2b: content added fresh is found by a later existing-CID archival
#[tokio::test]
async fn test_new_bytes_then_existing_is_dedup_hit() {
    let (_ipfs, ledger, archiver) = setup();

    let added = archiver
        .archive_new_bytes(b"upload".to_vec(), Some("text/plain"))
        .await
        .unwrap();
    let cid = added.record().unwrap().content_id.clone();

    let again = archiver.archive_existing(cid.as_str()).await.unwrap();
    assert!(again.already_existed());
    assert_eq!(again.tx_id(), added.tx_id());
    assert_eq!(ledger.submit_calls(), 1);
}

/// Scenario 3a: unknown content fails softly and writes nothing
#[tokio::test]
async fn test_missing_content_fails_without_write() {
    let (_ipfs, ledger, archiver) = setup();
    let cid = cid_for(b"never published");

    let outcome = archiver.archive_existing(cid.as_str()).await.unwrap();
    assert!(!outcome.is_ok());
    assert!(outcome.error().unwrap().contains("Unable to find"));
    assert_eq!(ledger.submit_calls(), 0);
}

/// Scenario 3b: an 11MiB payload is rejected before any ledger work
#[tokio::test]
async fn test_oversized_content_fails_without_write() {
    let (ipfs, ledger, archiver) = setup();
    let cid = ipfs.put(&vec![1u8; 11 * 1024 * 1024]);

    let outcome = archiver.archive_existing(cid.as_str()).await.unwrap();
    assert_eq!(
        outcome.error(),
        Some("File is too large, maximum size is: 10MiB")
    );
    assert_eq!(ledger.query_calls(), 0);
    assert_eq!(ledger.submit_calls(), 0);
}

/// Scenario 4a: one malformed CID aborts the whole batch before network use
#[tokio::test]
async fn test_bulk_invalid_cid_aborts_before_network() {
    let (ipfs, ledger, archiver) = setup();
    let first = ipfs.put(b"first");
    let second = ipfs.put(b"second");

    let result = archiver
        .archive_many_existing(&[first.as_str(), "not-a-cid", second.as_str()])
        .await;

    assert_eq!(result, Err(ArchiveError::InvalidCid("not-a-cid".to_string())));
    assert_eq!(ipfs.total_cat_calls(), 0);
    assert_eq!(ledger.query_calls(), 0);
    assert_eq!(ledger.submit_calls(), 0);
}

/// Scenario 4b: a missing middle item fails in place
#[tokio::test]
async fn test_bulk_missing_middle_item() {
    let (ipfs, _ledger, archiver) = setup();
    let first = ipfs.put(b"first");
    let missing = cid_for(b"missing");
    let last = ipfs.put(b"last");

    let outcomes = archiver
        .archive_many_existing(&[first.as_str(), missing.as_str(), last.as_str()])
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].is_ok());
    assert!(matches!(outcomes[1], ArchiveOutcome::Failed { .. }));
    assert!(outcomes[2].is_ok());
    assert_eq!(outcomes[0].record().unwrap().content_id, first);
    assert_eq!(outcomes[2].record().unwrap().content_id, last);
}

/// Scenario 4c: gateway rejections and query faults become per-item failures
#[tokio::test]
async fn test_bulk_fatal_errors_become_failures() {
    let (ipfs, ledger, archiver) = setup();
    let a = ipfs.put(b"a");
    let b = ipfs.put(b"b");
    ledger.fail_queries();

    let outcomes = archiver
        .archive_many_existing(&[a.as_str(), b.as_str()])
        .await
        .unwrap();
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| !o.is_ok()));

    // The same fault is an error on the single-item path.
    assert!(archiver.archive_existing(a.as_str()).await.is_err());
}

/// Scenario 4d: bulk JSON output is an array of per-item results
#[tokio::test]
async fn test_bulk_json_shape() {
    let (ipfs, _ledger, archiver) = setup();
    let ok = ipfs.put(b"ok");
    let missing = cid_for(b"missing");

    let outcomes = archiver
        .archive_many_existing(&[ok.to_string(), missing.to_string()])
        .await
        .unwrap();
    let json = serde_json::to_value(&outcomes).unwrap();

    assert_eq!(json[0]["ok"], true);
    assert_eq!(json[0]["hash"], ok.as_str());
    assert!(json[0].get("alreadyPinned").is_none());
    assert_eq!(json[1]["ok"], false);
    assert!(json[1]["error"].as_str().unwrap().contains(missing.as_str()));
}

/// Scenario 5a: decoys are never returned; the 3rd-oldest exact copy is
#[tokio::test]
async fn test_dedup_among_decoys() {
    let (ipfs, ledger, archiver) = setup();
    let cid = ipfs.put(b"genuine");

    let mut ids: Vec<TxId> = Vec::new();
    for data in [
        &b"decoy one"[..],
        b"decoy two",
        b"genuine",
        b"decoy four",
        b"decoy five",
        b"decoy six",
    ] {
        ids.push(ledger.insert(cid.as_str(), data));
    }

    let found = archiver.resolver().find_existing(&cid).await.unwrap();
    assert_eq!(found.as_ref(), Some(&ids[2]));

    let outcome = archiver.archive_existing(cid.as_str()).await.unwrap();
    assert!(outcome.already_existed());
    assert_eq!(outcome.tx_id(), Some(&ids[2]));
}

/// Scenario 5b: with IPFS failing for a CID, dedup reports not found and
/// never returns a candidate
#[tokio::test]
async fn test_dedup_ipfs_failure_is_not_found() {
    let (ipfs, ledger, archiver) = setup();
    let healthy = ipfs.put(b"healthy");
    let flaky = ipfs.put(b"flaky");
    ledger.insert(healthy.as_str(), b"healthy");
    for _ in 0..5 {
        ledger.insert(flaky.as_str(), b"flaky");
    }
    ipfs.fail_cat(&flaky);

    assert!(archiver.resolver().find_existing(&flaky).await.unwrap().is_none());
    assert!(archiver
        .resolver()
        .find_existing(&healthy)
        .await
        .unwrap()
        .is_some());

    // Unavailable bytes also mean archive_existing cannot proceed.
    let outcome = archiver.archive_existing(flaky.as_str()).await.unwrap();
    assert!(!outcome.is_ok());
}

/// CIDv1 identifiers are accepted and tagged verbatim
#[tokio::test]
async fn test_cid_v1_is_tagged_verbatim() {
    let (ipfs, ledger, archiver) = setup();
    let v1 = "bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi";
    let cid = parse_cid(v1).unwrap();
    ipfs.put_at(&cid, b"v1 content".to_vec());

    let outcome = archiver.archive_existing(v1).await.unwrap();
    assert!(outcome.is_ok());
    assert_eq!(ledger.submitted()[0].tag("IPFS-Add"), Some(v1));
}
