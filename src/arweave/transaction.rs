//! Arweave format-2 transactions.
//!
//! ## Design
//!
//! - **Signature data**: deep hash (SHA-384) over the transaction fields
//! - **Data root**: merkle root over 256 KiB chunks of the payload
//! - **Id**: base64url(SHA-256(signature))
//! - **Wire form**: JSON with binary fields base64url-encoded (no padding)

use super::wallet::{Signer, WalletError};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha384};
use std::fmt;

/// Maximum chunk size used for the data root.
pub const MAX_CHUNK_SIZE: usize = 256 * 1024;

/// Minimum size of the trailing chunk; smaller remainders rebalance the last two chunks.
pub const MIN_CHUNK_SIZE: usize = 32 * 1024;

/// Byte-range notes are 32-byte big-endian integers.
const NOTE_SIZE: usize = 32;

/// Arweave transaction identifier (base64url, 43 chars).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(pub String);

impl TxId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A name/value tag attached to a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: Vec<u8>,
    pub value: Vec<u8>,
}

impl Tag {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.as_bytes().to_vec(),
            value: value.as_bytes().to_vec(),
        }
    }
}

/// Input to the deep hash.
#[derive(Debug, Clone)]
pub enum DeepHashItem<'a> {
    Blob(&'a [u8]),
    List(Vec<DeepHashItem<'a>>),
}

fn sha384(parts: &[&[u8]]) -> [u8; 48] {
    let mut hasher = Sha384::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

fn sha256(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Arweave deep hash.
pub fn deep_hash(item: &DeepHashItem<'_>) -> [u8; 48] {
    match item {
        DeepHashItem::Blob(data) => {
            let tag = format!("blob{}", data.len());
            let tag_hash = sha384(&[tag.as_bytes()]);
            let data_hash = sha384(&[data]);
            sha384(&[&tag_hash, &data_hash])
        }
        DeepHashItem::List(items) => {
            let tag = format!("list{}", items.len());
            items.iter().fold(sha384(&[tag.as_bytes()]), |acc, item| {
                sha384(&[&acc, &deep_hash(item)])
            })
        }
    }
}

/// Chunk boundaries and hash, as used for the merkle leaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkInfo {
    pub data_hash: [u8; 32],
    pub min_byte_range: usize,
    pub max_byte_range: usize,
}

/// Split data into merkle chunks.
///
/// Full chunks are `MAX_CHUNK_SIZE`; if the remainder after a full chunk
/// would be below `MIN_CHUNK_SIZE`, the last two chunks are split evenly.
/// A trailing empty chunk is produced when the length is an exact multiple
/// of the chunk size.
pub fn chunk_data(data: &[u8]) -> Vec<ChunkInfo> {
    let mut chunks = Vec::new();
    let mut rest = data;
    let mut cursor = 0;

    while rest.len() >= MAX_CHUNK_SIZE {
        let mut chunk_size = MAX_CHUNK_SIZE;
        let next_chunk_size = rest.len() - MAX_CHUNK_SIZE;
        if next_chunk_size > 0 && next_chunk_size < MIN_CHUNK_SIZE {
            chunk_size = rest.len().div_ceil(2);
        }

        let (chunk, remainder) = rest.split_at(chunk_size);
        cursor += chunk.len();
        chunks.push(ChunkInfo {
            data_hash: sha256(&[chunk]),
            min_byte_range: cursor - chunk.len(),
            max_byte_range: cursor,
        });
        rest = remainder;
    }

    chunks.push(ChunkInfo {
        data_hash: sha256(&[rest]),
        min_byte_range: cursor,
        max_byte_range: cursor + rest.len(),
    });
    chunks
}

fn note(value: usize) -> [u8; NOTE_SIZE] {
    let mut buf = [0u8; NOTE_SIZE];
    let be = (value as u64).to_be_bytes();
    buf[NOTE_SIZE - be.len()..].copy_from_slice(&be);
    buf
}

struct MerkleNode {
    id: [u8; 32],
    max_byte_range: usize,
}

/// Merkle root over the payload's chunks. Empty data has an empty root.
pub fn data_root(data: &[u8]) -> Vec<u8> {
    if data.is_empty() {
        return Vec::new();
    }

    let mut layer: Vec<MerkleNode> = chunk_data(data)
        .into_iter()
        .map(|chunk| MerkleNode {
            id: sha256(&[
                &sha256(&[&chunk.data_hash]),
                &sha256(&[&note(chunk.max_byte_range)]),
            ]),
            max_byte_range: chunk.max_byte_range,
        })
        .collect();

    while layer.len() > 1 {
        let mut next = Vec::with_capacity(layer.len().div_ceil(2));
        let mut nodes = layer.into_iter();
        while let Some(left) = nodes.next() {
            match nodes.next() {
                Some(right) => next.push(MerkleNode {
                    id: sha256(&[
                        &sha256(&[&left.id]),
                        &sha256(&[&right.id]),
                        &sha256(&[&note(left.max_byte_range)]),
                    ]),
                    max_byte_range: right.max_byte_range,
                }),
                None => next.push(left),
            }
        }
        layer = next;
    }

    layer
        .pop()
        .map(|root| root.id.to_vec())
        .unwrap_or_default()
}

fn b64(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// An unsigned (or signed, not yet submitted) transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftTransaction {
    pub last_tx: Vec<u8>,
    pub owner: Vec<u8>,
    pub target: Vec<u8>,
    pub quantity: String,
    pub reward: String,
    pub tags: Vec<Tag>,
    pub data: Vec<u8>,
    pub data_root: Vec<u8>,
    pub signature: Vec<u8>,
    pub id: Option<TxId>,
}

/// JSON body accepted by `POST /tx`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionJson {
    pub format: u8,
    pub id: String,
    pub last_tx: String,
    pub owner: String,
    pub tags: Vec<TagJson>,
    pub target: String,
    pub quantity: String,
    pub data: String,
    pub data_size: String,
    pub data_root: String,
    pub reward: String,
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagJson {
    pub name: String,
    pub value: String,
}

impl DraftTransaction {
    /// New data transaction paying `reward` winston, anchored at `last_tx`.
    pub fn new(data: Vec<u8>, owner: Vec<u8>, last_tx: Vec<u8>, reward: String) -> Self {
        let data_root = data_root(&data);
        Self {
            last_tx,
            owner,
            target: Vec::new(),
            quantity: "0".to_string(),
            reward,
            tags: Vec::new(),
            data,
            data_root,
            signature: Vec::new(),
            id: None,
        }
    }

    /// Append a tag. Invalidates any existing signature.
    pub fn add_tag(&mut self, name: &str, value: &str) {
        self.tags.push(Tag::new(name, value));
        self.signature.clear();
        self.id = None;
    }

    /// Value of the first tag with this name, if any.
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.name == name.as_bytes())
            .and_then(|t| std::str::from_utf8(&t.value).ok())
    }

    pub fn data_size(&self) -> usize {
        self.data.len()
    }

    /// The message that gets signed.
    pub fn signature_data(&self) -> [u8; 48] {
        let format = b"2";
        let data_size = self.data.len().to_string();
        let tags = self
            .tags
            .iter()
            .map(|t| {
                DeepHashItem::List(vec![
                    DeepHashItem::Blob(&t.name),
                    DeepHashItem::Blob(&t.value),
                ])
            })
            .collect();

        deep_hash(&DeepHashItem::List(vec![
            DeepHashItem::Blob(format),
            DeepHashItem::Blob(&self.owner),
            DeepHashItem::Blob(&self.target),
            DeepHashItem::Blob(self.quantity.as_bytes()),
            DeepHashItem::Blob(self.reward.as_bytes()),
            DeepHashItem::Blob(&self.last_tx),
            DeepHashItem::List(tags),
            DeepHashItem::Blob(data_size.as_bytes()),
            DeepHashItem::Blob(&self.data_root),
        ]))
    }

    /// Sign with `signer`, setting `owner`, `signature` and `id`.
    pub fn sign(&mut self, signer: &dyn Signer) -> Result<(), WalletError> {
        self.owner = signer.owner().to_vec();
        let signature = signer.sign(&self.signature_data())?;
        self.id = Some(TxId(b64(&sha256(&[&signature]))));
        self.signature = signature;
        Ok(())
    }

    pub fn is_signed(&self) -> bool {
        self.id.is_some()
    }

    /// Wire form for submission.
    pub fn to_json(&self) -> TransactionJson {
        TransactionJson {
            format: 2,
            id: self.id.as_ref().map(|id| id.0.clone()).unwrap_or_default(),
            last_tx: b64(&self.last_tx),
            owner: b64(&self.owner),
            tags: self
                .tags
                .iter()
                .map(|t| TagJson {
                    name: b64(&t.name),
                    value: b64(&t.value),
                })
                .collect(),
            target: b64(&self.target),
            quantity: self.quantity.clone(),
            data: b64(&self.data),
            data_size: self.data.len().to_string(),
            data_root: b64(&self.data_root),
            reward: self.reward.clone(),
            signature: b64(&self.signature),
        }
    }
}
