//! Arweave wallet (JWK) loading and transaction signing.
//!
//! ## Design
//!
//! - **Key format**: RSA JWK as exported by Arweave wallets (`n e d p q dp dq qi`)
//! - **Signature**: RSA-PSS with SHA-256 (salt length 32)
//! - **Owner**: the raw RSA modulus, embedded in every transaction
//! - **Address**: base64url(SHA-256(modulus))
//!
//! Private components are zeroized once the key pair has been built.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use ring::rand::SystemRandom;
use ring::rsa::{KeyPairComponents, PublicKeyComponents};
use ring::signature::{RsaKeyPair, RSA_PSS_SHA256};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Errors that can occur while loading or using a wallet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("Failed to read wallet file '{path}': {reason}")]
    Io { path: String, reason: String },

    #[error("Invalid wallet JSON: {0}")]
    InvalidJson(String),

    #[error("Unsupported key type: {0}")]
    UnsupportedKeyType(String),

    #[error("Invalid base64url in field '{0}'")]
    InvalidEncoding(&'static str),

    #[error("Key rejected: {0}")]
    KeyRejected(String),

    #[error("Signing failed")]
    SigningFailed,
}

/// Produces transaction signatures for a single owner key.
pub trait Signer: Send + Sync {
    /// Owner public key bytes (RSA modulus).
    fn owner(&self) -> &[u8];

    /// Sign a message (the transaction's deep hash).
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, WalletError>;
}

/// JWK as stored on disk / in `AR_WALLET_JSON`.
#[derive(Deserialize, Zeroize, ZeroizeOnDrop)]
struct Jwk {
    kty: String,
    n: String,
    e: String,
    d: String,
    p: String,
    q: String,
    dp: String,
    dq: String,
    qi: String,
}

/// Decoded private key material.
#[derive(Zeroize, ZeroizeOnDrop)]
struct PrivateComponents {
    d: Vec<u8>,
    p: Vec<u8>,
    q: Vec<u8>,
    dp: Vec<u8>,
    dq: Vec<u8>,
    qi: Vec<u8>,
}

fn decode_field(value: &str, field: &'static str) -> Result<Vec<u8>, WalletError> {
    URL_SAFE_NO_PAD
        .decode(value.trim_end_matches('='))
        .map_err(|_| WalletError::InvalidEncoding(field))
}

/// An Arweave wallet capable of signing transactions.
pub struct Wallet {
    key_pair: RsaKeyPair,
    owner: Vec<u8>,
    rng: SystemRandom,
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

impl Wallet {
    /// Parse a wallet from JWK JSON text.
    pub fn from_jwk_json(json: &str) -> Result<Self, WalletError> {
        let jwk: Jwk =
            serde_json::from_str(json).map_err(|e| WalletError::InvalidJson(e.to_string()))?;

        if jwk.kty != "RSA" {
            return Err(WalletError::UnsupportedKeyType(jwk.kty.clone()));
        }

        let owner = decode_field(&jwk.n, "n")?;
        let e = decode_field(&jwk.e, "e")?;
        let private = PrivateComponents {
            d: decode_field(&jwk.d, "d")?,
            p: decode_field(&jwk.p, "p")?,
            q: decode_field(&jwk.q, "q")?,
            dp: decode_field(&jwk.dp, "dp")?,
            dq: decode_field(&jwk.dq, "dq")?,
            qi: decode_field(&jwk.qi, "qi")?,
        };

        let components = KeyPairComponents {
            public_key: PublicKeyComponents {
                n: owner.as_slice(),
                e: e.as_slice(),
            },
            d: private.d.as_slice(),
            p: private.p.as_slice(),
            q: private.q.as_slice(),
            dP: private.dp.as_slice(),
            dQ: private.dq.as_slice(),
            qInv: private.qi.as_slice(),
        };
        let key_pair = RsaKeyPair::from_components(&components)
            .map_err(|e| WalletError::KeyRejected(e.to_string()))?;

        Ok(Self {
            key_pair,
            owner,
            rng: SystemRandom::new(),
        })
    }

    /// Load a wallet from a JWK file.
    pub fn from_file(path: &Path) -> Result<Self, WalletError> {
        let mut contents = fs::read_to_string(path).map_err(|e| WalletError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let wallet = Self::from_jwk_json(&contents);
        contents.zeroize();
        wallet
    }

    /// Wallet address: base64url(SHA-256(owner)).
    pub fn address(&self) -> String {
        URL_SAFE_NO_PAD.encode(Sha256::digest(&self.owner))
    }
}

impl Signer for Wallet {
    fn owner(&self) -> &[u8] {
        &self.owner
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, WalletError> {
        let mut signature = vec![0u8; self.key_pair.public().modulus_len()];
        self.key_pair
            .sign(&RSA_PSS_SHA256, &self.rng, message, &mut signature)
            .map_err(|_| WalletError::SigningFailed)?;
        Ok(signature)
    }
}
