//! secp256k1 private key with WIF import/export and RFC6979 signing.

use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use zeroize::Zeroize;

use crate::ec::public_key::PublicKey;
use crate::ec::signature::Signature;
use crate::hash::sha256d;
use crate::PrimitivesError;

/// Length of a raw private key scalar.
const PRIVATE_KEY_BYTES_LEN: usize = 32;

/// WIF version byte for mainnet keys.
pub const MAINNET_WIF_PREFIX: u8 = 0x80;

/// WIF version byte for testnet keys.
pub const TESTNET_WIF_PREFIX: u8 = 0xef;

/// Trailing WIF byte marking a key whose public key is used compressed.
const COMPRESS_MAGIC: u8 = 0x01;

/// A secp256k1 signing key.
///
/// Remembers whether its public key should be serialized compressed, since
/// that choice changes the public key hash (and so the address) it controls.
#[derive(Clone)]
pub struct PrivateKey {
    inner: SigningKey,
    compressed: bool,
}

impl PrivateKey {
    /// Generate a random key from the OS RNG.
    pub fn new() -> Self {
        PrivateKey {
            inner: SigningKey::random(&mut OsRng),
            compressed: true,
        }
    }

    /// Build a key from a 32-byte big-endian scalar.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.len() != PRIVATE_KEY_BYTES_LEN {
            return Err(PrimitivesError::InvalidPrivateKey(format!(
                "expected {} bytes, got {}",
                PRIVATE_KEY_BYTES_LEN,
                bytes.len()
            )));
        }
        let inner = SigningKey::from_slice(bytes)
            .map_err(|e| PrimitivesError::InvalidPrivateKey(e.to_string()))?;
        Ok(PrivateKey { inner, compressed: true })
    }

    /// Build a key from a 64-character hex scalar.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        let bytes = hex::decode(hex_str)?;
        Self::from_bytes(&bytes)
    }

    /// Decode a Base58Check WIF string (compressed or uncompressed form).
    pub fn from_wif(wif: &str) -> Result<Self, PrimitivesError> {
        let mut decoded = bs58::decode(wif)
            .into_vec()
            .map_err(|e| PrimitivesError::InvalidWif(e.to_string()))?;

        // prefix(1) + key(32) [+ compress flag(1)] + checksum(4)
        let compressed = match decoded.len() {
            38 if decoded[33] == COMPRESS_MAGIC => true,
            38 => {
                decoded.zeroize();
                return Err(PrimitivesError::InvalidWif(
                    "invalid compression flag".to_string(),
                ));
            }
            37 => false,
            n => {
                decoded.zeroize();
                return Err(PrimitivesError::InvalidWif(format!("invalid length {}", n)));
            }
        };

        let payload_len = decoded.len() - 4;
        let checksum = sha256d(&decoded[..payload_len]);
        if checksum[..4] != decoded[payload_len..] {
            decoded.zeroize();
            return Err(PrimitivesError::ChecksumMismatch);
        }

        let key = Self::from_bytes(&decoded[1..1 + PRIVATE_KEY_BYTES_LEN]);
        decoded.zeroize();
        key.map(|k| PrivateKey { compressed, ..k })
    }

    /// Encode as mainnet WIF.
    pub fn to_wif(&self) -> String {
        self.to_wif_with_prefix(MAINNET_WIF_PREFIX)
    }

    /// Encode as WIF under the given network prefix.
    pub fn to_wif_with_prefix(&self, prefix: u8) -> String {
        let mut payload = Vec::with_capacity(1 + PRIVATE_KEY_BYTES_LEN + 1 + 4);
        payload.push(prefix);
        payload.extend_from_slice(&self.to_bytes());
        if self.compressed {
            payload.push(COMPRESS_MAGIC);
        }
        let checksum = sha256d(&payload);
        payload.extend_from_slice(&checksum[..4]);
        let encoded = bs58::encode(&payload).into_string();
        payload.zeroize();
        encoded
    }

    /// The raw 32-byte scalar.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.inner.to_bytes().into()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Whether the matching public key serializes compressed.
    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// The matching public key, in this key's compression form.
    pub fn pub_key(&self) -> PublicKey {
        PublicKey::from_verifying_key(VerifyingKey::from(&self.inner), self.compressed)
    }

    /// Sign a 32-byte message digest with a deterministic (RFC6979) nonce.
    ///
    /// The result is normalized to low-S.
    pub fn sign(&self, hash: &[u8; 32]) -> Result<Signature, PrimitivesError> {
        let sig: k256::ecdsa::Signature = self.inner.sign_prehash(hash)?;
        Ok(Signature::from_k256(sig.normalize_s().unwrap_or(sig)))
    }
}

impl Default for PrivateKey {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes() && self.compressed == other.compressed
    }
}

impl Eq for PrivateKey {}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public_key", &self.pub_key())
            .finish_non_exhaustive()
    }
}
