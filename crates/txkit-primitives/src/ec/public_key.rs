//! secp256k1 public key with SEC1 encoding and ECDSA verification.

use std::fmt;

use k256::ecdsa::VerifyingKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ec::signature::Signature;
use crate::hash::hash160;
use crate::PrimitivesError;

/// Length of a compressed public key in bytes (prefix + 32 byte x-coordinate).
pub const COMPRESSED_LEN: usize = 33;

/// Length of an uncompressed public key in bytes (prefix + 32 byte x + 32 byte y).
pub const UNCOMPRESSED_LEN: usize = 65;

/// A secp256k1 public key.
///
/// Keeps the encoding it was parsed from (or derived with), so that
/// `to_bytes` and `hash160` reproduce the exact bytes a script commits to.
/// Two keys are equal when their serialized forms are equal.
#[derive(Clone)]
pub struct PublicKey {
    inner: VerifyingKey,
    compressed: bool,
}

impl PublicKey {
    pub(crate) fn from_verifying_key(inner: VerifyingKey, compressed: bool) -> Self {
        PublicKey { inner, compressed }
    }

    /// Parse SEC1 bytes, compressed (33 bytes) or uncompressed (65 bytes).
    ///
    /// # Arguments
    /// * `bytes` - SEC1-encoded public key bytes.
    ///
    /// # Returns
    /// `Ok(PublicKey)` on success, or an error if the bytes don't represent a valid point.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        let compressed = match bytes.len() {
            COMPRESSED_LEN => true,
            UNCOMPRESSED_LEN => false,
            0 => {
                return Err(PrimitivesError::InvalidPublicKey(
                    "pubkey bytes are empty".to_string(),
                ))
            }
            n => {
                return Err(PrimitivesError::InvalidPublicKey(format!(
                    "unexpected pubkey length {}",
                    n
                )))
            }
        };
        let inner = VerifyingKey::from_sec1_bytes(bytes)
            .map_err(|e| PrimitivesError::InvalidPublicKey(e.to_string()))?;
        Ok(PublicKey { inner, compressed })
    }

    /// Parse a hex-encoded SEC1 key (66 or 130 characters).
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        let bytes = hex::decode(hex_str)?;
        Self::from_bytes(&bytes)
    }

    /// Serialize in this key's own encoding.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.inner
            .to_encoded_point(self.compressed)
            .as_bytes()
            .to_vec()
    }

    /// Serialize in compressed SEC1 form regardless of the stored encoding.
    pub fn to_compressed(&self) -> [u8; COMPRESSED_LEN] {
        let point = self.inner.to_encoded_point(true);
        let mut out = [0u8; COMPRESSED_LEN];
        out.copy_from_slice(point.as_bytes());
        out
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// RIPEMD160(SHA256(serialized key)), the 20 bytes a P2PKH script locks to.
    pub fn hash160(&self) -> [u8; 20] {
        hash160(&self.to_bytes())
    }

    /// Verify an ECDSA signature over a 32-byte digest.
    pub fn verify(&self, hash: &[u8; 32], sig: &Signature) -> bool {
        sig.verify(hash, self)
    }

    pub(crate) fn verifying_key(&self) -> &VerifyingKey {
        &self.inner
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for PublicKey {}

impl std::hash::Hash for PublicKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.to_bytes().hash(state);
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl std::str::FromStr for PublicKey {
    type Err = PrimitivesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PublicKey::from_hex(s)
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        PublicKey::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ec::PrivateKey;

    const COMPRESSED: &str = "026cf33373a9f3f6c676b75b543180703df225f7f8edbffedc417718a8ad4e89ce";

    #[test]
    fn test_compressed_roundtrip() {
        let key = PublicKey::from_hex(COMPRESSED).unwrap();
        assert!(key.is_compressed());
        assert_eq!(key.to_hex(), COMPRESSED);
        assert_eq!(key.to_compressed().to_vec(), hex::decode(COMPRESSED).unwrap());
    }

    #[test]
    fn test_uncompressed_keeps_encoding() {
        let key = PublicKey::from_hex(COMPRESSED).unwrap();
        let uncompressed = key.inner.to_encoded_point(false).as_bytes().to_vec();
        let parsed = PublicKey::from_bytes(&uncompressed).unwrap();
        assert!(!parsed.is_compressed());
        assert_eq!(parsed.to_bytes(), uncompressed);
        assert_ne!(parsed, key);
        assert_ne!(parsed.hash160(), key.hash160());
    }

    #[test]
    fn test_rejects_bad_lengths() {
        assert!(PublicKey::from_bytes(&[]).is_err());
        assert!(PublicKey::from_bytes(&[0x02; 20]).is_err());
        assert!(PublicKey::from_hex("zz").is_err());
    }

    #[test]
    fn test_serde_as_hex() {
        let key = PublicKey::from_hex(COMPRESSED).unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, format!("\"{}\"", COMPRESSED));
        let back: PublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn test_verify_rejects_other_key() {
        let signer = PrivateKey::new();
        let other = PrivateKey::new();
        let digest = [7u8; 32];
        let sig = signer.sign(&digest).unwrap();
        assert!(signer.pub_key().verify(&digest, &sig));
        assert!(!other.pub_key().verify(&digest, &sig));
    }
}
