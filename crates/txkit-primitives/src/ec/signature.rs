//! ECDSA signature with strict DER encoding.

use std::fmt;

use k256::ecdsa::signature::hazmat::PrehashVerifier;

use crate::ec::public_key::PublicKey;
use crate::PrimitivesError;

/// An ECDSA signature over secp256k1.
///
/// Always held in low-S form; DER output is therefore canonical.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(k256::ecdsa::Signature);

impl Signature {
    pub(crate) fn from_k256(sig: k256::ecdsa::Signature) -> Self {
        Signature(sig.normalize_s().unwrap_or(sig))
    }

    /// Parse a DER-encoded signature (without a trailing sighash byte).
    pub fn from_der(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        let sig = k256::ecdsa::Signature::from_der(bytes)?;
        Ok(Self::from_k256(sig))
    }

    pub fn from_der_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        let bytes = hex::decode(hex_str)?;
        Self::from_der(&bytes)
    }

    /// DER encoding, 8 to 72 bytes.
    pub fn to_der(&self) -> Vec<u8> {
        self.0.to_der().as_bytes().to_vec()
    }

    pub fn to_der_hex(&self) -> String {
        hex::encode(self.to_der())
    }

    /// Big-endian R component.
    pub fn r(&self) -> [u8; 32] {
        self.0.r().to_bytes().into()
    }

    /// Big-endian S component.
    pub fn s(&self) -> [u8; 32] {
        self.0.s().to_bytes().into()
    }

    /// Check this signature against a 32-byte digest and public key.
    pub fn verify(&self, hash: &[u8; 32], pub_key: &PublicKey) -> bool {
        pub_key.verifying_key().verify_prehash(hash, &self.0).is_ok()
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self.to_der_hex())
    }
}
