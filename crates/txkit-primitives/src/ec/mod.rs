//! secp256k1 keys and ECDSA signatures.
//!
//! Thin wrappers over `k256` carrying the Bitcoin-specific encodings the
//! transaction builder needs: WIF, SEC1 compressed/uncompressed keys, and
//! low-S DER signatures.

pub mod private_key;
pub mod public_key;
pub mod signature;

pub use private_key::PrivateKey;
pub use public_key::PublicKey;
pub use signature::Signature;
