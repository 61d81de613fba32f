/// txkit - Cryptographic primitives, hashing, and byte encoding.
///
/// The collaborator layer underneath the transaction builder:
/// - Hash functions (SHA-256, SHA-256d, RIPEMD-160, Hash160)
/// - A chain hash type for transaction identifiers
/// - secp256k1 private keys, public keys, and DER signatures
/// - VarInt encoding and little-endian byte reader/writer

pub mod chainhash;
pub mod ec;
pub mod hash;
pub mod util;

mod error;
pub use error::PrimitivesError;
