/// txkit - Script templates and addresses.
///
/// The script collaborator for the transaction builder: the `Script` byte
/// type, opcode constants, chunk decoding, recognisers and builders for the
/// standard templates (P2PKH, P2PK, P2SH, bare multisig, data carrier), and
/// Base58Check addresses.

pub mod address;
pub mod chunk;
pub mod opcodes;
pub mod script;

mod error;
pub use address::{Address, AddressType, Network};
pub use chunk::ScriptChunk;
pub use error::ScriptError;
pub use script::Script;
