/// txkit - Transaction building, funding, signing, and serialization.
///
/// The `Transaction` aggregate owns its inputs and outputs, keeps a change
/// output balanced against the fee, signs inputs according to the script
/// they spend, runs policy checks before serializing, and mirrors a node's
/// structural sanity checks.

pub mod config;
pub mod input;
pub mod output;
pub mod sighash;
pub mod signature;
pub mod snapshot;
pub mod transaction;
pub mod unspent;

mod fee;
mod locktime;
mod serialize;
mod sign;
mod sort;
mod verify;

mod error;
pub use error::TransactionError;
pub use input::{Input, InputKind};
pub use locktime::LockTime;
pub use output::Output;
pub use serialize::SerializeOptions;
pub use signature::TransactionSignature;
pub use transaction::Transaction;
pub use unspent::UnspentOutput;
pub use verify::SanityError;

#[cfg(test)]
mod tests;
