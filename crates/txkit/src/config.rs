//! Policy constants shared by the fee engine, serializer, and sanity checks.

/// Outputs below this amount are dust, unless they only carry data.
pub const DUST_AMOUNT: u64 = 546;

/// Unspent value may range from `fee / FEE_SECURITY_MARGIN` to
/// `fee * FEE_SECURITY_MARGIN` before a checked serialize refuses it.
pub const FEE_SECURITY_MARGIN: u64 = 150;

/// 21 million coins in satoshis.
pub const MAX_MONEY: u64 = 21_000_000 * 100_000_000;

/// Lock times below this are block heights, at or above it UNIX timestamps.
pub const NLOCKTIME_BLOCKHEIGHT_LIMIT: u32 = 500_000_000;

pub const NLOCKTIME_MAX_VALUE: u32 = u32::MAX;

/// Default fee rate in satoshis per kilobyte.
pub const FEE_PER_KB: u64 = 100_000;

pub const MAX_BLOCK_SIZE: usize = 1_000_000;

/// Size allowance for a change output:
/// satoshis + varint + P2PKH script + margin.
pub const CHANGE_OUTPUT_MAX_SIZE: usize = 20 + 4 + 34 + 4;

/// Fixed overhead for version, input/output counts, and lock time.
pub const MAXIMUM_EXTRA_SIZE: usize = 4 + 9 + 9 + 4;
