//! Structural sanity checks, mirroring what a node checks before accepting a
//! transaction into its mempool.

use std::collections::HashSet;

use num_bigint::BigUint;

use crate::config::{MAX_BLOCK_SIZE, MAX_MONEY};
use crate::transaction::Transaction;

/// Why a transaction fails the sanity checks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SanityError {
    #[error("transaction txins empty")]
    NoInputs,

    #[error("transaction txouts empty")]
    NoOutputs,

    #[error("transaction txout {index} satoshis is invalid")]
    InvalidOutputSatoshis { index: usize },

    #[error("transaction txout {index} greater than MAX_MONEY")]
    OutputAboveMaxMoney { index: usize },

    #[error("transaction txout {index} total output greater than MAX_MONEY")]
    TotalAboveMaxMoney { index: usize },

    #[error("transaction over the maximum block size ({size} bytes)")]
    TooLarge { size: usize },

    #[error("transaction input {index} duplicate input")]
    DuplicateInput { index: usize },

    #[error("coinbase transaction script size invalid ({len} bytes)")]
    CoinbaseScriptSize { len: usize },

    #[error("transaction input {index} has null input")]
    NullInput { index: usize },
}

impl Transaction {
    /// Run the sanity checks. The first failing check is reported.
    pub fn verify(&self) -> Result<(), SanityError> {
        if self.inputs.is_empty() {
            return Err(SanityError::NoInputs);
        }
        if self.outputs.is_empty() {
            return Err(SanityError::NoOutputs);
        }

        let max_money = BigUint::from(MAX_MONEY);
        let mut total = BigUint::default();
        for (index, output) in self.outputs.iter().enumerate() {
            if output.invalid_satoshis() {
                return Err(SanityError::InvalidOutputSatoshis { index });
            }
            let value = BigUint::from(output.satoshis);
            if value > max_money {
                return Err(SanityError::OutputAboveMaxMoney { index });
            }
            total += value;
            if total > max_money {
                return Err(SanityError::TotalAboveMaxMoney { index });
            }
        }

        let size = self.size();
        if size > MAX_BLOCK_SIZE {
            return Err(SanityError::TooLarge { size });
        }

        // Full 32-byte id plus index.
        let mut seen = HashSet::with_capacity(self.inputs.len());
        for (index, input) in self.inputs.iter().enumerate() {
            if !seen.insert((input.prev_tx_id, input.output_index)) {
                return Err(SanityError::DuplicateInput { index });
            }
        }

        if self.is_coinbase() {
            let len = self.inputs[0].script().len();
            if !(2..=100).contains(&len) {
                return Err(SanityError::CoinbaseScriptSize { len });
            }
        } else if let Some(index) = self.inputs.iter().position(|i| i.is_null()) {
            return Err(SanityError::NullInput { index });
        }

        Ok(())
    }
}
