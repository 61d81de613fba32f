//! Checked serialization: policy checks that gate the wire encoding.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::{DUST_AMOUNT, FEE_SECURITY_MARGIN};
use crate::transaction::Transaction;
use crate::TransactionError;

/// Switches for the checks run before serializing. All checks are on by
/// default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SerializeOptions {
    /// Skip every check.
    pub disable_all: bool,
    pub disable_small_fees: bool,
    pub disable_large_fees: bool,
    pub disable_is_fully_signed: bool,
    pub disable_dust_outputs: bool,
    pub disable_more_output_than_input: bool,
}

impl SerializeOptions {
    pub fn disable_all() -> Self {
        SerializeOptions {
            disable_all: true,
            ..Default::default()
        }
    }
}

impl Transaction {
    /// Hex serialization, after the checks `opts` leaves enabled.
    pub fn serialize(&self, opts: &SerializeOptions) -> Result<String, TransactionError> {
        if opts.disable_all {
            return Ok(self.unchecked_serialize());
        }
        self.checked_serialize(opts)
    }

    /// Hex serialization without any checks.
    pub fn unchecked_serialize(&self) -> String {
        self.to_hex()
    }

    /// Hex serialization that fails with the first policy violation found.
    pub fn checked_serialize(&self, opts: &SerializeOptions) -> Result<String, TransactionError> {
        if let Some(err) = self.get_serialization_error(opts) {
            warn!(error = %err, "refusing to serialize transaction");
            return Err(TransactionError::SerializationCheck(Box::new(err)));
        }
        Ok(self.unchecked_serialize())
    }

    /// First policy violation, if any, checked in this order: invalid
    /// amounts, overspending, fee bounds, dust outputs, missing signatures.
    pub fn get_serialization_error(&self, opts: &SerializeOptions) -> Option<TransactionError> {
        if self.invalid_satoshis() {
            return Some(TransactionError::InvalidSatoshis);
        }

        let unspent = match self.unspent_value() {
            Ok(unspent) => unspent,
            Err(e) => return Some(e),
        };

        let unspent_error = if unspent < 0 {
            if opts.disable_more_output_than_input {
                None
            } else {
                Some(TransactionError::InvalidOutputAmountSum {
                    inputs: self.input_amount().unwrap_or_default(),
                    outputs: self.output_amount(),
                })
            }
        } else {
            self.fee_error(opts, unspent)
        };

        unspent_error
            .or_else(|| self.dust_outputs_error(opts))
            .or_else(|| self.missing_signatures_error(opts))
    }

    fn fee_error(&self, opts: &SerializeOptions, unspent: i128) -> Option<TransactionError> {
        if let Some(fee) = self.fee {
            if i128::from(fee) != unspent {
                return Some(TransactionError::FeeDifferent { fee, unspent });
            }
        }

        let estimated = match self.estimate_fee() {
            Ok(fee) => fee,
            Err(e) => return Some(e),
        };

        if !opts.disable_large_fees {
            let max = estimated.saturating_mul(FEE_SECURITY_MARGIN);
            if unspent > i128::from(max) {
                if self.change_script.is_none() {
                    return Some(TransactionError::ChangeAddressMissing { unspent, max });
                }
                return Some(TransactionError::FeeTooLarge { unspent, max });
            }
        }

        if !opts.disable_small_fees {
            let min = estimated.div_ceil(FEE_SECURITY_MARGIN);
            if unspent < i128::from(min) {
                return Some(TransactionError::FeeTooSmall { unspent, min });
            }
        }

        None
    }

    fn dust_outputs_error(&self, opts: &SerializeOptions) -> Option<TransactionError> {
        if opts.disable_dust_outputs {
            return None;
        }
        self.outputs
            .iter()
            .enumerate()
            .find(|(_, o)| o.satoshis < DUST_AMOUNT && !o.is_data_out())
            .map(|(index, o)| TransactionError::DustOutputs {
                index,
                satoshis: o.satoshis,
            })
    }

    fn missing_signatures_error(&self, opts: &SerializeOptions) -> Option<TransactionError> {
        if opts.disable_is_fully_signed {
            return None;
        }
        match self.is_fully_signed() {
            Ok(true) => None,
            Ok(false) => Some(TransactionError::MissingSignatures),
            Err(e) => Some(e),
        }
    }
}
