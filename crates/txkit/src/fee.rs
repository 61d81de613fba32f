//! Fee estimation and change-output maintenance.

use tracing::debug;
use txkit_script::{Address, Script};

use crate::config::{CHANGE_OUTPUT_MAX_SIZE, FEE_PER_KB, MAXIMUM_EXTRA_SIZE};
use crate::output::Output;
use crate::transaction::Transaction;
use crate::TransactionError;

impl Transaction {
    // -----------------------------------------------------------------
    // Overrides
    // -----------------------------------------------------------------

    /// Use `amount` as the fee instead of estimating it.
    pub fn fee(&mut self, amount: u64) -> Result<&mut Self, TransactionError> {
        self.fee = Some(amount);
        self.clear_signatures()?;
        self.update_change_output()?;
        Ok(self)
    }

    /// Estimate fees at `amount` satoshis per kilobyte.
    pub fn fee_per_kb(&mut self, amount: u64) -> Result<&mut Self, TransactionError> {
        self.fee_per_kb = Some(amount);
        self.clear_signatures()?;
        self.update_change_output()?;
        Ok(self)
    }

    /// Send leftover value to `address`.
    pub fn change(&mut self, address: &Address) -> Result<&mut Self, TransactionError> {
        self.change_to_script(address.to_script())
    }

    /// Send leftover value to an arbitrary output script.
    pub fn change_to_script(&mut self, script: Script) -> Result<&mut Self, TransactionError> {
        self.change_script = Some(script);
        self.update_change_output()?;
        Ok(self)
    }

    /// The explicit fee override, if set.
    pub fn explicit_fee(&self) -> Option<u64> {
        self.fee
    }

    /// Fee rate in effect, in satoshis per kilobyte.
    pub fn get_fee_per_kb(&self) -> u64 {
        self.fee_per_kb.unwrap_or(FEE_PER_KB)
    }

    // -----------------------------------------------------------------
    // Fee
    // -----------------------------------------------------------------

    /// The fee this transaction pays.
    ///
    /// Coinbase transactions pay nothing. An explicit override wins. Without
    /// a change script every unspent satoshi is fee, which needs all spent
    /// outputs. Otherwise the size-based estimate applies.
    pub fn get_fee(&self) -> Result<u64, TransactionError> {
        if self.is_coinbase() {
            return Ok(0);
        }
        if let Some(fee) = self.fee {
            return Ok(fee);
        }
        if self.change_script.is_none() {
            let unspent = self.unspent_value()?;
            return u64::try_from(unspent).map_err(|_| TransactionError::InvalidOutputAmountSum {
                inputs: self.input_amount().unwrap_or_default(),
                outputs: self.output_amount(),
            });
        }
        self.estimate_fee()
    }

    /// Size-based fee, with a second pass that budgets for a change output
    /// when there is value left over to fund one.
    pub(crate) fn estimate_fee(&self) -> Result<u64, TransactionError> {
        let size = self.estimate_size();
        let available = self.unspent_value()?;
        let rate = self.get_fee_per_kb();

        let fee = fee_for_size(size, rate);
        if available > i128::from(fee) {
            return Ok(fee_for_size(size + CHANGE_OUTPUT_MAX_SIZE, rate));
        }
        Ok(fee)
    }

    /// Expected serialized size once every input is signed.
    pub fn estimate_size(&self) -> usize {
        let inputs: usize = self.inputs.iter().map(|i| i.estimate_size()).sum();
        let outputs: usize = self.outputs.iter().map(|o| o.script.len() + 9).sum();
        MAXIMUM_EXTRA_SIZE + inputs + outputs
    }

    // -----------------------------------------------------------------
    // Change
    // -----------------------------------------------------------------

    /// Re-derive the change output after a balance-affecting mutation.
    ///
    /// Clears signatures, drops the current change output, and appends a new
    /// one worth `available - fee` when that is positive. No-op without a
    /// change script.
    pub(crate) fn update_change_output(&mut self) -> Result<(), TransactionError> {
        let Some(change_script) = self.change_script.clone() else {
            return Ok(());
        };
        self.clear_signatures()?;

        if let Some(index) = self.change_index.take() {
            if index < self.outputs.len() {
                self.outputs.remove(index);
                self.invalidate_output_amount();
            }
        }

        let available = self.unspent_value()?;
        let fee = self.get_fee()?;
        let change = available - i128::from(fee);

        if change > 0 {
            let satoshis = u64::try_from(change).map_err(|_| TransactionError::InvalidSatoshis)?;
            self.change_index = Some(self.outputs.len());
            self.push_output(Output::new(change_script, satoshis));
        }

        debug!(
            available = %available,
            fee,
            change = %change.max(0),
            change_index = ?self.change_index,
            "updated change output"
        );
        Ok(())
    }
}

/// `ceil(size / 1000) * rate`.
fn fee_for_size(size: usize, rate: u64) -> u64 {
    (size as u64).div_ceil(1000).saturating_mul(rate)
}
