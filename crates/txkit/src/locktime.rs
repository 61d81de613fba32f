//! Lock time and replace-by-fee helpers.

use chrono::{DateTime, TimeZone, Utc};
use tracing::debug;

use crate::config::{NLOCKTIME_BLOCKHEIGHT_LIMIT, NLOCKTIME_MAX_VALUE};
use crate::input::{DEFAULT_LOCKTIME_SEQNUMBER, DEFAULT_RBF_SEQNUMBER, DEFAULT_SEQNUMBER};
use crate::transaction::Transaction;
use crate::TransactionError;

/// Interpreted `n_lock_time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockTime {
    BlockHeight(u32),
    Timestamp(DateTime<Utc>),
}

impl Transaction {
    /// Lock until the UNIX time `timestamp` (seconds).
    pub fn lock_until_date(&mut self, timestamp: i64) -> Result<&mut Self, TransactionError> {
        if timestamp < i64::from(NLOCKTIME_BLOCKHEIGHT_LIMIT) {
            return Err(TransactionError::LockTimeTooEarly(timestamp));
        }
        if timestamp > i64::from(NLOCKTIME_MAX_VALUE) {
            return Err(TransactionError::LockTimeOutOfRange(timestamp));
        }
        self.set_lock_time(timestamp as u32)
    }

    pub fn lock_until_datetime(
        &mut self,
        time: DateTime<Utc>,
    ) -> Result<&mut Self, TransactionError> {
        self.lock_until_date(time.timestamp())
    }

    /// Lock until block `height`.
    pub fn lock_until_block_height(&mut self, height: i64) -> Result<&mut Self, TransactionError> {
        if height >= i64::from(NLOCKTIME_BLOCKHEIGHT_LIMIT) {
            return Err(TransactionError::BlockHeightTooHigh(height));
        }
        if height < 0 {
            return Err(TransactionError::LockTimeOutOfRange(height));
        }
        // Below the limit, so it fits.
        self.set_lock_time(height as u32)
    }

    /// Inputs left at the default sequence number would make the lock
    /// unenforced; they are moved to the lock-time sequence number.
    fn set_lock_time(&mut self, value: u32) -> Result<&mut Self, TransactionError> {
        let mut promoted = 0usize;
        for input in &mut self.inputs {
            if input.sequence_number == DEFAULT_SEQNUMBER {
                input.sequence_number = DEFAULT_LOCKTIME_SEQNUMBER;
                promoted += 1;
            }
        }
        self.n_lock_time = value;
        debug!(n_lock_time = value, promoted, "set lock time");
        self.clear_signatures()?;
        Ok(self)
    }

    /// `None` when unlocked, otherwise a block height or a point in time.
    pub fn get_lock_time(&self) -> Option<LockTime> {
        match self.n_lock_time {
            0 => None,
            h if h < NLOCKTIME_BLOCKHEIGHT_LIMIT => Some(LockTime::BlockHeight(h)),
            t => Utc
                .timestamp_opt(i64::from(t), 0)
                .single()
                .map(LockTime::Timestamp),
        }
    }

    /// True when any input signals replaceability.
    pub fn is_rbf(&self) -> bool {
        self.inputs
            .iter()
            .any(|i| i.sequence_number < DEFAULT_LOCKTIME_SEQNUMBER)
    }

    /// Opt every input not already signalling into replace-by-fee.
    pub fn enable_rbf(&mut self) -> Result<&mut Self, TransactionError> {
        let mut changed = 0usize;
        for input in &mut self.inputs {
            if input.sequence_number >= DEFAULT_LOCKTIME_SEQNUMBER {
                input.sequence_number = DEFAULT_RBF_SEQNUMBER;
                changed += 1;
            }
        }
        debug!(changed, "enabled replace-by-fee");
        self.clear_signatures()?;
        Ok(self)
    }
}
