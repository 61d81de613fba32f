//! Signing orchestration across inputs.

use tracing::debug;
use txkit_primitives::ec::PrivateKey;

use crate::input::InputKind;
use crate::sighash::SIGHASH_ALL_FORKID;
use crate::signature::TransactionSignature;
use crate::transaction::Transaction;
use crate::TransactionError;

impl Transaction {
    /// Sign every input each key can sign, with SIGHASH_ALL | FORKID.
    pub fn sign(&mut self, keys: &[PrivateKey]) -> Result<&mut Self, TransactionError> {
        self.sign_with_type(keys, SIGHASH_ALL_FORKID)
    }

    /// Sign every input each key can sign, with `sighash_type`.
    ///
    /// Every input must know the output it spends.
    pub fn sign_with_type(
        &mut self,
        keys: &[PrivateKey],
        sighash_type: u32,
    ) -> Result<&mut Self, TransactionError> {
        if let Some(index) = self.inputs.iter().position(|i| i.output().is_none()) {
            return Err(TransactionError::MissingPreviousOutput { index });
        }
        for key in keys {
            for signature in self.get_signatures(key, sighash_type)? {
                self.apply_signature(signature)?;
            }
        }
        Ok(self)
    }

    /// Signatures `key` can produce, in input order.
    pub fn get_signatures(
        &self,
        key: &PrivateKey,
        sighash_type: u32,
    ) -> Result<Vec<TransactionSignature>, TransactionError> {
        let hash_data = key.pub_key().hash160();
        let mut results = Vec::new();
        for (index, input) in self.inputs.iter().enumerate() {
            results.extend(input.get_signatures(self, key, index, sighash_type, &hash_data)?);
        }
        Ok(results)
    }

    /// Validate `signature` and place it into its input.
    pub fn apply_signature(
        &mut self,
        signature: TransactionSignature,
    ) -> Result<&mut Self, TransactionError> {
        if !self.is_valid_signature(&signature)? {
            return Err(TransactionError::InvalidState(format!(
                "signature for input {} is invalid",
                signature.input_index
            )));
        }
        let index = signature.input_index;
        self.inputs[index].add_signature(signature)?;
        debug!(input = index, "applied signature");
        Ok(self)
    }

    /// True when every input holds enough signatures.
    ///
    /// Fails if any input is unclassified, since its signing state cannot be
    /// judged (typically a transaction parsed from bytes).
    pub fn is_fully_signed(&self) -> Result<bool, TransactionError> {
        if let Some(index) = self
            .inputs
            .iter()
            .position(|i| *i.kind() == InputKind::Unclassified)
        {
            return Err(TransactionError::UnableToVerifySignature { index });
        }
        for (index, input) in self.inputs.iter().enumerate() {
            if !input.is_fully_signed(index)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Check `signature` against the digest of the input it names.
    pub fn is_valid_signature(
        &self,
        signature: &TransactionSignature,
    ) -> Result<bool, TransactionError> {
        let input = self
            .inputs
            .get(signature.input_index)
            .ok_or(TransactionError::InvalidIndex {
                index: signature.input_index,
                len: self.inputs.len(),
            })?;
        input.is_valid_signature(self, signature)
    }
}
