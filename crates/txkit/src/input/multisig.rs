//! Signature bookkeeping for bare and P2SH multisig inputs.

use txkit_primitives::ec::PublicKey;
use txkit_script::Script;

use crate::signature::TransactionSignature;
use crate::TransactionError;

/// Unlock-script budget per signature in a bare multisig spend.
const SIGNATURE_SIZE: usize = 73;

/// Unlock-script budget per signature in a P2SH multisig spend.
const P2SH_SIGNATURE_SIZE: usize = 74;

/// Unlock-script budget per public key inside a P2SH redeem script.
const P2SH_PUBKEY_SIZE: usize = 34;

/// Leading OP_0 plus the redeem-script push and its small-int/opcode bytes.
const P2SH_OPCODES_SIZE: usize = 7;

/// State of an input spending `threshold`-of-`n` bare multisig.
///
/// Public keys are kept in ascending hex order, the order the locking
/// script lists them in. `signatures[i]` belongs to `public_keys[i]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultiSigState {
    public_keys: Vec<PublicKey>,
    threshold: usize,
    signatures: Vec<Option<TransactionSignature>>,
}

impl MultiSigState {
    pub fn new(public_keys: &[PublicKey], threshold: usize) -> Self {
        let mut public_keys = public_keys.to_vec();
        public_keys.sort_by_key(PublicKey::to_hex);
        let signatures = vec![None; public_keys.len()];
        MultiSigState {
            public_keys,
            threshold,
            signatures,
        }
    }

    pub fn public_keys(&self) -> &[PublicKey] {
        &self.public_keys
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn signatures(&self) -> &[Option<TransactionSignature>] {
        &self.signatures
    }

    /// The `threshold`-of-`n` locking script these keys form.
    pub fn locking_script(&self) -> Result<Script, TransactionError> {
        Ok(Script::build_multisig_out(&self.public_keys, self.threshold)?)
    }

    pub fn count_signatures(&self) -> usize {
        self.signatures.iter().filter(|s| s.is_some()).count()
    }

    pub fn count_missing_signatures(&self) -> usize {
        self.threshold.saturating_sub(self.count_signatures())
    }

    pub fn public_keys_without_signature(&self) -> Vec<&PublicKey> {
        self.public_keys
            .iter()
            .zip(&self.signatures)
            .filter(|(_, sig)| sig.is_none())
            .map(|(key, _)| key)
            .collect()
    }

    pub fn is_fully_signed(&self) -> bool {
        self.count_signatures() >= self.threshold
    }

    /// Store `signature` in the slot of its public key.
    pub(crate) fn add_signature(
        &mut self,
        signature: TransactionSignature,
    ) -> Result<(), TransactionError> {
        if self.is_fully_signed() {
            return Err(TransactionError::InvalidState(
                "all needed signatures have already been added".to_string(),
            ));
        }
        let slot = self
            .public_keys
            .iter()
            .position(|k| *k == signature.public_key)
            .ok_or_else(|| {
                TransactionError::InvalidArgument(
                    "signature has no matching public key".to_string(),
                )
            })?;
        self.signatures[slot] = Some(signature);
        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        self.signatures.iter_mut().for_each(|s| *s = None);
    }

    /// Present signatures in key order, each with its sighash byte.
    pub(crate) fn unlock_signatures(&self) -> Vec<Vec<u8>> {
        self.signatures
            .iter()
            .flatten()
            .map(TransactionSignature::to_tx_format)
            .collect()
    }

    pub(crate) fn estimate_script_size(&self) -> usize {
        1 + SIGNATURE_SIZE * self.threshold
    }

    /// Restore signatures from a snapshot, by position.
    pub(crate) fn restore_signatures(
        &mut self,
        signatures: Vec<Option<TransactionSignature>>,
    ) -> Result<(), TransactionError> {
        if signatures.len() != self.public_keys.len() {
            return Err(TransactionError::InvalidArgument(format!(
                "expected {} signature slots, got {}",
                self.public_keys.len(),
                signatures.len()
            )));
        }
        self.signatures = signatures;
        Ok(())
    }
}

/// State of an input spending a P2SH output whose redeem script is multisig.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultiSigScriptHashState {
    pub(crate) multisig: MultiSigState,
    redeem_script: Script,
}

impl MultiSigScriptHashState {
    pub fn new(public_keys: &[PublicKey], threshold: usize) -> Result<Self, TransactionError> {
        let multisig = MultiSigState::new(public_keys, threshold);
        let redeem_script = multisig.locking_script()?;
        Ok(MultiSigScriptHashState {
            multisig,
            redeem_script,
        })
    }

    pub fn multisig(&self) -> &MultiSigState {
        &self.multisig
    }

    /// The script whose hash the spent output commits to.
    pub fn redeem_script(&self) -> &Script {
        &self.redeem_script
    }

    pub(crate) fn estimate_script_size(&self) -> usize {
        P2SH_OPCODES_SIZE
            + P2SH_SIGNATURE_SIZE * self.multisig.threshold
            + P2SH_PUBKEY_SIZE * self.multisig.public_keys.len()
    }
}
