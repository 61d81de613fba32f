//! Transaction input and its signing strategies.
//!
//! An `Input` references a previous output and carries an unlock script.
//! How it signs, how big its unlock script will be, and when it counts as
//! fully signed depend on the template of the output it spends, captured by
//! `InputKind`.

pub mod multisig;

use tracing::trace;
use txkit_primitives::chainhash::Hash;
use txkit_primitives::ec::{PrivateKey, PublicKey};
use txkit_primitives::util::{ByteReader, ByteWriter, VarInt};
use txkit_script::Script;

pub use multisig::{MultiSigScriptHashState, MultiSigState};

use crate::output::Output;
use crate::sighash;
use crate::signature::TransactionSignature;
use crate::snapshot::InputObject;
use crate::transaction::Transaction;
use crate::unspent::UnspentOutput;
use crate::TransactionError;

/// Sequence number of an input that opts out of lock time and RBF.
pub const DEFAULT_SEQNUMBER: u32 = 0xFFFF_FFFF;

/// Highest sequence number that still lets the lock time be enforced.
pub const DEFAULT_LOCKTIME_SEQNUMBER: u32 = 0xFFFF_FFFE;

/// Sequence number signalling replace-by-fee.
pub const DEFAULT_RBF_SEQNUMBER: u32 = 0xFFFF_FFFD;

/// Output index of the null outpoint spent by a coinbase input.
pub const NULL_OUTPUT_INDEX: u32 = 0xFFFF_FFFF;

/// Outpoint (32 + 4) plus sequence number (4).
const FIXED_INPUT_SIZE: usize = 40;

/// <sig> <compressed pubkey>: (1 + 72) + (1 + 33).
const P2PKH_SCRIPT_MAX_SIZE: usize = 73 + 34;

/// <sig>: 1 + 72.
const P2PK_SCRIPT_MAX_SIZE: usize = 73;

/// The template of the spent output, which selects the signing strategy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputKind {
    /// Pay-to-public-key-hash.
    PublicKeyHash,
    /// Pay-to-public-key.
    PublicKey,
    /// Bare M-of-N multisig.
    MultiSig(MultiSigState),
    /// P2SH wrapping an M-of-N multisig redeem script.
    MultiSigScriptHash(MultiSigScriptHashState),
    /// Unknown template, or spent output not known. Cannot sign.
    Unclassified,
}

/// A single transaction input.
///
/// # Wire format
///
/// | Field         | Size          |
/// |---------------|---------------|
/// | prev tx id    | 32 bytes      |
/// | output index  | 4 bytes (LE)  |
/// | script length | VarInt        |
/// | script        | variable      |
/// | sequence      | 4 bytes (LE)  |
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Input {
    pub prev_tx_id: Hash,
    pub output_index: u32,
    pub sequence_number: u32,
    script: Script,
    output: Option<Output>,
    kind: InputKind,
}

impl Input {
    // -----------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------

    /// An unclassified input with an empty unlock script.
    pub fn new(prev_tx_id: Hash, output_index: u32) -> Self {
        Input {
            prev_tx_id,
            output_index,
            sequence_number: DEFAULT_SEQNUMBER,
            script: Script::new(),
            output: None,
            kind: InputKind::Unclassified,
        }
    }

    /// Input spending `utxo`, classified as P2PKH, P2PK, or unclassified.
    pub fn from_utxo(utxo: &UnspentOutput) -> Self {
        let mut input = Input::new(utxo.tx_id, utxo.output_index);
        input.set_output(utxo.to_output());
        input
    }

    /// Input spending a bare multisig or P2SH-multisig `utxo` whose keys
    /// are `public_keys`.
    ///
    /// The keys and threshold must reproduce the spent script exactly.
    pub fn from_multisig_utxo(
        utxo: &UnspentOutput,
        public_keys: &[PublicKey],
        threshold: usize,
    ) -> Result<Self, TransactionError> {
        if threshold > public_keys.len() {
            return Err(TransactionError::InvalidArgument(format!(
                "number of required signatures ({}) exceeds the number of public keys ({})",
                threshold,
                public_keys.len()
            )));
        }

        let kind = if utxo.script.is_multisig_out() {
            let state = MultiSigState::new(public_keys, threshold);
            if state.locking_script()? != utxo.script {
                return Err(TransactionError::InvalidArgument(
                    "provided public keys don't match the output script".to_string(),
                ));
            }
            InputKind::MultiSig(state)
        } else if utxo.script.is_script_hash_out() {
            let state = MultiSigScriptHashState::new(public_keys, threshold)?;
            if Script::build_script_hash_out(state.redeem_script()) != utxo.script {
                return Err(TransactionError::InvalidArgument(
                    "provided public keys don't hash to the output script".to_string(),
                ));
            }
            InputKind::MultiSigScriptHash(state)
        } else {
            return Err(TransactionError::UnsupportedScript(format!(
                "{} is neither multisig nor script hash",
                utxo.script.to_hex()
            )));
        };

        let mut input = Input::new(utxo.tx_id, utxo.output_index);
        input.output = Some(utxo.to_output());
        input.kind = kind;
        input.rebuild_unlock_script()?;
        Ok(input)
    }

    pub fn with_sequence_number(mut self, sequence_number: u32) -> Self {
        self.sequence_number = sequence_number;
        self
    }

    pub fn with_script(mut self, script: Script) -> Self {
        self.script = script;
        self
    }

    /// Rebuild an input from its snapshot, re-deriving its kind from the
    /// embedded spent output.
    pub fn from_object(obj: &InputObject) -> Result<Self, TransactionError> {
        let mut input = match (&obj.output, &obj.public_keys, obj.threshold) {
            (Some(output), Some(keys), Some(threshold))
                if output.script.is_multisig_out() || output.script.is_script_hash_out() =>
            {
                let utxo = UnspentOutput::new(
                    obj.prev_tx_id,
                    obj.output_index,
                    output.script.clone(),
                    output.satoshis,
                );
                let mut input = Input::from_multisig_utxo(&utxo, keys, threshold)?;
                if let Some(sigs) = &obj.signatures {
                    let restored = sigs
                        .iter()
                        .map(|s| s.as_ref().map(TransactionSignature::from_object).transpose())
                        .collect::<Result<Vec<_>, _>>()?;
                    match &mut input.kind {
                        InputKind::MultiSig(state) => state.restore_signatures(restored)?,
                        InputKind::MultiSigScriptHash(state) => {
                            state.multisig.restore_signatures(restored)?
                        }
                        _ => {}
                    }
                    input.rebuild_unlock_script()?;
                }
                input
            }
            (Some(output), _, _) => {
                let output = Output::from_object(output);
                if !output.script.is_public_key_hash_out() && !output.script.is_public_key_out() {
                    return Err(TransactionError::UnsupportedScript(output.script.to_hex()));
                }
                let mut input = Input::new(obj.prev_tx_id, obj.output_index);
                input.set_output(output);
                input.script = obj.script.clone();
                input
            }
            (None, _, _) => {
                Input::new(obj.prev_tx_id, obj.output_index).with_script(obj.script.clone())
            }
        };
        input.sequence_number = obj.sequence_number;
        Ok(input)
    }

    pub fn to_object(&self) -> InputObject {
        let (public_keys, threshold, signatures) = match self.multisig_state() {
            Some(state) => (
                Some(state.public_keys().to_vec()),
                Some(state.threshold()),
                Some(
                    state
                        .signatures()
                        .iter()
                        .map(|s| s.as_ref().map(TransactionSignature::to_object))
                        .collect(),
                ),
            ),
            None => (None, None, None),
        };
        InputObject {
            prev_tx_id: self.prev_tx_id,
            output_index: self.output_index,
            sequence_number: self.sequence_number,
            script: self.script.clone(),
            output: self.output.as_ref().map(Output::to_object),
            public_keys,
            threshold,
            signatures,
        }
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    /// The unlock script.
    pub fn script(&self) -> &Script {
        &self.script
    }

    /// Replace the unlock script. Used for inputs signed out of band.
    pub fn set_script(&mut self, script: Script) {
        self.script = script;
    }

    /// The output this input spends, when known.
    pub fn output(&self) -> Option<&Output> {
        self.output.as_ref()
    }

    /// Attach the spent output. An unclassified input is reclassified as
    /// P2PKH or P2PK when the script matches.
    pub fn set_output(&mut self, output: Output) {
        if self.kind == InputKind::Unclassified {
            if output.script.is_public_key_hash_out() {
                self.kind = InputKind::PublicKeyHash;
            } else if output.script.is_public_key_out() {
                self.kind = InputKind::PublicKey;
            }
        }
        self.output = Some(output);
    }

    pub fn kind(&self) -> &InputKind {
        &self.kind
    }

    pub fn multisig_state(&self) -> Option<&MultiSigState> {
        match &self.kind {
            InputKind::MultiSig(state) => Some(state),
            InputKind::MultiSigScriptHash(state) => Some(state.multisig()),
            _ => None,
        }
    }

    /// Spends the null outpoint (all-zero id, index 0xFFFFFFFF).
    pub fn is_null(&self) -> bool {
        self.prev_tx_id.is_zero() && self.output_index == NULL_OUTPUT_INDEX
    }

    pub fn is_final(&self) -> bool {
        self.sequence_number == DEFAULT_SEQNUMBER
    }

    /// Script the signature digest commits to: the redeem script for P2SH
    /// multisig, otherwise the spent output script.
    pub fn script_code(&self, index: usize) -> Result<&Script, TransactionError> {
        match &self.kind {
            InputKind::MultiSigScriptHash(state) => Ok(state.redeem_script()),
            _ => Ok(&self.require_output(index)?.script),
        }
    }

    fn require_output(&self, index: usize) -> Result<&Output, TransactionError> {
        self.output
            .as_ref()
            .ok_or(TransactionError::MissingPreviousOutput { index })
    }

    // -----------------------------------------------------------------
    // Wire format
    // -----------------------------------------------------------------

    /// Read one input. Its kind is unknown until the spent output is attached.
    pub fn read_from(reader: &mut ByteReader) -> Result<Self, TransactionError> {
        let prev_tx_id = reader.read_array::<32>().map_err(|e| {
            TransactionError::Serialization(format!("reading previous tx id: {}", e))
        })?;
        let output_index = reader.read_u32_le().map_err(|e| {
            TransactionError::Serialization(format!("reading output index: {}", e))
        })?;
        let script = reader.read_var_bytes().map_err(|e| {
            TransactionError::Serialization(format!("reading unlocking script: {}", e))
        })?;
        let sequence_number = reader.read_u32_le().map_err(|e| {
            TransactionError::Serialization(format!("reading sequence number: {}", e))
        })?;

        Ok(Input {
            prev_tx_id: Hash::new(prev_tx_id),
            output_index,
            sequence_number,
            script: Script::from_bytes(script),
            output: None,
            kind: InputKind::Unclassified,
        })
    }

    pub fn write_to(&self, writer: &mut ByteWriter) {
        writer.write_bytes(self.prev_tx_id.as_bytes());
        writer.write_u32_le(self.output_index);
        writer.write_var_bytes(self.script.to_bytes());
        writer.write_u32_le(self.sequence_number);
    }

    /// Expected serialized size once fully signed.
    ///
    /// Unclassified inputs report their current size.
    pub fn estimate_size(&self) -> usize {
        let script_size = match &self.kind {
            InputKind::PublicKeyHash => P2PKH_SCRIPT_MAX_SIZE,
            InputKind::PublicKey => P2PK_SCRIPT_MAX_SIZE,
            InputKind::MultiSig(state) => state.estimate_script_size(),
            InputKind::MultiSigScriptHash(state) => state.estimate_script_size(),
            InputKind::Unclassified => self.script.len(),
        };
        FIXED_INPUT_SIZE + VarInt::from(script_size).encoded_len() + script_size
    }

    // -----------------------------------------------------------------
    // Signing
    // -----------------------------------------------------------------

    /// Signatures `key` can contribute to this input at position `index`.
    ///
    /// `hash_data` is hash160 of the key's public key; P2PKH inputs match it
    /// against the spent script.
    pub fn get_signatures(
        &self,
        tx: &Transaction,
        key: &PrivateKey,
        index: usize,
        sighash_type: u32,
        hash_data: &[u8; 20],
    ) -> Result<Vec<TransactionSignature>, TransactionError> {
        let output = match &self.kind {
            InputKind::Unclassified => {
                return Err(TransactionError::UnableToVerifySignature { index })
            }
            _ => self.require_output(index)?,
        };

        let pub_key = key.pub_key();
        let matches = match &self.kind {
            InputKind::PublicKeyHash => output.script.public_key_hash()? == *hash_data,
            InputKind::PublicKey => output.script.public_key()? == pub_key,
            InputKind::MultiSig(_) | InputKind::MultiSigScriptHash(_) => self
                .multisig_state()
                .is_some_and(|state| {
                    !state.is_fully_signed() && state.public_keys().contains(&pub_key)
                }),
            InputKind::Unclassified => false,
        };
        if !matches {
            return Ok(Vec::new());
        }

        let signature = sighash::sign(
            tx,
            key,
            index,
            self.script_code(index)?,
            output.satoshis,
            sighash_type,
        )?;
        trace!(input = index, sighash_type, "produced input signature");
        Ok(vec![TransactionSignature {
            public_key: pub_key,
            prev_tx_id: self.prev_tx_id,
            output_index: self.output_index,
            input_index: index,
            signature,
            sighash_type,
        }])
    }

    /// Check `signature` against this input's digest.
    pub fn is_valid_signature(
        &self,
        tx: &Transaction,
        signature: &TransactionSignature,
    ) -> Result<bool, TransactionError> {
        let index = signature.input_index;
        if self.kind == InputKind::Unclassified {
            return Err(TransactionError::UnableToVerifySignature { index });
        }
        let output = self.require_output(index)?;
        sighash::verify(
            tx,
            &signature.signature,
            &signature.public_key,
            index,
            self.script_code(index)?,
            output.satoshis,
            signature.sighash_type,
        )
    }

    /// Place an already validated signature into the unlock script.
    pub(crate) fn add_signature(
        &mut self,
        signature: TransactionSignature,
    ) -> Result<(), TransactionError> {
        let der = signature.signature.to_der();
        let sighash_type = signature.sighash_type as u8;
        match &mut self.kind {
            InputKind::PublicKeyHash => {
                self.script =
                    Script::build_public_key_hash_in(&signature.public_key, &der, sighash_type)?;
            }
            InputKind::PublicKey => {
                self.script = Script::build_public_key_in(&der, sighash_type)?;
            }
            InputKind::MultiSig(state) => {
                state.add_signature(signature)?;
                self.rebuild_unlock_script()?;
            }
            InputKind::MultiSigScriptHash(state) => {
                state.multisig.add_signature(signature)?;
                self.rebuild_unlock_script()?;
            }
            InputKind::Unclassified => {
                return Err(TransactionError::UnableToVerifySignature {
                    index: signature.input_index,
                })
            }
        }
        Ok(())
    }

    /// Drop all signature material. Unclassified inputs are left untouched.
    pub fn clear_signatures(&mut self) -> Result<(), TransactionError> {
        match &mut self.kind {
            InputKind::PublicKeyHash | InputKind::PublicKey => self.script = Script::new(),
            InputKind::MultiSig(state) => state.clear(),
            InputKind::MultiSigScriptHash(state) => state.multisig.clear(),
            InputKind::Unclassified => return Ok(()),
        }
        self.rebuild_unlock_script()
    }

    /// Whether enough signatures are present for this input.
    pub fn is_fully_signed(&self, index: usize) -> Result<bool, TransactionError> {
        match &self.kind {
            InputKind::PublicKeyHash => Ok(self.script.is_public_key_hash_in()),
            InputKind::PublicKey => Ok(self.script.is_public_key_in()),
            InputKind::MultiSig(state) => Ok(state.is_fully_signed()),
            InputKind::MultiSigScriptHash(state) => Ok(state.multisig().is_fully_signed()),
            InputKind::Unclassified => Err(TransactionError::UnableToVerifySignature { index }),
        }
    }

    fn rebuild_unlock_script(&mut self) -> Result<(), TransactionError> {
        match &self.kind {
            InputKind::MultiSig(state) => {
                self.script = Script::build_multisig_in(&state.unlock_signatures())?;
            }
            InputKind::MultiSigScriptHash(state) => {
                self.script = Script::build_p2sh_multisig_in(
                    &state.multisig().unlock_signatures(),
                    state.redeem_script(),
                )?;
            }
            _ => {}
        }
        Ok(())
    }
}
