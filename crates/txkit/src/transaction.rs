//! The transaction aggregate.
//!
//! Owns ordered inputs and outputs, keeps memoized amount totals, and funnels
//! every structural mutation through change-output maintenance. Fee, signing,
//! serialization policy, sanity checks, sorting, and lock time live in their
//! own modules as further `impl Transaction` blocks.

use std::cell::Cell;
use std::fmt;

use tracing::debug;
use txkit_primitives::chainhash::Hash;
use txkit_primitives::ec::PublicKey;
use txkit_primitives::hash::sha256d;
use txkit_primitives::util::{ByteReader, ByteWriter, VarInt};
use txkit_script::{Address, Script};

use crate::input::Input;
use crate::output::Output;
use crate::unspent::UnspentOutput;
use crate::TransactionError;

/// Default transaction version.
pub const CURRENT_VERSION: i32 = 1;

/// A transaction under construction.
///
/// # Wire format
///
/// | Field        | Size                  |
/// |--------------|-----------------------|
/// | version      | 4 bytes (LE, signed)  |
/// | input count  | VarInt                |
/// | inputs       | variable (per input)  |
/// | output count | VarInt                |
/// | outputs      | variable (per output) |
/// | lock time    | 4 bytes (LE)          |
///
/// Inputs and outputs are only reachable through methods, so the cached
/// totals and the change output can never go stale. Not `Sync`: the caches
/// are plain cells and instances are meant for a single writer.
#[derive(Clone)]
pub struct Transaction {
    pub version: i32,
    pub(crate) inputs: Vec<Input>,
    pub(crate) outputs: Vec<Output>,
    /// Block height (< 500,000,000) or UNIX time before which the
    /// transaction is not final. 0 disables the lock.
    pub n_lock_time: u32,

    pub(crate) fee: Option<u64>,
    pub(crate) fee_per_kb: Option<u64>,
    pub(crate) change_script: Option<Script>,
    pub(crate) change_index: Option<usize>,

    input_amount: Cell<Option<u128>>,
    output_amount: Cell<Option<u128>>,
}

impl Transaction {
    /// An empty version-1 transaction with lock time 0.
    pub fn new() -> Self {
        Transaction {
            version: CURRENT_VERSION,
            inputs: Vec::new(),
            outputs: Vec::new(),
            n_lock_time: 0,
            fee: None,
            fee_per_kb: None,
            change_script: None,
            change_index: None,
            input_amount: Cell::new(None),
            output_amount: Cell::new(None),
        }
    }

    // -----------------------------------------------------------------
    // Deserialization
    // -----------------------------------------------------------------

    pub fn from_hex(hex_str: &str) -> Result<Self, TransactionError> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| TransactionError::Serialization(format!("invalid hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Parse exactly one transaction; trailing bytes are an error.
    ///
    /// Parsed inputs carry no spent-output information and are unclassified.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransactionError> {
        let mut reader = ByteReader::new(bytes);
        let tx = Self::read_from(&mut reader)?;
        if reader.remaining() != 0 {
            return Err(TransactionError::Serialization(format!(
                "trailing {} bytes after transaction",
                reader.remaining()
            )));
        }
        Ok(tx)
    }

    pub fn read_from(reader: &mut ByteReader) -> Result<Self, TransactionError> {
        let version = reader
            .read_i32_le()
            .map_err(|e| TransactionError::Serialization(format!("reading version: {}", e)))?;

        let input_count = reader.read_varint().map_err(|e| {
            TransactionError::Serialization(format!("reading input count: {}", e))
        })?;
        // Each input is at least 41 bytes; cap the preallocation accordingly.
        let mut inputs = Vec::with_capacity((input_count.value() as usize).min(reader.remaining() / 41));
        for _ in 0..input_count.value() {
            inputs.push(Input::read_from(reader)?);
        }

        let output_count = reader.read_varint().map_err(|e| {
            TransactionError::Serialization(format!("reading output count: {}", e))
        })?;
        let mut outputs = Vec::with_capacity((output_count.value() as usize).min(reader.remaining() / 9));
        for _ in 0..output_count.value() {
            outputs.push(Output::read_from(reader)?);
        }

        let n_lock_time = reader
            .read_u32_le()
            .map_err(|e| TransactionError::Serialization(format!("reading lock time: {}", e)))?;

        let mut tx = Transaction::new();
        tx.version = version;
        tx.inputs = inputs;
        tx.outputs = outputs;
        tx.n_lock_time = n_lock_time;
        Ok(tx)
    }

    /// A fresh copy made by round-tripping through the wire format.
    ///
    /// Spent-output information, fee settings, and change tracking are not
    /// carried over.
    pub fn shallow_copy(&self) -> Result<Self, TransactionError> {
        Self::from_bytes(&self.to_bytes())
    }

    // -----------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------

    /// Wire-format bytes, without any policy checks.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(self.estimate_size());
        writer.write_i32_le(self.version);

        writer.write_varint(VarInt::from(self.inputs.len()));
        for input in &self.inputs {
            input.write_to(&mut writer);
        }

        writer.write_varint(VarInt::from(self.outputs.len()));
        for output in &self.outputs {
            output.write_to(&mut writer);
        }

        writer.write_u32_le(self.n_lock_time);
        writer.into_bytes()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Serialized size in bytes.
    pub fn size(&self) -> usize {
        self.to_bytes().len()
    }

    // -----------------------------------------------------------------
    // Identity
    // -----------------------------------------------------------------

    /// Double SHA-256 of the wire bytes, in internal byte order.
    pub fn tx_id(&self) -> [u8; 32] {
        sha256d(&self.to_bytes())
    }

    /// Transaction id as a chain hash; displays byte-reversed.
    pub fn hash(&self) -> Hash {
        Hash::new(self.tx_id())
    }

    /// Display-order hex id.
    pub fn id(&self) -> String {
        self.hash().to_string()
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    /// The output script receiving leftover value, if configured.
    pub fn change_script(&self) -> Option<&Script> {
        self.change_script.as_ref()
    }

    /// Position of the materialized change output, if any.
    pub fn change_index(&self) -> Option<usize> {
        self.change_index
    }

    pub fn get_change_output(&self) -> Option<&Output> {
        self.change_index.and_then(|i| self.outputs.get(i))
    }

    /// Exactly one input, and it spends the null outpoint.
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].is_null()
    }

    /// True when every input knows the output it spends.
    pub fn has_all_utxo_info(&self) -> bool {
        self.inputs.iter().all(|i| i.output().is_some())
    }

    pub fn invalid_satoshis(&self) -> bool {
        self.outputs.iter().any(Output::invalid_satoshis)
    }

    // -----------------------------------------------------------------
    // Amounts
    // -----------------------------------------------------------------

    /// Sum of spent output values. Fails if any input lacks its spent output.
    pub fn input_amount(&self) -> Result<u128, TransactionError> {
        if let Some(total) = self.input_amount.get() {
            return Ok(total);
        }
        let mut total = 0u128;
        for (index, input) in self.inputs.iter().enumerate() {
            let output = input
                .output()
                .ok_or(TransactionError::MissingPreviousOutput { index })?;
            total += u128::from(output.satoshis);
        }
        self.input_amount.set(Some(total));
        Ok(total)
    }

    pub fn output_amount(&self) -> u128 {
        if let Some(total) = self.output_amount.get() {
            return total;
        }
        let total = self.outputs.iter().map(|o| u128::from(o.satoshis)).sum();
        self.output_amount.set(Some(total));
        total
    }

    /// Inputs minus outputs; negative when outputs overspend.
    pub fn unspent_value(&self) -> Result<i128, TransactionError> {
        Ok(self.input_amount()? as i128 - self.output_amount() as i128)
    }

    pub(crate) fn invalidate_input_amount(&self) {
        self.input_amount.set(None);
    }

    pub(crate) fn invalidate_output_amount(&self) {
        self.output_amount.set(None);
    }

    // -----------------------------------------------------------------
    // Funding
    // -----------------------------------------------------------------

    /// Spend `utxo`. Skipped if an input already spends the same outpoint.
    pub fn from(&mut self, utxo: UnspentOutput) -> Result<&mut Self, TransactionError> {
        if self.spends(&utxo) {
            return Ok(self);
        }
        self.add_input(Input::from_utxo(&utxo), None, None)
    }

    pub fn from_many<I>(&mut self, utxos: I) -> Result<&mut Self, TransactionError>
    where
        I: IntoIterator<Item = UnspentOutput>,
    {
        for utxo in utxos {
            self.from(utxo)?;
        }
        Ok(self)
    }

    /// Spend a bare multisig or P2SH-multisig `utxo` locked to `public_keys`.
    pub fn from_multisig(
        &mut self,
        utxo: UnspentOutput,
        public_keys: &[PublicKey],
        threshold: usize,
    ) -> Result<&mut Self, TransactionError> {
        if self.spends(&utxo) {
            return Ok(self);
        }
        let input = Input::from_multisig_utxo(&utxo, public_keys, threshold)?;
        self.add_input(input, None, None)
    }

    pub fn from_many_multisig<I>(
        &mut self,
        utxos: I,
        public_keys: &[PublicKey],
        threshold: usize,
    ) -> Result<&mut Self, TransactionError>
    where
        I: IntoIterator<Item = UnspentOutput>,
    {
        for utxo in utxos {
            self.from_multisig(utxo, public_keys, threshold)?;
        }
        Ok(self)
    }

    fn spends(&self, utxo: &UnspentOutput) -> bool {
        self.inputs
            .iter()
            .any(|i| i.prev_tx_id == utxo.tx_id && i.output_index == utxo.output_index)
    }

    /// Add `input`, attaching its spent output from `output_script` and
    /// `satoshis` when it does not carry one.
    pub fn add_input(
        &mut self,
        mut input: Input,
        output_script: Option<Script>,
        satoshis: Option<u64>,
    ) -> Result<&mut Self, TransactionError> {
        if input.output().is_none() {
            match (output_script, satoshis) {
                (Some(script), Some(satoshis)) => input.set_output(Output::new(script, satoshis)),
                _ => {
                    return Err(TransactionError::NeedMoreInfo(
                        "need information about the UTXO script and satoshis".to_string(),
                    ))
                }
            }
        }
        self.unchecked_add_input(input)
    }

    /// Add `input` as is, without requiring its spent output.
    pub fn unchecked_add_input(&mut self, input: Input) -> Result<&mut Self, TransactionError> {
        debug!(
            prev_tx_id = %input.prev_tx_id,
            output_index = input.output_index,
            "adding input"
        );
        self.inputs.push(input);
        self.invalidate_input_amount();
        self.update_change_output()?;
        Ok(self)
    }

    /// Remove the input at `index`.
    pub fn remove_input(&mut self, index: usize) -> Result<&mut Self, TransactionError> {
        if index >= self.inputs.len() {
            return Err(TransactionError::InvalidIndex {
                index,
                len: self.inputs.len(),
            });
        }
        self.inputs.remove(index);
        self.invalidate_input_amount();
        self.update_change_output()?;
        Ok(self)
    }

    /// Remove the input spending `prev_tx_id:output_index`.
    pub fn remove_input_by_outpoint(
        &mut self,
        prev_tx_id: &Hash,
        output_index: u32,
    ) -> Result<&mut Self, TransactionError> {
        let index = self
            .inputs
            .iter()
            .position(|i| i.prev_tx_id == *prev_tx_id && i.output_index == output_index)
            .ok_or_else(|| {
                TransactionError::InvalidArgument(format!(
                    "no input spends {}:{}",
                    prev_tx_id, output_index
                ))
            })?;
        self.remove_input(index)
    }

    // -----------------------------------------------------------------
    // Outputs
    // -----------------------------------------------------------------

    /// Pay `satoshis` to `address`.
    pub fn to(&mut self, address: &Address, satoshis: u64) -> Result<&mut Self, TransactionError> {
        if satoshis > i64::MAX as u64 {
            return Err(TransactionError::InvalidArgument(format!(
                "amount {} is not a valid satoshi value",
                satoshis
            )));
        }
        self.add_output(Output::to_address(address, satoshis))
    }

    pub fn to_many<'a, I>(&mut self, payments: I) -> Result<&mut Self, TransactionError>
    where
        I: IntoIterator<Item = (&'a Address, u64)>,
    {
        for (address, satoshis) in payments {
            self.to(address, satoshis)?;
        }
        Ok(self)
    }

    /// Add a zero-value OP_FALSE OP_RETURN output carrying `data`.
    pub fn add_data(&mut self, data: &[u8]) -> Result<&mut Self, TransactionError> {
        let script = Script::build_data_out(data)?;
        self.add_output(Output::new(script, 0))
    }

    pub fn add_output(&mut self, output: Output) -> Result<&mut Self, TransactionError> {
        self.push_output(output);
        self.update_change_output()?;
        Ok(self)
    }

    pub(crate) fn push_output(&mut self, output: Output) {
        self.outputs.push(output);
        self.invalidate_output_amount();
    }

    /// Remove the output at `index`. The change index follows its output.
    pub fn remove_output(&mut self, index: usize) -> Result<&mut Self, TransactionError> {
        if index >= self.outputs.len() {
            return Err(TransactionError::InvalidIndex {
                index,
                len: self.outputs.len(),
            });
        }
        self.outputs.remove(index);
        self.invalidate_output_amount();
        self.change_index = match self.change_index {
            Some(ci) if ci == index => None,
            Some(ci) if ci > index => Some(ci - 1),
            other => other,
        };
        self.update_change_output()?;
        Ok(self)
    }

    /// Drop every output. Existing signatures commit to the outputs, so they
    /// are cleared too.
    pub fn clear_outputs(&mut self) -> Result<&mut Self, TransactionError> {
        self.outputs.clear();
        self.clear_signatures()?;
        self.invalidate_output_amount();
        self.change_index = None;
        self.update_change_output()?;
        Ok(self)
    }

    /// Clear signature material from every input.
    pub fn clear_signatures(&mut self) -> Result<&mut Self, TransactionError> {
        for input in &mut self.inputs {
            input.clear_signatures()?;
        }
        Ok(self)
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Transaction {
    /// The unchecked hex serialization.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transaction({})", self.hash())
    }
}
