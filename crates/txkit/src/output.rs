//! Transaction output: a satoshi amount locked by a script.

use txkit_primitives::util::{ByteReader, ByteWriter, VarInt};
use txkit_script::{Address, Script};

use crate::snapshot::OutputObject;
use crate::TransactionError;

/// A single output.
///
/// # Wire format
///
/// | Field         | Size         |
/// |---------------|--------------|
/// | satoshis      | 8 bytes (LE) |
/// | script length | VarInt       |
/// | script        | variable     |
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Output {
    pub satoshis: u64,
    pub script: Script,
}

impl Output {
    pub fn new(script: Script, satoshis: u64) -> Self {
        Output { satoshis, script }
    }

    /// A standard output paying `satoshis` to `address`.
    pub fn to_address(address: &Address, satoshis: u64) -> Self {
        Output::new(address.to_script(), satoshis)
    }

    /// True when the amount does not fit a non-negative signed 64-bit value,
    /// which is how the amount is interpreted on the network.
    pub fn invalid_satoshis(&self) -> bool {
        self.satoshis > i64::MAX as u64
    }

    /// True for provably unspendable data carriers (OP_RETURN scripts).
    pub fn is_data_out(&self) -> bool {
        self.script.is_data_out()
    }

    /// Serialized length in bytes.
    pub fn encoded_size(&self) -> usize {
        8 + VarInt::from(self.script.len()).encoded_len() + self.script.len()
    }

    pub fn read_from(reader: &mut ByteReader) -> Result<Self, TransactionError> {
        let satoshis = reader.read_u64_le().map_err(|e| {
            TransactionError::Serialization(format!("reading satoshis: {}", e))
        })?;
        let script = reader.read_var_bytes().map_err(|e| {
            TransactionError::Serialization(format!("reading locking script: {}", e))
        })?;
        Ok(Output {
            satoshis,
            script: Script::from_bytes(script),
        })
    }

    pub fn write_to(&self, writer: &mut ByteWriter) {
        writer.write_u64_le(self.satoshis);
        writer.write_var_bytes(self.script.to_bytes());
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(self.encoded_size());
        self.write_to(&mut writer);
        writer.into_bytes()
    }

    pub fn to_object(&self) -> OutputObject {
        OutputObject {
            satoshis: self.satoshis,
            script: self.script.clone(),
        }
    }

    pub fn from_object(obj: &OutputObject) -> Self {
        Output::new(obj.script.clone(), obj.satoshis)
    }
}
