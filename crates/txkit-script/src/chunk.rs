//! Script chunk parsing and push-data encoding.

use txkit_primitives::util::ByteReader;

use crate::opcodes::*;
use crate::ScriptError;

/// One parsed element of a script: an opcode, or a push with its payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptChunk {
    /// The opcode byte. For direct pushes (1-75 bytes) this is the length.
    pub op: u8,
    pub data: Option<Vec<u8>>,
}

impl ScriptChunk {
    /// True when the chunk carries pushed bytes.
    pub fn is_push(&self) -> bool {
        self.data.is_some()
    }

    /// ASM token: hex for pushes, the opcode name otherwise.
    pub fn to_asm_string(&self) -> String {
        match &self.data {
            Some(data) => hex::encode(data),
            None => opcode_to_string(self.op),
        }
    }
}

/// Decode raw script bytes into chunks.
///
/// Fails with `DataTooSmall` when a push runs past the end of the script.
pub fn decode_script(bytes: &[u8]) -> Result<Vec<ScriptChunk>, ScriptError> {
    let mut reader = ByteReader::new(bytes);
    let mut chunks = Vec::new();

    while reader.remaining() > 0 {
        let op = reader.read_u8().map_err(|_| ScriptError::DataTooSmall)?;
        let len = match op {
            0x01..=0x4b => Some(op as usize),
            OP_PUSHDATA1 => Some(reader.read_u8().map_err(|_| ScriptError::DataTooSmall)? as usize),
            OP_PUSHDATA2 => {
                Some(reader.read_u16_le().map_err(|_| ScriptError::DataTooSmall)? as usize)
            }
            OP_PUSHDATA4 => {
                Some(reader.read_u32_le().map_err(|_| ScriptError::DataTooSmall)? as usize)
            }
            _ => None,
        };
        let data = match len {
            Some(n) => Some(
                reader
                    .read_bytes(n)
                    .map_err(|_| ScriptError::DataTooSmall)?
                    .to_vec(),
            ),
            None => None,
        };
        chunks.push(ScriptChunk { op, data });
    }

    Ok(chunks)
}

/// The OP_PUSHDATA prefix for a payload of `data_len` bytes.
pub fn push_data_prefix(data_len: usize) -> Result<Vec<u8>, ScriptError> {
    if data_len <= 75 {
        Ok(vec![data_len as u8])
    } else if data_len <= 0xff {
        Ok(vec![OP_PUSHDATA1, data_len as u8])
    } else if data_len <= 0xffff {
        let mut buf = vec![OP_PUSHDATA2];
        buf.extend_from_slice(&(data_len as u16).to_le_bytes());
        Ok(buf)
    } else if data_len <= 0xffff_ffff {
        let mut buf = vec![OP_PUSHDATA4];
        buf.extend_from_slice(&(data_len as u32).to_le_bytes());
        Ok(buf)
    } else {
        Err(ScriptError::DataTooBig)
    }
}
