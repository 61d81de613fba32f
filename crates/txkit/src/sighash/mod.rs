//! Signature hash computation for transaction signing.
//!
//! Uses the BIP-143-style digest with the FORKID flag for replay protection.
//! The digest commits to the value being spent and to a script code: the
//! spent output script, or the redeem script for a P2SH spend.
//!
//! See <https://github.com/bitcoin-sv/bitcoin-sv/blob/master/doc/abc/replay-protected-sighash.md#digest-algorithm>

use txkit_primitives::ec::{PrivateKey, PublicKey, Signature};
use txkit_primitives::hash::sha256d;
use txkit_primitives::util::ByteWriter;
use txkit_script::Script;

use crate::transaction::Transaction;
use crate::TransactionError;

// -----------------------------------------------------------------------
// Sighash flag constants
// -----------------------------------------------------------------------

pub const SIGHASH_ALL: u32 = 0x01;
pub const SIGHASH_NONE: u32 = 0x02;
pub const SIGHASH_SINGLE: u32 = 0x03;
pub const SIGHASH_ANYONECANPAY: u32 = 0x80;

/// Replay-protection flag required on every signature.
pub const SIGHASH_FORKID: u32 = 0x40;

/// Default sighash type: ALL | FORKID.
pub const SIGHASH_ALL_FORKID: u32 = SIGHASH_ALL | SIGHASH_FORKID;

/// Mask applied to extract the base sighash type (ALL, NONE, SINGLE).
pub const SIGHASH_MASK: u32 = 0x1f;

// -----------------------------------------------------------------------
// Digest
// -----------------------------------------------------------------------

/// Compute the digest signed for input `input_index`.
///
/// # Arguments
/// * `tx`           - The transaction being signed.
/// * `input_index`  - Index of the input being signed.
/// * `script_code`  - The script being satisfied.
/// * `satoshis`     - Value of the output being spent.
/// * `sighash_type` - Combined sighash flags (e.g. `SIGHASH_ALL_FORKID`).
pub fn signature_hash(
    tx: &Transaction,
    input_index: usize,
    script_code: &Script,
    satoshis: u64,
    sighash_type: u32,
) -> Result<[u8; 32], TransactionError> {
    let preimage = calc_preimage(tx, input_index, script_code, satoshis, sighash_type)?;
    Ok(sha256d(&preimage))
}

/// Build the preimage that `signature_hash` double-hashes.
///
/// Layout: nVersion | hashPrevouts | hashSequence | outpoint | scriptCode |
/// value | nSequence | hashOutputs | nLockTime | sighashType.
pub fn calc_preimage(
    tx: &Transaction,
    input_index: usize,
    script_code: &Script,
    satoshis: u64,
    sighash_type: u32,
) -> Result<Vec<u8>, TransactionError> {
    let inputs = tx.inputs();
    let input = inputs.get(input_index).ok_or(TransactionError::InvalidIndex {
        index: input_index,
        len: inputs.len(),
    })?;

    let anyone_can_pay = sighash_type & SIGHASH_ANYONECANPAY != 0;
    let base_type = sighash_type & SIGHASH_MASK;
    let single_or_none = base_type == SIGHASH_SINGLE || base_type == SIGHASH_NONE;

    let hash_prevouts = if anyone_can_pay { [0u8; 32] } else { prevouts_hash(tx) };

    let hash_sequence = if anyone_can_pay || single_or_none {
        [0u8; 32]
    } else {
        sequence_hash(tx)
    };

    let hash_outputs = if !single_or_none {
        outputs_hash(tx, None)
    } else if base_type == SIGHASH_SINGLE && input_index < tx.outputs().len() {
        outputs_hash(tx, Some(input_index))
    } else {
        [0u8; 32]
    };

    let mut writer = ByteWriter::with_capacity(156 + script_code.len());
    writer.write_i32_le(tx.version);
    writer.write_bytes(&hash_prevouts);
    writer.write_bytes(&hash_sequence);
    writer.write_bytes(input.prev_tx_id.as_bytes());
    writer.write_u32_le(input.output_index);
    writer.write_var_bytes(script_code.to_bytes());
    writer.write_u64_le(satoshis);
    writer.write_u32_le(input.sequence_number);
    writer.write_bytes(&hash_outputs);
    writer.write_u32_le(tx.n_lock_time);
    writer.write_u32_le(sighash_type);

    Ok(writer.into_bytes())
}

// -----------------------------------------------------------------------
// Sign / verify
// -----------------------------------------------------------------------

/// Sign input `input_index` with `key`.
pub fn sign(
    tx: &Transaction,
    key: &PrivateKey,
    input_index: usize,
    script_code: &Script,
    satoshis: u64,
    sighash_type: u32,
) -> Result<Signature, TransactionError> {
    let digest = signature_hash(tx, input_index, script_code, satoshis, sighash_type)?;
    Ok(key.sign(&digest)?)
}

/// Check `signature` by `pub_key` over input `input_index`.
pub fn verify(
    tx: &Transaction,
    signature: &Signature,
    pub_key: &PublicKey,
    input_index: usize,
    script_code: &Script,
    satoshis: u64,
    sighash_type: u32,
) -> Result<bool, TransactionError> {
    let digest = signature_hash(tx, input_index, script_code, satoshis, sighash_type)?;
    Ok(pub_key.verify(&digest, signature))
}

// -----------------------------------------------------------------------
// Internal helper functions
// -----------------------------------------------------------------------

/// sha256d over every outpoint (txid + vout).
fn prevouts_hash(tx: &Transaction) -> [u8; 32] {
    let mut writer = ByteWriter::with_capacity(tx.inputs().len() * 36);
    for input in tx.inputs() {
        writer.write_bytes(input.prev_tx_id.as_bytes());
        writer.write_u32_le(input.output_index);
    }
    sha256d(writer.as_bytes())
}

/// sha256d over every input sequence number.
fn sequence_hash(tx: &Transaction) -> [u8; 32] {
    let mut writer = ByteWriter::with_capacity(tx.inputs().len() * 4);
    for input in tx.inputs() {
        writer.write_u32_le(input.sequence_number);
    }
    sha256d(writer.as_bytes())
}

/// sha256d over all serialized outputs, or only output `n` (SIGHASH_SINGLE).
fn outputs_hash(tx: &Transaction, n: Option<usize>) -> [u8; 32] {
    let mut writer = ByteWriter::new();
    match n {
        None => tx.outputs().iter().for_each(|o| o.write_to(&mut writer)),
        Some(i) => tx.outputs()[i].write_to(&mut writer),
    }
    sha256d(writer.as_bytes())
}
