//! Structured snapshot form of a transaction and its parts.
//!
//! The snapshot keeps what the wire format drops: spent outputs, multisig
//! signing state, fee settings, and change tracking. Field names are
//! camelCase in JSON.

use serde::{Deserialize, Serialize};
use txkit_primitives::chainhash::Hash;
use txkit_primitives::ec::PublicKey;
use txkit_script::Script;

use crate::input::Input;
use crate::output::Output;
use crate::transaction::Transaction;
use crate::TransactionError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    pub version: i32,
    pub inputs: Vec<InputObject>,
    pub outputs: Vec<OutputObject>,
    #[serde(rename = "nLockTime")]
    pub n_lock_time: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_script: Option<Script>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_per_kb: Option<u64>,
}

/// An input with its spent output and, for multisig, its signing state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputObject {
    pub prev_tx_id: Hash,
    pub output_index: u32,
    pub sequence_number: u32,
    pub script: Script,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_keys: Option<Vec<PublicKey>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<usize>,
    /// One slot per public key, in key order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signatures: Option<Vec<Option<SignatureObject>>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputObject {
    pub satoshis: u64,
    pub script: Script,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureObject {
    pub public_key: PublicKey,
    pub prev_tx_id: Hash,
    pub output_index: u32,
    pub input_index: usize,
    /// DER hex, without the sighash byte.
    pub signature: String,
    pub sigtype: u32,
}

impl Transaction {
    pub fn to_object(&self) -> TransactionObject {
        TransactionObject {
            hash: Some(self.id()),
            version: self.version,
            inputs: self.inputs.iter().map(Input::to_object).collect(),
            outputs: self.outputs.iter().map(Output::to_object).collect(),
            n_lock_time: self.n_lock_time,
            change_script: self.change_script.clone(),
            change_index: self.change_index,
            fee: self.fee,
            fee_per_kb: self.fee_per_kb,
        }
    }

    /// Rebuild a transaction from its snapshot.
    ///
    /// Input kinds are re-derived from the embedded spent outputs. The change
    /// output and fee settings are restored as recorded, not recomputed, and
    /// must agree with the outputs. A recorded hash must match.
    pub fn from_object(obj: &TransactionObject) -> Result<Self, TransactionError> {
        let mut tx = Transaction::new();
        for input in &obj.inputs {
            tx.unchecked_add_input(Input::from_object(input)?)?;
        }
        for output in &obj.outputs {
            tx.push_output(Output::from_object(output));
        }
        tx.version = obj.version;
        tx.n_lock_time = obj.n_lock_time;
        tx.fee = obj.fee;
        tx.fee_per_kb = obj.fee_per_kb;
        tx.change_script = obj.change_script.clone();

        if let Some(index) = obj.change_index {
            let change_script = obj.change_script.as_ref().ok_or_else(|| {
                TransactionError::InvalidState("change index without change script".to_string())
            })?;
            let output = tx.outputs.get(index).ok_or_else(|| {
                TransactionError::InvalidState(format!(
                    "change index {} out of range ({} outputs)",
                    index,
                    tx.outputs.len()
                ))
            })?;
            if output.script != *change_script {
                return Err(TransactionError::InvalidState(
                    "change script does not match the output at the change index".to_string(),
                ));
            }
            tx.change_index = Some(index);
        }

        if let Some(hash) = &obj.hash {
            let actual = tx.id();
            if *hash != actual {
                return Err(TransactionError::InvalidState(format!(
                    "hash in object ({}) does not match transaction hash ({})",
                    hash, actual
                )));
            }
        }
        Ok(tx)
    }

    pub fn to_json(&self) -> Result<String, TransactionError> {
        serde_json::to_string(&self.to_object())
            .map_err(|e| TransactionError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, TransactionError> {
        let obj: TransactionObject = serde_json::from_str(json)
            .map_err(|e| TransactionError::Serialization(e.to_string()))?;
        Self::from_object(&obj)
    }
}
