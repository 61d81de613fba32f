//! Funding descriptor for a previously created output.

use serde::{Deserialize, Serialize};
use txkit_primitives::chainhash::Hash;
use txkit_script::Script;

use crate::output::Output;

/// An unspent output a transaction can fund itself from.
///
/// Deserializes from the usual wallet/explorer shapes: `txId` or `txid`,
/// `outputIndex` or `vout`, `script` or `scriptPubKey`, and `satoshis`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnspentOutput {
    #[serde(alias = "txid", alias = "prevTxId")]
    pub tx_id: Hash,
    #[serde(alias = "vout")]
    pub output_index: u32,
    #[serde(alias = "scriptPubKey")]
    pub script: Script,
    pub satoshis: u64,
}

impl UnspentOutput {
    pub fn new(tx_id: Hash, output_index: u32, script: Script, satoshis: u64) -> Self {
        UnspentOutput {
            tx_id,
            output_index,
            script,
            satoshis,
        }
    }

    /// The output being spent.
    pub fn to_output(&self) -> Output {
        Output::new(self.script.clone(), self.satoshis)
    }
}
