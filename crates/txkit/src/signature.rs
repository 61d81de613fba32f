//! Per-input signature descriptor produced by signing and consumed by
//! `Transaction::apply_signature`.

use txkit_primitives::chainhash::Hash;
use txkit_primitives::ec::{PublicKey, Signature};

use crate::snapshot::SignatureObject;
use crate::TransactionError;

/// A signature over one input, with everything needed to place and check it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionSignature {
    pub public_key: PublicKey,
    pub prev_tx_id: Hash,
    pub output_index: u32,
    pub input_index: usize,
    pub signature: Signature,
    pub sighash_type: u32,
}

impl TransactionSignature {
    /// DER signature followed by the sighash byte, as pushed in an unlock script.
    pub fn to_tx_format(&self) -> Vec<u8> {
        let mut buf = self.signature.to_der();
        buf.push(self.sighash_type as u8);
        buf
    }

    pub fn to_object(&self) -> SignatureObject {
        SignatureObject {
            public_key: self.public_key.clone(),
            prev_tx_id: self.prev_tx_id,
            output_index: self.output_index,
            input_index: self.input_index,
            signature: self.signature.to_der_hex(),
            sigtype: self.sighash_type,
        }
    }

    pub fn from_object(obj: &SignatureObject) -> Result<Self, TransactionError> {
        Ok(TransactionSignature {
            public_key: obj.public_key.clone(),
            prev_tx_id: obj.prev_tx_id,
            output_index: obj.output_index,
            input_index: obj.input_index,
            signature: Signature::from_der_hex(&obj.signature)?,
            sighash_type: obj.sigtype,
        })
    }
}
