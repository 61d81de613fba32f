/// Script type with template recognition and builders.
///
/// A `Script` wraps raw bytes. Recognisers inspect the bytes for the standard
/// locking (`*_out`) and unlocking (`*_in`) templates the transaction builder
/// dispatches on; builders produce those templates.

use std::fmt;

use txkit_primitives::ec::PublicKey;
use txkit_primitives::hash::hash160;

use crate::address::Address;
use crate::chunk::{decode_script, push_data_prefix, ScriptChunk};
use crate::opcodes::*;
use crate::ScriptError;

/// Largest number of keys a bare multisig template may hold.
pub const MAX_MULTISIG_KEYS: usize = 16;

/// A script, represented as a byte vector newtype.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Script(Vec<u8>);

impl Script {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    pub fn new() -> Self {
        Script(Vec::new())
    }

    /// Create a script from a hex string (e.g. "76a914...88ac").
    pub fn from_hex(hex_str: &str) -> Result<Self, ScriptError> {
        let bytes = hex::decode(hex_str).map_err(|e| ScriptError::InvalidHex(e.to_string()))?;
        Ok(Script(bytes))
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Script(bytes.to_vec())
    }

    // -----------------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------------

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn to_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Space-separated ASM rendering. Undecodable scripts render as raw hex.
    pub fn to_asm(&self) -> String {
        match self.chunks() {
            Ok(chunks) => chunks
                .iter()
                .map(ScriptChunk::to_asm_string)
                .collect::<Vec<_>>()
                .join(" "),
            Err(_) => self.to_hex(),
        }
    }

    pub fn chunks(&self) -> Result<Vec<ScriptChunk>, ScriptError> {
        decode_script(&self.0)
    }

    // -----------------------------------------------------------------------
    // Building
    // -----------------------------------------------------------------------

    /// Append a push of `data` with the minimal OP_PUSHDATA prefix.
    pub fn append_push_data(&mut self, data: &[u8]) -> Result<&mut Self, ScriptError> {
        let prefix = push_data_prefix(data.len())?;
        self.0.extend_from_slice(&prefix);
        self.0.extend_from_slice(data);
        Ok(self)
    }

    /// Append bare opcodes. Push opcodes must go through `append_push_data`.
    pub fn append_opcodes(&mut self, opcodes: &[u8]) -> Result<&mut Self, ScriptError> {
        if let Some(op) = opcodes
            .iter()
            .find(|op| (0x01..=OP_PUSHDATA4).contains(*op))
        {
            return Err(ScriptError::InvalidScript(format!(
                "use append_push_data for push opcode {}",
                opcode_to_string(*op)
            )));
        }
        self.0.extend_from_slice(opcodes);
        Ok(self)
    }

    /// OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY OP_CHECKSIG
    pub fn build_public_key_hash_out(pkh: &[u8; 20]) -> Self {
        let mut b = Vec::with_capacity(25);
        b.extend_from_slice(&[OP_DUP, OP_HASH160, OP_DATA_20]);
        b.extend_from_slice(pkh);
        b.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
        Script(b)
    }

    /// <pubkey> OP_CHECKSIG
    pub fn build_public_key_out(pub_key: &PublicKey) -> Self {
        let key = pub_key.to_bytes();
        let mut b = Vec::with_capacity(key.len() + 2);
        b.push(key.len() as u8);
        b.extend_from_slice(&key);
        b.push(OP_CHECKSIG);
        Script(b)
    }

    /// OP_HASH160 <hash160(redeem)> OP_EQUAL
    pub fn build_script_hash_out(redeem: &Script) -> Self {
        let mut b = Vec::with_capacity(23);
        b.extend_from_slice(&[OP_HASH160, OP_DATA_20]);
        b.extend_from_slice(&hash160(&redeem.0));
        b.push(OP_EQUAL);
        Script(b)
    }

    /// Standard output script paying to `address`.
    pub fn build_address_out(address: &Address) -> Self {
        address.to_script()
    }

    /// `threshold` <keys...> `n` OP_CHECKMULTISIG, keys in ascending hex order.
    pub fn build_multisig_out(
        pub_keys: &[PublicKey],
        threshold: usize,
    ) -> Result<Self, ScriptError> {
        let m = small_int_op(threshold);
        let n = small_int_op(pub_keys.len());
        let (m, n) = match (m, n) {
            (Some(m), Some(n))
                if threshold >= 1 && threshold <= pub_keys.len()
                    && pub_keys.len() <= MAX_MULTISIG_KEYS =>
            {
                (m, n)
            }
            _ => {
                return Err(ScriptError::InvalidThreshold {
                    threshold,
                    keys: pub_keys.len(),
                })
            }
        };

        let mut keys: Vec<Vec<u8>> = pub_keys.iter().map(PublicKey::to_bytes).collect();
        keys.sort();

        let mut script = Script::new();
        script.0.push(m);
        for key in &keys {
            script.append_push_data(key)?;
        }
        script.0.extend_from_slice(&[n, OP_CHECKMULTISIG]);
        Ok(script)
    }

    /// OP_FALSE OP_RETURN <data>. Empty data yields a bare OP_FALSE OP_RETURN.
    pub fn build_data_out(data: &[u8]) -> Result<Self, ScriptError> {
        let mut script = Script(vec![OP_FALSE, OP_RETURN]);
        if !data.is_empty() {
            script.append_push_data(data)?;
        }
        Ok(script)
    }

    /// <sig+sighash> <pubkey>
    pub fn build_public_key_hash_in(
        pub_key: &PublicKey,
        der_sig: &[u8],
        sighash_type: u8,
    ) -> Result<Self, ScriptError> {
        let mut script = Script::new();
        script.append_push_data(&with_sighash(der_sig, sighash_type))?;
        script.append_push_data(&pub_key.to_bytes())?;
        Ok(script)
    }

    /// <sig+sighash>
    pub fn build_public_key_in(der_sig: &[u8], sighash_type: u8) -> Result<Self, ScriptError> {
        let mut script = Script::new();
        script.append_push_data(&with_sighash(der_sig, sighash_type))?;
        Ok(script)
    }

    /// OP_0 <sig+sighash>... for a bare multisig spend.
    ///
    /// Each entry of `sigs` already carries its trailing sighash byte.
    pub fn build_multisig_in(sigs: &[Vec<u8>]) -> Result<Self, ScriptError> {
        let mut script = Script(vec![OP_0]);
        for sig in sigs {
            script.append_push_data(sig)?;
        }
        Ok(script)
    }

    /// OP_0 <sig+sighash>... <redeem script> for a P2SH multisig spend.
    pub fn build_p2sh_multisig_in(sigs: &[Vec<u8>], redeem: &Script) -> Result<Self, ScriptError> {
        let mut script = Self::build_multisig_in(sigs)?;
        script.append_push_data(&redeem.0)?;
        Ok(script)
    }

    // -----------------------------------------------------------------------
    // Classification
    // -----------------------------------------------------------------------

    pub fn is_public_key_hash_out(&self) -> bool {
        let b = &self.0;
        b.len() == 25
            && b[0] == OP_DUP
            && b[1] == OP_HASH160
            && b[2] == OP_DATA_20
            && b[23] == OP_EQUALVERIFY
            && b[24] == OP_CHECKSIG
    }

    /// <sig> <pubkey>
    pub fn is_public_key_hash_in(&self) -> bool {
        match self.chunks().as_deref() {
            Ok([sig, key]) => is_signature_push(sig) && is_public_key_push(key),
            _ => false,
        }
    }

    /// <pubkey> OP_CHECKSIG
    pub fn is_public_key_out(&self) -> bool {
        match self.chunks().as_deref() {
            Ok([key, check]) => is_public_key_push(key) && check.op == OP_CHECKSIG,
            _ => false,
        }
    }

    /// <sig>
    pub fn is_public_key_in(&self) -> bool {
        match self.chunks().as_deref() {
            Ok([sig]) => is_signature_push(sig),
            _ => false,
        }
    }

    pub fn is_script_hash_out(&self) -> bool {
        let b = &self.0;
        b.len() == 23 && b[0] == OP_HASH160 && b[1] == OP_DATA_20 && b[22] == OP_EQUAL
    }

    /// M <pubkey>... N OP_CHECKMULTISIG with 1 <= M <= N and N matching the key count.
    pub fn is_multisig_out(&self) -> bool {
        self.multisig_parts().is_some()
    }

    /// OP_RETURN or OP_FALSE OP_RETURN followed by anything.
    pub fn is_data_out(&self) -> bool {
        let b = &self.0;
        (!b.is_empty() && b[0] == OP_RETURN)
            || (b.len() >= 2 && b[0] == OP_FALSE && b[1] == OP_RETURN)
    }

    // -----------------------------------------------------------------------
    // Extraction
    // -----------------------------------------------------------------------

    /// The 20-byte hash of a P2PKH output script.
    pub fn public_key_hash(&self) -> Result<[u8; 20], ScriptError> {
        if !self.is_public_key_hash_out() {
            return Err(ScriptError::TemplateMismatch("a P2PKH output"));
        }
        let mut out = [0u8; 20];
        out.copy_from_slice(&self.0[3..23]);
        Ok(out)
    }

    /// The 20-byte script hash of a P2SH output script.
    pub fn script_hash(&self) -> Result<[u8; 20], ScriptError> {
        if !self.is_script_hash_out() {
            return Err(ScriptError::TemplateMismatch("a P2SH output"));
        }
        let mut out = [0u8; 20];
        out.copy_from_slice(&self.0[2..22]);
        Ok(out)
    }

    /// The key of a P2PK output script.
    pub fn public_key(&self) -> Result<PublicKey, ScriptError> {
        if !self.is_public_key_out() {
            return Err(ScriptError::TemplateMismatch("a P2PK output"));
        }
        let len = self.0[0] as usize;
        Ok(PublicKey::from_bytes(&self.0[1..1 + len])?)
    }

    /// Threshold and keys of a bare multisig output script.
    pub fn multisig_public_keys(&self) -> Result<(usize, Vec<PublicKey>), ScriptError> {
        let (threshold, keys) = self
            .multisig_parts()
            .ok_or(ScriptError::TemplateMismatch("a multisig output"))?;
        let keys = keys
            .iter()
            .map(|k| PublicKey::from_bytes(k))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((threshold, keys))
    }

    fn multisig_parts(&self) -> Option<(usize, Vec<Vec<u8>>)> {
        let chunks = self.chunks().ok()?;
        if chunks.len() < 4 {
            return None;
        }
        let last = chunks.len() - 1;
        if chunks[last].op != OP_CHECKMULTISIG {
            return None;
        }
        let m = small_int_value(chunks[0].op)?;
        let n = small_int_value(chunks[last - 1].op)?;
        let keys: Vec<Vec<u8>> = chunks[1..last - 1]
            .iter()
            .map(|c| c.data.clone().filter(|d| !d.is_empty()))
            .collect::<Option<_>>()?;
        if m == 0 || m > n || n != keys.len() {
            return None;
        }
        Some((m, keys))
    }
}

/// A DER signature followed by its sighash byte.
fn with_sighash(der_sig: &[u8], sighash_type: u8) -> Vec<u8> {
    let mut buf = Vec::with_capacity(der_sig.len() + 1);
    buf.extend_from_slice(der_sig);
    buf.push(sighash_type);
    buf
}

/// A pushed DER signature with its trailing sighash byte.
fn is_signature_push(chunk: &ScriptChunk) -> bool {
    match &chunk.data {
        Some(d) => (9..=73).contains(&d.len()) && d[0] == 0x30,
        None => false,
    }
}

/// A pushed SEC1 key with a well-formed prefix byte.
fn is_public_key_push(chunk: &ScriptChunk) -> bool {
    match chunk.data.as_deref() {
        Some([0x04, rest @ ..]) => rest.len() == 64,
        Some([0x02 | 0x03, rest @ ..]) => rest.len() == 32,
        _ => false,
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Script({})", self.to_asm())
    }
}

impl From<Vec<u8>> for Script {
    fn from(bytes: Vec<u8>) -> Self {
        Script(bytes)
    }
}

impl serde::Serialize for Script {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Script {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Script::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
