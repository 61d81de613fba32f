/// Base58Check addresses.
///
/// Supports P2PKH and P2SH addresses on mainnet and testnet, parsing,
/// encoding, and conversion to the matching output script.

use std::fmt;
use std::str::FromStr;

use txkit_primitives::ec::PublicKey;
use txkit_primitives::hash::{hash160, sha256d};

use crate::opcodes::{OP_DATA_20, OP_EQUAL, OP_HASH160};
use crate::script::Script;
use crate::ScriptError;

const MAINNET_P2PKH: u8 = 0x00;
const TESTNET_P2PKH: u8 = 0x6f;
const MAINNET_P2SH: u8 = 0x05;
const TESTNET_P2SH: u8 = 0xc4;

/// Network type for address prefix selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Network {
    /// Mainnet (P2PKH addresses start with '1').
    Mainnet,
    /// Testnet (P2PKH addresses start with 'm' or 'n').
    Testnet,
}

/// What an address' 20-byte hash commits to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressType {
    PublicKeyHash,
    ScriptHash,
}

/// A decoded Base58Check address.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Address {
    /// RIPEMD-160(SHA-256(..)) of the public key or redeem script.
    pub hash: [u8; 20],
    pub network: Network,
    pub address_type: AddressType,
}

impl Address {
    /// Parse a Base58Check address string, validating its checksum and
    /// version byte.
    pub fn from_string(addr: &str) -> Result<Self, ScriptError> {
        let decoded = bs58::decode(addr)
            .into_vec()
            .map_err(|_| ScriptError::InvalidAddress(format!("bad char for '{}'", addr)))?;

        if decoded.len() != 25 {
            return Err(ScriptError::InvalidAddressLength(addr.to_string()));
        }

        let checksum = sha256d(&decoded[..21]);
        if decoded[21..25] != checksum[..4] {
            return Err(ScriptError::EncodingChecksumFailed);
        }

        let (network, address_type) = match decoded[0] {
            MAINNET_P2PKH => (Network::Mainnet, AddressType::PublicKeyHash),
            TESTNET_P2PKH => (Network::Testnet, AddressType::PublicKeyHash),
            MAINNET_P2SH => (Network::Mainnet, AddressType::ScriptHash),
            TESTNET_P2SH => (Network::Testnet, AddressType::ScriptHash),
            _ => return Err(ScriptError::UnsupportedAddress(addr.to_string())),
        };

        let mut hash = [0u8; 20];
        hash.copy_from_slice(&decoded[1..21]);
        Ok(Address {
            hash,
            network,
            address_type,
        })
    }

    pub fn from_public_key_hash(hash: &[u8; 20], network: Network) -> Self {
        Address {
            hash: *hash,
            network,
            address_type: AddressType::PublicKeyHash,
        }
    }

    /// P2PKH address of `pub_key` in its own (compressed or not) encoding.
    pub fn from_public_key(pub_key: &PublicKey, network: Network) -> Self {
        Self::from_public_key_hash(&pub_key.hash160(), network)
    }

    pub fn from_script_hash(hash: &[u8; 20], network: Network) -> Self {
        Address {
            hash: *hash,
            network,
            address_type: AddressType::ScriptHash,
        }
    }

    /// P2SH address committing to `redeem`.
    pub fn from_redeem_script(redeem: &Script, network: Network) -> Self {
        Self::from_script_hash(&hash160(redeem.to_bytes()), network)
    }

    fn version(&self) -> u8 {
        match (self.address_type, self.network) {
            (AddressType::PublicKeyHash, Network::Mainnet) => MAINNET_P2PKH,
            (AddressType::PublicKeyHash, Network::Testnet) => TESTNET_P2PKH,
            (AddressType::ScriptHash, Network::Mainnet) => MAINNET_P2SH,
            (AddressType::ScriptHash, Network::Testnet) => TESTNET_P2SH,
        }
    }

    /// The output script paying to this address.
    pub fn to_script(&self) -> Script {
        match self.address_type {
            AddressType::PublicKeyHash => Script::build_public_key_hash_out(&self.hash),
            AddressType::ScriptHash => {
                let mut b = Vec::with_capacity(23);
                b.extend_from_slice(&[OP_HASH160, OP_DATA_20]);
                b.extend_from_slice(&self.hash);
                b.push(OP_EQUAL);
                Script::from(b)
            }
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut payload = Vec::with_capacity(25);
        payload.push(self.version());
        payload.extend_from_slice(&self.hash);
        let checksum = sha256d(&payload);
        payload.extend_from_slice(&checksum[..4]);
        write!(f, "{}", bs58::encode(&payload).into_string())
    }
}

impl FromStr for Address {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::from_string(s)
    }
}
