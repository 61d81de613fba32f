//! Transaction-level tests: wire vectors, funding, fee and change, signing,
//! serialization checks, sanity checks, ordering, lock time, and snapshots.

use txkit_primitives::chainhash::Hash;
use txkit_primitives::ec::{PrivateKey, PublicKey};
use txkit_script::{Address, Network, Script};

use crate::config::DUST_AMOUNT;
use crate::input::{Input, InputKind, DEFAULT_LOCKTIME_SEQNUMBER, DEFAULT_RBF_SEQNUMBER};
use crate::output::Output;
use crate::serialize::SerializeOptions;
use crate::transaction::Transaction;
use crate::unspent::UnspentOutput;
use crate::verify::SanityError;
use crate::{LockTime, TransactionError};

// -----------------------------------------------------------------------
// Vectors
// -----------------------------------------------------------------------

const SOURCE_RAW_TX: &str = "010000000138c7c61c14ffb063c3bb2664041a3e29ea6ea0412a0c18ff725ba4e9e12afae2030000006a47304402203e9ab8e4c14addf3b4741540b556cfb0e0efb67dc1a7b5ce84c3ac56b3fd447802203c9f49f7bd893ebd7060176dfc36bcaff9d2c443d9a0dd6cd2d59b372c024d20412102798913bc057b344de675dac34faafe3dc2f312c758cd9068209f810877306d66ffffffff02dc050000000000002076a914eb0bd5edba389198e73f8efabddfc61666969ff788ac6a0568656c6c6faa0d0000000000001976a914eb0bd5edba389198e73f8efabddfc61666969ff788ac00000000";

const COINBASE_TX_HEX: &str = "01000000010000000000000000000000000000000000000000000000000000000000000000ffffffff17033f250d2f43555656452f2c903fb60859897700d02700ffffffff01d864a012000000001976a914d648686cf603c11850f39600e37312738accca8f88ac00000000";

const MULTI_INPUT_TX_HEX: &str = "0200000003a9bc457fdc6a54d99300fb137b23714d860c350a9d19ff0f571e694a419ff3a0010000006b48304502210086c83beb2b2663e4709a583d261d75be538aedcafa7766bd983e5c8db2f8b2fc02201a88b178624ab0ad1748b37c875f885930166237c88f5af78ee4e61d337f935f412103e8be830d98bb3b007a0343ee5c36daa48796ae8bb57946b1e87378ad6e8a090dfeffffff0092bb9a47e27bf64fc98f557c530c04d9ac25e2f2a8b600e92a0b1ae7c89c20010000006b483045022100f06b3db1c0a11af348401f9cebe10ae2659d6e766a9dcd9e3a04690ba10a160f02203f7fbd7dfcfc70863aface1a306fcc91bbadf6bc884c21a55ef0d32bd6b088c8412103e8be830d98bb3b007a0343ee5c36daa48796ae8bb57946b1e87378ad6e8a090dfeffffff9d0d4554fa692420a0830ca614b6c60f1bf8eaaa21afca4aa8c99fb052d9f398000000006b483045022100d920f2290548e92a6235f8b2513b7f693a64a0d3fa699f81a034f4b4608ff82f0220767d7d98025aff3c7bd5f2a66aab6a824f5990392e6489aae1e1ae3472d8dffb412103e8be830d98bb3b007a0343ee5c36daa48796ae8bb57946b1e87378ad6e8a090dfeffffff02807c814a000000001976a9143a6bf34ebfcf30e8541bbb33a7882845e5a29cb488ac76b0e60e000000001976a914bd492b67f90cb85918494767ebb23102c4f06b7088ac67000000";

/// Unsigned spend of a P2PKH output worth 1 BSV, and the same transaction
/// signed with `SIGNING_WIF`.
const UNSIGNED_TX_HEX: &str = "010000000193a35408b6068499e0d5abd799d3e827d9bfe70c9b75ebe209c91d25072326510000000000ffffffff02404b4c00000000001976a91404ff367be719efa79d76e4416ffb072cd53b208888acde94a905000000001976a91404d03f746652cfcb6cb55119ab473a045137d26588ac00000000";
const SIGNED_TX_HEX: &str = "010000000193a35408b6068499e0d5abd799d3e827d9bfe70c9b75ebe209c91d2507232651000000006b483045022100c1d77036dc6cd1f3fa1214b0688391ab7f7a16cd31ea4e5a1f7a415ef167df820220751aced6d24649fa235132f1e6969e163b9400f80043a72879237dab4a1190ad412103b8b40a84123121d260f5c109bc5a46ec819c2e4002e5ba08638783bfb4e01435ffffffff02404b4c00000000001976a91404ff367be719efa79d76e4416ffb072cd53b208888acde94a905000000001976a91404d03f746652cfcb6cb55119ab473a045137d26588ac00000000";
const SIGNING_WIF: &str = "cNGwGSc7KRrTmdLUZ54fiSXWbhLNDc2Eg5zNucgQxyQCzuQ5YRDq";
const SPENT_SCRIPT: &str = "76a914c0a3c167a28cabb9fbb495affa0761e6e74ac60d88ac";

const PREV_TX: &str = "a477af6b2667c29670467e4e0728b685ee07b240235771862318e29ddbe58458";

// -----------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn key(n: u8) -> PrivateKey {
    let mut bytes = [0u8; 32];
    bytes[31] = n;
    PrivateKey::from_bytes(&bytes).unwrap()
}

fn address_of(key: &PrivateKey) -> Address {
    Address::from_public_key(&key.pub_key(), Network::Testnet)
}

fn p2pkh_utxo(key: &PrivateKey, output_index: u32, satoshis: u64) -> UnspentOutput {
    UnspentOutput::new(
        Hash::from_hex(PREV_TX).unwrap(),
        output_index,
        address_of(key).to_script(),
        satoshis,
    )
}

/// 1,000,000 in, 700,000 out, change back to the funding key.
fn funded_tx() -> Transaction {
    let from = key(1);
    let mut tx = Transaction::new();
    tx.from(p2pkh_utxo(&from, 0, 1_000_000))
        .unwrap()
        .to(&address_of(&key(2)), 700_000)
        .unwrap()
        .change(&address_of(&from))
        .unwrap();
    tx
}

// -----------------------------------------------------------------------
// Wire format
// -----------------------------------------------------------------------

#[test]
fn test_from_hex_roundtrip() {
    let tx = Transaction::from_hex(SOURCE_RAW_TX).unwrap();
    assert_eq!(tx.version, 1);
    assert_eq!(tx.inputs().len(), 1);
    assert_eq!(tx.outputs().len(), 2);
    assert_eq!(tx.n_lock_time, 0);
    assert_eq!(tx.to_hex(), SOURCE_RAW_TX);
    assert_eq!(tx.to_string(), SOURCE_RAW_TX);
}

#[test]
fn test_multi_input_roundtrip() {
    let tx = Transaction::from_hex(MULTI_INPUT_TX_HEX).unwrap();
    assert_eq!(tx.version, 2);
    assert_eq!(tx.inputs().len(), 3);
    assert_eq!(tx.outputs().len(), 2);
    assert_eq!(tx.n_lock_time, 103);
    assert_eq!(tx.to_hex(), MULTI_INPUT_TX_HEX);
    assert!(tx.inputs().iter().all(|i| !i.is_final()));
}

#[test]
fn test_malformed_bytes_rejected() {
    assert!(Transaction::from_hex(&format!("{}deadbeef", SOURCE_RAW_TX)).is_err());
    assert!(Transaction::from_hex(&SOURCE_RAW_TX[..SOURCE_RAW_TX.len() - 2]).is_err());
    assert!(Transaction::from_hex("not hex").is_err());
    assert!(Transaction::from_bytes(&[]).is_err());
}

#[test]
fn test_identity() {
    let tx = Transaction::from_hex(SOURCE_RAW_TX).unwrap();
    let mut reversed = tx.tx_id();
    reversed.reverse();
    assert_eq!(tx.id(), hex::encode(reversed));
    assert_eq!(tx.hash().to_string(), tx.id());
    assert_eq!(format!("{:?}", tx), format!("Transaction({})", tx.id()));

    let copy = tx.shallow_copy().unwrap();
    assert_eq!(copy.hash(), tx.hash());
}

#[test]
fn test_parsed_inputs_are_unclassified() {
    let tx = Transaction::from_hex(SOURCE_RAW_TX).unwrap();
    assert_eq!(*tx.inputs()[0].kind(), InputKind::Unclassified);
    assert!(!tx.has_all_utxo_info());
    assert!(matches!(
        tx.is_fully_signed(),
        Err(TransactionError::UnableToVerifySignature { index: 0 })
    ));
    assert!(matches!(
        tx.input_amount(),
        Err(TransactionError::MissingPreviousOutput { index: 0 })
    ));
}

#[test]
fn test_coinbase() {
    let tx = Transaction::from_hex(COINBASE_TX_HEX).unwrap();
    assert!(tx.is_coinbase());
    assert_eq!(tx.get_fee().unwrap(), 0);
    assert_eq!(tx.verify(), Ok(()));
    assert!(!Transaction::from_hex(SOURCE_RAW_TX).unwrap().is_coinbase());
}

// -----------------------------------------------------------------------
// Funding and outputs
// -----------------------------------------------------------------------

#[test]
fn test_from_skips_duplicate_outpoint() {
    let k = key(1);
    let mut tx = Transaction::new();
    tx.from_many(vec![
        p2pkh_utxo(&k, 0, 1000),
        p2pkh_utxo(&k, 0, 1000),
        p2pkh_utxo(&k, 1, 2000),
    ])
    .unwrap();
    assert_eq!(tx.inputs().len(), 2);
    assert_eq!(tx.input_amount().unwrap(), 3000);
    assert_eq!(*tx.inputs()[0].kind(), InputKind::PublicKeyHash);
}

#[test]
fn test_add_input_needs_spent_output() {
    let mut tx = Transaction::new();
    let input = Input::new(Hash::from_hex(PREV_TX).unwrap(), 0);
    assert!(matches!(
        tx.add_input(input.clone(), None, Some(1000)),
        Err(TransactionError::NeedMoreInfo(_))
    ));
    tx.add_input(input, Some(address_of(&key(1)).to_script()), Some(1000))
        .unwrap();
    assert_eq!(*tx.inputs()[0].kind(), InputKind::PublicKeyHash);
    assert_eq!(tx.input_amount().unwrap(), 1000);
}

#[test]
fn test_remove_input_and_output() {
    let k = key(1);
    let mut tx = Transaction::new();
    tx.from(p2pkh_utxo(&k, 0, 1000))
        .unwrap()
        .from(p2pkh_utxo(&k, 1, 2000))
        .unwrap()
        .to(&address_of(&k), 500)
        .unwrap();

    assert!(matches!(
        tx.remove_output(3),
        Err(TransactionError::InvalidIndex { index: 3, len: 1 })
    ));
    tx.remove_input_by_outpoint(&Hash::from_hex(PREV_TX).unwrap(), 0)
        .unwrap();
    assert_eq!(tx.inputs().len(), 1);
    assert_eq!(tx.input_amount().unwrap(), 2000);
    assert!(tx.remove_input_by_outpoint(&Hash::default(), 0).is_err());

    tx.remove_output(0).unwrap();
    assert_eq!(tx.output_amount(), 0);
    assert!(tx.remove_input(5).is_err());
}

#[test]
fn test_add_data() {
    let mut tx = Transaction::new();
    tx.add_data(b"hello").unwrap();
    let output = &tx.outputs()[0];
    assert_eq!(output.satoshis, 0);
    assert!(output.is_data_out());
    assert_eq!(output.script.to_hex(), "006a0568656c6c6f");
}

#[test]
fn test_to_rejects_invalid_amount() {
    let mut tx = Transaction::new();
    assert!(matches!(
        tx.to(&address_of(&key(1)), u64::MAX),
        Err(TransactionError::InvalidArgument(_))
    ));
    tx.add_output(Output::new(Script::new(), u64::MAX)).unwrap();
    assert!(tx.invalid_satoshis());
}

// -----------------------------------------------------------------------
// Fee and change
// -----------------------------------------------------------------------

#[test]
fn test_change_output_at_default_rate() {
    init_tracing();
    let tx = funded_tx();
    // 26 + 148 + 34 = 208 bytes, plus the change allowance: one kilobyte.
    assert_eq!(tx.get_fee().unwrap(), 100_000);
    assert_eq!(tx.change_index(), Some(1));
    let change = tx.get_change_output().unwrap();
    assert_eq!(change.satoshis, 200_000);
    assert_eq!(change.script, address_of(&key(1)).to_script());
    assert_eq!(tx.unspent_value().unwrap(), 100_000);
}

#[test]
fn test_fee_override_moves_change() {
    let mut tx = funded_tx();
    tx.fee(1_000).unwrap();
    assert_eq!(tx.get_fee().unwrap(), 1_000);
    assert_eq!(tx.get_change_output().unwrap().satoshis, 299_000);

    tx.fee_per_kb(500).unwrap();
    assert_eq!(tx.get_fee().unwrap(), 1_000);
    assert_eq!(tx.get_fee_per_kb(), 500);
}

#[test]
fn test_fee_per_kb_drives_estimate() {
    let mut tx = funded_tx();
    tx.fee_per_kb(1_000).unwrap();
    assert_eq!(tx.get_fee().unwrap(), 1_000);
    assert_eq!(tx.get_change_output().unwrap().satoshis, 299_000);
}

#[test]
fn test_no_change_when_nothing_left() {
    let from = key(1);
    let mut tx = Transaction::new();
    tx.from(p2pkh_utxo(&from, 0, 150_000))
        .unwrap()
        .to(&address_of(&key(2)), 100_000)
        .unwrap()
        .change(&address_of(&from))
        .unwrap();
    assert_eq!(tx.change_index(), None);
    assert_eq!(tx.outputs().len(), 1);
}

#[test]
fn test_fee_without_change_is_unspent_value() {
    let mut tx = Transaction::new();
    tx.from(p2pkh_utxo(&key(1), 0, 10_000))
        .unwrap()
        .to(&address_of(&key(2)), 9_000)
        .unwrap();
    assert_eq!(tx.get_fee().unwrap(), 1_000);

    tx.to(&address_of(&key(2)), 5_000).unwrap();
    assert!(matches!(
        tx.get_fee(),
        Err(TransactionError::InvalidOutputAmountSum { .. })
    ));
}

#[test]
fn test_removing_change_output_clears_index() {
    let mut tx = funded_tx();
    tx.remove_output(0).unwrap();
    // Change was recomputed after the payment left.
    assert_eq!(tx.change_index(), Some(0));
    assert_eq!(tx.get_change_output().unwrap().satoshis, 900_000);
}

#[test]
fn test_clear_outputs() {
    let mut tx = funded_tx();
    tx.sign(&[key(1)]).unwrap();
    tx.clear_outputs().unwrap();
    assert!(!tx.is_fully_signed().unwrap());
    // Only the change output remains.
    assert_eq!(tx.outputs().len(), 1);
    assert_eq!(tx.change_index(), Some(0));
}

// -----------------------------------------------------------------------
// Signing
// -----------------------------------------------------------------------

#[test]
fn test_p2pkh_sign_exact_match() {
    let unsigned = Transaction::from_hex(UNSIGNED_TX_HEX).unwrap();
    let prev = &unsigned.inputs()[0];

    let mut tx = Transaction::new();
    tx.from(UnspentOutput::new(
        prev.prev_tx_id,
        prev.output_index,
        Script::from_hex(SPENT_SCRIPT).unwrap(),
        100_000_000,
    ))
    .unwrap();
    for output in unsigned.outputs() {
        tx.add_output(output.clone()).unwrap();
    }
    assert_eq!(tx.to_hex(), UNSIGNED_TX_HEX);
    assert!(!tx.is_fully_signed().unwrap());

    tx.sign(&[PrivateKey::from_wif(SIGNING_WIF).unwrap()])
        .unwrap();
    assert!(tx.is_fully_signed().unwrap());
    assert_eq!(tx.unchecked_serialize(), SIGNED_TX_HEX);
}

#[test]
fn test_foreign_key_does_not_sign() {
    let mut tx = funded_tx();
    tx.sign(&[key(9)]).unwrap();
    assert!(!tx.is_fully_signed().unwrap());
    assert!(tx.get_signatures(&key(9), crate::sighash::SIGHASH_ALL_FORKID)
        .unwrap()
        .is_empty());
}

#[test]
fn test_sign_requires_spent_outputs() {
    let mut tx = Transaction::from_hex(SOURCE_RAW_TX).unwrap();
    assert!(matches!(
        tx.sign(&[key(1)]),
        Err(TransactionError::MissingPreviousOutput { index: 0 })
    ));
}

#[test]
fn test_signature_validation() {
    let mut tx = funded_tx();
    let sigs = tx
        .get_signatures(&key(1), crate::sighash::SIGHASH_ALL_FORKID)
        .unwrap();
    assert_eq!(sigs.len(), 1);
    assert!(tx.is_valid_signature(&sigs[0]).unwrap());

    let mut wrong_index = sigs[0].clone();
    wrong_index.input_index = 4;
    assert!(matches!(
        tx.is_valid_signature(&wrong_index),
        Err(TransactionError::InvalidIndex { index: 4, len: 1 })
    ));

    // A mutation after signing invalidates the digest.
    let stale = sigs[0].clone();
    tx.to(&address_of(&key(3)), 1_000).unwrap();
    assert!(!tx.is_valid_signature(&stale).unwrap());
    assert!(matches!(
        tx.apply_signature(stale),
        Err(TransactionError::InvalidState(_))
    ));
}

#[test]
fn test_p2pk_signing() {
    let k = key(5);
    let utxo = UnspentOutput::new(
        Hash::from_hex(PREV_TX).unwrap(),
        2,
        Script::build_public_key_out(&k.pub_key()),
        50_000,
    );
    let mut tx = Transaction::new();
    tx.from(utxo).unwrap().to(&address_of(&key(2)), 40_000).unwrap();
    assert_eq!(*tx.inputs()[0].kind(), InputKind::PublicKey);
    tx.sign(&[k]).unwrap();
    assert!(tx.is_fully_signed().unwrap());
    assert!(tx.inputs()[0].script().is_public_key_in());
}

fn multisig_keys() -> (Vec<PrivateKey>, Vec<PublicKey>) {
    let keys: Vec<PrivateKey> = (11..14).map(key).collect();
    let pubs = keys.iter().map(PrivateKey::pub_key).collect();
    (keys, pubs)
}

#[test]
fn test_p2sh_multisig_two_of_three() {
    let (keys, pubs) = multisig_keys();
    let redeem = Script::build_multisig_out(&pubs, 2).unwrap();
    let utxo = UnspentOutput::new(
        Hash::from_hex(PREV_TX).unwrap(),
        0,
        Script::build_script_hash_out(&redeem),
        1_000_000,
    );

    let mut tx = Transaction::new();
    tx.from_multisig(utxo, &pubs, 2)
        .unwrap()
        .to(&address_of(&key(2)), 500_000)
        .unwrap()
        .change(&Address::from_redeem_script(&redeem, Network::Testnet))
        .unwrap();
    assert!(matches!(tx.inputs()[0].kind(), InputKind::MultiSigScriptHash(_)));

    tx.sign(&keys[..1]).unwrap();
    let state = tx.inputs()[0].multisig_state().unwrap();
    assert_eq!(state.count_signatures(), 1);
    assert_eq!(state.count_missing_signatures(), 1);
    assert_eq!(state.public_keys_without_signature().len(), 2);
    assert!(!tx.is_fully_signed().unwrap());

    // A third key after the threshold is reached is ignored.
    tx.sign(&keys[1..]).unwrap();
    assert!(tx.is_fully_signed().unwrap());
    assert_eq!(tx.inputs()[0].multisig_state().unwrap().count_signatures(), 2);
    assert!(tx.serialize(&SerializeOptions::default()).is_ok());
}

#[test]
fn test_bare_multisig() {
    let (keys, pubs) = multisig_keys();
    let utxo = UnspentOutput::new(
        Hash::from_hex(PREV_TX).unwrap(),
        1,
        Script::build_multisig_out(&pubs, 2).unwrap(),
        1_000_000,
    );
    let mut tx = Transaction::new();
    tx.from_multisig(utxo.clone(), &pubs, 2)
        .unwrap()
        .to(&address_of(&key(2)), 800_000)
        .unwrap();
    tx.sign(&[keys[2].clone(), keys[0].clone()]).unwrap();
    assert!(tx.is_fully_signed().unwrap());
    assert!(tx.inputs()[0].script().to_bytes().starts_with(&[0x00]));

    let mut tx = Transaction::new();
    assert!(matches!(
        tx.from_multisig(utxo, &pubs, 4),
        Err(TransactionError::InvalidArgument(_))
    ));
}

// -----------------------------------------------------------------------
// Serialization checks
// -----------------------------------------------------------------------

#[test]
fn test_checked_serialize_signed() {
    let mut tx = funded_tx();
    assert!(matches!(
        tx.serialize(&SerializeOptions::default()),
        Err(TransactionError::SerializationCheck(e)) if matches!(*e, TransactionError::MissingSignatures)
    ));
    tx.sign(&[key(1)]).unwrap();
    let hex = tx.serialize(&SerializeOptions::default()).unwrap();
    assert_eq!(hex, tx.unchecked_serialize());
}

#[test]
fn test_serialize_disable_all() {
    let tx = Transaction::from_hex(SOURCE_RAW_TX).unwrap();
    assert!(tx.checked_serialize(&SerializeOptions::default()).is_err());
    assert_eq!(
        tx.serialize(&SerializeOptions::disable_all()).unwrap(),
        SOURCE_RAW_TX
    );
}

#[test]
fn test_serialization_error_order() {
    let opts = SerializeOptions::default();
    let mut tx = Transaction::new();
    tx.from(p2pkh_utxo(&key(1), 0, 10_000))
        .unwrap()
        .to(&address_of(&key(2)), 20_000)
        .unwrap();
    assert!(matches!(
        tx.get_serialization_error(&opts),
        Some(TransactionError::InvalidOutputAmountSum {
            inputs: 10_000,
            outputs: 20_000
        })
    ));

    let lenient = SerializeOptions {
        disable_more_output_than_input: true,
        ..Default::default()
    };
    assert!(matches!(
        tx.get_serialization_error(&lenient),
        Some(TransactionError::MissingSignatures)
    ));
}

#[test]
fn test_fee_bounds() {
    let opts = SerializeOptions {
        disable_is_fully_signed: true,
        ..Default::default()
    };

    // 226 satoshis of fee against a 100,000 estimate.
    let mut small = Transaction::new();
    small
        .from(p2pkh_utxo(&key(1), 0, 100_000_000))
        .unwrap()
        .to(&address_of(&key(2)), 99_999_774)
        .unwrap();
    assert!(matches!(
        small.get_serialization_error(&opts),
        Some(TransactionError::FeeTooSmall { unspent: 226, min: 667 })
    ));
    small.fee_per_kb(500).unwrap();
    assert!(small.get_serialization_error(&opts).is_none());

    // Everything left over is fee and there is no change script.
    let mut large = Transaction::new();
    large
        .from(p2pkh_utxo(&key(1), 0, 100_000_000))
        .unwrap()
        .to(&address_of(&key(2)), 1_000)
        .unwrap();
    assert!(matches!(
        large.get_serialization_error(&opts),
        Some(TransactionError::ChangeAddressMissing { .. })
    ));
    let no_large = SerializeOptions {
        disable_large_fees: true,
        ..opts
    };
    assert!(large.get_serialization_error(&no_large).is_none());

    // Explicit fee that the outputs do not leave.
    let mut different = funded_tx();
    different.change_script = None;
    different.fee = Some(5);
    assert!(matches!(
        different.get_serialization_error(&opts),
        Some(TransactionError::FeeDifferent { fee: 5, unspent: 100_000 })
    ));
}

#[test]
fn test_dust_outputs() {
    let opts = SerializeOptions {
        disable_is_fully_signed: true,
        ..Default::default()
    };
    let mut tx = funded_tx();
    tx.to(&address_of(&key(3)), DUST_AMOUNT - 1).unwrap();
    assert!(matches!(
        tx.get_serialization_error(&opts),
        Some(TransactionError::DustOutputs { index: 1, satoshis: 545 })
    ));

    let mut data = funded_tx();
    data.add_data(b"memo").unwrap();
    assert!(data.get_serialization_error(&opts).is_none());
}

// -----------------------------------------------------------------------
// Sanity checks
// -----------------------------------------------------------------------

#[test]
fn test_verify_empty() {
    let mut tx = Transaction::new();
    assert_eq!(tx.verify(), Err(SanityError::NoInputs));
    tx.from(p2pkh_utxo(&key(1), 0, 1000)).unwrap();
    assert_eq!(tx.verify(), Err(SanityError::NoOutputs));
    tx.to(&address_of(&key(2)), 900).unwrap();
    assert_eq!(tx.verify(), Ok(()));
}

#[test]
fn test_verify_duplicate_input() {
    let mut tx = Transaction::new();
    let input = Input::from_utxo(&p2pkh_utxo(&key(1), 0, 1000));
    tx.unchecked_add_input(input.clone())
        .unwrap()
        .unchecked_add_input(input)
        .unwrap()
        .to(&address_of(&key(2)), 900)
        .unwrap();
    assert_eq!(tx.verify(), Err(SanityError::DuplicateInput { index: 1 }));
}

#[test]
fn test_verify_amounts() {
    let mut tx = Transaction::new();
    tx.from(p2pkh_utxo(&key(1), 0, 1000)).unwrap();
    tx.add_output(Output::new(Script::new(), crate::config::MAX_MONEY + 1))
        .unwrap();
    assert_eq!(tx.verify(), Err(SanityError::OutputAboveMaxMoney { index: 0 }));

    let mut tx = Transaction::new();
    tx.from(p2pkh_utxo(&key(1), 0, 1000)).unwrap();
    tx.add_output(Output::new(Script::new(), crate::config::MAX_MONEY))
        .unwrap()
        .add_output(Output::new(Script::new(), 1))
        .unwrap();
    assert_eq!(tx.verify(), Err(SanityError::TotalAboveMaxMoney { index: 1 }));

    let mut tx = Transaction::new();
    tx.from(p2pkh_utxo(&key(1), 0, 1000)).unwrap();
    tx.add_output(Output::new(Script::new(), u64::MAX)).unwrap();
    assert_eq!(tx.verify(), Err(SanityError::InvalidOutputSatoshis { index: 0 }));
}

#[test]
fn test_verify_null_inputs() {
    let null = Input::new(Hash::default(), crate::input::NULL_OUTPUT_INDEX);

    let mut coinbase = Transaction::new();
    coinbase
        .unchecked_add_input(null.clone().with_script(Script::from_bytes(&[0x51])))
        .unwrap()
        .to(&address_of(&key(2)), 900)
        .unwrap();
    assert_eq!(coinbase.verify(), Err(SanityError::CoinbaseScriptSize { len: 1 }));

    let mut tx = Transaction::new();
    tx.from(p2pkh_utxo(&key(1), 0, 1000))
        .unwrap()
        .unchecked_add_input(null)
        .unwrap()
        .to(&address_of(&key(2)), 900)
        .unwrap();
    assert_eq!(tx.verify(), Err(SanityError::NullInput { index: 1 }));
}

// -----------------------------------------------------------------------
// Ordering
// -----------------------------------------------------------------------

#[test]
fn test_sort_is_canonical_and_tracks_change() {
    let from = key(1);
    let mut tx = Transaction::new();
    tx.from(p2pkh_utxo(&from, 3, 500_000))
        .unwrap()
        .from(p2pkh_utxo(&from, 1, 500_000))
        .unwrap()
        .to(&address_of(&key(2)), 700_000)
        .unwrap()
        .to(&address_of(&key(3)), 10_000)
        .unwrap()
        .change(&address_of(&from))
        .unwrap();
    let change = tx.get_change_output().unwrap().clone();

    tx.sort().unwrap();
    let indexes: Vec<u32> = tx.inputs().iter().map(|i| i.output_index).collect();
    assert_eq!(indexes, vec![1, 3]);
    let amounts: Vec<u64> = tx.outputs().iter().map(|o| o.satoshis).collect();
    let mut sorted = amounts.clone();
    sorted.sort();
    assert_eq!(amounts, sorted);
    assert_eq!(tx.get_change_output(), Some(&change));

    let before = tx.to_hex();
    tx.sort().unwrap();
    assert_eq!(tx.to_hex(), before);
}

#[test]
fn test_sort_outputs_rejects_bad_permutation() {
    let mut tx = funded_tx();
    assert!(matches!(
        tx.sort_outputs(|_| vec![0]),
        Err(TransactionError::InvalidSorting(_))
    ));
    assert!(matches!(
        tx.sort_outputs(|_| vec![0, 0]),
        Err(TransactionError::InvalidSorting(_))
    ));
    assert!(matches!(
        tx.sort_inputs(|_| vec![1]),
        Err(TransactionError::InvalidSorting(_))
    ));

    tx.sort_outputs(|outputs| (0..outputs.len()).rev().collect())
        .unwrap();
    assert_eq!(tx.change_index(), Some(0));
    assert_eq!(tx.get_change_output().unwrap().satoshis, 200_000);
}

#[test]
fn test_sort_inputs_clears_signatures() {
    let mut tx = funded_tx();
    tx.sign(&[key(1)]).unwrap();
    assert!(tx.is_fully_signed().unwrap());
    tx.sort_inputs(|inputs| (0..inputs.len()).collect()).unwrap();
    assert!(!tx.is_fully_signed().unwrap());
}

#[test]
fn test_shuffle_keeps_outputs() {
    let mut tx = funded_tx();
    for n in 3..8 {
        tx.to(&address_of(&key(n)), 1_000 * u64::from(n)).unwrap();
    }
    let change = tx.get_change_output().unwrap().clone();
    let mut before: Vec<Output> = tx.outputs().to_vec();
    tx.shuffle_outputs().unwrap();
    let mut after: Vec<Output> = tx.outputs().to_vec();
    assert_eq!(tx.get_change_output(), Some(&change));
    before.sort_by_key(|o| o.satoshis);
    after.sort_by_key(|o| o.satoshis);
    assert_eq!(before, after);
}

// -----------------------------------------------------------------------
// Lock time and RBF
// -----------------------------------------------------------------------

#[test]
fn test_lock_time_bounds() {
    let mut tx = funded_tx();
    assert!(matches!(
        tx.lock_until_block_height(500_000_000),
        Err(TransactionError::BlockHeightTooHigh(500_000_000))
    ));
    assert!(matches!(
        tx.lock_until_block_height(-1),
        Err(TransactionError::LockTimeOutOfRange(-1))
    ));
    assert!(matches!(
        tx.lock_until_date(499_999_999),
        Err(TransactionError::LockTimeTooEarly(499_999_999))
    ));
    assert!(matches!(
        tx.lock_until_date(1 << 32),
        Err(TransactionError::LockTimeOutOfRange(_))
    ));
    assert_eq!(tx.get_lock_time(), None);
}

#[test]
fn test_lock_until_block_height() {
    let mut tx = funded_tx();
    tx.lock_until_block_height(650_000).unwrap();
    assert_eq!(tx.n_lock_time, 650_000);
    assert_eq!(tx.get_lock_time(), Some(LockTime::BlockHeight(650_000)));
    assert_eq!(tx.inputs()[0].sequence_number, DEFAULT_LOCKTIME_SEQNUMBER);
}

#[test]
fn test_lock_until_date() {
    let when = chrono::DateTime::from_timestamp(1_600_000_000, 0).unwrap();
    let mut tx = funded_tx();
    tx.lock_until_datetime(when).unwrap();
    assert_eq!(tx.n_lock_time, 1_600_000_000);
    assert_eq!(tx.get_lock_time(), Some(LockTime::Timestamp(when)));
    assert_eq!(tx.inputs()[0].sequence_number, DEFAULT_LOCKTIME_SEQNUMBER);
}

#[test]
fn test_rbf() {
    let mut tx = funded_tx();
    assert!(!tx.is_rbf());
    tx.enable_rbf().unwrap();
    assert!(tx.is_rbf());
    assert_eq!(tx.inputs()[0].sequence_number, DEFAULT_RBF_SEQNUMBER);
}

// -----------------------------------------------------------------------
// Snapshots
// -----------------------------------------------------------------------

#[test]
fn test_json_roundtrip_signed() {
    let mut tx = funded_tx();
    tx.fee_per_kb(2_000).unwrap();
    tx.sign(&[key(1)]).unwrap();

    let json = tx.to_json().unwrap();
    let back = Transaction::from_json(&json).unwrap();
    assert_eq!(back.to_hex(), tx.to_hex());
    assert_eq!(back.change_index(), tx.change_index());
    assert_eq!(back.change_script(), tx.change_script());
    assert_eq!(back.get_fee_per_kb(), 2_000);
    assert!(back.is_fully_signed().unwrap());
    assert_eq!(back.get_fee().unwrap(), tx.get_fee().unwrap());
}

#[test]
fn test_json_roundtrip_partial_multisig() {
    let (keys, pubs) = multisig_keys();
    let utxo = UnspentOutput::new(
        Hash::from_hex(PREV_TX).unwrap(),
        0,
        Script::build_script_hash_out(&Script::build_multisig_out(&pubs, 2).unwrap()),
        1_000_000,
    );
    let mut tx = Transaction::new();
    tx.from_multisig(utxo, &pubs, 2)
        .unwrap()
        .to(&address_of(&key(2)), 800_000)
        .unwrap();
    tx.sign(&keys[..1]).unwrap();

    let mut back = Transaction::from_json(&tx.to_json().unwrap()).unwrap();
    assert_eq!(back.to_hex(), tx.to_hex());
    assert_eq!(
        back.inputs()[0].multisig_state().unwrap().count_signatures(),
        1
    );
    back.sign(&keys[1..2]).unwrap();
    assert!(back.is_fully_signed().unwrap());
}

#[test]
fn test_from_object_rejects_unknown_script() {
    let mut obj = funded_tx().to_object();
    obj.hash = None;
    if let Some(output) = obj.inputs[0].output.as_mut() {
        output.script = Script::from_hex("51").unwrap();
    }
    assert!(matches!(
        Transaction::from_object(&obj),
        Err(TransactionError::UnsupportedScript(_))
    ));
}
