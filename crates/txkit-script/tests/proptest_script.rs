use proptest::prelude::*;

use txkit_script::chunk::decode_script;
use txkit_script::Script;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn push_data_decodes_back(data in prop::collection::vec(any::<u8>(), 1..600)) {
        let mut script = Script::new();
        script.append_push_data(&data).unwrap();
        let chunks = decode_script(script.to_bytes()).unwrap();
        prop_assert_eq!(chunks.len(), 1);
        prop_assert_eq!(chunks[0].data.as_deref(), Some(&data[..]));
    }

    #[test]
    fn data_out_is_recognised(data in prop::collection::vec(any::<u8>(), 0..300)) {
        let script = Script::build_data_out(&data).unwrap();
        prop_assert!(script.is_data_out());
        prop_assert!(!script.is_public_key_hash_out());
        prop_assert!(!script.is_multisig_out());
    }

    #[test]
    fn hex_roundtrip(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let script = Script::from_bytes(&data);
        let back = Script::from_hex(&script.to_hex()).unwrap();
        prop_assert_eq!(back, script);
    }
}
