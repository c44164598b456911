//! Revert data matching against JSON ABI errors and the built-in fragments

use calldata_abi::{
    builtin_errors, decode_log, decode_revert, decode_revert_with, encode_topics,
    match_and_decode, parse_abi_json, AbiError, Decoder, DecoderConfig, Fragment, FragmentKind,
    MatchError, PanicCode, Revert, Token,
};
use calldata_primitives::{Address, U256};

const VAULT_ABI: &str = r#"[
    {"type":"function","name":"withdraw","stateMutability":"nonpayable",
     "inputs":[{"name":"amount","type":"uint256"}],"outputs":[]},
    {"type":"error","name":"InsufficientBalance",
     "inputs":[{"name":"available","type":"uint256"},{"name":"required","type":"uint256"}]},
    {"type":"error","name":"Unauthorized",
     "inputs":[{"name":"caller","type":"address"},{"name":"roles","type":"bytes32[]"}]},
    {"type":"error","name":"Paused","inputs":[]},
    {"type":"event","name":"Withdrawn","anonymous":false,
     "inputs":[{"name":"owner","type":"address","indexed":true},
               {"name":"amount","type":"uint256","indexed":false}]}
]"#;

fn hex_data(s: &str) -> Vec<u8> {
    hex::decode(s.replace([' ', '\n'], "")).unwrap()
}

fn find<'a>(fragments: &'a [Fragment], name: &str) -> &'a Fragment {
    fragments.iter().find(|f| f.name() == name).unwrap()
}

// ==================== Built-in fragments ====================

#[test]
fn test_builtins_are_error_string_and_panic() {
    let signatures: Vec<_> = builtin_errors().iter().map(|f| f.signature()).collect();
    assert_eq!(signatures, vec!["Error(string)", "Panic(uint256)"]);
}

#[test]
fn test_revert_reason_vector() {
    // require(msg.value >= price, "Not enough Ether provided.")
    let raw = hex_data(
        "08c379a0
         0000000000000000000000000000000000000000000000000000000000000020
         000000000000000000000000000000000000000000000000000000000000001a
         4e6f7420656e6f7567682045746865722070726f76696465642e000000000000",
    );
    let revert = decode_revert(&raw, &[]).unwrap();
    assert_eq!(revert, Revert::Reason("Not enough Ether provided.".into()));
}

#[test]
fn test_panic_vector() {
    let raw = hex_data(
        "4e487b71
         0000000000000000000000000000000000000000000000000000000000000011",
    );
    let revert = decode_revert(&raw, &[]).unwrap();
    assert_eq!(revert, Revert::Panic(PanicCode::ArithmeticOverflow));
    assert_eq!(
        revert.to_string(),
        "execution reverted: panic 0x11: arithmetic overflow or underflow"
    );
}

#[test]
fn test_builtins_tried_alongside_candidates() {
    let fragments = parse_abi_json(VAULT_ABI).unwrap();
    let raw = Fragment::error_string()
        .encode_input(&[Token::string("paused")])
        .unwrap();
    let matched = match_and_decode(&raw, &fragments).unwrap();
    assert_eq!(matched.fragment.signature(), "Error(string)");
}

// ==================== Custom errors ====================

#[test]
fn test_custom_error_from_json_abi() {
    let fragments = parse_abi_json(VAULT_ABI).unwrap();
    let error = find(&fragments, "Unauthorized");
    let caller = Address::from_bytes([0xaa; 20]);
    let roles = Token::Array(vec![Token::FixedBytes(vec![0x01; 32])]);
    let raw = error
        .encode_input(&[Token::Address(caller), roles.clone()])
        .unwrap();

    match decode_revert(&raw, &fragments).unwrap() {
        Revert::Custom {
            name,
            signature,
            args,
            ..
        } => {
            assert_eq!(name, "Unauthorized");
            assert_eq!(signature, "Unauthorized(address,bytes32[])");
            assert_eq!(args.get("caller"), Some(&Token::Address(caller)));
            assert_eq!(args.get("roles"), Some(&roles));
        }
        other => panic!("expected custom error, got {other:?}"),
    }
}

#[test]
fn test_error_without_arguments() {
    let fragments = parse_abi_json(VAULT_ABI).unwrap();
    let paused = find(&fragments, "Paused");
    let raw = paused.selector().to_vec();
    let matched = match_and_decode(&raw, &fragments).unwrap();
    assert_eq!(matched.fragment.name(), "Paused");
    assert!(matched.values.is_empty());
}

#[test]
fn test_function_call_data_matches_function() {
    let fragments = parse_abi_json(VAULT_ABI).unwrap();
    let withdraw = find(&fragments, "withdraw");
    let raw = withdraw.encode_input(&[Token::uint(50u64)]).unwrap();
    let matched = match_and_decode(&raw, &fragments).unwrap();
    assert_eq!(matched.fragment.kind(), FragmentKind::Function);
    assert_eq!(matched.values.get("amount"), Some(&Token::uint(50u64)));
}

// ==================== Failures ====================

#[test]
fn test_empty_revert_data() {
    let fragments = parse_abi_json(VAULT_ABI).unwrap();
    assert_eq!(decode_revert(&[], &fragments).unwrap_err(), MatchError::EmptyData);
}

#[test]
fn test_unknown_selector_is_no_match() {
    let fragments = parse_abi_json(VAULT_ABI).unwrap();
    let raw = hex_data("12345678");
    assert_eq!(
        match_and_decode(&raw, &fragments).unwrap_err(),
        MatchError::NoMatch(vec![0x12, 0x34, 0x56, 0x78])
    );
}

#[test]
fn test_malformed_payload_under_known_selector() {
    let fragments = parse_abi_json(VAULT_ABI).unwrap();
    let error = find(&fragments, "InsufficientBalance");
    let mut raw = error.selector().to_vec();
    raw.extend_from_slice(&[0u8; 40]);

    match match_and_decode(&raw, &fragments).unwrap_err() {
        MatchError::FragmentDecode { signature, source } => {
            assert_eq!(signature, "InsufficientBalance(uint256,uint256)");
            assert!(matches!(source, AbiError::BufferTooShort { .. }));
        }
        other => panic!("expected decode failure, got {other:?}"),
    }
}

#[test]
fn test_invalid_utf8_reason() {
    let mut raw = hex_data(
        "08c379a0
         0000000000000000000000000000000000000000000000000000000000000020
         0000000000000000000000000000000000000000000000000000000000000002",
    );
    raw.extend_from_slice(&[0xc3, 0x28]);
    raw.resize(raw.len() + 30, 0);
    assert!(matches!(
        decode_revert(&raw, &[]),
        Err(MatchError::FragmentDecode {
            source: AbiError::InvalidUtf8 { .. },
            ..
        })
    ));
}

#[test]
fn test_decoder_limits_apply_to_matching() {
    let fragments = parse_abi_json(VAULT_ABI).unwrap();
    let error = find(&fragments, "Unauthorized");
    let roles = Token::Array(vec![Token::FixedBytes(vec![0u8; 32]); 8]);
    let raw = error
        .encode_input(&[Token::Address(Address::ZERO), roles])
        .unwrap();

    let tight = Decoder::new(DecoderConfig::default().with_max_elements(4));
    assert!(matches!(
        decode_revert_with(&tight, &raw, &fragments),
        Err(MatchError::FragmentDecode {
            source: AbiError::ResourceLimit(_),
            ..
        })
    ));
    assert!(decode_revert(&raw, &fragments).is_ok());
}

// ==================== Logs ====================

#[test]
fn test_event_log_from_json_abi() {
    let fragments = parse_abi_json(VAULT_ABI).unwrap();
    let event = find(&fragments, "Withdrawn");
    let owner = Address::from_bytes([0x42; 20]);
    let topics = encode_topics(event, &[Token::Address(owner)]).unwrap();
    let data = calldata_primitives::u256_to_word(&U256::from(99));

    let decoded = decode_log(event, &topics, &data).unwrap();
    assert_eq!(decoded.get("owner"), Some(&Token::Address(owner)));
    assert_eq!(decoded.get("amount"), Some(&Token::uint(99u64)));
}
