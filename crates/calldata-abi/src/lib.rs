//! # calldata-abi
//!
//! Solidity ABI encoding and decoding for contract calldata, return data,
//! revert data and event logs.
//!
//! ## Features
//!
//! - **Parser**: type signatures such as `(address,uint256)[]` into [`ParamType`]
//! - **Encoder / Decoder**: head/tail encoding with validated offsets and
//!   configurable resource limits ([`DecoderConfig`])
//! - **Signatures**: canonical signatures, 4-byte selectors and event topics
//! - **Fragments**: functions, events and errors from human-readable
//!   declarations or JSON ABI
//! - **Matcher**: revert data against custom errors plus the built-in
//!   `Error(string)` and `Panic(uint256)`
//! - **Typed data**: EIP-712 `encodeType`, `hashStruct` and signing messages
//!
//! ## Quick Start
//!
//! ```rust
//! use calldata_abi::{decode, encode, parse_types, selector, Token};
//! use calldata_primitives::{Address, U256};
//!
//! let types = parse_types("(address,uint256)").unwrap();
//! let to = Address::from_hex("0x742d35Cc6634C0532925a3b844Bc9e7595f0aB3d").unwrap();
//! let args = vec![Token::Address(to), Token::Uint(U256::from(1000))];
//!
//! let mut calldata = selector("transfer", &types).to_vec();
//! calldata.extend(encode(&types, &args).unwrap());
//! assert_eq!(&calldata[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
//!
//! let decoded = decode(&types, &calldata[4..]).unwrap();
//! assert_eq!(decoded, args);
//! ```
//!
//! ## Revert data
//!
//! ```rust
//! use calldata_abi::{decode_revert, Fragment, Revert, Token};
//!
//! let raw = Fragment::error_string()
//!     .encode_input(&[Token::string("insufficient allowance")])
//!     .unwrap();
//! let revert = decode_revert(&raw, &[]).unwrap();
//! assert_eq!(revert, Revert::Reason("insufficient allowance".into()));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod decode;
mod eip712;
mod encode;
mod error;
mod fragment;
mod json;
mod log;
mod matcher;
mod parser;
mod signature;
mod token;
mod types;

pub use config::DecoderConfig;
pub use decode::{decode, Decoder};
pub use eip712::{encode_typed_data, TypedData, TypedField, DOMAIN_TYPE, MESSAGE_PREFIX};
pub use encode::{encode, encode_function_call};
pub use error::{AbiError, AbiResult, MatchError};
pub use fragment::{Fragment, FragmentKind, NamedTokens, PanicCode, Param};
pub use json::{parse_abi_items, parse_abi_json, AbiItem, AbiParam};
pub use log::{decode_log, decode_log_with, encode_topic, encode_topics};
pub use matcher::{
    builtin_errors, decode_revert, decode_revert_with, match_and_decode, match_and_decode_with,
    MatchedFragment, Revert,
};
pub use parser::{
    parse_params, parse_signature, parse_signature_params, parse_type, parse_types, ParsedParam,
    MAX_TYPE_DEPTH,
};
pub use signature::{canonical_signature, event_topic, function_selector, selector};
pub use token::{Token, I256};
pub use types::{ParamType, TupleComponent};
