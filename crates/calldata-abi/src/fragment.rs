//! Functions, events, errors and constructors as typed fragments

use std::fmt;
use std::ops::Index;

use calldata_crypto::keccak256;
use calldata_primitives::{H256, U256};

use crate::decode::Decoder;
use crate::encode::encode_refs;
use crate::error::{AbiError, AbiResult};
use crate::parser::{is_identifier, matching_close, parse_params, ParsedParam};
use crate::token::Token;
use crate::types::ParamType;

/// Kind of ABI fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentKind {
    /// Callable function
    Function,
    /// Contract constructor (no selector)
    Constructor,
    /// Event emitted in a log
    Event,
    /// Custom error raised by `revert`
    Error,
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FragmentKind::Function => "function",
            FragmentKind::Constructor => "constructor",
            FragmentKind::Event => "event",
            FragmentKind::Error => "error",
        })
    }
}

/// Named parameter of a fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Parameter name, empty when unnamed
    pub name: String,
    /// Parameter type
    pub ty: ParamType,
    /// Indexed flag (events only)
    pub indexed: bool,
}

impl Param {
    /// Create a named, non-indexed parameter
    pub fn new(name: impl Into<String>, ty: ParamType) -> Self {
        Self {
            name: name.into(),
            ty,
            indexed: false,
        }
    }

    /// Create an unnamed parameter
    pub fn unnamed(ty: ParamType) -> Self {
        Self::new(String::new(), ty)
    }

    /// Create an indexed event parameter
    pub fn indexed(name: impl Into<String>, ty: ParamType) -> Self {
        Self {
            name: name.into(),
            ty,
            indexed: true,
        }
    }
}

impl From<ParsedParam> for Param {
    fn from(p: ParsedParam) -> Self {
        Self {
            name: p.name,
            ty: p.ty,
            indexed: p.indexed,
        }
    }
}

impl From<ParamType> for Param {
    fn from(ty: ParamType) -> Self {
        Self::unnamed(ty)
    }
}

/// A function, event, error or constructor declaration
///
/// The canonical signature and its digest are computed once at construction,
/// so matching against many fragments never re-hashes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    kind: FragmentKind,
    name: String,
    inputs: Vec<Param>,
    outputs: Vec<Param>,
    anonymous: bool,
    signature: String,
    hash: H256,
}

impl Fragment {
    fn build(
        kind: FragmentKind,
        name: String,
        inputs: Vec<Param>,
        outputs: Vec<Param>,
        anonymous: bool,
    ) -> Self {
        let types: Vec<String> = inputs.iter().map(|p| p.ty.canonical()).collect();
        let signature = format!("{}({})", name, types.join(","));
        let hash = keccak256(signature.as_bytes());
        Self {
            kind,
            name,
            inputs,
            outputs,
            anonymous,
            signature,
            hash,
        }
    }

    /// Create a function fragment
    pub fn function(name: impl Into<String>, inputs: Vec<Param>, outputs: Vec<Param>) -> Self {
        Self::build(FragmentKind::Function, name.into(), inputs, outputs, false)
    }

    /// Create a custom error fragment
    pub fn error(name: impl Into<String>, inputs: Vec<Param>) -> Self {
        Self::build(FragmentKind::Error, name.into(), inputs, Vec::new(), false)
    }

    /// Create an event fragment
    pub fn event(name: impl Into<String>, inputs: Vec<Param>, anonymous: bool) -> Self {
        Self::build(FragmentKind::Event, name.into(), inputs, Vec::new(), anonymous)
    }

    /// Create a constructor fragment
    pub fn constructor(inputs: Vec<Param>) -> Self {
        Self::build(
            FragmentKind::Constructor,
            "constructor".to_owned(),
            inputs,
            Vec::new(),
            false,
        )
    }

    /// Built-in `Error(string)` revert fragment
    pub fn error_string() -> Self {
        Self::error("Error", vec![Param::new("message", ParamType::String)])
    }

    /// Built-in `Panic(uint256)` fragment raised by failing assertions
    pub fn panic() -> Self {
        Self::error("Panic", vec![Param::new("code", ParamType::Uint(256))])
    }

    /// Parse a human-readable declaration.
    ///
    /// Accepts an optional leading keyword (`function`, `event`, `error`,
    /// `constructor`, defaulting to `function`), named and `indexed`
    /// parameters, a trailing `returns (...)` list for functions, `anonymous`
    /// for events, and ignores visibility and mutability modifiers.
    ///
    /// ```
    /// use calldata_abi::{Fragment, FragmentKind};
    ///
    /// let f = Fragment::parse("function transfer(address to, uint256 amount) returns (bool)").unwrap();
    /// assert_eq!(f.kind(), FragmentKind::Function);
    /// assert_eq!(f.signature(), "transfer(address,uint256)");
    /// assert_eq!(f.selector(), [0xa9, 0x05, 0x9c, 0xbb]);
    /// ```
    pub fn parse(s: &str) -> AbiResult<Self> {
        let trimmed = s.trim();
        let open = trimmed
            .find('(')
            .ok_or_else(|| AbiError::signature(s, "missing parameter list"))?;
        let close = open
            + matching_close(&trimmed[open..])
                .ok_or_else(|| AbiError::signature(s, "unbalanced parentheses"))?;

        let prefix: Vec<&str> = trimmed[..open].split_whitespace().collect();
        let (kind, name) = match prefix.as_slice() {
            ["constructor"] => (FragmentKind::Constructor, "constructor"),
            ["function", name] => (FragmentKind::Function, *name),
            ["event", name] => (FragmentKind::Event, *name),
            ["error", name] => (FragmentKind::Error, *name),
            [name] => (FragmentKind::Function, *name),
            _ => return Err(AbiError::signature(s, "expected `[kind] name(...)`")),
        };
        if !is_identifier(name) {
            return Err(AbiError::signature(s, format!("invalid name {:?}", name)));
        }

        let inputs: Vec<Param> = parse_params(&trimmed[open..=close])?
            .into_iter()
            .map(Param::from)
            .collect();
        if kind != FragmentKind::Event && inputs.iter().any(|p| p.indexed) {
            return Err(AbiError::signature(s, "indexed is only allowed on event parameters"));
        }

        let mut outputs = Vec::new();
        let mut anonymous = false;
        let mut rest = trimmed[close + 1..].trim();
        while !rest.is_empty() {
            let word_end = rest.find(|c: char| c.is_whitespace() || c == '(').unwrap_or(rest.len());
            let word = &rest[..word_end];
            rest = rest[word_end..].trim_start();
            match (kind, word) {
                (FragmentKind::Function, "returns") => {
                    let end = matching_close(rest)
                        .filter(|_| rest.starts_with('('))
                        .ok_or_else(|| AbiError::signature(s, "expected `returns (...)`"))?;
                    outputs = parse_params(&rest[..=end])?.into_iter().map(Param::from).collect();
                    rest = rest[end + 1..].trim_start();
                }
                (FragmentKind::Event, "anonymous") => anonymous = true,
                (
                    FragmentKind::Function | FragmentKind::Constructor,
                    "view" | "pure" | "payable" | "nonpayable" | "external" | "public",
                ) => {}
                _ => return Err(AbiError::signature(s, format!("unexpected {:?}", word))),
            }
        }

        Ok(Self::build(kind, name.to_owned(), inputs, outputs, anonymous))
    }

    /// Fragment kind
    pub fn kind(&self) -> FragmentKind {
        self.kind
    }

    /// Fragment name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Input parameters (event fields for events)
    pub fn inputs(&self) -> &[Param] {
        &self.inputs
    }

    /// Output parameters (functions only)
    pub fn outputs(&self) -> &[Param] {
        &self.outputs
    }

    /// Whether an event omits its signature topic
    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }

    /// Canonical signature, e.g. "transfer(address,uint256)"
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// First 4 bytes of the signature digest
    pub fn selector(&self) -> [u8; 4] {
        let mut selector = [0u8; 4];
        selector.copy_from_slice(&self.hash.as_bytes()[..4]);
        selector
    }

    /// Full signature digest (`topics[0]` of a non-anonymous event)
    pub fn topic(&self) -> H256 {
        self.hash
    }

    /// Input types in declaration order
    pub fn input_types(&self) -> Vec<ParamType> {
        self.inputs.iter().map(|p| p.ty.clone()).collect()
    }

    /// Output types in declaration order
    pub fn output_types(&self) -> Vec<ParamType> {
        self.outputs.iter().map(|p| p.ty.clone()).collect()
    }

    /// Encode call data: selector followed by the encoded inputs.
    /// Constructors encode the bare arguments.
    pub fn encode_input(&self, tokens: &[Token]) -> AbiResult<Vec<u8>> {
        let encoded = encode_refs(&param_refs(&self.inputs), tokens)?;
        if self.kind == FragmentKind::Constructor {
            return Ok(encoded);
        }
        let mut result = self.selector().to_vec();
        result.extend(encoded);
        Ok(result)
    }

    /// Encode return data for the outputs
    pub fn encode_output(&self, tokens: &[Token]) -> AbiResult<Vec<u8>> {
        encode_refs(&param_refs(&self.outputs), tokens)
    }

    /// Decode call data produced by [`encode_input`](Self::encode_input)
    pub fn decode_input(&self, data: &[u8]) -> AbiResult<NamedTokens> {
        self.decode_input_with(&Decoder::default(), data)
    }

    /// Decode call data with an explicit decoder configuration
    pub fn decode_input_with(&self, decoder: &Decoder, data: &[u8]) -> AbiResult<NamedTokens> {
        let base = if self.kind == FragmentKind::Constructor {
            0
        } else {
            self.check_selector(data)?;
            4
        };
        let tokens = decoder.decode_refs(&param_refs(&self.inputs), data, base)?;
        Ok(NamedTokens::from_params(&self.inputs, tokens))
    }

    /// Decode return data against the outputs
    pub fn decode_output(&self, data: &[u8]) -> AbiResult<NamedTokens> {
        self.decode_output_with(&Decoder::default(), data)
    }

    /// Decode return data with an explicit decoder configuration
    pub fn decode_output_with(&self, decoder: &Decoder, data: &[u8]) -> AbiResult<NamedTokens> {
        let tokens = decoder.decode_refs(&param_refs(&self.outputs), data, 0)?;
        Ok(NamedTokens::from_params(&self.outputs, tokens))
    }

    fn check_selector(&self, data: &[u8]) -> AbiResult<()> {
        let actual: [u8; 4] = data
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or(AbiError::BufferTooShort {
                needed: 4,
                available: data.len(),
            })?;
        let expected = self.selector();
        if actual != expected {
            return Err(AbiError::SelectorMismatch { expected, actual });
        }
        Ok(())
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.signature)
    }
}

pub(crate) fn param_refs(params: &[Param]) -> Vec<&ParamType> {
    params.iter().map(|p| &p.ty).collect()
}

/// Decoded values paired with their parameter names
///
/// Values are reachable by position (`tokens[0]`) and, when the parameter was
/// named, by name (`tokens.get("amount")`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamedTokens {
    names: Vec<String>,
    tokens: Vec<Token>,
}

impl NamedTokens {
    /// Pair names with tokens; missing names are left empty
    pub fn new(names: Vec<String>, tokens: Vec<Token>) -> Self {
        let mut names = names;
        names.resize(tokens.len(), String::new());
        Self { names, tokens }
    }

    pub(crate) fn from_params(params: &[Param], tokens: Vec<Token>) -> Self {
        Self::new(params.iter().map(|p| p.name.clone()).collect(), tokens)
    }

    /// Value of the first parameter with the given name
    pub fn get(&self, name: &str) -> Option<&Token> {
        if name.is_empty() {
            return None;
        }
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.tokens[i])
    }

    /// Parameter names, empty strings for unnamed parameters
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Values in declaration order
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Number of values
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether there are no values
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Iterate over `(name, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Token)> {
        self.names.iter().map(String::as_str).zip(&self.tokens)
    }

    /// Take the positional values
    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }
}

impl Index<usize> for NamedTokens {
    type Output = Token;

    fn index(&self, index: usize) -> &Token {
        &self.tokens[index]
    }
}

/// Solidity panic codes carried by `Panic(uint256)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanicCode {
    /// 0x00: generic compiler inserted panic
    Generic,
    /// 0x01: `assert` failed
    AssertionFailed,
    /// 0x11: arithmetic overflow or underflow outside `unchecked`
    ArithmeticOverflow,
    /// 0x12: division or modulo by zero
    DivisionByZero,
    /// 0x21: conversion to an out-of-range enum value
    InvalidEnumValue,
    /// 0x22: incorrectly encoded storage byte array
    InvalidStorageByteArray,
    /// 0x31: `pop()` on an empty array
    EmptyArrayPop,
    /// 0x32: array index out of bounds
    ArrayOutOfBounds,
    /// 0x41: too much memory allocated
    OutOfMemory,
    /// 0x51: call through a zero-initialized function pointer
    InvalidFunctionPointer,
    /// Any other code
    Unknown(U256),
}

impl PanicCode {
    /// Numeric panic code
    pub fn code(&self) -> U256 {
        match self {
            PanicCode::Generic => U256::from(0x00),
            PanicCode::AssertionFailed => U256::from(0x01),
            PanicCode::ArithmeticOverflow => U256::from(0x11),
            PanicCode::DivisionByZero => U256::from(0x12),
            PanicCode::InvalidEnumValue => U256::from(0x21),
            PanicCode::InvalidStorageByteArray => U256::from(0x22),
            PanicCode::EmptyArrayPop => U256::from(0x31),
            PanicCode::ArrayOutOfBounds => U256::from(0x32),
            PanicCode::OutOfMemory => U256::from(0x41),
            PanicCode::InvalidFunctionPointer => U256::from(0x51),
            PanicCode::Unknown(code) => *code,
        }
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            PanicCode::Generic => "generic compiler panic",
            PanicCode::AssertionFailed => "assertion failed",
            PanicCode::ArithmeticOverflow => "arithmetic overflow or underflow",
            PanicCode::DivisionByZero => "division or modulo by zero",
            PanicCode::InvalidEnumValue => "invalid enum conversion",
            PanicCode::InvalidStorageByteArray => "invalid storage byte array encoding",
            PanicCode::EmptyArrayPop => "pop on empty array",
            PanicCode::ArrayOutOfBounds => "array index out of bounds",
            PanicCode::OutOfMemory => "out of memory",
            PanicCode::InvalidFunctionPointer => "invalid internal function call",
            PanicCode::Unknown(_) => "unknown panic code",
        }
    }
}

impl From<U256> for PanicCode {
    fn from(code: U256) -> Self {
        if code > U256::from(0xff) {
            return PanicCode::Unknown(code);
        }
        match code.low_u64() {
            0x00 => PanicCode::Generic,
            0x01 => PanicCode::AssertionFailed,
            0x11 => PanicCode::ArithmeticOverflow,
            0x12 => PanicCode::DivisionByZero,
            0x21 => PanicCode::InvalidEnumValue,
            0x22 => PanicCode::InvalidStorageByteArray,
            0x31 => PanicCode::EmptyArrayPop,
            0x32 => PanicCode::ArrayOutOfBounds,
            0x41 => PanicCode::OutOfMemory,
            0x51 => PanicCode::InvalidFunctionPointer,
            _ => PanicCode::Unknown(code),
        }
    }
}

impl fmt::Display for PanicCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self.code();
        if code <= U256::from(u64::MAX) {
            write!(f, "panic {:#04x}: {}", code.low_u64(), self.description())
        } else {
            write!(f, "panic {:#x}: {}", code, self.description())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calldata_primitives::{u256_to_word, Address};

    fn transfer() -> Fragment {
        Fragment::function(
            "transfer",
            vec![
                Param::new("to", ParamType::Address),
                Param::new("amount", ParamType::Uint(256)),
            ],
            vec![Param::unnamed(ParamType::Bool)],
        )
    }

    // ==================== Construction ====================

    #[test]
    fn test_function_signature_and_selector() {
        let f = transfer();
        assert_eq!(f.signature(), "transfer(address,uint256)");
        assert_eq!(f.selector(), [0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(f.to_string(), "function transfer(address,uint256)");
    }

    #[test]
    fn test_builtin_selectors() {
        assert_eq!(Fragment::error_string().selector(), [0x08, 0xc3, 0x79, 0xa0]);
        assert_eq!(Fragment::panic().selector(), [0x4e, 0x48, 0x7b, 0x71]);
    }

    #[test]
    fn test_parse_function_with_returns() {
        let f = Fragment::parse("function balanceOf(address owner) external view returns (uint256)")
            .unwrap();
        assert_eq!(f.kind(), FragmentKind::Function);
        assert_eq!(f.name(), "balanceOf");
        assert_eq!(f.inputs()[0].name, "owner");
        assert_eq!(f.output_types(), vec![ParamType::Uint(256)]);
        assert_eq!(f.selector(), [0x70, 0xa0, 0x82, 0x31]);
    }

    #[test]
    fn test_parse_without_keyword_defaults_to_function() {
        let f = Fragment::parse("transfer(address,uint256)").unwrap();
        assert_eq!(f.kind(), FragmentKind::Function);
        assert_eq!(f.signature(), "transfer(address,uint256)");
    }

    #[test]
    fn test_parse_event() {
        let e = Fragment::parse(
            "event Transfer(address indexed from, address indexed to, uint256 value)",
        )
        .unwrap();
        assert_eq!(e.kind(), FragmentKind::Event);
        assert!(e.inputs()[0].indexed);
        assert!(!e.inputs()[2].indexed);
        assert!(!e.is_anonymous());
        assert_eq!(
            e.topic().to_hex(),
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );

        let anon = Fragment::parse("event Ping(uint256) anonymous").unwrap();
        assert!(anon.is_anonymous());
    }

    #[test]
    fn test_parse_error_and_constructor() {
        let e = Fragment::parse("error InsufficientBalance(uint256 available, uint256 required)")
            .unwrap();
        assert_eq!(e.kind(), FragmentKind::Error);
        assert_eq!(e.signature(), "InsufficientBalance(uint256,uint256)");

        let c = Fragment::parse("constructor(string name, uint8 decimals) payable").unwrap();
        assert_eq!(c.kind(), FragmentKind::Constructor);
        assert_eq!(c.inputs().len(), 2);
    }

    #[test]
    fn test_parse_rejects() {
        assert!(Fragment::parse("transfer").is_err());
        assert!(Fragment::parse("function f(uint256 indexed x)").is_err());
        assert!(Fragment::parse("event E(uint256) view").is_err());
        assert!(Fragment::parse("function f(uint256) returns bool").is_err());
        assert!(Fragment::parse("function 1f()").is_err());
        assert!(Fragment::parse("function f(uint256").is_err());
    }

    // ==================== Encoding ====================

    #[test]
    fn test_encode_decode_input() {
        let f = transfer();
        let to = Address::from_bytes([0x11; 20]);
        let data = f
            .encode_input(&[Token::Address(to), Token::uint(1000u64)])
            .unwrap();
        assert_eq!(&data[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(data.len(), 4 + 64);

        let decoded = f.decode_input(&data).unwrap();
        assert_eq!(decoded.get("to"), Some(&Token::Address(to)));
        assert_eq!(decoded.get("amount"), Some(&Token::uint(1000u64)));
        assert_eq!(decoded[1], Token::uint(1000u64));
    }

    #[test]
    fn test_decode_input_selector_mismatch() {
        let f = transfer();
        let mut data = vec![0xde, 0xad, 0xbe, 0xef];
        data.extend_from_slice(&[0u8; 64]);
        let err = f.decode_input(&data).unwrap_err();
        assert_eq!(
            err,
            AbiError::SelectorMismatch {
                expected: [0xa9, 0x05, 0x9c, 0xbb],
                actual: [0xde, 0xad, 0xbe, 0xef],
            }
        );
        assert!(matches!(
            f.decode_input(&[0xa9, 0x05]),
            Err(AbiError::BufferTooShort { needed: 4, available: 2 })
        ));
    }

    #[test]
    fn test_constructor_has_no_selector() {
        let c = Fragment::constructor(vec![Param::new("supply", ParamType::Uint(256))]);
        let data = c.encode_input(&[Token::uint(5u64)]).unwrap();
        assert_eq!(data, u256_to_word(&U256::from(5)).to_vec());
        assert_eq!(c.decode_input(&data).unwrap()[0], Token::uint(5u64));
    }

    #[test]
    fn test_encode_decode_output() {
        let f = transfer();
        let data = f.encode_output(&[Token::Bool(true)]).unwrap();
        let decoded = f.decode_output(&data).unwrap();
        assert_eq!(decoded.tokens(), &[Token::Bool(true)]);
        assert_eq!(decoded.get(""), None);
    }

    #[test]
    fn test_encode_input_arity() {
        let err = transfer().encode_input(&[Token::Bool(true)]).unwrap_err();
        assert_eq!(err, AbiError::ArityMismatch { expected: 2, actual: 1 });
    }

    // ==================== NamedTokens ====================

    #[test]
    fn test_named_tokens() {
        let named = NamedTokens::new(
            vec!["a".into(), "".into()],
            vec![Token::Bool(true), Token::uint(2u64), Token::uint(3u64)],
        );
        assert_eq!(named.len(), 3);
        assert_eq!(named.get("a"), Some(&Token::Bool(true)));
        assert_eq!(named.get("b"), None);
        let pairs: Vec<_> = named.iter().map(|(n, _)| n).collect();
        assert_eq!(pairs, vec!["a", "", ""]);
        assert_eq!(named.into_tokens().len(), 3);
    }

    // ==================== PanicCode ====================

    #[test]
    fn test_panic_codes() {
        assert_eq!(PanicCode::from(U256::from(0x11)), PanicCode::ArithmeticOverflow);
        assert_eq!(PanicCode::from(U256::from(0x32)), PanicCode::ArrayOutOfBounds);
        assert_eq!(PanicCode::from(U256::from(0x99)), PanicCode::Unknown(U256::from(0x99)));
        assert_eq!(
            PanicCode::ArithmeticOverflow.to_string(),
            "panic 0x11: arithmetic overflow or underflow"
        );
        assert_eq!(PanicCode::DivisionByZero.code(), U256::from(0x12));
    }
}
