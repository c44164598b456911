//! ABI error types

use calldata_primitives::{H256, U256};
use thiserror::Error;

/// Encoding, decoding and signature errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiError {
    /// Malformed type signature
    #[error("invalid type signature {signature:?}: {reason}")]
    InvalidTypeSignature {
        /// The offending signature text
        signature: String,
        /// What is wrong with it
        reason: String,
    },

    /// Value shape does not match its declared type
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeValueMismatch {
        /// Declared type
        expected: String,
        /// What was supplied
        actual: String,
    },

    /// Integer does not fit the declared bit width
    #[error("value out of range for {ty}: {value}")]
    ValueOutOfRange {
        /// Declared type
        ty: String,
        /// Offending value in decimal
        value: String,
    },

    /// Fixed-bytes value longer than the declared width
    #[error("{ty} holds at most {expected} bytes, got {actual}")]
    ByteLengthMismatch {
        /// Declared type
        ty: String,
        /// Declared width
        expected: usize,
        /// Supplied length
        actual: usize,
    },

    /// Number of values differs from number of types
    #[error("expected {expected} values, got {actual}")]
    ArityMismatch {
        /// Number of declared types
        expected: usize,
        /// Number of supplied values
        actual: usize,
    },

    /// A word or region lies outside the buffer
    #[error("buffer too short: need {needed} bytes, have {available}")]
    BufferTooShort {
        /// Bytes required
        needed: usize,
        /// Bytes present
        available: usize,
    },

    /// Dynamic data pointer is misaligned or points outside its region
    #[error("invalid offset {offset} read at byte {position}")]
    InvalidOffset {
        /// Position of the pointer word
        position: usize,
        /// Pointer value
        offset: U256,
    },

    /// Boolean word other than 0 or 1
    #[error("invalid boolean word at byte {position}")]
    InvalidBooleanValue {
        /// Position of the word
        position: usize,
    },

    /// Word padding does not match its type
    #[error("non-canonical {ty} word at byte {position}")]
    NonCanonicalWord {
        /// Declared type
        ty: String,
        /// Position of the word
        position: usize,
    },

    /// String payload is not UTF-8
    #[error("invalid utf-8 string at byte {position}")]
    InvalidUtf8 {
        /// Position of the payload
        position: usize,
    },

    /// Decoder limit exceeded
    #[error("decoder limit exceeded: {0}")]
    ResourceLimit(String),

    /// Leading selector differs from the fragment's
    #[error("selector mismatch: expected 0x{}, got 0x{}", hex::encode(.expected), hex::encode(.actual))]
    SelectorMismatch {
        /// Fragment selector
        expected: [u8; 4],
        /// Selector found in the data
        actual: [u8; 4],
    },

    /// Event signature topic differs from the fragment's
    #[error("event topic mismatch: expected {expected}, got {actual}")]
    TopicMismatch {
        /// Event topic
        expected: H256,
        /// Topic found in the log
        actual: H256,
    },

    /// Wrong number of log topics
    #[error("expected {expected} topics, got {actual}")]
    TopicCountMismatch {
        /// Topics implied by the event
        expected: usize,
        /// Topics present
        actual: usize,
    },

    /// Structured ABI description could not be loaded
    #[error("invalid ABI JSON: {0}")]
    InvalidAbiJson(String),

    /// Typed-data document or value does not match its declared structs
    #[error("invalid typed data: {0}")]
    InvalidTypedData(String),
}

impl AbiError {
    pub(crate) fn signature(signature: &str, reason: impl Into<String>) -> Self {
        AbiError::InvalidTypeSignature {
            signature: signature.to_owned(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for AbiError {
    fn from(e: serde_json::Error) -> Self {
        AbiError::InvalidAbiJson(e.to_string())
    }
}

/// Result type for ABI operations
pub type AbiResult<T> = Result<T, AbiError>;

/// Outcome of matching raw return data against declared fragments
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// No data was returned
    #[error("empty return data")]
    EmptyData,

    /// No fragment declares the leading selector
    #[error("no fragment matches data prefix 0x{}", hex::encode(.0))]
    NoMatch(Vec<u8>),

    /// A fragment matched but its payload is malformed
    #[error("failed to decode {signature}: {source}")]
    FragmentDecode {
        /// Signature of the matched fragment
        signature: String,
        /// Decoder error
        #[source]
        source: AbiError,
    },
}
