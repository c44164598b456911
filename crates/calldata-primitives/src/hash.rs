//! 32-byte words, digests and log topics

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::{strip_hex, u256_to_word, word_to_u256, U256, WORD_SIZE};

/// Failure to build an [`H256`]
#[derive(Debug, Error, PartialEq)]
pub enum HashError {
    /// Text was not valid hexadecimal
    #[error("word is not hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    /// Byte count other than 32
    #[error("word must be {expected} bytes, found {got}")]
    InvalidLength {
        /// Required width
        expected: usize,
        /// Width supplied
        got: usize,
    },
}

/// 32-byte value: a digest, an event topic or a raw ABI word
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct H256([u8; WORD_SIZE]);

impl H256 {
    /// Byte width
    pub const LEN: usize = WORD_SIZE;

    /// All-zero word
    pub const ZERO: H256 = H256([0u8; WORD_SIZE]);

    /// Wrap raw bytes
    pub const fn from_bytes(bytes: [u8; WORD_SIZE]) -> Self {
        H256(bytes)
    }

    /// Copy from a slice that must be exactly one word long
    pub fn from_slice(slice: &[u8]) -> Result<Self, HashError> {
        <[u8; WORD_SIZE]>::try_from(slice)
            .map(H256)
            .map_err(|_| HashError::InvalidLength {
                expected: Self::LEN,
                got: slice.len(),
            })
    }

    /// Parse `0x`-prefixed or bare hex
    pub fn from_hex(s: &str) -> Result<Self, HashError> {
        Self::from_slice(&hex::decode(strip_hex(s))?)
    }

    /// Big-endian word holding `value`
    pub fn from_u256(value: &U256) -> Self {
        H256(u256_to_word(value))
    }

    /// Interpret as a big-endian unsigned integer
    pub fn to_u256(&self) -> U256 {
        word_to_u256(&self.0)
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; WORD_SIZE] {
        &self.0
    }

    /// True for [`H256::ZERO`]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Lowercase `0x`-prefixed hex
    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for H256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for H256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H256({self})")
    }
}

impl FromStr for H256 {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; WORD_SIZE]> for H256 {
    fn from(bytes: [u8; WORD_SIZE]) -> Self {
        H256(bytes)
    }
}
