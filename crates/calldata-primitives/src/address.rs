//! Account addresses as they appear in ABI words

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::{strip_hex, WORD_SIZE};

/// Failure to build an [`Address`]
#[derive(Debug, Error, PartialEq)]
pub enum AddressError {
    /// Text was not valid hexadecimal
    #[error("address is not hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    /// Byte count other than 20
    #[error("address must be 20 bytes, found {0}")]
    InvalidLength(usize),
}

/// 20-byte account identifier.
///
/// Inside calldata an address occupies the low 20 bytes of a word with the
/// upper 12 bytes zero; see [`Address::to_word`] and [`Address::from_word`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Address([u8; Address::LEN]);

impl Address {
    /// Byte width
    pub const LEN: usize = 20;

    /// All-zero address
    pub const ZERO: Address = Address([0u8; Address::LEN]);

    /// Wrap raw bytes
    pub const fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Address(bytes)
    }

    /// Copy from a slice that must be exactly 20 bytes long
    pub fn from_slice(slice: &[u8]) -> Result<Self, AddressError> {
        <[u8; Self::LEN]>::try_from(slice)
            .map(Address)
            .map_err(|_| AddressError::InvalidLength(slice.len()))
    }

    /// Parse `0x`-prefixed or bare hex
    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        Self::from_slice(&hex::decode(strip_hex(s))?)
    }

    /// Take the low 20 bytes of a word. Padding is not inspected.
    pub fn from_word(word: &[u8; WORD_SIZE]) -> Self {
        let mut bytes = [0u8; Self::LEN];
        bytes.copy_from_slice(&word[WORD_SIZE - Self::LEN..]);
        Address(bytes)
    }

    /// Right-align the address in a zero-padded 32-byte word
    pub fn to_word(&self) -> [u8; WORD_SIZE] {
        let mut word = [0u8; WORD_SIZE];
        word[WORD_SIZE - Self::LEN..].copy_from_slice(&self.0);
        word
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    /// True for [`Address::ZERO`]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Lowercase `0x`-prefixed hex, without checksum casing
    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; Address::LEN]> for Address {
    fn from(bytes: [u8; Address::LEN]) -> Self {
        Address(bytes)
    }
}
