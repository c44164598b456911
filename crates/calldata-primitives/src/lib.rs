//! # calldata-primitives
//!
//! Fixed-width primitive types used by the calldata codec.
//!
//! - [`Address`]: 20-byte account identifier
//! - [`H256`]: 32-byte word, also used for digests and log topics
//! - [`U256`]: 256-bit unsigned integer (re-exported from `primitive-types`)

#![warn(missing_docs)]
#![warn(clippy::all)]

mod address;
mod hash;

pub use address::{Address, AddressError};
pub use hash::{HashError, H256};

pub use primitive_types::U256;

/// Size of one ABI word in bytes
pub const WORD_SIZE: usize = 32;

/// Convert a U256 into a 32-byte big-endian word
pub fn u256_to_word(value: &U256) -> [u8; WORD_SIZE] {
    let mut word = [0u8; WORD_SIZE];
    value.to_big_endian(&mut word);
    word
}

/// Interpret a 32-byte big-endian word as a U256
pub fn word_to_u256(word: &[u8; WORD_SIZE]) -> U256 {
    U256::from_big_endian(word)
}

fn strip_hex(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u256_word_roundtrip() {
        let value = U256::from(314159u64);
        let word = u256_to_word(&value);
        assert_eq!(&word[29..], &[0x04, 0xcb, 0x2f]);
        assert!(word[..29].iter().all(|b| *b == 0));
        assert_eq!(word_to_u256(&word), value);
    }

    #[test]
    fn test_u256_max_word() {
        let word = u256_to_word(&U256::MAX);
        assert_eq!(word, [0xff; WORD_SIZE]);
    }
}
