//! ABI values

use std::fmt;

use calldata_primitives::{u256_to_word, word_to_u256, Address, H256, U256, WORD_SIZE};

use crate::types::ParamType;

/// Solidity ABI token types
///
/// Mirrors the shape of [`ParamType`]. Tuple members are positional; their
/// names live on the type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Address (20 bytes)
    Address(Address),
    /// Unsigned integer (8-256 bits)
    Uint(U256),
    /// Signed integer (8-256 bits)
    Int(I256),
    /// Boolean
    Bool(bool),
    /// Dynamic bytes
    Bytes(Vec<u8>),
    /// Fixed-size bytes (1-32)
    FixedBytes(Vec<u8>),
    /// UTF-8 string
    String(String),
    /// Dynamic array
    Array(Vec<Token>),
    /// Fixed-size array
    FixedArray(Vec<Token>),
    /// Tuple (struct)
    Tuple(Vec<Token>),
}

impl Token {
    /// Create a uint token from anything convertible to U256
    pub fn uint(value: impl Into<U256>) -> Self {
        Token::Uint(value.into())
    }

    /// Create an int token from an i128
    pub fn int(value: i128) -> Self {
        Token::Int(I256::from_i128(value))
    }

    /// Create a string token
    pub fn string(s: impl Into<String>) -> Self {
        Token::String(s.into())
    }

    /// Create a bytes32 token
    pub fn bytes32(data: H256) -> Self {
        Token::FixedBytes(data.as_bytes().to_vec())
    }

    /// Short variant name, used in mismatch errors
    pub fn kind_name(&self) -> &'static str {
        match self {
            Token::Address(_) => "address",
            Token::Uint(_) => "uint",
            Token::Int(_) => "int",
            Token::Bool(_) => "bool",
            Token::Bytes(_) => "bytes",
            Token::FixedBytes(_) => "fixed bytes",
            Token::String(_) => "string",
            Token::Array(_) => "array",
            Token::FixedArray(_) => "fixed array",
            Token::Tuple(_) => "tuple",
        }
    }

    /// Check that this token has exactly the shape of `ty`.
    ///
    /// Integer ranges and fixed-bytes lengths are checked too, so a token
    /// that passes survives an encode/decode round trip unchanged.
    pub fn type_check(&self, ty: &ParamType) -> bool {
        match (ty, self) {
            (ParamType::Address, Token::Address(_))
            | (ParamType::Bool, Token::Bool(_))
            | (ParamType::Bytes, Token::Bytes(_))
            | (ParamType::String, Token::String(_)) => true,
            (ParamType::Uint(bits), Token::Uint(value)) => value.bits() <= *bits,
            (ParamType::Int(bits), Token::Int(value)) => value.fits_bits(*bits),
            (ParamType::FixedBytes(size), Token::FixedBytes(data)) => data.len() == *size,
            (ParamType::Array(inner), Token::Array(items)) => {
                items.iter().all(|item| item.type_check(inner))
            }
            (ParamType::FixedArray(inner, len), Token::FixedArray(items)) => {
                items.len() == *len && items.iter().all(|item| item.type_check(inner))
            }
            (ParamType::Tuple(components), Token::Tuple(items)) => {
                items.len() == components.len()
                    && items
                        .iter()
                        .zip(components)
                        .all(|(item, c)| item.type_check(&c.ty))
            }
            _ => false,
        }
    }

    /// Get the address value, if this is an address token
    pub fn as_address(&self) -> Option<&Address> {
        match self {
            Token::Address(addr) => Some(addr),
            _ => None,
        }
    }

    /// Get the unsigned value, if this is a uint token
    pub fn as_uint(&self) -> Option<&U256> {
        match self {
            Token::Uint(value) => Some(value),
            _ => None,
        }
    }

    /// Get the signed value, if this is an int token
    pub fn as_int(&self) -> Option<&I256> {
        match self {
            Token::Int(value) => Some(value),
            _ => None,
        }
    }

    /// Get the boolean value, if this is a bool token
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Token::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the string value, if this is a string token
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Token::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the raw bytes of a bytes or fixed bytes token
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Token::Bytes(data) | Token::FixedBytes(data) => Some(data),
            _ => None,
        }
    }

    /// Get the members of an array, fixed array or tuple token
    pub fn as_slice(&self) -> Option<&[Token]> {
        match self {
            Token::Array(items) | Token::FixedArray(items) | Token::Tuple(items) => Some(items),
            _ => None,
        }
    }
}

impl From<Address> for Token {
    fn from(addr: Address) -> Self {
        Token::Address(addr)
    }
}

impl From<bool> for Token {
    fn from(b: bool) -> Self {
        Token::Bool(b)
    }
}

impl From<U256> for Token {
    fn from(value: U256) -> Self {
        Token::Uint(value)
    }
}

impl From<I256> for Token {
    fn from(value: I256) -> Self {
        Token::Int(value)
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Token::String(s.to_owned())
    }
}

/// Signed 256-bit integer
///
/// Stored as sign and magnitude. Zero is never negative, so structural
/// equality matches numeric equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct I256 {
    abs: U256,
    negative: bool,
}

impl I256 {
    /// Zero
    pub const ZERO: I256 = I256 {
        abs: U256([0; 4]),
        negative: false,
    };

    /// Create from magnitude and sign
    pub fn new(abs: U256, negative: bool) -> Self {
        Self {
            abs,
            negative: negative && !abs.is_zero(),
        }
    }

    /// Create from i128
    pub fn from_i128(value: i128) -> Self {
        Self::new(U256::from(value.unsigned_abs()), value < 0)
    }

    /// Smallest value representable in `bits` bits, with `bits` clamped
    /// to `1..=256`
    pub fn min_value(bits: usize) -> Self {
        Self::new(U256::one() << (bits.clamp(1, 256) - 1), true)
    }

    /// Largest value representable in `bits` bits, with `bits` clamped
    /// to `1..=256`
    pub fn max_value(bits: usize) -> Self {
        Self::new((U256::one() << (bits.clamp(1, 256) - 1)) - U256::one(), false)
    }

    /// Absolute value
    pub fn abs(&self) -> U256 {
        self.abs
    }

    /// Check if negative
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Check if zero
    pub fn is_zero(&self) -> bool {
        self.abs.is_zero()
    }

    /// Whether the value lies in `[-2^(bits-1), 2^(bits-1) - 1]`
    pub fn fits_bits(&self, bits: usize) -> bool {
        if bits == 0 || bits > 256 {
            return false;
        }
        if self.negative {
            self.abs <= U256::one() << (bits - 1)
        } else {
            self.abs.bits() < bits
        }
    }

    /// 256-bit two's-complement big-endian word
    pub fn to_twos_complement(&self) -> [u8; WORD_SIZE] {
        if self.negative {
            u256_to_word(&self.abs.overflowing_neg().0)
        } else {
            u256_to_word(&self.abs)
        }
    }

    /// Read a 256-bit two's-complement big-endian word
    pub fn from_twos_complement(word: &[u8; WORD_SIZE]) -> Self {
        let raw = word_to_u256(word);
        if word[0] & 0x80 != 0 {
            Self::new(raw.overflowing_neg().0, true)
        } else {
            Self::new(raw, false)
        }
    }

    /// Read the low `bits` bits of a word as a signed value, ignoring
    /// whatever the higher bits hold
    pub fn from_word_truncated(word: &[u8; WORD_SIZE], bits: usize) -> Self {
        if bits == 0 {
            return Self::ZERO;
        }
        if bits >= 256 {
            return Self::from_twos_complement(word);
        }
        let modulus = U256::one() << bits;
        let low = word_to_u256(word) & (modulus - U256::one());
        if low.bit(bits - 1) {
            Self::new(modulus - low, true)
        } else {
            Self::new(low, false)
        }
    }
}

impl From<i128> for I256 {
    fn from(value: i128) -> Self {
        Self::from_i128(value)
    }
}

impl From<i64> for I256 {
    fn from(value: i64) -> Self {
        Self::from_i128(value.into())
    }
}

impl fmt::Display for I256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        write!(f, "{}", self.abs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== I256 ====================

    #[test]
    fn test_i256_from_i128() {
        let positive = I256::from_i128(100);
        assert!(!positive.is_negative());
        assert_eq!(positive.abs(), U256::from(100));

        let negative = I256::from_i128(-100);
        assert!(negative.is_negative());
        assert_eq!(negative.abs(), U256::from(100));

        assert!(I256::from_i128(0).is_zero());
        assert_eq!(I256::from_i128(i128::MIN).abs(), U256::one() << 127usize);
    }

    #[test]
    fn test_i256_negative_zero_is_zero() {
        assert_eq!(I256::new(U256::zero(), true), I256::ZERO);
    }

    #[test]
    fn test_i256_twos_complement() {
        assert_eq!(I256::from_i128(-1).to_twos_complement(), [0xff; 32]);

        let word = I256::from_i128(-2).to_twos_complement();
        assert_eq!(word[31], 0xfe);
        assert!(word[..31].iter().all(|b| *b == 0xff));

        for value in [0i128, 1, -1, 127, -128, i128::MAX, i128::MIN] {
            let i = I256::from_i128(value);
            assert_eq!(I256::from_twos_complement(&i.to_twos_complement()), i);
        }
    }

    #[test]
    fn test_i256_extremes() {
        let min = I256::min_value(256);
        let word = min.to_twos_complement();
        assert_eq!(word[0], 0x80);
        assert!(word[1..].iter().all(|b| *b == 0));
        assert_eq!(I256::from_twos_complement(&word), min);

        let max = I256::max_value(256);
        assert_eq!(max.to_twos_complement()[0], 0x7f);
    }

    #[test]
    fn test_i256_fits_bits() {
        assert!(I256::from_i128(127).fits_bits(8));
        assert!(!I256::from_i128(128).fits_bits(8));
        assert!(I256::from_i128(-128).fits_bits(8));
        assert!(!I256::from_i128(-129).fits_bits(8));
        assert!(I256::min_value(256).fits_bits(256));
        assert!(!I256::min_value(256).fits_bits(248));
    }

    #[test]
    fn test_i256_from_word_truncated() {
        let mut word = [0u8; 32];
        word[31] = 0xff;
        assert_eq!(I256::from_word_truncated(&word, 8), I256::from_i128(-1));
        assert_eq!(I256::from_word_truncated(&word, 16), I256::from_i128(255));

        word[0] = 0x12;
        assert_eq!(I256::from_word_truncated(&word, 8), I256::from_i128(-1));
    }

    #[test]
    fn test_i256_zero_width_does_not_underflow() {
        assert_eq!(I256::min_value(0), I256::min_value(1));
        assert_eq!(I256::min_value(1), I256::from_i128(-1));
        assert_eq!(I256::max_value(0), I256::ZERO);
        assert_eq!(I256::from_word_truncated(&[0xff; 32], 0), I256::ZERO);
    }

    #[test]
    fn test_i256_display() {
        assert_eq!(I256::from_i128(-42).to_string(), "-42");
        assert_eq!(I256::from_i128(42).to_string(), "42");
    }

    // ==================== Token shape checks ====================

    #[test]
    fn test_type_check_elementary() {
        assert!(Token::Address(Address::ZERO).type_check(&ParamType::Address));
        assert!(Token::uint(255u64).type_check(&ParamType::Uint(8)));
        assert!(!Token::uint(256u64).type_check(&ParamType::Uint(8)));
        assert!(Token::int(-128).type_check(&ParamType::Int(8)));
        assert!(!Token::Bool(true).type_check(&ParamType::Uint(256)));
        assert!(Token::FixedBytes(vec![1, 2]).type_check(&ParamType::FixedBytes(2)));
        assert!(!Token::FixedBytes(vec![1]).type_check(&ParamType::FixedBytes(2)));
    }

    #[test]
    fn test_type_check_compound() {
        let ty = ParamType::FixedArray(Box::new(ParamType::Bool), 2);
        assert!(Token::FixedArray(vec![true.into(), false.into()]).type_check(&ty));
        assert!(!Token::FixedArray(vec![true.into()]).type_check(&ty));
        assert!(!Token::Array(vec![true.into(), false.into()]).type_check(&ty));

        let tuple = ParamType::tuple([ParamType::String, ParamType::Bool]);
        assert!(Token::Tuple(vec!["a".into(), true.into()]).type_check(&tuple));
        assert!(!Token::Tuple(vec!["a".into()]).type_check(&tuple));
    }

    #[test]
    fn test_token_accessors() {
        assert_eq!(Token::uint(7u64).as_uint(), Some(&U256::from(7)));
        assert_eq!(Token::string("x").as_str(), Some("x"));
        assert_eq!(Token::Bool(true).as_bool(), Some(true));
        assert_eq!(Token::Bool(true).as_str(), None);
        assert_eq!(Token::Bytes(vec![1]).as_bytes(), Some(&[1u8][..]));
    }
}
