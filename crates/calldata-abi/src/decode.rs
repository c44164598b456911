//! ABI decoding
//!
//! Every word read is bounds-checked, every dynamic pointer is validated
//! before it is followed, and the total amount of decoded values is capped by
//! [`DecoderConfig`] along with the bytes copied out of `bytes`/`string`
//! payloads, so arbitrary input from a remote node cannot trigger a
//! panic or an unbounded allocation.

use std::iter;

use calldata_primitives::{word_to_u256, Address, U256, WORD_SIZE};
use tracing::trace;

use crate::config::DecoderConfig;
use crate::error::{AbiError, AbiResult};
use crate::token::{Token, I256};
use crate::types::ParamType;

/// Decode tokens from ABI-encoded data using the default configuration
pub fn decode(types: &[ParamType], data: &[u8]) -> AbiResult<Vec<Token>> {
    Decoder::default().decode(types, data)
}

/// ABI decoder with configurable limits
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    config: DecoderConfig,
}

impl Decoder {
    /// Create a decoder with the given configuration
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode a parameter list whose encoding starts at the beginning of `data`
    pub fn decode(&self, types: &[ParamType], data: &[u8]) -> AbiResult<Vec<Token>> {
        self.decode_at(types, data, 0)
    }

    /// Decode a parameter list whose encoding starts at `base_offset`.
    ///
    /// Pointers in the head are resolved relative to `base_offset`.
    pub fn decode_at(
        &self,
        types: &[ParamType],
        data: &[u8],
        base_offset: usize,
    ) -> AbiResult<Vec<Token>> {
        let refs: Vec<&ParamType> = types.iter().collect();
        self.decode_refs(&refs, data, base_offset)
    }

    pub(crate) fn decode_refs(
        &self,
        types: &[&ParamType],
        data: &[u8],
        base_offset: usize,
    ) -> AbiResult<Vec<Token>> {
        if data.len() > self.config.max_buffer_len {
            return Err(AbiError::ResourceLimit(format!(
                "input of {} bytes exceeds {} byte limit",
                data.len(),
                self.config.max_buffer_len
            )));
        }
        types.iter().try_for_each(|ty| ty.validate())?;
        let mut state = DecodeState {
            data,
            config: &self.config,
            elements: 0,
            payload: 0,
        };
        let head_len = sum_head_sizes(types.iter().copied());
        state.decode_params(types.iter().copied(), types.len(), base_offset, head_len, 0)
    }

    /// Decode a single value type held in one word (an indexed event topic)
    pub(crate) fn decode_word(&self, ty: &ParamType, word: &[u8; WORD_SIZE]) -> AbiResult<Token> {
        ty.validate()?;
        let mut state = DecodeState {
            data: word,
            config: &self.config,
            elements: 0,
            payload: 0,
        };
        state.decode_value(ty, 0, 0)
    }
}

fn sum_head_sizes<'t>(types: impl Iterator<Item = &'t ParamType>) -> usize {
    types.fold(0usize, |acc, ty| acc.saturating_add(ty.head_size()))
}

/// Cursor-free decoding state: positions are always absolute indices into `data`
struct DecodeState<'a> {
    data: &'a [u8],
    config: &'a DecoderConfig,
    elements: usize,
    payload: usize,
}

impl<'a> DecodeState<'a> {
    /// Decode `count` values laid out as a head/tail region starting at `base`
    fn decode_params<'t>(
        &mut self,
        types: impl Iterator<Item = &'t ParamType>,
        count: usize,
        base: usize,
        head_len: usize,
        depth: usize,
    ) -> AbiResult<Vec<Token>> {
        if depth > self.config.max_depth {
            return Err(AbiError::ResourceLimit(format!(
                "nesting deeper than {}",
                self.config.max_depth
            )));
        }
        self.charge(count)?;
        self.require(base, head_len)?;

        let mut tokens = Vec::with_capacity(count);
        let mut position = base;
        for ty in types {
            let token = if ty.is_dynamic() {
                let target = self.follow_pointer(base, head_len, position)?;
                self.decode_value(ty, target, depth)?
            } else {
                self.decode_value(ty, position, depth)?
            };
            tokens.push(token);
            position += ty.head_size();
        }
        Ok(tokens)
    }

    /// Decode one value whose encoding starts at `at`
    fn decode_value(&mut self, ty: &ParamType, at: usize, depth: usize) -> AbiResult<Token> {
        let strict = self.config.strict;
        match ty {
            ParamType::Address => {
                let word = self.word(at)?;
                if strict && !is_zero(&word[..WORD_SIZE - Address::LEN]) {
                    return Err(non_canonical(ty, at));
                }
                Ok(Token::Address(Address::from_word(word)))
            }
            ParamType::Uint(bits) => {
                let value = word_to_u256(self.word(at)?);
                if value.bits() <= *bits {
                    Ok(Token::Uint(value))
                } else if strict {
                    Err(non_canonical(ty, at))
                } else {
                    Ok(Token::Uint(value & ((U256::one() << *bits) - U256::one())))
                }
            }
            ParamType::Int(bits) => {
                let word = self.word(at)?;
                let value = I256::from_twos_complement(word);
                if value.fits_bits(*bits) {
                    Ok(Token::Int(value))
                } else if strict {
                    Err(non_canonical(ty, at))
                } else {
                    Ok(Token::Int(I256::from_word_truncated(word, *bits)))
                }
            }
            ParamType::Bool => {
                let word = self.word(at)?;
                let last = word[WORD_SIZE - 1];
                if is_zero(&word[..WORD_SIZE - 1]) && last <= 1 {
                    Ok(Token::Bool(last == 1))
                } else if strict {
                    trace!(position = at, "rejecting non-boolean word");
                    Err(AbiError::InvalidBooleanValue { position: at })
                } else {
                    Ok(Token::Bool(true))
                }
            }
            ParamType::FixedBytes(size) => {
                let word = self.word(at)?;
                let size = (*size).min(WORD_SIZE);
                if strict && !is_zero(&word[size..]) {
                    return Err(non_canonical(ty, at));
                }
                Ok(Token::FixedBytes(word[..size].to_vec()))
            }
            ParamType::Bytes => Ok(Token::Bytes(self.packed_seq(at)?.to_vec())),
            ParamType::String => {
                let bytes = self.packed_seq(at)?;
                String::from_utf8(bytes.to_vec())
                    .map(Token::String)
                    .map_err(|_| AbiError::InvalidUtf8 {
                        position: at + WORD_SIZE,
                    })
            }
            ParamType::Array(inner) => {
                let len = self.length(at)?;
                let head_len = inner.head_size().saturating_mul(len);
                self.decode_params(
                    iter::repeat(&**inner).take(len),
                    len,
                    at + WORD_SIZE,
                    head_len,
                    depth + 1,
                )
                .map(Token::Array)
            }
            ParamType::FixedArray(inner, len) => {
                let head_len = inner.head_size().saturating_mul(*len);
                self.decode_params(iter::repeat(&**inner).take(*len), *len, at, head_len, depth + 1)
                    .map(Token::FixedArray)
            }
            ParamType::Tuple(components) => {
                let types = components.iter().map(|c| &c.ty);
                let head_len = sum_head_sizes(types.clone());
                self.decode_params(types, components.len(), at, head_len, depth + 1)
                    .map(Token::Tuple)
            }
        }
    }

    /// Resolve the pointer word at `position` of a region starting at `base`
    fn follow_pointer(&self, base: usize, head_len: usize, position: usize) -> AbiResult<usize> {
        let offset = word_to_u256(self.word(position)?);
        let invalid = || {
            trace!(position, %offset, "rejecting dynamic data pointer");
            AbiError::InvalidOffset { position, offset }
        };

        if offset > U256::from(self.data.len()) {
            return Err(invalid());
        }
        let relative = offset.as_usize();
        if relative % WORD_SIZE != 0 || relative < head_len {
            return Err(invalid());
        }
        match base.checked_add(relative) {
            Some(target) if target <= self.data.len() => Ok(target),
            _ => Err(invalid()),
        }
    }

    /// Length-prefixed byte payload starting at `at`, charged against the
    /// payload budget before the caller copies it
    fn packed_seq(&mut self, at: usize) -> AbiResult<&'a [u8]> {
        let len = self.length(at)?;
        let start = at + WORD_SIZE;
        self.require(start, len)?;
        self.charge_payload(len)?;
        Ok(&self.data[start..start + len])
    }

    /// Length word at `at`, saturated to usize
    fn length(&self, at: usize) -> AbiResult<usize> {
        let value = word_to_u256(self.word(at)?);
        if value > U256::from(usize::MAX) {
            Ok(usize::MAX)
        } else {
            Ok(value.as_usize())
        }
    }

    fn word(&self, at: usize) -> AbiResult<&'a [u8; WORD_SIZE]> {
        let data = self.data;
        at.checked_add(WORD_SIZE)
            .and_then(|end| data.get(at..end))
            .and_then(|slice| slice.try_into().ok())
            .ok_or_else(|| self.too_short(at.saturating_add(WORD_SIZE)))
    }

    fn require(&self, start: usize, len: usize) -> AbiResult<()> {
        match start.checked_add(len) {
            Some(end) if end <= self.data.len() => Ok(()),
            end => Err(self.too_short(end.unwrap_or(usize::MAX))),
        }
    }

    fn too_short(&self, needed: usize) -> AbiError {
        trace!(needed, available = self.data.len(), "buffer too short");
        AbiError::BufferTooShort {
            needed,
            available: self.data.len(),
        }
    }

    fn charge(&mut self, count: usize) -> AbiResult<()> {
        self.elements = self.elements.saturating_add(count);
        if self.elements > self.config.max_elements {
            trace!(elements = self.elements, "element budget exhausted");
            return Err(AbiError::ResourceLimit(format!(
                "more than {} decoded values",
                self.config.max_elements
            )));
        }
        Ok(())
    }

    fn charge_payload(&mut self, len: usize) -> AbiResult<()> {
        self.payload = self.payload.saturating_add(len);
        if self.payload > self.config.max_payload_bytes {
            trace!(payload = self.payload, "payload budget exhausted");
            return Err(AbiError::ResourceLimit(format!(
                "more than {} payload bytes",
                self.config.max_payload_bytes
            )));
        }
        Ok(())
    }
}

fn is_zero(bytes: &[u8]) -> bool {
    bytes.iter().all(|b| *b == 0)
}

fn non_canonical(ty: &ParamType, position: usize) -> AbiError {
    trace!(%ty, position, "rejecting non-canonical word");
    AbiError::NonCanonicalWord {
        ty: ty.to_string(),
        position,
    }
}
