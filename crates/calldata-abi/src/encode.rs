//! ABI encoding

use calldata_primitives::{u256_to_word, U256, WORD_SIZE};

use crate::error::{AbiError, AbiResult};
use crate::token::Token;
use crate::types::ParamType;

/// Encode tokens against their declared types
///
/// Every token is validated against its type before any byte is written.
pub fn encode(types: &[ParamType], tokens: &[Token]) -> AbiResult<Vec<u8>> {
    let refs: Vec<&ParamType> = types.iter().collect();
    encode_refs(&refs, tokens)
}

/// Encode a function call: selector followed by the encoded parameters
pub fn encode_function_call(
    selector: [u8; 4],
    types: &[ParamType],
    tokens: &[Token],
) -> AbiResult<Vec<u8>> {
    let mut result = selector.to_vec();
    result.extend(encode(types, tokens)?);
    Ok(result)
}

pub(crate) fn encode_refs(types: &[&ParamType], tokens: &[Token]) -> AbiResult<Vec<u8>> {
    if types.len() != tokens.len() {
        return Err(AbiError::ArityMismatch {
            expected: types.len(),
            actual: tokens.len(),
        });
    }
    types.iter().try_for_each(|ty| ty.validate())?;
    encode_params(types.iter().copied().zip(tokens))
}

/// Encode a sequence of parameters into its own head/tail region.
///
/// Offsets written into the head are relative to the start of this region.
fn encode_params<'a>(
    params: impl Iterator<Item = (&'a ParamType, &'a Token)> + Clone,
) -> AbiResult<Vec<u8>> {
    let head_size: usize = params.clone().map(|(ty, _)| ty.head_size()).sum();

    let mut head = Vec::with_capacity(head_size);
    let mut tail = Vec::new();
    // (position of the pointer word in head, start of the payload in tail)
    let mut pointers = Vec::new();

    for (param_type, token) in params {
        if param_type.is_dynamic() {
            pointers.push((head.len(), tail.len()));
            head.extend_from_slice(&[0u8; WORD_SIZE]);
            encode_token(param_type, token, &mut tail)?;
        } else {
            encode_token(param_type, token, &mut head)?;
        }
    }
    debug_assert_eq!(head.len(), head_size);

    for (position, tail_start) in pointers {
        let offset = u256_to_word(&U256::from(head_size + tail_start));
        head[position..position + WORD_SIZE].copy_from_slice(&offset);
    }

    head.extend(tail);
    Ok(head)
}

/// Encode a single token, appending its bytes to `out`
fn encode_token(param_type: &ParamType, token: &Token, out: &mut Vec<u8>) -> AbiResult<()> {
    match (param_type, token) {
        (ParamType::Address, Token::Address(addr)) => out.extend_from_slice(&addr.to_word()),
        (ParamType::Uint(bits), Token::Uint(value)) => {
            if value.bits() > *bits {
                return Err(AbiError::ValueOutOfRange {
                    ty: param_type.to_string(),
                    value: value.to_string(),
                });
            }
            out.extend_from_slice(&u256_to_word(value));
        }
        (ParamType::Int(bits), Token::Int(value)) => {
            if !value.fits_bits(*bits) {
                return Err(AbiError::ValueOutOfRange {
                    ty: param_type.to_string(),
                    value: value.to_string(),
                });
            }
            out.extend_from_slice(&value.to_twos_complement());
        }
        (ParamType::Bool, Token::Bool(b)) => {
            let mut word = [0u8; WORD_SIZE];
            word[WORD_SIZE - 1] = u8::from(*b);
            out.extend_from_slice(&word);
        }
        (ParamType::FixedBytes(size), Token::FixedBytes(data)) => {
            if data.len() > *size {
                return Err(AbiError::ByteLengthMismatch {
                    ty: param_type.to_string(),
                    expected: *size,
                    actual: data.len(),
                });
            }
            let mut word = [0u8; WORD_SIZE];
            word[..data.len()].copy_from_slice(data);
            out.extend_from_slice(&word);
        }
        (ParamType::Bytes, Token::Bytes(data)) => encode_packed_seq(data, out),
        (ParamType::String, Token::String(s)) => encode_packed_seq(s.as_bytes(), out),
        (ParamType::Array(inner), Token::Array(tokens)) => {
            out.extend_from_slice(&u256_to_word(&U256::from(tokens.len())));
            out.extend(encode_params(std::iter::repeat(&**inner).zip(tokens))?);
        }
        (ParamType::FixedArray(inner, size), Token::FixedArray(tokens)) => {
            if tokens.len() != *size {
                return Err(AbiError::TypeValueMismatch {
                    expected: param_type.to_string(),
                    actual: format!("array of {} elements", tokens.len()),
                });
            }
            out.extend(encode_params(std::iter::repeat(&**inner).zip(tokens))?);
        }
        (ParamType::Tuple(components), Token::Tuple(tokens)) => {
            if tokens.len() != components.len() {
                return Err(AbiError::TypeValueMismatch {
                    expected: param_type.to_string(),
                    actual: format!("tuple of {} values", tokens.len()),
                });
            }
            out.extend(encode_params(components.iter().map(|c| &c.ty).zip(tokens))?);
        }
        _ => {
            return Err(AbiError::TypeValueMismatch {
                expected: param_type.to_string(),
                actual: token.kind_name().to_owned(),
            })
        }
    }
    Ok(())
}

/// Length word followed by the data right-padded to a word boundary
fn encode_packed_seq(data: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(&u256_to_word(&U256::from(data.len())));
    out.extend_from_slice(data);
    let padded_len = data.len().div_ceil(WORD_SIZE) * WORD_SIZE;
    out.resize(out.len() + padded_len - data.len(), 0);
}
