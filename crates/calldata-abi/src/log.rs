//! Event log decoding and topic encoding

use std::slice;

use calldata_crypto::keccak256;
use calldata_primitives::{H256, WORD_SIZE};
use tracing::trace;

use crate::decode::Decoder;
use crate::encode::encode_refs;
use crate::error::{AbiError, AbiResult};
use crate::fragment::{Fragment, FragmentKind, NamedTokens, Param};
use crate::token::Token;
use crate::types::ParamType;

/// Decode a log emitted by `event` using the default decoder configuration
pub fn decode_log(event: &Fragment, topics: &[H256], data: &[u8]) -> AbiResult<NamedTokens> {
    decode_log_with(&Decoder::default(), event, topics, data)
}

/// Decode a log emitted by `event`.
///
/// Indexed value types are decoded from their topic. Indexed strings, bytes,
/// arrays and tuples are stored as a hash, so they come back as
/// `Token::FixedBytes` holding the 32-byte topic. Everything else is decoded
/// from `data`.
pub fn decode_log_with(
    decoder: &Decoder,
    event: &Fragment,
    topics: &[H256],
    data: &[u8],
) -> AbiResult<NamedTokens> {
    check_event(event)?;
    let indexed = event.inputs().iter().filter(|p| p.indexed).count();
    let first = if event.is_anonymous() { 0 } else { 1 };
    let expected = indexed + first;
    if topics.len() != expected {
        trace!(expected, actual = topics.len(), "log topic count mismatch");
        return Err(AbiError::TopicCountMismatch {
            expected,
            actual: topics.len(),
        });
    }
    if !event.is_anonymous() && topics[0] != event.topic() {
        return Err(AbiError::TopicMismatch {
            expected: event.topic(),
            actual: topics[0],
        });
    }

    let body: Vec<&Param> = event.inputs().iter().filter(|p| !p.indexed).collect();
    let body_types: Vec<&ParamType> = body.iter().map(|p| &p.ty).collect();
    let mut body_tokens = decoder.decode_refs(&body_types, data, 0)?.into_iter();
    let mut indexed_topics = topics[first..].iter();

    let mut tokens = Vec::with_capacity(event.inputs().len());
    for param in event.inputs() {
        let token = if param.indexed {
            let topic = indexed_topics.next().ok_or(AbiError::TopicCountMismatch {
                expected,
                actual: topics.len(),
            })?;
            if param.ty.is_value_type() {
                decoder.decode_word(&param.ty, topic.as_bytes())?
            } else {
                Token::FixedBytes(topic.as_bytes().to_vec())
            }
        } else {
            body_tokens.next().ok_or(AbiError::ArityMismatch {
                expected: body.len(),
                actual: tokens.len(),
            })?
        };
        tokens.push(token);
    }
    Ok(NamedTokens::from_params(event.inputs(), tokens))
}

/// Build the topics a log of `event` with the given indexed values carries.
///
/// `indexed_values` holds one value per indexed parameter, in declaration
/// order. The signature topic comes first unless the event is anonymous.
pub fn encode_topics(event: &Fragment, indexed_values: &[Token]) -> AbiResult<Vec<H256>> {
    check_event(event)?;
    let indexed: Vec<&Param> = event.inputs().iter().filter(|p| p.indexed).collect();
    if indexed.len() != indexed_values.len() {
        return Err(AbiError::ArityMismatch {
            expected: indexed.len(),
            actual: indexed_values.len(),
        });
    }

    let mut topics = Vec::with_capacity(indexed.len() + 1);
    if !event.is_anonymous() {
        topics.push(event.topic());
    }
    for (param, value) in indexed.iter().zip(indexed_values) {
        topics.push(encode_topic(&param.ty, value)?);
    }
    Ok(topics)
}

/// Encode one indexed value as a topic word
pub fn encode_topic(ty: &ParamType, value: &Token) -> AbiResult<H256> {
    if ty.is_value_type() {
        let encoded = encode_refs(&[ty], slice::from_ref(value))?;
        return H256::from_slice(&encoded).map_err(|_| AbiError::ByteLengthMismatch {
            ty: ty.to_string(),
            expected: WORD_SIZE,
            actual: encoded.len(),
        });
    }
    let mut preimage = Vec::new();
    topic_preimage(ty, value, false, &mut preimage)?;
    Ok(keccak256(&preimage))
}

fn check_event(event: &Fragment) -> AbiResult<()> {
    if event.kind() != FragmentKind::Event {
        return Err(AbiError::TypeValueMismatch {
            expected: "event".to_owned(),
            actual: event.kind().to_string(),
        });
    }
    Ok(())
}

/// In-place encoding hashed for indexed reference types: no length words or
/// offsets; nested byte strings are padded to whole words, top-level ones are not
fn topic_preimage(ty: &ParamType, value: &Token, nested: bool, out: &mut Vec<u8>) -> AbiResult<()> {
    let mismatch = || AbiError::TypeValueMismatch {
        expected: ty.to_string(),
        actual: value.kind_name().to_owned(),
    };
    if !value.type_check(ty) {
        return Err(mismatch());
    }

    match (ty, value) {
        (ParamType::String, Token::String(s)) => push_bytes(s.as_bytes(), nested, out),
        (ParamType::Bytes, Token::Bytes(b)) => push_bytes(b, nested, out),
        (ParamType::Array(inner), Token::Array(items))
        | (ParamType::FixedArray(inner, _), Token::FixedArray(items)) => {
            for item in items {
                topic_preimage(inner, item, true, out)?;
            }
        }
        (ParamType::Tuple(components), Token::Tuple(items)) => {
            for (component, item) in components.iter().zip(items) {
                topic_preimage(&component.ty, item, true, out)?;
            }
        }
        _ if ty.is_value_type() => out.extend(encode_refs(&[ty], slice::from_ref(value))?),
        _ => return Err(mismatch()),
    }
    Ok(())
}

fn push_bytes(bytes: &[u8], nested: bool, out: &mut Vec<u8>) {
    out.extend_from_slice(bytes);
    if nested {
        let padded = bytes.len().div_ceil(WORD_SIZE) * WORD_SIZE;
        out.resize(out.len() + padded - bytes.len(), 0);
    }
}
