//! Type signature parsing
//!
//! Accepts the canonical Solidity type grammar plus the usual shorthands:
//! `uint`/`int` for their 256-bit forms, `function` for `bytes24`, bare
//! `(...)` for tuples, and optional component names inside tuple lists.

use crate::error::{AbiError, AbiResult};
use crate::types::{ParamType, TupleComponent};

/// Maximum nesting of arrays and tuples accepted by the parser
pub const MAX_TYPE_DEPTH: usize = 32;

/// A parameter as written in a human-readable signature,
/// e.g. `uint256 indexed amount`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedParam {
    /// Parameter type
    pub ty: ParamType,
    /// Parameter name, empty when omitted
    pub name: String,
    /// Whether the `indexed` keyword was present
    pub indexed: bool,
}

/// Parse a single type string (e.g., "uint256", "tuple(address,uint256[])[]")
pub fn parse_type(s: &str) -> AbiResult<ParamType> {
    parse_type_at(s.trim(), s, 0)
}

/// Parse a parameter list, either parenthesised `(a,b)` or bare `a,b`
pub fn parse_types(s: &str) -> AbiResult<Vec<ParamType>> {
    Ok(parse_params(s)?.into_iter().map(|p| p.ty).collect())
}

/// Parse a parameter list keeping names and `indexed` markers
pub fn parse_params(s: &str) -> AbiResult<Vec<ParsedParam>> {
    let trimmed = s.trim();
    let inner = if trimmed.starts_with('(') {
        match matching_close(trimmed) {
            Some(close) if close == trimmed.len() - 1 => &trimmed[1..close],
            Some(_) => trimmed,
            None => return Err(AbiError::signature(s, "unbalanced parentheses")),
        }
    } else {
        trimmed
    };
    split_top_level(inner, s)?
        .into_iter()
        .map(|part| parse_param_at(part, s, 0))
        .collect()
}

/// Parse `name(type,...)` into the name and its parameter types
pub fn parse_signature(s: &str) -> AbiResult<(String, Vec<ParamType>)> {
    let (name, params) = parse_signature_params(s)?;
    Ok((name, params.into_iter().map(|p| p.ty).collect()))
}

/// Parse `name(type name,...)` keeping parameter names
pub fn parse_signature_params(s: &str) -> AbiResult<(String, Vec<ParsedParam>)> {
    let trimmed = s.trim();
    let open = trimmed
        .find('(')
        .ok_or_else(|| AbiError::signature(s, "missing parameter list"))?;
    let name = trimmed[..open].trim();
    if !is_identifier(name) {
        return Err(AbiError::signature(s, format!("invalid name {:?}", name)));
    }
    Ok((name.to_owned(), parse_params(&trimmed[open..])?))
}

/// Wrap `base` in the array suffixes of `suffix` (e.g. "[2][]")
pub(crate) fn apply_array_suffix(base: ParamType, suffix: &str, full: &str) -> AbiResult<ParamType> {
    let mut ty = base;
    let mut rest = suffix.trim();
    while !rest.is_empty() {
        let body = rest
            .strip_prefix('[')
            .ok_or_else(|| AbiError::signature(full, "expected '['"))?;
        let close = body
            .find(']')
            .ok_or_else(|| AbiError::signature(full, "unbalanced brackets"))?;
        ty = wrap_array(ty, &body[..close], full)?;
        rest = &body[close + 1..];
    }
    if ty.depth() > MAX_TYPE_DEPTH {
        return Err(AbiError::signature(full, "type nesting too deep"));
    }
    Ok(ty)
}

fn parse_type_at(s: &str, full: &str, depth: usize) -> AbiResult<ParamType> {
    if depth > MAX_TYPE_DEPTH {
        return Err(AbiError::signature(full, "type nesting too deep"));
    }
    if s.is_empty() {
        return Err(AbiError::signature(full, "empty type"));
    }

    // Array suffixes are peeled right to left: the last one is the outermost.
    if s.ends_with(']') {
        let open = s
            .rfind('[')
            .ok_or_else(|| AbiError::signature(full, "unbalanced brackets"))?;
        let inner = parse_type_at(s[..open].trim_end(), full, depth + 1)?;
        return wrap_array(inner, &s[open + 1..s.len() - 1], full);
    }

    if let Some(list) = s.strip_prefix("tuple").filter(|r| r.starts_with('(')).or_else(|| {
        s.starts_with('(').then_some(s)
    }) {
        if matching_close(list) != Some(list.len() - 1) {
            return Err(AbiError::signature(full, "unbalanced parentheses"));
        }
        let components = split_top_level(&list[1..list.len() - 1], full)?
            .into_iter()
            .map(|part| {
                let param = parse_param_at(part, full, depth + 1)?;
                if param.indexed {
                    return Err(AbiError::signature(full, "indexed is not allowed in tuples"));
                }
                Ok(TupleComponent::new(param.name, param.ty))
            })
            .collect::<AbiResult<Vec<_>>>()?;
        return Ok(ParamType::Tuple(components));
    }

    parse_elementary(s, full)
}

fn parse_elementary(s: &str, full: &str) -> AbiResult<ParamType> {
    match s {
        "address" => return Ok(ParamType::Address),
        "bool" => return Ok(ParamType::Bool),
        "string" => return Ok(ParamType::String),
        "bytes" => return Ok(ParamType::Bytes),
        "function" => return Ok(ParamType::FixedBytes(24)),
        "uint" => return Ok(ParamType::Uint(256)),
        "int" => return Ok(ParamType::Int(256)),
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("uint") {
        return Ok(ParamType::Uint(parse_bit_width(rest, full)?));
    }
    if let Some(rest) = s.strip_prefix("int") {
        return Ok(ParamType::Int(parse_bit_width(rest, full)?));
    }
    if let Some(rest) = s.strip_prefix("bytes") {
        let size = parse_decimal(rest)
            .ok_or_else(|| AbiError::signature(full, format!("unknown type {:?}", s)))?;
        if !(1..=32).contains(&size) {
            return Err(AbiError::signature(
                full,
                format!("fixed bytes width {} outside 1..=32", size),
            ));
        }
        return Ok(ParamType::FixedBytes(size));
    }

    Err(AbiError::signature(full, format!("unknown type {:?}", s)))
}

fn parse_bit_width(rest: &str, full: &str) -> AbiResult<usize> {
    let bits = parse_decimal(rest)
        .ok_or_else(|| AbiError::signature(full, format!("invalid bit width {:?}", rest)))?;
    if bits == 0 || bits > 256 || bits % 8 != 0 {
        return Err(AbiError::signature(
            full,
            format!("bit width {} is not a multiple of 8 in 8..=256", bits),
        ));
    }
    Ok(bits)
}

fn wrap_array(inner: ParamType, dim: &str, full: &str) -> AbiResult<ParamType> {
    let dim = dim.trim();
    if dim.is_empty() {
        return Ok(ParamType::Array(Box::new(inner)));
    }
    match parse_decimal(dim) {
        Some(0) => Err(AbiError::signature(full, "fixed array length must be positive")),
        Some(len) => Ok(ParamType::FixedArray(Box::new(inner), len)),
        None => Err(AbiError::signature(full, format!("invalid array length {:?}", dim))),
    }
}

fn parse_param_at(s: &str, full: &str, depth: usize) -> AbiResult<ParsedParam> {
    let s = s.trim();
    let split = top_level_whitespace(s).unwrap_or(s.len());
    let ty = parse_type_at(s[..split].trim(), full, depth)?;

    let mut words = s[split..].split_whitespace();
    let mut indexed = false;
    let mut name = String::new();
    if let Some(word) = words.next() {
        if word == "indexed" {
            indexed = true;
            if let Some(n) = words.next() {
                name = n.to_owned();
            }
        } else {
            name = word.to_owned();
        }
    }
    if words.next().is_some() || !(name.is_empty() || is_identifier(&name)) {
        return Err(AbiError::signature(full, format!("invalid parameter {:?}", s)));
    }
    Ok(ParsedParam { ty, name, indexed })
}

/// Split on commas outside of parentheses and brackets
fn split_top_level<'a>(s: &'a str, full: &str) -> AbiResult<Vec<&'a str>> {
    if s.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => {
                depth -= 1;
                if depth < 0 {
                    return Err(AbiError::signature(full, "unbalanced brackets"));
                }
            }
            ',' if depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(AbiError::signature(full, "unbalanced brackets"));
    }
    parts.push(s[start..].trim());
    if parts.iter().any(|p| p.is_empty()) {
        return Err(AbiError::signature(full, "empty type in list"));
    }
    Ok(parts)
}

/// Index of the parenthesis closing the one at position 0
pub(crate) fn matching_close(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn top_level_whitespace(s: &str) -> Option<usize> {
    let mut depth = 0i32;
    for (i, c) in s.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            c if c.is_whitespace() && depth == 0 => {
                // "uint256 [2]" keeps the suffix attached to the type
                if s[i..].trim_start().starts_with('[') {
                    continue;
                }
                return Some(i);
            }
            _ => {}
        }
    }
    None
}

/// Decimal without sign or leading zeros
fn parse_decimal(s: &str) -> Option<usize> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) || (s.len() > 1 && s.starts_with('0')) {
        return None;
    }
    s.parse().ok()
}

pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
