//! Matching raw revert or call data against declared fragments

use std::fmt;
use std::sync::LazyLock;

use tracing::{debug, trace};

use crate::decode::Decoder;
use crate::error::MatchError;
use crate::fragment::{Fragment, FragmentKind, NamedTokens, PanicCode};
use crate::token::Token;

/// `Error(string)` and `Panic(uint256)`, tried after the caller's candidates
static BUILTIN_ERRORS: LazyLock<[Fragment; 2]> =
    LazyLock::new(|| [Fragment::error_string(), Fragment::panic()]);

const ERROR_STRING_SIGNATURE: &str = "Error(string)";
const PANIC_SIGNATURE: &str = "Panic(uint256)";

/// Built-in error fragments every contract can revert with
pub fn builtin_errors() -> &'static [Fragment] {
    &BUILTIN_ERRORS[..]
}

/// A fragment whose selector matched, with the decoded arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedFragment<'a> {
    /// Matched fragment, either a candidate or a built-in
    pub fragment: &'a Fragment,
    /// Arguments decoded from the bytes after the selector
    pub values: NamedTokens,
}

/// Match `raw` against `candidates` and the built-in errors, then decode
pub fn match_and_decode<'a>(
    raw: &[u8],
    candidates: &'a [Fragment],
) -> Result<MatchedFragment<'a>, MatchError> {
    match_and_decode_with(&Decoder::default(), raw, candidates)
}

/// [`match_and_decode`] with an explicit decoder configuration
///
/// Functions and errors are considered; events and constructors have no
/// selector prefix and are skipped. When several fragments share a selector
/// the first one whose payload decodes wins; if none decodes, the error of the
/// first one is reported as [`MatchError::FragmentDecode`].
pub fn match_and_decode_with<'a>(
    decoder: &Decoder,
    raw: &[u8],
    candidates: &'a [Fragment],
) -> Result<MatchedFragment<'a>, MatchError> {
    if raw.is_empty() {
        return Err(MatchError::EmptyData);
    }
    let Some(selector) = raw.get(..4) else {
        trace!(len = raw.len(), "data shorter than a selector");
        return Err(MatchError::NoMatch(raw.to_vec()));
    };

    let declared = candidates
        .iter()
        .filter(|f| matches!(f.kind(), FragmentKind::Function | FragmentKind::Error))
        .map(|f| (f, false));
    let builtins: &'a [Fragment] = builtin_errors();
    let builtins = builtins.iter().map(|f| (f, true));

    let mut failure = None;
    for (fragment, builtin) in declared.chain(builtins) {
        if fragment.selector()[..] != *selector {
            continue;
        }
        if builtin {
            debug!(signature = fragment.signature(), "falling back to built-in error fragment");
        }
        match fragment.decode_input_with(decoder, raw) {
            Ok(values) => return Ok(MatchedFragment { fragment, values }),
            Err(source) => {
                debug!(
                    signature = fragment.signature(),
                    error = %source,
                    "selector matched but payload failed to decode"
                );
                if failure.is_none() {
                    failure = Some(MatchError::FragmentDecode {
                        signature: fragment.signature().to_owned(),
                        source,
                    });
                }
            }
        }
    }

    Err(failure.unwrap_or_else(|| MatchError::NoMatch(selector.to_vec())))
}

/// Interpreted revert data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revert {
    /// `revert("reason")` / `require(cond, "reason")`
    Reason(String),
    /// Compiler-inserted panic
    Panic(PanicCode),
    /// Custom error declared by the contract
    Custom {
        /// Error name
        name: String,
        /// Canonical signature
        signature: String,
        /// 4-byte selector
        selector: [u8; 4],
        /// Decoded arguments
        args: NamedTokens,
    },
}

impl fmt::Display for Revert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Revert::Reason(reason) => write!(f, "execution reverted: {}", reason),
            Revert::Panic(code) => write!(f, "execution reverted: {}", code),
            Revert::Custom { signature, .. } => write!(f, "execution reverted: {}", signature),
        }
    }
}

/// Decode revert data into a reason, a panic or a custom error
pub fn decode_revert(raw: &[u8], candidates: &[Fragment]) -> Result<Revert, MatchError> {
    decode_revert_with(&Decoder::default(), raw, candidates)
}

/// [`decode_revert`] with an explicit decoder configuration
pub fn decode_revert_with(
    decoder: &Decoder,
    raw: &[u8],
    candidates: &[Fragment],
) -> Result<Revert, MatchError> {
    let MatchedFragment { fragment, values } = match_and_decode_with(decoder, raw, candidates)?;
    let builtin = match (fragment.signature(), values.tokens()) {
        (ERROR_STRING_SIGNATURE, [Token::String(reason)]) => Some(Revert::Reason(reason.clone())),
        (PANIC_SIGNATURE, [Token::Uint(code)]) => Some(Revert::Panic(PanicCode::from(*code))),
        _ => None,
    };
    Ok(builtin.unwrap_or_else(|| Revert::Custom {
        name: fragment.name().to_owned(),
        signature: fragment.signature().to_owned(),
        selector: fragment.selector(),
        args: values,
    }))
}
