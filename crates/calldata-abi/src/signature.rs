//! Canonical signatures, selectors and event topics

use calldata_crypto::{keccak256, selector_of};
use calldata_primitives::H256;

use crate::types::ParamType;

/// Render `name(type1,type2,...)` with every type in canonical form
pub fn canonical_signature(name: &str, types: &[ParamType]) -> String {
    let params: Vec<String> = types.iter().map(ParamType::canonical).collect();
    format!("{}({})", name, params.join(","))
}

/// Compute the 4-byte selector of `name(types...)`
pub fn selector(name: &str, types: &[ParamType]) -> [u8; 4] {
    function_selector(&canonical_signature(name, types))
}

/// Compute the selector of an already canonical signature string
/// (first 4 bytes of keccak256(signature))
pub fn function_selector(signature: &str) -> [u8; 4] {
    selector_of(signature.as_bytes())
}

/// Full 32-byte digest of `name(types...)`, used as `topics[0]` of an event log
pub fn event_topic(name: &str, types: &[ParamType]) -> H256 {
    keccak256(canonical_signature(name, types).as_bytes())
}
