//! Structured ABI descriptions (the JSON emitted by `solc --abi`)

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AbiError, AbiResult};
use crate::fragment::{Fragment, Param};
use crate::parser::{apply_array_suffix, parse_type, MAX_TYPE_DEPTH};
use crate::types::{ParamType, TupleComponent};

/// One parameter of a JSON ABI item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiParam {
    /// Parameter name
    #[serde(default)]
    pub name: String,
    /// Type string, `tuple`-prefixed for structs (e.g. "tuple[]")
    #[serde(rename = "type")]
    pub kind: String,
    /// Struct members when `kind` starts with `tuple`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<AbiParam>,
    /// Indexed flag for event parameters
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub indexed: bool,
    /// Source-level type name, informational only
    #[serde(default, rename = "internalType", skip_serializing_if = "Option::is_none")]
    pub internal_type: Option<String>,
}

impl AbiParam {
    /// Resolve the type, building tuples from `components`
    pub fn param_type(&self) -> AbiResult<ParamType> {
        self.resolve(0)
    }

    fn resolve(&self, depth: usize) -> AbiResult<ParamType> {
        if depth > MAX_TYPE_DEPTH {
            return Err(AbiError::signature(&self.kind, "type nesting too deep"));
        }
        match self.kind.strip_prefix("tuple") {
            Some(suffix) if !suffix.starts_with('(') => {
                let components = self
                    .components
                    .iter()
                    .map(|c| Ok(TupleComponent::new(c.name.clone(), c.resolve(depth + 1)?)))
                    .collect::<AbiResult<Vec<_>>>()?;
                apply_array_suffix(ParamType::Tuple(components), suffix, &self.kind)
            }
            _ => parse_type(&self.kind),
        }
    }

    /// Convert into a fragment parameter
    pub fn to_param(&self) -> AbiResult<Param> {
        Ok(Param {
            name: self.name.clone(),
            ty: self.param_type()?,
            indexed: self.indexed,
        })
    }
}

fn default_item_kind() -> String {
    "function".to_owned()
}

/// One entry of a JSON ABI array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbiItem {
    /// `function`, `constructor`, `event`, `error`, `fallback` or `receive`
    #[serde(rename = "type", default = "default_item_kind")]
    pub kind: String,
    /// Item name (absent for constructor, fallback and receive)
    #[serde(default)]
    pub name: String,
    /// Input parameters
    #[serde(default)]
    pub inputs: Vec<AbiParam>,
    /// Output parameters
    #[serde(default)]
    pub outputs: Vec<AbiParam>,
    /// Anonymous flag for events
    #[serde(default)]
    pub anonymous: bool,
    /// `pure`, `view`, `nonpayable` or `payable`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_mutability: Option<String>,
}

impl AbiItem {
    /// Convert into a fragment; `fallback` and `receive` have no calldata
    /// layout and yield `None`
    pub fn to_fragment(&self) -> AbiResult<Option<Fragment>> {
        let inputs = params(&self.inputs)?;
        let fragment = match self.kind.as_str() {
            "function" => Fragment::function(self.name.clone(), inputs, params(&self.outputs)?),
            "event" => Fragment::event(self.name.clone(), inputs, self.anonymous),
            "error" => Fragment::error(self.name.clone(), inputs),
            "constructor" => Fragment::constructor(inputs),
            "fallback" | "receive" => return Ok(None),
            other => {
                return Err(AbiError::InvalidAbiJson(format!(
                    "unknown item type {:?}",
                    other
                )))
            }
        };
        Ok(Some(fragment))
    }
}

fn params(items: &[AbiParam]) -> AbiResult<Vec<Param>> {
    items.iter().map(AbiParam::to_param).collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AbiDocument {
    Items(Vec<AbiItem>),
    Artifact { abi: Vec<AbiItem> },
}

/// Parse a JSON ABI, either a bare array or a build artifact with an `abi` field
pub fn parse_abi_items(json: &str) -> AbiResult<Vec<AbiItem>> {
    Ok(match serde_json::from_str::<AbiDocument>(json)? {
        AbiDocument::Items(items) => items,
        AbiDocument::Artifact { abi } => abi,
    })
}

/// Parse a JSON ABI into fragments, skipping `fallback` and `receive`
pub fn parse_abi_json(json: &str) -> AbiResult<Vec<Fragment>> {
    let mut fragments = Vec::new();
    for item in parse_abi_items(json)? {
        if let Some(fragment) = item.to_fragment()? {
            fragments.push(fragment);
        }
    }
    debug!(fragments = fragments.len(), "loaded JSON ABI");
    Ok(fragments)
}
