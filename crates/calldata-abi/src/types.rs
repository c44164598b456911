//! ABI type descriptors

use std::fmt;

use calldata_primitives::WORD_SIZE;

use crate::error::{AbiError, AbiResult};

/// Solidity parameter types
///
/// A `ParamType` is built once (usually by [`parse_type`](crate::parse_type))
/// and never mutated afterwards, so it can be shared freely between encode
/// and decode calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamType {
    /// Address
    Address,
    /// Unsigned integer with bit size (8, 16, ..., 256)
    Uint(usize),
    /// Signed integer with bit size (8, 16, ..., 256)
    Int(usize),
    /// Boolean
    Bool,
    /// Dynamic bytes
    Bytes,
    /// Fixed-size bytes (size 1-32)
    FixedBytes(usize),
    /// UTF-8 string
    String,
    /// Dynamic array
    Array(Box<ParamType>),
    /// Fixed-size array
    FixedArray(Box<ParamType>, usize),
    /// Tuple
    Tuple(Vec<TupleComponent>),
}

/// Named member of a tuple type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TupleComponent {
    /// Component name, empty when unnamed
    pub name: String,
    /// Component type
    pub ty: ParamType,
}

impl TupleComponent {
    /// Create a named component
    pub fn new(name: impl Into<String>, ty: ParamType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    /// Create an unnamed component
    pub fn unnamed(ty: ParamType) -> Self {
        Self::new(String::new(), ty)
    }
}

impl ParamType {
    /// Build a tuple from unnamed component types
    pub fn tuple(types: impl IntoIterator<Item = ParamType>) -> Self {
        ParamType::Tuple(types.into_iter().map(TupleComponent::unnamed).collect())
    }

    /// Check if this type is dynamic (variable length)
    pub fn is_dynamic(&self) -> bool {
        match self {
            ParamType::Bytes | ParamType::String | ParamType::Array(_) => true,
            ParamType::FixedArray(inner, _) => inner.is_dynamic(),
            ParamType::Tuple(components) => components.iter().any(|c| c.ty.is_dynamic()),
            _ => false,
        }
    }

    /// Encoded width in bytes of a static type, `None` for dynamic types
    pub fn static_size(&self) -> Option<usize> {
        if self.is_dynamic() {
            None
        } else {
            Some(self.head_size())
        }
    }

    /// Bytes this type occupies in the head of an enclosing sequence.
    ///
    /// Dynamic types take a single pointer word; static arrays and tuples are
    /// laid out inline.
    pub fn head_size(&self) -> usize {
        match self {
            ParamType::FixedArray(inner, len) if !inner.is_dynamic() => {
                inner.head_size().saturating_mul(*len)
            }
            ParamType::Tuple(components) if !self.is_dynamic() => components
                .iter()
                .fold(0usize, |acc, c| acc.saturating_add(c.ty.head_size())),
            _ => WORD_SIZE,
        }
    }

    /// Nesting depth of the type tree (elementary types have depth 1)
    pub fn depth(&self) -> usize {
        match self {
            ParamType::Array(inner) | ParamType::FixedArray(inner, _) => 1 + inner.depth(),
            ParamType::Tuple(components) => {
                1 + components.iter().map(|c| c.ty.depth()).max().unwrap_or(0)
            }
            _ => 1,
        }
    }

    /// Whether the value is stored directly in an event topic
    /// rather than hashed
    pub fn is_value_type(&self) -> bool {
        matches!(
            self,
            ParamType::Address
                | ParamType::Uint(_)
                | ParamType::Int(_)
                | ParamType::Bool
                | ParamType::FixedBytes(_)
        )
    }

    /// Canonical type string, as used in signatures
    pub fn canonical(&self) -> String {
        self.to_string()
    }

    /// Check the widths of a type tree that was built by hand.
    ///
    /// Integer widths must be multiples of 8 in `8..=256` and fixed bytes
    /// widths must lie in `1..=32`. Types from the parser always pass.
    pub fn validate(&self) -> AbiResult<()> {
        match self {
            ParamType::Uint(bits) | ParamType::Int(bits)
                if *bits == 0 || *bits > 256 || bits % 8 != 0 =>
            {
                Err(AbiError::signature(
                    &self.to_string(),
                    format!("bit width {} is not a multiple of 8 in 8..=256", bits),
                ))
            }
            ParamType::FixedBytes(size) if !(1..=WORD_SIZE).contains(size) => {
                Err(AbiError::signature(
                    &self.to_string(),
                    format!("fixed bytes width {} outside 1..=32", size),
                ))
            }
            ParamType::Array(inner) | ParamType::FixedArray(inner, _) => inner.validate(),
            ParamType::Tuple(components) => components.iter().try_for_each(|c| c.ty.validate()),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Address => f.write_str("address"),
            ParamType::Uint(bits) => write!(f, "uint{}", bits),
            ParamType::Int(bits) => write!(f, "int{}", bits),
            ParamType::Bool => f.write_str("bool"),
            ParamType::Bytes => f.write_str("bytes"),
            ParamType::FixedBytes(size) => write!(f, "bytes{}", size),
            ParamType::String => f.write_str("string"),
            ParamType::Array(inner) => write!(f, "{}[]", inner),
            ParamType::FixedArray(inner, len) => write!(f, "{}[{}]", inner, len),
            ParamType::Tuple(components) => {
                f.write_str("(")?;
                for (i, component) in components.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", component.ty)?;
                }
                f.write_str(")")
            }
        }
    }
}
