//! EIP-712 typed structured data
//!
//! Struct types are declared by name in a [`TypedData`] document and values
//! arrive as JSON. Atomic members go through the regular word encoder, while
//! `bytes`, `string`, arrays and nested structs are replaced by their
//! Keccak-256 digest.
//!
//! <https://eips.ethereum.org/EIPS/eip-712>

use std::collections::{BTreeMap, BTreeSet};
use std::slice;

use calldata_crypto::keccak256;
use calldata_primitives::{Address, H256, U256, WORD_SIZE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::encode::encode;
use crate::error::{AbiError, AbiResult};
use crate::parser::{parse_type, MAX_TYPE_DEPTH};
use crate::token::{Token, I256};
use crate::types::ParamType;

/// Struct name of the signing domain
pub const DOMAIN_TYPE: &str = "EIP712Domain";

/// Prefix of every encoded typed-data message
pub const MESSAGE_PREFIX: [u8; 2] = [0x19, 0x01];

/// One member of a typed-data struct
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypedField {
    /// Member name
    pub name: String,
    /// Solidity type or struct name, possibly with array suffixes
    #[serde(rename = "type")]
    pub kind: String,
}

impl TypedField {
    /// Create a member
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
        }
    }

    fn root_type(&self) -> &str {
        self.kind.split_once('[').map_or(&self.kind, |(root, _)| root)
    }
}

/// A typed-data document as passed to `eth_signTypedData`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedData {
    /// Struct declarations, including [`DOMAIN_TYPE`]
    pub types: BTreeMap<String, Vec<TypedField>>,
    /// Struct that `message` is an instance of
    pub primary_type: String,
    /// Domain values
    pub domain: Value,
    /// Message values
    pub message: Value,
}

impl TypedData {
    /// Parse a JSON typed-data document
    pub fn from_json(json: &str) -> AbiResult<Self> {
        let data: Self = serde_json::from_str(json).map_err(|e| invalid(e.to_string()))?;
        debug!(
            primary_type = %data.primary_type,
            types = data.types.len(),
            "loaded typed data"
        );
        Ok(data)
    }

    /// Members of the struct `name`
    pub fn fields(&self, name: &str) -> AbiResult<&[TypedField]> {
        self.types
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| invalid(format!("undeclared struct {}", name)))
    }

    /// `encodeType`: the struct itself followed by every struct it references,
    /// sorted by name
    pub fn encode_type(&self, name: &str) -> AbiResult<String> {
        let mut out = render_struct(name, self.fields(name)?);

        let mut referenced = BTreeSet::new();
        self.collect_references(name, &mut referenced);
        referenced.remove(name);
        for dep in referenced {
            out.push_str(&render_struct(dep, self.fields(dep)?));
        }
        Ok(out)
    }

    /// Keccak-256 of [`encode_type`](Self::encode_type)
    pub fn type_hash(&self, name: &str) -> AbiResult<H256> {
        self.encode_type(name).map(|s| keccak256(s.as_bytes()))
    }

    /// `encodeData`: the type hash followed by one word per member
    pub fn encode_data(&self, name: &str, value: &Value) -> AbiResult<Vec<u8>> {
        self.encode_data_at(name, value, 0)
    }

    /// `hashStruct`: Keccak-256 of [`encode_data`](Self::encode_data)
    pub fn hash_struct(&self, name: &str, value: &Value) -> AbiResult<H256> {
        self.encode_data(name, value).map(|data| keccak256(&data))
    }

    /// `hashStruct(EIP712Domain, domain)`
    pub fn domain_separator(&self) -> AbiResult<H256> {
        self.hash_struct(DOMAIN_TYPE, &self.domain)
    }

    /// `0x19 0x01 ‖ domainSeparator ‖ hashStruct(message)`.
    ///
    /// The message hash is left out when the primary type is the domain itself.
    pub fn encode_message(&self) -> AbiResult<Vec<u8>> {
        let mut out = Vec::with_capacity(MESSAGE_PREFIX.len() + 2 * WORD_SIZE);
        out.extend_from_slice(&MESSAGE_PREFIX);
        out.extend_from_slice(self.domain_separator()?.as_bytes());
        if self.primary_type != DOMAIN_TYPE {
            out.extend_from_slice(self.hash_struct(&self.primary_type, &self.message)?.as_bytes());
        }
        Ok(out)
    }

    /// Digest that gets signed: Keccak-256 of [`encode_message`](Self::encode_message)
    pub fn signing_hash(&self) -> AbiResult<H256> {
        self.encode_message().map(|message| keccak256(&message))
    }

    fn collect_references<'a>(&'a self, name: &'a str, found: &mut BTreeSet<&'a str>) {
        if !found.insert(name) {
            return;
        }
        if let Some(fields) = self.types.get(name) {
            for field in fields {
                let root = field.root_type();
                if self.types.contains_key(root) {
                    self.collect_references(root, found);
                }
            }
        }
    }

    fn encode_data_at(&self, name: &str, value: &Value, depth: usize) -> AbiResult<Vec<u8>> {
        let object = value
            .as_object()
            .ok_or_else(|| invalid(format!("{} value must be an object", name)))?;
        let fields = self.fields(name)?;

        let mut out = Vec::with_capacity((fields.len() + 1) * WORD_SIZE);
        out.extend_from_slice(self.type_hash(name)?.as_bytes());
        for field in fields {
            let member = object
                .get(&field.name)
                .ok_or_else(|| invalid(format!("{} is missing member {}", name, field.name)))?;
            out.extend_from_slice(self.encode_member(&field.kind, member, depth + 1)?.as_bytes());
        }
        Ok(out)
    }

    /// One 32-byte word of `encodeData`
    fn encode_member(&self, kind: &str, value: &Value, depth: usize) -> AbiResult<H256> {
        if depth > MAX_TYPE_DEPTH {
            return Err(invalid(format!("values nested deeper than {}", MAX_TYPE_DEPTH)));
        }

        if let Some((element, len)) = split_array(kind)? {
            let items = value
                .as_array()
                .ok_or_else(|| invalid(format!("{} value must be an array", kind)))?;
            if len.is_some_and(|len| len != items.len()) {
                return Err(invalid(format!("{} value has {} elements", kind, items.len())));
            }
            let mut packed = Vec::with_capacity(items.len() * WORD_SIZE);
            for item in items {
                packed.extend_from_slice(self.encode_member(element, item, depth + 1)?.as_bytes());
            }
            return Ok(keccak256(&packed));
        }

        if self.types.contains_key(kind) {
            return self
                .encode_data_at(kind, value, depth)
                .map(|data| keccak256(&data));
        }

        match kind {
            "string" => text(kind, value).map(|s| keccak256(s.as_bytes())),
            "bytes" => hex_bytes(kind, value).map(|bytes| keccak256(&bytes)),
            _ => {
                let ty = parse_type(kind)?;
                if !ty.is_value_type() {
                    return Err(invalid(format!("{} is not a struct member type", kind)));
                }
                let token = atomic_token(&ty, kind, value)?;
                let word = encode(slice::from_ref(&ty), slice::from_ref(&token))?;
                H256::from_slice(&word).map_err(|e| invalid(e.to_string()))
            }
        }
    }
}

/// `getEncodedEip712Data`: the encoded message, or its digest when `hash` is set
pub fn encode_typed_data(data: &TypedData, hash: bool) -> AbiResult<Vec<u8>> {
    if hash {
        data.signing_hash().map(|digest| digest.as_bytes().to_vec())
    } else {
        data.encode_message()
    }
}

fn invalid(reason: impl Into<String>) -> AbiError {
    AbiError::InvalidTypedData(reason.into())
}

fn render_struct(name: &str, fields: &[TypedField]) -> String {
    let members: Vec<String> = fields
        .iter()
        .map(|f| format!("{} {}", f.kind, f.name))
        .collect();
    format!("{}({})", name, members.join(","))
}

/// Peel the outermost array suffix: `Person[][3]` gives `("Person[]", Some(3))`
fn split_array(kind: &str) -> AbiResult<Option<(&str, Option<usize>)>> {
    let Some(body) = kind.strip_suffix(']') else {
        return Ok(None);
    };
    let open = body
        .rfind('[')
        .ok_or_else(|| invalid(format!("unbalanced brackets in {}", kind)))?;
    let dim = &body[open + 1..];
    let len = if dim.is_empty() {
        None
    } else {
        Some(
            dim.parse::<usize>()
                .map_err(|_| invalid(format!("invalid array length in {}", kind)))?,
        )
    };
    Ok(Some((&body[..open], len)))
}

fn atomic_token(ty: &ParamType, kind: &str, value: &Value) -> AbiResult<Token> {
    match ty {
        ParamType::Address => Address::from_hex(text(kind, value)?)
            .map(Token::Address)
            .map_err(|e| invalid(format!("{}: {}", kind, e))),
        ParamType::Bool => value
            .as_bool()
            .map(Token::Bool)
            .ok_or_else(|| invalid(format!("{} value must be a boolean", kind))),
        ParamType::Uint(_) => unsigned(kind, value).map(Token::Uint),
        ParamType::Int(_) => signed(kind, value).map(Token::Int),
        ParamType::FixedBytes(_) => hex_bytes(kind, value).map(Token::FixedBytes),
        _ => Err(invalid(format!("{} is not an atomic type", kind))),
    }
}

fn text<'v>(kind: &str, value: &'v Value) -> AbiResult<&'v str> {
    value
        .as_str()
        .ok_or_else(|| invalid(format!("{} value must be a string", kind)))
}

fn hex_bytes(kind: &str, value: &Value) -> AbiResult<Vec<u8>> {
    let s = text(kind, value)?;
    hex::decode(s.strip_prefix("0x").unwrap_or(s)).map_err(|e| invalid(format!("{}: {}", kind, e)))
}

/// Integers arrive as JSON numbers, decimal strings or `0x` hex strings
fn unsigned(kind: &str, value: &Value) -> AbiResult<U256> {
    let out_of_range = || invalid(format!("{} value {} is not an unsigned integer", kind, value));
    match value {
        Value::Number(n) => n.as_u64().map(U256::from).ok_or_else(out_of_range),
        Value::String(s) => match s.strip_prefix("0x") {
            Some(digits) => {
                let digits = if digits.len() % 2 == 1 {
                    format!("0{}", digits)
                } else {
                    digits.to_owned()
                };
                let bytes = hex::decode(digits).map_err(|_| out_of_range())?;
                if bytes.len() > WORD_SIZE {
                    return Err(out_of_range());
                }
                Ok(U256::from_big_endian(&bytes))
            }
            None => U256::from_dec_str(s).map_err(|_| out_of_range()),
        },
        _ => Err(out_of_range()),
    }
}

fn signed(kind: &str, value: &Value) -> AbiResult<I256> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(v) => Ok(I256::from_i128(i128::from(v))),
            None => unsigned(kind, value).map(|abs| I256::new(abs, false)),
        },
        Value::String(s) => match s.strip_prefix('-') {
            Some(rest) => {
                unsigned(kind, &Value::String(rest.to_owned())).map(|abs| I256::new(abs, true))
            }
            None => unsigned(kind, value).map(|abs| I256::new(abs, false)),
        },
        _ => Err(invalid(format!("{} value {} is not an integer", kind, value))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn order_types() -> TypedData {
        serde_json::from_value(json!({
            "types": {
                "EIP712Domain": [
                    { "name": "name", "type": "string" },
                    { "name": "chainId", "type": "uint256" }
                ],
                "Order": [
                    { "name": "maker", "type": "Party" },
                    { "name": "legs", "type": "Leg[]" },
                    { "name": "salt", "type": "bytes32" }
                ],
                "Leg": [
                    { "name": "asset", "type": "address" },
                    { "name": "amount", "type": "int64" }
                ],
                "Party": [
                    { "name": "account", "type": "address" },
                    { "name": "tag", "type": "bytes" }
                ]
            },
            "primaryType": "Order",
            "domain": { "name": "Desk", "chainId": "0x2a" },
            "message": {
                "maker": {
                    "account": "0x5FbDB2315678afecb367f032d93F642f64180aa3",
                    "tag": "0xbeef"
                },
                "legs": [
                    { "asset": "0x5FbDB2315678afecb367f032d93F642f64180aa3", "amount": -5 },
                    { "asset": "0x0000000000000000000000000000000000000001", "amount": "700" }
                ],
                "salt": "0x01"
            }
        }))
        .unwrap()
    }

    // ==================== encodeType ====================

    #[test]
    fn test_encode_type_sorts_references() {
        let data = order_types();
        assert_eq!(
            data.encode_type("Order").unwrap(),
            "Order(Party maker,Leg[] legs,bytes32 salt)\
             Leg(address asset,int64 amount)\
             Party(address account,bytes tag)"
        );
        assert_eq!(data.encode_type("Leg").unwrap(), "Leg(address asset,int64 amount)");
    }

    #[test]
    fn test_encode_type_self_reference() {
        let mut data = order_types();
        data.types.insert(
            "Thread".into(),
            vec![TypedField::new("author", "Party"), TypedField::new("replies", "Thread[]")],
        );
        assert_eq!(
            data.encode_type("Thread").unwrap(),
            "Thread(Party author,Thread[] replies)Party(address account,bytes tag)"
        );
    }

    #[test]
    fn test_undeclared_struct() {
        let err = order_types().encode_type("Missing").unwrap_err();
        assert!(matches!(err, AbiError::InvalidTypedData(_)));
    }

    // ==================== encodeData ====================

    #[test]
    fn test_encode_data_layout() {
        let data = order_types();
        let leg = json!({ "asset": "0x0000000000000000000000000000000000000001", "amount": -1 });
        let encoded = data.encode_data("Leg", &leg).unwrap();

        assert_eq!(encoded.len(), 3 * WORD_SIZE);
        assert_eq!(&encoded[..32], data.type_hash("Leg").unwrap().as_bytes());
        assert_eq!(encoded[63], 1);
        assert_eq!(encoded[64..], [0xff; 32]);
    }

    #[test]
    fn test_reference_members_are_hashed() {
        let data = order_types();
        let party = &data.message["maker"];
        let mut expected = data.type_hash("Party").unwrap().as_bytes().to_vec();
        let account = Address::from_hex("0x5FbDB2315678afecb367f032d93F642f64180aa3").unwrap();
        expected.extend_from_slice(&account.to_word());
        expected.extend_from_slice(keccak256(&[0xbe, 0xef]).as_bytes());
        assert_eq!(data.encode_data("Party", party).unwrap(), expected);
    }

    #[test]
    fn test_array_member_hashes_concatenated_words() {
        let data = order_types();
        let legs = data.message["legs"].as_array().unwrap();
        let mut packed = Vec::new();
        for leg in legs {
            packed.extend_from_slice(data.hash_struct("Leg", leg).unwrap().as_bytes());
        }

        let encoded = data.encode_data("Order", &data.message).unwrap();
        assert_eq!(&encoded[64..96], keccak256(&packed).as_bytes());
        // bytes32 is left-aligned
        assert_eq!(encoded[96], 0x01);
        assert!(encoded[97..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_integer_forms() {
        let data = order_types();
        let as_number = data.hash_struct("EIP712Domain", &json!({ "name": "Desk", "chainId": 42 }));
        let as_decimal = data.hash_struct("EIP712Domain", &json!({ "name": "Desk", "chainId": "42" }));
        assert_eq!(as_number.unwrap(), data.domain_separator().unwrap());
        assert_eq!(as_decimal.unwrap(), data.domain_separator().unwrap());
    }

    #[test]
    fn test_rejects_bad_members() {
        let data = order_types();
        let missing = json!({ "asset": "0x0000000000000000000000000000000000000001" });
        assert!(matches!(
            data.encode_data("Leg", &missing),
            Err(AbiError::InvalidTypedData(_))
        ));

        let too_wide = json!({
            "asset": "0x0000000000000000000000000000000000000001",
            "amount": "9223372036854775808"
        });
        assert!(matches!(
            data.encode_data("Leg", &too_wide),
            Err(AbiError::ValueOutOfRange { .. })
        ));

        let bad_address = json!({ "asset": "0x01", "amount": 0 });
        assert!(matches!(
            data.encode_data("Leg", &bad_address),
            Err(AbiError::InvalidTypedData(_))
        ));
    }

    #[test]
    fn test_fixed_array_length_checked() {
        let mut data = order_types();
        data.types
            .insert("Pair".into(), vec![TypedField::new("values", "uint8[2]")]);
        assert!(data.hash_struct("Pair", &json!({ "values": [1, 2] })).is_ok());
        assert!(matches!(
            data.hash_struct("Pair", &json!({ "values": [1] })),
            Err(AbiError::InvalidTypedData(_))
        ));
    }

    // ==================== Message ====================

    #[test]
    fn test_message_layout() {
        let data = order_types();
        let message = data.encode_message().unwrap();
        assert_eq!(message.len(), 66);
        assert_eq!(message[..2], MESSAGE_PREFIX);
        assert_eq!(&message[2..34], data.domain_separator().unwrap().as_bytes());
        assert_eq!(
            &message[34..],
            data.hash_struct("Order", &data.message).unwrap().as_bytes()
        );
        assert_eq!(
            encode_typed_data(&data, true).unwrap(),
            keccak256(&message).as_bytes().to_vec()
        );
    }

    #[test]
    fn test_domain_primary_type_omits_message_hash() {
        let mut data = order_types();
        data.primary_type = DOMAIN_TYPE.into();
        assert_eq!(encode_typed_data(&data, false).unwrap().len(), 34);
    }

    #[test]
    fn test_split_array() {
        assert_eq!(split_array("uint8").unwrap(), None);
        assert_eq!(split_array("Leg[]").unwrap(), Some(("Leg", None)));
        assert_eq!(split_array("Leg[][3]").unwrap(), Some(("Leg[]", Some(3))));
        assert!(split_array("Leg]").is_err());
    }
}
