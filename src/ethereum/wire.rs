use alloy::json_abi::Param;
use serde::{Serialize, Serializer};
use std::fmt;
use tracing::warn;

/// Kind of an ABI wire type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireKind {
    Int,
    Uint,
    Bool,
    String,
    /// Dynamically sized array, `T[]`
    Slice,
    /// Fixed length array, `T[k]`
    Array,
    Tuple,
    Address,
    FixedBytes,
    Bytes,
    Hash,
    FixedPoint,
    Function,
    Unknown,
}

/// Wire type descriptor of a single ABI argument.
///
/// Parsed from the ABI JSON `type` string (and `components` for tuples). The
/// canonical rendering is the form used in selectors, so `uint` becomes
/// `uint256` and tuples are spelled out as `(t1,t2)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireType {
    kind: WireKind,
    size: usize,
    elem: Option<Box<WireType>>,
    components: Vec<WireType>,
    canonical: String,
}

impl WireType {
    pub fn from_param(param: &Param) -> Self {
        Self::parse(&param.ty, &param.components)
    }

    /// Parse a type string. `components` is only consulted for tuple types.
    pub fn parse(ty: &str, components: &[Param]) -> Self {
        let ty = ty.trim();

        if let Some(open) = ty.strip_suffix(']').and_then(|s| s.rfind('[')) {
            let elem = Self::parse(&ty[..open], components);
            if elem.kind == WireKind::Unknown {
                // Element already reported
                return Self::elementary(WireKind::Unknown, 0, ty);
            }

            let dims = &ty[open + 1..ty.len() - 1];
            if dims.is_empty() {
                let canonical = format!("{}[]", elem.canonical);
                return Self::nested(WireKind::Slice, 0, elem, canonical);
            }

            return match dims.parse::<usize>() {
                Ok(len) if len > 0 => {
                    let canonical = format!("{}[{}]", elem.canonical, len);
                    Self::nested(WireKind::Array, len, elem, canonical)
                }
                _ => Self::unknown(ty),
            };
        }

        match ty {
            "address" => Self::elementary(WireKind::Address, 20, ty),
            "bool" => Self::elementary(WireKind::Bool, 0, ty),
            "string" => Self::elementary(WireKind::String, 0, ty),
            "bytes" => Self::elementary(WireKind::Bytes, 0, ty),
            "function" => Self::elementary(WireKind::Function, 24, ty),
            "hash" => Self::elementary(WireKind::Hash, 32, ty),
            "tuple" => Self::tuple(components.iter().map(Self::from_param).collect()),
            _ => Self::parse_sized(ty),
        }
    }

    pub fn tuple(components: Vec<WireType>) -> Self {
        let inner: Vec<&str> = components.iter().map(|c| c.canonical.as_str()).collect();
        let canonical = format!("({})", inner.join(","));
        Self {
            kind: WireKind::Tuple,
            size: 0,
            elem: None,
            components,
            canonical,
        }
    }

    fn parse_sized(ty: &str) -> Self {
        if let Some(bits) = ty.strip_prefix("uint") {
            return Self::integer(WireKind::Uint, "uint", bits, ty);
        }
        if let Some(bits) = ty.strip_prefix("int") {
            return Self::integer(WireKind::Int, "int", bits, ty);
        }
        if let Some(len) = ty.strip_prefix("bytes") {
            return match len.parse::<usize>() {
                Ok(n) if (1..=32).contains(&n) => Self::elementary(WireKind::FixedBytes, n, ty),
                _ => Self::unknown(ty),
            };
        }
        if ty == "fixed" || ty == "ufixed" {
            let canonical = format!("{}128x18", ty);
            return Self::elementary(WireKind::FixedPoint, 128, &canonical);
        }
        if let Some(dims) = ty.strip_prefix("ufixed").or_else(|| ty.strip_prefix("fixed")) {
            if let Some((bits, _decimals)) = parse_fixed_dims(dims) {
                return Self::elementary(WireKind::FixedPoint, bits, ty);
            }
        }

        Self::unknown(ty)
    }

    fn integer(kind: WireKind, prefix: &str, bits: &str, ty: &str) -> Self {
        let size = if bits.is_empty() {
            256
        } else {
            match bits.parse::<usize>() {
                Ok(b) if valid_bit_width(b) => b,
                _ => return Self::unknown(ty),
            }
        };
        Self::elementary(kind, size, &format!("{}{}", prefix, size))
    }

    fn elementary(kind: WireKind, size: usize, canonical: &str) -> Self {
        Self {
            kind,
            size,
            elem: None,
            components: Vec::new(),
            canonical: canonical.to_string(),
        }
    }

    fn nested(kind: WireKind, size: usize, elem: WireType, canonical: String) -> Self {
        Self {
            kind,
            size,
            elem: Some(Box::new(elem)),
            components: Vec::new(),
            canonical,
        }
    }

    fn unknown(ty: &str) -> Self {
        warn!("Unrecognized wire type '{}', falling back to TEXT storage", ty);
        Self::elementary(WireKind::Unknown, 0, ty)
    }

    pub fn kind(&self) -> WireKind {
        self.kind
    }

    /// Bit width for integers and fixed-point numbers, byte width for
    /// `bytesN`, length for fixed arrays.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn elem(&self) -> Option<&WireType> {
        self.elem.as_deref()
    }

    pub fn components(&self) -> &[WireType] {
        &self.components
    }

    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    pub fn storage_type(&self) -> StorageType {
        StorageType::for_kind(self.kind)
    }
}

fn valid_bit_width(bits: usize) -> bool {
    bits > 0 && bits <= 256 && bits % 8 == 0
}

fn parse_fixed_dims(dims: &str) -> Option<(usize, usize)> {
    let (bits, decimals) = dims.split_once('x')?;
    let bits = bits.parse::<usize>().ok()?;
    let decimals = decimals.parse::<usize>().ok()?;
    (valid_bit_width(bits) && decimals > 0 && decimals <= 80).then_some((bits, decimals))
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl Serialize for WireType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Relational column type used to persist a decoded value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageType {
    /// Bounded string wide enough for a 0x-prefixed 32-byte hash
    VarChar66,
    Decimal,
    Boolean,
    Bytea,
    TextArray,
    Money,
    Text,
}

impl StorageType {
    /// Total over every wire kind; anything without a dedicated column type is TEXT.
    pub const fn for_kind(kind: WireKind) -> Self {
        match kind {
            WireKind::String | WireKind::Hash | WireKind::Address => Self::VarChar66,
            WireKind::Int | WireKind::Uint => Self::Decimal,
            WireKind::Bool => Self::Boolean,
            WireKind::Bytes | WireKind::FixedBytes => Self::Bytea,
            WireKind::Array => Self::TextArray,
            WireKind::FixedPoint => Self::Money,
            WireKind::Function => Self::Text,
            WireKind::Slice | WireKind::Tuple | WireKind::Unknown => Self::Text,
        }
    }

    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::VarChar66 => "CHARACTER VARYING(66)",
            Self::Decimal => "DECIMAL",
            Self::Boolean => "BOOLEAN",
            Self::Bytea => "BYTEA",
            Self::TextArray => "TEXT[]",
            Self::Money => "MONEY",
            Self::Text => "TEXT",
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl Serialize for StorageType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_sql())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(ty: &str) -> WireType {
        WireType::parse(ty, &[])
    }

    #[test]
    fn test_storage_type_table() {
        let cases = [
            ("string", StorageType::VarChar66),
            ("hash", StorageType::VarChar66),
            ("address", StorageType::VarChar66),
            ("uint256", StorageType::Decimal),
            ("int8", StorageType::Decimal),
            ("bool", StorageType::Boolean),
            ("bytes", StorageType::Bytea),
            ("bytes32", StorageType::Bytea),
            ("address[3]", StorageType::TextArray),
            ("uint256[]", StorageType::Text),
            ("fixed128x18", StorageType::Money),
            ("function", StorageType::Text),
        ];

        for (ty, expected) in cases {
            assert_eq!(wire(ty).storage_type(), expected, "wire type {}", ty);
        }
    }

    #[test]
    fn test_unrecognized_types_fall_back_to_text() {
        for ty in ["", "uint7", "bytes33", "int512", "mapping", "fixed8x0", "tuple[x]"] {
            let parsed = wire(ty);
            assert_eq!(parsed.kind(), WireKind::Unknown, "wire type {}", ty);
            assert_eq!(parsed.storage_type(), StorageType::Text);
        }
        assert_eq!(StorageType::for_kind(WireKind::Tuple), StorageType::Text);
    }

    #[test]
    fn test_dynamic_arrays_are_stored_as_text() {
        for ty in ["uint256[]", "address[]", "bytes32[2][]"] {
            let parsed = wire(ty);
            assert_eq!(parsed.kind(), WireKind::Slice, "wire type {}", ty);
            assert_eq!(parsed.storage_type(), StorageType::Text, "wire type {}", ty);
        }
        assert_eq!(wire("address[2]").storage_type(), StorageType::TextArray);
    }

    #[test]
    fn test_unknown_array_element_keeps_raw_type() {
        let parsed = wire("foo[]");
        assert_eq!(parsed.kind(), WireKind::Unknown);
        assert_eq!(parsed.to_string(), "foo[]");
        assert!(parsed.elem().is_none());
    }

    #[test]
    fn test_canonical_rendering() {
        assert_eq!(wire("uint").to_string(), "uint256");
        assert_eq!(wire("int").to_string(), "int256");
        assert_eq!(wire("ufixed").to_string(), "ufixed128x18");
        assert_eq!(wire(" address ").to_string(), "address");
        assert_eq!(wire("uint8[2][]").to_string(), "uint8[2][]");
        assert_eq!(wire("uint[]").to_string(), "uint256[]");
    }

    #[test]
    fn test_nested_arrays() {
        let parsed = wire("uint8[2][]");
        assert_eq!(parsed.kind(), WireKind::Slice);

        let inner = parsed.elem().unwrap();
        assert_eq!(inner.kind(), WireKind::Array);
        assert_eq!(inner.size(), 2);
        assert_eq!(inner.elem().unwrap().kind(), WireKind::Uint);
        assert_eq!(inner.elem().unwrap().size(), 8);
    }

    #[test]
    fn test_tuple_components() {
        let components: Vec<Param> = serde_json::from_str(
            r#"[
                {"name": "owner", "type": "address", "internalType": "address"},
                {"name": "amounts", "type": "uint128[]", "internalType": "uint128[]"}
            ]"#,
        )
        .unwrap();

        let parsed = WireType::parse("tuple[]", &components);
        assert_eq!(parsed.kind(), WireKind::Slice);
        assert_eq!(parsed.to_string(), "(address,uint128[])[]");

        let tuple = parsed.elem().unwrap();
        assert_eq!(tuple.kind(), WireKind::Tuple);
        assert_eq!(tuple.components().len(), 2);
        assert_eq!(tuple.storage_type(), StorageType::Text);
    }

    #[test]
    fn test_storage_type_serializes_as_sql() {
        let json = serde_json::to_string(&StorageType::VarChar66).unwrap();
        assert_eq!(json, "\"CHARACTER VARYING(66)\"");
        assert_eq!(StorageType::TextArray.to_string(), "TEXT[]");
    }
}
