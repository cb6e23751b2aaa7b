//! Dynamic values on both sides of the boundary
//!
//! - [`AnyValue`]: what callers hand us. Loosely typed, can hold things the
//!   engine has no representation for (unsigned integers beyond `i64`,
//!   foreign objects).
//! - [`Value`]: what the engine consumes. A closed set of categories the
//!   engine's type system supports.
//!
//! Floats on both sides compare by bit pattern, so `NaN` equals itself and
//! `0.0` differs from `-0.0`. Equality here means "same logical value after
//! conversion", not IEEE comparison.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

// ============================================================================
// CALLER-FACING VALUE
// ============================================================================

/// Caller-side dynamically typed value
///
/// Serializes untagged, so plain JSON builds it directly:
/// ```
/// use feature_fetch_core_rs::AnyValue;
///
/// let value: AnyValue = serde_json::from_str(r#"[1, "two", 3.5]"#).unwrap();
/// assert_eq!(
///     value,
///     AnyValue::List(vec![AnyValue::Int(1), AnyValue::from("two"), AnyValue::Float(3.5)])
/// );
/// ```
///
/// Two object shapes are reserved so every variant survives a serde round
/// trip: `{"$bytes": [u8, ...]}` is [`AnyValue::Bytes`] and
/// `{"$opaque": "<type name>"}` is [`AnyValue::Opaque`]. Any other object,
/// including one that carries a reserved key next to other keys, is a
/// [`AnyValue::Map`].
///
/// Variant order matters: untagged deserialization tries them top to bottom.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged, deny_unknown_fields)]
pub enum AnyValue {
    Null,
    Bool(bool),
    Int(i64),
    /// Only produced for integers above `i64::MAX`; the engine cannot hold these
    UInt(u64),
    Float(f64),
    Str(String),
    List(Vec<AnyValue>),
    Bytes(#[serde(with = "bytes_repr")] Vec<u8>),
    /// A foreign value with no engine representation (arbitrary host-language object)
    Opaque {
        #[serde(rename = "$opaque")]
        type_name: String,
    },
    Map(HashMap<String, AnyValue>),
}

/// `{"$bytes": [...]}` wire form for [`AnyValue::Bytes`]
mod bytes_repr {
    use serde::de::Error as _;
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    const KEY: &str = "$bytes";

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(KEY, bytes)?;
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let mut entries = BTreeMap::<String, Vec<u8>>::deserialize(deserializer)?;
        match entries.remove(KEY) {
            Some(bytes) if entries.is_empty() => Ok(bytes),
            _ => Err(D::Error::custom("expected a single \"$bytes\" entry")),
        }
    }
}

impl AnyValue {
    /// Category name used in error messages
    pub fn kind(&self) -> &str {
        match self {
            AnyValue::Null => "null",
            AnyValue::Bool(_) => "bool",
            AnyValue::Int(_) => "int",
            AnyValue::UInt(_) => "uint",
            AnyValue::Float(_) => "float",
            AnyValue::Str(_) => "string",
            AnyValue::List(_) => "list",
            AnyValue::Bytes(_) => "bytes",
            AnyValue::Opaque { type_name } => type_name,
            AnyValue::Map(_) => "map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AnyValue::Null)
    }
}

impl PartialEq for AnyValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AnyValue::Null, AnyValue::Null) => true,
            (AnyValue::Bool(a), AnyValue::Bool(b)) => a == b,
            (AnyValue::Int(a), AnyValue::Int(b)) => a == b,
            (AnyValue::UInt(a), AnyValue::UInt(b)) => a == b,
            (AnyValue::Float(a), AnyValue::Float(b)) => a.to_bits() == b.to_bits(),
            (AnyValue::Str(a), AnyValue::Str(b)) => a == b,
            (AnyValue::List(a), AnyValue::List(b)) => a == b,
            (AnyValue::Map(a), AnyValue::Map(b)) => a == b,
            (AnyValue::Bytes(a), AnyValue::Bytes(b)) => a == b,
            (AnyValue::Opaque { type_name: a }, AnyValue::Opaque { type_name: b }) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for AnyValue {
    fn from(value: bool) -> Self {
        AnyValue::Bool(value)
    }
}

impl From<i64> for AnyValue {
    fn from(value: i64) -> Self {
        AnyValue::Int(value)
    }
}

impl From<i32> for AnyValue {
    fn from(value: i32) -> Self {
        AnyValue::Int(i64::from(value))
    }
}

impl From<u64> for AnyValue {
    /// Integers that fit `i64` take the `Int` form
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(signed) => AnyValue::Int(signed),
            Err(_) => AnyValue::UInt(value),
        }
    }
}

impl From<f64> for AnyValue {
    fn from(value: f64) -> Self {
        AnyValue::Float(value)
    }
}

impl From<&str> for AnyValue {
    fn from(value: &str) -> Self {
        AnyValue::Str(value.to_string())
    }
}

impl From<String> for AnyValue {
    fn from(value: String) -> Self {
        AnyValue::Str(value)
    }
}

impl From<Vec<AnyValue>> for AnyValue {
    fn from(values: Vec<AnyValue>) -> Self {
        AnyValue::List(values)
    }
}

impl From<HashMap<String, AnyValue>> for AnyValue {
    fn from(entries: HashMap<String, AnyValue>) -> Self {
        AnyValue::Map(entries)
    }
}

impl From<serde_json::Value> for AnyValue {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => AnyValue::Null,
            serde_json::Value::Bool(b) => AnyValue::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    AnyValue::Int(i)
                } else if let Some(u) = n.as_u64() {
                    AnyValue::UInt(u)
                } else {
                    // serde_json numbers are always one of i64/u64/f64
                    AnyValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => AnyValue::Str(s),
            serde_json::Value::Array(items) => {
                AnyValue::List(items.into_iter().map(AnyValue::from).collect())
            }
            serde_json::Value::Object(entries) => AnyValue::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, AnyValue::from(v)))
                    .collect(),
            ),
        }
    }
}

// ============================================================================
// ENGINE-FACING VALUE
// ============================================================================

/// Engine-side strongly typed value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Long(i64),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Category name used in logs and error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Long(_) => "long",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            _ => false,
        }
    }
}
