//! Value capability dispatch
//!
//! Converts values category by category, recursing structurally into lists
//! and maps. Caller → engine is fallible (the caller side can express more
//! than the engine); engine → caller is total.

use std::collections::BTreeMap;

use super::{MarshalError, MarshallerConfig};
use crate::models::value::{AnyValue, Value};

/// One step into a nested value
#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Key(String),
    Index(usize),
}

/// Conversion refusal, path collected innermost-first while unwinding
#[derive(Debug)]
struct Rejection {
    path: Vec<Segment>,
    type_name: String,
}

impl Rejection {
    fn new(type_name: impl Into<String>) -> Self {
        Self {
            path: Vec::new(),
            type_name: type_name.into(),
        }
    }

    fn within(mut self, segment: Segment) -> Self {
        self.path.push(segment);
        self
    }

    fn into_error(self, root: &str) -> MarshalError {
        let mut path = root.to_string();
        for segment in self.path.iter().rev() {
            match segment {
                Segment::Key(key) => {
                    path.push('.');
                    path.push_str(key);
                }
                Segment::Index(index) => path.push_str(&format!("[{}]", index)),
            }
        }

        MarshalError::UnsupportedValueType {
            path,
            type_name: self.type_name,
        }
    }
}

/// Convert one caller value into the engine representation
///
/// `root` names the value in error paths (the request key or feature name).
pub(crate) fn to_engine_value(
    root: &str,
    value: &AnyValue,
    config: &MarshallerConfig,
) -> Result<Value, MarshalError> {
    convert(value, config, 0).map_err(|rejection| rejection.into_error(root))
}

fn convert(value: &AnyValue, config: &MarshallerConfig, depth: usize) -> Result<Value, Rejection> {
    match value {
        AnyValue::Null => Ok(Value::Null),
        AnyValue::Bool(b) => Ok(Value::Bool(*b)),
        AnyValue::Int(i) => Ok(Value::Long(*i)),
        AnyValue::UInt(u) => i64::try_from(*u)
            .map(Value::Long)
            .map_err(|_| Rejection::new("uint above i64::MAX")),
        AnyValue::Float(f) => {
            if config.reject_non_finite_floats && !f.is_finite() {
                return Err(Rejection::new("non-finite float"));
            }
            Ok(Value::Double(*f))
        }
        AnyValue::Str(s) => Ok(Value::String(s.clone())),
        AnyValue::Bytes(bytes) => Ok(Value::Bytes(bytes.clone())),
        AnyValue::List(items) => {
            check_depth(value, config, depth)?;
            let mut converted = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                converted.push(
                    convert(item, config, depth + 1)
                        .map_err(|r| r.within(Segment::Index(index)))?,
                );
            }
            Ok(Value::List(converted))
        }
        AnyValue::Map(entries) => {
            check_depth(value, config, depth)?;
            // sorted so the first rejected entry is the same on every run
            let mut sorted: Vec<(&String, &AnyValue)> = entries.iter().collect();
            sorted.sort_unstable_by(|a, b| a.0.cmp(b.0));

            let mut converted = BTreeMap::new();
            for (key, item) in sorted {
                let item = convert(item, config, depth + 1)
                    .map_err(|r| r.within(Segment::Key(key.clone())))?;
                converted.insert(key.clone(), item);
            }
            Ok(Value::Map(converted))
        }
        AnyValue::Opaque { type_name } => Err(Rejection::new(type_name.clone())),
    }
}

fn check_depth(value: &AnyValue, config: &MarshallerConfig, depth: usize) -> Result<(), Rejection> {
    if depth >= config.max_nesting_depth {
        return Err(Rejection::new(format!(
            "{} nested deeper than {} levels",
            value.kind(),
            config.max_nesting_depth
        )));
    }
    Ok(())
}

/// Convert one engine value into the caller representation
///
/// Recursion is not depth-bounded: engine values are trusted, and values
/// that entered through [`to_engine_value`] are already within
/// `max_nesting_depth`. An engine that builds pathologically deep values on
/// its own can exhaust the stack here.
pub(crate) fn to_any_value(value: &Value) -> AnyValue {
    match value {
        Value::Null => AnyValue::Null,
        Value::Bool(b) => AnyValue::Bool(*b),
        Value::Long(i) => AnyValue::Int(*i),
        Value::Double(f) => AnyValue::Float(*f),
        Value::String(s) => AnyValue::Str(s.clone()),
        Value::Bytes(bytes) => AnyValue::Bytes(bytes.clone()),
        Value::List(items) => AnyValue::List(items.iter().map(to_any_value).collect()),
        Value::Map(entries) => AnyValue::Map(
            entries
                .iter()
                .map(|(key, item)| (key.clone(), to_any_value(item)))
                .collect(),
        ),
    }
}
