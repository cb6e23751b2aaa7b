//! Type conversion utilities for FFI boundary
//!
//! Converts between Python objects (dict, list, int, ...) and the caller-side
//! Rust types (`AnyValue`, `RequestView`, `ResponseView`).

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyBytes, PyDict, PyFloat, PyInt, PyList, PyString, PyTuple};
use std::collections::HashMap;

use crate::core::time::{at_millis_from_dynamic, at_millis_to_dynamic};
use crate::marshal::{MarshalError, MarshallerConfig};
use crate::models::{AnyValue, ErrorInfo, RequestView, ResponseView, ResultView};

impl From<MarshalError> for PyErr {
    fn from(err: MarshalError) -> Self {
        match err {
            MarshalError::Engine(_) => PyRuntimeError::new_err(err.to_string()),
            _ => PyValueError::new_err(err.to_string()),
        }
    }
}

// ========================================================================
// PyDict Extraction Helpers
// ========================================================================

/// Extract a required field from a Python dict with clear error messages.
///
/// # Errors
/// Returns PyValueError if the field is missing, or the conversion error.
fn extract_required<T>(dict: &Bound<'_, PyDict>, key: &str) -> PyResult<T>
where
    for<'py> T: FromPyObject<'py>,
{
    dict.get_item(key)?
        .ok_or_else(|| PyValueError::new_err(format!("Missing required field '{}'", key)))?
        .extract()
}

/// Extract a field with a default value if missing or `None`.
fn extract_with_default<T>(dict: &Bound<'_, PyDict>, key: &str, default: T) -> PyResult<T>
where
    for<'py> T: FromPyObject<'py>,
{
    match dict.get_item(key)? {
        Some(value) if !value.is_none() => value.extract(),
        _ => Ok(default),
    }
}

fn type_name(obj: &Bound<'_, PyAny>) -> String {
    obj.get_type()
        .name()
        .map(|name| name.to_string())
        .unwrap_or_else(|_| "<unknown>".to_string())
}

// ========================================================================
// Dynamic Values
// ========================================================================

/// Convert an arbitrary Python object into a caller-side value
///
/// Never fails on unknown types: they become `AnyValue::Opaque` and are
/// refused later by the marshaller with their Python type name. `max_depth`
/// bounds recursion so self-referencing containers terminate.
pub fn py_to_any(obj: &Bound<'_, PyAny>, max_depth: usize) -> PyResult<AnyValue> {
    py_to_any_at(obj, max_depth, 0)
}

fn py_to_any_at(obj: &Bound<'_, PyAny>, max_depth: usize, depth: usize) -> PyResult<AnyValue> {
    if obj.is_none() {
        return Ok(AnyValue::Null);
    }
    // bool is a subclass of int, check it first
    if let Ok(b) = obj.downcast::<PyBool>() {
        return Ok(AnyValue::Bool(b.is_true()));
    }
    if obj.is_instance_of::<PyInt>() {
        if let Ok(i) = obj.extract::<i64>() {
            return Ok(AnyValue::Int(i));
        }
        if let Ok(u) = obj.extract::<u64>() {
            return Ok(AnyValue::UInt(u));
        }
        return Ok(AnyValue::Opaque {
            type_name: "int wider than 64 bits".to_string(),
        });
    }
    if let Ok(f) = obj.downcast::<PyFloat>() {
        return Ok(AnyValue::Float(f.value()));
    }
    if obj.is_instance_of::<PyString>() {
        return Ok(AnyValue::Str(obj.extract()?));
    }
    if let Ok(bytes) = obj.downcast::<PyBytes>() {
        return Ok(AnyValue::Bytes(bytes.as_bytes().to_vec()));
    }

    let is_container = obj.is_instance_of::<PyList>()
        || obj.is_instance_of::<PyTuple>()
        || obj.is_instance_of::<PyDict>();
    if is_container && depth >= max_depth {
        return Ok(AnyValue::Opaque {
            type_name: format!("{} nested deeper than {} levels", type_name(obj), max_depth),
        });
    }

    if let Ok(list) = obj.downcast::<PyList>() {
        let mut items = Vec::with_capacity(list.len());
        for item in list.iter() {
            items.push(py_to_any_at(&item, max_depth, depth + 1)?);
        }
        return Ok(AnyValue::List(items));
    }
    if let Ok(tuple) = obj.downcast::<PyTuple>() {
        let mut items = Vec::with_capacity(tuple.len());
        for item in tuple.iter() {
            items.push(py_to_any_at(&item, max_depth, depth + 1)?);
        }
        return Ok(AnyValue::List(items));
    }
    if let Ok(dict) = obj.downcast::<PyDict>() {
        let mut entries = HashMap::with_capacity(dict.len());
        for (key, value) in dict.iter() {
            let Ok(key) = key.downcast::<PyString>() else {
                return Ok(AnyValue::Opaque {
                    type_name: format!("dict with {} keys", type_name(&key)),
                });
            };
            entries.insert(key.to_string(), py_to_any_at(&value, max_depth, depth + 1)?);
        }
        return Ok(AnyValue::Map(entries));
    }

    Ok(AnyValue::Opaque {
        type_name: type_name(obj),
    })
}

/// Convert a caller-side value into a Python object
///
/// `Opaque` values cannot be rebuilt and are rendered as their type name.
pub fn any_to_py<'py>(py: Python<'py>, value: &AnyValue) -> PyResult<Bound<'py, PyAny>> {
    let obj = match value {
        AnyValue::Null => py.None().into_bound(py),
        AnyValue::Bool(b) => PyBool::new(py, *b).to_owned().into_any(),
        AnyValue::Int(i) => i.into_pyobject(py)?.into_any(),
        AnyValue::UInt(u) => u.into_pyobject(py)?.into_any(),
        AnyValue::Float(f) => PyFloat::new(py, *f).into_any(),
        AnyValue::Str(s) => PyString::new(py, s).into_any(),
        AnyValue::Bytes(bytes) => PyBytes::new(py, bytes).into_any(),
        AnyValue::List(items) => {
            let list = PyList::empty(py);
            for item in items {
                list.append(any_to_py(py, item)?)?;
            }
            list.into_any()
        }
        AnyValue::Map(entries) => {
            let dict = PyDict::new(py);
            for (key, item) in entries {
                dict.set_item(key, any_to_py(py, item)?)?;
            }
            dict.into_any()
        }
        AnyValue::Opaque { type_name } => PyString::new(py, type_name).into_any(),
    };
    Ok(obj)
}

// ========================================================================
// Configuration
// ========================================================================

/// Convert Python dict to MarshallerConfig
///
/// Expected format (all fields optional):
/// ```python
/// {"max_nesting_depth": 64, "reject_non_finite_floats": False}
/// ```
pub fn parse_marshaller_config(py_config: &Bound<'_, PyDict>) -> PyResult<MarshallerConfig> {
    let defaults = MarshallerConfig::default();

    let config = MarshallerConfig {
        max_nesting_depth: extract_with_default(
            py_config,
            "max_nesting_depth",
            defaults.max_nesting_depth,
        )?,
        reject_non_finite_floats: extract_with_default(
            py_config,
            "reject_non_finite_floats",
            defaults.reject_non_finite_floats,
        )?,
    };
    config.validate()?;

    Ok(config)
}

// ========================================================================
// Requests
// ========================================================================

/// Convert Python dict to RequestView
///
/// Expected format:
/// ```python
/// {
///     "name": "team/user_features",
///     "keys": {"user_id": 42, "tags": ["a", "b"]},  # optional
///     "at_millis": 1700000000000,                   # optional, None = now
/// }
/// ```
///
/// # Errors
/// - ValueError if `name` is missing or empty
/// - ValueError if a key is `None`, empty, or not a `str`
/// - ValueError if `at_millis` is not an int that fits in 64 signed bits
pub fn parse_request_view(py_request: &Bound<'_, PyDict>, max_depth: usize) -> PyResult<RequestView> {
    let name: String = extract_required(py_request, "name")?;

    let mut keys = HashMap::new();
    if let Some(py_keys) = py_request.get_item("keys")? {
        if !py_keys.is_none() {
            let keys_dict = py_keys.downcast_into::<PyDict>()?;
            for (key, value) in keys_dict.iter() {
                if key.is_none() {
                    return Err(MarshalError::NullKeyName {
                        request: name.clone(),
                    }
                    .into());
                }
                let Ok(key) = key.downcast::<PyString>() else {
                    return Err(MarshalError::UnsupportedValueType {
                        path: "keys".to_string(),
                        type_name: format!("{} key", type_name(&key)),
                    }
                    .into());
                };
                keys.insert(key.to_string(), py_to_any(&value, max_depth)?);
            }
        }
    }

    let at_millis = match py_request.get_item("at_millis")? {
        Some(py_at) => at_millis_from_dynamic(&py_to_any(&py_at, max_depth)?)?,
        None => None,
    };

    Ok(RequestView::with_at_millis(name, keys, at_millis)?)
}

/// Convert RequestView to Python dict
///
/// Reverse of parse_request_view. `at_millis` is always present, `None`
/// when the request has no timestamp.
pub fn request_view_to_py<'py>(py: Python<'py>, request: &RequestView) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("name", &request.name)?;

    let keys = PyDict::new(py);
    for (key, value) in &request.keys {
        keys.set_item(key, any_to_py(py, value)?)?;
    }
    dict.set_item("keys", keys)?;
    dict.set_item("at_millis", any_to_py(py, &at_millis_to_dynamic(request.at_millis))?)?;

    Ok(dict)
}

// ========================================================================
// Responses
// ========================================================================

fn parse_error_info(py_error: &Bound<'_, PyDict>) -> PyResult<ErrorInfo> {
    Ok(ErrorInfo {
        kind: extract_required(py_error, "kind")?,
        message: extract_required(py_error, "message")?,
    })
}

/// Convert Python dict to ResponseView
///
/// Expected format:
/// ```python
/// {
///     "name": "team/user_features",
///     "values": {
///         "clicks_7d": {"value": 12},
///         "last_country": {"value": None},   # success that produced null
///         "spend_30d": {"error": {"kind": "Timeout", "message": "..."}},
///     },
/// }
/// ```
///
/// A `"value"` entry is a success even when it is `None`; well-formedness
/// (exactly one of value/error) is checked by the marshaller, not here.
/// `"values"` may be omitted or `None` for a response with no features.
///
/// # Errors
/// - ValueError if `name` is missing
/// - ValueError (malformed response) if `values` is not a dict, a feature
///   name is not a non-empty `str`, or a result or error is not a dict
pub fn parse_response_view(py_response: &Bound<'_, PyDict>, max_depth: usize) -> PyResult<ResponseView> {
    let name: String = extract_required(py_response, "name")?;

    let mut values = HashMap::new();
    if let Some(py_values) = py_response.get_item("values")? {
        if !py_values.is_none() {
            let values_dict = downcast_dict(py_values, || format!("values of '{}'", name))?;
            for (feature, py_result) in values_dict.iter() {
                let feature = match feature.extract::<String>() {
                    Ok(text) if !text.is_empty() => text,
                    _ => {
                        return Err(MarshalError::MalformedResponse(format!(
                            "response '{}' has a feature name of type {} that is not a non-empty str",
                            name,
                            type_name(&feature)
                        ))
                        .into())
                    }
                };
                let result_dict = downcast_dict(py_result, || format!("result for '{}'", feature))?;

                let value = match result_dict.get_item("value")? {
                    Some(py_value) => Some(py_to_any(&py_value, max_depth)?),
                    None => None,
                };
                let error = match result_dict.get_item("error")? {
                    Some(py_error) if !py_error.is_none() => {
                        let error_dict = downcast_dict(py_error, || format!("error for '{}'", feature))?;
                        Some(parse_error_info(&error_dict)?)
                    }
                    _ => None,
                };

                values.insert(feature, ResultView { value, error });
            }
        }
    }

    Ok(ResponseView { name, values })
}

fn downcast_dict<'py>(
    obj: Bound<'py, PyAny>,
    what: impl FnOnce() -> String,
) -> PyResult<Bound<'py, PyDict>> {
    obj.downcast_into::<PyDict>().map_err(|err| {
        let found = type_name(&err.into_inner());
        MarshalError::MalformedResponse(format!("{} must be a dict, got {}", what(), found)).into()
    })
}

/// Convert ResponseView to Python dict
///
/// Absent slots are omitted, so `{"value": None}` stays distinguishable from
/// a missing value.
pub fn response_view_to_py<'py>(py: Python<'py>, response: &ResponseView) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("name", &response.name)?;

    let values = PyDict::new(py);
    for (feature, result) in &response.values {
        let result_dict = PyDict::new(py);
        if let Some(value) = &result.value {
            result_dict.set_item("value", any_to_py(py, value)?)?;
        }
        if let Some(error) = &result.error {
            let error_dict = PyDict::new(py);
            error_dict.set_item("kind", &error.kind)?;
            error_dict.set_item("message", &error.message)?;
            result_dict.set_item("error", error_dict)?;
        }
        values.set_item(feature, result_dict)?;
    }
    dict.set_item("values", values)?;

    Ok(dict)
}
