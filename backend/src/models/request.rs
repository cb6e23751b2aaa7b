//! Feature lookup requests
//!
//! Two shapes of the same request:
//! - [`RequestView`]: caller-facing, mutable while it is being built
//! - [`EngineRequest`]: engine-facing, validated and immutable once built

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::time::at_millis_from_dynamic;
use crate::marshal::MarshalError;
use crate::models::frozen_map::FrozenMap;
use crate::models::value::{AnyValue, Value};

/// Reject empty feature group names
pub(crate) fn validate_name(name: &str) -> Result<(), MarshalError> {
    if name.is_empty() {
        return Err(MarshalError::InvalidRequest(
            "request name must be non-empty".to_string(),
        ));
    }
    Ok(())
}

/// Reject empty key names
pub(crate) fn validate_key_names<'a, I>(request: &str, key_names: I) -> Result<(), MarshalError>
where
    I: IntoIterator<Item = &'a String>,
{
    if key_names.into_iter().any(|k| k.is_empty()) {
        return Err(MarshalError::NullKeyName {
            request: request.to_string(),
        });
    }
    Ok(())
}

// ============================================================================
// CALLER-FACING REQUEST
// ============================================================================

/// Caller-facing feature lookup request
///
/// Fields are public so callers can build `keys` incrementally; the
/// marshaller re-validates everything when converting.
///
/// Only the constructors validate. A view assembled through the public
/// fields, [`RequestView::insert_key`] or `Deserialize` may hold an empty
/// name or empty key names; such a view is representable but fails
/// `request_to_engine` with `InvalidRequest` / `NullKeyName`.
///
/// # Example
/// ```
/// use feature_fetch_core_rs::{AnyValue, RequestView};
/// use std::collections::HashMap;
///
/// let mut request = RequestView::new("user_features", HashMap::new()).unwrap();
/// request.insert_key("user_id", AnyValue::Int(42));
/// let request = request.at(1_700_000_000_000);
///
/// assert_eq!(request.keys.len(), 1);
/// assert_eq!(request.at_millis, Some(1_700_000_000_000));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestView {
    /// Feature group or join to evaluate
    pub name: String,

    /// Key column values
    #[serde(default)]
    pub keys: HashMap<String, AnyValue>,

    /// Evaluation time in epoch milliseconds (None = engine's "now")
    #[serde(default)]
    pub at_millis: Option<i64>,
}

impl RequestView {
    /// Create a request evaluated at the engine's current time
    ///
    /// # Errors
    /// - `InvalidRequest` if `name` is empty
    /// - `NullKeyName` if any key name is empty
    pub fn new(name: impl Into<String>, keys: HashMap<String, AnyValue>) -> Result<Self, MarshalError> {
        Self::with_at_millis(name, keys, None)
    }

    /// Create a request with an explicit (optional) evaluation timestamp
    pub fn with_at_millis(
        name: impl Into<String>,
        keys: HashMap<String, AnyValue>,
        at_millis: Option<i64>,
    ) -> Result<Self, MarshalError> {
        let name = name.into();
        validate_name(&name)?;
        validate_key_names(&name, keys.keys())?;

        Ok(Self {
            name,
            keys,
            at_millis,
        })
    }

    /// Insert or replace one key value, returning the previous one
    pub fn insert_key(&mut self, key: impl Into<String>, value: impl Into<AnyValue>) -> Option<AnyValue> {
        self.keys.insert(key.into(), value.into())
    }

    /// Builder form of [`RequestView::insert_key`]
    pub fn with_key(mut self, key: impl Into<String>, value: impl Into<AnyValue>) -> Self {
        self.insert_key(key, value);
        self
    }

    /// Set the evaluation timestamp
    pub fn at(mut self, at_millis: i64) -> Self {
        self.at_millis = Some(at_millis);
        self
    }

    /// Set the timestamp from a dynamically typed value
    ///
    /// `Null` clears it. Non-integer or out-of-range values fail with
    /// `InvalidRequest` and leave the current timestamp untouched.
    pub fn set_at_millis_dynamic(&mut self, value: &AnyValue) -> Result<(), MarshalError> {
        self.at_millis = at_millis_from_dynamic(value)?;
        Ok(())
    }
}

// ============================================================================
// ENGINE-FACING REQUEST
// ============================================================================

/// Engine-facing feature lookup request
///
/// Always holds a non-empty name and non-empty key names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineRequest {
    name: String,
    keys: FrozenMap<Value>,
    at_millis: Option<i64>,
}

impl EngineRequest {
    /// # Errors
    /// - `InvalidRequest` if `name` is empty
    /// - `NullKeyName` if any key name is empty
    pub fn new(
        name: impl Into<String>,
        keys: FrozenMap<Value>,
        at_millis: Option<i64>,
    ) -> Result<Self, MarshalError> {
        let name = name.into();
        validate_name(&name)?;
        validate_key_names(&name, keys.keys())?;

        Ok(Self {
            name,
            keys,
            at_millis,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keys(&self) -> &FrozenMap<Value> {
        &self.keys
    }

    pub fn at_millis(&self) -> Option<i64> {
        self.at_millis
    }
}
