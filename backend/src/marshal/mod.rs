//! Marshaller - conversion between caller and engine representations
//!
//! # Overview
//!
//! Callers build a [`RequestView`] with loosely typed key values. The engine
//! consumes an [`EngineRequest`] with strongly typed values held in an
//! immutable snapshot. Responses travel the other way.
//!
//! ```text
//! RequestView --request_to_engine--> EngineRequest --Engine::resolve--> EngineResponse
//!      ^                                                                      |
//!      +------request_to_view------+          ResponseView <--response_to_view-+
//! ```
//!
//! # Guarantees
//!
//! 1. Key sets are identical on both sides; nothing is added, dropped or renamed
//! 2. Values keep their category and content; floats are bit-exact
//! 3. `at_millis` presence is preserved; there are no sentinels
//! 4. `to_engine(to_view(to_engine(x))) == to_engine(x)`
//! 5. Empty names never reach the engine
//!
//! The marshaller holds only its configuration. Every call allocates fresh
//! output and never mutates or aliases its input.

pub mod error;
mod value;

pub use error::{BoxedEngineError, MarshalError, MarshalErrorKind};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::engine::Engine;
use crate::models::frozen_map::FrozenMap;
use crate::models::request::{validate_key_names, validate_name, EngineRequest, RequestView};
use crate::models::response::{EngineResponse, ErrorInfo, FeatureResult, ResponseView, ResultView};
use crate::models::value::AnyValue;

/// The single outcome a well-formed feature entry carries
enum Outcome<'a> {
    Value(&'a AnyValue),
    Error(&'a ErrorInfo),
}

/// Exactly one of value/error, under a non-empty feature name
fn result_outcome<'a>(feature: &str, result: &'a ResultView) -> Result<Outcome<'a>, MarshalError> {
    if feature.is_empty() {
        return Err(MarshalError::MalformedResponse(
            "response contains an empty feature name".to_string(),
        ));
    }
    match (&result.value, &result.error) {
        (Some(any), None) => Ok(Outcome::Value(any)),
        (None, Some(error)) => Ok(Outcome::Error(error)),
        (None, None) => Err(MarshalError::MalformedResponse(format!(
            "feature '{}' has neither a value nor an error",
            feature
        ))),
        (Some(_), Some(_)) => Err(MarshalError::MalformedResponse(format!(
            "feature '{}' has both a value and an error",
            feature
        ))),
    }
}

/// Default limit on list/map nesting in caller values
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 64;

fn default_max_nesting_depth() -> usize {
    DEFAULT_MAX_NESTING_DEPTH
}

/// Marshaller configuration
///
/// # Example
/// ```
/// use feature_fetch_core_rs::MarshallerConfig;
///
/// let config: MarshallerConfig =
///     serde_json::from_str(r#"{"reject_non_finite_floats": true}"#).unwrap();
/// assert_eq!(config.max_nesting_depth, 64);
/// assert!(config.reject_non_finite_floats);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarshallerConfig {
    /// Deepest list/map nesting accepted from callers
    #[serde(default = "default_max_nesting_depth")]
    pub max_nesting_depth: usize,

    /// Refuse NaN and infinities (for transports that cannot carry them)
    #[serde(default)]
    pub reject_non_finite_floats: bool,
}

impl Default for MarshallerConfig {
    fn default() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            reject_non_finite_floats: false,
        }
    }
}

impl MarshallerConfig {
    /// # Errors
    /// `InvalidRequest` if `max_nesting_depth` is zero
    pub fn validate(&self) -> Result<(), MarshalError> {
        if self.max_nesting_depth == 0 {
            return Err(MarshalError::InvalidRequest(
                "max_nesting_depth must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Stateless bidirectional converter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Marshaller {
    config: MarshallerConfig,
}

impl Marshaller {
    /// Create a marshaller with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a marshaller with a validated configuration
    pub fn with_config(config: MarshallerConfig) -> Result<Self, MarshalError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MarshallerConfig {
        &self.config
    }

    // ========================================================================
    // Requests
    // ========================================================================

    /// Convert a caller request into an engine request
    ///
    /// # Errors
    /// - `InvalidRequest` if the name is empty
    /// - `NullKeyName` if any key name is empty
    /// - `UnsupportedValueType` if any key value has no engine representation;
    ///   one bad key fails the whole request. Keys are converted in sorted
    ///   order, so the reported key is the same for equal requests.
    ///
    /// # Example
    /// ```
    /// use feature_fetch_core_rs::{Marshaller, RequestView, Value};
    /// use std::collections::HashMap;
    ///
    /// let view = RequestView::new("user_features", HashMap::new())
    ///     .unwrap()
    ///     .with_key("user_id", 42i64)
    ///     .at(1_700_000_000_000);
    ///
    /// let request = Marshaller::new().request_to_engine(&view).unwrap();
    /// assert_eq!(request.name(), "user_features");
    /// assert_eq!(request.keys().get("user_id"), Some(&Value::Long(42)));
    /// assert_eq!(request.at_millis(), Some(1_700_000_000_000));
    /// ```
    pub fn request_to_engine(&self, view: &RequestView) -> Result<EngineRequest, MarshalError> {
        let converted = self.convert_request(view);
        match &converted {
            Ok(request) => tracing::debug!(
                request = request.name(),
                keys = request.keys().len(),
                at_millis = ?request.at_millis(),
                "converted request for engine"
            ),
            Err(err) => tracing::debug!(request = %view.name, error = %err, "rejected request"),
        }
        converted
    }

    fn convert_request(&self, view: &RequestView) -> Result<EngineRequest, MarshalError> {
        validate_name(&view.name)?;
        validate_key_names(&view.name, view.keys.keys())?;

        let mut entries: Vec<(&String, &AnyValue)> = view.keys.iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));

        let mut keys = BTreeMap::new();
        for (key, any) in entries {
            keys.insert(key.clone(), value::to_engine_value(key, any, &self.config)?);
        }

        EngineRequest::new(view.name.clone(), FrozenMap::from(keys), view.at_millis)
    }

    /// Convert an engine request back into the caller representation
    ///
    /// Total: every engine value has a caller-side form.
    pub fn request_to_view(&self, request: &EngineRequest) -> RequestView {
        let keys: HashMap<_, _> = request
            .keys()
            .iter()
            .map(|(key, v)| (key.clone(), value::to_any_value(v)))
            .collect();

        RequestView {
            name: request.name().to_string(),
            keys,
            at_millis: request.at_millis(),
        }
    }

    // ========================================================================
    // Responses
    // ========================================================================

    /// Convert an engine response into the caller representation
    ///
    /// Total and not depth-bounded: `max_nesting_depth` only guards values
    /// coming from callers.
    pub fn response_to_view(&self, response: &EngineResponse) -> ResponseView {
        let values = response
            .values()
            .iter()
            .map(|(feature, result)| {
                let view = match result {
                    FeatureResult::Success(v) => ResultView {
                        value: Some(value::to_any_value(v)),
                        error: None,
                    },
                    FeatureResult::Failure(error) => ResultView {
                        value: None,
                        error: Some(error.clone()),
                    },
                };
                (feature.clone(), view)
            })
            .collect();

        ResponseView {
            name: response.name().to_string(),
            values,
        }
    }

    /// Convert a caller response into the engine representation
    ///
    /// # Errors
    /// - `MalformedResponse` if a feature carries neither or both of
    ///   value/error, or if the response or a feature name is empty
    /// - `UnsupportedValueType` if a success value has no engine representation
    ///
    /// Every entry's shape is checked before any value is converted, and both
    /// passes run in sorted feature order, so equal responses fail equally.
    pub fn response_to_engine(&self, view: &ResponseView) -> Result<EngineResponse, MarshalError> {
        if view.name.is_empty() {
            return Err(MarshalError::MalformedResponse(
                "response name must be non-empty".to_string(),
            ));
        }

        let mut entries: Vec<(&String, &ResultView)> = view.values.iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));

        // Shape of every entry first, so a malformed entry wins over a bad value
        let outcomes = entries
            .into_iter()
            .map(|(feature, result)| result_outcome(feature, result).map(|outcome| (feature, outcome)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut values = BTreeMap::new();
        for (feature, outcome) in outcomes {
            let converted = match outcome {
                Outcome::Value(any) => {
                    FeatureResult::Success(value::to_engine_value(feature, any, &self.config)?)
                }
                Outcome::Error(error) => FeatureResult::Failure(error.clone()),
            };
            values.insert(feature.clone(), converted);
        }

        EngineResponse::new(view.name.clone(), FrozenMap::from(values))
    }

    // ========================================================================
    // Full lookup
    // ========================================================================

    /// Convert, resolve through the engine, and convert back
    ///
    /// # Errors
    /// Any request conversion error, or `MarshalError::Engine` wrapping the
    /// engine's own error unchanged.
    pub fn fetch<E: Engine + ?Sized>(
        &self,
        engine: &E,
        view: &RequestView,
    ) -> Result<ResponseView, MarshalError> {
        let request = self.request_to_engine(view)?;

        let response = engine.resolve(&request).map_err(|err| {
            tracing::warn!(request = request.name(), error = %err, "engine failed to resolve request");
            MarshalError::engine(err)
        })?;

        Ok(self.response_to_view(&response))
    }
}
