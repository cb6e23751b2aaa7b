//! Feature lookup responses
//!
//! Each requested feature maps to exactly one outcome: a value or an error.
//! On the engine side that is enforced by [`FeatureResult`]; on the caller
//! side [`ResultView`] keeps both slots optional, so an ill-formed entry is
//! representable and has to be rejected during conversion.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

use crate::marshal::MarshalError;
use crate::models::frozen_map::FrozenMap;
use crate::models::value::{AnyValue, Value};

/// Error reported for a single feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error category (e.g. "KeyMissing", "Timeout")
    pub kind: String,

    /// Human-readable description
    pub message: String,
}

impl ErrorInfo {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// CALLER-FACING RESPONSE
// ============================================================================

/// An explicit JSON `null` is a present `Null` value, not an absent one
fn present<'de, D>(deserializer: D) -> Result<Option<AnyValue>, D::Error>
where
    D: Deserializer<'de>,
{
    AnyValue::deserialize(deserializer).map(Some)
}

/// Caller-facing outcome of one feature
///
/// Well-formed entries carry exactly one of `value` or `error`.
/// `value: Some(AnyValue::Null)` is a successful lookup that produced null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultView {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub value: Option<AnyValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl ResultView {
    pub fn success(value: impl Into<AnyValue>) -> Self {
        Self {
            value: Some(value.into()),
            error: None,
        }
    }

    pub fn failure(error: ErrorInfo) -> Self {
        Self {
            value: None,
            error: Some(error),
        }
    }
}

/// Caller-facing response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseView {
    /// Name of the request this answers
    pub name: String,

    /// Feature name to outcome
    #[serde(default)]
    pub values: HashMap<String, ResultView>,
}

impl ResponseView {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: HashMap::new(),
        }
    }

    /// Builder: add one feature outcome
    pub fn with_result(mut self, feature: impl Into<String>, result: ResultView) -> Self {
        self.values.insert(feature.into(), result);
        self
    }
}

// ============================================================================
// ENGINE-FACING RESPONSE
// ============================================================================

/// Engine-side outcome of one feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeatureResult {
    Success(Value),
    Failure(ErrorInfo),
}

impl FeatureResult {
    pub fn is_success(&self) -> bool {
        matches!(self, FeatureResult::Success(_))
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            FeatureResult::Success(value) => Some(value),
            FeatureResult::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        match self {
            FeatureResult::Success(_) => None,
            FeatureResult::Failure(error) => Some(error),
        }
    }
}

/// Engine-facing response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineResponse {
    name: String,
    values: FrozenMap<FeatureResult>,
}

impl EngineResponse {
    /// # Errors
    /// `MalformedResponse` if the name or any feature name is empty
    pub fn new(name: impl Into<String>, values: FrozenMap<FeatureResult>) -> Result<Self, MarshalError> {
        let name = name.into();
        if name.is_empty() {
            return Err(MarshalError::MalformedResponse(
                "response name must be non-empty".to_string(),
            ));
        }
        if values.keys().any(|feature| feature.is_empty()) {
            return Err(MarshalError::MalformedResponse(format!(
                "response '{}' contains an empty feature name",
                name
            )));
        }

        Ok(Self { name, values })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &FrozenMap<FeatureResult> {
        &self.values
    }

    /// Outcome for one feature, if the engine reported it
    pub fn get(&self, feature: &str) -> Option<&FeatureResult> {
        self.values.get(feature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_null_is_present() {
        let view: ResultView = serde_json::from_str(r#"{"value": null}"#).unwrap();
        assert_eq!(view.value, Some(AnyValue::Null));
        assert_eq!(view.error, None);
    }

    #[test]
    fn test_missing_value_is_absent() {
        let view: ResultView =
            serde_json::from_str(r#"{"error": {"kind": "Timeout", "message": "slow"}}"#).unwrap();
        assert_eq!(view.value, None);
        assert_eq!(view.error, Some(ErrorInfo::new("Timeout", "slow")));
    }

    #[test]
    fn test_absent_slots_are_not_serialized() {
        let json = serde_json::to_string(&ResultView::success(AnyValue::Int(3))).unwrap();
        assert_eq!(json, r#"{"value":3}"#);
    }

    #[test]
    fn test_engine_response_rejects_empty_feature_name() {
        let values: FrozenMap<FeatureResult> =
            [(String::new(), FeatureResult::Success(Value::Null))].into_iter().collect();
        assert!(EngineResponse::new("f", values).is_err());
    }

    #[test]
    fn test_feature_result_accessors() {
        let ok = FeatureResult::Success(Value::Long(1));
        let failed = FeatureResult::Failure(ErrorInfo::new("KeyMissing", "no row"));

        assert!(ok.is_success());
        assert_eq!(ok.value(), Some(&Value::Long(1)));
        assert_eq!(failed.error().map(|e| e.kind.as_str()), Some("KeyMissing"));
        assert_eq!(failed.value(), None);
    }
}
