//! Request Marshalling Tests
//!
//! Caller-facing RequestView ⇄ engine-facing EngineRequest.
//!
//! Critical invariants tested:
//! - Key sets identical across conversion
//! - Timestamp presence preserved exactly (no sentinels)
//! - Empty names and empty key names rejected before reaching the engine
//! - One unsupported value fails the whole request, reported in key order
//! - The engine request is an independent snapshot of the caller's map

use feature_fetch_core_rs::{AnyValue, MarshalError, MarshalErrorKind, Marshaller, RequestView, Value};
use std::collections::{HashMap, HashSet};

// ============================================================================
// Test Helpers
// ============================================================================

fn user_request() -> RequestView {
    RequestView::new("team/user_features", HashMap::new())
        .unwrap()
        .with_key("user_id", 42i64)
        .with_key("country", "NL")
        .with_key("is_test", false)
}

// ============================================================================
// Timestamps
// ============================================================================

#[test]
fn test_absent_timestamp_stays_absent() {
    let request = Marshaller::new().request_to_engine(&user_request()).unwrap();
    assert_eq!(request.at_millis(), None);
}

#[test]
fn test_present_timestamp_is_copied_exactly() {
    let view = user_request().at(1_700_000_000_000);
    let request = Marshaller::new().request_to_engine(&view).unwrap();
    assert_eq!(request.at_millis(), Some(1_700_000_000_000));
}

#[test]
fn test_zero_timestamp_is_present_not_absent() {
    let view = user_request().at(0);
    let request = Marshaller::new().request_to_engine(&view).unwrap();
    assert_eq!(request.at_millis(), Some(0));
}

#[test]
fn test_extreme_timestamps_are_not_altered() {
    let marshaller = Marshaller::new();
    for at in [i64::MIN, -1, i64::MAX] {
        let request = marshaller.request_to_engine(&user_request().at(at)).unwrap();
        assert_eq!(request.at_millis(), Some(at));
    }
}

// ============================================================================
// Names and keys
// ============================================================================

#[test]
fn test_empty_keys_are_legal() {
    let view = RequestView::new("f", HashMap::new()).unwrap();
    let request = Marshaller::new().request_to_engine(&view).unwrap();

    assert_eq!(request.name(), "f");
    assert!(request.keys().is_empty());
    assert_eq!(request.at_millis(), None);
}

#[test]
fn test_empty_name_is_rejected() {
    // Fields are public, so a view can be emptied after construction
    let mut view = user_request();
    view.name.clear();

    let err = Marshaller::new().request_to_engine(&view).unwrap_err();
    assert_eq!(err.kind(), MarshalErrorKind::InvalidRequest);
}

#[test]
fn test_empty_key_name_is_rejected() {
    let mut view = user_request();
    view.insert_key("", 1i64);

    let err = Marshaller::new().request_to_engine(&view).unwrap_err();
    match err {
        MarshalError::NullKeyName { request } => assert_eq!(request, "team/user_features"),
        other => panic!("expected NullKeyName, got {:?}", other),
    }
}

#[test]
fn test_key_set_is_preserved() {
    let view = user_request();
    let request = Marshaller::new().request_to_engine(&view).unwrap();

    let view_keys: HashSet<&String> = view.keys.keys().collect();
    let engine_keys: HashSet<&String> = request.keys().keys().collect();
    assert_eq!(view_keys, engine_keys);
}

#[test]
fn test_scalar_values_keep_category() {
    let request = Marshaller::new().request_to_engine(&user_request()).unwrap();

    assert_eq!(request.keys().get("user_id"), Some(&Value::Long(42)));
    assert_eq!(request.keys().get("country"), Some(&Value::String("NL".to_string())));
    assert_eq!(request.keys().get("is_test"), Some(&Value::Bool(false)));
}

#[test]
fn test_large_integers_do_not_lose_precision() {
    // 2^53 + 1 is not representable as f64
    let view = user_request().with_key("big", 9_007_199_254_740_993i64);
    let request = Marshaller::new().request_to_engine(&view).unwrap();

    assert_eq!(request.keys().get("big"), Some(&Value::Long(9_007_199_254_740_993)));
}

#[test]
fn test_null_key_value_is_kept() {
    let view = user_request().with_key("maybe", AnyValue::Null);
    let request = Marshaller::new().request_to_engine(&view).unwrap();

    assert_eq!(request.keys().get("maybe"), Some(&Value::Null));
}

// ============================================================================
// Unsupported values
// ============================================================================

#[test]
fn test_opaque_value_fails_whole_request() {
    let view = user_request().with_key(
        "session",
        AnyValue::Opaque {
            type_name: "Session".to_string(),
        },
    );

    match Marshaller::new().request_to_engine(&view) {
        Err(MarshalError::UnsupportedValueType { path, type_name }) => {
            assert_eq!(path, "session");
            assert_eq!(type_name, "Session");
        }
        other => panic!("expected UnsupportedValueType, got {:?}", other),
    }
}

#[test]
fn test_smallest_bad_key_is_reported_on_every_run() {
    let names = ["k7", "k2", "k5", "k0", "k3", "k6", "k1", "k4"];
    let errors: HashSet<String> = (0..200)
        .map(|_| {
            let mut view = RequestView::new("f", HashMap::new()).unwrap();
            for name in names {
                view.insert_key(
                    name,
                    AnyValue::Opaque {
                        type_name: format!("T{}", name),
                    },
                );
            }
            Marshaller::new().request_to_engine(&view).unwrap_err().to_string()
        })
        .collect();

    assert_eq!(errors.len(), 1);
    let message = errors.into_iter().next().unwrap();
    assert!(message.contains("k0"), "unexpected error: {}", message);
}

#[test]
fn test_unsigned_beyond_i64_is_rejected_not_wrapped() {
    let view = user_request().with_key("id", AnyValue::UInt(u64::MAX));
    let err = Marshaller::new().request_to_engine(&view).unwrap_err();
    assert_eq!(err.kind(), MarshalErrorKind::UnsupportedValueType);
}

#[test]
fn test_unsigned_within_i64_becomes_long() {
    let view = user_request().with_key("id", AnyValue::UInt(7));
    let request = Marshaller::new().request_to_engine(&view).unwrap();
    assert_eq!(request.keys().get("id"), Some(&Value::Long(7)));
}

// ============================================================================
// Ownership
// ============================================================================

#[test]
fn test_caller_mutation_after_conversion_does_not_leak() {
    let mut view = user_request();
    let request = Marshaller::new().request_to_engine(&view).unwrap();

    view.insert_key("user_id", 7i64);
    view.insert_key("extra", "late");
    view.at_millis = Some(5);

    assert_eq!(request.keys().get("user_id"), Some(&Value::Long(42)));
    assert!(!request.keys().contains_key("extra"));
    assert_eq!(request.at_millis(), None);
}

#[test]
fn test_each_conversion_builds_a_fresh_snapshot() {
    let marshaller = Marshaller::new();
    let view = user_request();

    let first = marshaller.request_to_engine(&view).unwrap();
    let second = marshaller.request_to_engine(&view).unwrap();

    assert_eq!(first, second);
    assert!(!first.keys().shares_snapshot_with(second.keys()));
}

// ============================================================================
// Inverse direction
// ============================================================================

#[test]
fn test_to_view_restores_caller_request() {
    let marshaller = Marshaller::new();
    let view = user_request().at(1_700_000_000_000);

    let request = marshaller.request_to_engine(&view).unwrap();
    assert_eq!(marshaller.request_to_view(&request), view);
}

#[test]
fn test_deserialized_view_is_validated_on_conversion() {
    let view: RequestView = serde_json::from_str(r#"{"name": ""}"#).unwrap();
    assert!(view.keys.is_empty());

    let err = Marshaller::new().request_to_engine(&view).unwrap_err();
    assert_eq!(err.kind(), MarshalErrorKind::InvalidRequest);
}

#[test]
fn test_dynamic_timestamp_validation() {
    let mut view = user_request();

    view.set_at_millis_dynamic(&AnyValue::Int(1_700_000_000_000)).unwrap();
    assert_eq!(view.at_millis, Some(1_700_000_000_000));

    let err = view.set_at_millis_dynamic(&AnyValue::Float(1.7e12)).unwrap_err();
    assert_eq!(err.kind(), MarshalErrorKind::InvalidRequest);
}
