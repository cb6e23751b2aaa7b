//! Value Conversion Tests
//!
//! Capability dispatch across the boundary: scalars, strings, bytes and
//! arbitrarily nested lists/maps.

use feature_fetch_core_rs::{
    AnyValue, MarshalError, MarshalErrorKind, Marshaller, MarshallerConfig, RequestView, Value,
};
use std::collections::{BTreeMap, HashMap};

fn convert_key(value: AnyValue) -> Result<Value, MarshalError> {
    let view = RequestView::new("f", HashMap::new()).unwrap().with_key("k", value);
    let request = Marshaller::new().request_to_engine(&view)?;
    Ok(request.keys().get("k").cloned().expect("key survives conversion"))
}

fn round_trip_key(value: AnyValue) -> AnyValue {
    let marshaller = Marshaller::new();
    let view = RequestView::new("f", HashMap::new()).unwrap().with_key("k", value);
    let request = marshaller.request_to_engine(&view).unwrap();
    marshaller.request_to_view(&request).keys.remove("k").unwrap()
}

#[test]
fn test_nested_list_of_mixed_scalars_keeps_order() {
    let value = AnyValue::List(vec![AnyValue::Int(1), AnyValue::from("two"), AnyValue::Float(3.0)]);

    assert_eq!(
        convert_key(value.clone()).unwrap(),
        Value::List(vec![Value::Long(1), Value::String("two".to_string()), Value::Double(3.0)])
    );
    assert_eq!(round_trip_key(value.clone()), value);
}

#[test]
fn test_deeply_nested_map_round_trips() {
    let inner = HashMap::from([
        ("scores".to_string(), AnyValue::List(vec![AnyValue::Float(0.5), AnyValue::Float(-2.25)])),
        ("flag".to_string(), AnyValue::Bool(true)),
    ]);
    let value = AnyValue::Map(HashMap::from([
        ("inner".to_string(), AnyValue::Map(inner)),
        ("empty_list".to_string(), AnyValue::List(vec![])),
        ("empty_map".to_string(), AnyValue::Map(HashMap::new())),
    ]));

    assert_eq!(round_trip_key(value.clone()), value);
}

#[test]
fn test_map_converts_to_engine_map() {
    let value = AnyValue::Map(HashMap::from([("a".to_string(), AnyValue::Int(1))]));
    assert_eq!(
        convert_key(value).unwrap(),
        Value::Map(BTreeMap::from([("a".to_string(), Value::Long(1))]))
    );
}

#[test]
fn test_bytes_are_copied_verbatim() {
    let value = AnyValue::Bytes(vec![0, 255, 7]);
    assert_eq!(convert_key(value.clone()).unwrap(), Value::Bytes(vec![0, 255, 7]));
    assert_eq!(round_trip_key(value.clone()), value);
}

#[test]
fn test_float_bits_are_preserved() {
    for f in [0.1, -0.0, f64::MIN_POSITIVE, f64::NAN, f64::NEG_INFINITY] {
        let back = round_trip_key(AnyValue::Float(f));
        match back {
            AnyValue::Float(g) => assert_eq!(g.to_bits(), f.to_bits()),
            other => panic!("expected float, got {:?}", other),
        }
    }
}

#[test]
fn test_integer_never_becomes_float() {
    assert_eq!(convert_key(AnyValue::Int(3)).unwrap(), Value::Long(3));
    assert_ne!(convert_key(AnyValue::Int(3)).unwrap(), Value::Double(3.0));
}

#[test]
fn test_unsupported_element_deep_in_list_reports_path() {
    let value = AnyValue::List(vec![
        AnyValue::Int(1),
        AnyValue::List(vec![AnyValue::Null, AnyValue::UInt(u64::MAX)]),
    ]);

    match convert_key(value) {
        Err(MarshalError::UnsupportedValueType { path, .. }) => assert_eq!(path, "k[1][1]"),
        other => panic!("expected UnsupportedValueType, got {:?}", other),
    }
}

#[test]
fn test_nesting_limit_from_config() {
    let config = MarshallerConfig {
        max_nesting_depth: 3,
        ..MarshallerConfig::default()
    };
    let marshaller = Marshaller::with_config(config).unwrap();

    let mut value = AnyValue::Int(0);
    for _ in 0..3 {
        value = AnyValue::List(vec![value]);
    }
    let view = RequestView::new("f", HashMap::new()).unwrap().with_key("k", value.clone());
    assert!(marshaller.request_to_engine(&view).is_ok());

    let too_deep = RequestView::new("f", HashMap::new())
        .unwrap()
        .with_key("k", AnyValue::List(vec![value]));
    let err = marshaller.request_to_engine(&too_deep).unwrap_err();
    assert_eq!(err.kind(), MarshalErrorKind::UnsupportedValueType);
}

#[test]
fn test_json_built_value_converts() {
    let json: serde_json::Value =
        serde_json::from_str(r#"{"ids": [1, 2, 3], "geo": {"lat": 52.37, "lon": 4.89}}"#).unwrap();
    let converted = convert_key(AnyValue::from(json)).unwrap();

    let expected = Value::Map(BTreeMap::from([
        (
            "ids".to_string(),
            Value::List(vec![Value::Long(1), Value::Long(2), Value::Long(3)]),
        ),
        (
            "geo".to_string(),
            Value::Map(BTreeMap::from([
                ("lat".to_string(), Value::Double(52.37)),
                ("lon".to_string(), Value::Double(4.89)),
            ])),
        ),
    ]));
    assert_eq!(converted, expected);
}
