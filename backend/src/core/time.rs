//! Evaluation timestamps
//!
//! A request timestamp is an opaque epoch-milliseconds `i64`. It is never
//! truncated, rounded or interpreted in a timezone, and absence is always an
//! explicit `None` rather than a sentinel such as `0` or `-1`.

use crate::marshal::MarshalError;
use crate::models::value::AnyValue;

/// Validate a dynamically typed timestamp into an explicit optional
///
/// Host runtimes hand timestamps over as whatever numeric object they have.
/// Only integers representable as `i64` are accepted; anything else is
/// rejected instead of being cast.
///
/// # Example
/// ```
/// use feature_fetch_core_rs::core::time::at_millis_from_dynamic;
/// use feature_fetch_core_rs::AnyValue;
///
/// assert_eq!(at_millis_from_dynamic(&AnyValue::Null).unwrap(), None);
/// assert_eq!(
///     at_millis_from_dynamic(&AnyValue::Int(1_700_000_000_000)).unwrap(),
///     Some(1_700_000_000_000)
/// );
/// assert!(at_millis_from_dynamic(&AnyValue::Float(1.5)).is_err());
/// ```
pub fn at_millis_from_dynamic(value: &AnyValue) -> Result<Option<i64>, MarshalError> {
    match value {
        AnyValue::Null => Ok(None),
        AnyValue::Int(millis) => Ok(Some(*millis)),
        AnyValue::UInt(millis) => i64::try_from(*millis).map(Some).map_err(|_| {
            MarshalError::InvalidRequest(format!(
                "at_millis {} does not fit in a signed 64-bit integer",
                millis
            ))
        }),
        other => Err(MarshalError::InvalidRequest(format!(
            "at_millis must be an integer epoch-millis value, got {}",
            other.kind()
        ))),
    }
}

/// Render an optional timestamp back into the dynamic form
pub fn at_millis_to_dynamic(at_millis: Option<i64>) -> AnyValue {
    match at_millis {
        Some(millis) => AnyValue::Int(millis),
        None => AnyValue::Null,
    }
}
