//! Feature Fetch Core - boundary marshalling for feature lookups
//!
//! Translates feature-lookup requests and responses between the loosely typed
//! form callers build (from Rust, JSON or Python) and the strongly typed form
//! a feature-serving engine consumes.
//!
//! # Architecture
//!
//! - **core**: Timestamp handling
//! - **models**: Request, response and value types for both sides
//! - **marshal**: The `Marshaller` and its configuration and errors
//! - **engine**: The feature-serving engine seam
//! - **ffi**: Python bindings (`pyo3` feature, on by default)
//!
//! # Critical Invariants
//!
//! 1. Key sets and values survive conversion unchanged
//! 2. Timestamps are explicit `Option<i64>`, never sentinels
//! 3. Empty request names never reach the engine
//! 4. Conversions are pure: no shared state, no I/O

// Module declarations
pub mod core;
pub mod engine;
pub mod marshal;
pub mod models;

// Re-exports for convenience
pub use engine::Engine;
pub use marshal::{MarshalError, MarshalErrorKind, Marshaller, MarshallerConfig};
pub use models::{
    AnyValue, EngineRequest, EngineResponse, ErrorInfo, FeatureResult, FrozenMap, RequestView,
    ResponseView, ResultView, Value,
};

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn feature_fetch_core_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ffi::marshaller::PyMarshaller>()?;
    Ok(())
}
