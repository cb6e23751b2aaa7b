//! PyO3 wrapper for Marshaller
//!
//! This module provides the Python interface to the Rust marshaller.

use pyo3::prelude::*;
use pyo3::types::PyDict;

use super::types::{
    parse_marshaller_config, parse_request_view, parse_response_view, request_view_to_py,
    response_view_to_py,
};
use crate::marshal::Marshaller as RustMarshaller;

/// Python wrapper for Rust Marshaller
///
/// Python callers have no engine types of their own, so the class exposes
/// normalization: a dict goes through the full caller → engine → caller
/// conversion and comes back validated and snapshotted.
///
/// # Example (from Python)
///
/// ```python
/// from feature_fetch_core_rs import Marshaller
///
/// m = Marshaller({"max_nesting_depth": 16})
/// request = m.normalize_request({
///     "name": "team/user_features",
///     "keys": {"user_id": 42},
///     "at_millis": 1_700_000_000_000,
/// })
/// ```
#[pyclass(name = "Marshaller")]
pub struct PyMarshaller {
    inner: RustMarshaller,
}

impl PyMarshaller {
    fn max_depth(&self) -> usize {
        self.inner.config().max_nesting_depth
    }
}

#[pymethods]
impl PyMarshaller {
    /// Create a marshaller, optionally from a configuration dict
    ///
    /// # Errors
    ///
    /// Raises ValueError if the configuration is invalid
    #[new]
    #[pyo3(signature = (config=None))]
    fn new(config: Option<&Bound<'_, PyDict>>) -> PyResult<Self> {
        let inner = match config {
            Some(py_config) => RustMarshaller::with_config(parse_marshaller_config(py_config)?)?,
            None => RustMarshaller::new(),
        };
        Ok(PyMarshaller { inner })
    }

    /// Validate a request dict and return its canonical form
    ///
    /// # Errors
    ///
    /// Raises ValueError if:
    /// - `name` is missing or empty
    /// - a key name is None or empty
    /// - a key value has no engine representation
    /// - `at_millis` is not a 64-bit integer
    fn normalize_request(&self, py: Python, request: &Bound<'_, PyDict>) -> PyResult<Py<PyDict>> {
        let view = parse_request_view(request, self.max_depth())?;
        let engine_request = self.inner.request_to_engine(&view)?;
        let normalized = self.inner.request_to_view(&engine_request);

        Ok(request_view_to_py(py, &normalized)?.unbind())
    }

    /// Validate a response dict and return its canonical form
    ///
    /// # Errors
    ///
    /// Raises ValueError if a feature has neither or both of value/error
    fn normalize_response(&self, py: Python, response: &Bound<'_, PyDict>) -> PyResult<Py<PyDict>> {
        let view = parse_response_view(response, self.max_depth())?;
        let engine_response = self.inner.response_to_engine(&view)?;
        let normalized = self.inner.response_to_view(&engine_response);

        Ok(response_view_to_py(py, &normalized)?.unbind())
    }

    /// Deepest nesting accepted in key and feature values
    #[getter]
    fn max_nesting_depth(&self) -> usize {
        self.max_depth()
    }
}
