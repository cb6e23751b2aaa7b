//! Python bindings (enabled with the `pyo3` feature)

pub mod marshaller;
pub mod types;
