//! Errors raised at the marshalling boundary

use thiserror::Error;

/// Boxed engine failure, passed upward unchanged
pub type BoxedEngineError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while converting requests or responses
#[derive(Debug, Error)]
pub enum MarshalError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Request '{request}' contains a null or empty key name")]
    NullKeyName { request: String },

    #[error("Unsupported value type '{type_name}' at '{path}'")]
    UnsupportedValueType { path: String, type_name: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Engine error: {0}")]
    Engine(#[source] BoxedEngineError),
}

/// Discriminant of [`MarshalError`] without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarshalErrorKind {
    InvalidRequest,
    NullKeyName,
    UnsupportedValueType,
    MalformedResponse,
    EngineError,
}

impl MarshalError {
    pub fn kind(&self) -> MarshalErrorKind {
        match self {
            MarshalError::InvalidRequest(_) => MarshalErrorKind::InvalidRequest,
            MarshalError::NullKeyName { .. } => MarshalErrorKind::NullKeyName,
            MarshalError::UnsupportedValueType { .. } => MarshalErrorKind::UnsupportedValueType,
            MarshalError::MalformedResponse(_) => MarshalErrorKind::MalformedResponse,
            MarshalError::Engine(_) => MarshalErrorKind::EngineError,
        }
    }

    /// Wrap an engine failure without altering it
    pub fn engine<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        MarshalError::Engine(Box::new(err))
    }
}
