//! Feature-serving engine interface
//!
//! The engine resolves an [`EngineRequest`] into per-feature results. It is an
//! external collaborator: this crate only defines the seam and drives it from
//! [`Marshaller::fetch`](crate::Marshaller::fetch).
//!
//! ```rust
//! use feature_fetch_core_rs::engine::Engine;
//! use feature_fetch_core_rs::{EngineRequest, EngineResponse, FeatureResult, FrozenMap};
//!
//! struct EchoEngine;
//!
//! impl Engine for EchoEngine {
//!     type Error = std::convert::Infallible;
//!
//!     fn resolve(&self, request: &EngineRequest) -> Result<EngineResponse, Self::Error> {
//!         let values: FrozenMap<FeatureResult> = request
//!             .keys()
//!             .iter()
//!             .map(|(k, v)| (k.clone(), FeatureResult::Success(v.clone())))
//!             .collect();
//!         Ok(EngineResponse::new(request.name(), values).expect("request name is non-empty"))
//!     }
//! }
//! ```

use crate::models::request::EngineRequest;
use crate::models::response::EngineResponse;

/// Resolves engine requests into feature values
pub trait Engine {
    /// Engine-defined failure, passed upward unchanged
    type Error: std::error::Error + Send + Sync + 'static;

    fn resolve(&self, request: &EngineRequest) -> Result<EngineResponse, Self::Error>;
}

impl<E: Engine + ?Sized> Engine for &E {
    type Error = E::Error;

    fn resolve(&self, request: &EngineRequest) -> Result<EngineResponse, Self::Error> {
        (**self).resolve(request)
    }
}

impl<E: Engine + ?Sized> Engine for Box<E> {
    type Error = E::Error;

    fn resolve(&self, request: &EngineRequest) -> Result<EngineResponse, Self::Error> {
        (**self).resolve(request)
    }
}
