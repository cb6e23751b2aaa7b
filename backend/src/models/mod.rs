//! Request, response and value types on both sides of the boundary

pub mod frozen_map;
pub mod request;
pub mod response;
pub mod value;

// Re-exports
pub use frozen_map::FrozenMap;
pub use request::{EngineRequest, RequestView};
pub use response::{EngineResponse, ErrorInfo, FeatureResult, ResponseView, ResultView};
pub use value::{AnyValue, Value};
