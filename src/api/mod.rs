//! API Module
//!
//! Shapes exchanged with the serving layer:
//! - request.rs: `InferRequest` parsing and validation
//! - status.rs: Engine status report (model loaded, layout)

pub mod request;
pub mod status;

pub use request::InferRequest;
pub use status::{engine_status, EngineStatus};
