//! CyberShield Core - Artifact Detection & Decision Engine
//!
//! Classifies untrusted thumbnails and popup/modal content as
//! safe / suspicious / malicious and recommends allow / alert / quarantine.
//!
//! ## Layout
//! - `logic/` - Feature extraction, steganography, scoring, verdict policy
//! - `api/` - Request shape accepted from the serving layer
//! - `constants` - Defaults and environment lookups

pub mod api;
pub mod constants;
pub mod logic;

pub use api::request::InferRequest;
pub use logic::config::EngineConfig;
pub use logic::engine::{Engine, EngineError, EngineHandle};
pub use logic::artifact::{Artifact, ImageArtifact, PopupArtifact};
pub use logic::verdict::{Action, ClassificationResult, DecisionContext, Verdict};
