//! Model Module - Trained scaler + anomaly model
//!
//! ## Structure
//! - `scaler` - Standard scaler fitted on the image layout
//! - `inference` - `AnomalyModel` trait and the ONNX implementation
//! - `store` - Model directory loading (checksum + layout checks)
//!
//! State is read-only once loaded. Absent state means heuristic-only mode.

pub mod inference;
pub mod scaler;
pub mod store;


use std::sync::Arc;

use thiserror::Error;

use crate::logic::features::layout::LayoutMismatchError;

pub use inference::{AnomalyModel, AnomalyOutput, OnnxAnomalyModel};
pub use scaler::StandardScaler;
pub use store::{load_model, ModelManifest, ModelMetadata};

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("model JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("ONNX session error: {0}")]
    Session(String),
    #[error("model inference failed: {0}")]
    Inference(String),
    #[error(transparent)]
    LayoutMismatch(#[from] LayoutMismatchError),
    #[error("feature count mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("invalid scaler: {0}")]
    InvalidScaler(String),
    #[error("invalid model manifest: {0}")]
    InvalidManifest(String),
    #[error("model checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },
}

// ============================================================================
// MODEL STATE
// ============================================================================

/// Loaded scaler + model, shared read-only by every classification
#[derive(Clone)]
pub struct ModelState {
    pub scaler: StandardScaler,
    pub model: Arc<dyn AnomalyModel>,
    pub metadata: ModelMetadata,
}

impl std::fmt::Debug for ModelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelState")
            .field("scaler_features", &self.scaler.feature_count())
            .field("model", &self.model.name())
            .field("metadata", &self.metadata)
            .finish()
    }
}
