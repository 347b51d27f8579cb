//! Engine Status - Loaded model and feature layout report
//!
//! Served by `cybershield-classify --status`.

use serde::{Deserialize, Serialize};

use crate::constants::{APP_NAME, APP_VERSION};
use crate::logic::engine::Engine;
use crate::logic::features::layout::{layout_hash, ImageFeature, IMAGE_FEATURE_COUNT, IMAGE_FEATURE_VERSION};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    pub service: String,
    pub version: String,
    pub feature_version: u8,
    pub layout_hash: u32,
    pub feature_count: usize,
    pub model: ModelStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelStatus {
    pub engine: String, // "model" | "heuristic"
    pub loaded: bool,
    pub model_type: Option<String>,
    pub checksum: Option<String>,
    pub loaded_at: Option<chrono::DateTime<chrono::Utc>>,
}

pub fn engine_status(engine: &Engine) -> EngineStatus {
    let metadata = engine.model_metadata();

    EngineStatus {
        service: APP_NAME.to_string(),
        version: APP_VERSION.to_string(),
        feature_version: IMAGE_FEATURE_VERSION,
        layout_hash: layout_hash::<ImageFeature>(),
        feature_count: IMAGE_FEATURE_COUNT,
        model: ModelStatus {
            engine: if metadata.is_some() { "model" } else { "heuristic" }.to_string(),
            loaded: metadata.is_some(),
            model_type: metadata.map(|m| m.model_type.clone()),
            checksum: metadata.map(|m| m.checksum.clone()),
            loaded_at: metadata.map(|m| m.loaded_at),
        },
    }
}
