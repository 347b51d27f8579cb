//! Model Store - Loads trained state from a model directory
//!
//! Layout:
//! - `image_model.onnx` - anomaly model
//! - `scaler.json` - `{mean, scale, feature_version?, layout_hash?}`
//! - `model_meta.json` - optional `{sha256?, model_type?, label_output?, score_output?, score_offset?}`
//!
//! Missing model or scaler file = no trained state (`Ok(None)`).

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::inference::{
    OnnxAnomalyModel, DEFAULT_LABEL_OUTPUT, DEFAULT_SCORE_OFFSET, DEFAULT_SCORE_OUTPUT,
};
use super::scaler::StandardScaler;
use super::{ModelError, ModelState};
use crate::constants::{MODEL_FILE_NAME, MODEL_META_FILE_NAME, SCALER_FILE_NAME};
use crate::logic::features::layout::{layout_hash, FeatureKey, ImageFeature};

/// Optional sidecar describing the exported model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelManifest {
    /// Hex SHA-256 of the ONNX file
    pub sha256: Option<String>,
    pub model_type: Option<String>,
    pub label_output: Option<String>,
    pub score_output: Option<String>,
    /// Fitted `offset_`, added to the score output
    pub score_offset: Option<f32>,
}

/// What was loaded, and when
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_path: String,
    pub model_type: String,
    pub checksum: String,
    pub features: usize,
    pub feature_version: u8,
    pub layout_hash: u32,
    pub score_offset: f32,
    pub loaded_at: chrono::DateTime<chrono::Utc>,
}

/// Load trained state from `dir`.
///
/// `Ok(None)` when the directory lacks the model or the scaler; an error
/// when the files exist but do not belong to the current image layout.
pub fn load_model(dir: &Path) -> Result<Option<ModelState>, ModelError> {
    let model_path = dir.join(MODEL_FILE_NAME);
    let scaler_path = dir.join(SCALER_FILE_NAME);

    if !model_path.is_file() || !scaler_path.is_file() {
        log::info!(
            "No trained model in {} - heuristic scoring only",
            dir.display()
        );
        return Ok(None);
    }

    let scaler = StandardScaler::from_json(&std::fs::read_to_string(&scaler_path)?)?;
    scaler.check_layout::<ImageFeature>()?;

    let manifest = read_manifest(dir)?;

    let score_offset = manifest.score_offset.unwrap_or(DEFAULT_SCORE_OFFSET);
    if !score_offset.is_finite() {
        return Err(ModelError::InvalidManifest(format!(
            "score_offset must be finite, got {}",
            score_offset
        )));
    }

    let model_bytes = std::fs::read(&model_path)?;
    let checksum = sha256_hex(&model_bytes);
    verify_checksum(manifest.sha256.as_deref(), &checksum)?;

    let model = OnnxAnomalyModel::load(
        &model_path,
        manifest.label_output.as_deref().unwrap_or(DEFAULT_LABEL_OUTPUT),
        manifest.score_output.as_deref().unwrap_or(DEFAULT_SCORE_OUTPUT),
    )?;

    let metadata = ModelMetadata {
        model_path: model_path.display().to_string(),
        model_type: manifest
            .model_type
            .unwrap_or_else(|| "isolation_forest".to_string()),
        checksum,
        features: scaler.feature_count(),
        feature_version: ImageFeature::VERSION,
        layout_hash: layout_hash::<ImageFeature>(),
        score_offset,
        loaded_at: chrono::Utc::now(),
    };

    log::info!(
        "Model ready: {} ({}, sha256 {}…)",
        metadata.model_path,
        metadata.model_type,
        &metadata.checksum[..12]
    );

    Ok(Some(ModelState {
        scaler,
        model: Arc::new(model),
        metadata,
    }))
}

/// Parse `model_meta.json` if present
pub fn read_manifest(dir: &Path) -> Result<ModelManifest, ModelError> {
    let path = dir.join(MODEL_META_FILE_NAME);
    if !path.is_file() {
        return Ok(ModelManifest::default());
    }
    Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?)
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Case-insensitive compare against the expected digest, if one is recorded
pub fn verify_checksum(expected: Option<&str>, actual: &str) -> Result<(), ModelError> {
    match expected {
        Some(expected) if !expected.trim().eq_ignore_ascii_case(actual) => {
            Err(ModelError::ChecksumMismatch {
                expected: expected.trim().to_lowercase(),
                actual: actual.to_string(),
            })
        }
        _ => Ok(()),
    }
}
