//! Inference - ONNX Runtime anomaly model
//!
//! The exported model takes one `[1, n]` float row and answers with a
//! binary outlier label plus a raw anomaly score (negative = more
//! anomalous). Converters export isolation forests with the sklearn
//! `decision_function` value; adding the fitted `offset_` back gives
//! `score_samples`, the scale the confidence sigmoid is calibrated on.

use std::path::Path;

use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;

use super::ModelError;

/// Label the model uses for outliers
pub const OUTLIER_LABEL: i64 = -1;

pub const DEFAULT_LABEL_OUTPUT: &str = "label";
pub const DEFAULT_SCORE_OUTPUT: &str = "scores";

/// IsolationForest `offset_` for `contamination="auto"`
pub const DEFAULT_SCORE_OFFSET: f32 = -0.5;

/// Raw model answer for one scaled vector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalyOutput {
    pub is_outlier: bool,
    pub raw_score: f32,
}

// ============================================================================
// ANOMALY MODEL TRAIT
// ============================================================================

/// Pre-fitted unsupervised anomaly model
pub trait AnomalyModel: Send + Sync {
    fn name(&self) -> &str;
    fn infer(&self, scaled: &[f32]) -> Result<AnomalyOutput, ModelError>;
}

// ============================================================================
// ONNX IMPLEMENTATION
// ============================================================================

/// ONNX-exported anomaly model (e.g. isolation forest)
pub struct OnnxAnomalyModel {
    session: Mutex<Session>,
    label_output: String,
    score_output: String,
}

impl OnnxAnomalyModel {
    pub fn load(path: &Path, label_output: &str, score_output: &str) -> Result<Self, ModelError> {
        log::info!("Loading ONNX model from: {}", path.display());

        let session = Session::builder()
            .map_err(|e| ModelError::Session(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ModelError::Session(format!("Failed to set optimization: {}", e)))?
            .commit_from_file(path)
            .map_err(|e| ModelError::Session(format!("Failed to load model: {}", e)))?;

        let outputs: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
        for wanted in [label_output, score_output] {
            if !outputs.iter().any(|name| name == wanted) {
                return Err(ModelError::Session(format!(
                    "Model has no output '{}' (outputs: {:?})",
                    wanted, outputs
                )));
            }
        }

        log::info!("ONNX model loaded successfully");

        Ok(Self {
            session: Mutex::new(session),
            label_output: label_output.to_string(),
            score_output: score_output.to_string(),
        })
    }
}

impl AnomalyModel for OnnxAnomalyModel {
    fn name(&self) -> &str {
        "onnx"
    }

    fn infer(&self, scaled: &[f32]) -> Result<AnomalyOutput, ModelError> {
        let input_array = Array2::<f32>::from_shape_vec((1, scaled.len()), scaled.to_vec())
            .map_err(|e| ModelError::Inference(format!("Array error: {}", e)))?;

        let input_tensor = Value::from_array(input_array)
            .map_err(|e| ModelError::Inference(format!("Tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| ModelError::Inference(format!("Inference failed: {}", e)))?;

        let label = outputs
            .get(self.label_output.as_str())
            .ok_or_else(|| ModelError::Inference(format!("No output '{}'", self.label_output)))?
            .try_extract_tensor::<i64>()
            .map_err(|e| ModelError::Inference(format!("Label extract error: {}", e)))?
            .1
            .first()
            .copied()
            .ok_or_else(|| ModelError::Inference("Empty label tensor".to_string()))?;

        let raw_score = outputs
            .get(self.score_output.as_str())
            .ok_or_else(|| ModelError::Inference(format!("No output '{}'", self.score_output)))?
            .try_extract_tensor::<f32>()
            .map_err(|e| ModelError::Inference(format!("Score extract error: {}", e)))?
            .1
            .first()
            .copied()
            .ok_or_else(|| ModelError::Inference("Empty score tensor".to_string()))?;

        if !raw_score.is_finite() {
            return Err(ModelError::Inference(format!("Non-finite score {}", raw_score)));
        }

        Ok(AnomalyOutput {
            is_outlier: label == OUTLIER_LABEL,
            raw_score,
        })
    }
}

// ============================================================================
// TEST DOUBLES
// ============================================================================
