//! Model Scoring - Scaler + anomaly model + sigmoid calibration
//!
//! outlier => malicious; confidence = 1 / (1 + exp(s * steepness)) where
//! s = raw + score_offset is the `score_samples` value, so more negative
//! (more anomalous) scores approach 1. Any failure gives the neutral
//! (not malicious, 0.5) score.

use super::{ImageEvidence, Score, Scorer, ScoringMethod};
use crate::logic::model::{ModelError, ModelState};

/// Map a raw anomaly score into [0, 1]
pub fn sigmoid_confidence(raw_score: f32, steepness: f32) -> f32 {
    let confidence = 1.0 / (1.0 + (raw_score * steepness).exp());
    if confidence.is_finite() {
        confidence.clamp(0.0, 1.0)
    } else {
        0.5
    }
}

/// Scorer backed by trained state
pub struct ModelScorer {
    state: ModelState,
    steepness: f32,
}

impl ModelScorer {
    pub fn new(state: ModelState, steepness: f32) -> Self {
        Self { state, steepness }
    }

    pub fn state(&self) -> &ModelState {
        &self.state
    }

    fn try_score(&self, evidence: &ImageEvidence) -> Result<Score, ModelError> {
        evidence.features.validate()?;
        let scaled = self.state.scaler.transform(evidence.features.as_slice())?;
        let output = self.state.model.infer(&scaled)?;
        let sample_score = output.raw_score + self.state.metadata.score_offset;

        Ok(Score {
            is_malicious: output.is_outlier,
            confidence: sigmoid_confidence(sample_score, self.steepness),
            method: ScoringMethod::Model,
        })
    }
}

impl Scorer<ImageEvidence> for ModelScorer {
    fn score(&self, evidence: &ImageEvidence) -> Score {
        match self.try_score(evidence) {
            Ok(score) => {
                log::debug!(
                    "Model score: outlier={} confidence={:.3}",
                    score.is_malicious,
                    score.confidence
                );
                score
            }
            Err(e) => {
                log::warn!("Model inference failed ({}), using neutral score", e);
                Score::neutral()
            }
        }
    }
}
