//! Scoring Module - (is_malicious, confidence) from features
//!
//! ## Structure
//! - `anomaly` - Trained scaler + anomaly model, sigmoid calibration
//! - `heuristic` - Weighted rule tables (fallback, and the popup path)
//!
//! The scorer is picked once when the engine is built; call sites only
//! see `dyn Scorer<I>`.

pub mod anomaly;
pub mod heuristic;

use serde::{Deserialize, Serialize};

use crate::logic::features::ImageFeatureVector;
use crate::logic::stego::StegoResult;

pub use anomaly::{sigmoid_confidence, ModelScorer};
pub use heuristic::{HeuristicScorer, WeightedRule, IMAGE_RULES, POPUP_RULES};

// ============================================================================
// SCORE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMethod {
    Model,
    Heuristic,
    /// Model path failed; neutral answer
    Neutral,
}

impl ScoringMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringMethod::Model => "model",
            ScoringMethod::Heuristic => "heuristic",
            ScoringMethod::Neutral => "neutral",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub is_malicious: bool,
    /// 0.0 - 1.0
    pub confidence: f32,
    pub method: ScoringMethod,
}

impl Score {
    /// Not malicious, confidence 0.5
    pub fn neutral() -> Self {
        Self {
            is_malicious: false,
            confidence: 0.5,
            method: ScoringMethod::Neutral,
        }
    }
}

/// Scoring capability over input `I`
pub trait Scorer<I>: Send + Sync {
    fn score(&self, input: &I) -> Score;
}

// ============================================================================
// IMAGE EVIDENCE
// ============================================================================

/// Everything the image scorers and reason codes look at
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImageEvidence {
    pub features: ImageFeatureVector,
    pub stego: StegoResult,
}

impl ImageEvidence {
    pub fn new(features: ImageFeatureVector, stego: StegoResult) -> Self {
        Self { features, stego }
    }
}
