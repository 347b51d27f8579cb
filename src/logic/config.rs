//! Engine Configuration
//!
//! Tunables that shape extraction, steganography and calibration.
//! Loaded once at startup, immutable for the lifetime of an `Engine`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants;

// ============================================================================
// ENGINE CONFIG
// ============================================================================

/// Engine configuration (env, config file or code)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding `image_model.onnx` + `scaler.json`
    pub model_dir: PathBuf,
    /// Policy threshold used when a request carries none
    pub default_threshold: f32,
    /// Added to the suspicious-strings score when the source URL is suspicious
    pub url_suspicion_boost: f32,
    /// LSB plane entropy above this flags the LSB test
    pub lsb_entropy_threshold: f64,
    /// Mean |channel correlation| below this flags the statistical test
    pub channel_correlation_threshold: f64,
    /// Grayscale chi-square below this flags the statistical test
    pub chi_square_threshold: f64,
    /// Sigmoid steepness for raw anomaly score -> confidence
    pub sigmoid_steepness: f32,
    /// Decoder refuses images wider or taller than this
    pub max_image_dimension: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_dir: constants::default_model_dir(),
            default_threshold: constants::DEFAULT_CONFIDENCE_THRESHOLD,
            url_suspicion_boost: constants::DEFAULT_URL_SUSPICION_BOOST,
            lsb_entropy_threshold: constants::DEFAULT_LSB_ENTROPY_THRESHOLD,
            channel_correlation_threshold: constants::DEFAULT_CHANNEL_CORRELATION_THRESHOLD,
            chi_square_threshold: constants::DEFAULT_CHI_SQUARE_THRESHOLD,
            sigmoid_steepness: constants::DEFAULT_SIGMOID_STEEPNESS,
            max_image_dimension: constants::DEFAULT_MAX_IMAGE_DIMENSION,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            model_dir: constants::get_model_dir(),
            default_threshold: constants::get_confidence_threshold(),
            url_suspicion_boost: constants::get_url_suspicion_boost(),
            lsb_entropy_threshold: constants::get_lsb_entropy_threshold(),
            channel_correlation_threshold: constants::get_channel_correlation_threshold(),
            chi_square_threshold: constants::get_chi_square_threshold(),
            sigmoid_steepness: constants::get_sigmoid_steepness(),
            max_image_dimension: constants::get_max_image_dimension(),
        }
        .validated()
    }

    /// Config without a model directory lookup (heuristics only)
    pub fn heuristic_only() -> Self {
        Self {
            model_dir: PathBuf::new(),
            ..Default::default()
        }
    }

    /// Clamp every tunable into its legal range.
    /// Non-finite values fall back to the default.
    pub fn validated(self) -> Self {
        let defaults = Self::default();

        Self {
            default_threshold: finite_or(self.default_threshold, defaults.default_threshold)
                .clamp(0.0, 1.0),
            url_suspicion_boost: finite_or(self.url_suspicion_boost, defaults.url_suspicion_boost)
                .clamp(0.0, 1.0),
            lsb_entropy_threshold: finite_or_f64(
                self.lsb_entropy_threshold,
                defaults.lsb_entropy_threshold,
            )
            .clamp(0.0, 1.0),
            channel_correlation_threshold: finite_or_f64(
                self.channel_correlation_threshold,
                defaults.channel_correlation_threshold,
            )
            .clamp(0.0, 1.0),
            chi_square_threshold: finite_or_f64(self.chi_square_threshold, defaults.chi_square_threshold)
                .max(0.0),
            sigmoid_steepness: finite_or(self.sigmoid_steepness, defaults.sigmoid_steepness)
                .max(f32::EPSILON),
            max_image_dimension: self.max_image_dimension.max(1),
            model_dir: self.model_dir,
        }
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

fn finite_or_f64(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}

// ============================================================================
// TESTS
// ============================================================================
