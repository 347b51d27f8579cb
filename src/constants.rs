//! Central Configuration Constants
//!
//! Single source of truth for engine defaults.
//! Every tunable can be overridden from the environment.

use std::path::PathBuf;

/// Default policy threshold when the caller sends none
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.7;

/// Additive boost applied to the suspicious-strings score when the
/// source URL itself contains a suspicious keyword
pub const DEFAULT_URL_SUSPICION_BOOST: f32 = 0.3;

/// LSB plane entropy above this = suspicious
pub const DEFAULT_LSB_ENTROPY_THRESHOLD: f64 = 0.5;

/// Mean absolute channel correlation below this = suspicious
pub const DEFAULT_CHANNEL_CORRELATION_THRESHOLD: f64 = 0.7;

/// Grayscale histogram chi-square below this = suspicious (too uniform)
pub const DEFAULT_CHI_SQUARE_THRESHOLD: f64 = 50.0;

/// Steepness of the sigmoid mapping raw anomaly scores to confidence
pub const DEFAULT_SIGMOID_STEEPNESS: f32 = 2.0;

/// Largest width/height the decoder accepts
pub const DEFAULT_MAX_IMAGE_DIMENSION: u32 = 16_384;

/// Model file names inside the model directory
pub const MODEL_FILE_NAME: &str = "image_model.onnx";
pub const SCALER_FILE_NAME: &str = "scaler.json";
pub const MODEL_META_FILE_NAME: &str = "model_meta.json";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "CyberShield";

// ============================================
// Helper functions to read from env with fallback
// ============================================

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

/// Default model directory: `<data dir>/cybershield/models`, or `./models`
pub fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("cybershield").join("models"))
        .unwrap_or_else(|| PathBuf::from("models"))
}

/// Get model directory from environment or use default
pub fn get_model_dir() -> PathBuf {
    std::env::var("CYBERSHIELD_MODEL_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_model_dir())
}

/// Get default policy threshold from environment or use default
pub fn get_confidence_threshold() -> f32 {
    env_parse("CONFIDENCE_THRESHOLD").unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD)
}

/// Get URL suspicion boost from environment or use default
pub fn get_url_suspicion_boost() -> f32 {
    env_parse("CYBERSHIELD_URL_BOOST").unwrap_or(DEFAULT_URL_SUSPICION_BOOST)
}

/// Get LSB entropy threshold from environment or use default
pub fn get_lsb_entropy_threshold() -> f64 {
    env_parse("CYBERSHIELD_LSB_THRESHOLD").unwrap_or(DEFAULT_LSB_ENTROPY_THRESHOLD)
}

/// Get channel correlation threshold from environment or use default
pub fn get_channel_correlation_threshold() -> f64 {
    env_parse("CYBERSHIELD_CORRELATION_THRESHOLD").unwrap_or(DEFAULT_CHANNEL_CORRELATION_THRESHOLD)
}

/// Get chi-square threshold from environment or use default
pub fn get_chi_square_threshold() -> f64 {
    env_parse("CYBERSHIELD_CHI_SQUARE_THRESHOLD").unwrap_or(DEFAULT_CHI_SQUARE_THRESHOLD)
}

/// Get sigmoid steepness from environment or use default
pub fn get_sigmoid_steepness() -> f32 {
    env_parse("CYBERSHIELD_SIGMOID_STEEPNESS").unwrap_or(DEFAULT_SIGMOID_STEEPNESS)
}

/// Get decoder dimension limit from environment or use default
pub fn get_max_image_dimension() -> u32 {
    env_parse("CYBERSHIELD_MAX_IMAGE_DIMENSION").unwrap_or(DEFAULT_MAX_IMAGE_DIMENSION)
}
