//! Steganography Analyzer
//!
//! Two independent tests over the same decoded pixels:
//! - `lsb` - entropy of the least-significant bit plane
//! - `statistical` - channel decorrelation (colour) or histogram
//!   uniformity (grayscale)
//!
//! Fused as `detected = lsb || statistical`, `confidence = max`,
//! method prefers LSB.

pub mod lsb;
pub mod statistical;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::logic::config::EngineConfig;
use crate::logic::pixels::{self, DecodeResult, PixelBuffer};

pub use lsb::{lsb_test, LsbReport};
pub use statistical::{statistical_test, StatisticalReport};

// ============================================================================
// RESULT TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StegoMethod {
    #[default]
    None,
    Lsb,
    Statistical,
}

impl StegoMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            StegoMethod::None => "none",
            StegoMethod::Lsb => "lsb",
            StegoMethod::Statistical => "statistical",
        }
    }
}

/// Fused steganography finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StegoResult {
    pub detected: bool,
    pub confidence: f64,
    pub method: StegoMethod,
    /// Diagnostic scalars (`lsb_entropy`, `statistical_anomaly`)
    pub details: BTreeMap<String, f64>,
}

impl StegoResult {
    /// Not detected, zero confidence, no details
    pub fn clean() -> Self {
        Self::default()
    }

    /// Combine the two sub-test reports
    pub fn fuse(lsb: &LsbReport, statistical: &StatisticalReport) -> Self {
        let method = if lsb.suspicious {
            StegoMethod::Lsb
        } else if statistical.suspicious {
            StegoMethod::Statistical
        } else {
            StegoMethod::None
        };

        let mut details = BTreeMap::new();
        details.insert("lsb_entropy".to_string(), lsb.entropy);
        details.insert("statistical_anomaly".to_string(), statistical.anomaly_score);

        Self {
            detected: lsb.suspicious || statistical.suspicious,
            confidence: lsb.confidence.max(statistical.confidence).clamp(0.0, 1.0),
            method,
            details,
        }
    }
}

// ============================================================================
// ANALYZER
// ============================================================================

/// Steganography analyzer with its thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteganographyAnalyzer {
    pub lsb_entropy_threshold: f64,
    pub channel_correlation_threshold: f64,
    pub chi_square_threshold: f64,
    pub max_dimension: u32,
}

impl SteganographyAnalyzer {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            lsb_entropy_threshold: config.lsb_entropy_threshold,
            channel_correlation_threshold: config.channel_correlation_threshold,
            chi_square_threshold: config.chi_square_threshold,
            max_dimension: config.max_image_dimension,
        }
    }

    /// Decode and analyze; clean result on missing input or decode failure
    pub fn analyze(&self, thumbnail: Option<&[u8]>) -> StegoResult {
        match thumbnail {
            Some(bytes) => self.analyze_decoded(&pixels::decode_image(bytes, None, self.max_dimension)),
            None => StegoResult::clean(),
        }
    }

    pub fn analyze_decoded(&self, decoded: &DecodeResult) -> StegoResult {
        match decoded {
            Ok(image) => self.analyze_pixels(&image.pixels),
            Err(e) => {
                log::debug!("Steganography analysis skipped: {}", e);
                StegoResult::clean()
            }
        }
    }

    pub fn analyze_pixels(&self, pixels: &PixelBuffer) -> StegoResult {
        let lsb = lsb_test(pixels, self.lsb_entropy_threshold);
        let statistical = statistical_test(
            pixels,
            self.channel_correlation_threshold,
            self.chi_square_threshold,
        );
        let result = StegoResult::fuse(&lsb, &statistical);

        if result.detected {
            log::debug!(
                "Steganography suspected via {} (confidence {:.3}, lsb_entropy {:.3}, anomaly {:.3})",
                result.method.as_str(),
                result.confidence,
                lsb.entropy,
                statistical.anomaly_score
            );
        }
        result
    }
}

impl Default for SteganographyAnalyzer {
    fn default() -> Self {
        Self::from_config(&EngineConfig::heuristic_only())
    }
}

// ============================================================================
// TESTS
// ============================================================================
