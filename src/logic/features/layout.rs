//! Feature Layout - Centralized Feature Definition
//!
//! **CRITICAL: This file controls both feature schemas**
//!
//! ## Rules (NEVER break these):
//! 1. Add feature → increment the schema VERSION
//! 2. Change order → increment the schema VERSION
//! 3. Remove feature → increment the schema VERSION
//!
//! The image layout is what the persisted scaler/model were fitted on.
//! A layout hash mismatch means that state must be refitted.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

// ============================================================================
// FEATURE KEY TRAIT
// ============================================================================

/// A named slot in a fixed-order feature schema
pub trait FeatureKey: Copy + Eq + std::fmt::Debug + Send + Sync + 'static {
    /// Schema name ("image", "popup")
    const SCHEMA: &'static str;
    /// Layout version, bumped on any layout change
    const VERSION: u8;
    /// Every key, in vector order
    const LAYOUT: &'static [Self];

    fn name(self) -> &'static str;
    /// Inclusive range every stored value is clipped into
    fn clip_range(self) -> (f32, f32);
    /// Value used when the input is missing or malformed
    fn neutral(self) -> f32;

    fn index(self) -> usize {
        Self::LAYOUT
            .iter()
            .position(|&k| k == self)
            .unwrap_or(usize::MAX)
    }
}

// ============================================================================
// IMAGE LAYOUT (Authoritative source)
// ============================================================================

pub const IMAGE_FEATURE_VERSION: u8 = 1;
pub const IMAGE_FEATURE_COUNT: usize = 16;

/// Image features in the exact order they appear in the vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFeature {
    FileSize,               // 0: Encoded payload size (bytes)
    Width,                  // 1
    Height,                 // 2
    ColorEntropy,           // 3: Histogram entropy / 8
    MeanPixelValue,         // 4
    NumTextRegions,         // 5: Non-empty OCR lines
    HasLinks,               // 6
    MetadataDepth,          // 7
    SuspiciousStringsScore, // 8
    SuspiciousJsCount,      // 9: Filled by the script scanner
    AspectRatio,            // 10
    Brightness,             // 11
    Contrast,               // 12: Luma std deviation
    EdgeDensity,            // 13
    ColorVariance,          // 14
    TextAreaRatio,          // 15
}

impl FeatureKey for ImageFeature {
    const SCHEMA: &'static str = "image";
    const VERSION: u8 = IMAGE_FEATURE_VERSION;
    const LAYOUT: &'static [Self] = &[
        ImageFeature::FileSize,
        ImageFeature::Width,
        ImageFeature::Height,
        ImageFeature::ColorEntropy,
        ImageFeature::MeanPixelValue,
        ImageFeature::NumTextRegions,
        ImageFeature::HasLinks,
        ImageFeature::MetadataDepth,
        ImageFeature::SuspiciousStringsScore,
        ImageFeature::SuspiciousJsCount,
        ImageFeature::AspectRatio,
        ImageFeature::Brightness,
        ImageFeature::Contrast,
        ImageFeature::EdgeDensity,
        ImageFeature::ColorVariance,
        ImageFeature::TextAreaRatio,
    ];

    fn name(self) -> &'static str {
        match self {
            ImageFeature::FileSize => "file_size",
            ImageFeature::Width => "width",
            ImageFeature::Height => "height",
            ImageFeature::ColorEntropy => "color_entropy",
            ImageFeature::MeanPixelValue => "mean_pixel_value",
            ImageFeature::NumTextRegions => "num_text_regions",
            ImageFeature::HasLinks => "has_links",
            ImageFeature::MetadataDepth => "metadata_depth",
            ImageFeature::SuspiciousStringsScore => "suspicious_strings_score",
            ImageFeature::SuspiciousJsCount => "suspicious_js_count",
            ImageFeature::AspectRatio => "aspect_ratio",
            ImageFeature::Brightness => "brightness",
            ImageFeature::Contrast => "contrast",
            ImageFeature::EdgeDensity => "edge_density",
            ImageFeature::ColorVariance => "color_variance",
            ImageFeature::TextAreaRatio => "text_area_ratio",
        }
    }

    fn clip_range(self) -> (f32, f32) {
        match self {
            ImageFeature::FileSize => (0.0, 100_000_000.0),
            ImageFeature::Width | ImageFeature::Height => (0.0, 65_535.0),
            ImageFeature::ColorEntropy => (0.0, 1.0),
            ImageFeature::MeanPixelValue | ImageFeature::Brightness => (0.0, 255.0),
            ImageFeature::NumTextRegions => (0.0, 10_000.0),
            ImageFeature::HasLinks => (0.0, 1.0),
            ImageFeature::MetadataDepth => (0.0, 64.0),
            ImageFeature::SuspiciousStringsScore => (0.0, 1.0),
            ImageFeature::SuspiciousJsCount => (0.0, 1_000.0),
            ImageFeature::AspectRatio => (0.1, 10.0),
            // std of 8-bit samples never exceeds 127.5
            ImageFeature::Contrast => (0.0, 128.0),
            ImageFeature::EdgeDensity => (0.0, 1.0),
            ImageFeature::ColorVariance => (0.0, 16_384.0),
            ImageFeature::TextAreaRatio => (0.0, 1.0),
        }
    }

    fn neutral(self) -> f32 {
        match self {
            ImageFeature::AspectRatio => 1.0,
            ImageFeature::Brightness => 128.0,
            _ => 0.0,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

// ============================================================================
// POPUP LAYOUT (Authoritative source)
// ============================================================================

pub const POPUP_FEATURE_VERSION: u8 = 1;
pub const POPUP_FEATURE_COUNT: usize = 14;

/// Popup features in the exact order they appear in the vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PopupFeature {
    TextLength,             // 0
    HasUrgency,             // 1
    HasPaymentKeywords,     // 2
    HasVerificationRequest, // 3
    PhishingKeywordCount,   // 4: Raw match count, not normalized
    NumFields,              // 5
    HasPasswordField,       // 6
    HasPaymentField,        // 7
    SensitiveFieldCount,    // 8
    DomainSuspicious,       // 9
    HasSubdomain,           // 10
    CapitalizationRatio,    // 11
    ExclamationCount,       // 12
    QuestionCount,          // 13
}

impl FeatureKey for PopupFeature {
    const SCHEMA: &'static str = "popup";
    const VERSION: u8 = POPUP_FEATURE_VERSION;
    const LAYOUT: &'static [Self] = &[
        PopupFeature::TextLength,
        PopupFeature::HasUrgency,
        PopupFeature::HasPaymentKeywords,
        PopupFeature::HasVerificationRequest,
        PopupFeature::PhishingKeywordCount,
        PopupFeature::NumFields,
        PopupFeature::HasPasswordField,
        PopupFeature::HasPaymentField,
        PopupFeature::SensitiveFieldCount,
        PopupFeature::DomainSuspicious,
        PopupFeature::HasSubdomain,
        PopupFeature::CapitalizationRatio,
        PopupFeature::ExclamationCount,
        PopupFeature::QuestionCount,
    ];

    fn name(self) -> &'static str {
        match self {
            PopupFeature::TextLength => "text_length",
            PopupFeature::HasUrgency => "has_urgency",
            PopupFeature::HasPaymentKeywords => "has_payment_keywords",
            PopupFeature::HasVerificationRequest => "has_verification_request",
            PopupFeature::PhishingKeywordCount => "phishing_keyword_count",
            PopupFeature::NumFields => "num_fields",
            PopupFeature::HasPasswordField => "has_password_field",
            PopupFeature::HasPaymentField => "has_payment_field",
            PopupFeature::SensitiveFieldCount => "sensitive_field_count",
            PopupFeature::DomainSuspicious => "domain_suspicious",
            PopupFeature::HasSubdomain => "has_subdomain",
            PopupFeature::CapitalizationRatio => "capitalization_ratio",
            PopupFeature::ExclamationCount => "exclamation_count",
            PopupFeature::QuestionCount => "question_count",
        }
    }

    fn clip_range(self) -> (f32, f32) {
        match self {
            PopupFeature::TextLength => (0.0, 10_000_000.0),
            PopupFeature::HasUrgency
            | PopupFeature::HasPaymentKeywords
            | PopupFeature::HasVerificationRequest
            | PopupFeature::HasPasswordField
            | PopupFeature::HasPaymentField
            | PopupFeature::DomainSuspicious
            | PopupFeature::HasSubdomain
            | PopupFeature::CapitalizationRatio => (0.0, 1.0),
            PopupFeature::PhishingKeywordCount => {
                (0.0, super::keywords::PHISHING_KEYWORDS.len() as f32)
            }
            PopupFeature::NumFields | PopupFeature::SensitiveFieldCount => (0.0, 10_000.0),
            PopupFeature::ExclamationCount | PopupFeature::QuestionCount => (0.0, 10_000_000.0),
        }
    }

    fn neutral(self) -> f32 {
        0.0
    }

    fn index(self) -> usize {
        self as usize
    }
}

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// CRC32 over version + ordered feature names
pub fn layout_hash<K: FeatureKey>() -> u32 {
    let mut hasher = Hasher::new();

    hasher.update(&[K::VERSION]);

    for key in K::LAYOUT {
        hasher.update(key.name().as_bytes());
        hasher.update(&[0]); // Separator
    }

    hasher.finalize()
}

/// Ordered feature names of a schema
pub fn feature_names<K: FeatureKey>() -> Vec<&'static str> {
    K::LAYOUT.iter().map(|k| k.name()).collect()
}

/// Look a key up by its wire name
pub fn feature_by_name<K: FeatureKey>(name: &str) -> Option<K> {
    K::LAYOUT.iter().copied().find(|k| k.name() == name)
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Complete layout information for serialization/logging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub schema: String,
    pub version: u8,
    pub hash: u32,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
}

impl LayoutInfo {
    pub fn current<K: FeatureKey>() -> Self {
        Self {
            schema: K::SCHEMA.to_string(),
            version: K::VERSION,
            hash: layout_hash::<K>(),
            feature_count: K::LAYOUT.len(),
            feature_names: K::LAYOUT.iter().map(|k| k.name().to_string()).collect(),
        }
    }
}

// ============================================================================
// LAYOUT VALIDATION
// ============================================================================

/// Error when persisted state was built for a different layout
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error(
    "{schema} feature layout mismatch: expected v{expected_version} (hash: {expected_hash:08x}), \
     got v{actual_version} (hash: {actual_hash:08x})"
)]
pub struct LayoutMismatchError {
    pub schema: &'static str,
    pub expected_version: u8,
    pub expected_hash: u32,
    pub actual_version: u8,
    pub actual_hash: u32,
}

/// Validate that incoming state matches the current layout
pub fn validate_layout<K: FeatureKey>(
    incoming_version: u8,
    incoming_hash: u32,
) -> Result<(), LayoutMismatchError> {
    let current_hash = layout_hash::<K>();

    if incoming_version != K::VERSION || incoming_hash != current_hash {
        return Err(LayoutMismatchError {
            schema: K::SCHEMA,
            expected_version: K::VERSION,
            expected_hash: current_hash,
            actual_version: incoming_version,
            actual_hash: incoming_hash,
        });
    }

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
