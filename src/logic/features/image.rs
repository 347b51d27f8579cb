//! Image Feature Extraction
//!
//! Derives the 16-feature image vector from a thumbnail, its URLs, OCR
//! text and page metadata. Total: a missing or undecodable payload leaves
//! every pixel feature at its neutral value.

use serde_json::Value;
use thiserror::Error;

use super::edges;
use super::keywords::{
    contains_any, count_matches, LINK_INDICATORS, SUSPICIOUS_KEYWORDS,
    SUSPICIOUS_MATCHES_FOR_FULL_SCORE,
};
use super::layout::ImageFeature;
use super::vector::FeatureVector;
use crate::logic::ocr::{OcrExtractor, TextRecognizer};
use crate::logic::pixels::{self, DecodeResult, DecodedImage, PixelBuffer};

pub type ImageFeatureVector = FeatureVector<ImageFeature>;

/// Metadata was present but is not a mapping
#[derive(Debug, Clone, PartialEq, Error)]
#[error("metadata is not a mapping (got {0})")]
pub struct MalformedMetadata(pub &'static str);

// ============================================================================
// EXTRACTOR
// ============================================================================

/// Image feature extractor
pub struct ImageFeatureExtractor<'a> {
    recognizer: &'a dyn TextRecognizer,
    url_suspicion_boost: f32,
    max_dimension: u32,
}

impl<'a> ImageFeatureExtractor<'a> {
    pub fn new(recognizer: &'a dyn TextRecognizer, url_suspicion_boost: f32, max_dimension: u32) -> Self {
        Self {
            recognizer,
            url_suspicion_boost,
            max_dimension,
        }
    }

    /// Decode, OCR and extract in one go
    pub fn extract_features(
        &self,
        thumbnail: Option<&[u8]>,
        src_url: Option<&str>,
        page_url: &str,
        mime: Option<&str>,
        metadata: Option<&Value>,
    ) -> ImageFeatureVector {
        let decoded = match thumbnail {
            Some(bytes) => Some(pixels::decode_image(bytes, mime, self.max_dimension)),
            None => None,
        };

        let text = match &decoded {
            Some(Ok(image)) => OcrExtractor::new(self.recognizer, self.max_dimension)
                .extract_from_pixels(&image.pixels),
            _ => String::new(),
        };

        self.extract_decoded(decoded.as_ref(), &text, src_url, page_url, metadata)
    }

    /// Extract from an already decoded payload and recognized text.
    ///
    /// `decoded` is `None` when no thumbnail was supplied.
    pub fn extract_decoded(
        &self,
        decoded: Option<&DecodeResult>,
        text: &str,
        src_url: Option<&str>,
        page_url: &str,
        metadata: Option<&Value>,
    ) -> ImageFeatureVector {
        let mut features = ImageFeatureVector::neutral();

        match decoded {
            Some(Ok(image)) => {
                apply_pixel_features(&mut features, image);
                apply_text_features(&mut features, text, &image.pixels);
            }
            Some(Err(e)) => {
                log::warn!("Feature extraction on {}: thumbnail unusable ({})", page_url, e);
            }
            None => {}
        }

        if let Some(url) = src_url {
            if contains_any(&url.to_lowercase(), SUSPICIOUS_KEYWORDS) {
                let boosted = features.get(ImageFeature::SuspiciousStringsScore) + self.url_suspicion_boost;
                features.set(ImageFeature::SuspiciousStringsScore, boosted.min(1.0));
            }
        }

        match metadata_feature(metadata) {
            Ok(depth) => features.set(ImageFeature::MetadataDepth, depth as f32),
            Err(e) => log::debug!("Metadata ignored for {}: {}", page_url, e),
        }

        features
    }
}

// ============================================================================
// PIXEL FEATURES
// ============================================================================

fn apply_pixel_features(features: &mut ImageFeatureVector, image: &DecodedImage) {
    let px = &image.pixels;

    features.set(ImageFeature::FileSize, image.encoded_len as f32);
    features.set(ImageFeature::Width, px.width as f32);
    features.set(ImageFeature::Height, px.height as f32);
    let aspect = if px.height > 0 {
        px.width as f32 / px.height as f32
    } else {
        1.0
    };
    features.set(ImageFeature::AspectRatio, aspect);

    let stats = SampleStats::of(&px.data);
    features.set(ImageFeature::MeanPixelValue, stats.mean as f32);
    features.set(ImageFeature::Brightness, stats.mean as f32);

    if px.is_multichannel() {
        features.set(ImageFeature::ColorEntropy, histogram_entropy(&px.data) as f32 / 8.0);
        features.set(ImageFeature::ColorVariance, stats.variance as f32);
    }

    let gray = px.to_luma();
    features.set(ImageFeature::EdgeDensity, edges::edge_density(&gray));
    features.set(ImageFeature::Contrast, SampleStats::of(&gray.data).variance.sqrt() as f32);
}

/// Mean and population variance of 8-bit samples
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleStats {
    pub mean: f64,
    pub variance: f64,
}

impl SampleStats {
    pub fn of(samples: &[u8]) -> Self {
        if samples.is_empty() {
            return Self { mean: 0.0, variance: 0.0 };
        }
        let n = samples.len() as f64;
        let mean = samples.iter().map(|&v| v as f64).sum::<f64>() / n;
        let variance = samples
            .iter()
            .map(|&v| (v as f64 - mean).powi(2))
            .sum::<f64>()
            / n;
        Self { mean, variance }
    }
}

/// Shannon entropy (bits) of the 256-bin sample histogram
pub fn histogram_entropy(samples: &[u8]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let mut histogram = [0u64; 256];
    for &v in samples {
        histogram[v as usize] += 1;
    }
    let total = samples.len() as f64;
    histogram
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total;
            -p * p.log2()
        })
        .sum()
}

// ============================================================================
// TEXT FEATURES
// ============================================================================

fn apply_text_features(features: &mut ImageFeatureVector, text: &str, pixels: &PixelBuffer) {
    let lines = text.lines().filter(|l| !l.trim().is_empty()).count();
    features.set(ImageFeature::NumTextRegions, lines as f32);

    let trimmed_chars = text.trim().chars().count();
    let area = pixels.pixel_count();
    if trimmed_chars > 0 && area > 0 {
        features.set(ImageFeature::TextAreaRatio, trimmed_chars as f32 / area as f32);
    }

    features.set(ImageFeature::SuspiciousStringsScore, suspicious_score(text));

    if contains_any(&text.to_lowercase(), LINK_INDICATORS) {
        features.set(ImageFeature::HasLinks, 1.0);
    }
}

/// Keyword matches / 5, clipped to [0, 1]
pub fn suspicious_score(text: &str) -> f32 {
    if text.is_empty() {
        return 0.0;
    }
    let matches = count_matches(&text.to_lowercase(), SUSPICIOUS_KEYWORDS);
    (matches as f32 / SUSPICIOUS_MATCHES_FOR_FULL_SCORE).min(1.0)
}

// ============================================================================
// METADATA
// ============================================================================

/// Depth of a nested mapping.
///
/// A non-mapping value has the depth passed in; an empty mapping is one
/// deeper than its parent; a non-empty mapping is the deepest of its values
/// measured one level down.
pub fn dict_depth(value: &Value, depth: u32) -> u32 {
    match value {
        Value::Object(map) if map.is_empty() => depth + 1,
        Value::Object(map) => map
            .values()
            .map(|v| dict_depth(v, depth + 1))
            .max()
            .unwrap_or(depth + 1),
        _ => depth,
    }
}

/// Depth feature for optional page metadata.
///
/// Absent, null or empty metadata counts as 0; anything that is not a
/// mapping is `MalformedMetadata`.
pub fn metadata_feature(metadata: Option<&Value>) -> Result<u32, MalformedMetadata> {
    match metadata {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Object(map)) if map.is_empty() => Ok(0),
        Some(value @ Value::Object(_)) => Ok(dict_depth(value, 0)),
        Some(Value::Bool(_)) => Err(MalformedMetadata("bool")),
        Some(Value::Number(_)) => Err(MalformedMetadata("number")),
        Some(Value::String(_)) => Err(MalformedMetadata("string")),
        Some(Value::Array(_)) => Err(MalformedMetadata("array")),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::ocr::test_support::FixedText;
    use crate::logic::ocr::NullRecognizer;
    use crate::logic::pixels::fixtures;
    use serde_json::json;

    #[test]
    fn test_dict_depth() {
        assert_eq!(dict_depth(&json!({}), 0), 1);
        assert_eq!(dict_depth(&json!({"a": {"b": 1}}), 0), 2);
        assert_eq!(dict_depth(&json!({"a": 1}), 0), 1);
        assert_eq!(dict_depth(&json!({"a": {}}), 0), 2);
        assert_eq!(dict_depth(&json!({"a": 1, "b": {"c": {"d": 2}}}), 0), 3);
        assert_eq!(dict_depth(&json!(5), 0), 0);
    }

    #[test]
    fn test_metadata_feature() {
        assert_eq!(metadata_feature(None), Ok(0));
        assert_eq!(metadata_feature(Some(&json!({}))), Ok(0));
        assert_eq!(metadata_feature(Some(&json!({"a": {"b": 1}}))), Ok(2));
        assert_eq!(metadata_feature(Some(&json!([1, 2]))), Err(MalformedMetadata("array")));
    }

    #[test]
    fn test_total_on_empty_input() {
        let extractor = ImageFeatureExtractor::new(&NullRecognizer, 0.3, 4096);
        let features = extractor.extract_features(None, None, "x", None, None);

        assert_eq!(features.get(ImageFeature::FileSize), 0.0);
        assert_eq!(features.get(ImageFeature::Width), 0.0);
        assert_eq!(features.get(ImageFeature::Height), 0.0);
        assert_eq!(features.get(ImageFeature::AspectRatio), 1.0);
        assert_eq!(features.get(ImageFeature::Brightness), 128.0);
        assert_eq!(features.get(ImageFeature::SuspiciousStringsScore), 0.0);
        assert!(features.is_within_bounds());
    }

    #[test]
    fn test_undecodable_payload_is_neutral() {
        let extractor = ImageFeatureExtractor::new(&NullRecognizer, 0.3, 4096);
        let features = extractor.extract_features(Some(b"garbage"), None, "x", None, None);
        assert_eq!(features, ImageFeatureVector::neutral());
    }

    #[test]
    fn test_pixel_features_rgb() {
        let bytes = fixtures::solid_rgb(40, 20, [10, 20, 30]);
        let extractor = ImageFeatureExtractor::new(&NullRecognizer, 0.3, 4096);
        let features = extractor.extract_features(Some(&bytes), None, "x", None, None);

        assert_eq!(features.get(ImageFeature::FileSize), bytes.len() as f32);
        assert_eq!(features.get(ImageFeature::Width), 40.0);
        assert_eq!(features.get(ImageFeature::Height), 20.0);
        assert_eq!(features.get(ImageFeature::AspectRatio), 2.0);
        assert!((features.get(ImageFeature::Brightness) - 20.0).abs() < 1e-4);
        assert_eq!(features.get(ImageFeature::MeanPixelValue), features.get(ImageFeature::Brightness));
        // three equally frequent values: log2(3) / 8
        let expected_entropy = (3f32).log2() / 8.0;
        assert!((features.get(ImageFeature::ColorEntropy) - expected_entropy).abs() < 1e-4);
        assert!(features.get(ImageFeature::ColorVariance) > 0.0);
        assert_eq!(features.get(ImageFeature::EdgeDensity), 0.0);
        assert_eq!(features.get(ImageFeature::Contrast), 0.0);
    }

    #[test]
    fn test_grayscale_skips_color_features() {
        let bytes = fixtures::solid_gray(10, 10, 200);
        let extractor = ImageFeatureExtractor::new(&NullRecognizer, 0.3, 4096);
        let features = extractor.extract_features(Some(&bytes), None, "x", None, None);

        assert_eq!(features.get(ImageFeature::ColorEntropy), 0.0);
        assert_eq!(features.get(ImageFeature::ColorVariance), 0.0);
        assert_eq!(features.get(ImageFeature::Brightness), 200.0);
    }

    #[test]
    fn test_edges_and_contrast_on_checkerboard() {
        let bytes = fixtures::checker_rgba(32, 32);
        let extractor = ImageFeatureExtractor::new(&NullRecognizer, 0.3, 4096);
        let features = extractor.extract_features(Some(&bytes), None, "x", None, None);

        assert!(features.get(ImageFeature::EdgeDensity) > 0.0);
        assert!(features.get(ImageFeature::Contrast) > 100.0);
        assert!(features.is_within_bounds());
    }

    #[test]
    fn test_text_features_from_ocr() {
        let recognizer = FixedText::new("URGENT: verify your bank account\n\nwww.pay-now.com\ncvv and otp");
        let bytes = fixtures::gradient_rgb(100, 50);
        let extractor = ImageFeatureExtractor::new(&recognizer, 0.3, 4096);
        let features = extractor.extract_features(Some(&bytes), None, "x", None, None);

        assert_eq!(features.get(ImageFeature::NumTextRegions), 3.0);
        assert_eq!(features.get(ImageFeature::HasLinks), 1.0);
        assert_eq!(features.get(ImageFeature::SuspiciousStringsScore), 1.0);
        assert!(features.get(ImageFeature::TextAreaRatio) > 0.0);
    }

    #[test]
    fn test_url_boost_is_additive_and_clipped() {
        let extractor = ImageFeatureExtractor::new(&NullRecognizer, 0.3, 4096);

        let features = extractor.extract_features(None, Some("https://cdn.example/verify-login.png"), "x", None, None);
        assert!((features.get(ImageFeature::SuspiciousStringsScore) - 0.3).abs() < 1e-6);

        let recognizer = FixedText::new("password otp cvv ssn bank");
        let bytes = fixtures::gradient_rgb(16, 16);
        let extractor = ImageFeatureExtractor::new(&recognizer, 0.3, 4096);
        let features = extractor.extract_features(Some(&bytes), Some("https://x/verify"), "x", None, None);
        assert_eq!(features.get(ImageFeature::SuspiciousStringsScore), 1.0);
    }

    #[test]
    fn test_suspicious_score() {
        assert_eq!(suspicious_score(""), 0.0);
        assert!((suspicious_score("enter your OTP") - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_histogram_entropy() {
        assert_eq!(histogram_entropy(&[7; 64]), 0.0);
        let all: Vec<u8> = (0..=255).collect();
        assert!((histogram_entropy(&all) - 8.0).abs() < 1e-9);
    }
}
