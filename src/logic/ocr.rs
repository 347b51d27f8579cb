//! OCR Text Extractor
//!
//! Luma -> Otsu binarization -> recognizer. Never fails past this module:
//! any decode or recognition error turns into an empty string.

use thiserror::Error;

use super::pixels::{self, PixelBuffer};

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OcrFailure {
    #[error("OCR engine unavailable: {0}")]
    EngineUnavailable(String),
    #[error("text recognition failed: {0}")]
    Recognition(String),
}

// ============================================================================
// RECOGNIZER TRAIT
// ============================================================================

/// Text recognition engine (Tesseract, a remote service, a test double...)
pub trait TextRecognizer: Send + Sync {
    fn name(&self) -> &str;
    /// Recognize text in a binarized single-channel image
    fn recognize(&self, image: &PixelBuffer) -> Result<String, OcrFailure>;
}

/// No OCR engine installed: every image reads as blank
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRecognizer;

impl TextRecognizer for NullRecognizer {
    fn name(&self) -> &str {
        "none"
    }

    fn recognize(&self, _image: &PixelBuffer) -> Result<String, OcrFailure> {
        Ok(String::new())
    }
}

#[cfg(feature = "tesseract")]
pub use tesseract::TesseractRecognizer;

#[cfg(feature = "tesseract")]
mod tesseract {
    use super::{OcrFailure, PixelBuffer, TextRecognizer};

    /// Tesseract via `tesseract-rs`, English model
    #[derive(Debug, Clone)]
    pub struct TesseractRecognizer {
        language: String,
    }

    impl TesseractRecognizer {
        pub fn new(language: impl Into<String>) -> Self {
            Self { language: language.into() }
        }
    }

    impl Default for TesseractRecognizer {
        fn default() -> Self {
            Self::new("eng")
        }
    }

    impl TextRecognizer for TesseractRecognizer {
        fn name(&self) -> &str {
            "tesseract"
        }

        fn recognize(&self, image: &PixelBuffer) -> Result<String, OcrFailure> {
            let api = tesseract_rs::TesseractAPI::new();
            api.init("", &self.language)
                .map_err(|e| OcrFailure::EngineUnavailable(e.to_string()))?;

            let channels = image.channels as i32;
            api.set_image(
                &image.data,
                image.width as i32,
                image.height as i32,
                channels,
                image.width as i32 * channels,
            )
            .map_err(|e| OcrFailure::Recognition(e.to_string()))?;

            api.get_utf8_text()
                .map_err(|e| OcrFailure::Recognition(e.to_string()))
        }
    }
}

// ============================================================================
// OTSU THRESHOLDING
// ============================================================================

/// Otsu's method: the threshold maximizing between-class variance
pub fn otsu_threshold(gray: &[u8]) -> u8 {
    if gray.is_empty() {
        return 0;
    }

    let mut histogram = [0u64; 256];
    for &v in gray {
        histogram[v as usize] += 1;
    }

    let total = gray.len() as f64;
    let weighted_sum: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum();

    let mut background_weight = 0.0;
    let mut background_sum = 0.0;
    let mut best_variance = -1.0;
    let mut best_threshold = 0u8;

    for (t, &count) in histogram.iter().enumerate() {
        background_weight += count as f64;
        if background_weight == 0.0 {
            continue;
        }
        let foreground_weight = total - background_weight;
        if foreground_weight == 0.0 {
            break;
        }

        background_sum += t as f64 * count as f64;
        let mean_bg = background_sum / background_weight;
        let mean_fg = (weighted_sum - background_sum) / foreground_weight;

        let between = background_weight * foreground_weight * (mean_bg - mean_fg).powi(2);
        if between > best_variance {
            best_variance = between;
            best_threshold = t as u8;
        }
    }

    best_threshold
}

/// Binary threshold: `> t` becomes 255, everything else 0
pub fn binarize(gray: &PixelBuffer, threshold: u8) -> PixelBuffer {
    PixelBuffer {
        width: gray.width,
        height: gray.height,
        channels: 1,
        data: gray
            .data
            .iter()
            .map(|&v| if v > threshold { 255 } else { 0 })
            .collect(),
    }
}

// ============================================================================
// EXTRACTOR
// ============================================================================

/// Runs preprocessing and the configured recognizer
pub struct OcrExtractor<'a> {
    recognizer: &'a dyn TextRecognizer,
    max_dimension: u32,
}

impl<'a> OcrExtractor<'a> {
    pub fn new(recognizer: &'a dyn TextRecognizer, max_dimension: u32) -> Self {
        Self { recognizer, max_dimension }
    }

    /// Decode + recognize; "" on any failure
    pub fn extract_text(&self, bytes: &[u8]) -> String {
        match pixels::decode_image(bytes, None, self.max_dimension) {
            Ok(decoded) => self.extract_from_pixels(&decoded.pixels),
            Err(e) => {
                log::warn!("OCR extraction error: {}", e);
                String::new()
            }
        }
    }

    /// Recognize text on already decoded pixels; "" on any failure
    pub fn extract_from_pixels(&self, image: &PixelBuffer) -> String {
        let gray = image.to_luma();
        let threshold = otsu_threshold(&gray.data);
        let binary = binarize(&gray, threshold);

        match self.recognizer.recognize(&binary) {
            Ok(text) => {
                let text = text.trim().to_string();
                log::debug!(
                    "OCR ({}) extracted {} characters (otsu={})",
                    self.recognizer.name(),
                    text.len(),
                    threshold
                );
                text
            }
            Err(e) => {
                log::warn!("OCR ({}) failed: {}", self.recognizer.name(), e);
                String::new()
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use parking_lot::Mutex;

    /// Returns canned text and remembers what it was shown
    pub struct FixedText {
        pub text: String,
        pub seen: Mutex<Vec<PixelBuffer>>,
    }

    impl FixedText {
        pub fn new(text: &str) -> Self {
            Self {
                text: text.to_string(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl TextRecognizer for FixedText {
        fn name(&self) -> &str {
            "fixed"
        }

        fn recognize(&self, image: &PixelBuffer) -> Result<String, OcrFailure> {
            self.seen.lock().push(image.clone());
            Ok(self.text.clone())
        }
    }

    pub struct Broken;

    impl TextRecognizer for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn recognize(&self, _image: &PixelBuffer) -> Result<String, OcrFailure> {
            Err(OcrFailure::Recognition("boom".to_string()))
        }
    }
}
