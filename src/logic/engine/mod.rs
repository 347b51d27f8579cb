//! Detection Engine
//!
//! Artifact -> features (+ steganography for images) -> score -> verdict,
//! with reason codes from the same evidence.
//!
//! An `Engine` is immutable once built and shared through `Arc`.
//! `EngineHandle` swaps in a rebuilt engine atomically; calls already
//! running keep the instance they started with.

use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use crate::api::request::InferRequest;
use crate::logic::artifact::{Artifact, ImageArtifact, PopupArtifact};
use crate::logic::config::EngineConfig;
use crate::logic::features::{
    ImageFeature, ImageFeatureExtractor, PopupFeatureExtractor, PopupFeatureVector,
};
use crate::logic::model::{self, ModelMetadata, ModelState};
use crate::logic::ocr::{NullRecognizer, OcrExtractor, TextRecognizer};
use crate::logic::pixels;
use crate::logic::reasons;
use crate::logic::scoring::{HeuristicScorer, ImageEvidence, ModelScorer, Score, Scorer};
use crate::logic::stego::{SteganographyAnalyzer, StegoResult};
use crate::logic::verdict::{resolve, ClassificationResult, DecisionContext, Verdict};

// ============================================================================
// ERRORS
// ============================================================================

/// Request rejected before classification
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("unknown artifact type: {0:?}")]
    UnknownArtifactType(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl EngineError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::UnknownArtifactType(_) => "unknown_artifact_type",
            EngineError::InvalidRequest(_) => "invalid_request",
        }
    }
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct Engine {
    config: EngineConfig,
    recognizer: Arc<dyn TextRecognizer>,
    image_scorer: Box<dyn Scorer<ImageEvidence>>,
    popup_scorer: HeuristicScorer<PopupFeatureVector>,
    stego: SteganographyAnalyzer,
    model_metadata: Option<ModelMetadata>,
}

impl Engine {
    /// Build with explicit collaborators. The image scorer is fixed here:
    /// model-backed when `model` is present, heuristic otherwise.
    pub fn new(
        config: EngineConfig,
        model: Option<ModelState>,
        recognizer: Arc<dyn TextRecognizer>,
    ) -> Self {
        let config = config.validated();

        let (image_scorer, model_metadata): (Box<dyn Scorer<ImageEvidence>>, _) = match model {
            Some(state) => {
                let metadata = state.metadata.clone();
                (
                    Box::new(ModelScorer::new(state, config.sigmoid_steepness)),
                    Some(metadata),
                )
            }
            None => (Box::new(HeuristicScorer::image()), None),
        };

        log::info!(
            "Engine ready: image scoring = {}, OCR = {}",
            if model_metadata.is_some() { "model" } else { "heuristic" },
            recognizer.name()
        );

        Self {
            stego: SteganographyAnalyzer::from_config(&config),
            config,
            recognizer,
            image_scorer,
            popup_scorer: HeuristicScorer::popup(),
            model_metadata,
        }
    }

    /// Load the model directory named by `config` and use the default
    /// recognizer. A broken model directory degrades to heuristics.
    pub fn from_config(config: EngineConfig) -> Self {
        let model = if config.model_dir.as_os_str().is_empty() {
            None
        } else {
            match model::load_model(&config.model_dir) {
                Ok(state) => state,
                Err(e) => {
                    log::warn!(
                        "Failed to load model from {} ({}), using heuristics",
                        config.model_dir.display(),
                        e
                    );
                    None
                }
            }
        };

        Self::new(config, model, default_recognizer())
    }

    /// No model, no OCR engine
    pub fn heuristic() -> Self {
        Self::new(EngineConfig::heuristic_only(), None, Arc::new(NullRecognizer))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn model_metadata(&self) -> Option<&ModelMetadata> {
        self.model_metadata.as_ref()
    }

    pub fn has_model(&self) -> bool {
        self.model_metadata.is_some()
    }

    /// Policy used when a request carries none
    pub fn default_context(&self) -> DecisionContext {
        DecisionContext::new(self.config.default_threshold, false)
    }

    // ========================================================================
    // CLASSIFICATION
    // ========================================================================

    pub fn classify(&self, artifact: &Artifact, context: &DecisionContext) -> ClassificationResult {
        let result = match artifact {
            Artifact::Image(image) => self.classify_image(image, context),
            Artifact::Popup(popup) => self.classify_popup(popup, context),
        };

        if result.verdict == Verdict::Malicious {
            log::info!(
                "Malicious {} on {}: confidence {:.2}, action {}, reasons {:?}",
                artifact.kind(),
                artifact.page_url(),
                result.confidence,
                result.action.as_str(),
                result.reason_codes
            );
        } else {
            log::debug!(
                "{} on {}: {} ({:.2})",
                artifact.kind(),
                artifact.page_url(),
                result.verdict.as_str(),
                result.confidence
            );
        }
        result
    }

    /// Parse, validate and classify a serving-layer request
    pub fn classify_request(&self, request: InferRequest) -> Result<ClassificationResult, EngineError> {
        let context = request.decision_context(self.config.default_threshold);
        let artifact = request.into_artifact()?;
        Ok(self.classify(&artifact, &context))
    }

    fn classify_image(&self, image: &ImageArtifact, context: &DecisionContext) -> ClassificationResult {
        let max_dimension = self.config.max_image_dimension;

        // Decoded once; OCR and steganography share the buffer
        let decoded = image
            .thumbnail
            .as_deref()
            .map(|bytes| pixels::decode_image(bytes, image.mime.as_deref(), max_dimension));

        let (text, stego) = rayon::join(
            || match &decoded {
                Some(Ok(img)) => {
                    OcrExtractor::new(self.recognizer.as_ref(), max_dimension).extract_from_pixels(&img.pixels)
                }
                _ => String::new(),
            },
            || match &decoded {
                Some(result) => self.stego.analyze_decoded(result),
                None => StegoResult::clean(),
            },
        );

        let extractor = ImageFeatureExtractor::new(
            self.recognizer.as_ref(),
            self.config.url_suspicion_boost,
            max_dimension,
        );
        let mut features = extractor.extract_decoded(
            decoded.as_ref(),
            &text,
            image.src_url.as_deref(),
            &image.page_url,
            image.metadata.as_ref(),
        );
        if let Some(count) = image.suspicious_js_count {
            features.set(ImageFeature::SuspiciousJsCount, count as f32);
        }

        let evidence = ImageEvidence::new(features, stego);
        let score = self.image_scorer.score(&evidence);
        let reason_codes = reasons::image_reasons(&evidence, score.is_malicious);

        build_result(score, context, text, reason_codes, evidence.stego.detected)
    }

    fn classify_popup(&self, popup: &PopupArtifact, context: &DecisionContext) -> ClassificationResult {
        let features = PopupFeatureExtractor::new().extract_features(
            &popup.page_url,
            &popup.raw_text,
            &popup.field_labels,
        );
        let score = self.popup_scorer.score(&features);
        let reason_codes = reasons::popup_reasons(&features, score.is_malicious);

        build_result(score, context, popup.raw_text.clone(), reason_codes, false)
    }
}

fn build_result(
    score: Score,
    context: &DecisionContext,
    extracted_text: String,
    reason_codes: Vec<String>,
    steganography_detected: bool,
) -> ClassificationResult {
    let resolution = resolve(score.is_malicious, score.confidence, context);

    ClassificationResult {
        verdict: resolution.verdict,
        severity: resolution.severity,
        confidence: score.confidence,
        extracted_text,
        reason_codes,
        action: resolution.action,
        steganography_detected,
    }
}

/// Tesseract when compiled in, otherwise no OCR
pub fn default_recognizer() -> Arc<dyn TextRecognizer> {
    #[cfg(feature = "tesseract")]
    {
        Arc::new(crate::logic::ocr::TesseractRecognizer::default())
    }
    #[cfg(not(feature = "tesseract"))]
    {
        Arc::new(NullRecognizer)
    }
}

// ============================================================================
// HANDLE (swap-and-publish)
// ============================================================================

/// Shared slot holding the engine currently in service
pub struct EngineHandle {
    current: RwLock<Arc<Engine>>,
}

impl EngineHandle {
    pub fn new(engine: Engine) -> Self {
        Self {
            current: RwLock::new(Arc::new(engine)),
        }
    }

    /// Engine to use for one call
    pub fn current(&self) -> Arc<Engine> {
        self.current.read().clone()
    }

    /// Replace the engine; returns the previous one
    pub fn publish(&self, engine: Engine) -> Arc<Engine> {
        let next = Arc::new(engine);
        let previous = std::mem::replace(&mut *self.current.write(), next);
        log::info!(
            "Published new engine (model: {})",
            if self.current().has_model() { "yes" } else { "no" }
        );
        previous
    }

    pub fn classify(&self, artifact: &Artifact, context: &DecisionContext) -> ClassificationResult {
        self.current().classify(artifact, context)
    }
}

#[cfg(test)]
mod tests;
