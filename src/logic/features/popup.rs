//! Popup Feature Extraction
//!
//! Text, input-field and domain signals of a popup/modal, all derived by
//! case-insensitive containment against the keyword tables.

use url::Url;

use super::keywords::{
    contains_any, count_matches, PASSWORD_FIELD_LABELS, PAYMENT_FIELD_LABELS, PAYMENT_KEYWORDS,
    PHISHING_KEYWORDS, SENSITIVE_FIELD_TERMS, SUSPICIOUS_DOMAIN_TERMS, URGENCY_KEYWORDS,
    VERIFICATION_KEYWORDS,
};
use super::layout::PopupFeature;
use super::vector::FeatureVector;

pub type PopupFeatureVector = FeatureVector<PopupFeature>;

/// Stateless popup extractor
#[derive(Debug, Clone, Copy, Default)]
pub struct PopupFeatureExtractor;

impl PopupFeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract_features(&self, page_url: &str, raw_text: &str, field_labels: &[String]) -> PopupFeatureVector {
        let mut features = PopupFeatureVector::neutral();

        apply_text_features(&mut features, raw_text);
        apply_field_features(&mut features, field_labels);
        apply_domain_features(&mut features, page_url);

        log::debug!(
            "Popup features for {}: {} chars, {} fields",
            page_url,
            features.get(PopupFeature::TextLength),
            field_labels.len()
        );

        features
    }
}

fn flag(condition: bool) -> f32 {
    if condition {
        1.0
    } else {
        0.0
    }
}

// ============================================================================
// TEXT
// ============================================================================

fn apply_text_features(features: &mut PopupFeatureVector, raw_text: &str) {
    let lower = raw_text.to_lowercase();
    let length = raw_text.chars().count();

    features.set(PopupFeature::TextLength, length as f32);
    features.set(PopupFeature::HasUrgency, flag(contains_any(&lower, URGENCY_KEYWORDS)));
    features.set(PopupFeature::HasPaymentKeywords, flag(contains_any(&lower, PAYMENT_KEYWORDS)));
    features.set(
        PopupFeature::HasVerificationRequest,
        flag(contains_any(&lower, VERIFICATION_KEYWORDS)),
    );
    features.set(
        PopupFeature::PhishingKeywordCount,
        count_matches(&lower, PHISHING_KEYWORDS) as f32,
    );

    features.set(PopupFeature::CapitalizationRatio, capitalization_ratio(raw_text));
    features.set(
        PopupFeature::ExclamationCount,
        raw_text.matches('!').count() as f32,
    );
    features.set(PopupFeature::QuestionCount, raw_text.matches('?').count() as f32);
}

/// Uppercase chars / all chars, 0 for empty text
pub fn capitalization_ratio(text: &str) -> f32 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }
    let upper = text.chars().filter(|c| c.is_uppercase()).count();
    upper as f32 / total as f32
}

// ============================================================================
// FIELDS
// ============================================================================

fn apply_field_features(features: &mut PopupFeatureVector, field_labels: &[String]) {
    let lowered: Vec<String> = field_labels.iter().map(|l| l.to_lowercase()).collect();

    let exact = |labels: &[&str]| lowered.iter().any(|l| labels.contains(&l.as_str()));
    let sensitive = lowered
        .iter()
        .filter(|l| contains_any(l, SENSITIVE_FIELD_TERMS))
        .count();

    features.set(PopupFeature::NumFields, field_labels.len() as f32);
    features.set(PopupFeature::HasPasswordField, flag(exact(PASSWORD_FIELD_LABELS)));
    features.set(PopupFeature::HasPaymentField, flag(exact(PAYMENT_FIELD_LABELS)));
    features.set(PopupFeature::SensitiveFieldCount, sensitive as f32);
}

// ============================================================================
// DOMAIN
// ============================================================================

fn apply_domain_features(features: &mut PopupFeatureVector, page_url: &str) {
    let Some(host) = page_host(page_url) else {
        log::debug!("Popup page URL has no host: {:?}", page_url);
        return;
    };

    features.set(
        PopupFeature::DomainSuspicious,
        flag(contains_any(&host, SUSPICIOUS_DOMAIN_TERMS)),
    );
    features.set(
        PopupFeature::HasSubdomain,
        flag(host.matches('.').count() > 1),
    );
}

/// Lower-cased host of `page_url`, if it parses and has one
pub fn page_host(page_url: &str) -> Option<String> {
    let parsed = Url::parse(page_url).ok()?;
    parsed.host_str().map(|h| h.to_lowercase())
}
