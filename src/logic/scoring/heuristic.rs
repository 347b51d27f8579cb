//! Heuristic Scoring - Fixed weight tables
//!
//! Each triggered rule adds its weight; confidence = points / 10 (capped
//! at 1.0), malicious iff points > 5.

use super::{ImageEvidence, Score, Scorer, ScoringMethod};
use crate::logic::features::{ImageFeature, PopupFeature, PopupFeatureVector};

/// Points for a full-confidence score
pub const MAX_POINTS: u32 = 10;

/// Strictly more than this many points = malicious
pub const MALICIOUS_POINTS: u32 = 5;

/// A named condition and the points it contributes
pub struct WeightedRule<I: 'static> {
    pub name: &'static str,
    pub weight: u32,
    pub applies: fn(&I) -> bool,
}

impl<I: 'static> std::fmt::Debug for WeightedRule<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WeightedRule({}, +{})", self.name, self.weight)
    }
}

// ============================================================================
// CONDITIONS
// ============================================================================

pub mod conditions {
    use super::*;

    pub fn suspicious_text(e: &ImageEvidence) -> bool {
        e.features.get(ImageFeature::SuspiciousStringsScore) > 0.5
    }

    pub fn has_links(e: &ImageEvidence) -> bool {
        e.features.flag(ImageFeature::HasLinks)
    }

    pub fn many_text_regions(e: &ImageEvidence) -> bool {
        e.features.get(ImageFeature::NumTextRegions) > 10.0
    }

    pub fn many_suspicious_js(e: &ImageEvidence) -> bool {
        e.features.get(ImageFeature::SuspiciousJsCount) > 2.0
    }

    pub fn any_suspicious_js(e: &ImageEvidence) -> bool {
        e.features.get(ImageFeature::SuspiciousJsCount) > 0.0
    }

    pub fn steganography(e: &ImageEvidence) -> bool {
        e.stego.detected
    }

    pub fn urgency(f: &PopupFeatureVector) -> bool {
        f.flag(PopupFeature::HasUrgency)
    }

    pub fn payment(f: &PopupFeatureVector) -> bool {
        f.flag(PopupFeature::HasPaymentKeywords)
    }

    pub fn verification(f: &PopupFeatureVector) -> bool {
        f.flag(PopupFeature::HasVerificationRequest)
    }

    pub fn sensitive_fields(f: &PopupFeatureVector) -> bool {
        f.get(PopupFeature::SensitiveFieldCount) > 0.0
    }

    pub fn phishing_pattern(f: &PopupFeatureVector) -> bool {
        f.get(PopupFeature::PhishingKeywordCount) > 3.0
    }

    pub fn suspicious_domain(f: &PopupFeatureVector) -> bool {
        f.flag(PopupFeature::DomainSuspicious)
    }
}

// ============================================================================
// RULE TABLES
// ============================================================================

pub const IMAGE_RULES: &[WeightedRule<ImageEvidence>] = &[
    WeightedRule { name: "suspicious_text", weight: 3, applies: conditions::suspicious_text },
    WeightedRule { name: "has_links", weight: 2, applies: conditions::has_links },
    WeightedRule { name: "many_text_regions", weight: 2, applies: conditions::many_text_regions },
    WeightedRule { name: "suspicious_js", weight: 2, applies: conditions::many_suspicious_js },
    WeightedRule { name: "steganography", weight: 3, applies: conditions::steganography },
];

pub const POPUP_RULES: &[WeightedRule<PopupFeatureVector>] = &[
    WeightedRule { name: "urgency", weight: 2, applies: conditions::urgency },
    WeightedRule { name: "payment", weight: 2, applies: conditions::payment },
    WeightedRule { name: "verification", weight: 1, applies: conditions::verification },
    WeightedRule { name: "sensitive_fields", weight: 3, applies: conditions::sensitive_fields },
    WeightedRule { name: "phishing_pattern", weight: 3, applies: conditions::phishing_pattern },
    WeightedRule { name: "suspicious_domain", weight: 2, applies: conditions::suspicious_domain },
];

// ============================================================================
// SCORER
// ============================================================================

/// Rule-table scorer
pub struct HeuristicScorer<I: 'static> {
    rules: &'static [WeightedRule<I>],
}

impl HeuristicScorer<ImageEvidence> {
    pub fn image() -> Self {
        Self { rules: IMAGE_RULES }
    }
}

impl HeuristicScorer<PopupFeatureVector> {
    pub fn popup() -> Self {
        Self { rules: POPUP_RULES }
    }
}

impl<I: 'static> HeuristicScorer<I> {
    pub fn with_rules(rules: &'static [WeightedRule<I>]) -> Self {
        Self { rules }
    }

    /// Sum of weights of every triggered rule
    pub fn points(&self, input: &I) -> u32 {
        self.rules
            .iter()
            .filter(|rule| (rule.applies)(input))
            .map(|rule| rule.weight)
            .sum()
    }

    pub fn triggered(&self, input: &I) -> Vec<&'static str> {
        self.rules
            .iter()
            .filter(|rule| (rule.applies)(input))
            .map(|rule| rule.name)
            .collect()
    }
}

impl<I: 'static> Scorer<I> for HeuristicScorer<I> {
    fn score(&self, input: &I) -> Score {
        let points = self.points(input);
        log::debug!("Heuristic score: {} points", points);

        Score {
            is_malicious: points > MALICIOUS_POINTS,
            confidence: (points as f32 / MAX_POINTS as f32).min(1.0),
            method: ScoringMethod::Heuristic,
        }
    }
}
