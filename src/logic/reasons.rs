//! Reason Codes
//!
//! Explain a positive finding. Codes come from constant (code, condition)
//! tables, in table order; nothing is emitted for a clean result.

use crate::logic::features::PopupFeatureVector;
use crate::logic::scoring::heuristic::conditions;
use crate::logic::scoring::ImageEvidence;

/// A reason code and the condition that emits it
pub struct ReasonRule<I: 'static> {
    pub code: &'static str,
    pub applies: fn(&I) -> bool,
}

pub const IMAGE_REASONS: &[ReasonRule<ImageEvidence>] = &[
    ReasonRule { code: "suspicious_text_content", applies: conditions::suspicious_text },
    ReasonRule { code: "embedded_links", applies: conditions::has_links },
    ReasonRule { code: "suspicious_js", applies: conditions::any_suspicious_js },
    ReasonRule { code: "steganography_detected", applies: conditions::steganography },
    ReasonRule { code: "excessive_text_regions", applies: conditions::many_text_regions },
];

pub const POPUP_REASONS: &[ReasonRule<PopupFeatureVector>] = &[
    ReasonRule { code: "urgency_indicators", applies: conditions::urgency },
    ReasonRule { code: "payment_request", applies: conditions::payment },
    ReasonRule { code: "verification_request", applies: conditions::verification },
    ReasonRule { code: "sensitive_data_request", applies: conditions::sensitive_fields },
    ReasonRule { code: "phishing_pattern", applies: conditions::phishing_pattern },
    ReasonRule { code: "suspicious_domain", applies: conditions::suspicious_domain },
];

pub fn collect<I: 'static>(table: &[ReasonRule<I>], input: &I, is_malicious: bool) -> Vec<String> {
    if !is_malicious {
        return Vec::new();
    }
    table
        .iter()
        .filter(|rule| (rule.applies)(input))
        .map(|rule| rule.code.to_string())
        .collect()
}

pub fn image_reasons(evidence: &ImageEvidence, is_malicious: bool) -> Vec<String> {
    collect(IMAGE_REASONS, evidence, is_malicious)
}

pub fn popup_reasons(features: &PopupFeatureVector, is_malicious: bool) -> Vec<String> {
    collect(POPUP_REASONS, features, is_malicious)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::logic::features::{ImageFeature, ImageFeatureVector, PopupFeature};
    use crate::logic::stego::StegoResult;

    fn loud_image() -> ImageEvidence {
        ImageEvidence {
            features: ImageFeatureVector::neutral()
                .with(ImageFeature::SuspiciousStringsScore, 1.0)
                .with(ImageFeature::HasLinks, 1.0)
                .with(ImageFeature::SuspiciousJsCount, 1.0)
                .with(ImageFeature::NumTextRegions, 40.0),
            stego: StegoResult { detected: true, ..StegoResult::clean() },
        }
    }

    fn loud_popup() -> PopupFeatureVector {
        PopupFeatureVector::neutral()
            .with(PopupFeature::HasUrgency, 1.0)
            .with(PopupFeature::HasPaymentKeywords, 1.0)
            .with(PopupFeature::HasVerificationRequest, 1.0)
            .with(PopupFeature::SensitiveFieldCount, 2.0)
            .with(PopupFeature::PhishingKeywordCount, 5.0)
            .with(PopupFeature::DomainSuspicious, 1.0)
    }

    #[test]
    fn test_nothing_when_not_malicious() {
        assert!(image_reasons(&loud_image(), false).is_empty());
        assert!(popup_reasons(&loud_popup(), false).is_empty());
    }

    #[test]
    fn test_image_codes_in_table_order() {
        assert_eq!(
            image_reasons(&loud_image(), true),
            vec![
                "suspicious_text_content",
                "embedded_links",
                "suspicious_js",
                "steganography_detected",
                "excessive_text_regions",
            ]
        );
    }

    #[test]
    fn test_popup_codes() {
        let codes = popup_reasons(&loud_popup(), true);
        assert_eq!(codes.len(), POPUP_REASONS.len());
        assert_eq!(codes[3], "sensitive_data_request");

        let quiet = PopupFeatureVector::neutral().with(PopupFeature::PhishingKeywordCount, 3.0);
        assert!(popup_reasons(&quiet, true).is_empty());
    }

    #[test]
    fn test_codes_are_unique() {
        let image: HashSet<_> = IMAGE_REASONS.iter().map(|r| r.code).collect();
        let popup: HashSet<_> = POPUP_REASONS.iter().map(|r| r.code).collect();
        assert_eq!(image.len(), IMAGE_REASONS.len());
        assert_eq!(popup.len(), POPUP_REASONS.len());
    }
}
