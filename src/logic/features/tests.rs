use serde_json::json;

use super::*;
use crate::logic::ocr::test_support::FixedText;
use crate::logic::ocr::NullRecognizer;
use crate::logic::pixels::fixtures;

fn assert_in_bounds(vector: &ImageFeatureVector) {
    for (name, value) in vector.named() {
        let key = layout::feature_by_name::<ImageFeature>(name).unwrap();
        let (lo, hi) = key.clip_range();
        assert!(
            value.is_finite() && value >= lo && value <= hi,
            "{} = {} outside [{}, {}]",
            name,
            value,
            lo,
            hi
        );
    }
}

#[test]
fn test_every_image_vector_is_within_bounds() {
    let recognizer = FixedText::new("click here http://verify.example\nwww\nurgent bank account otp");
    let extractor = ImageFeatureExtractor::new(&recognizer, 0.3, 4096);

    let payloads: Vec<Option<Vec<u8>>> = vec![
        None,
        Some(Vec::new()),
        Some(b"\x89PNG\r\n\x1a\nbroken".to_vec()),
        Some(fixtures::gradient_rgb(64, 3)),
        Some(fixtures::solid_rgb(1, 1, [0, 0, 0])),
        Some(fixtures::noisy_rgb(32, 32)),
        Some(fixtures::uniform_gray()),
        Some(fixtures::checker_rgba(5, 200)),
    ];

    for payload in &payloads {
        let vector = extractor.extract_features(
            payload.as_deref(),
            Some("https://cdn.example/PAYMENT.png"),
            "https://page.example",
            Some("image/png"),
            Some(&json!({"a": {"b": {"c": {}}}})),
        );
        assert_in_bounds(&vector);
        assert!(vector.validate().is_ok());
    }
}

#[test]
fn test_extreme_aspect_ratio_is_clipped() {
    let extractor = ImageFeatureExtractor::new(&NullRecognizer, 0.3, 4096);

    let wide = extractor.extract_features(Some(&fixtures::gradient_rgb(64, 3)), None, "x", None, None);
    assert_eq!(wide.get(ImageFeature::AspectRatio), 10.0);

    let tall = extractor.extract_features(Some(&fixtures::checker_rgba(5, 200)), None, "x", None, None);
    assert_eq!(tall.get(ImageFeature::AspectRatio), 0.1);
}

#[test]
fn test_default_vector_for_missing_everything() {
    let extractor = ImageFeatureExtractor::new(&NullRecognizer, 0.3, 4096);
    let vector = extractor.extract_features(None, None, "x", None, None);

    assert_eq!(vector.len(), IMAGE_FEATURE_COUNT);
    assert_eq!(vector, ImageFeatureVector::neutral());
}

#[test]
fn test_metadata_depth_reaches_vector() {
    let extractor = ImageFeatureExtractor::new(&NullRecognizer, 0.3, 4096);

    let nested = extractor.extract_features(None, None, "x", None, Some(&json!({"a": {"b": 1}})));
    assert_eq!(nested.get(ImageFeature::MetadataDepth), 2.0);

    let malformed = extractor.extract_features(None, None, "x", None, Some(&json!("text")));
    assert_eq!(malformed.get(ImageFeature::MetadataDepth), 0.0);
}

#[test]
fn test_ocr_runs_on_decoded_pixels_once() {
    let recognizer = FixedText::new("hello");
    let extractor = ImageFeatureExtractor::new(&recognizer, 0.3, 4096);
    extractor.extract_features(Some(&fixtures::gradient_rgb(12, 6)), None, "x", None, None);

    let seen = recognizer.seen.lock();
    assert_eq!(seen.len(), 1);
    assert_eq!((seen[0].width, seen[0].height), (12, 6));
}

#[test]
fn test_popup_vector_layout() {
    let vector = PopupFeatureExtractor::new().extract_features(
        "https://account-update.example.com",
        "Your account is locked. Confirm your SSN and OTP to unlock. Act now, offer expires!",
        &["ssn".to_string(), "otp".to_string()],
    );

    assert_eq!(vector.len(), POPUP_FEATURE_COUNT);
    assert!(vector.is_within_bounds());
    assert!(vector.get(PopupFeature::PhishingKeywordCount) > 3.0);
    assert_eq!(vector.get(PopupFeature::SensitiveFieldCount), 2.0);
    assert_eq!(vector.get(PopupFeature::DomainSuspicious), 1.0);
}
