use std::sync::Arc;

use serde_json::json;

use super::*;
use crate::logic::features::layout::{layout_hash, IMAGE_FEATURE_COUNT};
use crate::logic::model::inference::test_support::StubModel;
use crate::logic::model::StandardScaler;
use crate::logic::ocr::test_support::FixedText;
use crate::logic::pixels::fixtures;
use crate::logic::verdict::Action;

fn engine_with_text(text: &str) -> Engine {
    Engine::new(EngineConfig::heuristic_only(), None, Arc::new(FixedText::new(text)))
}

fn engine_with_model(model: Arc<StubModel>) -> Engine {
    engine_with_offset_model(model, 0.0)
}

fn engine_with_offset_model(model: Arc<StubModel>, score_offset: f32) -> Engine {
    let state = ModelState {
        scaler: StandardScaler {
            mean: vec![0.0; IMAGE_FEATURE_COUNT],
            scale: vec![1.0; IMAGE_FEATURE_COUNT],
            feature_version: None,
            layout_hash: None,
        },
        model,
        metadata: ModelMetadata {
            model_path: "<memory>".to_string(),
            model_type: "stub".to_string(),
            checksum: String::new(),
            features: IMAGE_FEATURE_COUNT,
            feature_version: 1,
            layout_hash: layout_hash::<ImageFeature>(),
            score_offset,
            loaded_at: chrono::Utc::now(),
        },
    };
    Engine::new(EngineConfig::heuristic_only(), Some(state), Arc::new(NullRecognizer))
}

fn phishing_popup() -> Artifact {
    Artifact::Popup(
        PopupArtifact::new(
            "https://secure-verify.account.example.com/login",
            "URGENT: your account is suspended. Verify your payment details now!",
        )
        .with_fields(["password", "cvv"]),
    )
}

// ============================================================================
// POPUPS
// ============================================================================

#[test]
fn test_phishing_popup_is_malicious() {
    let engine = Engine::heuristic();
    let result = engine.classify(&phishing_popup(), &DecisionContext::new(0.7, true));

    assert_eq!(result.verdict, Verdict::Malicious);
    assert_eq!(result.severity, 10);
    assert_eq!(result.confidence, 1.0);
    assert_eq!(result.action, Action::Quarantine);
    assert_eq!(
        result.reason_codes,
        vec![
            "urgency_indicators",
            "payment_request",
            "verification_request",
            "sensitive_data_request",
            "phishing_pattern",
            "suspicious_domain",
        ]
    );
    assert!(!result.steganography_detected);
    assert_eq!(
        result.extracted_text,
        "URGENT: your account is suspended. Verify your payment details now!"
    );
}

#[test]
fn test_clean_popup_is_safe() {
    let engine = Engine::heuristic();
    let artifact = Artifact::Popup(
        PopupArtifact::new("https://example.com", "Subscribe to our newsletter").with_fields(["email"]),
    );
    let result = engine.classify(&artifact, &DecisionContext::default());

    assert_eq!(result.verdict, Verdict::Safe);
    assert_eq!(result.severity, 1);
    assert_eq!(result.action, Action::Allow);
    assert!(result.reason_codes.is_empty());
}

#[test]
fn test_popup_below_threshold_is_suspicious() {
    let engine = Engine::heuristic();
    let artifact = Artifact::Popup(
        PopupArtifact::new("https://example.com", "Account locked. Enter SSN and OTP.").with_fields(["ssn"]),
    );
    let result = engine.classify(&artifact, &DecisionContext::new(0.7, true));

    assert_eq!(result.verdict, Verdict::Suspicious);
    assert_eq!(result.severity, 6);
    assert_eq!(result.action, Action::Alert);
    assert_eq!(result.reason_codes, vec!["sensitive_data_request", "phishing_pattern"]);
}

// ============================================================================
// IMAGES
// ============================================================================

#[test]
fn test_empty_image_is_safe() {
    let engine = Engine::heuristic();
    let result = engine.classify(&Artifact::Image(ImageArtifact::new("x")), &DecisionContext::default());

    assert_eq!(result.verdict, Verdict::Safe);
    assert_eq!(result.severity, 1);
    assert_eq!(result.action, Action::Allow);
    assert_eq!(result.confidence, 0.0);
    assert!(result.reason_codes.is_empty());
    assert!(!result.steganography_detected);
}

#[test]
fn test_undecodable_image_is_not_an_error() {
    let engine = Engine::heuristic();
    let artifact = Artifact::Image(ImageArtifact::new("x").with_thumbnail(b"not an image".to_vec()));
    let result = engine.classify(&artifact, &DecisionContext::default());
    assert_eq!(result.verdict, Verdict::Safe);
}

#[test]
fn test_suspicious_text_and_stego_image_is_malicious() {
    let engine = engine_with_text("Verify your bank account\npassword + OTP at www.evil.example");
    let artifact = Artifact::Image(
        ImageArtifact::new("https://page.example").with_thumbnail(fixtures::noisy_rgb(32, 32)),
    );
    let result = engine.classify(&artifact, &DecisionContext::default());

    assert_eq!(result.verdict, Verdict::Malicious);
    assert!((result.confidence - 0.8).abs() < 1e-6);
    assert_eq!(result.severity, 8);
    assert_eq!(result.action, Action::Alert);
    assert!(result.steganography_detected);
    assert_eq!(
        result.reason_codes,
        vec!["suspicious_text_content", "embedded_links", "steganography_detected"]
    );
    assert_eq!(result.extracted_text, "Verify your bank account\npassword + OTP at www.evil.example");
}

#[test]
fn test_script_count_reaches_scoring() {
    let engine = engine_with_text("click here: www.example.com");
    let artifact = Artifact::Image(
        ImageArtifact::new("x")
            .with_thumbnail(fixtures::solid_rgb(8, 8, [10, 20, 30]))
            .with_suspicious_js_count(3),
    );
    let result = engine.classify(&artifact, &DecisionContext::new(0.5, false));

    // links + js = 4 points: not malicious, but explains nothing either
    assert_eq!(result.verdict, Verdict::Safe);
    assert!((result.confidence - 0.4).abs() < 1e-6);
    assert!(result.reason_codes.is_empty());
}

#[test]
fn test_model_outlier_is_malicious() {
    let model = Arc::new(StubModel::answering(true, -1.0));
    let engine = engine_with_model(model.clone());
    assert!(engine.has_model());

    let result = engine.classify(&Artifact::Image(ImageArtifact::new("x")), &DecisionContext::new(0.7, true));
    assert_eq!(result.verdict, Verdict::Malicious);
    assert_eq!(result.severity, 8);
    assert_eq!(result.action, Action::Quarantine);
    assert_eq!(model.call_count(), 1);
}

#[test]
fn test_model_offset_calibrates_confidence() {
    // decision score -0.05, offset_ -0.5: confidence 0.75 clears 0.7
    let engine = engine_with_offset_model(Arc::new(StubModel::answering(true, -0.05)), -0.5);
    let result = engine.classify(&Artifact::Image(ImageArtifact::new("x")), &DecisionContext::default());

    assert_eq!(result.verdict, Verdict::Malicious);
    assert!((result.confidence - 0.750_260).abs() < 1e-5);
    assert_eq!(result.severity, 7);
}

#[test]
fn test_model_failure_degrades_to_neutral() {
    let engine = engine_with_model(Arc::new(StubModel::failing("boom")));
    let result = engine.classify(&Artifact::Image(ImageArtifact::new("x")), &DecisionContext::default());

    assert_eq!(result.verdict, Verdict::Safe);
    assert_eq!(result.confidence, 0.5);
    assert!(result.reason_codes.is_empty());
}

#[test]
fn test_popups_never_use_the_model() {
    let model = Arc::new(StubModel::answering(true, -5.0));
    let engine = engine_with_model(model.clone());
    engine.classify(&phishing_popup(), &DecisionContext::default());
    assert_eq!(model.call_count(), 0);
}

#[test]
fn test_classify_is_idempotent() {
    let engine = engine_with_text("urgent: verify password");
    let artifact = Artifact::Image(
        ImageArtifact::new("https://page.example")
            .with_thumbnail(fixtures::gradient_rgb(24, 16))
            .with_src_url("https://cdn.example/login.png")
            .with_metadata(json!({"og": {"title": "x"}})),
    );
    let ctx = DecisionContext::new(0.6, true);

    let first = serde_json::to_string(&engine.classify(&artifact, &ctx)).unwrap();
    let second = serde_json::to_string(&engine.classify(&artifact, &ctx)).unwrap();
    assert_eq!(first, second);

    let first = serde_json::to_string(&engine.classify(&phishing_popup(), &ctx)).unwrap();
    let second = serde_json::to_string(&engine.classify(&phishing_popup(), &ctx)).unwrap();
    assert_eq!(first, second);
}

// ============================================================================
// REQUESTS
// ============================================================================

#[test]
fn test_classify_request() {
    let engine = Engine::heuristic();
    let request = InferRequest::from_json(
        &json!({
            "type": "popup",
            "data": {
                "page_url": "https://secure-verify.account.example.com/login",
                "raw_text": "URGENT: your account is suspended. Verify your payment details now!",
                "field_labels": ["password", "cvv"]
            },
            "context": {"policy": {"auto_quarantine": true}}
        })
        .to_string(),
    )
    .unwrap();

    let result = engine.classify_request(request).unwrap();
    assert_eq!(result.verdict, Verdict::Malicious);
    assert_eq!(result.action, Action::Quarantine);
}

#[test]
fn test_classify_request_rejects_unknown_type() {
    let engine = Engine::heuristic();
    let request = InferRequest::from_json(r#"{"type": "audio", "data": {}}"#).unwrap();
    let err = engine.classify_request(request).unwrap_err();
    assert_eq!(err, EngineError::UnknownArtifactType("audio".to_string()));
    assert_eq!(err.code(), "unknown_artifact_type");
}

#[test]
fn test_request_without_threshold_uses_config_default() {
    let config = EngineConfig {
        default_threshold: 0.9,
        ..EngineConfig::heuristic_only()
    };
    let engine = Engine::new(config, None, Arc::new(NullRecognizer));
    assert_eq!(engine.default_context().threshold, 0.9);

    // 8 points = 0.8: malicious at 0.7, suspicious at 0.9
    let request = InferRequest::from_json(
        &json!({
            "type": "popup",
            "data": {
                "page_url": "https://example.com",
                "raw_text": "Urgent: account locked, enter SSN and OTP",
                "field_labels": ["otp"]
            }
        })
        .to_string(),
    )
    .unwrap();
    let result = engine.classify_request(request).unwrap();
    assert_eq!(result.verdict, Verdict::Suspicious);
}

// ============================================================================
// HANDLE
// ============================================================================

#[test]
fn test_handle_publish_keeps_in_flight_engine() {
    let handle = EngineHandle::new(Engine::heuristic());
    let in_flight = handle.current();
    assert!(!in_flight.has_model());

    let previous = handle.publish(engine_with_model(Arc::new(StubModel::answering(false, 0.3))));
    assert!(Arc::ptr_eq(&previous, &in_flight));
    assert!(handle.current().has_model());

    // the old instance still classifies
    let result = in_flight.classify(&phishing_popup(), &DecisionContext::default());
    assert_eq!(result.verdict, Verdict::Malicious);
}

#[test]
fn test_engine_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Engine>();
    assert_send_sync::<EngineHandle>();
}
