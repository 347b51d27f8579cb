//! Inference request as sent by the serving layer
//!
//! `{ "type": "image" | "popup", "data": {...}, "context": { "policy": {...} } }`

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::logic::artifact::{Artifact, ImageArtifact, PopupArtifact};
use crate::logic::engine::EngineError;
use crate::logic::verdict::DecisionContext;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferRequest {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub context: RequestContext,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
    #[serde(default)]
    pub policy: PolicyOverrides,
}

/// Caller policy; missing fields fall back to engine defaults
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyOverrides {
    #[serde(default)]
    pub threshold: Option<f32>,
    #[serde(default)]
    pub auto_quarantine: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    #[serde(default)]
    thumbnail_base64: Option<String>,
    #[serde(default)]
    src_url: Option<String>,
    page_url: String,
    #[serde(default)]
    mime: Option<String>,
    #[serde(default)]
    metadata: Option<serde_json::Value>,
    #[serde(default)]
    suspicious_js_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct PopupData {
    page_url: String,
    raw_text: String,
    #[serde(default)]
    field_labels: Option<Vec<String>>,
}

impl InferRequest {
    /// Parse request JSON
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        serde_json::from_str(json).map_err(|e| EngineError::InvalidRequest(e.to_string()))
    }

    pub fn decision_context(&self, default_threshold: f32) -> DecisionContext {
        DecisionContext::new(
            self.context.policy.threshold.unwrap_or(default_threshold),
            self.context.policy.auto_quarantine.unwrap_or(false),
        )
    }

    /// Validate the payload for its discriminator
    pub fn into_artifact(self) -> Result<Artifact, EngineError> {
        match self.kind.as_str() {
            "image" => {
                let data: ImageData = serde_json::from_value(self.data)
                    .map_err(|e| EngineError::InvalidRequest(format!("image data: {}", e)))?;

                let thumbnail = data.thumbnail_base64.as_deref().and_then(decode_thumbnail);

                Ok(Artifact::Image(ImageArtifact {
                    thumbnail,
                    src_url: data.src_url,
                    page_url: data.page_url,
                    mime: data.mime,
                    metadata: data.metadata,
                    suspicious_js_count: data.suspicious_js_count,
                }))
            }
            "popup" => {
                let data: PopupData = serde_json::from_value(self.data)
                    .map_err(|e| EngineError::InvalidRequest(format!("popup data: {}", e)))?;

                Ok(Artifact::Popup(PopupArtifact {
                    page_url: data.page_url,
                    raw_text: data.raw_text,
                    field_labels: data.field_labels.unwrap_or_default(),
                }))
            }
            other => Err(EngineError::UnknownArtifactType(other.to_string())),
        }
    }
}

/// Base64 (optionally a `data:` URL) to bytes.
///
/// Invalid base64 is kept as an undecodable payload so the image still
/// gets classified on its URLs and metadata.
pub fn decode_thumbnail(encoded: &str) -> Option<Vec<u8>> {
    let payload = match encoded.split_once(',') {
        Some((_, rest)) => rest,
        None => encoded,
    };
    let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    if payload.is_empty() {
        return None;
    }

    match STANDARD.decode(payload.as_bytes()) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            log::warn!("Thumbnail is not valid base64 ({}), treating as undecodable", e);
            Some(payload.into_bytes())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: serde_json::Value) -> InferRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_image_request() {
        let req = request(json!({
            "type": "image",
            "data": {
                "thumbnail_base64": "data:image/png;base64,aGVsbG8=",
                "src_url": "https://cdn.example/a.png",
                "page_url": "https://example.com",
                "mime": "image/png",
                "metadata": {"a": 1},
                "suspicious_js_count": 4
            },
            "context": {"policy": {"threshold": 0.4, "auto_quarantine": true}}
        }));

        let ctx = req.decision_context(0.7);
        assert_eq!(ctx, DecisionContext::new(0.4, true));

        let Artifact::Image(image) = req.into_artifact().unwrap() else {
            panic!("expected image artifact");
        };
        assert_eq!(image.thumbnail.as_deref(), Some(&b"hello"[..]));
        assert_eq!(image.suspicious_js_count, Some(4));
        assert_eq!(image.metadata, Some(json!({"a": 1})));
    }

    #[test]
    fn test_popup_request_defaults() {
        let req = request(json!({
            "type": "popup",
            "data": {"page_url": "https://x.example", "raw_text": "hi"}
        }));
        assert_eq!(req.decision_context(0.65), DecisionContext::new(0.65, false));

        let Artifact::Popup(popup) = req.into_artifact().unwrap() else {
            panic!("expected popup artifact");
        };
        assert!(popup.field_labels.is_empty());
        assert_eq!(popup.raw_text, "hi");
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let err = request(json!({"type": "video", "data": {}})).into_artifact().unwrap_err();
        assert_eq!(err.code(), "unknown_artifact_type");
    }

    #[test]
    fn test_malformed_payload_is_invalid_request() {
        let err = request(json!({"type": "popup", "data": {"page_url": "x"}}))
            .into_artifact()
            .unwrap_err();
        assert_eq!(err.code(), "invalid_request");

        let err = request(json!({"type": "image", "data": "nope"})).into_artifact().unwrap_err();
        assert_eq!(err.code(), "invalid_request");

        let err = InferRequest::from_json(r#"{"data": {}}"#).unwrap_err();
        assert_eq!(err.code(), "invalid_request");
    }

    #[test]
    fn test_decode_thumbnail() {
        assert_eq!(decode_thumbnail("aGVs\nbG8="), Some(b"hello".to_vec()));
        assert_eq!(decode_thumbnail(""), None);
        assert_eq!(decode_thumbnail("data:image/png;base64,"), None);
        // kept, but will not decode as an image
        assert_eq!(decode_thumbnail("%%%"), Some(b"%%%".to_vec()));
    }
}
