//! Artifact Types
//!
//! The two kinds of input the engine classifies.
//! Immutable once received - no logic here.

use serde::{Deserialize, Serialize};

/// One artifact to classify
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Artifact {
    Image(ImageArtifact),
    Popup(PopupArtifact),
}

impl Artifact {
    pub fn kind(&self) -> &'static str {
        match self {
            Artifact::Image(_) => "image",
            Artifact::Popup(_) => "popup",
        }
    }

    pub fn page_url(&self) -> &str {
        match self {
            Artifact::Image(image) => &image.page_url,
            Artifact::Popup(popup) => &popup.page_url,
        }
    }
}

/// Image / thumbnail seen on a page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageArtifact {
    /// Encoded image bytes (PNG, JPEG, ...)
    #[serde(default, skip_serializing)]
    pub thumbnail: Option<Vec<u8>>,
    #[serde(default)]
    pub src_url: Option<String>,
    pub page_url: String,
    #[serde(default)]
    pub mime: Option<String>,
    /// Arbitrary nested metadata from the page
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    /// Filled by an external script scanner, if one ran
    #[serde(default)]
    pub suspicious_js_count: Option<u32>,
}

impl ImageArtifact {
    pub fn new(page_url: impl Into<String>) -> Self {
        Self {
            page_url: page_url.into(),
            ..Default::default()
        }
    }

    pub fn with_thumbnail(mut self, bytes: Vec<u8>) -> Self {
        self.thumbnail = Some(bytes);
        self
    }

    pub fn with_src_url(mut self, src_url: impl Into<String>) -> Self {
        self.src_url = Some(src_url.into());
        self
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_suspicious_js_count(mut self, count: u32) -> Self {
        self.suspicious_js_count = Some(count);
        self
    }
}

/// Popup / modal captured by the content script
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PopupArtifact {
    pub page_url: String,
    #[serde(default)]
    pub raw_text: String,
    #[serde(default)]
    pub field_labels: Vec<String>,
}

impl PopupArtifact {
    pub fn new(page_url: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            page_url: page_url.into(),
            raw_text: raw_text.into(),
            field_labels: vec![],
        }
    }

    pub fn with_fields<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_labels = labels.into_iter().map(Into::into).collect();
        self
    }
}
