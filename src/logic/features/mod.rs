//! Features Module - Artifact feature extraction
//!
//! ## Structure
//! - `layout` - Schema definitions and layout hashing
//! - `vector` - Versioned, range-checked feature vector
//! - `keywords` - Fixed keyword tables
//! - `edges` - Edge density operator
//! - `image` - Image extractor (pixels + OCR text + URL + metadata)
//! - `popup` - Popup extractor (text + fields + domain)

pub mod edges;
pub mod image;
pub mod keywords;
pub mod layout;
pub mod popup;
pub mod vector;

#[cfg(test)]
mod tests;

pub use self::image::{ImageFeatureExtractor, ImageFeatureVector, MalformedMetadata};
pub use layout::{
    FeatureKey, ImageFeature, LayoutInfo, LayoutMismatchError, PopupFeature, IMAGE_FEATURE_COUNT,
    IMAGE_FEATURE_VERSION, POPUP_FEATURE_COUNT, POPUP_FEATURE_VERSION,
};
pub use popup::{PopupFeatureExtractor, PopupFeatureVector};
pub use vector::FeatureVector;
