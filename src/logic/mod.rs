//! Logic Module - Detection & Decision Engine
//!
//! ## Architecture
//! - `pixels` - Image decoding into a raw pixel buffer
//! - `ocr` - Otsu binarization + pluggable text recognizer
//! - `features/` - Image and popup feature extraction (versioned layouts)
//! - `stego/` - LSB entropy and channel statistics tests
//! - `model/` - Trained scaler + anomaly model (ONNX)
//! - `scoring/` - Model scorer and heuristic rule tables
//! - `verdict` - Verdict / severity / action policy
//! - `reasons` - Reason codes for positive findings
//! - `engine` - Ties everything together

pub mod artifact;
pub mod config;
pub mod pixels;
pub mod ocr;
pub mod features;
pub mod stego;
pub mod model;
pub mod scoring;
pub mod verdict;
pub mod reasons;
pub mod engine;
