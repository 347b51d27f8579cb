//! Feature Vector - Core data structure for scoring input
//!
//! **Versioned feature vector with layout validation**
//!
//! Every write goes through `set`, which clips into the key's documented
//! range and replaces non-finite values with the key's neutral value.
//! The scaler/model never see an out-of-range or NaN feature.

use std::marker::PhantomData;

use serde::Serialize;

use super::layout::{layout_hash, validate_layout, FeatureKey, LayoutMismatchError};

// ============================================================================
// VERSIONED FEATURE VECTOR
// ============================================================================

/// Versioned, fixed-order feature vector for schema `K`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(bound = "")]
pub struct FeatureVector<K: FeatureKey> {
    /// Feature layout version
    pub version: u8,
    /// CRC32 hash of the feature layout (for mismatch detection)
    pub layout_hash: u32,
    /// Feature values in `K::LAYOUT` order
    values: Vec<f32>,
    #[serde(skip)]
    _schema: PhantomData<K>,
}

impl<K: FeatureKey> FeatureVector<K> {
    /// Every feature at its neutral value
    pub fn neutral() -> Self {
        Self {
            version: K::VERSION,
            layout_hash: layout_hash::<K>(),
            values: K::LAYOUT.iter().map(|k| k.neutral()).collect(),
            _schema: PhantomData,
        }
    }

    /// Get feature value
    pub fn get(&self, key: K) -> f32 {
        self.values
            .get(key.index())
            .copied()
            .unwrap_or_else(|| key.neutral())
    }

    /// Set feature value, clipped into range; non-finite becomes neutral
    pub fn set(&mut self, key: K, value: f32) {
        let index = key.index();
        if index >= self.values.len() {
            return;
        }
        self.values[index] = sanitize(key, value);
    }

    /// Builder-style `set`
    pub fn with(mut self, key: K, value: f32) -> Self {
        self.set(key, value);
        self
    }

    pub fn flag(&self, key: K) -> bool {
        self.get(key) > 0.0
    }

    /// Values in layout order
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// (name, value) pairs in layout order
    pub fn named(&self) -> Vec<(&'static str, f32)> {
        K::LAYOUT
            .iter()
            .map(|&k| (k.name(), self.get(k)))
            .collect()
    }

    /// Validate that this vector is compatible with current layout
    pub fn validate(&self) -> Result<(), LayoutMismatchError> {
        validate_layout::<K>(self.version, self.layout_hash)
    }

    /// Every value finite and inside its clip range
    pub fn is_within_bounds(&self) -> bool {
        K::LAYOUT.iter().all(|&k| {
            let v = self.get(k);
            let (lo, hi) = k.clip_range();
            v.is_finite() && v >= lo && v <= hi
        })
    }

    /// Convert to JSON-serializable format for logging
    pub fn to_log_entry(&self) -> serde_json::Value {
        let named: serde_json::Map<String, serde_json::Value> = self
            .named()
            .into_iter()
            .map(|(name, value)| (name.to_string(), serde_json::json!(value)))
            .collect();

        serde_json::json!({
            "schema": K::SCHEMA,
            "feature_version": self.version,
            "layout_hash": self.layout_hash,
            "values": named,
        })
    }
}

impl<K: FeatureKey> Default for FeatureVector<K> {
    fn default() -> Self {
        Self::neutral()
    }
}

fn sanitize<K: FeatureKey>(key: K, value: f32) -> f32 {
    if !value.is_finite() {
        return key.neutral();
    }
    let (lo, hi) = key.clip_range();
    value.clamp(lo, hi)
}

// ============================================================================
// TESTS
// ============================================================================
