//! Standard Scaler
//!
//! `(x - mean) / scale` per feature, parameters exported from training
//! as `scaler.json`.

use serde::{Deserialize, Serialize};

use super::ModelError;
use crate::logic::features::layout::{validate_layout, FeatureKey};

/// Fitted standardization parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
    /// Layout the scaler was fitted on (absent in older exports)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_version: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_hash: Option<u32>,
}

impl StandardScaler {
    /// Parse `scaler.json` content
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let scaler: Self = serde_json::from_str(json)?;
        if scaler.mean.len() != scaler.scale.len() {
            return Err(ModelError::DimensionMismatch {
                expected: scaler.mean.len(),
                actual: scaler.scale.len(),
            });
        }
        if scaler
            .mean
            .iter()
            .chain(&scaler.scale)
            .any(|v| !v.is_finite())
        {
            return Err(ModelError::InvalidScaler("non-finite parameter".to_string()));
        }
        Ok(scaler)
    }

    pub fn feature_count(&self) -> usize {
        self.mean.len()
    }

    /// Check the scaler was fitted on schema `K`
    pub fn check_layout<K: FeatureKey>(&self) -> Result<(), ModelError> {
        if self.feature_count() != K::LAYOUT.len() {
            return Err(ModelError::DimensionMismatch {
                expected: K::LAYOUT.len(),
                actual: self.feature_count(),
            });
        }

        match (self.feature_version, self.layout_hash) {
            (Some(version), Some(hash)) => validate_layout::<K>(version, hash)?,
            _ => log::warn!(
                "Scaler carries no layout stamp; assuming current {} layout",
                K::SCHEMA
            ),
        }
        Ok(())
    }

    /// Standardize one vector; zero scale acts as 1
    pub fn transform(&self, values: &[f32]) -> Result<Vec<f32>, ModelError> {
        if values.len() != self.feature_count() {
            return Err(ModelError::DimensionMismatch {
                expected: self.feature_count(),
                actual: values.len(),
            });
        }

        Ok(values
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(&x, (&mean, &scale))| {
                let scale = if scale == 0.0 { 1.0 } else { scale };
                ((x as f64 - mean) / scale) as f32
            })
            .collect())
    }
}
