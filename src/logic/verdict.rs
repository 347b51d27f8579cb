//! Verdict Policy
//!
//! Pure mapping (is_malicious, confidence, policy) -> verdict / severity /
//! action, plus the terminal `ClassificationResult`.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_CONFIDENCE_THRESHOLD;

/// Malicious findings below the policy threshold but at least this
/// confident are reported as suspicious
pub const SUSPICIOUS_CONFIDENCE: f32 = 0.5;

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Safe,
    Suspicious,
    Malicious,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Safe => "safe",
            Verdict::Suspicious => "suspicious",
            Verdict::Malicious => "malicious",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Allow,
    Alert,
    Quarantine,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Allow => "allow",
            Action::Alert => "alert",
            Action::Quarantine => "quarantine",
        }
    }
}

/// Caller policy for one classification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionContext {
    /// Confidence needed for a malicious verdict, in [0, 1]
    pub threshold: f32,
    pub auto_quarantine: bool,
}

impl Default for DecisionContext {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            auto_quarantine: false,
        }
    }
}

impl DecisionContext {
    pub fn new(threshold: f32, auto_quarantine: bool) -> Self {
        Self {
            threshold,
            auto_quarantine,
        }
    }

    /// Threshold clamped into [0, 1]; non-finite falls back to the default
    pub fn effective_threshold(&self) -> f32 {
        if self.threshold.is_finite() {
            self.threshold.clamp(0.0, 1.0)
        } else {
            DEFAULT_CONFIDENCE_THRESHOLD
        }
    }
}

/// Verdict, severity and action for one finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub verdict: Verdict,
    /// 1 - 10
    pub severity: u8,
    pub action: Action,
}

impl Resolution {
    pub fn safe() -> Self {
        Self {
            verdict: Verdict::Safe,
            severity: 1,
            action: Action::Allow,
        }
    }
}

/// Terminal result of one classification call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub verdict: Verdict,
    pub severity: u8,
    pub confidence: f32,
    pub extracted_text: String,
    pub reason_codes: Vec<String>,
    pub action: Action,
    pub steganography_detected: bool,
}

// ============================================================================
// RESOLVER
// ============================================================================

/// ⌊confidence × 10⌋, clamped to 1..=10
pub fn severity_for(confidence: f32) -> u8 {
    if !confidence.is_finite() {
        return 1;
    }
    ((confidence * 10.0).floor() as i32).clamp(1, 10) as u8
}

pub fn resolve(is_malicious: bool, confidence: f32, context: &DecisionContext) -> Resolution {
    if !is_malicious || !confidence.is_finite() {
        return Resolution::safe();
    }

    if confidence >= context.effective_threshold() {
        Resolution {
            verdict: Verdict::Malicious,
            severity: severity_for(confidence),
            action: if context.auto_quarantine {
                Action::Quarantine
            } else {
                Action::Alert
            },
        }
    } else if confidence >= SUSPICIOUS_CONFIDENCE {
        Resolution {
            verdict: Verdict::Suspicious,
            severity: severity_for(confidence),
            action: Action::Alert,
        }
    } else {
        Resolution::safe()
    }
}
