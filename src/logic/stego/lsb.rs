//! LSB plane entropy test

use crate::logic::pixels::PixelBuffer;

/// Keeps `log2` away from zero probabilities
const LOG_EPSILON: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LsbReport {
    pub suspicious: bool,
    /// Binary entropy of the LSB plane (bits, 0..=1)
    pub entropy: f64,
    pub confidence: f64,
}

/// Entropy of the least significant bit over every channel sample.
///
/// Natural images tend toward a lopsided LSB plane; a near-uniform plane
/// looks like an embedded payload.
pub fn lsb_test(pixels: &PixelBuffer, threshold: f64) -> LsbReport {
    let total = pixels.data.len();
    if total == 0 {
        return LsbReport {
            suspicious: false,
            entropy: 0.0,
            confidence: 0.0,
        };
    }

    let ones = pixels.data.iter().filter(|&&v| v & 1 == 1).count();
    let entropy = lsb_entropy(ones, total);
    let suspicious = entropy > threshold;

    LsbReport {
        suspicious,
        entropy,
        confidence: if suspicious { entropy.min(1.0) } else { 0.0 },
    }
}

/// `-Σ p·log2(p + ε)` over the observed bit values
fn lsb_entropy(ones: usize, total: usize) -> f64 {
    let zeros = total - ones;
    let entropy: f64 = [zeros, ones]
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total as f64;
            -p * (p + LOG_EPSILON).log2()
        })
        .sum();
    entropy.max(0.0)
}
