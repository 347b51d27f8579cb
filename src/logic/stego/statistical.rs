//! Channel correlation (colour) / histogram uniformity (grayscale) test

use crate::logic::pixels::PixelBuffer;

/// Keeps the chi-square denominator away from zero
const CHI_EPSILON: f64 = 1e-10;

/// Chi-square at which the grayscale anomaly score saturates
const CHI_SQUARE_SCALE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatisticalReport {
    pub suspicious: bool,
    pub anomaly_score: f64,
    pub confidence: f64,
}

impl StatisticalReport {
    fn clean() -> Self {
        Self {
            suspicious: false,
            anomaly_score: 0.0,
            confidence: 0.0,
        }
    }

    fn new(suspicious: bool, anomaly_score: f64) -> Self {
        Self {
            suspicious,
            anomaly_score,
            confidence: if suspicious { anomaly_score } else { 0.0 },
        }
    }
}

pub fn statistical_test(
    pixels: &PixelBuffer,
    correlation_threshold: f64,
    chi_square_threshold: f64,
) -> StatisticalReport {
    if pixels.data.is_empty() {
        return StatisticalReport::clean();
    }

    if pixels.is_multichannel() {
        match mean_abs_correlation(pixels) {
            Some(mean) => StatisticalReport::new(mean < correlation_threshold, (1.0 - mean).clamp(0.0, 1.0)),
            None => {
                log::debug!("Statistical test: no channel pair with variance");
                StatisticalReport::clean()
            }
        }
    } else {
        let chi = chi_square_vs_uniform(&pixels.data);
        StatisticalReport::new(chi < chi_square_threshold, (chi / CHI_SQUARE_SCALE).min(1.0))
    }
}

/// Mean |Pearson r| over every channel pair; pairs touching a constant
/// channel are skipped, `None` if nothing is left.
///
/// One pass over the interleaved buffer with exact integer moments, so
/// memory stays constant in the image size.
pub fn mean_abs_correlation(pixels: &PixelBuffer) -> Option<f64> {
    let channels = pixels.channels as usize;
    if channels < 2 {
        return None;
    }

    let pairs: Vec<(usize, usize)> = (0..channels)
        .flat_map(|i| ((i + 1)..channels).map(move |j| (i, j)))
        .collect();

    let mut sum = vec![0u64; channels];
    let mut sum_sq = vec![0u64; channels];
    let mut cross = vec![0u64; pairs.len()];
    let mut n = 0u64;

    for px in pixels.data.chunks_exact(channels) {
        n += 1;
        for (c, &v) in px.iter().enumerate() {
            let v = u64::from(v);
            sum[c] += v;
            sum_sq[c] += v * v;
        }
        for (k, &(i, j)) in pairs.iter().enumerate() {
            cross[k] += u64::from(px[i]) * u64::from(px[j]);
        }
    }

    if n < 2 {
        return None;
    }

    // n² · variance and n² · covariance, exact
    let n = i128::from(n);
    let spread = |c: usize| n * i128::from(sum_sq[c]) - i128::from(sum[c]).pow(2);

    let correlations: Vec<f64> = pairs
        .iter()
        .zip(&cross)
        .filter_map(|(&(i, j), &xy)| {
            let (var_a, var_b) = (spread(i), spread(j));
            if var_a == 0 || var_b == 0 {
                return None;
            }
            let cov = n * i128::from(xy) - i128::from(sum[i]) * i128::from(sum[j]);
            let r = cov as f64 / ((var_a as f64).sqrt() * (var_b as f64).sqrt());
            Some(r.clamp(-1.0, 1.0).abs())
        })
        .collect();

    if correlations.is_empty() {
        None
    } else {
        Some(correlations.iter().sum::<f64>() / correlations.len() as f64)
    }
}

/// Pearson correlation; `None` when either series has zero variance
pub fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    let n = a.len().min(b.len());
    if n < 2 {
        return None;
    }
    let mean_a = a[..n].iter().sum::<f64>() / n as f64;
    let mean_b = b[..n].iter().sum::<f64>() / n as f64;

    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (x, y) in a[..n].iter().zip(&b[..n]) {
        let (dx, dy) = (x - mean_a, y - mean_b);
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    if var_a == 0.0 || var_b == 0.0 {
        return None;
    }
    Some((cov / (var_a.sqrt() * var_b.sqrt())).clamp(-1.0, 1.0))
}

/// `Σ (p − 1/256)² / (1/256 + ε)` over the normalized 256-bin histogram
pub fn chi_square_vs_uniform(samples: &[u8]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let mut histogram = [0u64; 256];
    for &v in samples {
        histogram[v as usize] += 1;
    }

    let total = samples.len() as f64;
    let expected = 1.0 / 256.0;
    histogram
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            (p - expected).powi(2) / (expected + CHI_EPSILON)
        })
        .sum()
}
