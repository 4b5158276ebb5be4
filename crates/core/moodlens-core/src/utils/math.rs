//! Numeric helpers shared by the classifiers

use std::f64::consts::PI;

/// Numerically stable softmax with a temperature divisor
///
/// Returns an empty vector for empty input. A non-positive temperature is
/// treated as 1.0.
pub fn softmax(logits: &[f64], temperature: f64) -> Vec<f64> {
    if logits.is_empty() {
        return Vec::new();
    }
    let t = if temperature > 0.0 { temperature } else { 1.0 };
    let scaled: Vec<f64> = logits.iter().map(|l| l / t).collect();
    let max = scaled.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scaled.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    if !sum.is_finite() || sum <= 0.0 {
        let uniform = 1.0 / logits.len() as f64;
        return vec![uniform; logits.len()];
    }
    exps.into_iter().map(|e| e / sum).collect()
}

/// Gaussian probability density
pub fn gaussian_pdf(value: f64, mean: f64, std_dev: f64) -> f64 {
    let s = std_dev.max(f64::EPSILON);
    let z = value - mean;
    (-(z * z) / (2.0 * s * s)).exp() / (s * (2.0 * PI).sqrt())
}

/// Natural log of the Gaussian density, finite for any finite input
pub fn gaussian_log_pdf(value: f64, mean: f64, std_dev: f64) -> f64 {
    let s = std_dev.max(f64::EPSILON);
    let z = value - mean;
    -(z * z) / (2.0 * s * s) - (s * (2.0 * PI).sqrt()).ln()
}

/// Clamp to the 0..=100 percentage scale
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

/// Round and clamp to an integer percentage within `min..=100`
pub fn round_percent(value: f64, min: u8) -> u8 {
    let rounded = clamp_percent(value).round() as u8;
    rounded.clamp(min.min(100), 100)
}

/// Hyperbolic tangent squashing used by the acoustic embeddings
pub fn squash(value: f64) -> f64 {
    value.tanh()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0], 1.0);
        let sum: f64 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);
    }

    #[test]
    fn test_softmax_is_stable_for_large_logits() {
        let probs = softmax(&[1000.0, 1001.0], 1.0);
        assert!(probs.iter().all(|p| p.is_finite()));
        assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_softmax_temperature_flattens() {
        let sharp = softmax(&[0.0, 50.0], 1.0);
        let flat = softmax(&[0.0, 50.0], 50.0);
        assert!(sharp[1] > flat[1]);
    }

    #[test]
    fn test_softmax_empty() {
        assert!(softmax(&[], 1.0).is_empty());
    }

    #[test]
    fn test_gaussian_peak_at_mean() {
        assert!(gaussian_pdf(0.5, 0.5, 0.1) > gaussian_pdf(0.6, 0.5, 0.1));
        let expected = gaussian_pdf(0.3, 0.5, 0.2).ln();
        assert!((gaussian_log_pdf(0.3, 0.5, 0.2) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_log_pdf_finite_far_from_mean() {
        assert_eq!(gaussian_pdf(1000.0, 1.0, 0.12), 0.0);
        assert!(gaussian_log_pdf(1000.0, 1.0, 0.12).is_finite());
    }

    #[test]
    fn test_round_percent() {
        assert_eq!(round_percent(12.4, 30), 30);
        assert_eq!(round_percent(130.0, 1), 100);
        assert_eq!(round_percent(f64::NAN, 1), 1);
        assert_eq!(round_percent(66.6, 1), 67);
    }
}
