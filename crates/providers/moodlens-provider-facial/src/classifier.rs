//! Naive-Gaussian expression classifier
//!
//! Each expression has a profile of (feature, mean, std) triples. The score
//! of an expression is the geometric mean of its feature likelihoods, i.e.
//! the product of Gaussian densities with the N-th root taken so profiles
//! with different feature counts compare on one scale. The product is
//! evaluated in log space so extreme ratios cannot underflow every score
//! to zero.

use moodlens_core::utils::gaussian_log_pdf;
use moodlens_core::{Breakdown, FacialEmotion, Label};
use serde::{Deserialize, Serialize};

use crate::features::{FacialFeature, FacialFeatures};

/// Lowest confidence reported for a detected face
pub const CONFIDENCE_FLOOR: f64 = 30.0;

/// Expected distribution of one feature under an expression
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureStat {
    /// Feature
    pub feature: FacialFeature,
    /// Mean
    pub mean: f64,
    /// Standard deviation
    pub std_dev: f64,
}

const fn stat(feature: FacialFeature, mean: f64, std_dev: f64) -> FeatureStat {
    FeatureStat {
        feature,
        mean,
        std_dev,
    }
}

/// Feature profile of one expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionProfile {
    /// Expression
    pub emotion: FacialEmotion,
    /// Feature statistics
    pub stats: Vec<FeatureStat>,
}

impl ExpressionProfile {
    /// Mean log-likelihood of the features under this profile
    pub fn mean_log_likelihood(&self, features: &FacialFeatures) -> f64 {
        if self.stats.is_empty() {
            return f64::NEG_INFINITY;
        }
        let sum: f64 = self
            .stats
            .iter()
            .map(|s| gaussian_log_pdf(features.value(s.feature), s.mean, s.std_dev))
            .sum();
        sum / self.stats.len() as f64
    }
}

/// Built-in profiles for every expression
pub fn default_profiles() -> Vec<ExpressionProfile> {
    use FacialFeature::*;

    FacialEmotion::ALL
        .iter()
        .map(|emotion| {
            let stats = match emotion {
                FacialEmotion::Happy => vec![
                    stat(LowerMiddleRatio, 1.15, 0.25),
                    stat(EdgeDensity, 0.15, 0.08),
                    stat(AvgBrightness, 0.5, 0.15),
                    stat(ColorVariance, 0.15, 0.1),
                ],
                FacialEmotion::Sad => vec![
                    stat(LowerMiddleRatio, 0.85, 0.2),
                    stat(EdgeDensity, 0.08, 0.05),
                    stat(AvgBrightness, 0.35, 0.12),
                    stat(ColorVariance, 0.1, 0.08),
                ],
                FacialEmotion::Angry => vec![
                    stat(UpperMiddleRatio, 0.85, 0.2),
                    stat(EdgeDensity, 0.22, 0.08),
                    stat(AvgBrightness, 0.42, 0.15),
                    stat(ColorVariance, 0.18, 0.1),
                ],
                FacialEmotion::Fearful => vec![
                    stat(UpperMiddleRatio, 1.1, 0.2),
                    stat(EdgeDensity, 0.18, 0.08),
                    stat(AvgBrightness, 0.48, 0.15),
                    stat(ColorVariance, 0.22, 0.1),
                ],
                FacialEmotion::Disgusted => vec![
                    stat(UpperMiddleRatio, 1.05, 0.2),
                    stat(EdgeDensity, 0.2, 0.08),
                    stat(AvgBrightness, 0.4, 0.15),
                    stat(ColorVariance, 0.16, 0.1),
                ],
                FacialEmotion::Surprised => vec![
                    stat(UpperMiddleRatio, 1.2, 0.25),
                    stat(EdgeDensity, 0.25, 0.1),
                    stat(AvgBrightness, 0.52, 0.15),
                    stat(ColorVariance, 0.25, 0.12),
                ],
                FacialEmotion::Neutral => vec![
                    stat(UpperMiddleRatio, 1.0, 0.12),
                    stat(LowerMiddleRatio, 1.0, 0.12),
                    stat(EdgeDensity, 0.13, 0.06),
                    stat(AvgBrightness, 0.45, 0.15),
                    stat(ColorVariance, 0.12, 0.08),
                ],
            };
            ExpressionProfile {
                emotion: *emotion,
                stats,
            }
        })
        .collect()
}

/// Raw (unsmoothed) facial classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacialClassification {
    /// Winning expression
    pub emotion: FacialEmotion,
    /// Winning share, floored at 30
    pub confidence: f64,
    /// Distribution over all expressions
    pub breakdown: Breakdown<FacialEmotion>,
}

/// Scores facial features against the expression profiles
#[derive(Debug, Clone)]
pub struct FacialClassifier {
    profiles: Vec<ExpressionProfile>,
}

impl Default for FacialClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl FacialClassifier {
    /// Classifier with the built-in profiles
    pub fn new() -> Self {
        Self {
            profiles: default_profiles(),
        }
    }

    /// Classifier with custom profiles
    pub fn with_profiles(profiles: Vec<ExpressionProfile>) -> Self {
        Self { profiles }
    }

    /// Profiles in use
    pub fn profiles(&self) -> &[ExpressionProfile] {
        &self.profiles
    }

    /// Classify one feature vector
    pub fn classify(&self, features: &FacialFeatures) -> FacialClassification {
        let log_scores: Vec<(FacialEmotion, f64)> = self
            .profiles
            .iter()
            .map(|p| (p.emotion, p.mean_log_likelihood(features)))
            .collect();
        let max = log_scores
            .iter()
            .map(|(_, s)| *s)
            .fold(f64::NEG_INFINITY, f64::max);

        let breakdown = if max.is_finite() {
            Breakdown::from_scores(log_scores.into_iter().map(|(e, s)| (e, (s - max).exp())))
        } else {
            Breakdown::from_scores(FacialEmotion::ALL.iter().map(|e| (*e, 1.0)))
        };

        let (emotion, share) = breakdown.top();
        FacialClassification {
            emotion,
            confidence: share.clamp(CONFIDENCE_FLOOR, 100.0).round(),
            breakdown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::FaceRegion;

    fn features(upper: f64, middle: f64, lower: f64, edges: f64, variance: f64) -> FacialFeatures {
        FacialFeatures {
            upper_brightness: upper,
            middle_brightness: middle,
            lower_brightness: lower,
            edge_density: edges,
            color_variance: variance,
            region: FaceRegion {
                x: 0,
                y: 0,
                width: 100,
                height: 100,
            },
        }
    }

    #[test]
    fn test_every_expression_has_a_profile() {
        let profiles = default_profiles();
        assert_eq!(profiles.len(), FacialEmotion::ALL.len());
        assert!(profiles.iter().all(|p| !p.stats.is_empty()));
    }

    #[test]
    fn test_balanced_face_reads_neutral() {
        let c = FacialClassifier::new().classify(&features(0.45, 0.45, 0.45, 0.13, 0.12));
        assert_eq!(c.emotion, FacialEmotion::Neutral);
    }

    #[test]
    fn test_dark_flat_face_reads_sad() {
        let c = FacialClassifier::new().classify(&features(0.3, 0.38, 0.3, 0.06, 0.08));
        assert_eq!(c.emotion, FacialEmotion::Sad);
    }

    #[test]
    fn test_bright_lower_face_reads_happy() {
        let c = FacialClassifier::new().classify(&features(0.45, 0.45, 0.58, 0.15, 0.15));
        assert_eq!(c.emotion, FacialEmotion::Happy);
    }

    #[test]
    fn test_bright_busy_upper_face_reads_surprised() {
        let c = FacialClassifier::new().classify(&features(0.62, 0.5, 0.45, 0.3, 0.28));
        assert_eq!(c.emotion, FacialEmotion::Surprised);
    }

    #[test]
    fn test_breakdown_sums_to_hundred_and_floor() {
        let c = FacialClassifier::new().classify(&features(0.9, 0.0, 0.9, 0.9, 0.9));
        assert!((c.breakdown.total() - 100.0).abs() < 0.01);
        assert!(c.confidence >= CONFIDENCE_FLOOR && c.confidence <= 100.0);
    }

    #[test]
    fn test_empty_profiles_split_evenly() {
        let c = FacialClassifier::with_profiles(Vec::new())
            .classify(&features(0.5, 0.5, 0.5, 0.1, 0.1));
        assert!((c.breakdown.total() - 100.0).abs() < 0.01);
        assert_eq!(c.confidence, CONFIDENCE_FLOOR);
    }
}
