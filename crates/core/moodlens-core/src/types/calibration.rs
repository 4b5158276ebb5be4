//! Personalized confidence calibration

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Emotion;

/// Lower bound of a calibration multiplier
pub const MIN_MULTIPLIER: f64 = 0.6;
/// Upper bound of a calibration multiplier
pub const MAX_MULTIPLIER: f64 = 1.6;
/// Confidence every emotion is pulled toward
pub const REFERENCE_CONFIDENCE: f64 = 50.0;
/// Average confidence at or below which no multiplier is derived
pub const MIN_CALIBRATION_AVERAGE: f64 = 5.0;

/// Emotion → confidence multiplier in [0.6, 1.6]
///
/// Missing emotions calibrate with 1.0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationMap {
    multipliers: BTreeMap<Emotion, f64>,
}

impl CalibrationMap {
    /// Identity calibration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a multiplier, clamped into range (non-finite values become 1.0)
    pub fn set(&mut self, emotion: Emotion, multiplier: f64) {
        let m = if multiplier.is_finite() {
            multiplier.clamp(MIN_MULTIPLIER, MAX_MULTIPLIER)
        } else {
            1.0
        };
        self.multipliers.insert(emotion, m);
    }

    /// Builder form of [`CalibrationMap::set`]
    pub fn with(mut self, emotion: Emotion, multiplier: f64) -> Self {
        self.set(emotion, multiplier);
        self
    }

    /// Multiplier for an emotion
    pub fn multiplier(&self, emotion: Emotion) -> f64 {
        self.multipliers.get(&emotion).copied().unwrap_or(1.0)
    }

    /// Whether no emotion has been calibrated yet
    pub fn is_empty(&self) -> bool {
        self.multipliers.is_empty()
    }

    /// Iterate (emotion, multiplier) for calibrated emotions
    pub fn iter(&self) -> impl Iterator<Item = (Emotion, f64)> + '_ {
        self.multipliers.iter().map(|(e, m)| (*e, *m))
    }

    /// Multiplier derived from a user's average observed confidence
    ///
    /// `clamp(50 / avg, 0.6, 1.6)`; averages of 5 or less give 1.0.
    pub fn multiplier_for_average(average: f64) -> f64 {
        if !average.is_finite() || average <= MIN_CALIBRATION_AVERAGE {
            return 1.0;
        }
        (REFERENCE_CONFIDENCE / average).clamp(MIN_MULTIPLIER, MAX_MULTIPLIER)
    }
}

/// One raw baseline observation handed to the calibration store
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineSample {
    /// Observed emotion
    pub emotion: Emotion,
    /// Observed confidence in 0..=100
    pub confidence: u8,
    /// Observation time
    pub timestamp: DateTime<Utc>,
}

impl BaselineSample {
    /// Create a sample
    pub fn new(emotion: Emotion, confidence: u8, timestamp: DateTime<Utc>) -> Self {
        Self {
            emotion,
            confidence,
            timestamp,
        }
    }
}
