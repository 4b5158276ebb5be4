//! Personalized confidence calibration

use moodlens_core::{CalibrationMap, Emotion};

/// Applies personalized multipliers to the winning emotion's confidence
#[derive(Debug, Clone, Default)]
pub struct Calibrator {
    map: CalibrationMap,
}

impl Calibrator {
    /// Calibrator over a map
    pub fn new(map: CalibrationMap) -> Self {
        Self { map }
    }

    /// Multiplier for an emotion (1.0 when uncalibrated)
    pub fn multiplier(&self, emotion: Emotion) -> f64 {
        self.map.multiplier(emotion)
    }

    /// Calibrated confidence, re-clamped to 1..=100
    pub fn apply(&self, emotion: Emotion, confidence: u8) -> u8 {
        let m = self.multiplier(emotion);
        let calibrated = (confidence as f64 * m).round().clamp(1.0, 100.0) as u8;
        if calibrated != confidence {
            tracing::trace!(
                emotion = %emotion,
                multiplier = m,
                from = confidence,
                to = calibrated,
                "Calibrated confidence"
            );
        }
        calibrated
    }
}
