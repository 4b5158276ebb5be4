//! Voice pipeline: silence gate → extract → classify → smooth

use moodlens_core::{AudioFrame, ModalitySmoother, SmoothingConfig, VoiceObservation, VoiceTone};

use crate::classifier::VoiceClassifier;
use crate::features::AcousticFeatureExtractor;

/// Default RMS energy below which a frame is silence
pub const DEFAULT_SILENCE_FLOOR: f64 = 0.01;

/// Stateful voice analyzer for one session
#[derive(Debug, Clone)]
pub struct VoiceAnalyzer {
    extractor: AcousticFeatureExtractor,
    classifier: VoiceClassifier,
    smoother: ModalitySmoother<VoiceTone>,
    silence_floor: f64,
}

impl VoiceAnalyzer {
    /// Analyzer with the given smoothing and silence floor
    pub fn new(smoothing: SmoothingConfig, silence_floor: f64) -> Self {
        Self {
            extractor: AcousticFeatureExtractor::new(),
            classifier: VoiceClassifier::new(),
            smoother: ModalitySmoother::new(smoothing),
            silence_floor,
        }
    }

    /// Replace the classifier
    pub fn with_classifier(mut self, classifier: VoiceClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Analyze one frame; `None` for empty frames and silence
    ///
    /// Silent frames leave the smoothing state untouched.
    pub fn analyze(&mut self, frame: &AudioFrame) -> Option<VoiceObservation> {
        let features = self.extractor.extract(frame)?;
        if features.energy < self.silence_floor {
            tracing::trace!(energy = features.energy, "Silence, no voice observation");
            return None;
        }

        let raw = self.classifier.classify(&features);
        let smoothed = self.smoother.update(&raw.breakdown, frame.captured_at);

        tracing::debug!(
            raw = %raw.tone,
            reported = %smoothed.label,
            confidence = smoothed.confidence,
            intensity = features.intensity(),
            pitch_hz = features.pitch_hz,
            "Voice tone classified"
        );

        Some(VoiceObservation {
            tone: smoothed.label,
            confidence: smoothed.confidence,
            intensity: features.intensity(),
            energy: features.energy,
            pitch_hz: features.pitch_hz,
            speaking_rate: features.speaking_rate,
            breakdown: Some(smoothed.breakdown),
            timestamp: frame.captured_at,
        })
    }

    /// Forget smoothing state (e.g. microphone restarted)
    pub fn reset(&mut self) {
        self.smoother.reset();
    }
}

impl Default for VoiceAnalyzer {
    fn default() -> Self {
        Self::new(SmoothingConfig::default(), DEFAULT_SILENCE_FLOOR)
    }
}
