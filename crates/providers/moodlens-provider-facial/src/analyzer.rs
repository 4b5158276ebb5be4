//! Facial pipeline: extract → classify → smooth

use moodlens_core::{FacialEmotion, FacialObservation, ModalitySmoother, PixelFrame, SmoothingConfig};

use crate::classifier::FacialClassifier;
use crate::features::FacialFeatureExtractor;

/// Stateful facial analyzer for one session
#[derive(Debug, Clone)]
pub struct FacialAnalyzer {
    extractor: FacialFeatureExtractor,
    classifier: FacialClassifier,
    smoother: ModalitySmoother<FacialEmotion>,
    frames_seen: u64,
    faces_found: u64,
}

impl FacialAnalyzer {
    /// Analyzer with default profiles
    pub fn new(smoothing: SmoothingConfig) -> Self {
        Self {
            extractor: FacialFeatureExtractor::new(),
            classifier: FacialClassifier::new(),
            smoother: ModalitySmoother::new(smoothing),
            frames_seen: 0,
            faces_found: 0,
        }
    }

    /// Replace the classifier
    pub fn with_classifier(mut self, classifier: FacialClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Analyze one frame; `None` when no face-like region is present
    pub fn analyze(&mut self, frame: &PixelFrame) -> Option<FacialObservation> {
        self.frames_seen += 1;
        let Some(features) = self.extractor.extract(frame) else {
            tracing::debug!(frames_seen = self.frames_seen, "No face region detected");
            return None;
        };
        self.faces_found += 1;

        let raw = self.classifier.classify(&features);
        let smoothed = self.smoother.update(&raw.breakdown, frame.captured_at);

        tracing::debug!(
            raw = %raw.emotion,
            reported = %smoothed.label,
            confidence = smoothed.confidence,
            switched = smoothed.switched,
            "Facial expression classified"
        );

        Some(
            FacialObservation::new(smoothed.label, smoothed.confidence, frame.captured_at)
                .with_breakdown(smoothed.breakdown),
        )
    }

    /// Frames analyzed and faces found so far
    pub fn stats(&self) -> (u64, u64) {
        (self.frames_seen, self.faces_found)
    }

    /// Forget smoothing state (e.g. camera restarted)
    pub fn reset(&mut self) {
        self.smoother.reset();
    }
}

impl Default for FacialAnalyzer {
    fn default() -> Self {
        Self::new(SmoothingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rand::Rng;

    fn skin_frame(seed_noise: u8, at: chrono::DateTime<Utc>) -> PixelFrame {
        let (w, h) = (96usize, 96usize);
        let mut rng = rand::thread_rng();
        let mut data = Vec::with_capacity(w * h * 4);
        for _ in 0..w * h {
            let n = if seed_noise == 0 { 0 } else { rng.gen_range(0..seed_noise) };
            data.extend_from_slice(&[200 - n / 2, 150 - n / 3, 120 - n / 4, 255]);
        }
        PixelFrame::rgba(w, h, data, at)
    }

    #[test]
    fn test_no_face_yields_no_observation() {
        let mut analyzer = FacialAnalyzer::default();
        let frame = PixelFrame::rgb(32, 32, vec![10; 32 * 32 * 3], Utc::now());
        assert!(analyzer.analyze(&frame).is_none());
        assert_eq!(analyzer.stats(), (1, 0));
    }

    #[test]
    fn test_observation_breakdown_sums_to_hundred() {
        let mut analyzer = FacialAnalyzer::default();
        let t0 = Utc::now();
        for i in 0..10 {
            let obs = analyzer
                .analyze(&skin_frame(40, t0 + Duration::seconds(2 * i)))
                .unwrap();
            let total = obs.breakdown.as_ref().unwrap().total();
            assert!((total - 100.0).abs() < 0.01);
            assert!(obs.confidence >= 30.0 && obs.confidence <= 100.0);
        }
    }

    #[test]
    fn test_steady_face_keeps_label() {
        let mut analyzer = FacialAnalyzer::default();
        let t0 = Utc::now();
        let first = analyzer.analyze(&skin_frame(0, t0)).unwrap();
        for i in 1..5 {
            let next = analyzer
                .analyze(&skin_frame(0, t0 + Duration::seconds(2 * i)))
                .unwrap();
            assert_eq!(next.emotion, first.emotion);
        }
    }
}
