//! Attention-weighted tone classifier
//!
//! Raw acoustic features are squashed with `tanh` around reference values
//! into a five-dimensional embedding. Each tone owns an attention vector
//! (relative importance of each embedding dimension) and a signed scoring
//! rule; the five scores go through a temperature softmax.

use moodlens_core::utils::{softmax, squash};
use moodlens_core::{Breakdown, Label, VoiceTone};
use serde::{Deserialize, Serialize};

use crate::features::AcousticFeatures;

/// Softmax temperature divisor
pub const DEFAULT_TEMPERATURE: f64 = 50.0;

const ENERGY_REFERENCE: f64 = 0.1;
const PITCH_REFERENCE_HZ: f64 = 150.0;
const PITCH_SCALE_HZ: f64 = 100.0;
const BRIGHTNESS_REFERENCE: f64 = 0.15;
const ZCR_REFERENCE: f64 = 0.1;

/// Bounded acoustic embedding, each dimension in -1..=1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceEmbedding {
    /// Loudness relative to conversational speech
    pub energy: f64,
    /// Pitch relative to a mid-range voice
    pub pitch: f64,
    /// Spectral brightness
    pub spectral: f64,
    /// Noisiness / articulation rate
    pub zcr: f64,
    /// Tempo: -1 slow, 0 normal, 1 fast
    pub rate: f64,
}

impl VoiceEmbedding {
    /// Embed acoustic features
    pub fn from_features(features: &AcousticFeatures) -> Self {
        Self {
            energy: squash((features.energy - ENERGY_REFERENCE) * 10.0),
            pitch: squash((features.pitch_hz - PITCH_REFERENCE_HZ) / PITCH_SCALE_HZ),
            spectral: squash((features.spectral_brightness() - BRIGHTNESS_REFERENCE) * 10.0),
            zcr: squash((features.zero_crossing_rate - ZCR_REFERENCE) * 10.0),
            rate: features.speaking_rate.embedding(),
        }
    }
}

/// Per-tone importance of each embedding dimension
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttentionWeights {
    /// Energy weight
    pub energy: f64,
    /// Pitch weight
    pub pitch: f64,
    /// Spectral weight
    pub spectral: f64,
    /// Zero-crossing weight
    pub zcr: f64,
    /// Tempo weight
    pub rate: f64,
}

impl AttentionWeights {
    /// Built-in attention vector for a tone
    pub fn for_tone(tone: VoiceTone) -> Self {
        let (energy, pitch, spectral, zcr, rate) = match tone {
            VoiceTone::Calm => (0.3, 0.2, 0.2, 0.1, 0.2),
            VoiceTone::Stressed => (0.25, 0.25, 0.2, 0.15, 0.15),
            VoiceTone::Excited => (0.35, 0.3, 0.2, 0.05, 0.1),
            VoiceTone::Frustrated => (0.2, 0.15, 0.15, 0.35, 0.15),
            VoiceTone::Tired => (0.4, 0.25, 0.2, 0.05, 0.1),
        };
        Self {
            energy,
            pitch,
            spectral,
            zcr,
            rate,
        }
    }
}

/// Raw (unsmoothed) tone classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceClassification {
    /// Winning tone
    pub tone: VoiceTone,
    /// Winning probability as a percentage, floored at 30
    pub confidence: f64,
    /// Distribution over tones
    pub breakdown: Breakdown<VoiceTone>,
    /// Embedding the scores were computed from
    pub embedding: VoiceEmbedding,
}

/// Scores acoustic features into tone probabilities
#[derive(Debug, Clone)]
pub struct VoiceClassifier {
    temperature: f64,
}

impl Default for VoiceClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl VoiceClassifier {
    /// Classifier with the default temperature
    pub fn new() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Override the softmax temperature
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Unnormalized score of one tone
    pub fn score(&self, tone: VoiceTone, e: &VoiceEmbedding) -> f64 {
        let w = AttentionWeights::for_tone(tone);
        let pos = |v: f64| v.max(0.0);
        match tone {
            // Calm rewards low energy, low pitch and a slow tempo
            VoiceTone::Calm => {
                50.0 - e.energy * 100.0 * w.energy
                    - e.pitch * 80.0 * w.pitch
                    - e.spectral * 70.0 * w.spectral
                    - e.zcr * 50.0 * w.zcr
                    - e.rate * 60.0 * w.rate
            }
            VoiceTone::Stressed => {
                e.energy * 120.0 * w.energy
                    + e.pitch * 100.0 * w.pitch
                    + e.spectral * 80.0 * w.spectral
                    + e.zcr * 90.0 * w.zcr
                    + e.rate * 70.0 * w.rate
            }
            VoiceTone::Excited => {
                pos(e.energy) * 150.0 * w.energy
                    + pos(e.pitch) * 130.0 * w.pitch
                    + pos(e.spectral) * 100.0 * w.spectral
                    + pos(e.rate) * 80.0 * w.rate
            }
            // Irregular pitch combined with noisy articulation
            VoiceTone::Frustrated => {
                e.pitch.abs() * e.zcr * 100.0 * w.zcr
                    + (e.energy - 0.3).abs() * 80.0 * w.energy
                    + e.zcr * 120.0 * w.zcr
            }
            VoiceTone::Tired => {
                pos(-e.energy) * 140.0 * w.energy
                    + pos(-e.pitch) * 110.0 * w.pitch
                    + pos(-e.spectral) * 90.0 * w.spectral
                    + pos(-e.rate) * 70.0 * w.rate
            }
        }
    }

    /// Classify one feature set
    pub fn classify(&self, features: &AcousticFeatures) -> VoiceClassification {
        let embedding = VoiceEmbedding::from_features(features);
        let scores: Vec<f64> = VoiceTone::ALL
            .iter()
            .map(|tone| self.score(*tone, &embedding))
            .collect();
        let probs = softmax(&scores, self.temperature);
        let breakdown = Breakdown::from_scores(VoiceTone::ALL.iter().copied().zip(probs));
        let (tone, share) = breakdown.top();

        tracing::trace!(?embedding, ?scores, "Voice tone scores");

        VoiceClassification {
            tone,
            confidence: share.clamp(30.0, 100.0).round(),
            breakdown,
            embedding,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moodlens_core::SpeakingRate;
    use rand::Rng;

    fn features(energy: f64, pitch: f64, brightness: f64, zcr: f64, rate: SpeakingRate) -> AcousticFeatures {
        AcousticFeatures {
            energy,
            pitch_hz: pitch,
            spectral_centroid: brightness * 1000.0,
            bin_count: 1000,
            zero_crossing_rate: zcr,
            speaking_rate: rate,
        }
    }

    #[test]
    fn test_energetic_high_voice_is_excited() {
        let c = VoiceClassifier::new().classify(&features(0.35, 260.0, 0.3, 0.15, SpeakingRate::Normal));
        assert_eq!(c.tone, VoiceTone::Excited);
        assert!(c.breakdown.get(VoiceTone::Stressed) > c.breakdown.get(VoiceTone::Calm));
    }

    #[test]
    fn test_quiet_low_voice_is_calm() {
        let c = VoiceClassifier::new().classify(&features(0.02, 90.0, 0.05, 0.02, SpeakingRate::Slow));
        assert_eq!(c.tone, VoiceTone::Calm);
        assert_eq!(c.breakdown.ranked()[1].0, VoiceTone::Tired);
    }

    #[test]
    fn test_noisy_articulation_is_frustrated() {
        let c = VoiceClassifier::new().classify(&features(0.1, 260.0, 0.3, 0.5, SpeakingRate::Fast));
        assert_eq!(c.tone, VoiceTone::Frustrated);
    }

    #[test]
    fn test_attention_rows_sum_to_one() {
        for tone in VoiceTone::ALL {
            let w = AttentionWeights::for_tone(*tone);
            let sum = w.energy + w.pitch + w.spectral + w.zcr + w.rate;
            assert!((sum - 1.0).abs() < 1e-9, "{tone}");
        }
    }

    #[test]
    fn test_random_features_sum_to_hundred() {
        let mut rng = rand::thread_rng();
        let classifier = VoiceClassifier::new();
        for _ in 0..200 {
            let rate = match rng.gen_range(0..3) {
                0 => SpeakingRate::Slow,
                1 => SpeakingRate::Normal,
                _ => SpeakingRate::Fast,
            };
            let c = classifier.classify(&features(
                rng.gen_range(0.0..1.0),
                rng.gen_range(40.0..400.0),
                rng.gen_range(0.0..1.0),
                rng.gen_range(0.0..1.0),
                rate,
            ));
            assert!((c.breakdown.total() - 100.0).abs() < 0.01);
            assert!(c.confidence >= 30.0);
        }
    }
}
