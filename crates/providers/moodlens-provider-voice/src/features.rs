//! Acoustic feature extraction from analyser byte buffers

use moodlens_core::{AudioFrame, SpeakingRate};
use serde::{Deserialize, Serialize};

/// Lower edge of the voiced pitch band
pub const PITCH_BAND_LOW_HZ: f64 = 80.0;
/// Upper edge of the voiced pitch band
pub const PITCH_BAND_HIGH_HZ: f64 = 400.0;
/// Pitch reported values are clamped into this range
pub const PITCH_RANGE_HZ: (f64, f64) = (40.0, 400.0);

/// Energy damping when only a spectrum is available
const SPECTRUM_ENERGY_SCALE: f64 = 0.7;

/// Acoustic description of one audio frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcousticFeatures {
    /// RMS energy, 0..=1
    pub energy: f64,
    /// Dominant pitch within the voice band, 40..=400 Hz
    pub pitch_hz: f64,
    /// Amplitude-weighted mean frequency bin
    pub spectral_centroid: f64,
    /// Number of frequency bins the centroid refers to
    pub bin_count: usize,
    /// Fraction of adjacent samples with a sign change
    pub zero_crossing_rate: f64,
    /// Tempo bucket
    pub speaking_rate: SpeakingRate,
}

impl AcousticFeatures {
    /// Centroid as a fraction of the spectrum, 0..=1
    pub fn spectral_brightness(&self) -> f64 {
        if self.bin_count == 0 {
            0.0
        } else {
            self.spectral_centroid / self.bin_count as f64
        }
    }

    /// Vocal intensity on the 0..=100 scale
    pub fn intensity(&self) -> f64 {
        (self.energy * 200.0).min(100.0).round()
    }
}

/// Derives [`AcousticFeatures`] from an [`AudioFrame`]
#[derive(Debug, Clone, Default)]
pub struct AcousticFeatureExtractor;

impl AcousticFeatureExtractor {
    /// Create an extractor
    pub fn new() -> Self {
        Self
    }

    /// Extract features; `None` when the frame carries no samples
    pub fn extract(&self, frame: &AudioFrame) -> Option<AcousticFeatures> {
        if frame.is_empty() {
            return None;
        }

        let (energy, zcr) = if frame.time_domain.is_empty() {
            (
                spectrum_energy(&frame.frequency),
                zero_crossing_rate(&frame.frequency),
            )
        } else {
            (
                waveform_energy(&frame.time_domain),
                zero_crossing_rate(&frame.time_domain),
            )
        };

        Some(AcousticFeatures {
            energy,
            pitch_hz: dominant_pitch(&frame.frequency, frame.nyquist_hz),
            spectral_centroid: spectral_centroid(&frame.frequency),
            bin_count: frame.frequency.len(),
            zero_crossing_rate: zcr,
            speaking_rate: speaking_rate(energy, zcr),
        })
    }
}

/// RMS of the waveform re-centered on 128 and scaled to [-1, 1]
pub fn waveform_energy(samples: &[u8]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples
        .iter()
        .map(|s| {
            let v = (*s as f64 - 128.0) / 128.0;
            v * v
        })
        .sum();
    (sum / samples.len() as f64).sqrt().min(1.0)
}

/// Energy estimate from spectrum magnitudes alone
pub fn spectrum_energy(bins: &[u8]) -> f64 {
    if bins.is_empty() {
        return 0.0;
    }
    let sum: f64 = bins
        .iter()
        .map(|b| {
            let v = *b as f64 / 255.0;
            v * v
        })
        .sum();
    ((sum / bins.len() as f64).sqrt() * SPECTRUM_ENERGY_SCALE).min(1.0)
}

/// Strongest bin inside the 80–400 Hz band, converted to Hz
pub fn dominant_pitch(bins: &[u8], nyquist_hz: f64) -> f64 {
    let n = bins.len();
    if n == 0 || nyquist_hz.is_nan() || nyquist_hz <= 0.0 {
        return PITCH_RANGE_HZ.0;
    }
    let bin_hz = nyquist_hz / n as f64;
    let low = ((PITCH_BAND_LOW_HZ / bin_hz).floor() as usize).max(1);
    let high = ((PITCH_BAND_HIGH_HZ / bin_hz).floor() as usize).min(n);

    let mut best_bin = 0usize;
    let mut best_value = 0u8;
    for (i, value) in bins.iter().enumerate().take(high).skip(low) {
        if *value > best_value {
            best_value = *value;
            best_bin = i;
        }
    }
    (best_bin as f64 * bin_hz).clamp(PITCH_RANGE_HZ.0, PITCH_RANGE_HZ.1)
}

/// Amplitude-weighted mean bin index
pub fn spectral_centroid(bins: &[u8]) -> f64 {
    let total: f64 = bins.iter().map(|b| *b as f64).sum();
    if total <= 0.0 {
        return 0.0;
    }
    let weighted: f64 = bins
        .iter()
        .enumerate()
        .map(|(i, b)| i as f64 * *b as f64)
        .sum();
    weighted / total
}

/// Fraction of adjacent samples crossing the 128 midpoint
pub fn zero_crossing_rate(samples: &[u8]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let crossings = samples
        .windows(2)
        .filter(|w| (w[0] as f64 - 128.0) * (w[1] as f64 - 128.0) < 0.0)
        .count();
    crossings as f64 / samples.len() as f64
}

/// Tempo bucket from overall vocal activity
pub fn speaking_rate(energy: f64, zero_crossing_rate: f64) -> SpeakingRate {
    let activity = energy * (1.0 + zero_crossing_rate);
    if activity < 0.2 {
        SpeakingRate::Slow
    } else if activity < 0.6 {
        SpeakingRate::Normal
    } else {
        SpeakingRate::Fast
    }
}
