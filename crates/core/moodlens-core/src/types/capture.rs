//! Frames handed over by the capture layer

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default Nyquist frequency of the audio analyser (44.1 kHz sampling)
pub const DEFAULT_NYQUIST_HZ: f64 = 22_050.0;

/// Interleaved 8-bit RGB or RGBA pixel buffer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PixelFrame {
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
    /// Bytes per pixel: 3 (RGB) or 4 (RGBA)
    pub channels: usize,
    /// Row-major pixel data
    pub data: Vec<u8>,
    /// Capture timestamp
    pub captured_at: DateTime<Utc>,
}

impl PixelFrame {
    /// Wrap an RGBA buffer
    pub fn rgba(width: usize, height: usize, data: Vec<u8>, captured_at: DateTime<Utc>) -> Self {
        Self {
            width,
            height,
            channels: 4,
            data,
            captured_at,
        }
    }

    /// Wrap an RGB buffer
    pub fn rgb(width: usize, height: usize, data: Vec<u8>, captured_at: DateTime<Utc>) -> Self {
        Self {
            width,
            height,
            channels: 3,
            data,
            captured_at,
        }
    }

    /// Whether dimensions, channel count and buffer length agree
    pub fn is_well_formed(&self) -> bool {
        self.width > 0
            && self.height > 0
            && (self.channels == 3 || self.channels == 4)
            && self
                .width
                .checked_mul(self.height)
                .and_then(|px| px.checked_mul(self.channels))
                .map(|len| self.data.len() >= len)
                .unwrap_or(false)
    }

    /// RGB triple at (x, y), or `None` outside the buffer
    pub fn rgb_at(&self, x: usize, y: usize) -> Option<(u8, u8, u8)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * self.channels;
        let px = self.data.get(i..i + 3)?;
        Some((px[0], px[1], px[2]))
    }

    /// Mean of the RGB channels at (x, y), in 0..=255
    pub fn brightness_at(&self, x: usize, y: usize) -> Option<f64> {
        self.rgb_at(x, y)
            .map(|(r, g, b)| (r as f64 + g as f64 + b as f64) / 3.0)
    }
}

/// One analyser snapshot of audio: unsigned 8-bit waveform and spectrum
///
/// Waveform bytes are centered on 128, matching the usual analyser
/// byte-domain output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioFrame {
    /// Time-domain samples (may be empty when only a spectrum is available)
    pub time_domain: Vec<u8>,
    /// Frequency-domain magnitudes, one byte per bin
    pub frequency: Vec<u8>,
    /// Nyquist frequency covered by the last bin
    pub nyquist_hz: f64,
    /// Capture timestamp
    pub captured_at: DateTime<Utc>,
}

impl AudioFrame {
    /// Frame at the default 22.05 kHz Nyquist frequency
    pub fn new(time_domain: Vec<u8>, frequency: Vec<u8>, captured_at: DateTime<Utc>) -> Self {
        Self {
            time_domain,
            frequency,
            nyquist_hz: DEFAULT_NYQUIST_HZ,
            captured_at,
        }
    }

    /// Override the Nyquist frequency
    pub fn with_nyquist(mut self, nyquist_hz: f64) -> Self {
        self.nyquist_hz = nyquist_hz;
        self
    }

    /// Whether neither buffer carries data
    pub fn is_empty(&self) -> bool {
        self.time_domain.is_empty() && self.frequency.is_empty()
    }
}

/// Raw text plus its capture time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSample {
    /// Text as typed
    pub text: String,
    /// Capture timestamp
    pub captured_at: DateTime<Utc>,
}

impl TextSample {
    /// Create a sample
    pub fn new(text: impl Into<String>, captured_at: DateTime<Utc>) -> Self {
        Self {
            text: text.into(),
            captured_at,
        }
    }
}

/// Host-side source of captured frames for one modality
///
/// Returning `None` means nothing was available this tick (device busy,
/// permission pending); the loop simply tries again next tick.
#[async_trait]
pub trait CaptureSource: Send {
    /// Frame type produced
    type Frame: Send;

    /// Capture the next frame
    async fn capture(&mut self) -> Option<Self::Frame>;
}
