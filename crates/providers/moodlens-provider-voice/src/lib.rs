//! Voice Tone Provider for MoodLens
//!
//! Turns analyser byte buffers into a vocal tone observation:
//!
//! - **Features**: RMS energy, dominant pitch in the 80–400 Hz band,
//!   spectral centroid, zero-crossing rate and a speaking-rate bucket
//! - **Classification**: `tanh` embeddings scored per tone through a fixed
//!   attention table, then a temperature softmax
//! - **Smoothing**: per-session EMA + hysteresis, with a silence gate in
//!   front so quiet frames never reach the classifier
//!
//! Tones: calm, stressed, excited, frustrated, tired.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analyzer;
pub mod classifier;
pub mod features;

pub use analyzer::{VoiceAnalyzer, DEFAULT_SILENCE_FLOOR};
pub use classifier::{AttentionWeights, VoiceClassification, VoiceClassifier, VoiceEmbedding};
pub use features::{AcousticFeatureExtractor, AcousticFeatures};
