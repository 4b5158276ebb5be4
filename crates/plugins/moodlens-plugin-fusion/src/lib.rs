//! Multimodal Fusion Plugin for MoodLens
//!
//! Combines the latest facial, voice and text observations into one
//! [`FusedEmotionState`](moodlens_core::FusedEmotionState):
//!
//! - [`FusionEngine`]: weighted voting across modalities, personal
//!   calibration, uncertainty and the intervention decision
//! - [`TemporalStabilizer`]: sliding-window hysteresis so the reported
//!   emotion does not flicker between ticks
//! - [`FusionPipeline`]: engine plus stabilizer as one per-session unit
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use moodlens_core::{Emotion, FacialEmotion, FacialObservation, ModalitySnapshot};
//! use moodlens_plugin_fusion::{FusionContext, FusionEngine};
//!
//! let now = Utc::now();
//! let snapshot = ModalitySnapshot::new()
//!     .with_facial(FacialObservation::new(FacialEmotion::Happy, 90.0, now));
//! let state = FusionEngine::default()
//!     .fuse(&snapshot, &FusionContext::new(), now)
//!     .unwrap();
//! assert_eq!(state.primary_emotion, Emotion::Happy);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod calibrator;
pub mod engine;
pub mod pipeline;
pub mod stabilizer;

pub use calibrator::Calibrator;
pub use engine::{agreed_emotion, FusionContext, FusionEngine};
pub use pipeline::FusionPipeline;
pub use stabilizer::{StabilizedReading, StabilizerOutcome, TemporalStabilizer};
