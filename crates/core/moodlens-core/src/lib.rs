//! MoodLens Core
//!
//! Shared foundation for the multimodal emotion pipeline:
//!
//! - Canonical [`Emotion`] space and the facial/voice/text label taxonomies
//!   with their fixed lookup tables
//! - Observation, fused-state, history and calibration types
//! - Interfaces of the external collaborators (capture sources, calibration
//!   store, history store)
//! - [`ModalitySmoother`], the per-modality EMA + hysteresis filter
//! - Configuration, environment loading and logging
//!
//! # Example
//!
//! ```no_run
//! use moodlens_core::*;
//!
//! fn main() -> Result<()> {
//!     init_logging();
//!     load_env()?;
//!     let config = MoodlensConfig::from_env()?;
//!     let smoother: ModalitySmoother<VoiceTone> = ModalitySmoother::new(config.smoothing);
//!     assert!(smoother.current().is_none());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod smoothing;
pub mod types;
pub mod utils;

pub use config::{
    get_env_bool, get_env_float, get_env_int, load_env, FusionWeights, InterventionPolicy,
    MoodlensConfig, SchedulerConfig, SmoothingConfig, StabilizerConfig, TextStrategy,
};
pub use error::{MoodlensError, Result};
pub use smoothing::{ModalitySmoother, SmoothedReading};
pub use types::*;
pub use utils::{init_logging, subscribe_logs, LogEvent};
