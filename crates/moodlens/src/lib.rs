//! # MoodLens
//!
//! On-device multimodal emotion inference. Camera frames, microphone
//! buffers and typed text are classified by independent, deterministic
//! analyzers; their latest observations are fused into one emotion state
//! with a confidence, an uncertainty and an optional supportive
//! intervention.
//!
//! ## Crates
//!
//! - `moodlens-core` (re-exported at the root): shared types,
//!   configuration, logging and collaborator traits
//! - [`facial`], [`voice`], [`text`]: per-modality analyzers
//! - [`fusion`]: weighted fusion, calibration and temporal stabilization
//! - [`storage`]: in-memory calibration and history stores
//!
//! This crate adds the per-session runtime: [`MoodlensSession`] owns all
//! pipeline state for one user and [`MoodlensService`] drives it with one
//! periodic task per modality plus a fusion task.
//!
//! ## Example
//!
//! ```no_run
//! use chrono::Utc;
//! use moodlens::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     init_logging();
//!     load_env()?;
//!
//!     let session = MoodlensSession::new(MoodlensConfig::from_env()?)?;
//!     session
//!         .submit_text(&TextSample::new("I am so stressed about this deadline", Utc::now()))
//!         .await;
//!     if let Some(state) = session.tick(Utc::now()).await {
//!         println!("{} ({}%)", state.primary_emotion, state.confidence);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod runtime;
pub mod service;
pub mod session;

pub use moodlens_plugin_fusion as fusion;
pub use moodlens_provider_facial as facial;
pub use moodlens_provider_text as text;
pub use moodlens_provider_voice as voice;
pub use moodlens_storage_memory as storage;

pub use moodlens_core::*;
pub use runtime::ModalityBuffers;
pub use service::{MoodlensService, ServiceTask};
pub use session::MoodlensSession;

/// Commonly used types
pub mod prelude {
    pub use crate::{ModalityBuffers, MoodlensService, MoodlensSession, ServiceTask};
    pub use moodlens_core::{
        init_logging, load_env, subscribe_logs, AudioFrame, CalibrationMap, CalibrationStore,
        CaptureSource, Emotion, FusedEmotionState, HistoryEntry, HistoryStore, InterventionType,
        LogEvent, Modality, MoodlensConfig, MoodlensError, PixelFrame, Result, TextSample,
    };
    pub use moodlens_plugin_fusion::{FusionContext, FusionEngine, FusionPipeline};
    pub use moodlens_storage_memory::{MemoryCalibrationStore, MemoryHistoryStore};
}
