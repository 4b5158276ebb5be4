//! Facial Expression Provider for MoodLens
//!
//! Classifies a face from a raw pixel buffer in three steps:
//!
//! 1. **Region**: sample a coarse grid for YCbCr skin tones and take the
//!    bounding box of the matches (abstains below 100 matches)
//! 2. **Features**: brightness of the upper/middle/lower thirds, edge
//!    density and brightness spread, plus derived ratios
//! 3. **Classification**: naive-Gaussian expression profiles, followed by
//!    per-session EMA + hysteresis smoothing
//!
//! ```rust,ignore
//! use moodlens_provider_facial::FacialAnalyzer;
//!
//! let mut analyzer = FacialAnalyzer::default();
//! if let Some(obs) = analyzer.analyze(&frame) {
//!     println!("{} ({}%)", obs.emotion, obs.confidence);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analyzer;
pub mod classifier;
pub mod features;
pub mod region;

pub use analyzer::FacialAnalyzer;
pub use classifier::{default_profiles, ExpressionProfile, FacialClassification, FacialClassifier, FeatureStat};
pub use features::{FacialFeature, FacialFeatureExtractor, FacialFeatures};
pub use region::{detect_face_region, is_skin_tone, FaceRegion};
