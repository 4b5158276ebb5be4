//! In-memory stores for MoodLens
//!
//! Reference implementations of the collaborator traits from
//! `moodlens-core`, suitable for tests and for hosts that keep everything
//! in process:
//!
//! - [`MemoryCalibrationStore`]: bounded baseline buffer, per-emotion
//!   averages and the derived multiplier map
//! - [`MemoryHistoryStore`]: bounded fused-state history with long-run
//!   statistics

#![warn(missing_docs)]
#![warn(clippy::all)]

mod calibration;
mod history;

pub use calibration::{
    BaselineStats, MemoryCalibrationStore, BASELINE_CAPACITY, MAX_PERSONAL_THRESHOLD,
    STRESSED_BASELINE_CUTOFF, THRESHOLD_RAISE,
};
pub use history::{HistoryStatistics, MemoryHistoryStore, DEFAULT_HISTORY_CAPACITY};
