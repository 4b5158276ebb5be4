//! Interfaces of the external collaborators the pipeline talks to

use async_trait::async_trait;

use super::{BaselineSample, CalibrationMap, FusedEmotionState, HistoryEntry};
use crate::Result;

/// Source of calibration multipliers and sink for baseline samples
///
/// Recomputing the map from samples is the store's job; the pipeline only
/// reads the resulting map once per tick.
#[async_trait]
pub trait CalibrationStore: Send + Sync {
    /// Current calibration map (identity when nothing is known yet)
    async fn calibration_map(&self) -> Result<CalibrationMap>;

    /// Record a raw baseline sample for later recomputation
    async fn record_sample(&self, sample: BaselineSample) -> Result<()>;

    /// Personalized intervention threshold derived from `base`
    async fn intervention_threshold(&self, base: u8) -> Result<u8> {
        Ok(base)
    }
}

/// Bounded history provider and sink for fused states
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Most recent entries, oldest first, at most `limit`
    async fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>>;

    /// Persist a fused state
    async fn persist(&self, state: &FusedEmotionState) -> Result<()>;
}
