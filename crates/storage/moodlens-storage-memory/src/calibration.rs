use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use moodlens_core::{BaselineSample, CalibrationMap, CalibrationStore, Emotion, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Baseline samples retained per user
pub const BASELINE_CAPACITY: usize = 500;

/// Stressed baseline average above which the intervention bar is raised
pub const STRESSED_BASELINE_CUTOFF: f64 = 60.0;

/// Amount added to the intervention threshold for a stressed baseline
pub const THRESHOLD_RAISE: u8 = 5;

/// Highest personalized intervention threshold
pub const MAX_PERSONAL_THRESHOLD: u8 = 95;

/// Per-emotion summary of the baseline samples
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BaselineStats {
    /// Samples seen for this emotion
    pub count: usize,
    /// Mean confidence of those samples
    pub average_confidence: f64,
}

/// Calibration store backed by a bounded in-memory sample buffer
///
/// The multiplier map is recomputed from the retained samples on every
/// read, so it always reflects the last [`BASELINE_CAPACITY`] samples.
#[derive(Debug, Clone, Default)]
pub struct MemoryCalibrationStore {
    samples: Arc<RwLock<VecDeque<BaselineSample>>>,
}

impl MemoryCalibrationStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of retained samples
    pub fn len(&self) -> usize {
        self.samples.read().len()
    }

    /// Whether no sample has been recorded
    pub fn is_empty(&self) -> bool {
        self.samples.read().is_empty()
    }

    /// Drop every sample
    pub fn clear(&self) {
        self.samples.write().clear();
    }

    /// Counts and average confidence per emotion
    pub fn summary(&self) -> BTreeMap<Emotion, BaselineStats> {
        let samples = self.samples.read();
        let mut sums: BTreeMap<Emotion, (usize, f64)> = BTreeMap::new();
        for sample in samples.iter() {
            let entry = sums.entry(sample.emotion).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += sample.confidence as f64;
        }
        sums.into_iter()
            .map(|(emotion, (count, total))| {
                (
                    emotion,
                    BaselineStats {
                        count,
                        average_confidence: total / count as f64,
                    },
                )
            })
            .collect()
    }
}

#[async_trait]
impl CalibrationStore for MemoryCalibrationStore {
    async fn calibration_map(&self) -> Result<CalibrationMap> {
        let map = self
            .summary()
            .into_iter()
            .fold(CalibrationMap::new(), |map, (emotion, stats)| {
                map.with(
                    emotion,
                    CalibrationMap::multiplier_for_average(stats.average_confidence),
                )
            });
        Ok(map)
    }

    async fn record_sample(&self, sample: BaselineSample) -> Result<()> {
        let mut samples = self.samples.write();
        samples.push_back(sample);
        while samples.len() > BASELINE_CAPACITY {
            samples.pop_front();
        }
        tracing::trace!(
            emotion = %sample.emotion,
            confidence = sample.confidence,
            retained = samples.len(),
            "Recorded baseline sample"
        );
        Ok(())
    }

    async fn intervention_threshold(&self, base: u8) -> Result<u8> {
        let stressed = self
            .summary()
            .get(&Emotion::Stressed)
            .map(|s| s.average_confidence)
            .unwrap_or(0.0);
        if stressed > STRESSED_BASELINE_CUTOFF && base < MAX_PERSONAL_THRESHOLD {
            let raised = base.saturating_add(THRESHOLD_RAISE).min(MAX_PERSONAL_THRESHOLD);
            tracing::debug!(base, raised, stressed, "Raised intervention threshold");
            return Ok(raised);
        }
        Ok(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    async fn record(store: &MemoryCalibrationStore, emotion: Emotion, confidences: &[u8]) {
        for c in confidences {
            store
                .record_sample(BaselineSample::new(emotion, *c, Utc::now()))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_empty_store_is_identity() {
        let store = MemoryCalibrationStore::new();
        let map = store.calibration_map().await.unwrap();
        assert!(map.is_empty());
        assert_eq!(store.intervention_threshold(80).await.unwrap(), 80);
    }

    #[tokio::test]
    async fn test_multipliers_follow_average() {
        let store = MemoryCalibrationStore::new();
        record(&store, Emotion::Stressed, &[90, 100, 60]).await;
        record(&store, Emotion::Calm, &[20, 30]).await;
        record(&store, Emotion::Sad, &[2, 4]).await;

        let map = store.calibration_map().await.unwrap();
        // stressed avg 83.3 -> 0.6
        assert!((map.multiplier(Emotion::Stressed) - 0.6).abs() < 1e-9);
        // calm avg 25 -> 2.0, clamped
        assert!((map.multiplier(Emotion::Calm) - 1.6).abs() < 1e-9);
        // sad avg 3 -> too small to calibrate
        assert_eq!(map.multiplier(Emotion::Sad), 1.0);
        assert_eq!(map.multiplier(Emotion::Happy), 1.0);
    }

    #[tokio::test]
    async fn test_buffer_is_bounded() {
        let store = MemoryCalibrationStore::new();
        record(&store, Emotion::Happy, &[10; 100]).await;
        record(&store, Emotion::Happy, &[100; BASELINE_CAPACITY]).await;
        assert_eq!(store.len(), BASELINE_CAPACITY);
        let summary = store.summary();
        assert_eq!(summary[&Emotion::Happy].count, BASELINE_CAPACITY);
        assert_eq!(summary[&Emotion::Happy].average_confidence, 100.0);
    }

    #[tokio::test]
    async fn test_stressed_baseline_raises_threshold() {
        let store = MemoryCalibrationStore::new();
        record(&store, Emotion::Stressed, &[70, 64]).await;
        assert_eq!(store.intervention_threshold(80).await.unwrap(), 85);
        assert_eq!(store.intervention_threshold(93).await.unwrap(), 95);
        assert_eq!(store.intervention_threshold(98).await.unwrap(), 98);

        store.clear();
        record(&store, Emotion::Stressed, &[60]).await;
        assert_eq!(store.intervention_threshold(80).await.unwrap(), 80);
    }
}
