//! Cross-tick smoothing of fused states
//!
//! A short window of recent (emotion, confidence) pairs keeps one noisy
//! tick from swinging the reported emotion.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use moodlens_core::{Emotion, HistoryEntry, StabilizerConfig};
use serde::{Deserialize, Serialize};

/// What the stabilizer did with a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StabilizerOutcome {
    /// Empty window or a jump that cleared the confidence bar
    Accepted,
    /// Similar emotion; confidence blended, previous label kept
    Blended,
    /// Dissimilar emotion below the jump bar; previous pair kept
    Held,
}

/// Stabilized (emotion, confidence) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StabilizedReading {
    /// Emotion to report
    pub emotion: Emotion,
    /// Confidence to report
    pub confidence: u8,
    /// How the reading was produced
    pub outcome: StabilizerOutcome,
}

/// Sliding-window hysteresis over fused (emotion, confidence) pairs
///
/// Eviction depends only on the timestamps passed in, never on the wall
/// clock. A reported emotion can only change when the window is empty or
/// the new confidence clears the jump bar.
#[derive(Debug, Clone)]
pub struct TemporalStabilizer {
    config: StabilizerConfig,
    window: VecDeque<HistoryEntry>,
}

impl TemporalStabilizer {
    /// Stabilizer with the given parameters
    pub fn new(config: StabilizerConfig) -> Self {
        Self {
            config,
            window: VecDeque::new(),
        }
    }

    /// Parameters in use
    pub fn config(&self) -> &StabilizerConfig {
        &self.config
    }

    /// Entries currently in the window, oldest first
    pub fn window(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.window.iter()
    }

    /// Last accepted pair, if any
    pub fn last(&self) -> Option<&HistoryEntry> {
        self.window.back()
    }

    /// Fill an empty window from persisted history (oldest first)
    ///
    /// Entries already outside the window relative to `now` are skipped.
    /// A non-empty window is left alone.
    pub fn seed(&mut self, history: &[HistoryEntry], now: DateTime<Utc>) {
        if !self.window.is_empty() {
            return;
        }
        let span = self.config.window();
        self.window.extend(
            history
                .iter()
                .filter(|e| now - e.timestamp < span)
                .copied(),
        );
    }

    /// Drop every entry
    pub fn reset(&mut self) {
        self.window.clear();
    }

    fn purge(&mut self, now: DateTime<Utc>) {
        let span = self.config.window();
        self.window.retain(|e| now - e.timestamp < span);
    }

    /// Filter a new fused pair observed at `at`
    pub fn stabilize(
        &mut self,
        emotion: Emotion,
        confidence: u8,
        at: DateTime<Utc>,
    ) -> StabilizedReading {
        self.purge(at);

        let Some(last) = self.window.back().copied() else {
            self.window.push_back(HistoryEntry::new(emotion, confidence, at));
            return StabilizedReading {
                emotion,
                confidence,
                outcome: StabilizerOutcome::Accepted,
            };
        };

        let similarity = last.emotion.similarity(emotion);
        let reading = if similarity > self.config.similarity_threshold {
            let blend = self.config.blend;
            let blended = (last.confidence as f64 * blend + confidence as f64 * (1.0 - blend))
                .round()
                .clamp(0.0, 100.0) as u8;
            self.window.push_back(HistoryEntry::new(last.emotion, blended, at));
            StabilizedReading {
                emotion: last.emotion,
                confidence: blended,
                outcome: StabilizerOutcome::Blended,
            }
        } else if confidence > self.config.jump_confidence {
            self.window.push_back(HistoryEntry::new(emotion, confidence, at));
            StabilizedReading {
                emotion,
                confidence,
                outcome: StabilizerOutcome::Accepted,
            }
        } else {
            StabilizedReading {
                emotion: last.emotion,
                confidence: last.confidence,
                outcome: StabilizerOutcome::Held,
            }
        };

        tracing::trace!(
            candidate = %emotion,
            candidate_confidence = confidence,
            reported = %reading.emotion,
            reported_confidence = reading.confidence,
            similarity,
            outcome = ?reading.outcome,
            "Stabilized"
        );
        reading
    }
}

impl Default for TemporalStabilizer {
    fn default() -> Self {
        Self::new(StabilizerConfig::default())
    }
}
