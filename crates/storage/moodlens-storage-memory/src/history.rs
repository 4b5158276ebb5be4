use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use moodlens_core::{Emotion, FusedEmotionState, HistoryEntry, HistoryStore, Label, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Default number of retained history entries
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// Long-run summary of the retained history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryStatistics {
    /// Most frequent emotion (declaration order breaks ties)
    pub dominant_emotion: Emotion,
    /// Number of adjacent entries whose emotion differs
    pub transitions: usize,
    /// Mean confidence across entries
    pub average_stability: f64,
    /// Entries summarized
    pub entries: usize,
}

impl Default for HistoryStatistics {
    fn default() -> Self {
        Self {
            dominant_emotion: Emotion::Neutral,
            transitions: 0,
            average_stability: 100.0,
            entries: 0,
        }
    }
}

/// History store keeping the newest entries in memory
#[derive(Debug, Clone)]
pub struct MemoryHistoryStore {
    capacity: usize,
    entries: Arc<RwLock<VecDeque<HistoryEntry>>>,
}

impl MemoryHistoryStore {
    /// Store with the default 1000-entry capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Store retaining at most `capacity` entries (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
        }
    }

    /// Maximum number of retained entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of retained entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store holds no entry
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Append an entry directly, evicting the oldest past capacity
    pub fn push(&self, entry: HistoryEntry) {
        let mut entries = self.entries.write();
        entries.push_back(entry);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Dominant emotion, transition count and mean confidence
    pub fn statistics(&self) -> HistoryStatistics {
        let entries = self.entries.read();
        if entries.is_empty() {
            return HistoryStatistics::default();
        }

        let mut counts = vec![0usize; Emotion::ALL.len()];
        for entry in entries.iter() {
            if let Some(i) = Emotion::ALL.iter().position(|e| *e == entry.emotion) {
                counts[i] += 1;
            }
        }
        let mut dominant = 0;
        for (i, n) in counts.iter().enumerate() {
            if *n > counts[dominant] {
                dominant = i;
            }
        }

        let transitions = entries
            .iter()
            .zip(entries.iter().skip(1))
            .filter(|(a, b)| a.emotion != b.emotion)
            .count();
        let total: f64 = entries.iter().map(|e| e.confidence as f64).sum();

        HistoryStatistics {
            dominant_emotion: Emotion::ALL[dominant],
            transitions,
            average_stability: total / entries.len() as f64,
            entries: entries.len(),
        }
    }
}

impl Default for MemoryHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let entries = self.entries.read();
        let skip = entries.len().saturating_sub(limit);
        Ok(entries.iter().skip(skip).copied().collect())
    }

    async fn persist(&self, state: &FusedEmotionState) -> Result<()> {
        self.push(state.history_entry());
        tracing::trace!(
            emotion = %state.primary_emotion,
            confidence = state.confidence,
            "Persisted fused state"
        );
        Ok(())
    }
}
