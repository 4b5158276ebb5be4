//! Fused emotional state and its building blocks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Emotion, InterventionSuggestion, InterventionType, ModalitySnapshot};

/// Emotion → non-negative weight accumulated from modality contributions
///
/// Only emotions that received a contribution are present as keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmotionVector {
    weights: BTreeMap<Emotion, f64>,
}

impl EmotionVector {
    /// Empty vector
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a contribution; negative or non-finite weights are ignored
    pub fn add(&mut self, emotion: Emotion, weight: f64) {
        if !weight.is_finite() || weight < 0.0 {
            return;
        }
        *self.weights.entry(emotion).or_insert(0.0) += weight;
    }

    /// Weight of an emotion (0 when absent)
    pub fn get(&self, emotion: Emotion) -> f64 {
        self.weights.get(&emotion).copied().unwrap_or(0.0)
    }

    /// Whether the emotion received a contribution
    pub fn contains(&self, emotion: Emotion) -> bool {
        self.weights.contains_key(&emotion)
    }

    /// Sum of all weights
    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    /// Whether nothing contributed
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Iterate (emotion, weight) in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (Emotion, f64)> + '_ {
        self.weights.iter().map(|(e, w)| (*e, *w))
    }

    /// Heaviest emotion; ties go to the earlier canonical emotion
    pub fn arg_max(&self) -> Option<(Emotion, f64)> {
        let mut best: Option<(Emotion, f64)> = None;
        for (emotion, weight) in self.iter() {
            match best {
                Some((_, b)) if weight <= b => {}
                _ => best = Some((emotion, weight)),
            }
        }
        best
    }

    /// Divide by the total so weights sum to 1
    ///
    /// A zero-total vector keeps its keys and splits evenly.
    pub fn normalized(&self) -> EmotionVector {
        let total = self.total();
        let n = self.weights.len() as f64;
        let weights = self
            .weights
            .iter()
            .map(|(e, w)| {
                let p = if total > 0.0 { w / total } else { 1.0 / n };
                (*e, p)
            })
            .collect();
        EmotionVector { weights }
    }
}

/// Fusion output for one tick; superseded, never mutated, by the next
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedEmotionState {
    /// Winning canonical emotion
    pub primary_emotion: Emotion,
    /// Calibrated confidence in 1..=100
    pub confidence: u8,
    /// `round(100·(1 − max probability))`
    pub uncertainty: u8,
    /// Raw weighted contributions
    pub emotion_vector: EmotionVector,
    /// Normalized distribution
    pub probabilities: EmotionVector,
    /// Observations this tick was computed from
    pub modalities: ModalitySnapshot,
    /// Emotion at least two modalities agreed on, if any
    pub agreed_emotion: Option<Emotion>,
    /// Whether an intervention should be offered
    pub intervention_needed: bool,
    /// Intervention kind, present iff `intervention_needed`
    pub intervention_type: Option<InterventionType>,
    /// Concrete suggestion for the host to render
    pub suggestion: Option<InterventionSuggestion>,
    /// Interventions were suppressed by the host this tick
    pub suppressed: bool,
    /// How long the primary emotion has persisted, per recent history
    pub duration_seconds: u64,
    /// Tick timestamp
    pub timestamp: DateTime<Utc>,
}

impl FusedEmotionState {
    /// History tuple for this state
    pub fn history_entry(&self) -> HistoryEntry {
        HistoryEntry::new(self.primary_emotion, self.confidence, self.timestamp)
    }
}

/// (emotion, confidence, timestamp) tuple kept in bounded windows
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Emotion
    pub emotion: Emotion,
    /// Confidence in 0..=100
    pub confidence: u8,
    /// When it was recorded
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    /// Create an entry
    pub fn new(emotion: Emotion, confidence: u8, timestamp: DateTime<Utc>) -> Self {
        Self {
            emotion,
            confidence,
            timestamp,
        }
    }
}

/// Seconds `emotion` has persisted at the tail of `history` (most-recent-last)
pub fn emotion_duration(history: &[HistoryEntry], emotion: Emotion, now: DateTime<Utc>) -> u64 {
    let start = history
        .iter()
        .rev()
        .take_while(|entry| entry.emotion == emotion)
        .last()
        .map(|entry| entry.timestamp);
    match start {
        Some(ts) => (now - ts).num_seconds().max(0) as u64,
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_vector_ignores_negative_weights() {
        let mut v = EmotionVector::new();
        v.add(Emotion::Sad, -1.0);
        v.add(Emotion::Sad, f64::NAN);
        assert!(v.is_empty());
    }

    #[test]
    fn test_normalized_sums_to_one() {
        let mut v = EmotionVector::new();
        v.add(Emotion::Happy, 0.36);
        v.add(Emotion::Calm, 0.2);
        v.add(Emotion::Happy, 0.1);
        let n = v.normalized();
        assert!((n.total() - 1.0).abs() < 1e-9);
        assert_eq!(n.arg_max().unwrap().0, Emotion::Happy);
    }

    #[test]
    fn test_arg_max_tie_break() {
        let mut v = EmotionVector::new();
        v.add(Emotion::Frustrated, 0.3);
        v.add(Emotion::Stressed, 0.3);
        assert_eq!(v.arg_max().unwrap().0, Emotion::Stressed);
    }

    #[test]
    fn test_emotion_duration() {
        let now = Utc::now();
        let history = vec![
            HistoryEntry::new(Emotion::Calm, 60, now - Duration::seconds(30)),
            HistoryEntry::new(Emotion::Stressed, 70, now - Duration::seconds(12)),
            HistoryEntry::new(Emotion::Stressed, 75, now - Duration::seconds(6)),
        ];
        assert_eq!(emotion_duration(&history, Emotion::Stressed, now), 12);
        assert_eq!(emotion_duration(&history, Emotion::Calm, now), 0);
        assert_eq!(emotion_duration(&[], Emotion::Calm, now), 0);
    }
}
