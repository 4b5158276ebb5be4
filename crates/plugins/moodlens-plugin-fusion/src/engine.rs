//! Weighted fusion of the latest per-modality observations
//!
//! Each present modality adds `weight × strength / 100` to its canonical
//! emotion. The normalized vector's arg-max becomes the primary emotion,
//! its share sets the uncertainty, and the winner's confidence is
//! calibrated. Intervention is decided by the threshold rule first and by
//! modality agreement second; host suppression overrides both.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use moodlens_core::{
    emotion_duration, CalibrationMap, Emotion, EmotionVector, FusedEmotionState, FusionWeights,
    HistoryEntry, InterventionPolicy, InterventionSuggestion, ModalityObservation,
    ModalitySnapshot,
};

use crate::calibrator::Calibrator;

/// Per-tick inputs supplied by the surrounding session
#[derive(Debug, Clone, Default)]
pub struct FusionContext {
    /// Personalized confidence multipliers
    pub calibration: CalibrationMap,
    /// Bounded recent history, most recent last
    pub recent_history: Vec<HistoryEntry>,
    /// Overrides the policy threshold (personalized threshold)
    pub intervention_threshold: Option<u8>,
    /// Host asked not to offer interventions this tick
    pub suppress_interventions: bool,
}

impl FusionContext {
    /// Empty context: identity calibration, no history
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the calibration map
    pub fn with_calibration(mut self, calibration: CalibrationMap) -> Self {
        self.calibration = calibration;
        self
    }

    /// Set the recent history
    pub fn with_history(mut self, history: Vec<HistoryEntry>) -> Self {
        self.recent_history = history;
        self
    }

    /// Override the intervention threshold
    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.intervention_threshold = Some(threshold);
        self
    }

    /// Suppress interventions
    pub fn with_suppression(mut self, suppress: bool) -> Self {
        self.suppress_interventions = suppress;
        self
    }
}

/// Emotion at least two present modalities map to
pub fn agreed_emotion(observations: &[ModalityObservation]) -> Option<Emotion> {
    let mut counts: BTreeMap<Emotion, usize> = BTreeMap::new();
    for obs in observations {
        *counts.entry(obs.canonical_emotion()).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .filter(|(_, n)| *n >= 2)
        .max_by_key(|(_, n)| *n)
        .map(|(e, _)| e)
}

/// Weighted decision-level fusion of the three modalities
#[derive(Debug, Clone, Default)]
pub struct FusionEngine {
    weights: FusionWeights,
    policy: InterventionPolicy,
}

impl FusionEngine {
    /// Engine with the given weights and intervention policy
    pub fn new(weights: FusionWeights, policy: InterventionPolicy) -> Self {
        Self { weights, policy }
    }

    /// Modality weights
    pub fn weights(&self) -> &FusionWeights {
        &self.weights
    }

    /// Intervention policy
    pub fn policy(&self) -> &InterventionPolicy {
        &self.policy
    }

    /// Fuse one tick's observations; `None` when no modality is present
    pub fn fuse(
        &self,
        snapshot: &ModalitySnapshot,
        ctx: &FusionContext,
        at: DateTime<Utc>,
    ) -> Option<FusedEmotionState> {
        let observations = snapshot.observations();
        if observations.is_empty() {
            return None;
        }

        let mut vector = EmotionVector::new();
        for obs in &observations {
            let weight = obs.strength() / 100.0 * self.weights.weight(obs.modality());
            vector.add(obs.canonical_emotion(), weight);
        }
        let (primary, _) = vector.arg_max()?;
        let raw_confidence = (100.0 * vector.total()).round().clamp(1.0, 100.0) as u8;

        let probabilities = vector.normalized();
        let max_probability = probabilities.arg_max().map(|(_, p)| p).unwrap_or(0.0);
        let uncertainty = (100.0 * (1.0 - max_probability)).round().clamp(0.0, 100.0) as u8;

        let confidence = Calibrator::new(ctx.calibration.clone()).apply(primary, raw_confidence);
        let agreed = agreed_emotion(&observations);

        tracing::debug!(
            modalities = observations.len(),
            primary = %primary,
            raw_confidence,
            confidence,
            uncertainty,
            agreed = ?agreed,
            "Fused modalities"
        );

        let state = FusedEmotionState {
            primary_emotion: primary,
            confidence,
            uncertainty,
            emotion_vector: vector,
            probabilities,
            modalities: snapshot.clone(),
            agreed_emotion: agreed,
            intervention_needed: false,
            intervention_type: None,
            suggestion: None,
            suppressed: false,
            duration_seconds: 0,
            timestamp: at,
        };
        Some(self.resolve(state, primary, confidence, ctx))
    }

    /// Settle a state on (emotion, confidence) and decide the intervention
    ///
    /// Used by [`FusionEngine::fuse`] and again after temporal
    /// stabilization replaces the reported pair.
    pub fn resolve(
        &self,
        mut state: FusedEmotionState,
        emotion: Emotion,
        confidence: u8,
        ctx: &FusionContext,
    ) -> FusedEmotionState {
        state.primary_emotion = emotion;
        state.confidence = confidence;
        state.duration_seconds = emotion_duration(&ctx.recent_history, emotion, state.timestamp);

        let threshold = ctx.intervention_threshold.unwrap_or(self.policy.threshold);
        let target = self.intervention_target(&state, threshold);

        match target {
            Some(target) if ctx.suppress_interventions => {
                tracing::debug!(emotion = %target, "Intervention suppressed by host");
                state.intervention_needed = false;
                state.intervention_type = None;
                state.suggestion = None;
            }
            Some(target) => {
                state.intervention_needed = true;
                state.intervention_type = target.intervention();
                state.suggestion = InterventionSuggestion::heuristic(target, confidence);
            }
            None => {
                state.intervention_needed = false;
                state.intervention_type = None;
                state.suggestion = None;
            }
        }
        state.suppressed = ctx.suppress_interventions;
        state
    }

    /// Emotion an intervention should address, if any
    ///
    /// The primary emotion qualifies when confident, supportable and not too
    /// uncertain. Otherwise an agreed emotion qualifies on confidence alone.
    fn intervention_target(&self, state: &FusedEmotionState, threshold: u8) -> Option<Emotion> {
        let confident = state.confidence >= threshold;
        if confident
            && state.primary_emotion.needs_support()
            && state.uncertainty <= self.policy.max_uncertainty
        {
            return Some(state.primary_emotion);
        }
        match state.agreed_emotion {
            Some(agreed) if confident && agreed.needs_support() => Some(agreed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moodlens_core::{
        FacialEmotion, FacialObservation, InterventionType, TextEmotion, TextObservation,
        VoiceObservation, VoiceTone,
    };

    fn engine() -> FusionEngine {
        FusionEngine::default()
    }

    #[test]
    fn test_all_absent_is_none() {
        let now = Utc::now();
        assert!(engine()
            .fuse(&ModalitySnapshot::new(), &FusionContext::new(), now)
            .is_none());
    }

    #[test]
    fn test_facial_and_text_agree_on_happy() {
        let now = Utc::now();
        let snapshot = ModalitySnapshot::new()
            .with_facial(FacialObservation::new(FacialEmotion::Happy, 90.0, now))
            .with_text(TextObservation::new(TextEmotion::Happy, 85.0, now));
        let state = engine().fuse(&snapshot, &FusionContext::new(), now).unwrap();

        assert_eq!(state.primary_emotion, Emotion::Happy);
        // 0.4·0.9 + 0.25·0.85 = 0.5725
        assert_eq!(state.confidence, 57);
        assert_eq!(state.uncertainty, 0);
        assert_eq!(state.agreed_emotion, Some(Emotion::Happy));
        assert!(!state.intervention_needed);
    }

    #[test]
    fn test_single_voice_modality_cannot_intervene() {
        let now = Utc::now();
        let snapshot =
            ModalitySnapshot::new().with_voice(VoiceObservation::new(VoiceTone::Stressed, 90.0, now));
        let state = engine().fuse(&snapshot, &FusionContext::new(), now).unwrap();

        assert_eq!(state.primary_emotion, Emotion::Stressed);
        assert!((31..=32).contains(&state.confidence));
        assert!(!state.intervention_needed);
        assert!(state.intervention_type.is_none());
    }

    #[test]
    fn test_confident_stress_triggers_intervention() {
        let now = Utc::now();
        let snapshot = ModalitySnapshot::new()
            .with_facial(FacialObservation::new(FacialEmotion::Disgusted, 100.0, now))
            .with_voice(VoiceObservation::new(VoiceTone::Stressed, 100.0, now))
            .with_text(TextObservation::new(TextEmotion::Stressed, 100.0, now));
        let state = engine().fuse(&snapshot, &FusionContext::new(), now).unwrap();

        assert_eq!(state.primary_emotion, Emotion::Stressed);
        assert_eq!(state.confidence, 100);
        assert!(state.intervention_needed);
        assert_eq!(state.intervention_type, Some(InterventionType::Breathing));
        assert!(state.suggestion.is_some());
        assert!(!state.suppressed);
    }

    #[test]
    fn test_suppression_wins() {
        let now = Utc::now();
        let snapshot = ModalitySnapshot::new()
            .with_facial(FacialObservation::new(FacialEmotion::Sad, 100.0, now))
            .with_voice(VoiceObservation::new(VoiceTone::Tired, 100.0, now))
            .with_text(TextObservation::new(TextEmotion::Sad, 100.0, now));
        let ctx = FusionContext::new().with_suppression(true);
        let state = engine().fuse(&snapshot, &ctx, now).unwrap();

        assert_eq!(state.primary_emotion, Emotion::Sad);
        assert!(state.confidence >= 80);
        assert!(!state.intervention_needed);
        assert!(state.suppressed);
        assert!(state.suggestion.is_none());
    }

    #[test]
    fn test_agreement_triggers_when_primary_needs_no_support() {
        let now = Utc::now();
        // Facial happy wins the vector, voice and text agree on frustration
        let snapshot = ModalitySnapshot::new()
            .with_facial(FacialObservation::new(FacialEmotion::Happy, 100.0, now))
            .with_voice(VoiceObservation::new(VoiceTone::Frustrated, 60.0, now))
            .with_text(TextObservation::new(TextEmotion::Angry, 60.0, now));
        let ctx = FusionContext::new().with_calibration(CalibrationMap::new().with(Emotion::Happy, 1.1));
        let state = engine().fuse(&snapshot, &ctx, now).unwrap();

        // happy 0.40 beats frustrated 0.21 + 0.15; round(76 × 1.1) = 84
        assert_eq!(state.primary_emotion, Emotion::Happy);
        assert_eq!(state.confidence, 84);
        assert_eq!(state.agreed_emotion, Some(Emotion::Frustrated));
        assert!(state.intervention_needed);
        assert_eq!(state.intervention_type, Some(InterventionType::Break));
        assert_eq!(
            state.suggestion.as_ref().map(|s| s.kind),
            Some(InterventionType::Break)
        );
    }

    #[test]
    fn test_primary_rule_respects_uncertainty() {
        let now = Utc::now();
        let snapshot = ModalitySnapshot::new()
            .with_facial(FacialObservation::new(FacialEmotion::Sad, 100.0, now))
            .with_voice(VoiceObservation::new(VoiceTone::Stressed, 100.0, now))
            .with_text(TextObservation::new(TextEmotion::Fatigued, 100.0, now));
        let policy = InterventionPolicy {
            threshold: 80,
            max_uncertainty: 50,
        };
        let state = FusionEngine::new(FusionWeights::default(), policy)
            .fuse(&snapshot, &FusionContext::new(), now)
            .unwrap();
        // sad 0.4 of 1.0 → uncertainty 60 > 50, and no two modalities agree
        assert_eq!(state.primary_emotion, Emotion::Sad);
        assert_eq!(state.uncertainty, 60);
        assert!(state.agreed_emotion.is_none());
        assert!(!state.intervention_needed);
    }

    #[test]
    fn test_agreement_does_not_bypass_threshold() {
        let now = Utc::now();
        let snapshot = ModalitySnapshot::new()
            .with_voice(VoiceObservation::new(VoiceTone::Tired, 50.0, now))
            .with_text(TextObservation::new(TextEmotion::Fatigued, 50.0, now));
        let state = engine().fuse(&snapshot, &FusionContext::new(), now).unwrap();
        assert_eq!(state.agreed_emotion, Some(Emotion::Fatigued));
        assert!(!state.intervention_needed);
    }

    #[test]
    fn test_calibration_applies_to_winner_only() {
        let now = Utc::now();
        let snapshot = ModalitySnapshot::new()
            .with_facial(FacialObservation::new(FacialEmotion::Happy, 90.0, now))
            .with_text(TextObservation::new(TextEmotion::Happy, 85.0, now));
        let ctx = FusionContext::new().with_calibration(
            CalibrationMap::new()
                .with(Emotion::Happy, 1.5)
                .with(Emotion::Sad, 0.6),
        );
        let state = engine().fuse(&snapshot, &ctx, now).unwrap();
        // round(57 × 1.5) = 86
        assert_eq!(state.confidence, 86);
        assert!((state.probabilities.total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_personalized_threshold() {
        let now = Utc::now();
        let snapshot = ModalitySnapshot::new()
            .with_facial(FacialObservation::new(FacialEmotion::Fearful, 100.0, now))
            .with_voice(VoiceObservation::new(VoiceTone::Stressed, 100.0, now))
            .with_text(TextObservation::new(TextEmotion::Anxious, 60.0, now));
        // anxious 0.55, stressed 0.35 → confidence 90, uncertainty 39
        let base = engine().fuse(&snapshot, &FusionContext::new(), now).unwrap();
        assert_eq!(base.confidence, 90);
        assert!(base.intervention_needed);

        let strict = FusionContext::new().with_threshold(95);
        let state = engine().fuse(&snapshot, &strict, now).unwrap();
        assert!(!state.intervention_needed);
    }

    #[test]
    fn test_text_sentiment_fallback() {
        let now = Utc::now();
        let snapshot = ModalitySnapshot::new().with_text(TextObservation::from_sentiment(
            moodlens_core::Sentiment::Negative,
            80.0,
            now,
        ));
        let state = engine().fuse(&snapshot, &FusionContext::new(), now).unwrap();
        assert_eq!(state.primary_emotion, Emotion::Sad);
        assert_eq!(state.confidence, 20);
    }

    #[test]
    fn test_duration_from_history() {
        let now = Utc::now();
        let history = vec![
            HistoryEntry::new(Emotion::Calm, 40, now - chrono::Duration::seconds(20)),
            HistoryEntry::new(Emotion::Calm, 45, now - chrono::Duration::seconds(9)),
        ];
        let snapshot = ModalitySnapshot::new()
            .with_facial(FacialObservation::new(FacialEmotion::Neutral, 80.0, now));
        let state = engine()
            .fuse(&snapshot, &FusionContext::new().with_history(history), now)
            .unwrap();
        assert_eq!(state.primary_emotion, Emotion::Calm);
        assert_eq!(state.duration_seconds, 20);
    }

    #[test]
    fn test_fusion_is_deterministic() {
        let now = Utc::now();
        let snapshot = ModalitySnapshot::new()
            .with_facial(FacialObservation::new(FacialEmotion::Surprised, 73.0, now))
            .with_voice(VoiceObservation::new(VoiceTone::Excited, 41.0, now))
            .with_text(TextObservation::new(TextEmotion::Calm, 66.0, now));
        let ctx = FusionContext::new().with_calibration(CalibrationMap::new().with(Emotion::Energized, 1.2));
        let a = engine().fuse(&snapshot, &ctx, now).unwrap();
        let b = engine().fuse(&snapshot, &ctx, now).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a.emotion_vector).unwrap(),
            serde_json::to_string(&b.emotion_vector).unwrap()
        );
    }
}
