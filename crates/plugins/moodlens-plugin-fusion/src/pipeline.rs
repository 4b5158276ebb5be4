//! Per-session fusion: engine, then stabilizer, then a second
//! intervention decision on the stabilized pair

use chrono::{DateTime, Utc};
use moodlens_core::{FusedEmotionState, ModalitySnapshot, MoodlensConfig};

use crate::engine::{FusionContext, FusionEngine};
use crate::stabilizer::{StabilizerOutcome, TemporalStabilizer};

/// Fusion followed by temporal stabilization, owned by one session
#[derive(Debug, Clone, Default)]
pub struct FusionPipeline {
    engine: FusionEngine,
    stabilizer: TemporalStabilizer,
}

impl FusionPipeline {
    /// Pipeline from the session configuration
    pub fn new(config: &MoodlensConfig) -> Self {
        Self {
            engine: FusionEngine::new(config.weights.clone(), config.intervention.clone()),
            stabilizer: TemporalStabilizer::new(config.stabilizer.clone()),
        }
    }

    /// Pipeline from explicit parts
    pub fn from_parts(engine: FusionEngine, stabilizer: TemporalStabilizer) -> Self {
        Self { engine, stabilizer }
    }

    /// Fusion engine
    pub fn engine(&self) -> &FusionEngine {
        &self.engine
    }

    /// Temporal stabilizer
    pub fn stabilizer(&self) -> &TemporalStabilizer {
        &self.stabilizer
    }

    /// Run one fusion tick; `None` when no modality is present
    ///
    /// The stabilizer is seeded from `ctx.recent_history` when its window
    /// is empty, then filters the fused pair. When it changes the reported
    /// emotion or confidence, the intervention decision is taken again on
    /// the stabilized pair.
    pub fn tick(
        &mut self,
        snapshot: &ModalitySnapshot,
        ctx: &FusionContext,
        at: DateTime<Utc>,
    ) -> Option<FusedEmotionState> {
        let fused = self.engine.fuse(snapshot, ctx, at)?;

        self.stabilizer.seed(&ctx.recent_history, at);
        let reading = self
            .stabilizer
            .stabilize(fused.primary_emotion, fused.confidence, at);

        if reading.outcome == StabilizerOutcome::Accepted
            && reading.emotion == fused.primary_emotion
            && reading.confidence == fused.confidence
        {
            return Some(fused);
        }

        tracing::debug!(
            fused = %fused.primary_emotion,
            fused_confidence = fused.confidence,
            reported = %reading.emotion,
            reported_confidence = reading.confidence,
            outcome = ?reading.outcome,
            "Stabilizer adjusted fused state"
        );
        Some(
            self.engine
                .resolve(fused, reading.emotion, reading.confidence, ctx),
        )
    }

    /// Forget the stabilizer window
    pub fn reset(&mut self) {
        self.stabilizer.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use moodlens_core::{
        Emotion, FacialEmotion, FacialObservation, HistoryEntry, TextEmotion, TextObservation,
    };

    fn facial(emotion: FacialEmotion, confidence: f64, at: DateTime<Utc>) -> ModalitySnapshot {
        ModalitySnapshot::new().with_facial(FacialObservation::new(emotion, confidence, at))
    }

    #[test]
    fn test_flip_below_jump_bar_is_held() {
        let mut pipeline = FusionPipeline::default();
        let ctx = FusionContext::new();
        let t0 = Utc::now();

        let full = ModalitySnapshot::new()
            .with_facial(FacialObservation::new(FacialEmotion::Happy, 100.0, t0))
            .with_text(TextObservation::new(TextEmotion::Happy, 100.0, t0))
            .with_voice(moodlens_core::VoiceObservation::new(
                moodlens_core::VoiceTone::Excited,
                43.0,
                t0,
            ));
        let first = pipeline.tick(&full, &ctx, t0).unwrap();
        assert_eq!(first.primary_emotion, Emotion::Happy);
        // happy 0.65 + energized 0.1505
        assert_eq!(first.confidence, 80);

        let t1 = t0 + Duration::seconds(3);
        let sad = ModalitySnapshot::new()
            .with_facial(FacialObservation::new(FacialEmotion::Sad, 100.0, t1))
            .with_text(TextObservation::new(TextEmotion::Sad, 60.0, t1));
        let second = pipeline.tick(&sad, &ctx, t1).unwrap();
        // sad fuses to 55, below the jump bar of 80
        assert_eq!(second.primary_emotion, Emotion::Happy);
        assert_eq!(second.confidence, 80);
        assert_eq!(second.agreed_emotion, Some(Emotion::Sad));
    }

    #[test]
    fn test_similar_emotion_blends() {
        let mut pipeline = FusionPipeline::default();
        let ctx = FusionContext::new();
        let t0 = Utc::now();
        pipeline
            .tick(&facial(FacialEmotion::Happy, 100.0, t0), &ctx, t0)
            .unwrap();
        let t1 = t0 + Duration::seconds(2);
        let state = pipeline
            .tick(&facial(FacialEmotion::Neutral, 100.0, t1), &ctx, t1)
            .unwrap();
        // calm ~ happy (0.8): keep happy, confidence 40·0.7 + 40·0.3
        assert_eq!(state.primary_emotion, Emotion::Happy);
        assert_eq!(state.confidence, 40);
    }

    #[test]
    fn test_seeded_history_holds_label_across_restart() {
        let t0 = Utc::now();
        let ctx = FusionContext::new()
            .with_history(vec![HistoryEntry::new(Emotion::Calm, 70, t0 - Duration::seconds(1))]);
        let mut pipeline = FusionPipeline::default();
        let state = pipeline
            .tick(&facial(FacialEmotion::Sad, 100.0, t0), &ctx, t0)
            .unwrap();
        assert_eq!(state.primary_emotion, Emotion::Calm);
        assert_eq!(state.confidence, 70);
    }

    #[test]
    fn test_absent_modalities_leave_stabilizer_untouched() {
        let mut pipeline = FusionPipeline::default();
        assert!(pipeline
            .tick(&ModalitySnapshot::new(), &FusionContext::new(), Utc::now())
            .is_none());
        assert_eq!(pipeline.stabilizer().window().count(), 0);
    }
}
