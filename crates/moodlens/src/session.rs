//! Per-session pipeline state
//!
//! A [`MoodlensSession`] owns everything that used to be process-global:
//! the three analyzers with their smoothing state, the fusion pipeline with
//! its stabilizer window, the modality buffers and the collaborator stores.
//! Several sessions can run side by side without sharing anything.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use moodlens_core::{
    AudioFrame, BaselineSample, CalibrationMap, CalibrationStore, FacialObservation,
    FusedEmotionState, HistoryStore, LogEvent, Modality, MoodlensConfig, PixelFrame, Result,
    TextObservation, TextSample, VoiceObservation,
};
use moodlens_plugin_fusion::{FusionContext, FusionPipeline};
use moodlens_provider_facial::FacialAnalyzer;
use moodlens_provider_text::{last_sentence, TextAnalyzer};
use moodlens_provider_voice::VoiceAnalyzer;
use moodlens_storage_memory::{MemoryCalibrationStore, MemoryHistoryStore};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::runtime::ModalityBuffers;

/// Capacity of the fused-state broadcast channel
const STATE_CHANNEL_CAPACITY: usize = 64;

/// One user's emotion pipeline
pub struct MoodlensSession {
    id: Uuid,
    config: MoodlensConfig,
    buffers: ModalityBuffers,
    facial: Mutex<FacialAnalyzer>,
    voice: Mutex<VoiceAnalyzer>,
    text: Mutex<TextAnalyzer>,
    pipeline: Mutex<FusionPipeline>,
    calibration: Arc<dyn CalibrationStore>,
    history: Arc<dyn HistoryStore>,
    states: broadcast::Sender<FusedEmotionState>,
    suppressed: AtomicBool,
}

impl MoodlensSession {
    /// Session backed by in-memory stores
    pub fn new(config: MoodlensConfig) -> Result<Self> {
        let history = MemoryHistoryStore::with_capacity(config.history_capacity);
        Self::with_stores(
            config,
            Arc::new(MemoryCalibrationStore::new()),
            Arc::new(history),
        )
    }

    /// Session backed by the given stores
    pub fn with_stores(
        config: MoodlensConfig,
        calibration: Arc<dyn CalibrationStore>,
        history: Arc<dyn HistoryStore>,
    ) -> Result<Self> {
        config.validate()?;

        let id = Uuid::new_v4();
        let (states, _) = broadcast::channel(STATE_CHANNEL_CAPACITY);
        info!(
            session = %id,
            text_strategy = %config.text_strategy,
            "MoodLens session created"
        );

        Ok(Self {
            id,
            buffers: ModalityBuffers::new(),
            facial: Mutex::new(FacialAnalyzer::new(config.smoothing.clone())),
            voice: Mutex::new(VoiceAnalyzer::new(
                config.smoothing.clone(),
                config.silence_floor,
            )),
            text: Mutex::new(TextAnalyzer::new(config.text_strategy)),
            pipeline: Mutex::new(FusionPipeline::new(&config)),
            calibration,
            history,
            states,
            suppressed: AtomicBool::new(false),
            config,
        })
    }

    /// Session identifier
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Configuration in use
    pub fn config(&self) -> &MoodlensConfig {
        &self.config
    }

    /// Latest observation per modality
    pub fn buffers(&self) -> &ModalityBuffers {
        &self.buffers
    }

    /// Receive every fused state this session produces
    pub fn subscribe(&self) -> broadcast::Receiver<FusedEmotionState> {
        self.states.subscribe()
    }

    /// Whether a republished log event was emitted on behalf of this session
    pub fn owns_log(&self, event: &LogEvent) -> bool {
        event.session() == Some(self.id.to_string().as_str())
    }

    /// Mark interventions as suppressed by the host (e.g. during a meeting)
    pub fn set_suppressed(&self, suppressed: bool) {
        self.suppressed.store(suppressed, Ordering::SeqCst);
    }

    /// Whether the host currently suppresses interventions
    pub fn is_suppressed(&self) -> bool {
        self.suppressed.load(Ordering::SeqCst)
    }

    /// Analyze a camera frame and update the facial slot
    ///
    /// A frame without a face empties the slot, so the next fusion tick
    /// runs without the facial modality.
    pub async fn submit_frame(&self, frame: &PixelFrame) -> Option<FacialObservation> {
        let observation = self.facial.lock().analyze(frame);
        self.buffers.set_facial(observation.clone()).await;
        observation
    }

    /// Analyze an audio frame and update the voice slot
    ///
    /// Silence empties the slot.
    pub async fn submit_audio(&self, frame: &AudioFrame) -> Option<VoiceObservation> {
        let observation = self.voice.lock().analyze(frame);
        self.buffers.set_voice(observation.clone()).await;
        observation
    }

    /// Analyze typed text and update the text slot
    ///
    /// Empty text empties the slot. An unchanged last sentence is not
    /// classified again and leaves the slot as it is.
    pub async fn submit_text(&self, sample: &TextSample) -> Option<TextObservation> {
        if last_sentence(&sample.text).is_empty() {
            self.text.lock().reset();
            self.buffers.set_text(None).await;
            return None;
        }
        let observation = self.text.lock().analyze_if_changed(sample)?;
        self.buffers.set_text(Some(observation.clone())).await;
        Some(observation)
    }

    /// Run one fusion tick at `at`
    ///
    /// Reads calibration, the personalized threshold and recent history
    /// from the stores; a failing store is logged and replaced by its
    /// neutral default. The resulting state is persisted and broadcast.
    /// `None` means no modality is present and the state is unchanged.
    pub async fn tick(&self, at: DateTime<Utc>) -> Option<FusedEmotionState> {
        let calibration = match self.calibration.calibration_map().await {
            Ok(map) => map,
            Err(e) => {
                warn!(session = %self.id, error = %e, "Calibration unavailable, using identity");
                CalibrationMap::new()
            }
        };
        let base = self.config.intervention.threshold;
        let threshold = match self.calibration.intervention_threshold(base).await {
            Ok(threshold) => threshold,
            Err(e) => {
                warn!(session = %self.id, error = %e, "Personal threshold unavailable");
                base
            }
        };
        let recent = match self.history.recent(self.config.recent_history_limit).await {
            Ok(recent) => recent,
            Err(e) => {
                warn!(session = %self.id, error = %e, "History unavailable, fusing without it");
                Vec::new()
            }
        };

        let ctx = FusionContext::new()
            .with_calibration(calibration)
            .with_history(recent)
            .with_threshold(threshold)
            .with_suppression(self.is_suppressed());
        let snapshot = self.buffers.snapshot().await;
        let state = self.pipeline.lock().tick(&snapshot, &ctx, at)?;

        debug!(
            session = %self.id,
            emotion = %state.primary_emotion,
            confidence = state.confidence,
            uncertainty = state.uncertainty,
            modalities = snapshot.len(),
            intervention = state.intervention_needed,
            "Fused emotion state"
        );

        if let Err(e) = self.history.persist(&state).await {
            warn!(session = %self.id, error = %e, "Failed to persist fused state");
        }
        // No subscriber is not an error
        let _ = self.states.send(state.clone());
        Some(state)
    }

    /// Hand a baseline sample to the calibration store
    pub async fn record_baseline(&self, sample: BaselineSample) -> Result<()> {
        self.calibration.record_sample(sample).await
    }

    /// Record the state's own (emotion, confidence) as a baseline sample
    pub async fn record_state_baseline(&self, state: &FusedEmotionState) -> Result<()> {
        self.record_baseline(BaselineSample::new(
            state.primary_emotion,
            state.confidence,
            state.timestamp,
        ))
        .await
    }

    /// Forget one modality: its analyzer state and its slot
    pub async fn stop_modality(&self, modality: Modality) {
        match modality {
            Modality::Facial => self.facial.lock().reset(),
            Modality::Voice => self.voice.lock().reset(),
            Modality::Text => self.text.lock().reset(),
        }
        self.buffers.clear(modality).await;
        info!(session = %self.id, modality = %modality, "Modality stopped");
    }

    /// Forget all per-session state (analyzers, stabilizer, slots)
    pub async fn reset(&self) {
        self.facial.lock().reset();
        self.voice.lock().reset();
        self.text.lock().reset();
        self.pipeline.lock().reset();
        self.buffers.clear_all().await;
        debug!(session = %self.id, "Session reset");
    }
}

impl std::fmt::Debug for MoodlensSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MoodlensSession")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("suppressed", &self.is_suppressed())
            .finish_non_exhaustive()
    }
}
