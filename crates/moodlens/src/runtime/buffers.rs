//! Latest-observation slots shared between the modality loops and fusion

use moodlens_core::{
    FacialObservation, Modality, ModalitySnapshot, TextObservation, VoiceObservation,
};
use tokio::sync::{futures::Notified, Notify, RwLock};

/// One slot per modality, each behind its own lock
///
/// Each slot has a single writer (its modality loop) and any number of
/// readers. Every write wakes the task waiting on [`updated`](Self::updated),
/// or the next one to wait if none is waiting yet.
#[derive(Debug, Default)]
pub struct ModalityBuffers {
    facial: RwLock<Option<FacialObservation>>,
    voice: RwLock<Option<VoiceObservation>>,
    text: RwLock<Option<TextObservation>>,
    notify: Notify,
}

impl ModalityBuffers {
    /// Empty buffers
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the facial slot
    pub async fn set_facial(&self, observation: Option<FacialObservation>) {
        *self.facial.write().await = observation;
        self.notify.notify_one();
    }

    /// Replace the voice slot
    pub async fn set_voice(&self, observation: Option<VoiceObservation>) {
        *self.voice.write().await = observation;
        self.notify.notify_one();
    }

    /// Replace the text slot
    pub async fn set_text(&self, observation: Option<TextObservation>) {
        *self.text.write().await = observation;
        self.notify.notify_one();
    }

    /// Empty one modality's slot
    pub async fn clear(&self, modality: Modality) {
        match modality {
            Modality::Facial => self.set_facial(None).await,
            Modality::Voice => self.set_voice(None).await,
            Modality::Text => self.set_text(None).await,
        }
    }

    /// Empty every slot
    pub async fn clear_all(&self) {
        for modality in Modality::ALL {
            self.clear(modality).await;
        }
    }

    /// Whether a modality currently holds an observation
    pub async fn is_present(&self, modality: Modality) -> bool {
        match modality {
            Modality::Facial => self.facial.read().await.is_some(),
            Modality::Voice => self.voice.read().await.is_some(),
            Modality::Text => self.text.read().await.is_some(),
        }
    }

    /// Copy of the three slots
    ///
    /// Slots are read one after another; a write landing between two reads
    /// shows up in the next snapshot.
    pub async fn snapshot(&self) -> ModalitySnapshot {
        ModalitySnapshot {
            facial: self.facial.read().await.clone(),
            voice: self.voice.read().await.clone(),
            text: self.text.read().await.clone(),
        }
    }

    /// Future resolving on the next slot write
    pub fn updated(&self) -> Notified<'_> {
        self.notify.notified()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use moodlens_core::{FacialEmotion, TextEmotion};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_slots_are_independent() {
        let buffers = ModalityBuffers::new();
        buffers
            .set_facial(Some(FacialObservation::new(FacialEmotion::Happy, 70.0, Utc::now())))
            .await;
        buffers
            .set_text(Some(TextObservation::new(TextEmotion::Sad, 60.0, Utc::now())))
            .await;

        let snapshot = buffers.snapshot().await;
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.voice.is_none());

        buffers.clear(Modality::Facial).await;
        assert!(!buffers.is_present(Modality::Facial).await);
        assert!(buffers.is_present(Modality::Text).await);

        buffers.clear_all().await;
        assert!(buffers.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_write_wakes_waiter() {
        let buffers = Arc::new(ModalityBuffers::new());
        let waiter = {
            let buffers = buffers.clone();
            tokio::spawn(async move { buffers.updated().await })
        };
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        buffers
            .set_text(Some(TextObservation::new(TextEmotion::Calm, 50.0, Utc::now())))
            .await;
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter woken")
            .unwrap();
    }
}
