//! Scheduler behaviour of the background loops, on a paused clock

use std::f64::consts::PI;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use moodlens::prelude::*;

/// Audio source producing a loud 440 Hz tone and counting captures
struct ToneSource {
    captures: Arc<AtomicUsize>,
}

#[async_trait]
impl CaptureSource for ToneSource {
    type Frame = AudioFrame;

    async fn capture(&mut self) -> Option<AudioFrame> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        let time_domain = (0..1024)
            .map(|i| {
                let s = (2.0 * PI * 440.0 * i as f64 / 44_100.0).sin();
                (128.0 + 90.0 * s).round() as u8
            })
            .collect();
        let mut frequency = vec![20u8; 512];
        frequency[10] = 240;
        Some(AudioFrame::new(time_domain, frequency, Utc::now()))
    }
}

/// Source that never has a frame (device busy)
struct IdleSource;

#[async_trait]
impl CaptureSource for IdleSource {
    type Frame = PixelFrame;

    async fn capture(&mut self) -> Option<PixelFrame> {
        None
    }
}

fn service() -> MoodlensService {
    let session = MoodlensSession::new(MoodlensConfig::default()).unwrap();
    MoodlensService::new(Arc::new(session))
}

#[tokio::test(start_paused = true)]
async fn test_voice_loop_runs_on_its_cadence() {
    let service = service();
    let captures = Arc::new(AtomicUsize::new(0));
    service
        .start_voice(ToneSource {
            captures: captures.clone(),
        })
        .unwrap();

    // ticks at 0, 1.5, 3.0 and 4.5 s
    tokio::time::sleep(Duration::from_millis(4_600)).await;
    assert_eq!(captures.load(Ordering::SeqCst), 4);
    assert!(service.session().buffers().is_present(Modality::Voice).await);

    service.stop_modality(Modality::Voice).await.unwrap();
    assert!(!service.is_running(ServiceTask::Voice));
    assert!(!service.session().buffers().is_present(Modality::Voice).await);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(captures.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn test_text_is_debounced() {
    let service = service();
    let text = service.start_text().unwrap();

    for partial in ["I am", "I am not", "I am not happy"] {
        text.send(TextSample::new(partial, Utc::now())).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    // 300 ms after the last keystroke: still waiting
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!service.session().buffers().is_present(Modality::Text).await);

    tokio::time::sleep(Duration::from_millis(400)).await;
    let snapshot = service.session().buffers().snapshot().await;
    assert_eq!(
        snapshot.text.and_then(|t| t.emotion),
        Some(moodlens::TextEmotion::Sad)
    );
}

#[tokio::test(start_paused = true)]
async fn test_slot_update_triggers_fusion() {
    let service = service();
    let mut states = service.session().subscribe();
    service.start_fusion().unwrap();
    let text = service.start_text().unwrap();

    text.send(TextSample::new("I am not happy", Utc::now()))
        .await
        .unwrap();

    // well before the next periodic fusion tick at 3 s
    let state = tokio::time::timeout(Duration::from_millis(1_000), states.recv())
        .await
        .expect("fused state after text update")
        .unwrap();
    assert_eq!(state.primary_emotion, Emotion::Sad);
    assert!(state.modalities.text.is_some());

    service.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_stopping_one_modality_keeps_others() {
    let service = service();
    service.start_facial(IdleSource).unwrap();
    service
        .start_voice(ToneSource {
            captures: Arc::new(AtomicUsize::new(0)),
        })
        .unwrap();
    service.start_fusion().unwrap();

    service.stop_modality(Modality::Facial).await.unwrap();
    assert!(!service.is_running(ServiceTask::Facial));
    assert!(service.is_running(ServiceTask::Voice));
    assert!(service.is_running(ServiceTask::Fusion));

    tokio::time::sleep(Duration::from_secs(4)).await;
    let state = service.session().tick(Utc::now()).await.unwrap();
    assert!(state.modalities.facial.is_none());
    assert!(state.modalities.voice.is_some());

    service.shutdown().await.unwrap();
    for task in [
        ServiceTask::Facial,
        ServiceTask::Voice,
        ServiceTask::Text,
        ServiceTask::Fusion,
    ] {
        assert!(!service.is_running(task));
    }
}

#[tokio::test]
async fn test_loop_cannot_start_twice() {
    let service = service();
    service.start_fusion().unwrap();
    assert!(matches!(
        service.start_fusion(),
        Err(MoodlensError::Runtime(_))
    ));

    // stopping an idle loop is a no-op
    service.stop(ServiceTask::Text).await.unwrap();
    service.shutdown().await.unwrap();
    service.start_fusion().unwrap();
    service.shutdown().await.unwrap();
}
