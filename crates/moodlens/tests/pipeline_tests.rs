//! End-to-end runs through a session with synthetic capture data

use chrono::{Duration, Utc};
use moodlens::prelude::*;
use moodlens::TextEmotion;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[tokio::test]
async fn test_random_audio_never_breaks_fusion() {
    let session = MoodlensSession::new(MoodlensConfig::default()).unwrap();
    let mut rng = StdRng::seed_from_u64(7);
    let start = Utc::now();

    for i in 0..60 {
        let td_len = rng.gen_range(0..2048);
        let fq_len = rng.gen_range(0..1024);
        let time_domain: Vec<u8> = (0..td_len).map(|_| rng.gen()).collect();
        let frequency: Vec<u8> = (0..fq_len).map(|_| rng.gen()).collect();
        let at = start + Duration::milliseconds(1_500 * i);

        if let Some(voice) = session
            .submit_audio(&AudioFrame::new(time_domain, frequency, at))
            .await
        {
            let breakdown = voice.breakdown.expect("voice breakdown");
            assert!((breakdown.total() - 100.0).abs() < 0.5);
            assert!((0.0..=100.0).contains(&voice.intensity));
        }

        if let Some(state) = session.tick(at).await {
            assert!(state.confidence <= 100);
            assert!(state.uncertainty <= 100);
            assert!(state.modalities.voice.is_some());
        }
    }
}

#[tokio::test]
async fn test_fused_state_serializes_snake_case() {
    let session = MoodlensSession::new(MoodlensConfig::default()).unwrap();
    let now = Utc::now();
    let text = session
        .submit_text(&TextSample::new("I am not happy", now))
        .await
        .unwrap();
    assert_eq!(text.emotion, Some(TextEmotion::Sad));

    let state = session.tick(now).await.unwrap();
    let json = serde_json::to_value(&state).unwrap();
    assert_eq!(json["primary_emotion"], "sad");
    assert_eq!(json["intervention_needed"], false);
    assert!(json["modalities"]["facial"].is_null());

    let back: FusedEmotionState = serde_json::from_value(json).unwrap();
    assert_eq!(back.primary_emotion, Emotion::Sad);
}

#[tokio::test]
async fn test_silence_removes_voice_from_fusion() {
    let session = MoodlensSession::new(MoodlensConfig::default()).unwrap();
    let now = Utc::now();

    let loud: Vec<u8> = (0..1024)
        .map(|i| if i % 8 < 4 { 228 } else { 28 })
        .collect();
    assert!(session
        .submit_audio(&AudioFrame::new(loud, vec![40; 512], now))
        .await
        .is_some());
    assert!(session.buffers().is_present(Modality::Voice).await);

    let silent = vec![128u8; 1024];
    assert!(session
        .submit_audio(&AudioFrame::new(silent, vec![0; 512], now))
        .await
        .is_none());
    assert!(session.tick(now).await.is_none());
}
