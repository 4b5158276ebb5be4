//! Per-modality observations and the snapshot fusion reads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Breakdown, Emotion, FacialEmotion, Label, Modality, Sentiment, TextEmotion, VoiceTone};

/// Coarse speaking tempo derived from energy and zero crossings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeakingRate {
    /// Sparse activity
    Slow,
    /// Typical activity
    Normal,
    /// Dense activity
    Fast,
}

impl SpeakingRate {
    /// Signed embedding: slow -1, normal 0, fast +1
    pub fn embedding(self) -> f64 {
        match self {
            SpeakingRate::Slow => -1.0,
            SpeakingRate::Normal => 0.0,
            SpeakingRate::Fast => 1.0,
        }
    }
}

/// Facial classifier output for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacialObservation {
    /// Reported (smoothed) expression
    pub emotion: FacialEmotion,
    /// Confidence in 30..=100
    pub confidence: f64,
    /// Smoothed distribution over expressions
    pub breakdown: Option<Breakdown<FacialEmotion>>,
    /// Capture timestamp
    pub timestamp: DateTime<Utc>,
}

impl FacialObservation {
    /// Observation without a breakdown
    pub fn new(emotion: FacialEmotion, confidence: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            emotion,
            confidence,
            breakdown: None,
            timestamp,
        }
    }

    /// Attach a breakdown
    pub fn with_breakdown(mut self, breakdown: Breakdown<FacialEmotion>) -> Self {
        self.breakdown = Some(breakdown);
        self
    }
}

/// Voice classifier output for one audio frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceObservation {
    /// Reported (smoothed) tone
    pub tone: VoiceTone,
    /// Smoothed probability of the reported tone, floored at 30
    pub confidence: f64,
    /// Vocal intensity in 0..=100, derived from energy; used as fusion strength
    pub intensity: f64,
    /// RMS energy in 0..=1
    pub energy: f64,
    /// Dominant pitch in Hz
    pub pitch_hz: f64,
    /// Speaking tempo
    pub speaking_rate: SpeakingRate,
    /// Smoothed distribution over tones
    pub breakdown: Option<Breakdown<VoiceTone>>,
    /// Capture timestamp
    pub timestamp: DateTime<Utc>,
}

impl VoiceObservation {
    /// Observation with neutral acoustics and no breakdown
    pub fn new(tone: VoiceTone, intensity: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            tone,
            confidence: intensity,
            intensity,
            energy: intensity / 200.0,
            pitch_hz: 150.0,
            speaking_rate: SpeakingRate::Normal,
            breakdown: None,
            timestamp,
        }
    }

    /// Attach a breakdown
    pub fn with_breakdown(mut self, breakdown: Breakdown<VoiceTone>) -> Self {
        self.breakdown = Some(breakdown);
        self
    }
}

/// Text classifier output for one piece of text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextObservation {
    /// Detailed label, when the classifier produced one
    pub emotion: Option<TextEmotion>,
    /// Coarse sentiment
    pub sentiment: Sentiment,
    /// Confidence in 0..=100
    pub confidence: f64,
    /// Salient words from the classified text
    pub keywords: Vec<String>,
    /// Distribution over detailed labels
    pub breakdown: Option<Breakdown<TextEmotion>>,
    /// Capture timestamp
    pub timestamp: DateTime<Utc>,
}

impl TextObservation {
    /// Observation carrying a detailed label
    pub fn new(emotion: TextEmotion, confidence: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            emotion: Some(emotion),
            sentiment: emotion.sentiment(),
            confidence,
            keywords: Vec::new(),
            breakdown: None,
            timestamp,
        }
    }

    /// Observation carrying only a sentiment
    pub fn from_sentiment(sentiment: Sentiment, confidence: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            emotion: None,
            sentiment,
            confidence,
            keywords: Vec::new(),
            breakdown: None,
            timestamp,
        }
    }

    /// Attach a breakdown
    pub fn with_breakdown(mut self, breakdown: Breakdown<TextEmotion>) -> Self {
        self.breakdown = Some(breakdown);
        self
    }

    /// Attach keywords
    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords;
        self
    }
}

/// Tagged union of the three modality payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "modality", rename_all = "snake_case")]
pub enum ModalityObservation {
    /// Facial payload
    Facial(FacialObservation),
    /// Voice payload
    Voice(VoiceObservation),
    /// Text payload
    Text(TextObservation),
}

impl ModalityObservation {
    /// Modality of this payload
    pub fn modality(&self) -> Modality {
        match self {
            ModalityObservation::Facial(_) => Modality::Facial,
            ModalityObservation::Voice(_) => Modality::Voice,
            ModalityObservation::Text(_) => Modality::Text,
        }
    }

    /// Modality-local label name
    pub fn local_label(&self) -> &'static str {
        match self {
            ModalityObservation::Facial(f) => f.emotion.as_str(),
            ModalityObservation::Voice(v) => v.tone.as_str(),
            ModalityObservation::Text(t) => match t.emotion {
                Some(e) => e.as_str(),
                None => match t.sentiment {
                    Sentiment::Positive => "positive",
                    Sentiment::Negative => "negative",
                    Sentiment::Neutral => "neutral",
                },
            },
        }
    }

    /// Canonical emotion via the fixed lookup tables
    ///
    /// Text uses its detailed label first and falls back to sentiment.
    pub fn canonical_emotion(&self) -> Emotion {
        match self {
            ModalityObservation::Facial(f) => f.emotion.to_emotion(),
            ModalityObservation::Voice(v) => v.tone.to_emotion(),
            ModalityObservation::Text(t) => t
                .emotion
                .map(TextEmotion::to_emotion)
                .unwrap_or_else(|| t.sentiment.to_emotion()),
        }
    }

    /// Strength in 0..=100 contributed to fusion
    ///
    /// Facial and text contribute their confidence, voice its intensity.
    pub fn strength(&self) -> f64 {
        let raw = match self {
            ModalityObservation::Facial(f) => f.confidence,
            ModalityObservation::Voice(v) => v.intensity,
            ModalityObservation::Text(t) => t.confidence,
        };
        if raw.is_finite() {
            raw.clamp(0.0, 100.0)
        } else {
            0.0
        }
    }

    /// Capture timestamp
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            ModalityObservation::Facial(f) => f.timestamp,
            ModalityObservation::Voice(v) => v.timestamp,
            ModalityObservation::Text(t) => t.timestamp,
        }
    }
}

impl From<FacialObservation> for ModalityObservation {
    fn from(value: FacialObservation) -> Self {
        ModalityObservation::Facial(value)
    }
}

impl From<VoiceObservation> for ModalityObservation {
    fn from(value: VoiceObservation) -> Self {
        ModalityObservation::Voice(value)
    }
}

impl From<TextObservation> for ModalityObservation {
    fn from(value: TextObservation) -> Self {
        ModalityObservation::Text(value)
    }
}

/// Latest observation per modality, as read by one fusion tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModalitySnapshot {
    /// Latest facial observation
    pub facial: Option<FacialObservation>,
    /// Latest voice observation
    pub voice: Option<VoiceObservation>,
    /// Latest text observation
    pub text: Option<TextObservation>,
}

impl ModalitySnapshot {
    /// Empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the facial slot
    pub fn with_facial(mut self, obs: FacialObservation) -> Self {
        self.facial = Some(obs);
        self
    }

    /// Set the voice slot
    pub fn with_voice(mut self, obs: VoiceObservation) -> Self {
        self.voice = Some(obs);
        self
    }

    /// Set the text slot
    pub fn with_text(mut self, obs: TextObservation) -> Self {
        self.text = Some(obs);
        self
    }

    /// Store an observation in its slot
    pub fn insert(&mut self, obs: ModalityObservation) {
        match obs {
            ModalityObservation::Facial(f) => self.facial = Some(f),
            ModalityObservation::Voice(v) => self.voice = Some(v),
            ModalityObservation::Text(t) => self.text = Some(t),
        }
    }

    /// Whether no modality is present
    pub fn is_empty(&self) -> bool {
        self.facial.is_none() && self.voice.is_none() && self.text.is_none()
    }

    /// Number of present modalities
    pub fn len(&self) -> usize {
        self.observations().len()
    }

    /// Present observations in fusion order (facial, voice, text)
    pub fn observations(&self) -> Vec<ModalityObservation> {
        let mut out = Vec::with_capacity(3);
        if let Some(f) = &self.facial {
            out.push(ModalityObservation::Facial(f.clone()));
        }
        if let Some(v) = &self.voice {
            out.push(ModalityObservation::Voice(v.clone()));
        }
        if let Some(t) = &self.text {
            out.push(ModalityObservation::Text(t.clone()));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_falls_back_to_sentiment() {
        let obs: ModalityObservation =
            TextObservation::from_sentiment(Sentiment::Negative, 70.0, Utc::now()).into();
        assert_eq!(obs.canonical_emotion(), Emotion::Sad);
        assert_eq!(obs.local_label(), "negative");

        let obs: ModalityObservation =
            TextObservation::new(TextEmotion::Angry, 70.0, Utc::now()).into();
        assert_eq!(obs.canonical_emotion(), Emotion::Frustrated);
    }

    #[test]
    fn test_voice_strength_is_intensity() {
        let mut voice = VoiceObservation::new(VoiceTone::Stressed, 90.0, Utc::now());
        voice.confidence = 45.0;
        let obs: ModalityObservation = voice.into();
        assert_eq!(obs.strength(), 90.0);
    }

    #[test]
    fn test_strength_is_clamped() {
        let obs: ModalityObservation =
            FacialObservation::new(FacialEmotion::Happy, 140.0, Utc::now()).into();
        assert_eq!(obs.strength(), 100.0);
        let obs: ModalityObservation =
            FacialObservation::new(FacialEmotion::Happy, f64::NAN, Utc::now()).into();
        assert_eq!(obs.strength(), 0.0);
    }

    #[test]
    fn test_snapshot_slots() {
        let mut snap = ModalitySnapshot::new();
        assert!(snap.is_empty());
        snap.insert(TextObservation::new(TextEmotion::Calm, 60.0, Utc::now()).into());
        snap.insert(FacialObservation::new(FacialEmotion::Sad, 60.0, Utc::now()).into());
        assert_eq!(snap.len(), 2);
        let modalities: Vec<Modality> = snap.observations().iter().map(|o| o.modality()).collect();
        assert_eq!(modalities, vec![Modality::Facial, Modality::Text]);
    }

    #[test]
    fn test_observation_serializes_with_tag() {
        let obs: ModalityObservation =
            VoiceObservation::new(VoiceTone::Calm, 40.0, Utc::now()).into();
        let json = serde_json::to_value(&obs).unwrap();
        assert_eq!(json["modality"], "voice");
        assert_eq!(json["tone"], "calm");
    }
}
