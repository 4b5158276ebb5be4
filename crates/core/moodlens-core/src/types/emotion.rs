//! Emotion taxonomies
//!
//! The canonical [`Emotion`] space plus the modality-local label sets
//! ([`FacialEmotion`], [`VoiceTone`], [`TextEmotion`]) and the fixed lookup
//! tables that map each local label into the canonical space.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::breakdown::Label;
use super::intervention::InterventionType;
use crate::MoodlensError;

/// Canonical emotion space that every modality is mapped into before fusion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    /// Relaxed, settled
    Calm,
    /// Under pressure
    Stressed,
    /// Worried, apprehensive
    Anxious,
    /// Low mood
    Sad,
    /// Positive mood
    Happy,
    /// High positive arousal
    Energized,
    /// Irritated, blocked
    Frustrated,
    /// Low energy
    Fatigued,
    /// No clear signal
    Neutral,
}

impl Emotion {
    /// Emotions that may warrant a supportive intervention
    pub const SUPPORT: [Emotion; 5] = [
        Emotion::Stressed,
        Emotion::Anxious,
        Emotion::Sad,
        Emotion::Frustrated,
        Emotion::Fatigued,
    ];

    /// Whether this emotion is eligible to trigger an intervention
    pub fn needs_support(self) -> bool {
        Self::SUPPORT.contains(&self)
    }

    /// Intervention kind suggested for this emotion
    pub fn intervention(self) -> Option<InterventionType> {
        match self {
            Emotion::Stressed => Some(InterventionType::Breathing),
            Emotion::Anxious => Some(InterventionType::Grounding),
            Emotion::Sad => Some(InterventionType::Gratitude),
            Emotion::Frustrated => Some(InterventionType::Break),
            Emotion::Fatigued => Some(InterventionType::Movement),
            Emotion::Calm | Emotion::Happy | Emotion::Energized | Emotion::Neutral => None,
        }
    }

    /// Pairwise similarity used by the temporal stabilizer
    ///
    /// Symmetric; identical emotions are 1.0 and unlisted pairs 0.2.
    pub fn similarity(self, other: Emotion) -> f64 {
        use Emotion::*;
        if self == other {
            return 1.0;
        }
        let (a, b) = if self <= other {
            (self, other)
        } else {
            (other, self)
        };
        match (a, b) {
            (Calm, Happy) => 0.8,
            (Stressed, Anxious) => 0.9,
            (Stressed, Frustrated) => 0.85,
            (Anxious, Frustrated) => 0.75,
            (Sad, Fatigued) => 0.7,
            (Happy, Energized) => 0.85,
            _ => 0.2,
        }
    }
}

impl Label for Emotion {
    const ALL: &'static [Self] = &[
        Emotion::Calm,
        Emotion::Stressed,
        Emotion::Anxious,
        Emotion::Sad,
        Emotion::Happy,
        Emotion::Energized,
        Emotion::Frustrated,
        Emotion::Fatigued,
        Emotion::Neutral,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Emotion::Calm => "calm",
            Emotion::Stressed => "stressed",
            Emotion::Anxious => "anxious",
            Emotion::Sad => "sad",
            Emotion::Happy => "happy",
            Emotion::Energized => "energized",
            Emotion::Frustrated => "frustrated",
            Emotion::Fatigued => "fatigued",
            Emotion::Neutral => "neutral",
        }
    }
}

/// Facial expression labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacialEmotion {
    /// Relaxed face
    Neutral,
    /// Smiling
    Happy,
    /// Downturned
    Sad,
    /// Tense brow
    Angry,
    /// Raised brow, widened eyes
    Fearful,
    /// Wrinkled nose
    Disgusted,
    /// Open mouth, raised brow
    Surprised,
}

impl FacialEmotion {
    /// Canonical emotion for this expression
    pub fn to_emotion(self) -> Emotion {
        match self {
            FacialEmotion::Neutral => Emotion::Calm,
            FacialEmotion::Happy => Emotion::Happy,
            FacialEmotion::Sad => Emotion::Sad,
            FacialEmotion::Angry => Emotion::Frustrated,
            FacialEmotion::Fearful => Emotion::Anxious,
            FacialEmotion::Disgusted => Emotion::Stressed,
            FacialEmotion::Surprised => Emotion::Energized,
        }
    }
}

impl Label for FacialEmotion {
    const ALL: &'static [Self] = &[
        FacialEmotion::Neutral,
        FacialEmotion::Happy,
        FacialEmotion::Sad,
        FacialEmotion::Angry,
        FacialEmotion::Fearful,
        FacialEmotion::Disgusted,
        FacialEmotion::Surprised,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            FacialEmotion::Neutral => "neutral",
            FacialEmotion::Happy => "happy",
            FacialEmotion::Sad => "sad",
            FacialEmotion::Angry => "angry",
            FacialEmotion::Fearful => "fearful",
            FacialEmotion::Disgusted => "disgusted",
            FacialEmotion::Surprised => "surprised",
        }
    }
}

/// Vocal tone labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceTone {
    /// Even, low-energy delivery
    Calm,
    /// Raised pitch and energy
    Stressed,
    /// High positive energy
    Excited,
    /// Irregular, clipped delivery
    Frustrated,
    /// Low energy and pitch
    Tired,
}

impl VoiceTone {
    /// Canonical emotion for this tone
    pub fn to_emotion(self) -> Emotion {
        match self {
            VoiceTone::Calm => Emotion::Calm,
            VoiceTone::Stressed => Emotion::Stressed,
            VoiceTone::Excited => Emotion::Energized,
            VoiceTone::Frustrated => Emotion::Frustrated,
            VoiceTone::Tired => Emotion::Fatigued,
        }
    }
}

impl Label for VoiceTone {
    const ALL: &'static [Self] = &[
        VoiceTone::Calm,
        VoiceTone::Stressed,
        VoiceTone::Excited,
        VoiceTone::Frustrated,
        VoiceTone::Tired,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            VoiceTone::Calm => "calm",
            VoiceTone::Stressed => "stressed",
            VoiceTone::Excited => "excited",
            VoiceTone::Frustrated => "frustrated",
            VoiceTone::Tired => "tired",
        }
    }
}

/// Detailed text emotion labels produced by the lexical classifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextEmotion {
    /// Joy, love, gratitude
    Happy,
    /// Sadness, disappointment
    Sad,
    /// Anger, irritation
    Angry,
    /// Worry, fear
    Anxious,
    /// Enthusiasm
    Excited,
    /// Relaxation, balance
    Calm,
    /// Pressure, overload
    Stressed,
    /// Tiredness, exhaustion
    Fatigued,
}

impl TextEmotion {
    /// Canonical emotion for this text label
    pub fn to_emotion(self) -> Emotion {
        match self {
            TextEmotion::Happy => Emotion::Happy,
            TextEmotion::Sad => Emotion::Sad,
            TextEmotion::Angry => Emotion::Frustrated,
            TextEmotion::Anxious => Emotion::Anxious,
            TextEmotion::Excited => Emotion::Energized,
            TextEmotion::Calm => Emotion::Calm,
            TextEmotion::Stressed => Emotion::Stressed,
            TextEmotion::Fatigued => Emotion::Fatigued,
        }
    }

    /// Coarse sentiment of this label
    pub fn sentiment(self) -> Sentiment {
        match self {
            TextEmotion::Happy | TextEmotion::Excited => Sentiment::Positive,
            TextEmotion::Sad
            | TextEmotion::Angry
            | TextEmotion::Anxious
            | TextEmotion::Stressed
            | TextEmotion::Fatigued => Sentiment::Negative,
            TextEmotion::Calm => Sentiment::Neutral,
        }
    }

    /// Whether lexicon hits for this label carry positive polarity
    pub fn is_positive(self) -> bool {
        matches!(
            self,
            TextEmotion::Happy | TextEmotion::Excited | TextEmotion::Calm
        )
    }

    /// Label a negated mention of this emotion transfers to
    ///
    /// "not happy" reads as sad, "not calm" as anxious, and negated
    /// negative states ("not angry", "not worried") settle to calm.
    pub fn negated(self) -> TextEmotion {
        match self {
            TextEmotion::Happy => TextEmotion::Sad,
            TextEmotion::Calm => TextEmotion::Anxious,
            TextEmotion::Excited
            | TextEmotion::Sad
            | TextEmotion::Angry
            | TextEmotion::Anxious
            | TextEmotion::Stressed
            | TextEmotion::Fatigued => TextEmotion::Calm,
        }
    }
}

impl Label for TextEmotion {
    const ALL: &'static [Self] = &[
        TextEmotion::Happy,
        TextEmotion::Sad,
        TextEmotion::Angry,
        TextEmotion::Anxious,
        TextEmotion::Excited,
        TextEmotion::Calm,
        TextEmotion::Stressed,
        TextEmotion::Fatigued,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            TextEmotion::Happy => "happy",
            TextEmotion::Sad => "sad",
            TextEmotion::Angry => "angry",
            TextEmotion::Anxious => "anxious",
            TextEmotion::Excited => "excited",
            TextEmotion::Calm => "calm",
            TextEmotion::Stressed => "stressed",
            TextEmotion::Fatigued => "fatigued",
        }
    }
}

/// Coarse text sentiment, used when no detailed label is available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    /// Positive polarity
    Positive,
    /// Negative polarity
    Negative,
    /// No clear polarity
    Neutral,
}

impl Sentiment {
    /// Fallback canonical emotion for a sentiment
    pub fn to_emotion(self) -> Emotion {
        match self {
            Sentiment::Positive => Emotion::Happy,
            Sentiment::Negative => Emotion::Sad,
            Sentiment::Neutral => Emotion::Calm,
        }
    }
}

/// One independent sensing channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    /// Camera frames
    Facial,
    /// Microphone buffers
    Voice,
    /// Typed text
    Text,
}

impl Modality {
    /// All modalities in fusion order
    pub const ALL: [Modality; 3] = [Modality::Facial, Modality::Voice, Modality::Text];

    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Facial => "facial",
            Modality::Voice => "voice",
            Modality::Text => "text",
        }
    }
}

macro_rules! impl_label_text {
    ($($ty:ty),* $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }

            impl FromStr for $ty {
                type Err = MoodlensError;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    let needle = s.trim().to_lowercase();
                    <$ty as Label>::ALL
                        .iter()
                        .copied()
                        .find(|label| label.as_str() == needle)
                        .ok_or_else(|| {
                            MoodlensError::validation(format!(
                                "unknown {} label '{}'",
                                stringify!($ty),
                                s
                            ))
                        })
                }
            }
        )*
    };
}

impl_label_text!(Emotion, FacialEmotion, VoiceTone, TextEmotion);

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
