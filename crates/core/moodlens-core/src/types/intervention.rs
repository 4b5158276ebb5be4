//! Intervention kinds and heuristic suggestions

use serde::{Deserialize, Serialize};

use super::Emotion;

/// Kind of wellness intervention a host may offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterventionType {
    /// Paced breathing
    Breathing,
    /// Stretch or walk
    Movement,
    /// Reframing exercise
    Cognitive,
    /// Reach out to someone
    Social,
    /// Step away from the task
    Break,
    /// Gratitude prompt
    Gratitude,
    /// Sensory grounding
    Grounding,
}

/// Urgency of a suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterventionPriority {
    /// Can wait
    Low,
    /// Default
    Medium,
    /// Offer promptly
    High,
}

/// Confidence above which a suggestion is marked high priority
pub const HIGH_PRIORITY_CONFIDENCE: u8 = 85;

/// A concrete, host-renderable suggestion attached to a fused state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterventionSuggestion {
    /// Intervention kind
    pub kind: InterventionType,
    /// Short instruction shown to the user
    pub action: String,
    /// Expected duration in seconds
    pub estimated_duration_secs: u32,
    /// Urgency
    pub priority: InterventionPriority,
}

impl InterventionSuggestion {
    /// Built-in suggestion for a supported emotion at the given confidence
    pub fn heuristic(emotion: Emotion, confidence: u8) -> Option<Self> {
        let kind = emotion.intervention()?;
        let (action, secs) = match emotion {
            Emotion::Stressed => ("Take 5 deep breaths: in for 4, hold for 4, out for 6", 60),
            Emotion::Anxious => ("Name 5 things you can see and 4 things you can hear", 90),
            Emotion::Sad => ("Write down one good thing that happened today", 120),
            Emotion::Frustrated => ("Step away from the screen for five minutes", 300),
            Emotion::Fatigued => ("Stand up and stretch your shoulders and neck", 120),
            Emotion::Calm | Emotion::Happy | Emotion::Energized | Emotion::Neutral => return None,
        };
        let priority = if confidence > HIGH_PRIORITY_CONFIDENCE {
            InterventionPriority::High
        } else {
            InterventionPriority::Medium
        };
        Some(Self {
            kind,
            action: action.to_string(),
            estimated_duration_secs: secs,
            priority,
        })
    }
}
