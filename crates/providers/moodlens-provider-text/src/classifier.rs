//! Text classifier interface shared by both scoring strategies

use moodlens_core::{Breakdown, Label, TextEmotion, TextStrategy};
use serde::{Deserialize, Serialize};

use crate::grammar::EMPHATIC_CONFIDENCE;

/// Confidence reported for empty input
pub const EMPTY_CONFIDENCE: f64 = 30.0;

/// How a classification was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationContext {
    /// No text to classify
    Empty,
    /// "never felt so great" phrasing forced to happy
    EmphaticPositive,
    /// Signals cancelled out or were too weak; settled to calm
    Balanced,
    /// Clause scores aggregated with contrast weighting
    ClauseAggregated,
    /// Token logits converted through softmax
    TokenAttention,
    /// No lexicon word matched
    NoSignal,
}

/// Result of classifying one piece of text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextClassification {
    /// Winning label
    pub emotion: TextEmotion,
    /// Confidence in 0..=100
    pub confidence: f64,
    /// Distribution over every text label
    pub breakdown: Breakdown<TextEmotion>,
    /// Path that produced the result
    pub context: ClassificationContext,
}

impl TextClassification {
    /// Result for empty or whitespace-only text
    pub fn empty() -> Self {
        Self {
            emotion: TextEmotion::Calm,
            confidence: EMPTY_CONFIDENCE,
            breakdown: leaning_toward(TextEmotion::Calm, 2.0),
            context: ClassificationContext::Empty,
        }
    }

    /// Result for emphatic positive phrasing
    pub fn emphatic_positive() -> Self {
        let rest = (100.0 - EMPHATIC_CONFIDENCE) / (TextEmotion::ALL.len() - 1) as f64;
        let breakdown = Breakdown::from_scores(TextEmotion::ALL.iter().map(|l| {
            let share = if *l == TextEmotion::Happy {
                EMPHATIC_CONFIDENCE
            } else {
                rest
            };
            (*l, share)
        }));
        Self {
            emotion: TextEmotion::Happy,
            confidence: EMPHATIC_CONFIDENCE,
            breakdown,
            context: ClassificationContext::EmphaticPositive,
        }
    }
}

/// Every label at weight 1 except `label`, which gets `weight`
pub(crate) fn leaning_toward(label: TextEmotion, weight: f64) -> Breakdown<TextEmotion> {
    Breakdown::from_scores(
        TextEmotion::ALL
            .iter()
            .map(|l| (*l, if *l == label { weight } else { 1.0 })),
    )
}

/// A lexical text scorer
///
/// Implementations are pure: the same text always yields the same
/// classification, and no input makes them fail.
pub trait TextClassifier: std::fmt::Debug + Send + Sync {
    /// Strategy this classifier implements
    fn strategy(&self) -> TextStrategy;

    /// Classify a piece of text
    fn classify(&self, text: &str) -> TextClassification;
}

/// Build the classifier for a configured strategy
pub fn classifier_for(strategy: TextStrategy) -> Box<dyn TextClassifier> {
    match strategy {
        TextStrategy::Clause => Box::new(crate::clause::ClauseClassifier::new()),
        TextStrategy::Attention => Box::new(crate::attention::TokenAttentionClassifier::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_result() {
        let c = TextClassification::empty();
        assert_eq!(c.emotion, TextEmotion::Calm);
        assert_eq!(c.breakdown.top().0, TextEmotion::Calm);
        assert!((c.breakdown.total() - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_emphatic_result() {
        let c = TextClassification::emphatic_positive();
        assert!((c.breakdown.get(TextEmotion::Happy) - 85.0).abs() < 1e-9);
        assert!((c.breakdown.total() - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_factory_matches_strategy() {
        for strategy in [TextStrategy::Clause, TextStrategy::Attention] {
            assert_eq!(classifier_for(strategy).strategy(), strategy);
        }
    }

    #[test]
    fn test_context_serializes_snake_case() {
        let json = serde_json::to_string(&ClassificationContext::EmphaticPositive).unwrap();
        assert_eq!(json, "\"emphatic_positive\"");
    }
}
