//! Text pipeline: last sentence → classify → observation

use moodlens_core::{TextObservation, TextSample, TextStrategy};

use crate::classifier::{classifier_for, TextClassifier};
use crate::tokenize::{extract_keywords, last_sentence};

/// Text analyzer for one session
///
/// Only the last sentence of the running text is classified, so a long
/// message reflects what the user is typing now.
#[derive(Debug)]
pub struct TextAnalyzer {
    classifier: Box<dyn TextClassifier>,
    last_classified: Option<String>,
}

impl TextAnalyzer {
    /// Analyzer running the given strategy
    pub fn new(strategy: TextStrategy) -> Self {
        Self {
            classifier: classifier_for(strategy),
            last_classified: None,
        }
    }

    /// Replace the classifier
    pub fn with_classifier(mut self, classifier: Box<dyn TextClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Strategy of the active classifier
    pub fn strategy(&self) -> TextStrategy {
        self.classifier.strategy()
    }

    /// Classify the last sentence of a sample; `None` for empty text
    pub fn analyze(&self, sample: &TextSample) -> Option<TextObservation> {
        let sentence = last_sentence(&sample.text);
        if sentence.is_empty() {
            return None;
        }

        let result = self.classifier.classify(sentence);
        tracing::debug!(
            strategy = %self.classifier.strategy(),
            emotion = %result.emotion,
            confidence = result.confidence,
            context = ?result.context,
            "Text classified"
        );

        Some(
            TextObservation::new(result.emotion, result.confidence, sample.captured_at)
                .with_breakdown(result.breakdown)
                .with_keywords(extract_keywords(sentence)),
        )
    }

    /// Like [`analyze`](Self::analyze), but `None` when the last sentence
    /// is the one classified previously
    pub fn analyze_if_changed(&mut self, sample: &TextSample) -> Option<TextObservation> {
        let sentence = last_sentence(&sample.text);
        if self.last_classified.as_deref() == Some(sentence) {
            tracing::trace!("Last sentence unchanged, skipping");
            return None;
        }
        let observation = self.analyze(sample)?;
        self.last_classified = Some(sentence.to_string());
        Some(observation)
    }

    /// Forget the last classified sentence
    pub fn reset(&mut self) {
        self.last_classified = None;
    }
}

impl Default for TextAnalyzer {
    fn default() -> Self {
        Self::new(TextStrategy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use moodlens_core::{Sentiment, TextEmotion};

    fn sample(text: &str) -> TextSample {
        TextSample::new(text, Utc::now())
    }

    #[test]
    fn test_empty_text_produces_nothing() {
        let analyzer = TextAnalyzer::default();
        assert!(analyzer.analyze(&sample("")).is_none());
        assert!(analyzer.analyze(&sample("  \n ")).is_none());
    }

    #[test]
    fn test_classifies_last_sentence_only() {
        let analyzer = TextAnalyzer::new(TextStrategy::Clause);
        let obs = analyzer
            .analyze(&sample("I love this project. I am not happy with the build"))
            .unwrap();
        assert_eq!(obs.emotion, Some(TextEmotion::Sad));
        assert_eq!(obs.sentiment, Sentiment::Negative);
        assert_eq!(obs.keywords, vec!["happy", "with", "build"]);
        assert!((obs.breakdown.unwrap().total() - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_unchanged_sentence_is_skipped() {
        let mut analyzer = TextAnalyzer::default();
        assert!(analyzer.analyze_if_changed(&sample("I feel great")).is_some());
        assert!(analyzer.analyze_if_changed(&sample("I feel great")).is_none());
        assert!(analyzer
            .analyze_if_changed(&sample("I feel great. Now tired"))
            .is_some());
        analyzer.reset();
        assert!(analyzer
            .analyze_if_changed(&sample("I feel great. Now tired"))
            .is_some());
    }

    #[test]
    fn test_both_strategies_agree_on_clear_text() {
        for strategy in [TextStrategy::Clause, TextStrategy::Attention] {
            let analyzer = TextAnalyzer::new(strategy);
            assert_eq!(analyzer.strategy(), strategy);
            let obs = analyzer.analyze(&sample("I absolutely love this")).unwrap();
            assert_eq!(obs.emotion, Some(TextEmotion::Happy));
            assert!(obs.confidence > 70.0);
            assert_eq!(obs.sentiment, Sentiment::Positive);
        }
    }

    #[test]
    fn test_clause_after_but_dominates_in_every_strategy() {
        assert_eq!(TextAnalyzer::default().strategy(), TextStrategy::Attention);
        for strategy in [TextStrategy::Clause, TextStrategy::Attention] {
            let obs = TextAnalyzer::new(strategy)
                .analyze(&sample("I love the app but it keeps crashing"))
                .unwrap();
            assert_eq!(obs.emotion, Some(TextEmotion::Angry), "{strategy}");
            assert_eq!(obs.sentiment, Sentiment::Negative);
        }
    }
}
