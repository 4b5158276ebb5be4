//! Clause-aware lexical scorer
//!
//! Text is split into clauses at punctuation and contrast conjunctions.
//! Each lexicon hit contributes a signed score to its clause:
//!
//! - intensifier within two tokens before the hit: ×1.3
//! - hedge anywhere in the clause: ×0.7
//! - negation within three tokens before the hit: positive hits flip to a
//!   negative score (`-(|s| + 0.5)`), negative hits are damped (`|s| × 0.5`),
//!   and the hit is credited to the negated label
//!
//! Clauses introduced by a contrast marker weigh 1.6×, and when the text
//! contains a contrast the final clause is further weighted 2.2×, so that
//! "X, but Y" is dominated by Y. First-person negations ("I am not happy")
//! add a fixed boost toward the expressed emotion.

use std::collections::BTreeMap;

use moodlens_core::{Breakdown, Label, TextEmotion, TextStrategy};

use crate::classifier::{leaning_toward, ClassificationContext, TextClassification, TextClassifier};
use crate::grammar::{self, NEGATION_BOOST};
use crate::lexicon::{self, polarity_weight};
use crate::tokenize::{self, Clause};

/// Multiplier for an intensified hit
pub const INTENSIFIER_FACTOR: f64 = 1.3;
/// Multiplier for every hit in a hedged clause
pub const HEDGE_FACTOR: f64 = 0.7;
/// Tokens scanned backwards for an intensifier
pub const INTENSIFIER_LOOKBACK: usize = 2;
/// Tokens scanned backwards for a negation
pub const NEGATION_LOOKBACK: usize = 3;
/// Weight of a clause introduced by a contrast marker
pub const CONTRAST_WEIGHT: f64 = 1.6;
/// Extra weight of the final clause when the text has a contrast
pub const FINAL_CLAUSE_WEIGHT: f64 = 2.2;
/// Aggregate magnitude below which the text reads as balanced
pub const BALANCED_THRESHOLD: f64 = 0.4;

const BREAKDOWN_BASELINE: f64 = 0.1;

/// Weight of clause `index` out of `count`
///
/// `global_contrast` tells whether the text contains any contrast marker.
pub fn clause_weight(
    index: usize,
    count: usize,
    follows_contrast: bool,
    global_contrast: bool,
) -> f64 {
    let mut w = if follows_contrast {
        CONTRAST_WEIGHT
    } else {
        1.0
    };
    if global_contrast && index + 1 == count {
        w *= FINAL_CLAUSE_WEIGHT;
    }
    w
}

/// Score of one clause before clause weighting
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClauseScore {
    /// Signed clause score (positive = pleasant)
    pub score: f64,
    /// Unsigned contribution per credited label
    pub contributions: BTreeMap<TextEmotion, f64>,
}

/// Clause/negation-aware text classifier
#[derive(Debug, Clone, Copy, Default)]
pub struct ClauseClassifier;

impl ClauseClassifier {
    /// Create a clause classifier
    pub fn new() -> Self {
        Self
    }

    /// Score one clause
    pub fn score_clause(&self, clause: &Clause) -> ClauseScore {
        let tokens = &clause.tokens;
        let hedged = tokens.iter().any(|t| lexicon::is_hedge(&t.clean));
        let mut result = ClauseScore::default();

        for (i, token) in tokens.iter().enumerate() {
            let labels = lexicon::lookup(&token.clean);
            if labels.is_empty() {
                continue;
            }
            let intensified = (1..=INTENSIFIER_LOOKBACK)
                .filter_map(|k| i.checked_sub(k))
                .any(|j| lexicon::is_intensifier(&tokens[j].clean));
            let negated = (1..=NEGATION_LOOKBACK)
                .filter_map(|k| i.checked_sub(k))
                .any(|j| lexicon::is_negation(&tokens[j].clean));

            for label in labels {
                let mut s = polarity_weight(label);
                if intensified {
                    s *= INTENSIFIER_FACTOR;
                }
                if hedged {
                    s *= HEDGE_FACTOR;
                }
                let (credited, s) = if !negated {
                    (label, s)
                } else if s > 0.0 {
                    (label.negated(), -(s.abs() + 0.5))
                } else {
                    (label.negated(), s.abs() * 0.5)
                };
                tracing::trace!(
                    token = %token.clean,
                    label = %credited,
                    score = s,
                    negated,
                    intensified,
                    hedged,
                    "Clause hit"
                );
                result.score += s;
                *result.contributions.entry(credited).or_insert(0.0) += s.abs();
            }
        }
        result
    }

}

impl TextClassifier for ClauseClassifier {
    fn strategy(&self) -> TextStrategy {
        TextStrategy::Clause
    }

    fn classify(&self, text: &str) -> TextClassification {
        if text.trim().is_empty() {
            return TextClassification::empty();
        }
        if grammar::is_emphatic_positive(text) {
            return TextClassification::emphatic_positive();
        }

        let clauses = tokenize::split_clauses(text);
        let global_contrast = tokenize::has_contrast(text);
        let mut raw = 0.0;
        let mut mass: BTreeMap<TextEmotion, f64> = BTreeMap::new();

        for (i, clause) in clauses.iter().enumerate() {
            let w = clause_weight(i, clauses.len(), clause.follows_contrast, global_contrast);
            let scored = self.score_clause(clause);
            raw += scored.score * w;
            for (label, c) in scored.contributions {
                *mass.entry(label).or_insert(0.0) += c * w;
            }
        }

        for rule in grammar::first_person_negations(&tokenize::tokenize(text)) {
            let sign = if rule.negated.is_positive() { -1.0 } else { 1.0 };
            raw += sign * NEGATION_BOOST;
            *mass.entry(rule.expressed).or_insert(0.0) += NEGATION_BOOST;
        }

        let magnitude = raw.abs();
        let result = if magnitude < BALANCED_THRESHOLD {
            let lead = mass.values().copied().fold(0.0, f64::max) + 1.0;
            let breakdown = if mass.is_empty() {
                leaning_toward(TextEmotion::Calm, 2.0)
            } else {
                let mut scores = mass_scores(&mass);
                scores.insert(TextEmotion::Calm, lead + BREAKDOWN_BASELINE);
                Breakdown::from_scores(scores)
            };
            TextClassification {
                emotion: TextEmotion::Calm,
                confidence: (50.0 + 8.0 * magnitude).round().clamp(45.0, 95.0),
                breakdown,
                context: ClassificationContext::Balanced,
            }
        } else {
            let breakdown = Breakdown::from_scores(mass_scores(&mass));
            TextClassification {
                emotion: breakdown.top().0,
                confidence: (50.0 + 12.0 * magnitude).round().clamp(40.0, 95.0),
                breakdown,
                context: ClassificationContext::ClauseAggregated,
            }
        };

        tracing::debug!(
            clauses = clauses.len(),
            raw,
            emotion = %result.emotion,
            confidence = result.confidence,
            "Clause classification"
        );
        result
    }
}

fn mass_scores(mass: &BTreeMap<TextEmotion, f64>) -> BTreeMap<TextEmotion, f64> {
    TextEmotion::ALL
        .iter()
        .map(|l| (*l, mass.get(l).copied().unwrap_or(0.0) + BREAKDOWN_BASELINE))
        .collect()
}
