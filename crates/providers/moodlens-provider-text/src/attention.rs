//! Token-attention scorer
//!
//! Every token gets a small feature embedding (length, vowel ratio,
//! punctuation flag, first/last character code) plus a positional
//! encoding. Lexicon hits add attention-weighted logits to their label;
//! tokens inside a negation scope transfer their weight to the negated
//! label instead. Each hit is scaled by the weight of its clause, so in
//! "X, but Y" the tokens of Y dominate. Logits become probabilities
//! through a max-subtracted softmax.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use moodlens_core::utils::math::softmax;
use moodlens_core::{Breakdown, Label, TextEmotion, TextStrategy};
use serde::{Deserialize, Serialize};

use crate::classifier::{ClassificationContext, TextClassification, TextClassifier};
use crate::clause::clause_weight;
use crate::grammar::{self, NEGATION_BOOST};
use crate::lexicon;
use crate::tokenize::{self, Token};

/// Tokens after a negation word that fall inside its scope
pub const NEGATION_SCOPE: usize = 3;
/// Tokens scanned backwards for an intensifier
pub const INTENSIFIER_LOOKBACK: usize = 2;
/// Strength of an adjacent intensifier
pub const INTENSIFIER_STRENGTH: f64 = 1.6;
/// Strength lost per extra token between intensifier and hit
pub const INTENSIFIER_DECAY: f64 = 0.2;
/// Window on each side searched for related lexicon words
pub const CONTEXT_WINDOW: usize = 2;
/// Boost per related lexicon word in the context window
pub const CONTEXT_BOOST: f64 = 0.3;
/// Multiplier for hits carrying `!` or `?`
pub const PUNCTUATION_BOOST: f64 = 1.15;
/// Factor applied to the logit of a first-person negated emotion
pub const NEGATED_SUPPRESSION: f64 = 0.01;
/// Calm logit used when no lexicon word matched
pub const NO_SIGNAL_PRIOR: f64 = 0.5;

/// Feature embedding of one token
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TokenEmbedding {
    /// Token length / 20
    pub length: f64,
    /// Share of vowels among the token's characters
    pub vowel_ratio: f64,
    /// 1.0 when the token carries `!` or `?`
    pub punctuation: f64,
    /// First character code / 255
    pub first_char: f64,
    /// Last character code / 255
    pub last_char: f64,
    /// `sin(π·p)` for relative position `p`
    pub pos_sin: f64,
    /// `cos(π·p)` for relative position `p`
    pub pos_cos: f64,
    /// Relative position `index / len` in `[0, 1)`
    pub position: f64,
}

impl TokenEmbedding {
    /// Embed the token at `index` of a sequence of `len` tokens
    pub fn new(token: &Token, index: usize, len: usize) -> Self {
        let word = token.clean.as_str();
        let chars = word.chars().count();
        let vowels = word.chars().filter(|c| "aeiou".contains(*c)).count();
        let code = |c: Option<char>| c.map(|c| (c as u32).min(255) as f64 / 255.0).unwrap_or(0.0);
        let position = if len == 0 {
            0.0
        } else {
            index as f64 / len as f64
        };

        Self {
            length: chars as f64 / 20.0,
            vowel_ratio: if chars == 0 {
                0.0
            } else {
                vowels as f64 / chars as f64
            },
            punctuation: if token.raw.contains(['!', '?']) { 1.0 } else { 0.0 },
            first_char: code(word.chars().next()),
            last_char: code(word.chars().last()),
            pos_sin: (position * PI).sin(),
            pos_cos: (position * PI).cos(),
            position,
        }
    }

    /// Attention from position: tokens near the middle weigh up to 2.0
    pub fn position_weight(&self) -> f64 {
        1.0 + (1.0 - (self.position - 0.5).abs())
    }

    /// Attention from punctuation emphasis
    pub fn punctuation_weight(&self) -> f64 {
        if self.punctuation > 0.0 {
            PUNCTUATION_BOOST
        } else {
            1.0
        }
    }
}

/// BERT-style token-level classifier
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenAttentionClassifier;

impl TokenAttentionClassifier {
    /// Create a token-attention classifier
    pub fn new() -> Self {
        Self
    }

    /// Embeddings for every token of `text`
    pub fn embed(&self, text: &str) -> Vec<TokenEmbedding> {
        let tokens = tokenize::tokenize(text);
        let n = tokens.len();
        tokens
            .iter()
            .enumerate()
            .map(|(i, t)| TokenEmbedding::new(t, i, n))
            .collect()
    }

    /// Raw per-label logits for a token sequence
    pub fn logits(&self, tokens: &[Token]) -> BTreeMap<TextEmotion, f64> {
        let n = tokens.len();
        let mut logits: BTreeMap<TextEmotion, f64> =
            TextEmotion::ALL.iter().map(|l| (*l, 0.0)).collect();

        let mut negated = vec![false; n];
        for (i, token) in tokens.iter().enumerate() {
            if lexicon::is_negation(&token.clean) {
                for flag in negated.iter_mut().skip(i + 1).take(NEGATION_SCOPE) {
                    *flag = true;
                }
            }
        }
        let rules = grammar::first_person_negations(tokens);
        for rule in &rules {
            negated[rule.index] = true;
        }

        let slots = tokenize::clause_slots(tokens);
        let clauses = tokenize::clause_count(&slots);
        let contrast = slots.iter().any(Option::is_none);

        for (i, token) in tokens.iter().enumerate() {
            let labels = lexicon::lookup(&token.clean);
            if labels.is_empty() {
                continue;
            }
            let embedding = TokenEmbedding::new(token, i, n);
            let clause = slots[i]
                .map(|s| clause_weight(s.clause, clauses, s.follows_contrast, contrast))
                .unwrap_or(1.0);
            let intensifier = (1..=INTENSIFIER_LOOKBACK)
                .find(|k| i >= *k && lexicon::is_intensifier(&tokens[i - k].clean))
                .map(|k| INTENSIFIER_STRENGTH - INTENSIFIER_DECAY * (k - 1) as f64)
                .unwrap_or(1.0);

            for label in labels {
                let mut score = embedding.position_weight()
                    * embedding.punctuation_weight()
                    * intensifier
                    * clause;
                if negated[i] {
                    tracing::trace!(token = %token.clean, from = %label, to = %label.negated(), score, "Negated token");
                    *logits.entry(label.negated()).or_insert(0.0) += score;
                    continue;
                }

                let lo = i.saturating_sub(CONTEXT_WINDOW);
                let hi = (i + CONTEXT_WINDOW).min(n.saturating_sub(1));
                let related = (lo..=hi)
                    .filter(|j| *j != i)
                    .filter(|j| lexicon::lookup(&tokens[*j].clean).contains(&label))
                    .count();
                score += CONTEXT_BOOST * related as f64 * clause;

                tracing::trace!(token = %token.clean, label = %label, clause, score, "Token hit");
                *logits.entry(label).or_insert(0.0) += score;
            }
        }

        for rule in &rules {
            *logits.entry(rule.expressed).or_insert(0.0) += NEGATION_BOOST;
        }
        for rule in &rules {
            if let Some(v) = logits.get_mut(&rule.negated) {
                *v = (*v * NEGATED_SUPPRESSION).max(0.0);
            }
        }
        logits
    }
}

impl TextClassifier for TokenAttentionClassifier {
    fn strategy(&self) -> TextStrategy {
        TextStrategy::Attention
    }

    fn classify(&self, text: &str) -> TextClassification {
        if text.trim().is_empty() {
            return TextClassification::empty();
        }
        if grammar::is_emphatic_positive(text) {
            return TextClassification::emphatic_positive();
        }

        let tokens = tokenize::tokenize(text);
        let mut logits = self.logits(&tokens);
        let signal = logits.values().any(|v| *v > 0.0);
        if !signal {
            logits.insert(TextEmotion::Calm, NO_SIGNAL_PRIOR);
        }

        let labels: Vec<TextEmotion> = logits.keys().copied().collect();
        let values: Vec<f64> = logits.values().copied().collect();
        let probabilities = softmax(&values, 1.0);
        let breakdown = Breakdown::from_scores(
            labels
                .into_iter()
                .zip(probabilities)
                .map(|(l, p)| (l, p * 100.0)),
        );
        let (emotion, share) = breakdown.top();

        tracing::debug!(
            tokens = tokens.len(),
            emotion = %emotion,
            probability = share,
            "Token-attention classification"
        );

        TextClassification {
            emotion,
            confidence: share.round(),
            breakdown,
            context: if signal {
                ClassificationContext::TokenAttention
            } else {
                ClassificationContext::NoSignal
            },
        }
    }
}
