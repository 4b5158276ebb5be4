//! Deterministic grammar rules shared by both text strategies

use moodlens_core::TextEmotion;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::lexicon;
use crate::tokenize::Token;

/// Logit/score boost given to the opposite of a first-person negated emotion
pub const NEGATION_BOOST: f64 = 3.0;

/// Confidence reported for emphatic positive phrasing
pub const EMPHATIC_CONFIDENCE: f64 = 85.0;

/// "never felt so great": here "never" intensifies instead of negating
static EMPHATIC_POSITIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\bnever\s+(felt|been|seemed)\s+(so\s+)?(great|happy|wonderful|excellent|amazing|fantastic|better|happier)\b",
    )
    .expect("valid emphatic pattern")
});

/// Whether the text is an emphatic positive ("never been happier")
pub fn is_emphatic_positive(text: &str) -> bool {
    EMPHATIC_POSITIVE.is_match(text)
}

/// A short first-person negation such as "I am not happy"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirstPersonNegation {
    /// Index of the negated emotion word
    pub index: usize,
    /// Emotion named by the negated word
    pub negated: TextEmotion,
    /// Emotion the statement actually expresses
    pub expressed: TextEmotion,
}

/// Find "I (am) not X" patterns where X is a lexicon word
///
/// The subject must sit within two tokens before the negation and the
/// emotion word must directly follow it. A word listed under several
/// labels yields one match per label.
pub fn first_person_negations(tokens: &[Token]) -> Vec<FirstPersonNegation> {
    let mut found = Vec::new();
    for (i, token) in tokens.iter().enumerate() {
        if !lexicon::is_negation(&token.clean) || i + 1 >= tokens.len() {
            continue;
        }
        let has_subject = (1..=2)
            .filter_map(|k| i.checked_sub(k))
            .any(|j| lexicon::FIRST_PERSON.contains(&tokens[j].clean.as_str()));
        if !has_subject {
            continue;
        }
        for negated in lexicon::lookup_exact(&tokens[i + 1].clean) {
            found.push(FirstPersonNegation {
                index: i + 1,
                negated,
                expressed: negated.negated(),
            });
        }
    }
    found
}
