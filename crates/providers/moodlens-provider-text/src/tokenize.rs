//! Tokenizer, clause splitter and capture-side text helpers

use once_cell::sync::Lazy;
use regex::Regex;

use crate::lexicon;

static SENTENCE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:[.!?]\s+|\n)+").expect("valid sentence pattern"));

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid word pattern"));

/// Maximum number of keywords attached to an observation
pub const MAX_KEYWORDS: usize = 6;

/// Keywords must be longer than this
pub const MIN_KEYWORD_LEN: usize = 3;

const CLAUSE_PUNCTUATION: &[char] = &['.', ';', '?', '!', ','];

/// One whitespace-delimited token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Lowercased token as written, punctuation included
    pub raw: String,
    /// Lowercased token reduced to letters, digits and apostrophes
    pub clean: String,
}

impl Token {
    /// Build a token from a raw word
    pub fn new(word: &str) -> Self {
        let raw = word.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'");
        let clean = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '\'')
            .collect();
        Self { raw, clean }
    }

    /// Whether the raw token carries an exclamation mark
    pub fn is_exclaimed(&self) -> bool {
        self.raw.contains('!')
    }

    /// Whether the raw token ends a clause
    pub fn ends_clause(&self) -> bool {
        self.raw.ends_with(CLAUSE_PUNCTUATION)
    }
}

/// Split text on whitespace into tokens
pub fn tokenize(text: &str) -> Vec<Token> {
    text.split_whitespace().map(Token::new).collect()
}

/// A run of tokens scored as one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    /// Tokens of the clause, contrast markers removed
    pub tokens: Vec<Token>,
    /// Whether a contrast marker introduced this clause
    pub follows_contrast: bool,
}

/// Clause membership of one token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClauseSlot {
    /// Index of the clause the token belongs to
    pub clause: usize,
    /// Whether a contrast marker introduced that clause
    pub follows_contrast: bool,
}

/// Clause slot of every token, `None` for contrast markers
///
/// Clauses end after a token carrying clause punctuation and before a
/// contrast marker. Clause indices are contiguous from zero.
pub fn clause_slots(tokens: &[Token]) -> Vec<Option<ClauseSlot>> {
    let mut slots = Vec::with_capacity(tokens.len());
    let mut clause = 0;
    let mut open = false;
    let mut follows_contrast = false;
    let mut pending_contrast = false;

    for token in tokens {
        if lexicon::is_contrast(&token.clean) {
            if open {
                clause += 1;
                open = false;
            }
            pending_contrast = true;
            slots.push(None);
            continue;
        }

        if !open {
            follows_contrast = pending_contrast;
            pending_contrast = false;
            open = true;
        }
        slots.push(Some(ClauseSlot {
            clause,
            follows_contrast,
        }));
        if token.ends_clause() {
            clause += 1;
            open = false;
        }
    }
    slots
}

/// Number of clauses described by `slots`
pub fn clause_count(slots: &[Option<ClauseSlot>]) -> usize {
    slots
        .iter()
        .flatten()
        .map(|s| s.clause + 1)
        .max()
        .unwrap_or(0)
}

/// Split text into clauses at punctuation and contrast conjunctions
pub fn split_clauses(text: &str) -> Vec<Clause> {
    let tokens = tokenize(text);
    let slots = clause_slots(&tokens);
    let mut clauses: Vec<Clause> = Vec::new();

    for (token, slot) in tokens.into_iter().zip(slots) {
        let Some(slot) = slot else { continue };
        if clauses.len() <= slot.clause {
            clauses.push(Clause {
                tokens: Vec::new(),
                follows_contrast: slot.follows_contrast,
            });
        }
        if let Some(current) = clauses.last_mut() {
            current.tokens.push(token);
        }
    }
    clauses
}

/// Whether the text contains any contrast conjunction
pub fn has_contrast(text: &str) -> bool {
    tokenize(text).iter().any(|t| lexicon::is_contrast(&t.clean))
}

/// Last non-empty sentence of a running text
///
/// Sentences end at `.`, `!` or `?` followed by whitespace, or at a
/// newline. Returns the trimmed text when it has no break.
pub fn last_sentence(text: &str) -> &str {
    SENTENCE_BREAK
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .last()
        .unwrap_or_else(|| text.trim())
}

/// Up to six lowercase words longer than three characters
pub fn extract_keywords(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    NON_WORD
        .split(&lower)
        .filter(|w| w.len() > MIN_KEYWORD_LEN)
        .take(MAX_KEYWORDS)
        .map(str::to_string)
        .collect()
}
