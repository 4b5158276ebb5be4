//! Emotion lexicons and function-word lists

use moodlens_core::{Label, TextEmotion};

/// Words that open a negation scope
pub const NEGATIONS: &[&str] = &[
    "not", "no", "never", "don't", "doesn't", "didn't", "won't", "can't", "isn't", "aren't",
    "cannot", "dont", "doesnt", "didnt", "wont", "cant", "isnt", "arent",
];

/// Words that amplify the following emotion word
pub const INTENSIFIERS: &[&str] = &[
    "very",
    "extremely",
    "absolutely",
    "really",
    "so",
    "incredibly",
    "totally",
    "completely",
    "utterly",
    "definitely",
];

/// Words that soften a whole clause
pub const HEDGES: &[&str] = &["maybe", "perhaps", "could", "might", "seem", "seems"];

/// Conjunctions after which the speaker's real stance usually follows
pub const CONTRAST_MARKERS: &[&str] = &["but", "however", "although", "though", "yet", "still"];

/// First-person subjects recognised by the negation grammar rule
pub const FIRST_PERSON: &[&str] = &["i", "i'm", "im"];

/// Tokens shorter than this never hit a lexicon
pub const MIN_LEXICON_TOKEN: usize = 3;

const HAPPY: &[&str] = &[
    "love", "enjoy", "enjoyed", "joy", "happy", "glad", "wonderful", "great", "excellent",
    "amazing", "fantastic", "delighted", "pleased", "cheerful", "ecstatic",
    "satisfied", "grateful",
];

const SAD: &[&str] = &[
    "sad", "unhappy", "depressed", "miserable", "heartbroken", "disappointed", "disappointing",
    "gloomy", "down", "blue", "sorrow", "grief", "despair", "lonely", "terrible", "awful", "worst",
];

const ANGRY: &[&str] = &[
    "angry", "mad", "furious", "rage", "hate", "dislike", "irritated", "annoyed", "frustrated",
    "outraged", "infuriated", "livid", "bug", "bugs", "crash", "broken", "fail", "failure",
    "error", "issue", "problem", "slow", "lag", "laggy",
];

const ANXIOUS: &[&str] = &[
    "worried", "worry", "anxious", "nervous", "scared", "afraid", "frightened", "terrified",
    "panic", "dread", "apprehensive", "uneasy",
];

const EXCITED: &[&str] = &[
    "excited", "thrilled", "enthusiastic", "pumped", "energized", "hyped", "stoked", "eager",
];

const CALM: &[&str] = &[
    "calm", "peaceful", "relaxed", "serene", "tranquil", "composed", "balanced", "centered",
];

const STRESSED: &[&str] = &[
    "stressed", "overwhelmed", "burnout", "pressure", "tense", "swamped", "stressor",
];

const FATIGUED: &[&str] = &["tired", "fatigued", "exhausted", "sleepy", "drained", "worn"];

/// Lexicon entries for one label
pub fn entries(label: TextEmotion) -> &'static [&'static str] {
    match label {
        TextEmotion::Happy => HAPPY,
        TextEmotion::Sad => SAD,
        TextEmotion::Angry => ANGRY,
        TextEmotion::Anxious => ANXIOUS,
        TextEmotion::Excited => EXCITED,
        TextEmotion::Calm => CALM,
        TextEmotion::Stressed => STRESSED,
        TextEmotion::Fatigued => FATIGUED,
    }
}

/// Signed base weight of a lexicon hit for the clause scorer
pub fn polarity_weight(label: TextEmotion) -> f64 {
    match label {
        TextEmotion::Happy => 2.0,
        TextEmotion::Excited => 1.5,
        TextEmotion::Calm => 1.0,
        TextEmotion::Sad => -2.0,
        TextEmotion::Angry => -2.0,
        TextEmotion::Anxious => -1.5,
        TextEmotion::Stressed => -1.8,
        TextEmotion::Fatigued => -1.2,
    }
}

/// Whether `word` is `entry` or a short inflection of it
///
/// Inflections ("crashed", "worries") are accepted for entries of at least
/// four characters when at most three characters are appended.
pub fn matches_entry(word: &str, entry: &str) -> bool {
    if word == entry {
        return true;
    }
    entry.len() >= 4 && word.starts_with(entry) && word.len() - entry.len() <= 3
}

/// Every label whose lexicon contains `word`
pub fn lookup(word: &str) -> Vec<TextEmotion> {
    if word.chars().count() < MIN_LEXICON_TOKEN {
        return Vec::new();
    }
    TextEmotion::ALL
        .iter()
        .copied()
        .filter(|label| entries(*label).iter().any(|e| matches_entry(word, e)))
        .collect()
}

/// Labels whose lexicon lists `word` verbatim
pub fn lookup_exact(word: &str) -> Vec<TextEmotion> {
    if word.chars().count() < MIN_LEXICON_TOKEN {
        return Vec::new();
    }
    TextEmotion::ALL
        .iter()
        .copied()
        .filter(|label| entries(*label).contains(&word))
        .collect()
}

/// Whether `word` opens a negation scope
pub fn is_negation(word: &str) -> bool {
    NEGATIONS.contains(&word)
}

/// Whether `word` is an intensifier
pub fn is_intensifier(word: &str) -> bool {
    INTENSIFIERS.contains(&word)
}

/// Whether `word` is a hedge
pub fn is_hedge(word: &str) -> bool {
    HEDGES.contains(&word)
}

/// Whether `word` is a contrast conjunction
pub fn is_contrast(word: &str) -> bool {
    CONTRAST_MARKERS.contains(&word)
}
