//! Text Emotion Provider for MoodLens
//!
//! Lexical, deterministic classification of typed text with two
//! interchangeable strategies:
//!
//! - [`ClauseClassifier`]: splits text into clauses at punctuation and
//!   contrast conjunctions, scores lexicon hits with intensifier, hedge and
//!   negation adjustments, and lets the clause after "but" dominate
//! - [`TokenAttentionClassifier`]: per-token embeddings with positional
//!   attention, accumulating logits per emotion and converting them with a
//!   stable softmax
//!
//! Both honour the same grammar rules: "I am not happy" is pushed toward
//! the opposite emotion, and "never felt so great" is always happy.
//!
//! # Example
//!
//! ```
//! use moodlens_provider_text::{TextClassifier, ClauseClassifier};
//! use moodlens_core::TextEmotion;
//!
//! let result = ClauseClassifier::new().classify("I am not happy");
//! assert_eq!(result.emotion, TextEmotion::Sad);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analyzer;
pub mod attention;
pub mod classifier;
pub mod clause;
pub mod grammar;
pub mod lexicon;
pub mod tokenize;

pub use analyzer::TextAnalyzer;
pub use attention::{TokenAttentionClassifier, TokenEmbedding};
pub use classifier::{classifier_for, ClassificationContext, TextClassification, TextClassifier};
pub use clause::{ClauseClassifier, ClauseScore};
pub use grammar::{first_person_negations, is_emphatic_positive, FirstPersonNegation};
pub use tokenize::{extract_keywords, last_sentence, split_clauses, Clause, Token};
