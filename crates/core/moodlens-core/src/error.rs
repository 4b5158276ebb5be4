//! Error types for MoodLens core

use thiserror::Error;

/// Main error type for MoodLens operations
///
/// Classifiers and fusion never surface errors; they return `Option`.
/// This type covers the ambient seams: configuration, collaborator
/// stores, and the capture/fusion service.
#[derive(Debug, Error)]
pub enum MoodlensError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A value could not be parsed into a domain type
    #[error("Validation error: {0}")]
    Validation(String),

    /// Calibration or history store error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Service loop error
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// A tunable parameter fell outside its accepted range
    #[error("Parameter '{field}' out of range: {value} (expected {min}..={max})")]
    OutOfRange {
        /// Parameter name
        field: String,
        /// Offending value
        value: f64,
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },
}

/// Convenient Result type using MoodlensError
pub type Result<T> = std::result::Result<T, MoodlensError>;

impl MoodlensError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        MoodlensError::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        MoodlensError::Validation(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        MoodlensError::Storage(msg.into())
    }

    /// Create a runtime error
    pub fn runtime(msg: impl Into<String>) -> Self {
        MoodlensError::Runtime(msg.into())
    }

    /// Create an out-of-range error
    pub fn out_of_range(field: impl Into<String>, value: f64, min: f64, max: f64) -> Self {
        MoodlensError::OutOfRange {
            field: field.into(),
            value,
            min,
            max,
        }
    }
}
