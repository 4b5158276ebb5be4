//! Configuration management and environment variable loading
//!
//! Every tunable of the pipeline lives in [`MoodlensConfig`]. Defaults match
//! the empirically tuned constants; [`MoodlensConfig::from_env`] overlays
//! `MOODLENS_*` variables on top of them.

use crate::{Modality, MoodlensError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Load environment variables from .env file
///
/// Loads from a .env file in the current directory or a parent directory.
/// A missing file is not an error.
///
/// # Example
///
/// ```no_run
/// use moodlens_core::load_env;
///
/// load_env().ok();
/// let level = std::env::var("MOODLENS_LOG_LEVEL").unwrap_or_default();
/// ```
pub fn load_env() -> Result<()> {
    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::info!("Loaded environment from: {}", path.display());
            Ok(())
        }
        Err(dotenvy::Error::LineParse(line, pos)) => Err(MoodlensError::config(format!(
            "Failed to parse .env file at line {}, position {}",
            line, pos
        ))),
        Err(dotenvy::Error::Io(_)) => {
            tracing::debug!("No .env file found - using system environment variables only");
            Ok(())
        }
        Err(e) => Err(MoodlensError::config(format!(
            "Failed to load .env file: {}",
            e
        ))),
    }
}

/// Get environment variable as boolean
pub fn get_env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .and_then(|v| match v.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

/// Get environment variable as integer
pub fn get_env_int<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

/// Get environment variable as float
pub fn get_env_float(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

// ============================================================================
// Tunables
// ============================================================================

/// Per-modality EMA and hysteresis parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmoothingConfig {
    /// EMA weight of the newest breakdown
    pub alpha: f64,
    /// Minimum time between label switches
    pub min_dwell_ms: u64,
    /// Lead over the current label's smoothed share needed to switch
    pub switch_gap: f64,
    /// Absolute share that allows a switch regardless of the gap
    pub absolute_floor: f64,
    /// Lead over the runner-up needed to switch
    pub clear_margin: f64,
    /// Disable to report the EMA winner every tick
    pub hysteresis: bool,
    /// Lowest confidence ever reported for a valid observation
    pub confidence_floor: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            alpha: 0.35,
            min_dwell_ms: 4_000,
            switch_gap: 8.0,
            absolute_floor: 60.0,
            clear_margin: 6.0,
            hysteresis: true,
            confidence_floor: 30.0,
        }
    }
}

impl SmoothingConfig {
    /// Minimum dwell as a chrono duration
    pub fn min_dwell(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.min_dwell_ms as i64)
    }
}

/// Fixed modality weights used by fusion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionWeights {
    /// Facial weight
    pub facial: f64,
    /// Voice weight
    pub voice: f64,
    /// Text weight
    pub text: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            facial: 0.40,
            voice: 0.35,
            text: 0.25,
        }
    }
}

impl FusionWeights {
    /// Weight of a modality
    pub fn weight(&self, modality: Modality) -> f64 {
        match modality {
            Modality::Facial => self.facial,
            Modality::Voice => self.voice,
            Modality::Text => self.text,
        }
    }
}

/// When a fused state asks for an intervention
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterventionPolicy {
    /// Minimum calibrated confidence
    pub threshold: u8,
    /// Maximum uncertainty
    pub max_uncertainty: u8,
}

impl Default for InterventionPolicy {
    fn default() -> Self {
        Self {
            threshold: 80,
            max_uncertainty: 60,
        }
    }
}

/// Cross-tick stabilizer parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilizerConfig {
    /// Sliding window length
    pub window_ms: u64,
    /// Weight kept from the previous confidence when blending
    pub blend: f64,
    /// Similarity above which a transition counts as continuous
    pub similarity_threshold: f64,
    /// Raw confidence a dissimilar emotion must exceed to be accepted
    pub jump_confidence: u8,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            window_ms: 5_000,
            blend: 0.7,
            similarity_threshold: 0.7,
            jump_confidence: 80,
        }
    }
}

impl StabilizerConfig {
    /// Window as a chrono duration
    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.window_ms as i64)
    }
}

/// Capture and fusion cadence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Facial capture period
    pub facial_interval_ms: u64,
    /// Voice capture period
    pub voice_interval_ms: u64,
    /// Periodic fusion tick
    pub fusion_interval_ms: u64,
    /// Quiet time after the last keystroke before text is classified
    pub text_debounce_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            facial_interval_ms: 2_000,
            voice_interval_ms: 1_500,
            fusion_interval_ms: 3_000,
            text_debounce_ms: 600,
        }
    }
}

impl SchedulerConfig {
    /// Facial period
    pub fn facial_interval(&self) -> Duration {
        Duration::from_millis(self.facial_interval_ms)
    }

    /// Voice period
    pub fn voice_interval(&self) -> Duration {
        Duration::from_millis(self.voice_interval_ms)
    }

    /// Fusion period
    pub fn fusion_interval(&self) -> Duration {
        Duration::from_millis(self.fusion_interval_ms)
    }

    /// Text debounce
    pub fn text_debounce(&self) -> Duration {
        Duration::from_millis(self.text_debounce_ms)
    }
}

/// Which text classification strategy to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextStrategy {
    /// Clause-aware lexical scorer
    Clause,
    /// Token-attention scorer
    #[default]
    Attention,
}

impl TextStrategy {
    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            TextStrategy::Clause => "clause",
            TextStrategy::Attention => "attention",
        }
    }
}

impl fmt::Display for TextStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextStrategy {
    type Err = MoodlensError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "clause" | "clause-aware" => Ok(TextStrategy::Clause),
            "attention" | "token-attention" => Ok(TextStrategy::Attention),
            other => Err(MoodlensError::config(format!(
                "unknown text strategy '{}' (expected 'clause' or 'attention')",
                other
            ))),
        }
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodlensConfig {
    /// Facial/voice smoothing
    pub smoothing: SmoothingConfig,
    /// Fusion weights
    pub weights: FusionWeights,
    /// Intervention gate
    pub intervention: InterventionPolicy,
    /// Temporal stabilizer
    pub stabilizer: StabilizerConfig,
    /// Capture cadence
    pub scheduler: SchedulerConfig,
    /// RMS energy below which audio counts as silence
    pub silence_floor: f64,
    /// Text strategy
    pub text_strategy: TextStrategy,
    /// Entries retained for long-run statistics
    pub history_capacity: usize,
    /// Entries requested from the history store each tick
    pub recent_history_limit: usize,
}

impl Default for MoodlensConfig {
    fn default() -> Self {
        Self {
            smoothing: SmoothingConfig::default(),
            weights: FusionWeights::default(),
            intervention: InterventionPolicy::default(),
            stabilizer: StabilizerConfig::default(),
            scheduler: SchedulerConfig::default(),
            silence_floor: 0.01,
            text_strategy: TextStrategy::default(),
            history_capacity: 1_000,
            recent_history_limit: 5,
        }
    }
}

impl MoodlensConfig {
    /// Defaults overlaid with `MOODLENS_*` environment variables, validated
    pub fn from_env() -> Result<Self> {
        let d = Self::default();
        let strategy = match env::var("MOODLENS_TEXT_STRATEGY") {
            Ok(v) => v.parse()?,
            Err(_) => d.text_strategy,
        };
        let config = Self {
            smoothing: SmoothingConfig {
                alpha: get_env_float("MOODLENS_EMA_ALPHA", d.smoothing.alpha),
                min_dwell_ms: get_env_int("MOODLENS_MIN_DWELL_MS", d.smoothing.min_dwell_ms),
                switch_gap: get_env_float("MOODLENS_SWITCH_GAP", d.smoothing.switch_gap),
                absolute_floor: get_env_float(
                    "MOODLENS_ABSOLUTE_FLOOR",
                    d.smoothing.absolute_floor,
                ),
                clear_margin: get_env_float("MOODLENS_CLEAR_MARGIN", d.smoothing.clear_margin),
                hysteresis: get_env_bool("MOODLENS_HYSTERESIS", d.smoothing.hysteresis),
                confidence_floor: get_env_float(
                    "MOODLENS_CONFIDENCE_FLOOR",
                    d.smoothing.confidence_floor,
                ),
            },
            weights: FusionWeights {
                facial: get_env_float("MOODLENS_WEIGHT_FACIAL", d.weights.facial),
                voice: get_env_float("MOODLENS_WEIGHT_VOICE", d.weights.voice),
                text: get_env_float("MOODLENS_WEIGHT_TEXT", d.weights.text),
            },
            intervention: InterventionPolicy {
                threshold: get_env_int(
                    "MOODLENS_INTERVENTION_THRESHOLD",
                    d.intervention.threshold,
                ),
                max_uncertainty: get_env_int(
                    "MOODLENS_MAX_UNCERTAINTY",
                    d.intervention.max_uncertainty,
                ),
            },
            stabilizer: StabilizerConfig {
                window_ms: get_env_int("MOODLENS_STABILIZER_WINDOW_MS", d.stabilizer.window_ms),
                blend: get_env_float("MOODLENS_STABILIZER_BLEND", d.stabilizer.blend),
                similarity_threshold: get_env_float(
                    "MOODLENS_SIMILARITY_THRESHOLD",
                    d.stabilizer.similarity_threshold,
                ),
                jump_confidence: get_env_int(
                    "MOODLENS_JUMP_CONFIDENCE",
                    d.stabilizer.jump_confidence,
                ),
            },
            scheduler: SchedulerConfig {
                facial_interval_ms: get_env_int(
                    "MOODLENS_FACIAL_INTERVAL_MS",
                    d.scheduler.facial_interval_ms,
                ),
                voice_interval_ms: get_env_int(
                    "MOODLENS_VOICE_INTERVAL_MS",
                    d.scheduler.voice_interval_ms,
                ),
                fusion_interval_ms: get_env_int(
                    "MOODLENS_FUSION_INTERVAL_MS",
                    d.scheduler.fusion_interval_ms,
                ),
                text_debounce_ms: get_env_int(
                    "MOODLENS_TEXT_DEBOUNCE_MS",
                    d.scheduler.text_debounce_ms,
                ),
            },
            silence_floor: get_env_float("MOODLENS_SILENCE_FLOOR", d.silence_floor),
            text_strategy: strategy,
            history_capacity: get_env_int("MOODLENS_HISTORY_CAPACITY", d.history_capacity),
            recent_history_limit: get_env_int(
                "MOODLENS_RECENT_HISTORY_LIMIT",
                d.recent_history_limit,
            ),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values outside their meaningful ranges
    pub fn validate(&self) -> Result<()> {
        fn in_range(field: &str, value: f64, min: f64, max: f64) -> Result<()> {
            if value.is_finite() && value >= min && value <= max {
                Ok(())
            } else {
                Err(MoodlensError::out_of_range(field, value, min, max))
            }
        }

        let s = &self.smoothing;
        if !(s.alpha > 0.0 && s.alpha <= 1.0) {
            return Err(MoodlensError::out_of_range("ema_alpha", s.alpha, 0.0, 1.0));
        }
        in_range("switch_gap", s.switch_gap, 0.0, 100.0)?;
        in_range("absolute_floor", s.absolute_floor, 0.0, 100.0)?;
        in_range("clear_margin", s.clear_margin, 0.0, 100.0)?;
        in_range("confidence_floor", s.confidence_floor, 0.0, 100.0)?;

        let w = &self.weights;
        in_range("weight_facial", w.facial, 0.0, 1.0)?;
        in_range("weight_voice", w.voice, 0.0, 1.0)?;
        in_range("weight_text", w.text, 0.0, 1.0)?;
        if w.facial + w.voice + w.text <= 0.0 {
            return Err(MoodlensError::config("fusion weights must not all be zero"));
        }

        in_range(
            "intervention_threshold",
            self.intervention.threshold as f64,
            0.0,
            100.0,
        )?;
        in_range(
            "max_uncertainty",
            self.intervention.max_uncertainty as f64,
            0.0,
            100.0,
        )?;

        let st = &self.stabilizer;
        in_range("stabilizer_blend", st.blend, 0.0, 1.0)?;
        in_range("similarity_threshold", st.similarity_threshold, 0.0, 1.0)?;
        in_range("jump_confidence", st.jump_confidence as f64, 0.0, 100.0)?;

        let sc = &self.scheduler;
        for (name, value) in [
            ("facial_interval_ms", sc.facial_interval_ms),
            ("voice_interval_ms", sc.voice_interval_ms),
            ("fusion_interval_ms", sc.fusion_interval_ms),
        ] {
            if value == 0 {
                return Err(MoodlensError::config(format!("{} must be positive", name)));
            }
        }

        in_range("silence_floor", self.silence_floor, 0.0, 1.0)?;
        if self.history_capacity == 0 {
            return Err(MoodlensError::config("history_capacity must be positive"));
        }
        Ok(())
    }

    /// Render as `KEY=value` lines accepted by [`MoodlensConfig::from_env`]
    pub fn to_env_lines(&self) -> Vec<String> {
        vec![
            format!("MOODLENS_EMA_ALPHA={}", self.smoothing.alpha),
            format!("MOODLENS_MIN_DWELL_MS={}", self.smoothing.min_dwell_ms),
            format!("MOODLENS_SWITCH_GAP={}", self.smoothing.switch_gap),
            format!("MOODLENS_ABSOLUTE_FLOOR={}", self.smoothing.absolute_floor),
            format!("MOODLENS_CLEAR_MARGIN={}", self.smoothing.clear_margin),
            format!("MOODLENS_HYSTERESIS={}", self.smoothing.hysteresis),
            format!(
                "MOODLENS_CONFIDENCE_FLOOR={}",
                self.smoothing.confidence_floor
            ),
            format!("MOODLENS_WEIGHT_FACIAL={}", self.weights.facial),
            format!("MOODLENS_WEIGHT_VOICE={}", self.weights.voice),
            format!("MOODLENS_WEIGHT_TEXT={}", self.weights.text),
            format!(
                "MOODLENS_INTERVENTION_THRESHOLD={}",
                self.intervention.threshold
            ),
            format!(
                "MOODLENS_MAX_UNCERTAINTY={}",
                self.intervention.max_uncertainty
            ),
            format!(
                "MOODLENS_STABILIZER_WINDOW_MS={}",
                self.stabilizer.window_ms
            ),
            format!("MOODLENS_STABILIZER_BLEND={}", self.stabilizer.blend),
            format!(
                "MOODLENS_SIMILARITY_THRESHOLD={}",
                self.stabilizer.similarity_threshold
            ),
            format!(
                "MOODLENS_JUMP_CONFIDENCE={}",
                self.stabilizer.jump_confidence
            ),
            format!(
                "MOODLENS_FACIAL_INTERVAL_MS={}",
                self.scheduler.facial_interval_ms
            ),
            format!(
                "MOODLENS_VOICE_INTERVAL_MS={}",
                self.scheduler.voice_interval_ms
            ),
            format!(
                "MOODLENS_FUSION_INTERVAL_MS={}",
                self.scheduler.fusion_interval_ms
            ),
            format!(
                "MOODLENS_TEXT_DEBOUNCE_MS={}",
                self.scheduler.text_debounce_ms
            ),
            format!("MOODLENS_SILENCE_FLOOR={}", self.silence_floor),
            format!("MOODLENS_TEXT_STRATEGY={}", self.text_strategy),
            format!("MOODLENS_HISTORY_CAPACITY={}", self.history_capacity),
            format!(
                "MOODLENS_RECENT_HISTORY_LIMIT={}",
                self.recent_history_limit
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_env_bool() {
        env::set_var("ML_TEST_BOOL_TRUE", "true");
        env::set_var("ML_TEST_BOOL_0", "0");

        assert!(get_env_bool("ML_TEST_BOOL_TRUE", false));
        assert!(!get_env_bool("ML_TEST_BOOL_0", true));
        assert!(get_env_bool("ML_NONEXISTENT", true));

        env::remove_var("ML_TEST_BOOL_TRUE");
        env::remove_var("ML_TEST_BOOL_0");
    }

    #[test]
    fn test_get_env_int() {
        env::set_var("ML_TEST_INT", " 42 ");
        assert_eq!(get_env_int("ML_TEST_INT", 0u64), 42);
        assert_eq!(get_env_int("ML_NONEXISTENT", 99u8), 99);
        env::remove_var("ML_TEST_INT");
    }

    #[test]
    fn test_get_env_float() {
        env::set_var("ML_TEST_FLOAT", "0.7");
        env::set_var("ML_TEST_FLOAT_NAN", "NaN");
        assert_eq!(get_env_float("ML_TEST_FLOAT", 0.0), 0.7);
        assert_eq!(get_env_float("ML_TEST_FLOAT_NAN", 1.5), 1.5);
        assert_eq!(get_env_float("ML_NONEXISTENT", 1.5), 1.5);
        env::remove_var("ML_TEST_FLOAT");
        env::remove_var("ML_TEST_FLOAT_NAN");
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = MoodlensConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.weights.weight(Modality::Voice), 0.35);
        assert_eq!(config.smoothing.min_dwell(), chrono::Duration::seconds(4));
        assert_eq!(config.stabilizer.window(), chrono::Duration::seconds(5));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = MoodlensConfig::default();
        config.smoothing.alpha = 0.0;
        assert!(matches!(
            config.validate(),
            Err(MoodlensError::OutOfRange { .. })
        ));

        let mut config = MoodlensConfig::default();
        config.weights = FusionWeights {
            facial: 0.0,
            voice: 0.0,
            text: 0.0,
        };
        assert!(matches!(config.validate(), Err(MoodlensError::Config(_))));

        let mut config = MoodlensConfig::default();
        config.intervention.threshold = 120;
        assert!(config.validate().is_err());

        let mut config = MoodlensConfig::default();
        config.scheduler.fusion_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_text_strategy_parse() {
        assert_eq!("Clause".parse::<TextStrategy>().unwrap(), TextStrategy::Clause);
        assert_eq!(
            "token-attention".parse::<TextStrategy>().unwrap(),
            TextStrategy::Attention
        );
        assert!("bert".parse::<TextStrategy>().is_err());
    }

    #[test]
    fn test_env_lines_cover_every_key() {
        let lines = MoodlensConfig::default().to_env_lines();
        assert!(lines.iter().all(|l| l.starts_with("MOODLENS_")));
        assert!(lines.contains(&"MOODLENS_TEXT_STRATEGY=attention".to_string()));
        assert!(lines.contains(&"MOODLENS_INTERVENTION_THRESHOLD=80".to_string()));
    }

    #[test]
    fn test_from_env_overlays_variables() {
        env::set_var("MOODLENS_MIN_DWELL_MS", "2500");
        env::set_var("MOODLENS_TEXT_STRATEGY", "clause");
        let config = MoodlensConfig::from_env().unwrap();
        assert_eq!(config.smoothing.min_dwell_ms, 2_500);
        assert_eq!(config.text_strategy, TextStrategy::Clause);
        env::remove_var("MOODLENS_MIN_DWELL_MS");
        env::remove_var("MOODLENS_TEXT_STRATEGY");
    }
}
