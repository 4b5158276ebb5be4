//! Configuration Generator for MoodLens
//!
//! Writes a `.env` file containing every tunable of the pipeline, starting
//! from one of the preset profiles.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use moodlens_core::{MoodlensConfig, TextStrategy};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output file path
    #[arg(short, long, default_value = ".env")]
    output: PathBuf,

    /// Tuning profile
    #[arg(short, long, value_enum, default_value = "balanced")]
    preset: Preset,

    /// Text classification strategy
    #[arg(short, long, value_enum)]
    text_strategy: Option<StrategyArg>,

    /// Log level written as MOODLENS_LOG_LEVEL
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Force overwrite if file exists
    #[arg(short, long)]
    force: bool,

    /// Print the configuration instead of writing it
    #[arg(long)]
    stdout: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Preset {
    /// Default cadence and smoothing
    Balanced,
    /// Faster capture, lighter smoothing, quicker label changes
    Responsive,
    /// Slower capture, heavier smoothing, stickier labels
    Steady,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    /// Clause-level scoring with contrast handling
    Clause,
    /// Token attention with softmax
    Attention,
}

impl From<StrategyArg> for TextStrategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Clause => TextStrategy::Clause,
            StrategyArg::Attention => TextStrategy::Attention,
        }
    }
}

fn preset_config(preset: Preset) -> MoodlensConfig {
    let mut config = MoodlensConfig::default();
    match preset {
        Preset::Balanced => {}
        Preset::Responsive => {
            config.smoothing.alpha = 0.5;
            config.smoothing.min_dwell_ms = 2_000;
            config.smoothing.switch_gap = 5.0;
            config.stabilizer.window_ms = 3_000;
            config.stabilizer.jump_confidence = 70;
            config.scheduler.facial_interval_ms = 1_000;
            config.scheduler.voice_interval_ms = 1_000;
            config.scheduler.fusion_interval_ms = 1_500;
            config.scheduler.text_debounce_ms = 400;
        }
        Preset::Steady => {
            config.smoothing.alpha = 0.25;
            config.smoothing.min_dwell_ms = 6_000;
            config.smoothing.switch_gap = 12.0;
            config.stabilizer.window_ms = 8_000;
            config.stabilizer.jump_confidence = 85;
            config.scheduler.facial_interval_ms = 3_000;
            config.scheduler.voice_interval_ms = 2_000;
            config.scheduler.fusion_interval_ms = 4_000;
            config.scheduler.text_debounce_ms = 800;
        }
    }
    config
}

fn generate_env_content(cli: &Cli) -> Result<String> {
    let mut config = preset_config(cli.preset);
    if let Some(strategy) = cli.text_strategy {
        config.text_strategy = strategy.into();
    }
    config
        .validate()
        .with_context(|| format!("preset {:?} produced an invalid configuration", cli.preset))?;

    let mut content = format!(
        "# ========================================\n\
         # MoodLens - Environment Configuration\n\
         # ========================================\n\
         # Generated: {}\n\
         # Preset: {:?}\n\
         #\n\
         # Every value below is optional; unset keys fall back to defaults.\n\
         \n\
         # Logging\n\
         MOODLENS_LOG_LEVEL={}\n\
         \n\
         # Pipeline\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        cli.preset,
        cli.log_level,
    );
    for line in config.to_env_lines() {
        content.push_str(&line);
        content.push('\n');
    }
    Ok(content)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let content = generate_env_content(&cli)?;

    if cli.stdout {
        print!("{}", content);
        return Ok(());
    }

    if cli.output.exists() && !cli.force {
        bail!(
            "{} already exists, use --force to overwrite",
            cli.output.display()
        );
    }

    fs::write(&cli.output, content)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;

    println!("MoodLens configuration generator");
    println!("Preset:  {:?}", cli.preset);
    println!("Written: {}", cli.output.display());
    println!();
    println!("Load it with moodlens_core::load_env() before MoodlensConfig::from_env().");
    Ok(())
}
