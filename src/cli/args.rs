//! Command line argument parsing for the risk-profiler CLI using clap.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::corpus::synthetic::{DEFAULT_SAMPLES, DEFAULT_SEED};

/// risk-profiler - classify financial goal statements by risk tolerance
#[derive(Parser, Debug, Clone)]
#[command(name = "risk-profiler")]
#[command(about = "Classify free-text financial goals as Conservative, Balanced or Aggressive")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct RiskProfilerArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format for generate and train reports
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON reports
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl RiskProfilerArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Generate a synthetic labeled corpus
    Generate(GenerateArgs),

    /// Train and persist the vectorizer/classifier pair
    Train(TrainArgs),

    /// Classify a statement and print one JSON line
    Predict(PredictArgs),
}

/// Arguments for generating a corpus
#[derive(Parser, Debug, Clone)]
pub struct GenerateArgs {
    /// Output CSV path
    #[arg(short, long, default_value = "data/training_data.csv")]
    pub output: PathBuf,

    /// Number of rows to generate
    #[arg(short = 'n', long, default_value_t = DEFAULT_SAMPLES)]
    pub samples: usize,

    /// Generator seed
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,
}

/// Arguments for training
#[derive(Parser, Debug, Clone)]
pub struct TrainArgs {
    /// Labeled corpus (CSV with `text` and `risk_profile` columns)
    #[arg(short, long, default_value = "data/training_data.csv")]
    pub corpus: PathBuf,

    /// Directory receiving the model artifacts
    #[arg(short, long, env = "RISK_PROFILER_MODELS_DIR", default_value = "models")]
    pub models: PathBuf,

    /// Training configuration file (JSON)
    #[arg(long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,
}

/// Arguments for prediction
#[derive(Parser, Debug, Clone)]
pub struct PredictArgs {
    /// Directory holding the model artifacts
    #[arg(short, long, env = "RISK_PROFILER_MODELS_DIR", default_value = "models")]
    pub models: PathBuf,

    /// Classify every stdin line separately, printing one JSON line each
    #[arg(long)]
    pub lines: bool,

    /// Statement to classify; read from stdin when omitted
    #[arg(
        value_name = "TEXT",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_parser = clap::value_parser!(OsString)
    )]
    pub text: Vec<OsString>,
}

impl PredictArgs {
    /// The statement given on the command line, words joined by spaces.
    /// Bytes that are not UTF-8 become U+FFFD.
    pub fn joined_text(&self) -> Option<String> {
        if self.text.is_empty() {
            None
        } else {
            let words: Vec<_> = self.text.iter().map(|word| word.to_string_lossy()).collect();
            Some(words.join(" "))
        }
    }
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
