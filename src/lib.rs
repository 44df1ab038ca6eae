//! # risk-profiler
//!
//! Classifies free-text statements of financial goals into one of three risk
//! tolerance profiles: Conservative, Balanced or Aggressive.
//!
//! ## Features
//!
//! - Deterministic English normalization pipeline shared by training and inference
//! - TF-IDF features over unigrams and bigrams
//! - One-vs-rest linear SVM with Platt-calibrated probabilities
//! - Checksummed artifact pair persisted atomically
//! - Inference that always answers, falling back to `Balanced`
//!
//! ## Example
//!
//! ```no_run
//! use risk_profiler::corpus::SyntheticCorpus;
//! use risk_profiler::inference::RiskProfiler;
//! use risk_profiler::training::TrainingPipeline;
//!
//! let examples = SyntheticCorpus::default().generate(500);
//! let outcome = TrainingPipeline::default().train(&examples).unwrap();
//! println!("weighted F1: {:.2}", outcome.report.weighted_f1);
//!
//! let profiler = RiskProfiler::from_pair(outcome.pair);
//! let result = profiler.infer("I want to protect my savings and avoid losses");
//! println!("{}", result.to_json_line());
//! ```

pub mod analysis;
pub mod cli;
pub mod corpus;
pub mod error;
pub mod inference;
pub mod ml;
pub mod storage;
pub mod training;

pub mod prelude {
    pub use crate::analysis::{NormalizedText, Normalizer, normalize};
    pub use crate::error::{Result, RiskProfilerError};
    pub use crate::inference::{PredictionResult, RiskProfiler};
    pub use crate::ml::{ModelPair, RiskProfile};
    pub use crate::training::{TrainingConfig, TrainingPipeline, TrainingReport};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
