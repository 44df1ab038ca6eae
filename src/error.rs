//! Error types for the risk profiler.
//!
//! Every fallible operation in the crate returns [`Result`], whose error side is
//! the [`RiskProfilerError`] enum. Training surfaces these errors to the
//! operator; inference converts them into a fallback
//! [`PredictionResult`](crate::inference::PredictionResult) at its outer
//! boundary and never lets them reach the caller.
//!
//! # Examples
//!
//! ```
//! use risk_profiler::error::{Result, RiskProfilerError};
//!
//! fn read_label(raw: &str) -> Result<()> {
//!     Err(RiskProfilerError::corpus(format!("unknown label '{raw}'")))
//! }
//!
//! let err = read_label("Reckless").unwrap_err();
//! assert_eq!(err.to_string(), "Corpus error: unknown label 'Reckless'");
//! ```

use std::io;

use thiserror::Error;

/// The main error type for risk profiler operations.
#[derive(Error, Debug)]
pub enum RiskProfilerError {
    /// I/O errors (corpus files, artifact files).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Text analysis errors (pattern compilation, tokenization).
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Training corpus is unreadable or malformed.
    #[error("Corpus error: {0}")]
    Corpus(String),

    /// CSV decoding errors.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Model fitting errors.
    #[error("Training error: {0}")]
    Training(String),

    /// A persisted artifact is corrupt or has an unsupported layout.
    #[error("Artifact error: {0}")]
    Artifact(String),

    /// One or both persisted artifacts are absent.
    #[error("models not found")]
    ArtifactsMissing,

    /// Vectorizer and classifier do not belong to the same training run.
    #[error("Incompatible artifacts: {0}")]
    IncompatibleArtifacts(String),

    /// Binary (de)serialization errors.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Rejected configuration values.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with [`RiskProfilerError`].
pub type Result<T> = std::result::Result<T, RiskProfilerError>;

impl RiskProfilerError {
    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        RiskProfilerError::Analysis(msg.into())
    }

    /// Create a new corpus error.
    pub fn corpus<S: Into<String>>(msg: S) -> Self {
        RiskProfilerError::Corpus(msg.into())
    }

    /// Create a new training error.
    pub fn training<S: Into<String>>(msg: S) -> Self {
        RiskProfilerError::Training(msg.into())
    }

    /// Create a new artifact error.
    pub fn artifact<S: Into<String>>(msg: S) -> Self {
        RiskProfilerError::Artifact(msg.into())
    }

    /// Create a new incompatible artifacts error.
    pub fn incompatible<S: Into<String>>(msg: S) -> Self {
        RiskProfilerError::IncompatibleArtifacts(msg.into())
    }

    /// Create a new serialization error.
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        RiskProfilerError::Serialization(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        RiskProfilerError::InvalidConfig(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        RiskProfilerError::Other(msg.into())
    }

    /// Whether this error means the artifact pair could not be used at all,
    /// as opposed to a failure while classifying.
    pub fn is_artifact_problem(&self) -> bool {
        matches!(
            self,
            RiskProfilerError::ArtifactsMissing
                | RiskProfilerError::Artifact(_)
                | RiskProfilerError::IncompatibleArtifacts(_)
        )
    }
}

impl From<bincode::Error> for RiskProfilerError {
    fn from(err: bincode::Error) -> Self {
        RiskProfilerError::Serialization(err.to_string())
    }
}
