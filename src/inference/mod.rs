//! Inference service with a never-failing boundary.
//!
//! [`RiskProfiler::infer`] always returns a well-formed [`PredictionResult`].
//! Internally the work is ordinary `Result` code; at the boundary every
//! error, and any panic, is converted into the neutral fallback answer
//! (`Balanced` with confidence `0.33`) carrying an `error` description.
//! Input-quality conditions produce the same fallback with a `warning`
//! instead.
//!
//! # Examples
//!
//! ```
//! use risk_profiler::inference::RiskProfiler;
//! use risk_profiler::ml::RiskProfile;
//!
//! let profiler = RiskProfiler::open("/nonexistent/models");
//! let result = profiler.infer("I want to protect my savings");
//!
//! assert_eq!(result.risk_profile, RiskProfile::Balanced);
//! assert_eq!(result.error.as_deref(), Some("models not found"));
//! ```

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analysis::normalizer::{Normalizer, default_normalizer};
use crate::error::{Result, RiskProfilerError};
use crate::ml::model::ModelPair;
use crate::ml::types::RiskProfile;
use crate::storage::ArtifactStore;

/// Profile returned whenever classification cannot be performed.
pub const FALLBACK_PROFILE: RiskProfile = RiskProfile::Balanced;

/// Confidence attached to every fallback answer.
pub const FALLBACK_CONFIDENCE: f64 = 0.33;

/// Warning for empty or whitespace-only input.
pub const NO_INPUT_WARNING: &str = "no input provided";

/// Warning for input with nothing left after normalization.
pub const NO_CONTENT_WARNING: &str = "input too short or contained no meaningful content";

/// The single result shape of inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub risk_profile: RiskProfile,
    /// Probability of `risk_profile`, rounded to two decimals.
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PredictionResult {
    /// A real classification.
    pub fn classified(risk_profile: RiskProfile, confidence: f64) -> Self {
        PredictionResult {
            risk_profile,
            confidence: round_confidence(confidence),
            warning: None,
            error: None,
        }
    }

    /// Fallback answer for an input-quality condition.
    pub fn fallback_warning<S: Into<String>>(warning: S) -> Self {
        PredictionResult {
            risk_profile: FALLBACK_PROFILE,
            confidence: FALLBACK_CONFIDENCE,
            warning: Some(warning.into()),
            error: None,
        }
    }

    /// Fallback answer for a failure.
    pub fn fallback_error<S: Into<String>>(error: S) -> Self {
        PredictionResult {
            risk_profile: FALLBACK_PROFILE,
            confidence: FALLBACK_CONFIDENCE,
            warning: None,
            error: Some(error.into()),
        }
    }

    /// Whether this is a fallback rather than a classification.
    pub fn is_fallback(&self) -> bool {
        self.warning.is_some() || self.error.is_some()
    }

    /// Compact single-line JSON.
    pub fn to_json_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                "{{\"risk_profile\":\"{}\",\"confidence\":{}}}",
                self.risk_profile, self.confidence
            )
        })
    }
}

impl fmt::Display for PredictionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.2})", self.risk_profile, self.confidence)?;
        if let Some(warning) = &self.warning {
            write!(f, " warning: {warning}")?;
        }
        if let Some(error) = &self.error {
            write!(f, " error: {error}")?;
        }
        Ok(())
    }
}

fn round_confidence(confidence: f64) -> f64 {
    if !confidence.is_finite() {
        return FALLBACK_CONFIDENCE;
    }
    ((confidence * 100.0).round() / 100.0).clamp(0.0, 1.0)
}

/// Loaded artifacts, or the reason they could not be loaded.
#[derive(Debug)]
enum Models {
    Ready(ModelPair),
    Unavailable(RiskProfilerError),
}

/// Shared, read-only classification service.
///
/// Artifacts are loaded once when the service is opened; clones share them.
#[derive(Debug, Clone)]
pub struct RiskProfiler {
    models: Arc<Models>,
    normalizer: &'static Normalizer,
}

impl RiskProfiler {
    /// Load the artifact pair from `models_dir`. Never fails: a load error is
    /// kept and reported by every subsequent [`infer`](Self::infer) call.
    pub fn open<P: AsRef<Path>>(models_dir: P) -> Self {
        let store = ArtifactStore::new(models_dir);
        let models = match store.load() {
            Ok(pair) => Models::Ready(pair),
            Err(e) => {
                log::warn!("models in {} are unavailable: {e}", store.dir().display());
                Models::Unavailable(e)
            }
        };
        RiskProfiler {
            models: Arc::new(models),
            normalizer: default_normalizer(),
        }
    }

    /// Serve an in-memory pair.
    pub fn from_pair(pair: ModelPair) -> Self {
        RiskProfiler {
            models: Arc::new(Models::Ready(pair)),
            normalizer: default_normalizer(),
        }
    }

    /// Whether a usable pair is loaded.
    pub fn is_ready(&self) -> bool {
        matches!(*self.models, Models::Ready(_))
    }

    /// The loaded pair, if any.
    pub fn models(&self) -> Option<&ModelPair> {
        match &*self.models {
            Models::Ready(pair) => Some(pair),
            Models::Unavailable(_) => None,
        }
    }

    /// Why the pair could not be loaded, if it could not.
    pub fn load_error(&self) -> Option<&RiskProfilerError> {
        match &*self.models {
            Models::Ready(_) => None,
            Models::Unavailable(e) => Some(e),
        }
    }

    /// Classify a raw statement. Always returns a result.
    pub fn infer(&self, raw: &str) -> PredictionResult {
        match panic::catch_unwind(AssertUnwindSafe(|| self.try_infer(raw))) {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                log::warn!("inference failed, returning fallback: {e}");
                PredictionResult::fallback_error(e.to_string())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::warn!("inference panicked, returning fallback: {message}");
                PredictionResult::fallback_error(message)
            }
        }
    }

    /// Classify many statements in parallel, preserving order.
    pub fn infer_batch<S: AsRef<str> + Sync>(&self, inputs: &[S]) -> Vec<PredictionResult> {
        inputs.par_iter().map(|raw| self.infer(raw.as_ref())).collect()
    }

    fn try_infer(&self, raw: &str) -> Result<PredictionResult> {
        if raw.trim().is_empty() {
            return Ok(PredictionResult::fallback_warning(NO_INPUT_WARNING));
        }

        let pair = match &*self.models {
            Models::Ready(pair) => pair,
            // ArtifactsMissing displays as "models not found".
            Models::Unavailable(e) => return Ok(PredictionResult::fallback_error(e.to_string())),
        };

        let normalized = self.normalizer.normalize(raw)?;
        if normalized.is_empty() {
            log::debug!("input normalized to nothing: {raw:?}");
            return Ok(PredictionResult::fallback_warning(NO_CONTENT_WARNING));
        }

        let prediction = pair.predict(&normalized)?;
        log::debug!(
            "classified {:?} as {} ({:.4})",
            normalized.as_str(),
            prediction.profile,
            prediction.confidence
        );
        Ok(PredictionResult::classified(
            prediction.profile,
            prediction.confidence,
        ))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("internal failure: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("internal failure: {s}")
    } else {
        "internal failure".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::SyntheticCorpus;
    use crate::training::TrainingPipeline;
    use std::sync::OnceLock;

    fn profiler() -> &'static RiskProfiler {
        static PROFILER: OnceLock<RiskProfiler> = OnceLock::new();
        PROFILER.get_or_init(|| {
            let examples = SyntheticCorpus::default().generate(300);
            let outcome = TrainingPipeline::default().train(&examples).unwrap();
            RiskProfiler::from_pair(outcome.pair)
        })
    }

    #[test]
    fn test_no_input_takes_precedence() {
        let missing = RiskProfiler::open("/nonexistent/models");
        for raw in ["", "   ", "\n\t"] {
            let result = missing.infer(raw);
            assert_eq!(result, PredictionResult::fallback_warning(NO_INPUT_WARNING));
        }
    }

    #[test]
    fn test_missing_models() {
        let missing = RiskProfiler::open("/nonexistent/models");
        assert!(!missing.is_ready());
        assert!(matches!(
            missing.load_error(),
            Some(RiskProfilerError::ArtifactsMissing)
        ));

        let result = missing.infer("I want growth");
        assert_eq!(result.risk_profile, RiskProfile::Balanced);
        assert_eq!(result.confidence, 0.33);
        assert_eq!(result.error.as_deref(), Some("models not found"));
        assert_eq!(result.warning, None);
    }

    #[test]
    fn test_noise_gives_no_content_warning() {
        let result = profiler().infer("1234 !!! ### 5678");
        assert_eq!(result, PredictionResult::fallback_warning(NO_CONTENT_WARNING));

        let result = profiler().infer("it is what it is");
        assert_eq!(result.warning.as_deref(), Some(NO_CONTENT_WARNING));
    }

    #[test]
    fn test_classification() {
        let result = profiler().infer("I want to protect my savings and avoid losses");
        assert_eq!(result.risk_profile, RiskProfile::Conservative);
        assert!(result.confidence > 0.34);
        assert!(!result.is_fallback());

        let result = profiler().infer("I am excited about cryptocurrency and maximum returns");
        assert_eq!(result.risk_profile, RiskProfile::Aggressive);
    }

    #[test]
    fn test_confidence_is_rounded() {
        let result = profiler().infer("balanced mix of stocks and bonds");
        assert_eq!(result.confidence, (result.confidence * 100.0).round() / 100.0);
        assert!((0.0..=1.0).contains(&result.confidence));
    }

    #[test]
    fn test_batch_preserves_order() {
        let inputs = ["", "1234", "I want maximum growth"];
        let results = profiler().infer_batch(&inputs);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].warning.as_deref(), Some(NO_INPUT_WARNING));
        assert_eq!(results[1].warning.as_deref(), Some(NO_CONTENT_WARNING));
        assert!(!results[2].is_fallback());
    }

    #[test]
    fn test_json_shape() {
        let json = PredictionResult::classified(RiskProfile::Aggressive, 0.876).to_json_line();
        assert_eq!(json, r#"{"risk_profile":"Aggressive","confidence":0.88}"#);

        let json = PredictionResult::fallback_warning(NO_INPUT_WARNING).to_json_line();
        assert_eq!(
            json,
            r#"{"risk_profile":"Balanced","confidence":0.33,"warning":"no input provided"}"#
        );
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "internal failure: boom");
    }

    #[test]
    fn test_round_confidence() {
        assert_eq!(round_confidence(0.666), 0.67);
        assert_eq!(round_confidence(f64::NAN), FALLBACK_CONFIDENCE);
        assert_eq!(round_confidence(1.2), 1.0);
    }
}
