//! Offline training of the vectorizer/classifier pair.
//!
//! The pipeline runs once per corpus:
//!
//! 1. normalize every statement
//! 2. split stratified by label into train and test partitions
//! 3. fit the TF-IDF vectorizer on the train partition only
//! 4. fit the calibrated classifier on the train vectors
//! 5. evaluate on the test partition
//! 6. persist both artifacts as one pair
//!
//! An F1 score below the configured threshold is reported as a warning; the
//! artifacts are written regardless. Any earlier failure aborts the run
//! before anything is written.

pub mod split;

use std::fmt;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analysis::normalizer::{NormalizedText, Normalizer, default_normalizer};
use crate::corpus::read_corpus;
use crate::error::{Result, RiskProfilerError};
use crate::ml::classifier::{ClassifierConfig, SvmClassifierTrainer};
use crate::ml::metrics::ClassificationReport;
use crate::ml::model::ModelPair;
use crate::ml::tfidf::{TfIdfVectorizer, VectorizerConfig};
use crate::ml::types::{LabeledExample, RiskProfile};
use crate::storage::ArtifactStore;

pub use split::{Split, stratified_split};

/// Training parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Fraction of each class held out for evaluation.
    pub test_size: f64,
    /// Seed of the train/test split.
    pub seed: u64,
    /// Weighted F1 score the model is expected to reach.
    pub f1_threshold: f64,
    pub vectorizer: VectorizerConfig,
    pub classifier: ClassifierConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            test_size: 0.2,
            seed: 42,
            f1_threshold: 0.70,
            vectorizer: VectorizerConfig::default(),
            classifier: ClassifierConfig::default(),
        }
    }
}

impl TrainingConfig {
    /// Load a configuration from a JSON file. Missing keys take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            RiskProfilerError::invalid_config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: TrainingConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_f1_threshold(mut self, threshold: f64) -> Self {
        self.f1_threshold = threshold;
        self
    }

    pub fn with_vectorizer(mut self, vectorizer: VectorizerConfig) -> Self {
        self.vectorizer = vectorizer;
        self
    }

    pub fn with_classifier(mut self, classifier: ClassifierConfig) -> Self {
        self.classifier = classifier;
        self
    }

    /// Reject nonsensical values.
    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(RiskProfilerError::invalid_config(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        if !(0.0..=1.0).contains(&self.f1_threshold) {
            return Err(RiskProfilerError::invalid_config(format!(
                "f1_threshold must be in [0, 1], got {}",
                self.f1_threshold
            )));
        }
        self.vectorizer.validate()?;
        self.classifier.validate()
    }
}

/// Summary of one training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Corpus size.
    pub samples: usize,
    pub train_size: usize,
    pub test_size: usize,
    /// Number of features of the fitted vectorizer.
    pub vocabulary_size: usize,
    /// Support-weighted F1 on the test partition.
    pub weighted_f1: f64,
    pub accuracy: f64,
    /// Whether `weighted_f1` reached `threshold`.
    pub passed_threshold: bool,
    pub threshold: f64,
    /// Per-class evaluation detail.
    pub report: ClassificationReport,
    pub trained_at: DateTime<Utc>,
}

impl fmt::Display for TrainingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Trained at:       {}", self.trained_at.to_rfc3339())?;
        writeln!(f, "Samples:          {}", self.samples)?;
        writeln!(f, "Train / test:     {} / {}", self.train_size, self.test_size)?;
        writeln!(f, "Vocabulary size:  {}", self.vocabulary_size)?;
        writeln!(f)?;
        writeln!(f, "{}", self.report)?;
        writeln!(f, "Confusion matrix:")?;
        writeln!(f, "{}", self.report.confusion)?;
        let verdict = if self.passed_threshold {
            "target reached"
        } else {
            "target NOT reached, consider adding more data"
        };
        write!(
            f,
            "Weighted F1: {:.2}% (threshold {:.0}%): {}",
            self.weighted_f1 * 100.0,
            self.threshold * 100.0,
            verdict
        )
    }
}

/// The fitted pair together with its evaluation.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub pair: ModelPair,
    pub report: TrainingReport,
}

/// Orchestrates normalization, fitting, evaluation and persistence.
#[derive(Debug, Clone)]
pub struct TrainingPipeline {
    config: TrainingConfig,
    normalizer: Normalizer,
}

impl Default for TrainingPipeline {
    fn default() -> Self {
        TrainingPipeline::new(TrainingConfig::default())
    }
}

impl TrainingPipeline {
    /// Create a pipeline using the shared English normalizer.
    pub fn new(config: TrainingConfig) -> Self {
        TrainingPipeline {
            config,
            normalizer: default_normalizer().clone(),
        }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Fit and evaluate a model pair in memory.
    pub fn train(&self, examples: &[LabeledExample]) -> Result<TrainingOutcome> {
        self.config.validate()?;
        if examples.is_empty() {
            return Err(RiskProfilerError::corpus("corpus contains no examples"));
        }

        let texts: Vec<NormalizedText> = examples
            .par_iter()
            .map(|e| self.normalizer.normalize(&e.text))
            .collect::<Result<Vec<_>>>()?;
        let labels: Vec<RiskProfile> = examples.iter().map(|e| e.label).collect();

        let empty = texts.iter().filter(|t| t.is_empty()).count();
        if empty > 0 {
            log::debug!("{empty} examples normalize to empty text");
        }

        let split = stratified_split(&labels, self.config.test_size, self.config.seed);
        if split.test.is_empty() {
            return Err(RiskProfilerError::training(
                "corpus is too small to hold out a test partition",
            ));
        }
        log::info!(
            "split {} examples into {} train / {} test",
            examples.len(),
            split.train.len(),
            split.test.len()
        );

        let select = |indices: &[usize]| -> (Vec<NormalizedText>, Vec<RiskProfile>) {
            indices.iter().map(|i| (texts[*i].clone(), labels[*i])).unzip()
        };
        let (train_texts, train_labels) = select(&split.train);
        let (test_texts, test_labels) = select(&split.test);

        let vectorizer = TfIdfVectorizer::new(self.config.vectorizer.clone()).fit(&train_texts)?;
        log::info!("vocabulary size: {}", vectorizer.dimension());

        let train_features = vectorizer.transform_all(&train_texts);
        let test_features = vectorizer.transform_all(&test_texts);

        let classifier = SvmClassifierTrainer::new(self.config.classifier.clone()).train(
            &train_features,
            &train_labels,
            vectorizer.fingerprint(),
        )?;

        let predicted = test_features
            .iter()
            .map(|f| classifier.predict(f).map(|p| p.profile))
            .collect::<Result<Vec<_>>>()?;
        let report = ClassificationReport::evaluate(&test_labels, &predicted)?;

        let passed_threshold = report.weighted_f1 >= self.config.f1_threshold;
        if passed_threshold {
            log::info!(
                "weighted F1 {:.4} meets threshold {:.2}",
                report.weighted_f1,
                self.config.f1_threshold
            );
        } else {
            log::warn!(
                "weighted F1 {:.4} is below threshold {:.2}; consider retraining or adding more data",
                report.weighted_f1,
                self.config.f1_threshold
            );
        }

        let vocabulary_size = vectorizer.dimension();
        let pair = ModelPair::new(vectorizer, classifier)?;

        let report = TrainingReport {
            samples: examples.len(),
            train_size: split.train.len(),
            test_size: split.test.len(),
            vocabulary_size,
            weighted_f1: report.weighted_f1,
            accuracy: report.accuracy,
            passed_threshold,
            threshold: self.config.f1_threshold,
            report,
            trained_at: Utc::now(),
        };

        Ok(TrainingOutcome { pair, report })
    }

    /// Load a corpus, train, and persist the pair into `output_dir`.
    pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        corpus_path: P,
        output_dir: Q,
    ) -> Result<TrainingReport> {
        let examples = read_corpus(corpus_path)?;
        let outcome = self.train(&examples)?;
        ArtifactStore::new(output_dir).save(&outcome.pair)?;
        Ok(outcome.report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::SyntheticCorpus;
    use tempfile::TempDir;

    #[test]
    fn test_train_on_synthetic_corpus() {
        let examples = SyntheticCorpus::default().generate(300);
        let outcome = TrainingPipeline::default().train(&examples).unwrap();

        let report = &outcome.report;
        assert_eq!(report.samples, 300);
        assert_eq!(report.train_size + report.test_size, 300);
        assert_eq!(report.test_size, 60);
        assert!(report.vocabulary_size > 0);
        assert!(report.vocabulary_size <= 1000);
        assert_eq!(report.vocabulary_size, outcome.pair.vectorizer().dimension());
        assert!(report.passed_threshold, "weighted F1 {}", report.weighted_f1);
    }

    #[test]
    fn test_sub_threshold_is_not_fatal() {
        let examples = SyntheticCorpus::default().generate(90);
        let config = TrainingConfig::default().with_f1_threshold(1.0);
        let dir = TempDir::new().unwrap();
        let corpus = dir.path().join("corpus.csv");
        crate::corpus::write_corpus(&corpus, &examples).unwrap();

        let pipeline = TrainingPipeline::new(config);
        let report = pipeline.run(&corpus, dir.path().join("models")).unwrap();

        assert_eq!(report.threshold, 1.0);
        assert_eq!(report.passed_threshold, report.weighted_f1 >= 1.0);
        assert!(ArtifactStore::new(dir.path().join("models")).exists());
    }

    #[test]
    fn test_bad_corpus_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let corpus = dir.path().join("corpus.csv");
        fs::write(&corpus, "text,risk_profile\nhello,Unknown\n").unwrap();
        let models = dir.path().join("models");

        assert!(TrainingPipeline::default().run(&corpus, &models).is_err());
        assert!(!models.exists());
    }

    #[test]
    fn test_missing_class_is_fatal() {
        let examples: Vec<LabeledExample> = SyntheticCorpus::default()
            .generate(60)
            .into_iter()
            .filter(|e| e.label != RiskProfile::Aggressive)
            .collect();

        let err = TrainingPipeline::default().train(&examples).unwrap_err();
        assert!(matches!(err, RiskProfilerError::Training(_)));
    }

    #[test]
    fn test_config_validation_and_file() {
        assert!(TrainingConfig::default().validate().is_ok());
        assert!(TrainingConfig::default().with_test_size(0.0).validate().is_err());
        assert!(TrainingConfig::default().with_test_size(1.0).validate().is_err());
        assert!(
            TrainingConfig::default()
                .with_classifier(ClassifierConfig::default().with_c(-1.0))
                .validate()
                .is_err()
        );

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"test_size": 0.25, "vectorizer": {"min_df": 1}}"#).unwrap();
        let config = TrainingConfig::from_file(&path).unwrap();
        assert_eq!(config.test_size, 0.25);
        assert_eq!(config.vectorizer.min_df, 1);
        assert_eq!(config.vectorizer.max_features, 1000);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn test_training_is_deterministic() {
        let examples = SyntheticCorpus::default().generate(120);
        let a = TrainingPipeline::default().train(&examples).unwrap();
        let b = TrainingPipeline::default().train(&examples).unwrap();
        assert_eq!(a.pair, b.pair);
        assert_eq!(a.report.weighted_f1, b.report.weighted_f1);
    }
}
