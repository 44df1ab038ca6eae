//! Machine learning components: the risk profile label set, the TF-IDF
//! vectorizer, the calibrated one-vs-rest linear SVM and evaluation metrics.
//!
//! # Architecture
//!
//! - [`TfIdfVectorizer`] fits a [`TrainedVectorizer`] on normalized text
//! - [`SvmClassifierTrainer`] fits a [`TrainedClassifier`] on feature vectors
//! - [`ModelPair`] binds the two into the unit that is persisted and served
//! - [`ClassificationReport`] evaluates predictions on held-out data

pub mod calibration;
pub mod classifier;
pub mod metrics;
pub mod model;
pub mod svm;
pub mod tfidf;
pub mod types;

// Public exports
pub use calibration::PlattSigmoid;
pub use classifier::{
    ClassProbabilities, ClassifierConfig, Prediction, SvmClassifierTrainer, TrainedClassifier,
};
pub use metrics::{ClassMetrics, ClassificationReport, ConfusionMatrix};
pub use model::ModelPair;
pub use svm::{LinearSvm, SvmParams};
pub use tfidf::{FeatureVector, TfIdfVectorizer, TrainedVectorizer, VectorizerConfig};
pub use types::{LabeledExample, RiskProfile};
