//! The vectorizer/classifier pair produced by one training run.

use crate::analysis::normalizer::NormalizedText;
use crate::error::{Result, RiskProfilerError};
use crate::ml::classifier::{Prediction, TrainedClassifier};
use crate::ml::tfidf::{FeatureVector, TrainedVectorizer};

/// A vectorizer and the classifier trained on its output.
///
/// The pair is only constructible when the two halves agree on feature
/// dimension and fingerprint, so a `ModelPair` can always classify.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPair {
    vectorizer: TrainedVectorizer,
    classifier: TrainedClassifier,
}

impl ModelPair {
    /// Bind the two halves, rejecting halves from different training runs.
    pub fn new(vectorizer: TrainedVectorizer, classifier: TrainedClassifier) -> Result<Self> {
        vectorizer.verify()?;
        classifier.verify()?;

        if vectorizer.dimension() != classifier.dimension() {
            return Err(RiskProfilerError::incompatible(format!(
                "vectorizer produces {} features but classifier expects {}",
                vectorizer.dimension(),
                classifier.dimension()
            )));
        }
        if vectorizer.fingerprint() != classifier.vectorizer_fingerprint() {
            return Err(RiskProfilerError::incompatible(format!(
                "classifier was trained against vectorizer {:08x}, found {:08x}",
                classifier.vectorizer_fingerprint(),
                vectorizer.fingerprint()
            )));
        }

        Ok(ModelPair {
            vectorizer,
            classifier,
        })
    }

    /// The vectorizer half.
    pub fn vectorizer(&self) -> &TrainedVectorizer {
        &self.vectorizer
    }

    /// The classifier half.
    pub fn classifier(&self) -> &TrainedClassifier {
        &self.classifier
    }

    /// Split into the two halves.
    pub fn into_parts(self) -> (TrainedVectorizer, TrainedClassifier) {
        (self.vectorizer, self.classifier)
    }

    /// Feature vector of a normalized text.
    pub fn vectorize(&self, text: &NormalizedText) -> FeatureVector {
        self.vectorizer.transform(text)
    }

    /// Classify a normalized text.
    pub fn predict(&self, text: &NormalizedText) -> Result<Prediction> {
        self.classifier.predict(&self.vectorize(text))
    }
}
