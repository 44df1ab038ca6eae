//! TF-IDF vectorizer for text feature extraction.
//!
//! [`TfIdfVectorizer`] holds the fitting parameters; fitting produces a
//! frozen [`TrainedVectorizer`] that maps [`NormalizedText`] onto a
//! fixed-dimension [`FeatureVector`]. The trained vectorizer is never mutated
//! after fitting.
//!
//! Weighting follows the smoothed TF-IDF rule:
//!
//! ```text
//! idf(t)    = ln((1 + n) / (1 + df(t))) + 1
//! w(t, d)   = count(t, d) * idf(t)
//! vector(d) = w(·, d) / ||w(·, d)||₂
//! ```

use std::collections::BTreeMap;

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::analysis::normalizer::NormalizedText;
use crate::error::{Result, RiskProfilerError};

/// Parameters controlling vocabulary construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizerConfig {
    /// Upper bound on the vocabulary size.
    pub max_features: usize,
    /// Minimum number of documents a term must appear in.
    pub min_df: usize,
    /// Inclusive range of n-gram lengths.
    pub ngram_range: (usize, usize),
    /// Tokens shorter than this many characters are ignored.
    pub min_token_len: usize,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        VectorizerConfig {
            max_features: 1000,
            min_df: 2,
            ngram_range: (1, 2),
            min_token_len: 2,
        }
    }
}

impl VectorizerConfig {
    /// Set the vocabulary cap.
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set the minimum document frequency.
    pub fn with_min_df(mut self, min_df: usize) -> Self {
        self.min_df = min_df;
        self
    }

    /// Set the n-gram range.
    pub fn with_ngram_range(mut self, min_n: usize, max_n: usize) -> Self {
        self.ngram_range = (min_n, max_n);
        self
    }

    /// Reject configurations that cannot produce a vocabulary.
    pub fn validate(&self) -> Result<()> {
        if self.max_features == 0 {
            return Err(RiskProfilerError::invalid_config("max_features must be > 0"));
        }
        if self.min_df == 0 {
            return Err(RiskProfilerError::invalid_config("min_df must be > 0"));
        }
        let (lo, hi) = self.ngram_range;
        if lo == 0 || lo > hi {
            return Err(RiskProfilerError::invalid_config(format!(
                "invalid ngram_range ({lo}, {hi})"
            )));
        }
        Ok(())
    }

    /// Extract the n-gram terms of a normalized text, in order of occurrence.
    fn terms(&self, text: &NormalizedText) -> Vec<String> {
        let tokens: Vec<&str> = text
            .tokens()
            .filter(|t| t.chars().count() >= self.min_token_len)
            .collect();
        let (lo, hi) = self.ngram_range;

        let mut terms = Vec::new();
        for n in lo..=hi {
            if n > tokens.len() {
                break;
            }
            terms.extend(tokens.windows(n).map(|window| window.join(" ")));
        }
        terms
    }
}

/// A fixed-length numeric feature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    /// Wrap raw feature values.
    pub fn new(values: Vec<f64>) -> Self {
        FeatureVector { values }
    }

    /// The zero vector of the given dimension.
    pub fn zeros(dimension: usize) -> Self {
        FeatureVector {
            values: vec![0.0; dimension],
        }
    }

    /// Number of features.
    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    /// Raw feature values.
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Whether every feature is zero.
    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }

    /// Non-zero entries as `(index, value)` pairs.
    pub fn non_zero(&self) -> Vec<(usize, f64)> {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, v)| **v != 0.0)
            .map(|(i, v)| (i, *v))
            .collect()
    }

    /// Euclidean norm.
    pub fn norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
    }
}

/// TF-IDF vectorizer parameters; [`fit`](Self::fit) produces the frozen model.
#[derive(Debug, Clone, Default)]
pub struct TfIdfVectorizer {
    config: VectorizerConfig,
}

impl TfIdfVectorizer {
    /// Create a new TF-IDF vectorizer with the given configuration.
    pub fn new(config: VectorizerConfig) -> Self {
        TfIdfVectorizer { config }
    }

    /// The fitting parameters.
    pub fn config(&self) -> &VectorizerConfig {
        &self.config
    }

    /// Fit the vectorizer on training documents.
    pub fn fit(&self, documents: &[NormalizedText]) -> Result<TrainedVectorizer> {
        self.config.validate()?;
        if documents.is_empty() {
            return Err(RiskProfilerError::training(
                "cannot fit a vectorizer on an empty corpus",
            ));
        }

        let mut document_frequency: AHashMap<String, usize> = AHashMap::new();
        let mut corpus_frequency: AHashMap<String, usize> = AHashMap::new();

        // Build vocabulary and count document frequencies
        for doc in documents {
            let terms = self.config.terms(doc);
            let unique: AHashSet<&String> = terms.iter().collect();
            for term in unique {
                *document_frequency.entry(term.clone()).or_insert(0) += 1;
            }
            for term in terms {
                *corpus_frequency.entry(term).or_insert(0) += 1;
            }
        }

        let mut candidates: Vec<(String, usize)> = document_frequency
            .into_iter()
            .filter(|(_, df)| *df >= self.config.min_df)
            .collect();

        if candidates.is_empty() {
            return Err(RiskProfilerError::training(format!(
                "no term appears in at least {} documents; vocabulary is empty",
                self.config.min_df
            )));
        }

        if candidates.len() > self.config.max_features {
            candidates.sort_by(|(a, _), (b, _)| {
                corpus_frequency[b]
                    .cmp(&corpus_frequency[a])
                    .then_with(|| a.cmp(b))
            });
            candidates.truncate(self.config.max_features);
        }

        candidates.sort_by(|(a, _), (b, _)| a.cmp(b));

        let n_documents = documents.len();
        let mut vocabulary = BTreeMap::new();
        let mut idf = Vec::with_capacity(candidates.len());
        for (index, (term, df)) in candidates.into_iter().enumerate() {
            idf.push(((n_documents as f64 + 1.0) / (df as f64 + 1.0)).ln() + 1.0);
            vocabulary.insert(term, index);
        }

        log::debug!(
            "fitted TF-IDF vocabulary of {} terms over {} documents",
            vocabulary.len(),
            n_documents
        );

        Ok(TrainedVectorizer::new(
            self.config.clone(),
            vocabulary,
            idf,
            n_documents,
        ))
    }
}

/// A fitted, immutable TF-IDF model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedVectorizer {
    config: VectorizerConfig,
    /// Term -> feature index.
    vocabulary: BTreeMap<String, usize>,
    /// Inverse document frequency per feature index.
    idf: Vec<f64>,
    /// Number of documents seen while fitting.
    n_documents: usize,
    /// Checksum of the vocabulary and weights, shared with the paired classifier.
    fingerprint: u32,
}

impl TrainedVectorizer {
    fn new(
        config: VectorizerConfig,
        vocabulary: BTreeMap<String, usize>,
        idf: Vec<f64>,
        n_documents: usize,
    ) -> Self {
        let fingerprint = Self::compute_fingerprint(&config, &vocabulary, &idf, n_documents);
        TrainedVectorizer {
            config,
            vocabulary,
            idf,
            n_documents,
            fingerprint,
        }
    }

    fn compute_fingerprint(
        config: &VectorizerConfig,
        vocabulary: &BTreeMap<String, usize>,
        idf: &[f64],
        n_documents: usize,
    ) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        for value in [
            config.max_features,
            config.min_df,
            config.ngram_range.0,
            config.ngram_range.1,
            config.min_token_len,
            n_documents,
        ] {
            hasher.update(&(value as u64).to_le_bytes());
        }
        for (term, index) in vocabulary {
            hasher.update(term.as_bytes());
            hasher.update(&[0]);
            hasher.update(&(*index as u64).to_le_bytes());
        }
        for weight in idf {
            hasher.update(&weight.to_bits().to_le_bytes());
        }
        hasher.finalize()
    }

    /// Transform a document into a TF-IDF feature vector.
    ///
    /// Out-of-vocabulary terms contribute nothing; empty text yields the zero
    /// vector. The result always has [`dimension`](Self::dimension) entries.
    pub fn transform(&self, document: &NormalizedText) -> FeatureVector {
        let mut values = vec![0.0; self.dimension()];

        for term in self.config.terms(document) {
            if let Some(&idx) = self.vocabulary.get(&term) {
                values[idx] += 1.0;
            }
        }

        for (idx, value) in values.iter_mut().enumerate() {
            *value *= self.idf[idx];
        }

        let norm = values.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for value in &mut values {
                *value /= norm;
            }
        }

        FeatureVector::new(values)
    }

    /// Transform a batch of documents.
    pub fn transform_all(&self, documents: &[NormalizedText]) -> Vec<FeatureVector> {
        documents.iter().map(|doc| self.transform(doc)).collect()
    }

    /// Size of the vocabulary, which is the dimension of every output vector.
    pub fn dimension(&self) -> usize {
        self.idf.len()
    }

    /// Feature index of a term, if it is in the vocabulary.
    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    /// Vocabulary terms in feature index order.
    pub fn terms(&self) -> Vec<&str> {
        let mut terms: Vec<(&str, usize)> = self
            .vocabulary
            .iter()
            .map(|(term, idx)| (term.as_str(), *idx))
            .collect();
        terms.sort_by_key(|(_, idx)| *idx);
        terms.into_iter().map(|(term, _)| term).collect()
    }

    /// Inverse document frequency of a feature index.
    pub fn idf(&self, index: usize) -> Option<f64> {
        self.idf.get(index).copied()
    }

    /// Number of documents the vectorizer was fitted on.
    pub fn n_documents(&self) -> usize {
        self.n_documents
    }

    /// The fitting parameters.
    pub fn config(&self) -> &VectorizerConfig {
        &self.config
    }

    /// Pairing tag shared with the classifier fitted in the same run.
    pub fn fingerprint(&self) -> u32 {
        self.fingerprint
    }

    /// Check the internal tables against each other and the stored fingerprint.
    pub fn verify(&self) -> Result<()> {
        if self.vocabulary.len() != self.idf.len() {
            return Err(RiskProfilerError::artifact(format!(
                "vectorizer vocabulary has {} terms but {} idf weights",
                self.vocabulary.len(),
                self.idf.len()
            )));
        }
        if self.vocabulary.values().any(|idx| *idx >= self.idf.len()) {
            return Err(RiskProfilerError::artifact(
                "vectorizer vocabulary index out of range",
            ));
        }
        let expected =
            Self::compute_fingerprint(&self.config, &self.vocabulary, &self.idf, self.n_documents);
        if expected != self.fingerprint {
            return Err(RiskProfilerError::artifact(format!(
                "vectorizer fingerprint mismatch: stored {:08x}, computed {:08x}",
                self.fingerprint, expected
            )));
        }
        Ok(())
    }
}
