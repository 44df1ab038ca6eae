//! Calibrated one-vs-rest linear SVM over the risk profiles.
//!
//! One binary [`LinearSvm`] is fitted per [`RiskProfile`]. Each machine's raw
//! decision values are mapped to probabilities through a [`PlattSigmoid`]
//! fitted on out-of-fold decision values, and the per-class probabilities are
//! normalized to sum to one.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskProfilerError};
use crate::ml::calibration::PlattSigmoid;
use crate::ml::svm::{LinearSvm, SparseRow, SvmParams};
use crate::ml::tfidf::FeatureVector;
use crate::ml::types::RiskProfile;

/// Classifier training parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Parameters of every binary machine.
    pub svm: SvmParams,
    /// Number of stratified folds used to collect calibration data.
    pub calibration_folds: usize,
    /// Base seed for the solver and the fold assignment.
    pub seed: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            svm: SvmParams::default(),
            calibration_folds: 5,
            seed: 42,
        }
    }
}

impl ClassifierConfig {
    /// Set the regularization parameter.
    pub fn with_c(mut self, c: f64) -> Self {
        self.svm.c = c;
        self
    }

    /// Set the number of calibration folds.
    pub fn with_calibration_folds(mut self, folds: usize) -> Self {
        self.calibration_folds = folds;
        self
    }

    /// Set the base seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Reject unusable parameters.
    pub fn validate(&self) -> Result<()> {
        self.svm.validate()?;
        if self.calibration_folds < 2 {
            return Err(RiskProfilerError::invalid_config(format!(
                "calibration_folds must be >= 2, got {}",
                self.calibration_folds
            )));
        }
        Ok(())
    }
}

/// Probability per risk profile, indexed by [`RiskProfile::index`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassProbabilities([f64; RiskProfile::COUNT]);

impl ClassProbabilities {
    /// Normalize raw non-negative scores to a distribution. Degenerate input
    /// (all zero or non-finite) becomes the uniform distribution.
    pub fn from_scores(scores: [f64; RiskProfile::COUNT]) -> Self {
        let sum: f64 = scores.iter().sum();
        if !sum.is_finite() || sum <= 0.0 || scores.iter().any(|s| !s.is_finite() || *s < 0.0) {
            return Self::uniform();
        }
        let mut values = scores;
        for value in &mut values {
            *value /= sum;
        }
        ClassProbabilities(values)
    }

    /// Equal probability for every profile.
    pub fn uniform() -> Self {
        ClassProbabilities([1.0 / RiskProfile::COUNT as f64; RiskProfile::COUNT])
    }

    /// Probability of one profile.
    pub fn get(&self, profile: RiskProfile) -> f64 {
        self.0[profile.index()]
    }

    /// `(profile, probability)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (RiskProfile, f64)> + '_ {
        RiskProfile::ALL.iter().map(|p| (*p, self.0[p.index()]))
    }

    /// Most probable profile; ties go to the earlier profile.
    pub fn best(&self) -> (RiskProfile, f64) {
        let mut best = (RiskProfile::ALL[0], self.0[0]);
        for (profile, p) in self.iter().skip(1) {
            if p > best.1 {
                best = (profile, p);
            }
        }
        best
    }

    /// Raw values.
    pub fn as_array(&self) -> &[f64; RiskProfile::COUNT] {
        &self.0
    }
}

/// Output of [`TrainedClassifier::predict`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Chosen profile.
    pub profile: RiskProfile,
    /// Probability of the chosen profile, in `[0, 1]`.
    pub confidence: f64,
    /// Full distribution.
    pub probabilities: ClassProbabilities,
}

/// Fits [`TrainedClassifier`]s.
#[derive(Debug, Clone, Default)]
pub struct SvmClassifierTrainer {
    config: ClassifierConfig,
}

impl SvmClassifierTrainer {
    /// Create a trainer with the given parameters.
    pub fn new(config: ClassifierConfig) -> Self {
        SvmClassifierTrainer { config }
    }

    /// The training parameters.
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Fit one calibrated machine per profile.
    ///
    /// `vectorizer_fingerprint` is recorded so that the classifier can later
    /// be checked against the vectorizer that produced `features`.
    pub fn train(
        &self,
        features: &[FeatureVector],
        labels: &[RiskProfile],
        vectorizer_fingerprint: u32,
    ) -> Result<TrainedClassifier> {
        self.config.validate()?;
        if features.len() != labels.len() {
            return Err(RiskProfilerError::training(format!(
                "{} feature vectors but {} labels",
                features.len(),
                labels.len()
            )));
        }
        if features.is_empty() {
            return Err(RiskProfilerError::training(
                "cannot train a classifier on zero examples",
            ));
        }

        let dimension = features[0].dimension();
        if let Some(bad) = features.iter().find(|f| f.dimension() != dimension) {
            return Err(RiskProfilerError::training(format!(
                "inconsistent feature dimensions: {} and {}",
                dimension,
                bad.dimension()
            )));
        }

        for profile in RiskProfile::ALL {
            if !labels.contains(&profile) {
                return Err(RiskProfilerError::training(format!(
                    "training data has no {profile} examples; all three profiles are required"
                )));
            }
        }

        let rows: Vec<SparseRow> = features.iter().map(FeatureVector::non_zero).collect();

        let fitted: Vec<(LinearSvm, PlattSigmoid)> = (0..RiskProfile::COUNT)
            .into_par_iter()
            .map(|class_idx| {
                let profile = RiskProfile::ALL[class_idx];
                let positive: Vec<bool> = labels.iter().map(|l| *l == profile).collect();
                self.fit_class(&rows, &positive, dimension, class_idx)
            })
            .collect::<Result<Vec<_>>>()?;

        let (machines, sigmoids) = fitted.into_iter().unzip();

        log::info!(
            "trained one-vs-rest SVM on {} examples with {} features",
            features.len(),
            dimension
        );

        Ok(TrainedClassifier {
            dimension,
            machines,
            sigmoids,
            vectorizer_fingerprint,
        })
    }

    fn class_seed(&self, class_idx: usize, fold: usize) -> u64 {
        self.config
            .seed
            .wrapping_add(class_idx as u64 * 1000)
            .wrapping_add(fold as u64)
    }

    fn fit_class(
        &self,
        rows: &[SparseRow],
        positive: &[bool],
        dimension: usize,
        class_idx: usize,
    ) -> Result<(LinearSvm, PlattSigmoid)> {
        let params = &self.config.svm;
        let folds = self.config.calibration_folds;

        let n_pos = positive.iter().filter(|p| **p).count();
        let n_neg = positive.len() - n_pos;

        let machine = LinearSvm::fit(rows, positive, dimension, params, self.class_seed(class_idx, 0))?;

        let decision_values = if n_pos.min(n_neg) >= folds {
            self.out_of_fold_decisions(rows, positive, dimension, class_idx)?
        } else {
            log::debug!(
                "class {} has too few examples for {folds}-fold calibration; using in-sample scores",
                RiskProfile::ALL[class_idx]
            );
            rows.iter().map(|row| machine.decision_sparse(row)).collect()
        };

        let sigmoid = PlattSigmoid::fit(&decision_values, positive)?;
        Ok((machine, sigmoid))
    }

    /// Decision value of every sample from a machine that never saw it.
    fn out_of_fold_decisions(
        &self,
        rows: &[SparseRow],
        positive: &[bool],
        dimension: usize,
        class_idx: usize,
    ) -> Result<Vec<f64>> {
        let folds = self.config.calibration_folds;
        let fold_of = stratified_folds(positive, folds, self.class_seed(class_idx, 0));

        let mut decisions = vec![0.0; rows.len()];
        for fold in 0..folds {
            let (train_rows, train_labels): (Vec<SparseRow>, Vec<bool>) = rows
                .iter()
                .zip(positive)
                .zip(&fold_of)
                .filter(|(_, f)| **f != fold)
                .map(|((row, label), _)| (row.clone(), *label))
                .unzip();

            let machine = LinearSvm::fit(
                &train_rows,
                &train_labels,
                dimension,
                &self.config.svm,
                self.class_seed(class_idx, fold + 1),
            )?;

            for (i, row) in rows.iter().enumerate() {
                if fold_of[i] == fold {
                    decisions[i] = machine.decision_sparse(row);
                }
            }
        }
        Ok(decisions)
    }
}

/// Assign every sample to a fold so that each fold holds an even share of
/// both binary classes.
fn stratified_folds(positive: &[bool], folds: usize, seed: u64) -> Vec<usize> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut fold_of = vec![0; positive.len()];

    for class in [true, false] {
        let mut members: Vec<usize> = (0..positive.len())
            .filter(|i| positive[*i] == class)
            .collect();
        members.shuffle(&mut rng);
        for (rank, idx) in members.into_iter().enumerate() {
            fold_of[idx] = rank % folds;
        }
    }
    fold_of
}

/// A fitted, immutable classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedClassifier {
    dimension: usize,
    machines: Vec<LinearSvm>,
    sigmoids: Vec<PlattSigmoid>,
    vectorizer_fingerprint: u32,
}

impl TrainedClassifier {
    /// Expected feature dimension.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Fingerprint of the vectorizer this classifier was trained against.
    pub fn vectorizer_fingerprint(&self) -> u32 {
        self.vectorizer_fingerprint
    }

    /// Labels this classifier can produce, in index order.
    pub fn classes(&self) -> &'static [RiskProfile] {
        &RiskProfile::ALL
    }

    /// Check the internal tables against each other.
    pub fn verify(&self) -> Result<()> {
        if self.machines.len() != RiskProfile::COUNT || self.sigmoids.len() != RiskProfile::COUNT {
            return Err(RiskProfilerError::artifact(format!(
                "classifier holds {} machines and {} sigmoids, expected {}",
                self.machines.len(),
                self.sigmoids.len(),
                RiskProfile::COUNT
            )));
        }
        if let Some(m) = self.machines.iter().find(|m| m.dimension() != self.dimension) {
            return Err(RiskProfilerError::artifact(format!(
                "classifier machine has dimension {} but classifier expects {}",
                m.dimension(),
                self.dimension
            )));
        }
        Ok(())
    }

    fn check_dimension(&self, features: &FeatureVector) -> Result<()> {
        if features.dimension() != self.dimension {
            return Err(RiskProfilerError::incompatible(format!(
                "feature vector has dimension {} but classifier expects {}",
                features.dimension(),
                self.dimension
            )));
        }
        Ok(())
    }

    /// Raw one-vs-rest decision values, indexed by [`RiskProfile::index`].
    pub fn decision_values(&self, features: &FeatureVector) -> Result<[f64; RiskProfile::COUNT]> {
        self.check_dimension(features)?;
        let mut values = [0.0; RiskProfile::COUNT];
        for (value, machine) in values.iter_mut().zip(&self.machines) {
            *value = machine.decision_function(features);
        }
        Ok(values)
    }

    /// Calibrated probability distribution over the profiles.
    pub fn predict_proba(&self, features: &FeatureVector) -> Result<ClassProbabilities> {
        let decisions = self.decision_values(features)?;
        let mut scores = [0.0; RiskProfile::COUNT];
        for ((score, decision), sigmoid) in scores.iter_mut().zip(decisions).zip(&self.sigmoids) {
            *score = sigmoid.probability(decision);
        }
        Ok(ClassProbabilities::from_scores(scores))
    }

    /// Most probable profile together with its probability.
    pub fn predict(&self, features: &FeatureVector) -> Result<Prediction> {
        let probabilities = self.predict_proba(features)?;
        let (profile, confidence) = probabilities.best();
        Ok(Prediction {
            profile,
            confidence,
            probabilities,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Three well separated clusters on the first three axes, with a little
    /// shared noise on the fourth.
    fn clustered(per_class: usize) -> (Vec<FeatureVector>, Vec<RiskProfile>) {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..per_class {
            let noise = 0.05 * (i % 4) as f64;
            for profile in RiskProfile::ALL {
                let mut values = vec![0.0; 4];
                values[profile.index()] = 1.0 - noise;
                values[3] = noise;
                features.push(FeatureVector::new(values));
                labels.push(profile);
            }
        }
        (features, labels)
    }

    #[test]
    fn test_train_and_predict_clusters() {
        let (features, labels) = clustered(10);
        let classifier = SvmClassifierTrainer::default()
            .train(&features, &labels, 7)
            .unwrap();

        assert_eq!(classifier.dimension(), 4);
        assert_eq!(classifier.vectorizer_fingerprint(), 7);
        classifier.verify().unwrap();

        for profile in RiskProfile::ALL {
            let mut values = vec![0.0; 4];
            values[profile.index()] = 1.0;
            let prediction = classifier.predict(&FeatureVector::new(values)).unwrap();
            assert_eq!(prediction.profile, profile);
            assert!(prediction.confidence > 1.0 / 3.0);
        }
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let (features, labels) = clustered(6);
        let classifier = SvmClassifierTrainer::default()
            .train(&features, &labels, 0)
            .unwrap();

        let probabilities = classifier
            .predict_proba(&FeatureVector::new(vec![0.3, 0.3, 0.3, 0.1]))
            .unwrap();
        let sum: f64 = probabilities.iter().map(|(_, p)| p).sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(probabilities.iter().all(|(_, p)| (0.0..=1.0).contains(&p)));
    }

    #[test]
    fn test_small_classes_fall_back_to_in_sample_calibration() {
        let (features, labels) = clustered(2);
        let classifier = SvmClassifierTrainer::default()
            .train(&features, &labels, 0)
            .unwrap();

        let prediction = classifier
            .predict(&FeatureVector::new(vec![0.0, 0.0, 1.0, 0.0]))
            .unwrap();
        assert_eq!(prediction.profile, RiskProfile::Aggressive);
    }

    #[test]
    fn test_training_is_deterministic() {
        let (features, labels) = clustered(8);
        let trainer = SvmClassifierTrainer::default();
        let a = trainer.train(&features, &labels, 1).unwrap();
        let b = trainer.train(&features, &labels, 1).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_missing_class_is_rejected() {
        let features = vec![
            FeatureVector::new(vec![1.0, 0.0]),
            FeatureVector::new(vec![0.0, 1.0]),
        ];
        let labels = vec![RiskProfile::Conservative, RiskProfile::Balanced];
        let err = SvmClassifierTrainer::default()
            .train(&features, &labels, 0)
            .unwrap_err();
        assert!(err.to_string().contains("Aggressive"));
    }

    #[test]
    fn test_dimension_mismatch_is_incompatible() {
        let (features, labels) = clustered(3);
        let classifier = SvmClassifierTrainer::default()
            .train(&features, &labels, 0)
            .unwrap();

        let err = classifier
            .predict(&FeatureVector::new(vec![1.0, 0.0]))
            .unwrap_err();
        assert!(matches!(err, RiskProfilerError::IncompatibleArtifacts(_)));
    }

    #[test]
    fn test_degenerate_scores_become_uniform() {
        let uniform = ClassProbabilities::from_scores([0.0, 0.0, 0.0]);
        assert_eq!(uniform, ClassProbabilities::uniform());
        assert_eq!(uniform.best().0, RiskProfile::Conservative);

        let nan = ClassProbabilities::from_scores([f64::NAN, 0.5, 0.5]);
        assert_eq!(nan, ClassProbabilities::uniform());
    }

    #[test]
    fn test_stratified_folds_spread_each_class() {
        let positive: Vec<bool> = (0..20).map(|i| i % 4 == 0).collect();
        let folds = stratified_folds(&positive, 5, 42);

        for fold in 0..5 {
            let pos = (0..20).filter(|i| positive[*i] && folds[*i] == fold).count();
            let neg = (0..20).filter(|i| !positive[*i] && folds[*i] == fold).count();
            assert_eq!(pos, 1);
            assert_eq!(neg, 3);
        }
    }
}
