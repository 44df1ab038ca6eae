//! Evaluation metrics for held-out predictions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskProfilerError};
use crate::ml::types::RiskProfile;

/// Counts of `(actual, predicted)` pairs, indexed by [`RiskProfile::index`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    counts: [[usize; RiskProfile::COUNT]; RiskProfile::COUNT],
}

impl ConfusionMatrix {
    /// Tally predictions against the true labels.
    pub fn from_predictions(actual: &[RiskProfile], predicted: &[RiskProfile]) -> Result<Self> {
        if actual.len() != predicted.len() {
            return Err(RiskProfilerError::training(format!(
                "{} true labels but {} predictions",
                actual.len(),
                predicted.len()
            )));
        }
        let mut matrix = ConfusionMatrix::default();
        for (a, p) in actual.iter().zip(predicted) {
            matrix.counts[a.index()][p.index()] += 1;
        }
        Ok(matrix)
    }

    /// Number of samples of class `actual` predicted as `predicted`.
    pub fn count(&self, actual: RiskProfile, predicted: RiskProfile) -> usize {
        self.counts[actual.index()][predicted.index()]
    }

    /// Number of samples whose true class is `profile`.
    pub fn support(&self, profile: RiskProfile) -> usize {
        self.counts[profile.index()].iter().sum()
    }

    /// Number of samples predicted as `profile`.
    pub fn predicted(&self, profile: RiskProfile) -> usize {
        self.counts.iter().map(|row| row[profile.index()]).sum()
    }

    /// Total number of samples.
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Number of correct predictions.
    pub fn correct(&self) -> usize {
        (0..RiskProfile::COUNT).map(|i| self.counts[i][i]).sum()
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>14}", "actual\\pred")?;
        for profile in RiskProfile::ALL {
            write!(f, " {:>12}", profile.as_str())?;
        }
        writeln!(f)?;
        for actual in RiskProfile::ALL {
            write!(f, "{:>14}", actual.as_str())?;
            for predicted in RiskProfile::ALL {
                write!(f, " {:>12}", self.count(actual, predicted))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Precision, recall and F1 for one class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub profile: RiskProfile,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class and aggregate metrics for a set of predictions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_f1: f64,
    pub weighted_precision: f64,
    pub weighted_recall: f64,
    pub weighted_f1: f64,
    pub confusion: ConfusionMatrix,
}

/// `num / den`, or zero when the denominator is zero.
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

impl ClassificationReport {
    /// Compute the report for predictions against the true labels.
    pub fn evaluate(actual: &[RiskProfile], predicted: &[RiskProfile]) -> Result<Self> {
        let confusion = ConfusionMatrix::from_predictions(actual, predicted)?;
        if confusion.total() == 0 {
            return Err(RiskProfilerError::training(
                "cannot evaluate an empty prediction set",
            ));
        }

        let classes: Vec<ClassMetrics> = RiskProfile::ALL
            .iter()
            .map(|&profile| {
                let tp = confusion.count(profile, profile);
                let support = confusion.support(profile);
                let precision = ratio(tp, confusion.predicted(profile));
                let recall = ratio(tp, support);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassMetrics {
                    profile,
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect();

        let total = confusion.total() as f64;
        let weighted = |metric: fn(&ClassMetrics) -> f64| {
            classes
                .iter()
                .map(|c| metric(c) * c.support as f64)
                .sum::<f64>()
                / total
        };

        Ok(ClassificationReport {
            accuracy: ratio(confusion.correct(), confusion.total()),
            macro_f1: classes.iter().map(|c| c.f1).sum::<f64>() / classes.len() as f64,
            weighted_precision: weighted(|c: &ClassMetrics| c.precision),
            weighted_recall: weighted(|c: &ClassMetrics| c.recall),
            weighted_f1: weighted(|c: &ClassMetrics| c.f1),
            classes,
            confusion,
        })
    }

    /// Metrics of one class.
    pub fn class(&self, profile: RiskProfile) -> Option<&ClassMetrics> {
        self.classes.iter().find(|c| c.profile == profile)
    }

    /// Number of evaluated samples.
    pub fn support(&self) -> usize {
        self.confusion.total()
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>14} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                c.profile.as_str(),
                c.precision,
                c.recall,
                c.f1,
                c.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>14} {:>10} {:>10} {:>10.2} {:>10}",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.support()
        )?;
        writeln!(
            f,
            "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}",
            "macro avg",
            self.classes.iter().map(|c| c.precision).sum::<f64>() / self.classes.len() as f64,
            self.classes.iter().map(|c| c.recall).sum::<f64>() / self.classes.len() as f64,
            self.macro_f1,
            self.support()
        )?;
        writeln!(
            f,
            "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}",
            "weighted avg",
            self.weighted_precision,
            self.weighted_recall,
            self.weighted_f1,
            self.support()
        )
    }
}
