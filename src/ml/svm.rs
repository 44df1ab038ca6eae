//! Binary linear support vector machine.
//!
//! Training solves the dual of the L2-regularized hinge-loss SVM with
//! coordinate descent and active-set shrinking:
//!
//! ```text
//! min_α  ½ αᵀQα − eᵀα   subject to 0 ≤ αᵢ ≤ C,   Qᵢⱼ = yᵢ yⱼ xᵢᵀxⱼ
//! ```
//!
//! The bias is learned as the weight of an extra constant feature, so every
//! sample is implicitly augmented with a trailing `1.0`.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskProfilerError};
use crate::ml::tfidf::FeatureVector;

/// Sparse sample: `(feature index, value)` pairs with non-zero values.
pub type SparseRow = Vec<(usize, f64)>;

/// Value of the implicit bias feature.
const BIAS_FEATURE: f64 = 1.0;

/// Solver parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvmParams {
    /// Regularization parameter (upper bound of every dual variable).
    pub c: f64,
    /// Stopping tolerance on the projected gradient spread.
    pub tolerance: f64,
    /// Maximum number of passes over the data.
    pub max_iter: usize,
}

impl Default for SvmParams {
    fn default() -> Self {
        SvmParams {
            c: 1.0,
            tolerance: 0.1,
            max_iter: 1000,
        }
    }
}

impl SvmParams {
    /// Reject parameters the solver cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !(self.c.is_finite() && self.c > 0.0) {
            return Err(RiskProfilerError::invalid_config(format!(
                "SVM regularization C must be positive, got {}",
                self.c
            )));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(RiskProfilerError::invalid_config(format!(
                "SVM tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if self.max_iter == 0 {
            return Err(RiskProfilerError::invalid_config(
                "SVM max_iter must be > 0",
            ));
        }
        Ok(())
    }
}

/// A trained binary linear separator: `f(x) = w·x + b`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearSvm {
    weights: Vec<f64>,
    bias: f64,
}

impl LinearSvm {
    /// Build a separator from explicit weights.
    pub fn from_parts(weights: Vec<f64>, bias: f64) -> Self {
        LinearSvm { weights, bias }
    }

    /// Fit a separator on sparse rows. `positive[i]` marks sample `i` as the
    /// `+1` class. `seed` fixes the coordinate visiting order.
    pub fn fit(
        rows: &[SparseRow],
        positive: &[bool],
        dimension: usize,
        params: &SvmParams,
        seed: u64,
    ) -> Result<Self> {
        params.validate()?;
        if rows.len() != positive.len() {
            return Err(RiskProfilerError::training(format!(
                "{} samples but {} labels",
                rows.len(),
                positive.len()
            )));
        }
        if rows.is_empty() {
            return Err(RiskProfilerError::training("cannot fit an SVM on zero samples"));
        }
        if let Some(idx) = rows.iter().flatten().map(|(i, _)| *i).find(|i| *i >= dimension) {
            return Err(RiskProfilerError::training(format!(
                "feature index {idx} out of range for dimension {dimension}"
            )));
        }

        let n = rows.len();
        let c = params.c;
        let y: Vec<f64> = positive
            .iter()
            .map(|p| if *p { 1.0 } else { -1.0 })
            .collect();
        let qd: Vec<f64> = rows
            .iter()
            .map(|row| row.iter().map(|(_, v)| v * v).sum::<f64>() + BIAS_FEATURE * BIAS_FEATURE)
            .collect();

        let mut alpha = vec![0.0; n];
        let mut w = vec![0.0; dimension];
        let mut b = 0.0;
        let mut index: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(seed);

        let mut active_size = n;
        let mut pg_max_old = f64::INFINITY;
        let mut pg_min_old = f64::NEG_INFINITY;
        let mut iter = 0;

        while iter < params.max_iter {
            let mut pg_max_new = f64::NEG_INFINITY;
            let mut pg_min_new = f64::INFINITY;

            index[..active_size].shuffle(&mut rng);

            let mut s = 0;
            while s < active_size {
                let i = index[s];
                let yi = y[i];
                let row = &rows[i];

                let margin = row.iter().map(|(j, v)| w[*j] * v).sum::<f64>() + b * BIAS_FEATURE;
                let g = yi * margin - 1.0;

                let mut pg = 0.0;
                if alpha[i] == 0.0 {
                    if g > pg_max_old {
                        active_size -= 1;
                        index.swap(s, active_size);
                        continue;
                    } else if g < 0.0 {
                        pg = g;
                    }
                } else if alpha[i] == c {
                    if g < pg_min_old {
                        active_size -= 1;
                        index.swap(s, active_size);
                        continue;
                    } else if g > 0.0 {
                        pg = g;
                    }
                } else {
                    pg = g;
                }

                pg_max_new = pg_max_new.max(pg);
                pg_min_new = pg_min_new.min(pg);

                if pg.abs() > 1.0e-12 {
                    let alpha_old = alpha[i];
                    alpha[i] = (alpha_old - g / qd[i]).clamp(0.0, c);
                    let d = (alpha[i] - alpha_old) * yi;
                    for (j, v) in row {
                        w[*j] += d * v;
                    }
                    b += d * BIAS_FEATURE;
                }

                s += 1;
            }

            iter += 1;

            if pg_max_new - pg_min_new <= params.tolerance {
                if active_size == n {
                    break;
                }
                // Re-check the full set before declaring convergence.
                active_size = n;
                pg_max_old = f64::INFINITY;
                pg_min_old = f64::NEG_INFINITY;
                continue;
            }

            pg_max_old = if pg_max_new <= 0.0 { f64::INFINITY } else { pg_max_new };
            pg_min_old = if pg_min_new >= 0.0 { f64::NEG_INFINITY } else { pg_min_new };
        }

        if iter >= params.max_iter {
            log::warn!(
                "SVM solver reached max_iter={} before converging",
                params.max_iter
            );
        } else {
            log::debug!("SVM solver converged after {iter} iterations");
        }

        Ok(LinearSvm { weights: w, bias: b })
    }

    /// Signed distance-like score of a dense feature vector.
    pub fn decision_function(&self, features: &FeatureVector) -> f64 {
        self.weights
            .iter()
            .zip(features.as_slice())
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.bias
    }

    /// Score of a sparse row.
    pub fn decision_sparse(&self, row: &[(usize, f64)]) -> f64 {
        row.iter()
            .map(|(j, v)| self.weights.get(*j).copied().unwrap_or(0.0) * v)
            .sum::<f64>()
            + self.bias
    }

    /// Number of input features.
    pub fn dimension(&self) -> usize {
        self.weights.len()
    }

    /// Feature weights.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Intercept.
    pub fn bias(&self) -> f64 {
        self.bias
    }
}
