//! Platt scaling: map raw SVM decision values to probabilities.
//!
//! A sigmoid `P(y = 1 | f) = 1 / (1 + exp(A·f + B))` is fitted by Newton's
//! method with backtracking line search on regularized targets, which keeps
//! the fit well-defined even when the decision values separate the classes
//! perfectly.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskProfilerError};

const MAX_ITER: usize = 100;
const MIN_STEP: f64 = 1e-10;
const SIGMA: f64 = 1e-12;
const EPS: f64 = 1e-5;

/// Fitted sigmoid parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlattSigmoid {
    a: f64,
    b: f64,
}

impl PlattSigmoid {
    /// Build a sigmoid from explicit parameters.
    pub fn new(a: f64, b: f64) -> Self {
        PlattSigmoid { a, b }
    }

    /// Slope parameter. Negative when larger decision values mean "positive".
    pub fn a(&self) -> f64 {
        self.a
    }

    /// Offset parameter.
    pub fn b(&self) -> f64 {
        self.b
    }

    /// Fit on decision values and their true binary labels.
    pub fn fit(decision_values: &[f64], positive: &[bool]) -> Result<Self> {
        if decision_values.len() != positive.len() {
            return Err(RiskProfilerError::training(format!(
                "{} decision values but {} labels",
                decision_values.len(),
                positive.len()
            )));
        }
        if decision_values.is_empty() {
            return Err(RiskProfilerError::training(
                "cannot calibrate on zero decision values",
            ));
        }
        if decision_values.iter().any(|f| !f.is_finite()) {
            return Err(RiskProfilerError::training(
                "decision values must be finite",
            ));
        }

        let prior1 = positive.iter().filter(|p| **p).count() as f64;
        let prior0 = positive.len() as f64 - prior1;

        let hi_target = (prior1 + 1.0) / (prior1 + 2.0);
        let lo_target = 1.0 / (prior0 + 2.0);
        let t: Vec<f64> = positive
            .iter()
            .map(|p| if *p { hi_target } else { lo_target })
            .collect();

        let mut a = 0.0;
        let mut b = ((prior0 + 1.0) / (prior1 + 1.0)).ln();
        let mut fval = objective(decision_values, &t, a, b);

        let mut iter = 0;
        while iter < MAX_ITER {
            // Gradient and Hessian (with a small ridge for stability)
            let mut h11 = SIGMA;
            let mut h22 = SIGMA;
            let mut h21 = 0.0;
            let mut g1 = 0.0;
            let mut g2 = 0.0;
            for (f, ti) in decision_values.iter().zip(&t) {
                let f_apb = f * a + b;
                let (p, q) = if f_apb >= 0.0 {
                    let e = (-f_apb).exp();
                    (e / (1.0 + e), 1.0 / (1.0 + e))
                } else {
                    let e = f_apb.exp();
                    (1.0 / (1.0 + e), e / (1.0 + e))
                };
                let d2 = p * q;
                h11 += f * f * d2;
                h22 += d2;
                h21 += f * d2;
                let d1 = ti - p;
                g1 += f * d1;
                g2 += d1;
            }

            if g1.abs() < EPS && g2.abs() < EPS {
                break;
            }

            let det = h11 * h22 - h21 * h21;
            let d_a = -(h22 * g1 - h21 * g2) / det;
            let d_b = -(-h21 * g1 + h11 * g2) / det;
            let gd = g1 * d_a + g2 * d_b;

            let mut step = 1.0;
            while step >= MIN_STEP {
                let new_a = a + step * d_a;
                let new_b = b + step * d_b;
                let new_f = objective(decision_values, &t, new_a, new_b);
                if new_f < fval + 0.0001 * step * gd {
                    a = new_a;
                    b = new_b;
                    fval = new_f;
                    break;
                }
                step /= 2.0;
            }

            if step < MIN_STEP {
                log::debug!("Platt line search failed after {iter} iterations");
                break;
            }
            iter += 1;
        }

        if iter >= MAX_ITER {
            log::debug!("Platt scaling reached the iteration limit");
        }

        Ok(PlattSigmoid { a, b })
    }

    /// Probability of the positive class for a decision value.
    pub fn probability(&self, decision_value: f64) -> f64 {
        let f_apb = decision_value * self.a + self.b;
        if f_apb >= 0.0 {
            let e = (-f_apb).exp();
            e / (1.0 + e)
        } else {
            1.0 / (1.0 + f_apb.exp())
        }
    }
}

/// Negative log-likelihood of targets `t` under the sigmoid `(a, b)`.
fn objective(decision_values: &[f64], t: &[f64], a: f64, b: f64) -> f64 {
    decision_values
        .iter()
        .zip(t)
        .map(|(f, ti)| {
            let f_apb = f * a + b;
            if f_apb >= 0.0 {
                ti * f_apb + (1.0 + (-f_apb).exp()).ln()
            } else {
                (ti - 1.0) * f_apb + (1.0 + f_apb.exp()).ln()
            }
        })
        .sum()
}
