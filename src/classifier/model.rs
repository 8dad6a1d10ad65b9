//! L2-regularized logistic regression
//!
//! Minimizes `0.5 * ||w||^2 + C * sum(logloss)` with an unpenalized bias,
//! using damped Newton steps (IRLS) with a backtracking line search. The
//! Hessian is solved by Cholesky; when that fails a gradient step scaled by
//! a Lipschitz bound is taken instead. Weights start at zero, so fitting is
//! deterministic for fixed data.

use crate::error::{ConvergenceWarning, Error, Result};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Probabilities are clamped into [PROB_EPS, 1 - PROB_EPS]
const PROB_EPS: f64 = 1e-15;

/// Optimizer settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticConfig {
    /// Inverse regularization strength
    pub c: f64,
    /// Newton iteration cap
    pub max_iter: usize,
    /// Convergence tolerance on max |gradient|
    pub tol: f64,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 1000,
            tol: 1e-4,
        }
    }
}

/// Outcome of a fit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    pub iterations: usize,
    pub converged: bool,
    /// Regularized objective at the final weights
    pub final_loss: f64,
    pub gradient_norm: f64,
    pub warning: Option<ConvergenceWarning>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    config: LogisticConfig,
    weights: Option<Vec<f64>>,
    bias: f64,
}

impl LogisticRegression {
    pub fn new(config: LogisticConfig) -> Self {
        Self {
            config,
            weights: None,
            bias: 0.0,
        }
    }

    pub fn config(&self) -> &LogisticConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.weights.is_some()
    }

    pub fn weights(&self) -> Option<&[f64]> {
        self.weights.as_deref()
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    /// Fit on a feature matrix and 0/1 labels.
    ///
    /// Hitting `max_iter` is not an error: the report carries a
    /// [`ConvergenceWarning`] and the best weights found so far are kept.
    pub fn fit(&mut self, x: &DMatrix<f64>, y: &[u8]) -> Result<FitReport> {
        let (n, d) = x.shape();
        if n != y.len() {
            return Err(Error::config(format!(
                "feature matrix has {} rows but {} labels were given",
                n,
                y.len()
            )));
        }
        if n == 0 {
            return Err(Error::config("cannot fit on zero rows"));
        }
        if y.iter().any(|&label| label > 1) {
            return Err(Error::config("labels must be 0 or 1"));
        }
        let positives = y.iter().filter(|&&label| label == 1).count();
        if positives == 0 || positives == n {
            return Err(Error::config(
                "training labels contain a single class; need both 0 and 1",
            ));
        }

        let c = self.config.c;
        let xa = DMatrix::from_fn(n, d + 1, |i, j| if j < d { x[(i, j)] } else { 1.0 });
        let targets = DVector::from_iterator(n, y.iter().map(|&v| f64::from(v)));
        let mut penalty = DVector::from_element(d + 1, 1.0);
        penalty[d] = 0.0;
        let lipschitz = 0.25 * c * xa.norm_squared() + 1.0;

        let objective = |beta: &DVector<f64>| -> f64 {
            let z = &xa * beta;
            let data: f64 = z
                .iter()
                .zip(targets.iter())
                .map(|(&zi, &yi)| if yi > 0.5 { softplus(-zi) } else { softplus(zi) })
                .sum();
            c * data + 0.5 * penalty.component_mul(beta).dot(beta)
        };

        let mut beta = DVector::zeros(d + 1);
        let mut loss = objective(&beta);
        let mut iterations = 0;
        let mut converged = false;
        let mut gradient_norm;

        loop {
            let p = (&xa * &beta).map(sigmoid);
            let gradient = xa.tr_mul(&(&p - &targets)) * c + penalty.component_mul(&beta);
            gradient_norm = gradient.amax();

            if gradient_norm <= self.config.tol {
                converged = true;
                break;
            }
            if iterations >= self.config.max_iter {
                break;
            }

            let mut weighted = xa.clone();
            for (i, pi) in p.iter().enumerate() {
                weighted.row_mut(i).scale_mut(c * pi * (1.0 - pi));
            }
            let mut hessian = xa.tr_mul(&weighted);
            for j in 0..=d {
                hessian[(j, j)] += penalty[j] + 1e-10;
            }

            let direction = match hessian.cholesky() {
                Some(chol) => chol.solve(&gradient),
                None => {
                    debug!("Hessian not positive definite at iteration {}", iterations);
                    &gradient / lipschitz
                }
            };

            let slope = gradient.dot(&direction);
            let mut step = 1.0;
            let mut improved = false;
            loop {
                let candidate = &beta - &direction * step;
                let candidate_loss = objective(&candidate);
                if candidate_loss <= loss - 1e-4 * step * slope || step < 1e-10 {
                    if candidate_loss < loss {
                        beta = candidate;
                        loss = candidate_loss;
                        improved = true;
                    }
                    break;
                }
                step *= 0.5;
            }
            iterations += 1;

            // Line search stalled: we are at the optimum up to rounding.
            if !improved {
                gradient_norm = (xa.tr_mul(&(&(&xa * &beta).map(sigmoid) - &targets)) * c
                    + penalty.component_mul(&beta))
                .amax();
                converged = gradient_norm <= self.config.tol;
                break;
            }
        }

        let warning = if converged {
            debug!(
                "Logistic regression converged in {} iterations (loss {:.6})",
                iterations, loss
            );
            None
        } else {
            let warning = ConvergenceWarning {
                iterations,
                gradient_norm,
            };
            warn!("{}", warning);
            Some(warning)
        };

        self.weights = Some(beta.rows(0, d).iter().copied().collect());
        self.bias = beta[d];

        Ok(FitReport {
            iterations,
            converged,
            final_loss: loss,
            gradient_norm,
            warning,
        })
    }

    /// Raw scores `w.x + b`
    pub fn decision_function(&self, x: &DMatrix<f64>) -> Result<Vec<f64>> {
        let weights = self
            .weights
            .as_ref()
            .ok_or_else(|| Error::Pipeline("classifier used before fit".into()))?;
        if x.ncols() != weights.len() {
            return Err(Error::schema(format!(
                "expected {} features, got {}",
                weights.len(),
                x.ncols()
            )));
        }

        Ok(x
            .row_iter()
            .map(|row| {
                row.iter()
                    .zip(weights)
                    .fold(self.bias, |acc, (xi, wi)| acc + xi * wi)
            })
            .collect())
    }

    /// Probability of the positive class per row, strictly inside (0, 1)
    pub fn predict_proba(&self, x: &DMatrix<f64>) -> Result<Vec<f64>> {
        Ok(self
            .decision_function(x)?
            .into_iter()
            .map(|z| sigmoid(z).clamp(PROB_EPS, 1.0 - PROB_EPS))
            .collect())
    }
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new(LogisticConfig::default())
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// ln(1 + e^x) without overflow
fn softplus(x: f64) -> f64 {
    x.max(0.0) + (-x.abs()).exp().ln_1p()
}
