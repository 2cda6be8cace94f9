use tracing::debug;

use crate::error::{CourtedgeError, Result};
use crate::model::ProbabilityEstimator;

/// L2-regularized logistic regression trained by full-batch gradient descent.
///
/// Deterministic by construction: zero-initialized weights, fixed epoch count
/// and learning rate, z-score normalization derived from the training set.
/// Identical inputs always produce identical fits.
#[derive(Debug, Clone)]
pub struct LogisticEstimator {
    pub learning_rate: f64,
    pub epochs: usize,
    pub l2: f64,
    weights: Vec<f64>,
    bias: f64,
    feature_mean: Vec<f64>,
    feature_std: Vec<f64>,
}

impl Default for LogisticEstimator {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            epochs: 500,
            l2: 1e-3,
            weights: Vec::new(),
            bias: 0.0,
            feature_mean: Vec::new(),
            feature_std: Vec::new(),
        }
    }
}

impl LogisticEstimator {
    pub fn new(learning_rate: f64, epochs: usize, l2: f64) -> Self {
        Self {
            learning_rate,
            epochs,
            l2,
            ..Self::default()
        }
    }

    fn normalize(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .enumerate()
            .map(|(j, v)| (v - self.feature_mean[j]) / self.feature_std[j])
            .collect()
    }

    fn raw_score(&self, z: &[f64]) -> f64 {
        self.bias
            + self
                .weights
                .iter()
                .zip(z.iter())
                .map(|(w, x)| w * x)
                .sum::<f64>()
    }
}

impl ProbabilityEstimator for LogisticEstimator {
    fn fit(&mut self, x: &[Vec<f64>], y: &[bool]) -> Result<()> {
        if x.is_empty() || x.len() != y.len() {
            return Err(CourtedgeError::Validation(format!(
                "fit requires matching non-empty x/y, got {} rows and {} labels",
                x.len(),
                y.len()
            )));
        }
        let dim = x[0].len();
        if dim == 0 || x.iter().any(|row| row.len() != dim) {
            return Err(CourtedgeError::Validation(
                "feature rows must be non-empty and uniform width".to_string(),
            ));
        }

        let n = x.len() as f64;
        self.feature_mean = (0..dim)
            .map(|j| x.iter().map(|row| row[j]).sum::<f64>() / n)
            .collect();
        self.feature_std = (0..dim)
            .map(|j| {
                let mean = self.feature_mean[j];
                let var = x.iter().map(|row| (row[j] - mean).powi(2)).sum::<f64>() / n;
                var.sqrt().max(1e-9)
            })
            .collect();

        let normalized: Vec<Vec<f64>> = x.iter().map(|row| self.normalize(row)).collect();
        let targets: Vec<f64> = y.iter().map(|&w| if w { 1.0 } else { 0.0 }).collect();

        self.weights = vec![0.0; dim];
        self.bias = 0.0;

        for _ in 0..self.epochs {
            let mut grad_w = vec![0.0; dim];
            let mut grad_b = 0.0;
            for (row, target) in normalized.iter().zip(targets.iter()) {
                let err = sigmoid(self.raw_score(row)) - target;
                for (g, v) in grad_w.iter_mut().zip(row.iter()) {
                    *g += err * v;
                }
                grad_b += err;
            }
            for (w, g) in self.weights.iter_mut().zip(grad_w.iter()) {
                *w -= self.learning_rate * (g / n + self.l2 * *w);
            }
            self.bias -= self.learning_rate * grad_b / n;
        }

        debug!(rows = x.len(), dim, "logistic estimator fitted");
        Ok(())
    }

    fn predict_proba(&self, row: &[f64]) -> Result<f64> {
        if self.weights.is_empty() {
            return Err(CourtedgeError::Validation(
                "predict_proba called before fit".to_string(),
            ));
        }
        if row.len() != self.weights.len() {
            return Err(CourtedgeError::Validation(format!(
                "feature dim mismatch: got {}, expected {}",
                row.len(),
                self.weights.len()
            )));
        }
        let z = self.normalize(row);
        Ok(sigmoid(self.raw_score(&z)))
    }
}

fn sigmoid(x: f64) -> f64 {
    // Numerically-stable sigmoid.
    if x >= 0.0 {
        let z = (-x).exp();
        1.0 / (1.0 + z)
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}
