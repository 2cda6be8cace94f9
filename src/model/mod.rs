//! Pluggable probability estimation.
//!
//! The walk-forward trainer treats the model as a black box behind
//! [`ProbabilityEstimator`]: fit on a feature matrix, emit win probabilities.
//! The crate ships one deterministic reference implementation; anything that
//! honors the trait (gradient boosting, an ONNX wrapper, a remote service)
//! plugs in without touching the evaluation machinery.

mod logistic;

pub use logistic::LogisticEstimator;

use crate::error::Result;

/// Binary-outcome probability model with scikit-style fit/predict halves.
pub trait ProbabilityEstimator {
    /// Fit on rows of features and their binary outcomes. Called once per
    /// walk-forward period on that period's training prefix only.
    fn fit(&mut self, x: &[Vec<f64>], y: &[bool]) -> Result<()>;

    /// Probability of the positive class for one feature row.
    fn predict_proba(&self, row: &[f64]) -> Result<f64>;
}
