//! Platt scaling: a one-dimensional logistic map from raw model score to
//! calibrated probability, fit by Newton-Raphson.

use serde::Serialize;

use crate::error::{CourtedgeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlattScaler {
    pub slope: f64,
    pub intercept: f64,
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl PlattScaler {
    /// Fit slope and intercept on (score, outcome) pairs. Newton converges in
    /// a handful of iterations on this two-parameter problem; the iteration
    /// cap is a stall guard, not a tuning knob.
    pub fn fit(scores: &[f64], outcomes: &[bool]) -> Result<Self> {
        if scores.len() != outcomes.len() {
            return Err(CourtedgeError::Validation(format!(
                "platt fit shape mismatch: {} scores vs {} outcomes",
                scores.len(),
                outcomes.len()
            )));
        }
        if scores.is_empty() {
            return Err(CourtedgeError::Validation(
                "platt fit on empty sample".to_string(),
            ));
        }

        let mut slope = 1.0;
        let mut intercept = 0.0;
        const RIDGE: f64 = 1e-8;

        for _ in 0..50 {
            // Gradient and Hessian of the negative log-likelihood.
            let mut g0 = 0.0;
            let mut g1 = 0.0;
            let mut h00 = RIDGE;
            let mut h01 = 0.0;
            let mut h11 = RIDGE;
            for (&x, &y) in scores.iter().zip(outcomes.iter()) {
                let p = sigmoid(slope * x + intercept);
                let t = if y { 1.0 } else { 0.0 };
                let r = p - t;
                let w = p * (1.0 - p);
                g0 += r * x;
                g1 += r;
                h00 += w * x * x;
                h01 += w * x;
                h11 += w;
            }

            let det = h00 * h11 - h01 * h01;
            if det.abs() < 1e-12 {
                break;
            }
            let step0 = (h11 * g0 - h01 * g1) / det;
            let step1 = (h00 * g1 - h01 * g0) / det;
            slope -= step0;
            intercept -= step1;
            if step0.abs() < 1e-10 && step1.abs() < 1e-10 {
                break;
            }
        }

        if !slope.is_finite() || !intercept.is_finite() {
            return Err(CourtedgeError::Internal(
                "platt fit diverged".to_string(),
            ));
        }
        Ok(Self { slope, intercept })
    }

    pub fn predict(&self, score: f64) -> f64 {
        sigmoid(self.slope * score + self.intercept)
    }
}
