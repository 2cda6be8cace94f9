//! Isotonic regression via pool-adjacent-violators, with linear
//! interpolation between block centers at prediction time.

use serde::Serialize;

use crate::error::{CourtedgeError, Result};

/// A fitted non-decreasing step/interpolation map from score to probability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IsotonicRegressor {
    /// Block centers (mean score per pooled block), ascending
    xs: Vec<f64>,
    /// Pooled outcome means, non-decreasing
    ys: Vec<f64>,
}

impl IsotonicRegressor {
    pub fn fit(scores: &[f64], outcomes: &[bool]) -> Result<Self> {
        if scores.len() != outcomes.len() {
            return Err(CourtedgeError::Validation(format!(
                "isotonic fit shape mismatch: {} scores vs {} outcomes",
                scores.len(),
                outcomes.len()
            )));
        }
        if scores.is_empty() {
            return Err(CourtedgeError::Validation(
                "isotonic fit on empty sample".to_string(),
            ));
        }

        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

        // Each block: (sum of scores, sum of targets, count).
        let mut blocks: Vec<(f64, f64, f64)> = Vec::with_capacity(scores.len());
        for &idx in &order {
            let target = if outcomes[idx] { 1.0 } else { 0.0 };
            blocks.push((scores[idx], target, 1.0));
            // Pool while the trailing block mean violates monotonicity.
            while blocks.len() >= 2 {
                let n = blocks.len();
                let last_mean = blocks[n - 1].1 / blocks[n - 1].2;
                let prev_mean = blocks[n - 2].1 / blocks[n - 2].2;
                if prev_mean <= last_mean {
                    break;
                }
                let (sx, sy, c) = blocks.pop().ok_or_else(|| {
                    CourtedgeError::Internal("isotonic pool underflow".to_string())
                })?;
                let prev = blocks.last_mut().ok_or_else(|| {
                    CourtedgeError::Internal("isotonic pool underflow".to_string())
                })?;
                prev.0 += sx;
                prev.1 += sy;
                prev.2 += c;
            }
        }

        let xs: Vec<f64> = blocks.iter().map(|(sx, _, c)| sx / c).collect();
        let ys: Vec<f64> = blocks.iter().map(|(_, sy, c)| sy / c).collect();
        Ok(Self { xs, ys })
    }

    /// Predict by interpolating between block centers; scores outside the
    /// fitted range clip to the boundary blocks.
    pub fn predict(&self, score: f64) -> f64 {
        match self.xs.len() {
            0 => 0.5,
            1 => self.ys[0],
            _ => {
                if score <= self.xs[0] {
                    return self.ys[0];
                }
                if score >= self.xs[self.xs.len() - 1] {
                    return self.ys[self.ys.len() - 1];
                }
                let hi = self.xs.partition_point(|&x| x < score);
                let lo = hi - 1;
                let span = self.xs[hi] - self.xs[lo];
                if span <= f64::EPSILON {
                    return self.ys[lo];
                }
                let t = (score - self.xs[lo]) / span;
                self.ys[lo] + t * (self.ys[hi] - self.ys[lo])
            }
        }
    }
}
