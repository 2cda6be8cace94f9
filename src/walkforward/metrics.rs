//! Out-of-sample classification metrics.

/// Fraction of outcomes matching the 0.5-thresholded prediction.
pub fn accuracy(probs: &[f64], outcomes: &[bool]) -> f64 {
    debug_assert_eq!(probs.len(), outcomes.len());
    if probs.is_empty() {
        return 0.0;
    }
    let hits = probs
        .iter()
        .zip(outcomes.iter())
        .filter(|(p, y)| (**p > 0.5) == **y)
        .count();
    hits as f64 / probs.len() as f64
}

/// Area under the ROC curve via the rank-sum (Mann-Whitney) formulation,
/// with the standard midrank correction for tied scores. None when either
/// class is absent.
pub fn roc_auc(probs: &[f64], outcomes: &[bool]) -> Option<f64> {
    debug_assert_eq!(probs.len(), outcomes.len());
    let positives = outcomes.iter().filter(|y| **y).count();
    let negatives = outcomes.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..probs.len()).collect();
    order.sort_by(|&a, &b| probs[a].total_cmp(&probs[b]));

    // Midranks over tied groups.
    let mut ranks = vec![0.0; probs.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && probs[order[j + 1]] == probs[order[i]] {
            j += 1;
        }
        let midrank = (i + j) as f64 / 2.0 + 1.0;
        for k in i..=j {
            ranks[order[k]] = midrank;
        }
        i = j + 1;
    }

    let positive_rank_sum: f64 = outcomes
        .iter()
        .zip(ranks.iter())
        .filter(|(y, _)| **y)
        .map(|(_, r)| r)
        .sum();
    let n_pos = positives as f64;
    let n_neg = negatives as f64;
    Some((positive_rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg))
}

/// Mean squared error between probabilities and binary outcomes.
pub fn brier_score(probs: &[f64], outcomes: &[bool]) -> f64 {
    debug_assert_eq!(probs.len(), outcomes.len());
    if probs.is_empty() {
        return 0.0;
    }
    let sum: f64 = probs
        .iter()
        .zip(outcomes.iter())
        .map(|(p, y)| {
            let t = if *y { 1.0 } else { 0.0 };
            (p - t).powi(2)
        })
        .sum();
    sum / probs.len() as f64
}

/// Negative mean log-likelihood with probabilities clamped away from 0/1.
pub fn log_loss(probs: &[f64], outcomes: &[bool]) -> f64 {
    debug_assert_eq!(probs.len(), outcomes.len());
    if probs.is_empty() {
        return 0.0;
    }
    const EPS: f64 = 1e-15;
    let sum: f64 = probs
        .iter()
        .zip(outcomes.iter())
        .map(|(p, y)| {
            let p = p.clamp(EPS, 1.0 - EPS);
            if *y {
                -p.ln()
            } else {
                -(1.0 - p).ln()
            }
        })
        .sum();
    sum / probs.len() as f64
}
