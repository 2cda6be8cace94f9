//! Longshot probability recalibration.
//!
//! Raw model probabilities are systematically optimistic on big underdogs,
//! so wagers at the longshot floor and beyond are diverted here instead of
//! the band table. Both a parametric (Platt) and a non-parametric (isotonic)
//! map are fit on a chronological training slice and judged on the held-out
//! tail; the winner is whichever makes more money out of sample, not
//! whichever scores better on a proper loss.

mod isotonic;
mod platt;

pub use isotonic::IsotonicRegressor;
pub use platt::PlattScaler;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::CalibrationSettings;
use crate::error::Result;
use crate::market::AmericanOdds;
use crate::walkforward::metrics::{brier_score, log_loss, roc_auc};

/// One diverted longshot observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationSample {
    pub game_id: String,
    pub date: NaiveDate,
    pub odds: AmericanOdds,
    /// Uncalibrated model probability for the longshot side
    pub raw_prob: f64,
    pub won: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationMethod {
    Platt,
    Isotonic,
}

/// A fitted calibrator of either kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Calibrator {
    Platt(PlattScaler),
    Isotonic(IsotonicRegressor),
}

impl Calibrator {
    pub fn predict(&self, raw_prob: f64) -> f64 {
        match self {
            Calibrator::Platt(s) => s.predict(raw_prob),
            Calibrator::Isotonic(r) => r.predict(raw_prob),
        }
    }

    pub fn method(&self) -> CalibrationMethod {
        match self {
            Calibrator::Platt(_) => CalibrationMethod::Platt,
            Calibrator::Isotonic(_) => CalibrationMethod::Isotonic,
        }
    }
}

/// Held-out performance of one candidate calibrator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalibrationEval {
    pub method: CalibrationMethod,
    pub auc: Option<f64>,
    pub brier: f64,
    pub log_loss: f64,
    /// Flat one-unit ROI over test samples where the calibrated edge is
    /// positive; None when no such bet exists
    pub roi: Option<f64>,
    pub bets_placed: usize,
}

/// Outcome of a calibration run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CalibrationOutcome {
    /// Fewer in-range samples than the configured floor
    InsufficientData { samples: usize, floor: usize },
    Fitted(CalibrationReport),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationReport {
    pub train_samples: usize,
    pub test_samples: usize,
    pub platt: CalibrationEval,
    pub isotonic: CalibrationEval,
    pub selected: CalibrationMethod,
    #[serde(skip)]
    pub calibrator: Calibrator,
}

/// Flat-stake ROI of betting every test sample whose calibrated probability
/// beats the implied probability. One unit per bet; an underdog win returns
/// its profit multiple, a loss returns -1.
fn flat_roi(calibrator: &Calibrator, test: &[CalibrationSample]) -> (Option<f64>, usize) {
    let mut staked = 0.0;
    let mut profit = 0.0;
    let mut bets = 0;
    for sample in test {
        let calibrated = calibrator.predict(sample.raw_prob);
        if calibrated > sample.odds.implied_prob() {
            bets += 1;
            staked += 1.0;
            if sample.won {
                profit += sample.odds.profit_multiple();
            } else {
                profit -= 1.0;
            }
        }
    }
    if bets == 0 {
        (None, 0)
    } else {
        (Some(profit / staked), bets)
    }
}

fn evaluate(calibrator: &Calibrator, test: &[CalibrationSample]) -> CalibrationEval {
    let probs: Vec<f64> = test.iter().map(|s| calibrator.predict(s.raw_prob)).collect();
    let outcomes: Vec<bool> = test.iter().map(|s| s.won).collect();
    let (roi, bets_placed) = flat_roi(calibrator, test);
    CalibrationEval {
        method: calibrator.method(),
        auc: roc_auc(&probs, &outcomes),
        brier: brier_score(&probs, &outcomes),
        log_loss: log_loss(&probs, &outcomes),
        roi,
        bets_placed,
    }
}

/// Fit and select a longshot calibrator.
///
/// Samples outside the configured odds range are dropped first; the rest are
/// ordered by date and split chronologically so the held-out slice is
/// strictly later than the training slice.
pub fn calibrate(
    samples: &[CalibrationSample],
    settings: &CalibrationSettings,
) -> Result<CalibrationOutcome> {
    let mut in_range: Vec<CalibrationSample> = samples
        .iter()
        .filter(|s| s.odds.0 >= settings.min_odds && s.odds.0 <= settings.max_odds)
        .cloned()
        .collect();

    if in_range.len() < settings.min_samples {
        info!(
            samples = in_range.len(),
            floor = settings.min_samples,
            "not enough longshot samples to calibrate"
        );
        return Ok(CalibrationOutcome::InsufficientData {
            samples: in_range.len(),
            floor: settings.min_samples,
        });
    }

    in_range.sort_by(|a, b| a.date.cmp(&b.date).then(a.game_id.cmp(&b.game_id)));
    let split = ((in_range.len() as f64) * (1.0 - settings.test_ratio)).round() as usize;
    let split = split.clamp(1, in_range.len() - 1);
    let (train, test) = in_range.split_at(split);

    let train_scores: Vec<f64> = train.iter().map(|s| s.raw_prob).collect();
    let train_outcomes: Vec<bool> = train.iter().map(|s| s.won).collect();

    let platt = Calibrator::Platt(PlattScaler::fit(&train_scores, &train_outcomes)?);
    let isotonic = Calibrator::Isotonic(IsotonicRegressor::fit(&train_scores, &train_outcomes)?);

    let platt_eval = evaluate(&platt, test);
    let isotonic_eval = evaluate(&isotonic, test);
    debug!(?platt_eval, ?isotonic_eval, "calibrator comparison");

    // ROI decides; a calibrator that never bets loses to one that does.
    let pick_platt = match (platt_eval.roi, isotonic_eval.roi) {
        (Some(a), Some(b)) => a >= b,
        (Some(_), None) => true,
        (None, Some(_)) => false,
        (None, None) => true,
    };
    let (selected, calibrator) = if pick_platt {
        (CalibrationMethod::Platt, platt)
    } else {
        (CalibrationMethod::Isotonic, isotonic)
    };
    info!(?selected, train = train.len(), test = test.len(), "calibrator selected");

    Ok(CalibrationOutcome::Fitted(CalibrationReport {
        train_samples: train.len(),
        test_samples: test.len(),
        platt: platt_eval,
        isotonic: isotonic_eval,
        selected,
        calibrator,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> CalibrationSettings {
        CalibrationSettings {
            min_odds: 400,
            max_odds: 2000,
            test_ratio: 0.2,
            min_samples: 50,
        }
    }

    fn sample(day: u32, odds: i32, raw_prob: f64, won: bool) -> CalibrationSample {
        CalibrationSample {
            game_id: format!("g{day}-{odds}-{raw_prob}"),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(day as u64),
            odds: AmericanOdds(odds),
            raw_prob,
            won,
        }
    }

    /// Overconfident longshots: raw probability 0.30 but the true win rate
    /// is roughly half that.
    fn overconfident_season(n: usize) -> Vec<CalibrationSample> {
        (0..n)
            .map(|i| {
                let raw = 0.20 + 0.15 * ((i % 7) as f64 / 6.0);
                // Deterministic outcomes near a 15% win rate.
                let won = i % 7 == 3;
                sample(i as u32, 450 + (i % 5) as i32 * 100, raw, won)
            })
            .collect()
    }

    #[test]
    fn below_floor_declines_to_fit() {
        let samples = overconfident_season(30);
        let outcome = calibrate(&samples, &settings()).unwrap();
        assert_eq!(
            outcome,
            CalibrationOutcome::InsufficientData {
                samples: 30,
                floor: 50
            }
        );
    }

    #[test]
    fn out_of_range_odds_do_not_count_toward_floor() {
        let mut samples = overconfident_season(40);
        // Pad with odds outside [min, max]; these must be ignored.
        for i in 0..40 {
            samples.push(sample(100 + i, 250, 0.3, false));
            samples.push(sample(200 + i, 3000, 0.1, false));
        }
        let outcome = calibrate(&samples, &settings()).unwrap();
        assert!(matches!(
            outcome,
            CalibrationOutcome::InsufficientData { samples: 40, .. }
        ));
    }

    #[test]
    fn fits_and_selects_on_enough_data() {
        let samples = overconfident_season(120);
        let outcome = calibrate(&samples, &settings()).unwrap();
        let report = match outcome {
            CalibrationOutcome::Fitted(r) => r,
            other => panic!("expected a fit, got {other:?}"),
        };
        assert_eq!(report.train_samples + report.test_samples, 120);
        assert!(report.test_samples >= 1);
        // Calibrated output pulls the optimistic raw score down toward the
        // observed ~14% win rate.
        let calibrated = report.calibrator.predict(0.30);
        assert!(calibrated < 0.30);
        assert!((0.0..=1.0).contains(&calibrated));
    }

    #[test]
    fn split_is_chronological() {
        // Train on early dates only: a sample dated after every training
        // row must land in test. Build a season where outcome flips at the
        // split; if the split leaked, both calibrators would see the late
        // regime during fit and test Brier would be near zero.
        let mut samples: Vec<CalibrationSample> = (0..80)
            .map(|i| sample(i, 500, 0.25, false))
            .collect();
        for s in samples.iter_mut().skip(64) {
            s.won = true;
        }
        let outcome = calibrate(&samples, &settings()).unwrap();
        let report = match outcome {
            CalibrationOutcome::Fitted(r) => r,
            other => panic!("expected a fit, got {other:?}"),
        };
        // Training slice saw only losses, so both calibrators predict a low
        // probability while every test outcome is a win.
        assert!(report.platt.brier > 0.5);
        assert!(report.isotonic.brier > 0.5);
    }
}
