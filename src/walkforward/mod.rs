//! Expanding-window walk-forward training and evaluation.
//!
//! Each period trains on everything strictly before its start date and
//! predicts only the rows inside the period. Periods with too little
//! training history are skipped and logged, never trained. The union of the
//! per-period test predictions is the sole artifact consumed downstream.

pub mod metrics;

use chrono::{Days, NaiveDate};
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{GameId, Prediction};
use crate::error::{CourtedgeError, Result};
use crate::model::ProbabilityEstimator;

/// Walk-forward schedule parameters.
#[derive(Debug, Clone, Copy)]
pub struct WalkForwardConfig {
    /// First test period starts here; everything earlier is initial training
    pub initial_cutoff: NaiveDate,
    /// Test window length in days
    pub test_window_days: u32,
    /// Minimum training rows required to fit a period
    pub min_training_rows: usize,
}

/// One date-stamped feature row ready for training or prediction.
#[derive(Debug, Clone)]
pub struct TrainingRow {
    pub game_id: GameId,
    pub date: NaiveDate,
    pub features: Vec<f64>,
    /// Outcome when the game has resolved; unresolved rows are still
    /// predicted but excluded from fitting and metrics
    pub home_won: Option<bool>,
}

/// Out-of-sample quality for one evaluated period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeriodMetrics {
    pub accuracy: f64,
    pub auc: Option<f64>,
    pub brier: f64,
}

/// Why a period produced no predictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    InsufficientTrainingData { rows: usize, floor: usize },
    EmptyTestWindow,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PeriodOutcome {
    Evaluated(PeriodMetrics),
    Skipped(SkipReason),
}

/// Record of one walk-forward period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodReport {
    pub index: usize,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub train_rows: usize,
    pub test_rows: usize,
    pub outcome: PeriodOutcome,
}

/// Union of per-period test predictions plus the period log.
#[derive(Debug)]
pub struct WalkForwardOutput {
    pub predictions: Vec<Prediction>,
    pub periods: Vec<PeriodReport>,
}

/// Run the expanding-window evaluation.
///
/// `make_estimator` yields a fresh, unfitted model per period so no weights
/// carry over between periods. Rows must be date-sorted; unsorted or empty
/// input aborts the run (structural invalidity, the only fatal case).
pub fn run<E, F>(
    rows: &[TrainingRow],
    cfg: &WalkForwardConfig,
    mut make_estimator: F,
) -> Result<WalkForwardOutput>
where
    E: ProbabilityEstimator,
    F: FnMut() -> E,
{
    if rows.is_empty() {
        return Err(CourtedgeError::EmptyGameTable);
    }
    for (i, pair) in rows.windows(2).enumerate() {
        if pair[1].date < pair[0].date {
            return Err(CourtedgeError::UnsortedGames {
                index: i + 1,
                date: pair[1].date,
                prev: pair[0].date,
            });
        }
    }

    let last_date = rows[rows.len() - 1].date;
    let mut predictions = Vec::new();
    let mut periods = Vec::new();
    let mut period_start = cfg.initial_cutoff;
    let mut index = 0usize;

    while period_start <= last_date {
        let period_end = period_start
            .checked_add_days(Days::new(cfg.test_window_days as u64))
            .ok_or_else(|| CourtedgeError::Internal("period end overflows calendar".into()))?;

        // Expanding window: the train set is the full resolved prefix.
        let train: Vec<&TrainingRow> = rows
            .iter()
            .filter(|r| r.date < period_start && r.home_won.is_some())
            .collect();
        let test: Vec<&TrainingRow> = rows
            .iter()
            .filter(|r| r.date >= period_start && r.date < period_end)
            .collect();

        if test.is_empty() {
            periods.push(PeriodReport {
                index,
                start: period_start,
                end: period_end,
                train_rows: train.len(),
                test_rows: 0,
                outcome: PeriodOutcome::Skipped(SkipReason::EmptyTestWindow),
            });
            period_start = period_end;
            index += 1;
            continue;
        }

        if train.len() < cfg.min_training_rows {
            warn!(
                period = index,
                start = %period_start,
                train_rows = train.len(),
                floor = cfg.min_training_rows,
                "skipping period: insufficient training data"
            );
            periods.push(PeriodReport {
                index,
                start: period_start,
                end: period_end,
                train_rows: train.len(),
                test_rows: test.len(),
                outcome: PeriodOutcome::Skipped(SkipReason::InsufficientTrainingData {
                    rows: train.len(),
                    floor: cfg.min_training_rows,
                }),
            });
            period_start = period_end;
            index += 1;
            continue;
        }

        let mut x: Vec<Vec<f64>> = Vec::with_capacity(train.len());
        let mut y: Vec<bool> = Vec::with_capacity(train.len());
        for r in &train {
            if let Some(won) = r.home_won {
                x.push(r.features.clone());
                y.push(won);
            }
        }

        let mut estimator = make_estimator();
        estimator.fit(&x, &y)?;

        let mut period_probs = Vec::with_capacity(test.len());
        let mut scored_probs = Vec::new();
        let mut scored_outcomes = Vec::new();
        for row in &test {
            let p = estimator.predict_proba(&row.features)?;
            period_probs.push((row, p));
            if let Some(won) = row.home_won {
                scored_probs.push(p);
                scored_outcomes.push(won);
            }
        }

        let period_metrics = PeriodMetrics {
            accuracy: metrics::accuracy(&scored_probs, &scored_outcomes),
            auc: metrics::roc_auc(&scored_probs, &scored_outcomes),
            brier: metrics::brier_score(&scored_probs, &scored_outcomes),
        };
        info!(
            period = index,
            start = %period_start,
            end = %period_end,
            train_rows = train.len(),
            test_rows = test.len(),
            accuracy = period_metrics.accuracy,
            brier = period_metrics.brier,
            "period evaluated"
        );

        for (row, p) in period_probs {
            predictions.push(Prediction {
                game_id: row.game_id.clone(),
                date: row.date,
                period: index,
                model_home_prob: p,
                home_won: row.home_won,
            });
        }

        periods.push(PeriodReport {
            index,
            start: period_start,
            end: period_end,
            train_rows: train.len(),
            test_rows: test.len(),
            outcome: PeriodOutcome::Evaluated(period_metrics),
        });

        period_start = period_end;
        index += 1;
    }

    info!(
        periods = periods.len(),
        predictions = predictions.len(),
        "walk-forward complete"
    );
    Ok(WalkForwardOutput {
        predictions,
        periods,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Estimator that records the latest training date it saw, to prove the
    /// trainer never feeds it test-period rows. Feature layout: [signal,
    /// date_ordinal].
    struct SpyEstimator {
        max_train_ordinal: f64,
    }

    impl ProbabilityEstimator for SpyEstimator {
        fn fit(&mut self, x: &[Vec<f64>], _y: &[bool]) -> Result<()> {
            self.max_train_ordinal = x
                .iter()
                .map(|row| row[1])
                .fold(f64::NEG_INFINITY, f64::max);
            Ok(())
        }

        fn predict_proba(&self, row: &[f64]) -> Result<f64> {
            // A test row dated at or before the newest training row would be
            // leakage; surface it as an error so the test fails loudly.
            if row[1] <= self.max_train_ordinal {
                return Err(CourtedgeError::Internal(
                    "test row not strictly after training rows".into(),
                ));
            }
            Ok(if row[0] > 0.0 { 0.8 } else { 0.2 })
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .checked_add_days(Days::new(d as u64))
            .unwrap()
    }

    fn row(d: u32, signal: f64, won: Option<bool>) -> TrainingRow {
        TrainingRow {
            game_id: format!("g{d}"),
            date: date(d),
            features: vec![signal, d as f64],
            home_won: won,
        }
    }

    fn season(days: u32) -> Vec<TrainingRow> {
        (0..days)
            .map(|d| {
                let signal = if d % 2 == 0 { 1.0 } else { -1.0 };
                row(d, signal, Some(signal > 0.0))
            })
            .collect()
    }

    #[test]
    fn trains_only_on_strict_past() {
        let rows = season(60);
        let cfg = WalkForwardConfig {
            initial_cutoff: date(20),
            test_window_days: 10,
            min_training_rows: 5,
        };
        let out = run(&rows, &cfg, || SpyEstimator {
            max_train_ordinal: f64::NEG_INFINITY,
        })
        .unwrap();

        // Every test row was strictly after its period's training rows, or
        // SpyEstimator would have errored the run.
        assert_eq!(out.predictions.len(), 40);
        assert_eq!(out.periods.len(), 4);
        for p in &out.periods {
            assert!(matches!(p.outcome, PeriodOutcome::Evaluated(_)));
        }
    }

    #[test]
    fn predictions_union_covers_each_test_row_once() {
        let rows = season(45);
        let cfg = WalkForwardConfig {
            initial_cutoff: date(15),
            test_window_days: 7,
            min_training_rows: 5,
        };
        let out = run(&rows, &cfg, || SpyEstimator {
            max_train_ordinal: f64::NEG_INFINITY,
        })
        .unwrap();

        let mut ids: Vec<&str> = out.predictions.iter().map(|p| p.game_id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), out.predictions.len());
        assert_eq!(out.predictions.len(), 30);

        // Period boundaries: each prediction falls inside its period window.
        for pred in &out.predictions {
            let period = &out.periods[pred.period];
            assert!(pred.date >= period.start && pred.date < period.end);
        }
    }

    #[test]
    fn small_training_set_is_skipped_not_trained() {
        let rows = season(30);
        let cfg = WalkForwardConfig {
            initial_cutoff: date(5),
            test_window_days: 10,
            min_training_rows: 8,
        };
        let out = run(&rows, &cfg, || SpyEstimator {
            max_train_ordinal: f64::NEG_INFINITY,
        })
        .unwrap();

        assert_eq!(
            out.periods[0].outcome,
            PeriodOutcome::Skipped(SkipReason::InsufficientTrainingData { rows: 5, floor: 8 })
        );
        // No predictions from the skipped period.
        assert!(out.predictions.iter().all(|p| p.period != 0));
        // Later periods have enough history and run normally.
        assert!(matches!(
            out.periods[1].outcome,
            PeriodOutcome::Evaluated(_)
        ));
    }

    #[test]
    fn unresolved_rows_predicted_but_not_scored() {
        let mut rows = season(40);
        // Final stretch of games has no scores yet.
        for r in rows.iter_mut().filter(|r| r.date >= date(35)) {
            r.home_won = None;
        }
        let cfg = WalkForwardConfig {
            initial_cutoff: date(30),
            test_window_days: 10,
            min_training_rows: 5,
        };
        let out = run(&rows, &cfg, || SpyEstimator {
            max_train_ordinal: f64::NEG_INFINITY,
        })
        .unwrap();

        assert_eq!(out.predictions.len(), 10);
        let unresolved = out
            .predictions
            .iter()
            .filter(|p| p.home_won.is_none())
            .count();
        assert_eq!(unresolved, 5);
    }

    #[test]
    fn empty_and_unsorted_inputs_are_fatal() {
        let cfg = WalkForwardConfig {
            initial_cutoff: date(0),
            test_window_days: 10,
            min_training_rows: 1,
        };
        let err = run(&[], &cfg, || SpyEstimator {
            max_train_ordinal: f64::NEG_INFINITY,
        })
        .unwrap_err();
        assert!(matches!(err, CourtedgeError::EmptyGameTable));

        let rows = vec![row(5, 1.0, Some(true)), row(2, 1.0, Some(true))];
        let err = run(&rows, &cfg, || SpyEstimator {
            max_train_ordinal: f64::NEG_INFINITY,
        })
        .unwrap_err();
        assert!(matches!(err, CourtedgeError::UnsortedGames { .. }));
    }
}
