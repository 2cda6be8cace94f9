//! End-to-end edge pipeline.
//!
//! Stages run in a fixed order, each producing an immutable artifact the
//! next stage consumes: rolling features, rating attachments, the projected
//! training table, walk-forward predictions, market edges, policy decisions,
//! sized tickets, longshot calibration, and finally settlement. Structural
//! invalidity of the input game table (empty, unsorted) is the only fatal
//! case; everything unit-scoped is logged and excluded instead.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::calibration::{self, CalibrationOutcome, CalibrationSample};
use crate::config::PipelineConfig;
use crate::domain::{Game, Side, WagerTicket};
use crate::error::{CourtedgeError, Result};
use crate::features::{BoxScoreEstimator, RollingFeature, RollingStats};
use crate::market::{bet_opportunities, compute_edges, BetOpportunity, EdgeParams, GameEdges};
use crate::model::LogisticEstimator;
use crate::pnl::{self, PnlSummary};
use crate::policy::{self, PolicyDecision};
use crate::ratings::{AttachmentReport, RatingAttachment, RatingBook};
use crate::resolve::TeamResolver;
use crate::sizing::{kelly_stake, KellyParams};
use crate::walkforward::{self, PeriodReport, TrainingRow, WalkForwardConfig, WalkForwardOutput};

/// Why a game was left out of the training table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    /// A side has no prior games, so its rolling windows are empty
    MissingRollingHistory,
    /// A side has no rating snapshot at or before the game date
    MissingRating,
}

/// Per-side wagering decision, kept for audit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WagerDecision {
    pub opportunity: BetOpportunity,
    pub decision: PolicyDecision,
}

/// Everything one pipeline run produces.
#[derive(Debug)]
pub struct PipelineReport {
    pub games_in: usize,
    pub rows_projected: usize,
    pub exclusions: Vec<(String, ExclusionReason)>,
    pub rating_report: AttachmentReport,
    pub periods: Vec<PeriodReport>,
    pub edges: Vec<GameEdges>,
    pub decisions: Vec<WagerDecision>,
    pub tickets: Vec<WagerTicket>,
    pub calibration: CalibrationOutcome,
    pub pnl: PnlSummary,
}

/// Flat, serializable digest of one run, for report files and log capture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub games_in: usize,
    pub rows_projected: usize,
    pub excluded: usize,
    pub rating_match_rate: f64,
    pub single_rating_date_flag: bool,
    pub periods_evaluated: usize,
    pub periods_skipped: usize,
    pub predictions: usize,
    pub tickets: usize,
    pub pnl: PnlSummary,
}

impl PipelineReport {
    pub fn summary(&self) -> RunSummary {
        let evaluated = self
            .periods
            .iter()
            .filter(|p| matches!(p.outcome, crate::walkforward::PeriodOutcome::Evaluated(_)))
            .count();
        RunSummary {
            games_in: self.games_in,
            rows_projected: self.rows_projected,
            excluded: self.exclusions.len(),
            rating_match_rate: if self.rating_report.total_sides > 0 {
                self.rating_report.matched_sides as f64 / self.rating_report.total_sides as f64
            } else {
                0.0
            },
            single_rating_date_flag: self.rating_report.single_date_flag,
            periods_evaluated: evaluated,
            periods_skipped: self.periods.len() - evaluated,
            predictions: self.edges.len(),
            tickets: self.tickets.len(),
            pnl: self.pnl.clone(),
        }
    }

    pub fn summary_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.summary())?)
    }
}

/// Feature vector layout: per rolling window, home-minus-away diffs of
/// offensive rating, defensive rating, margin, win rate, and pace; then the
/// four rating-matchup terms. Kept as a function so the projection and any
/// future inspector agree on the layout.
fn project_features(
    home: &RollingFeature,
    away: &RollingFeature,
    attachment: &RatingAttachment,
    window_count: usize,
) -> Option<Vec<f64>> {
    let mut features = Vec::with_capacity(window_count * 5 + 4);
    for idx in 0..window_count {
        let h = home.windows.get(idx)?.as_ref()?;
        let a = away.windows.get(idx)?.as_ref()?;
        features.push(h.off_rating - a.off_rating);
        features.push(h.def_rating - a.def_rating);
        features.push(h.margin - a.margin);
        features.push(h.win_pct - a.win_pct);
        features.push(h.pace - a.pace);
    }
    features.push(attachment.efficiency_diff()?);
    features.push(attachment.tempo_diff()?);
    features.push(attachment.offensive_matchup_home()?);
    features.push(attachment.defensive_matchup_home()?);
    Some(features)
}

fn validate_games(games: &[Game]) -> Result<()> {
    if games.is_empty() {
        return Err(CourtedgeError::EmptyGameTable);
    }
    for (i, pair) in games.windows(2).enumerate() {
        if pair[1].date < pair[0].date {
            return Err(CourtedgeError::UnsortedGames {
                index: i + 1,
                date: pair[1].date,
                prev: pair[0].date,
            });
        }
    }
    Ok(())
}

/// Run the whole pipeline over a date-sorted game table.
pub fn run(
    games: &[Game],
    book: &RatingBook,
    resolver: &dyn TeamResolver,
    config: &PipelineConfig,
) -> Result<PipelineReport> {
    config.validate()?;
    validate_games(games)?;
    info!(games = games.len(), "pipeline start");

    // Stage 1: leakage-free rolling features for every team.
    let rolling = RollingStats::new(
        config.window_sizes.clone(),
        Box::new(BoxScoreEstimator::default()),
    );
    let feature_table = rolling.compute_all(games);
    debug!(features = feature_table.len(), "rolling stage complete");

    // Stage 2: as-of rating attachment.
    debug!(rated_teams = book.teams(), "attaching ratings");
    let rating_report = crate::ratings::attach_ratings(games, book, resolver);

    // Stage 3: projection into the training table. A game missing any
    // required input is excluded with a reason, never zero-filled.
    let window_count = config.window_sizes.len();
    let mut rows = Vec::with_capacity(games.len());
    let mut exclusions = Vec::new();
    for (game, attachment) in games.iter().zip(&rating_report.attachments) {
        let home = feature_table.get(game.team(Side::Home), &game.id);
        let away = feature_table.get(game.team(Side::Away), &game.id);
        let (Some(home), Some(away)) = (home, away) else {
            exclusions.push((game.id.clone(), ExclusionReason::MissingRollingHistory));
            continue;
        };
        if attachment.home.is_none() || attachment.away.is_none() {
            exclusions.push((game.id.clone(), ExclusionReason::MissingRating));
            continue;
        }
        match project_features(home, away, attachment, window_count) {
            Some(features) => rows.push(TrainingRow {
                game_id: game.id.clone(),
                date: game.date,
                features,
                home_won: game.score.map(|s| s.home_won()),
            }),
            None => {
                exclusions.push((game.id.clone(), ExclusionReason::MissingRollingHistory));
            }
        }
    }
    info!(
        projected = rows.len(),
        excluded = exclusions.len(),
        "training table projected"
    );

    // Stage 4: walk-forward evaluation with a fresh model per period. An
    // input table whose games all projected out is a degenerate run, not a
    // structural failure; only the raw input being empty or unsorted aborts.
    let wf_config = WalkForwardConfig {
        initial_cutoff: config.train_cutoff_date,
        test_window_days: config.test_window_days,
        min_training_rows: config.min_training_rows,
    };
    let wf = if rows.is_empty() {
        warn!("no games projected into the training table; skipping walk-forward");
        WalkForwardOutput {
            predictions: Vec::new(),
            periods: Vec::new(),
        }
    } else {
        walkforward::run(&rows, &wf_config, LogisticEstimator::default)?
    };

    // Stage 5: market edges for every out-of-sample prediction.
    let by_id: HashMap<&str, &Game> = games.iter().map(|g| (g.id.as_str(), g)).collect();
    let edge_params = EdgeParams {
        spread_floor: config.spread_edge_floor,
        min_ml_edge: config.min_edge,
    };
    let mut edges = Vec::with_capacity(wf.predictions.len());
    for prediction in &wf.predictions {
        match by_id.get(prediction.game_id.as_str()) {
            Some(game) => edges.push(compute_edges(game, prediction, None, &edge_params)),
            None => {
                // Predictions are derived from the same table, so a miss
                // here is a projection bug worth surfacing loudly.
                warn!(game_id = %prediction.game_id, "prediction without a source game");
            }
        }
    }

    // Stage 6: policy + sizing. Longshots divert to the calibration sample
    // pool; accepted wagers become sized tickets.
    let kelly = KellyParams {
        multiplier: config.kelly_multiplier,
        max_fraction: config.max_bankroll_fraction,
    };
    let mut decisions = Vec::new();
    let mut tickets = Vec::new();
    let mut longshots = Vec::new();
    for game_edges in &edges {
        for opportunity in bet_opportunities(game_edges) {
            let decision = policy::evaluate(opportunity.odds, opportunity.edge);
            debug!(
                game_id = %opportunity.game_id,
                side = ?opportunity.side,
                band = policy::band_label(opportunity.odds),
                ?decision,
                "wager evaluated"
            );
            match decision {
                PolicyDecision::Accepted { .. } => {
                    let sized = kelly_stake(opportunity.edge, opportunity.odds, &kelly, config.bankroll);
                    if sized.stake > rust_decimal::Decimal::ZERO {
                        tickets.push(WagerTicket {
                            game_id: opportunity.game_id.clone(),
                            date: opportunity.date,
                            side: opportunity.side,
                            odds: opportunity.odds,
                            edge: opportunity.edge,
                            full_kelly: sized.full_fraction,
                            applied_fraction: sized.applied_fraction,
                            stake: sized.stake,
                            won: opportunity.won,
                        });
                    }
                }
                PolicyDecision::LongshotDiverted => {
                    if let Some(won) = opportunity.won {
                        longshots.push(CalibrationSample {
                            game_id: opportunity.game_id.clone(),
                            date: opportunity.date,
                            odds: opportunity.odds,
                            raw_prob: opportunity.model_prob,
                            won,
                        });
                    }
                }
                PolicyDecision::BandSkip | PolicyDecision::EdgeTooLow { .. } => {}
            }
            decisions.push(WagerDecision {
                opportunity,
                decision,
            });
        }
    }
    info!(
        decisions = decisions.len(),
        tickets = tickets.len(),
        longshot_samples = longshots.len(),
        "policy stage complete"
    );

    // Stage 7: longshot calibration on the diverted pool.
    let calibration = calibration::calibrate(&longshots, &config.calibration)?;

    // Stage 8: settlement.
    let pnl = pnl::settle(&tickets);
    info!(
        bets = pnl.bets,
        profit = %pnl.profit,
        roi_pct = pnl.roi_pct,
        "pipeline complete"
    );

    Ok(PipelineReport {
        games_in: games.len(),
        rows_projected: rows.len(),
        exclusions,
        rating_report,
        periods: wf.periods,
        edges,
        decisions,
        tickets,
        calibration,
        pnl,
    })
}
