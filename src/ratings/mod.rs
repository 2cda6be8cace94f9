//! Time-aware external-rating attachment.
//!
//! Each game side attaches the latest snapshot with `rating_date <= game
//! date`, or nothing. A run whose attachments all share one rating date gets
//! flagged: that shape usually means the upstream source is a season-end
//! export dressed up with a single early date, a classic lookahead smell.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

use crate::domain::{Game, Side};
use crate::resolve::TeamResolver;

/// Efficiency metrics carried by one rating snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingMetrics {
    /// Adjusted efficiency margin (net points per 100 possessions)
    pub adj_em: f64,
    /// Adjusted offensive efficiency
    pub adj_oe: f64,
    /// Adjusted defensive efficiency
    pub adj_de: f64,
    /// Adjusted tempo (possessions per 40 minutes)
    pub adj_tempo: f64,
}

/// One dated rating row for one team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingSnapshot {
    pub team: String,
    pub rating_date: NaiveDate,
    pub metrics: RatingMetrics,
}

/// All snapshots for a run, indexed for as-of lookup. Works identically for
/// one snapshot per team or a dense dated history.
#[derive(Debug, Default)]
pub struct RatingBook {
    by_team: HashMap<String, Vec<RatingSnapshot>>,
}

impl RatingBook {
    pub fn from_snapshots(snapshots: Vec<RatingSnapshot>, resolver: &dyn TeamResolver) -> Self {
        let mut by_team: HashMap<String, Vec<RatingSnapshot>> = HashMap::new();
        for mut snap in snapshots {
            snap.team = resolver.resolve(&snap.team);
            by_team.entry(snap.team.clone()).or_default().push(snap);
        }
        for snaps in by_team.values_mut() {
            snaps.sort_by_key(|s| s.rating_date);
        }
        Self { by_team }
    }

    pub fn teams(&self) -> usize {
        self.by_team.len()
    }

    /// Latest snapshot with `rating_date <= date` for the team, if any.
    /// Never falls back to a future snapshot.
    pub fn as_of(&self, team: &str, date: NaiveDate) -> Option<&RatingSnapshot> {
        let snaps = self.by_team.get(team)?;
        let idx = snaps.partition_point(|s| s.rating_date <= date);
        if idx == 0 {
            None
        } else {
            Some(&snaps[idx - 1])
        }
    }
}

/// The rating actually attached to one game side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AttachedRating {
    pub rating_date: NaiveDate,
    pub metrics: RatingMetrics,
}

/// Per-game attachment result; either side may be unmatched.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RatingAttachment {
    pub home: Option<AttachedRating>,
    pub away: Option<AttachedRating>,
}

impl RatingAttachment {
    pub fn side(&self, side: Side) -> Option<&AttachedRating> {
        match side {
            Side::Home => self.home.as_ref(),
            Side::Away => self.away.as_ref(),
        }
    }

    /// Matchup differentials, available only when both sides attached.
    pub fn efficiency_diff(&self) -> Option<f64> {
        Some(self.home?.metrics.adj_em - self.away?.metrics.adj_em)
    }

    pub fn tempo_diff(&self) -> Option<f64> {
        Some(self.home?.metrics.adj_tempo - self.away?.metrics.adj_tempo)
    }

    pub fn offensive_matchup_home(&self) -> Option<f64> {
        Some(self.home?.metrics.adj_oe - self.away?.metrics.adj_de)
    }

    pub fn defensive_matchup_home(&self) -> Option<f64> {
        Some(self.home?.metrics.adj_de - self.away?.metrics.adj_oe)
    }
}

/// Output of the attachment stage, parallel to the input game slice.
#[derive(Debug)]
pub struct AttachmentReport {
    pub attachments: Vec<RatingAttachment>,
    pub matched_sides: usize,
    pub total_sides: usize,
    /// Distinct rating dates actually used across the whole run
    pub distinct_dates_used: usize,
    /// Set when every attachment came from one rating date: a heuristic
    /// lookahead indicator in the upstream source, not an attachment failure.
    pub single_date_flag: bool,
}

/// Attach ratings to both sides of every game using the as-of rule.
pub fn attach_ratings(
    games: &[Game],
    book: &RatingBook,
    resolver: &dyn TeamResolver,
) -> AttachmentReport {
    let mut attachments = Vec::with_capacity(games.len());
    let mut matched_sides = 0usize;
    let mut dates_used: BTreeSet<NaiveDate> = BTreeSet::new();

    for game in games {
        let mut attachment = RatingAttachment::default();
        for side in [Side::Home, Side::Away] {
            let team = resolver.resolve(game.team(side));
            match book.as_of(&team, game.date) {
                Some(snap) => {
                    matched_sides += 1;
                    dates_used.insert(snap.rating_date);
                    let attached = AttachedRating {
                        rating_date: snap.rating_date,
                        metrics: snap.metrics,
                    };
                    match side {
                        Side::Home => attachment.home = Some(attached),
                        Side::Away => attachment.away = Some(attached),
                    }
                }
                None => {
                    debug!(
                        game_id = %game.id,
                        team = %team,
                        date = %game.date,
                        "no rating snapshot at or before game date"
                    );
                }
            }
        }
        attachments.push(attachment);
    }

    let total_sides = games.len() * 2;
    let distinct_dates_used = dates_used.len();
    let single_date_flag = distinct_dates_used == 1 && matched_sides > 0;
    if single_date_flag {
        if let Some(only_date) = dates_used.iter().next() {
            warn!(
                rating_date = %only_date,
                "all attached ratings share a single rating_date; upstream source \
                 may carry lookahead bias"
            );
        }
    }
    debug!(
        matched = matched_sides,
        total = total_sides,
        distinct_dates = distinct_dates_used,
        "rating attachment complete"
    );

    AttachmentReport {
        attachments,
        matched_sides,
        total_sides,
        distinct_dates_used,
        single_date_flag,
    }
}
