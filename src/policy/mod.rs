//! Odds-band wagering policy.
//!
//! The table is deliberately non-monotonic: historical replay showed
//! alternating profitable zones and dead zones across the underdog range, so
//! adjacent bands can carry very different rules. Dead-zone bands are skipped
//! outright no matter how large the edge; the +200..+250 zone needs no edge
//! filter at all; everything at +400 and beyond belongs to the longshot
//! calibration pipeline, not this table.

use serde::Serialize;

use crate::market::AmericanOdds;

/// American odds at and above which wagers divert to the calibration
/// pipeline instead of this table.
pub const LONGSHOT_ODDS_FLOOR: i32 = 400;

/// What the band table says about a price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BandDecision {
    /// Wager allowed when edge >= min_edge
    Bet { min_edge: f64 },
    /// Dead zone: never wager, regardless of edge
    Skip,
    /// Divert to the longshot calibration pipeline
    Longshot,
}

/// Outcome of evaluating one candidate wager against the table. `BandSkip`
/// and `EdgeTooLow` are distinct on purpose: a dead-zone pass is a policy
/// decision, not a near-miss.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyDecision {
    Accepted { required_edge: f64 },
    EdgeTooLow { required_edge: f64 },
    BandSkip,
    LongshotDiverted,
}

impl PolicyDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, PolicyDecision::Accepted { .. })
    }
}

/// Pure band lookup: identical odds always yield the identical decision.
pub fn band_decision(odds: AmericanOdds) -> BandDecision {
    if odds.is_favorite() {
        return BandDecision::Bet { min_edge: 0.15 };
    }
    match odds.0 {
        o if o >= LONGSHOT_ODDS_FLOOR => BandDecision::Longshot,
        // Dead zones
        140..=159 | 180..=199 | 250..=399 => BandDecision::Skip,
        // Profitable zone with a softer filter
        160..=179 => BandDecision::Bet { min_edge: 0.13 },
        // Zone where no edge filter beat the unfiltered baseline
        200..=249 => BandDecision::Bet { min_edge: 0.0 },
        // Small dogs and the +120..+140 zone share the standard filter
        _ => BandDecision::Bet { min_edge: 0.15 },
    }
}

/// Evaluate a candidate wager's edge against its band.
pub fn evaluate(odds: AmericanOdds, edge: f64) -> PolicyDecision {
    match band_decision(odds) {
        BandDecision::Longshot => PolicyDecision::LongshotDiverted,
        BandDecision::Skip => PolicyDecision::BandSkip,
        BandDecision::Bet { min_edge } => {
            if edge >= min_edge {
                PolicyDecision::Accepted {
                    required_edge: min_edge,
                }
            } else {
                PolicyDecision::EdgeTooLow {
                    required_edge: min_edge,
                }
            }
        }
    }
}

/// Human-readable band label for reports.
pub fn band_label(odds: AmericanOdds) -> &'static str {
    if odds.is_favorite() {
        return if odds.0 <= -200 {
            "heavy favorite (-200 or better)"
        } else {
            "favorite"
        };
    }
    match odds.0 {
        o if o >= LONGSHOT_ODDS_FLOOR => "longshot (+400+, calibrated pipeline)",
        250..=399 => "dead zone +250-399",
        200..=249 => "zone +200-249 (no filter)",
        180..=199 => "dead zone +180-199",
        160..=179 => "zone +160-179",
        140..=159 => "dead zone +140-159",
        120..=139 => "zone +120-139",
        _ => "small dog +100-119",
    }
}
