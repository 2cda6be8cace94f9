use crate::domain::TeamObservation;

/// Possession-count estimate for one team-game.
///
/// The exact formula is deliberately a seam: per-possession ratings only need
/// a consistent denominator, and callers with richer play-by-play data can
/// plug in a better estimate without touching the rolling engine.
pub trait PossessionEstimator {
    fn estimate(&self, obs: &TeamObservation) -> f64;
}

/// Box-score estimate `FGA + 0.44*FTA - OREB + TOV`, falling back to a fixed
/// pace when box stats are absent.
#[derive(Debug, Clone, Copy)]
pub struct BoxScoreEstimator {
    pub fallback_pace: f64,
}

impl Default for BoxScoreEstimator {
    fn default() -> Self {
        // ~70 possessions per team-game is typical for college basketball
        Self {
            fallback_pace: 70.0,
        }
    }
}

impl PossessionEstimator for BoxScoreEstimator {
    fn estimate(&self, obs: &TeamObservation) -> f64 {
        match obs.box_line {
            Some(b) => b.fga + 0.44 * b.fta - b.oreb + b.tov,
            None => self.fallback_pace,
        }
    }
}

/// Constant possessions per game, regardless of box score.
#[derive(Debug, Clone, Copy)]
pub struct FixedPaceEstimator(pub f64);

impl PossessionEstimator for FixedPaceEstimator {
    fn estimate(&self, _obs: &TeamObservation) -> f64 {
        self.0
    }
}
