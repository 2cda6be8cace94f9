use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use crate::domain::{Game, GameId, Side, TeamObservation};
use crate::features::PossessionEstimator;

/// Per-game metrics derived once, then aggregated by every window.
#[derive(Debug, Clone, Copy)]
struct GameMetrics {
    off_rating: f64,
    def_rating: f64,
    pace: f64,
    margin: f64,
    won: f64,
    is_home: bool,
}

/// Aggregates over one lookback window, computed from `games_used` prior
/// games (possibly fewer than the window size early in the season).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowStats {
    pub window: usize,
    pub games_used: usize,
    /// Points scored per 100 possessions
    pub off_rating: f64,
    /// Points allowed per 100 possessions
    pub def_rating: f64,
    /// Possessions per game
    pub pace: f64,
    /// Average margin of victory
    pub margin: f64,
    pub win_pct: f64,
}

/// Last-5 split over prior games at the same venue as the current game.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VenueSplit {
    pub games_used: usize,
    pub off_rating: f64,
    pub def_rating: f64,
}

/// All rolling aggregates for one team as of (strictly before) one game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollingFeature {
    pub game_id: GameId,
    pub team: String,
    pub date: NaiveDate,
    /// Index of the game within the team's chronological sequence
    pub as_of_index: usize,
    pub games_played: usize,
    pub is_home: bool,
    /// One entry per configured window, in configuration order.
    /// None means no prior history at all (first game).
    pub windows: Vec<Option<WindowStats>>,
    /// Split over prior games at this game's venue
    pub venue_l5: Option<VenueSplit>,
}

impl RollingFeature {
    /// Stats for a given window size, if that window was configured and any
    /// history exists.
    pub fn window(&self, size: usize, configured: &[usize]) -> Option<&WindowStats> {
        let idx = configured.iter().position(|w| *w == size)?;
        self.windows.get(idx)?.as_ref()
    }
}

/// Rolling statistics engine: multiple concurrent windows, venue splits, and
/// a pluggable possession estimator.
pub struct RollingStats {
    windows: Vec<usize>,
    estimator: Box<dyn PossessionEstimator + Send + Sync>,
}

impl RollingStats {
    pub fn new(
        windows: Vec<usize>,
        estimator: Box<dyn PossessionEstimator + Send + Sync>,
    ) -> Self {
        Self { windows, estimator }
    }

    pub fn windows(&self) -> &[usize] {
        &self.windows
    }

    /// Compute rolling features for one team's chronologically sorted
    /// observations. The feature at index i uses observations [max(0, i-w), i)
    /// only; the current game never contributes to its own feature.
    pub fn compute_team(&self, observations: &[TeamObservation]) -> Vec<RollingFeature> {
        let metrics: Vec<GameMetrics> = observations
            .iter()
            .map(|obs| {
                let possessions = self.estimator.estimate(obs).max(1.0);
                GameMetrics {
                    off_rating: obs.points_for as f64 / possessions * 100.0,
                    def_rating: obs.points_against as f64 / possessions * 100.0,
                    pace: possessions,
                    margin: obs.margin(),
                    won: if obs.won { 1.0 } else { 0.0 },
                    is_home: obs.is_home,
                }
            })
            .collect();

        observations
            .iter()
            .enumerate()
            .map(|(i, obs)| {
                let windows = self
                    .windows
                    .iter()
                    .map(|&w| window_stats(&metrics, i, w))
                    .collect();
                RollingFeature {
                    game_id: obs.game_id.clone(),
                    team: obs.team.clone(),
                    date: obs.date,
                    as_of_index: i,
                    games_played: i,
                    is_home: obs.is_home,
                    windows,
                    venue_l5: venue_split(&metrics, i, obs.is_home, 5),
                }
            })
            .collect()
    }

    /// Compute rolling features for every team appearing in the game log.
    /// Only resolved games produce observations.
    pub fn compute_all(&self, games: &[Game]) -> FeatureTable {
        let mut by_team: HashMap<String, Vec<TeamObservation>> = HashMap::new();
        for game in games {
            for side in [Side::Home, Side::Away] {
                if let Some(obs) = game.observation(side) {
                    by_team.entry(obs.team.clone()).or_default().push(obs);
                }
            }
        }

        let mut table = FeatureTable::default();
        for (team, mut observations) in by_team {
            observations.sort_by_key(|o| o.date);
            let features = self.compute_team(&observations);
            debug!(
                team = %team,
                games = features.len(),
                "rolling stats computed"
            );
            for feature in features {
                table
                    .by_team_game
                    .insert((team.clone(), feature.game_id.clone()), feature);
            }
        }
        table
    }
}

/// Mean over the prior-game slice [max(0, i-w), i). Empty slice (first game)
/// is an explicit None; callers decide imputation.
fn window_stats(metrics: &[GameMetrics], i: usize, w: usize) -> Option<WindowStats> {
    let start = i.saturating_sub(w);
    let prior = &metrics[start..i];
    if prior.is_empty() {
        return None;
    }
    let n = prior.len() as f64;
    Some(WindowStats {
        window: w,
        games_used: prior.len(),
        off_rating: prior.iter().map(|m| m.off_rating).sum::<f64>() / n,
        def_rating: prior.iter().map(|m| m.def_rating).sum::<f64>() / n,
        pace: prior.iter().map(|m| m.pace).sum::<f64>() / n,
        margin: prior.iter().map(|m| m.margin).sum::<f64>() / n,
        win_pct: prior.iter().map(|m| m.won).sum::<f64>() / n,
    })
}

/// Split over the last `limit` prior games at the same venue as game i.
fn venue_split(metrics: &[GameMetrics], i: usize, is_home: bool, limit: usize) -> Option<VenueSplit> {
    let prior: Vec<&GameMetrics> = metrics[..i]
        .iter()
        .rev()
        .filter(|m| m.is_home == is_home)
        .take(limit)
        .collect();
    if prior.is_empty() {
        return None;
    }
    let n = prior.len() as f64;
    Some(VenueSplit {
        games_used: prior.len(),
        off_rating: prior.iter().map(|m| m.off_rating).sum::<f64>() / n,
        def_rating: prior.iter().map(|m| m.def_rating).sum::<f64>() / n,
    })
}

/// Immutable output of the rolling stage, keyed by (team, game id) so that
/// doubleheaders resolve to distinct features. A date key would let a
/// same-day later game shadow the earlier one and hand it a feature already
/// containing its own outcome.
#[derive(Debug, Default)]
pub struct FeatureTable {
    by_team_game: HashMap<(String, GameId), RollingFeature>,
}

impl FeatureTable {
    pub fn get(&self, team: &str, game_id: &str) -> Option<&RollingFeature> {
        self.by_team_game.get(&(team.to_string(), game_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.by_team_game.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_team_game.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FixedPaceEstimator;

    fn obs(team: &str, day: u32, pf: u32, pa: u32, is_home: bool) -> TeamObservation {
        TeamObservation {
            game_id: format!("{team}-d{day}-{pf}"),
            team: team.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            points_for: pf,
            points_against: pa,
            won: pf > pa,
            is_home,
            box_line: None,
        }
    }

    fn engine(windows: Vec<usize>) -> RollingStats {
        // Fixed pace of 100 makes off_rating == points_for
        RollingStats::new(windows, Box::new(FixedPaceEstimator(100.0)))
    }

    #[test]
    fn first_game_has_no_history() {
        let stats = engine(vec![5]);
        let features = stats.compute_team(&[obs("Duke", 1, 80, 70, true)]);
        assert_eq!(features.len(), 1);
        assert!(features[0].windows[0].is_none());
        assert!(features[0].venue_l5.is_none());
        assert_eq!(features[0].games_played, 0);
    }

    #[test]
    fn current_game_excluded_from_its_own_window() {
        let stats = engine(vec![3]);
        let features = stats.compute_team(&[
            obs("Duke", 1, 80, 70, true),
            obs("Duke", 3, 100, 90, true),
        ]);
        let w = features[1].windows[0].unwrap();
        // Only game 1 contributes; game 2's own 100 points must not appear.
        assert_eq!(w.games_used, 1);
        assert!((w.off_rating - 80.0).abs() < 1e-12);
        assert!((w.margin - 10.0).abs() < 1e-12);
        assert!((w.win_pct - 1.0).abs() < 1e-12);
    }

    #[test]
    fn partial_window_uses_available_history() {
        // Scenario C: two prior games under an L5 window average those two.
        let stats = engine(vec![5]);
        let features = stats.compute_team(&[
            obs("Duke", 1, 80, 70, true),
            obs("Duke", 3, 60, 72, false),
            obs("Duke", 5, 90, 80, true),
        ]);
        let w = features[2].window(5, stats.windows()).unwrap();
        assert_eq!(w.games_used, 2);
        assert!((w.off_rating - 70.0).abs() < 1e-12);
        assert!((w.win_pct - 0.5).abs() < 1e-12);
    }

    #[test]
    fn window_slides_once_full() {
        let stats = engine(vec![2]);
        let features = stats.compute_team(&[
            obs("Duke", 1, 50, 60, true),
            obs("Duke", 2, 70, 60, true),
            obs("Duke", 3, 90, 60, true),
            obs("Duke", 4, 80, 60, true),
        ]);
        let w = features[3].windows[0].unwrap();
        // Games at indices 1 and 2 only.
        assert_eq!(w.games_used, 2);
        assert!((w.off_rating - 80.0).abs() < 1e-12);
    }

    #[test]
    fn venue_split_filters_by_current_venue() {
        let stats = engine(vec![5]);
        let features = stats.compute_team(&[
            obs("Duke", 1, 80, 70, true),
            obs("Duke", 2, 60, 70, false),
            obs("Duke", 3, 90, 70, true),
            obs("Duke", 4, 88, 70, true),
        ]);
        // Game 4 is home; split covers the two prior home games only.
        let split = features[3].venue_l5.unwrap();
        assert_eq!(split.games_used, 2);
        assert!((split.off_rating - 85.0).abs() < 1e-12);

        // Game 2 is away with no prior away games.
        assert!(features[1].venue_l5.is_none());
    }

    #[test]
    fn no_leakage_under_future_mutation() {
        let stats = engine(vec![3, 5]);
        let mut season: Vec<TeamObservation> = (1..=8)
            .map(|d| obs("Duke", d, 70 + d, 70, d % 2 == 0))
            .collect();
        let baseline = stats.compute_team(&season);

        // Mutating any observation at index >= i must leave feature i intact.
        season[5].points_for = 200;
        season[5].won = true;
        season[7].points_against = 1;
        let mutated = stats.compute_team(&season);

        for i in 0..=5 {
            assert_eq!(baseline[i].windows, mutated[i].windows, "leak at index {i}");
            assert_eq!(baseline[i].venue_l5, mutated[i].venue_l5);
        }
    }

    #[test]
    fn compute_all_indexes_by_team_and_date() {
        use crate::domain::{Game, GameScore};
        use crate::market::AmericanOdds;

        let games = vec![Game {
            id: "g1".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            home_team: "Duke".to_string(),
            away_team: "Kansas".to_string(),
            score: Some(GameScore { home: 75, away: 70 }),
            home_ml: AmericanOdds(-120),
            away_ml: AmericanOdds(100),
            close_spread: -1.5,
            home_box: None,
            away_box: None,
        }];
        let stats = engine(vec![5]);
        let table = stats.compute_all(&games);
        assert_eq!(table.len(), 2);
        let duke = table.get("Duke", "g1").unwrap();
        assert_eq!(duke.games_played, 0);
        assert_eq!(duke.date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn doubleheader_games_keep_distinct_features() {
        use crate::domain::{Game, GameScore};
        use crate::market::AmericanOdds;

        // Duke plays twice on the same date. The first game's feature must
        // cover only the prior day's game, never its own 100-point result.
        let d1 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let game = |id: &str, date, home_score| Game {
            id: id.to_string(),
            date,
            home_team: "Duke".to_string(),
            away_team: "Kansas".to_string(),
            score: Some(GameScore {
                home: home_score,
                away: 70,
            }),
            home_ml: AmericanOdds(-120),
            away_ml: AmericanOdds(100),
            close_spread: -1.5,
            home_box: None,
            away_box: None,
        };
        let games = vec![game("g1", d1, 80), game("g2", d2, 100), game("g3", d2, 60)];

        let stats = engine(vec![5]);
        let table = stats.compute_all(&games);

        let first = table.get("Duke", "g2").unwrap();
        let w = first.window(5, stats.windows()).unwrap();
        assert_eq!(w.games_used, 1);
        assert!((w.off_rating - 80.0).abs() < 1e-12);

        // The second same-day game sees the first one, not itself.
        let second = table.get("Duke", "g3").unwrap();
        let w = second.window(5, stats.windows()).unwrap();
        assert_eq!(w.games_used, 2);
        assert!((w.off_rating - 90.0).abs() < 1e-12);
    }
}
