use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Game, GameId, Prediction, Side};
use crate::market::AmericanOdds;

/// Floors a candidate bet must clear before it becomes a recommendation.
#[derive(Debug, Clone, Copy)]
pub struct EdgeParams {
    /// Spread-edge magnitude (points) required to consider a spread bet
    pub spread_floor: f64,
    /// Minimum moneyline edge worth recommending (0.0 = any positive edge)
    pub min_ml_edge: f64,
}

impl Default for EdgeParams {
    fn default() -> Self {
        Self {
            spread_floor: 2.0,
            min_ml_edge: 0.0,
        }
    }
}

/// Which market/side a recommendation points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetPick {
    HomeSpread,
    AwaySpread,
    HomeMoneyline,
    AwayMoneyline,
}

/// Model-vs-market comparison for one game, both sides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEdges {
    pub game_id: GameId,
    pub date: NaiveDate,
    pub model_home_prob: f64,
    pub home_implied_prob: f64,
    pub away_implied_prob: f64,
    pub home_edge: f64,
    pub away_edge: f64,
    /// model_spread - close_spread, when a spread model contributed
    pub edge_spread: Option<f64>,
    pub home_ml: AmericanOdds,
    pub away_ml: AmericanOdds,
    /// Highest-edge recommendation clearing the floors, if any
    pub best_bet: Option<(BetPick, f64)>,
    pub home_won: Option<bool>,
}

/// One wagerable side of a game, in the shape the policy engine consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetOpportunity {
    pub game_id: GameId,
    pub date: NaiveDate,
    pub side: Side,
    pub odds: AmericanOdds,
    pub model_prob: f64,
    pub implied_prob: f64,
    pub edge: f64,
    pub won: Option<bool>,
}

/// Derive both moneyline edges (and optionally the spread edge) for one game.
pub fn compute_edges(
    game: &Game,
    prediction: &Prediction,
    model_spread: Option<f64>,
    params: &EdgeParams,
) -> GameEdges {
    let home_implied = game.home_ml.implied_prob();
    let away_implied = game.away_ml.implied_prob();
    let model_home = prediction.model_home_prob;

    let home_edge = model_home - home_implied;
    let away_edge = (1.0 - model_home) - away_implied;
    let edge_spread = model_spread.map(|m| m - game.close_spread);

    let best = best_bet(edge_spread, home_edge, away_edge, params);

    GameEdges {
        game_id: game.id.clone(),
        date: game.date,
        model_home_prob: model_home,
        home_implied_prob: home_implied,
        away_implied_prob: away_implied,
        home_edge,
        away_edge,
        edge_spread,
        home_ml: game.home_ml,
        away_ml: game.away_ml,
        best_bet: best,
        home_won: game.score.map(|s| s.home_won()),
    }
}

/// Pick the single highest-edge recommendation that clears its floor.
///
/// Spread edges are compared by magnitude against `spread_floor`; moneyline
/// edges must strictly beat both the running best and `min_ml_edge`. When
/// nothing clears, there is no recommendation for the game.
pub fn best_bet(
    edge_spread: Option<f64>,
    home_edge: f64,
    away_edge: f64,
    params: &EdgeParams,
) -> Option<(BetPick, f64)> {
    let mut best: Option<BetPick> = None;
    let mut max_edge = params.min_ml_edge;

    if let Some(spread) = edge_spread {
        if spread.abs() > params.spread_floor {
            if spread > 0.0 {
                best = Some(BetPick::HomeSpread);
                max_edge = spread;
            } else {
                best = Some(BetPick::AwaySpread);
                max_edge = spread.abs();
            }
        }
    }

    if home_edge > max_edge {
        best = Some(BetPick::HomeMoneyline);
        max_edge = home_edge;
    }
    if away_edge > max_edge {
        best = Some(BetPick::AwayMoneyline);
        max_edge = away_edge;
    }

    best.map(|pick| (pick, max_edge))
}

/// Explode a game's edges into two wagerable rows, one per side.
pub fn bet_opportunities(edges: &GameEdges) -> [BetOpportunity; 2] {
    [
        BetOpportunity {
            game_id: edges.game_id.clone(),
            date: edges.date,
            side: Side::Home,
            odds: edges.home_ml,
            model_prob: edges.model_home_prob,
            implied_prob: edges.home_implied_prob,
            edge: edges.home_edge,
            won: edges.home_won,
        },
        BetOpportunity {
            game_id: edges.game_id.clone(),
            date: edges.date,
            side: Side::Away,
            odds: edges.away_ml,
            model_prob: 1.0 - edges.model_home_prob,
            implied_prob: edges.away_implied_prob,
            edge: edges.away_edge,
            won: edges.home_won.map(|w| !w),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GameScore;

    fn game() -> Game {
        Game {
            id: "g1".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            home_team: "Duke".to_string(),
            away_team: "Kansas".to_string(),
            score: Some(GameScore { home: 80, away: 75 }),
            home_ml: AmericanOdds(-150),
            away_ml: AmericanOdds(200),
            close_spread: -3.0,
            home_box: None,
            away_box: None,
        }
    }

    fn prediction(p_home: f64) -> Prediction {
        Prediction {
            game_id: "g1".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            period: 0,
            model_home_prob: p_home,
            home_won: Some(true),
        }
    }

    #[test]
    fn edges_are_model_minus_implied() {
        let edges = compute_edges(&game(), &prediction(0.70), None, &EdgeParams::default());
        assert!((edges.home_edge - (0.70 - 0.6)).abs() < 1e-12);
        assert!((edges.away_edge - (0.30 - 1.0 / 3.0)).abs() < 1e-12);
        assert!(edges.edge_spread.is_none());
    }

    #[test]
    fn scenario_a_away_underdog_edge() {
        // +200, model prob 0.40: implied 1/3, edge ~ 0.0667
        let edges = compute_edges(&game(), &prediction(0.60), None, &EdgeParams::default());
        assert!((edges.away_edge - (0.40 - 1.0 / 3.0)).abs() < 1e-9);
        let (pick, max_edge) = edges.best_bet.unwrap();
        assert_eq!(pick, BetPick::AwayMoneyline);
        assert!((max_edge - edges.away_edge).abs() < 1e-12);
    }

    #[test]
    fn no_recommendation_when_nothing_clears_floor() {
        // Model agrees with market on both sides, spread edge under the floor.
        let best = best_bet(Some(1.5), -0.01, -0.02, &EdgeParams::default());
        assert!(best.is_none());
    }

    #[test]
    fn spread_edge_beats_floor_but_loses_to_bigger_ml_edge() {
        let params = EdgeParams::default();
        let best = best_bet(Some(2.5), 3.0, -0.1, &params);
        // home ML edge 3.0 > spread edge 2.5
        assert_eq!(best.unwrap().0, BetPick::HomeMoneyline);

        let best = best_bet(Some(-2.5), 0.01, 0.02, &params);
        assert_eq!(best.unwrap(), (BetPick::AwaySpread, 2.5));
    }

    #[test]
    fn opportunities_cover_both_sides_with_complementary_outcomes() {
        let edges = compute_edges(&game(), &prediction(0.70), None, &EdgeParams::default());
        let [home, away] = bet_opportunities(&edges);
        assert_eq!(home.side, Side::Home);
        assert_eq!(away.side, Side::Away);
        assert_eq!(home.won, Some(true));
        assert_eq!(away.won, Some(false));
        assert!((home.model_prob + away.model_prob - 1.0).abs() < 1e-12);
    }
}
