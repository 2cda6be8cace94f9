use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{GameId, Side};
use crate::market::AmericanOdds;

/// One out-of-sample model probability, produced exactly once per game by the
/// walk-forward trainer for the test period containing the game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub game_id: GameId,
    pub date: NaiveDate,
    /// Walk-forward period that produced this row
    pub period: usize,
    /// Model probability that the home side wins
    pub model_home_prob: f64,
    /// Known outcome, when the game has resolved
    pub home_won: Option<bool>,
}

/// An accepted wager, fully sized. Created only when the odds-band policy
/// accepts the edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WagerTicket {
    pub game_id: GameId,
    pub date: NaiveDate,
    pub side: Side,
    pub odds: AmericanOdds,
    pub edge: f64,
    pub full_kelly: f64,
    pub applied_fraction: f64,
    pub stake: Decimal,
    /// Settlement outcome, None while the game is unresolved
    pub won: Option<bool>,
}
