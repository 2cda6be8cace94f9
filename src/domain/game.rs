use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::market::AmericanOdds;

pub type GameId = String;

/// Which participant a price, edge, or wager refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Home,
    Away,
}

/// Final score. Set exactly once, when the result arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameScore {
    pub home: u32,
    pub away: u32,
}

impl GameScore {
    pub fn home_won(&self) -> bool {
        self.home > self.away
    }

    pub fn winner(&self) -> Side {
        if self.home_won() {
            Side::Home
        } else {
            Side::Away
        }
    }
}

/// Optional box-score detail used by possession estimation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxLine {
    pub fga: f64,
    pub fta: f64,
    pub oreb: f64,
    pub tov: f64,
}

/// One scheduled or completed game with its closing market.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    /// None until the result is known
    pub score: Option<GameScore>,
    pub home_ml: AmericanOdds,
    pub away_ml: AmericanOdds,
    /// Closing spread from the home perspective (negative = home favored)
    pub close_spread: f64,
    #[serde(default)]
    pub home_box: Option<BoxLine>,
    #[serde(default)]
    pub away_box: Option<BoxLine>,
}

impl Game {
    pub fn team(&self, side: Side) -> &str {
        match side {
            Side::Home => &self.home_team,
            Side::Away => &self.away_team,
        }
    }

    /// Record the final score. Scores arrive once; a second resolution is a
    /// caller bug and is ignored in favor of the first.
    pub fn with_score(mut self, score: GameScore) -> Self {
        if self.score.is_none() {
            self.score = Some(score);
        }
        self
    }

    pub fn side_won(&self, side: Side) -> Option<bool> {
        self.score.map(|s| s.winner() == side)
    }

    /// View this game from one participant's perspective. None until the
    /// score is known; observations exist only for completed games.
    pub fn observation(&self, side: Side) -> Option<TeamObservation> {
        let score = self.score?;
        let (points_for, points_against) = match side {
            Side::Home => (score.home, score.away),
            Side::Away => (score.away, score.home),
        };
        Some(TeamObservation {
            game_id: self.id.clone(),
            team: self.team(side).to_string(),
            date: self.date,
            points_for,
            points_against,
            won: score.winner() == side,
            is_home: side == Side::Home,
            box_line: match side {
                Side::Home => self.home_box,
                Side::Away => self.away_box,
            },
        })
    }
}

/// One completed game seen from one team's perspective. Derived from [`Game`],
/// never stored independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamObservation {
    pub game_id: GameId,
    pub team: String,
    pub date: NaiveDate,
    pub points_for: u32,
    pub points_against: u32,
    pub won: bool,
    pub is_home: bool,
    pub box_line: Option<BoxLine>,
}

impl TeamObservation {
    pub fn margin(&self) -> f64 {
        self.points_for as f64 - self.points_against as f64
    }
}
