use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CourtedgeError, Result};

/// Signed American moneyline price. Negative marks the favorite, positive the
/// underdog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AmericanOdds(pub i32);

impl AmericanOdds {
    /// Checked constructor for ingestion paths. American prices are always
    /// at least 100 in magnitude; zero and the open interval (-100, 100)
    /// have no market meaning.
    pub fn try_new(odds: i32) -> Result<Self> {
        if odds.abs() < 100 {
            return Err(CourtedgeError::InvalidOdds(format!(
                "American odds must be <= -100 or >= +100, got {odds}"
            )));
        }
        Ok(Self(odds))
    }

    pub fn is_favorite(self) -> bool {
        self.0 < 0
    }

    /// Break-even win probability encoded by this price (vig excluded).
    ///
    /// Favorite `f`: |f| / (|f| + 100). Underdog `u`: 100 / (u + 100).
    pub fn implied_prob(self) -> f64 {
        let odds = self.0 as f64;
        if odds < 0.0 {
            odds.abs() / (odds.abs() + 100.0)
        } else {
            100.0 / (odds + 100.0)
        }
    }

    /// Decimal (European) odds: total return per unit staked.
    ///
    /// Favorite: 1 + 100/|f|. Underdog: 1 + u/100.
    pub fn decimal(self) -> f64 {
        let odds = self.0 as f64;
        if odds < 0.0 {
            1.0 + 100.0 / odds.abs()
        } else {
            1.0 + odds / 100.0
        }
    }

    /// Net profit per unit staked on a win.
    pub fn profit_multiple(self) -> f64 {
        self.decimal() - 1.0
    }
}

impl fmt::Display for AmericanOdds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 > 0 {
            write!(f, "+{}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Continuous inverse of [`AmericanOdds::implied_prob`]: the break-even
/// American price for probability `p`. Returned unrounded so the round trip
/// reproduces the source odds within floating tolerance.
pub fn break_even_odds(p: f64) -> f64 {
    debug_assert!(p > 0.0 && p < 1.0);
    if p >= 0.5 {
        // Favorite side: p = |f| / (|f| + 100)  =>  |f| = 100 p / (1 - p)
        -(100.0 * p / (1.0 - p))
    } else {
        // Underdog side: p = 100 / (u + 100)  =>  u = 100 (1 - p) / p
        100.0 * (1.0 - p) / p
    }
}
