//! Bounded fractional-Kelly stake sizing.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::market::AmericanOdds;

/// Sizing parameters: fraction of full Kelly applied, and the hard cap on
/// bankroll share per wager.
#[derive(Debug, Clone, Copy)]
pub struct KellyParams {
    pub multiplier: f64,
    pub max_fraction: f64,
}

impl Default for KellyParams {
    fn default() -> Self {
        // Quarter-Kelly with a 10% bankroll cap
        Self {
            multiplier: 0.25,
            max_fraction: 0.10,
        }
    }
}

/// A sized stake. `full_fraction` may be negative (negative edge);
/// `applied_fraction` and `stake` never are.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KellyStake {
    pub full_fraction: f64,
    pub applied_fraction: f64,
    pub stake: Decimal,
}

/// Size one wager.
///
/// Full Kelly = edge / (decimal_odds - 1); applied = full x multiplier,
/// clamped to [0, max_fraction]; stake = applied x bankroll rounded to the
/// cent. Zero or negative edge always sizes to zero, never a negative bet.
pub fn kelly_stake(
    edge: f64,
    odds: AmericanOdds,
    params: &KellyParams,
    bankroll: Decimal,
) -> KellyStake {
    let profit_multiple = odds.profit_multiple();
    let full_fraction = edge / profit_multiple;
    let applied_fraction = (full_fraction * params.multiplier).clamp(0.0, params.max_fraction);

    let fraction_dec = Decimal::from_f64(applied_fraction).unwrap_or(Decimal::ZERO);
    let stake = (bankroll * fraction_dec)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    KellyStake {
        full_fraction,
        applied_fraction,
        stake,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn scenario_a_quarter_kelly_at_plus_200() {
        // +200, edge ~0.0667: decimal odds 3.0, full kelly ~0.0333,
        // quarter-kelly ~0.0083.
        let edge = 0.40 - AmericanOdds(200).implied_prob();
        let sized = kelly_stake(edge, AmericanOdds(200), &KellyParams::default(), dec!(10000));
        assert!((sized.full_fraction - edge / 2.0).abs() < 1e-12);
        assert!((sized.applied_fraction - edge / 8.0).abs() < 1e-12);
        // 10_000 * 0.008333... ~ 83.33
        assert_eq!(sized.stake, dec!(83.33));
    }

    #[test]
    fn negative_edge_stakes_zero() {
        let sized = kelly_stake(-0.05, AmericanOdds(150), &KellyParams::default(), dec!(5000));
        assert!(sized.full_fraction < 0.0);
        assert_eq!(sized.applied_fraction, 0.0);
        assert_eq!(sized.stake, Decimal::ZERO);
    }

    #[test]
    fn cap_binds_for_large_edges() {
        let params = KellyParams::default();
        let sized = kelly_stake(0.60, AmericanOdds(110), &params, dec!(1000));
        assert_eq!(sized.applied_fraction, params.max_fraction);
        assert_eq!(sized.stake, dec!(100.00));
    }

    #[test]
    fn monotonic_in_edge_at_fixed_odds() {
        let params = KellyParams::default();
        let bankroll = dec!(10000);
        let mut last = Decimal::MIN;
        for step in 0..60 {
            let edge = -0.10 + step as f64 * 0.01;
            let sized = kelly_stake(edge, AmericanOdds(-120), &params, bankroll);
            assert!(sized.stake >= last, "stake decreased at edge {edge}");
            assert!(sized.stake >= Decimal::ZERO);
            assert!(sized.stake <= bankroll * Decimal::from_f64(params.max_fraction).unwrap());
            last = sized.stake;
        }
    }

    #[test]
    fn favorite_decimal_odds_shrink_denominator() {
        // Same edge pays less on a favorite, so Kelly sizes bigger.
        let params = KellyParams {
            multiplier: 1.0,
            max_fraction: 1.0,
        };
        let fav = kelly_stake(0.05, AmericanOdds(-200), &params, dec!(1000));
        let dog = kelly_stake(0.05, AmericanOdds(200), &params, dec!(1000));
        assert!(fav.full_fraction > dog.full_fraction);
        assert!((fav.full_fraction - 0.10).abs() < 1e-12);
        assert!((dog.full_fraction - 0.025).abs() < 1e-12);
    }
}
