//! Market math: odds/probability conversions and edge derivation.
//!
//! Every odds and P&L conversion in the pipeline goes through this module so
//! that favorites and underdogs are priced with one set of formulas.

mod edge;
mod odds;

pub use edge::{
    best_bet, bet_opportunities, compute_edges, BetOpportunity, BetPick, EdgeParams, GameEdges,
};
pub use odds::{break_even_odds, AmericanOdds};
