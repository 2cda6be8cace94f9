//! Leakage-free rolling statistics.
//!
//! For a team's i-th game, every window aggregate is computed over games
//! strictly before i. Missing history is an explicit `None`, never a zero.

mod possessions;
mod rolling;

pub use possessions::{BoxScoreEstimator, FixedPaceEstimator, PossessionEstimator};
pub use rolling::{FeatureTable, RollingFeature, RollingStats, VenueSplit, WindowStats};
