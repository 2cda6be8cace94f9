//! Courtedge: a temporal-integrity betting research pipeline for college
//! basketball moneyline markets.
//!
//! The crate turns a date-sorted game table, an external rating feed, and a
//! model seam into walk-forward predictions, market edges, policy-filtered
//! wager tickets, and settled P&L, with every stage constructed so that no
//! information from a game's future can reach the features or decisions made
//! before it.

pub mod calibration;
pub mod config;
pub mod domain;
pub mod error;
pub mod features;
pub mod logging;
pub mod market;
pub mod model;
pub mod pipeline;
pub mod pnl;
pub mod policy;
pub mod ratings;
pub mod resolve;
pub mod sizing;
pub mod walkforward;

pub use config::PipelineConfig;
pub use error::{CourtedgeError, Result};
pub use pipeline::{run as run_pipeline, PipelineReport};
