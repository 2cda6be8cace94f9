//! Core records shared across pipeline stages.

mod game;
mod ticket;

pub use game::{BoxLine, Game, GameId, GameScore, Side, TeamObservation};
pub use ticket::{Prediction, WagerTicket};
