use chrono::NaiveDate;
use thiserror::Error;

/// Main error type for the edge pipeline.
///
/// Only structurally invalid input is fatal. Recoverable per-event and
/// per-period conditions (missing history, unmatched ratings, skipped
/// training periods, policy skips, calibration scarcity) are modeled as
/// explicit domain values in their own modules, not as errors.
#[derive(Error, Debug)]
pub enum CourtedgeError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Structurally invalid input (run-aborting)
    #[error("Empty game table")]
    EmptyGameTable,

    #[error("Games out of order: row {index} dated {date} precedes prior row dated {prev}")]
    UnsortedGames {
        index: usize,
        date: NaiveDate,
        prev: NaiveDate,
    },

    #[error("Invalid odds: {0}")]
    InvalidOdds(String),

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for CourtedgeError
pub type Result<T> = std::result::Result<T, CourtedgeError>;
