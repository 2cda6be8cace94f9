use chrono::NaiveDate;
use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

use crate::error::{CourtedgeError, Result};

/// Main configuration structure for the edge pipeline.
///
/// The core never parses CLI flags or raw environment strings itself; the
/// automation layer hands over this record fully validated.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Materiality floor for moneyline best-bet recommendations
    /// (any positive edge when 0.0)
    #[serde(default)]
    pub min_edge: f64,
    /// Spread-edge magnitude (points) a spread bet must clear to be recommended
    #[serde(default = "default_spread_floor")]
    pub spread_edge_floor: f64,
    /// Fraction of full Kelly to apply (e.g. 0.25 for quarter-Kelly)
    #[serde(default = "default_kelly_multiplier")]
    pub kelly_multiplier: f64,
    /// Maximum fraction of bankroll risked on one wager
    #[serde(default = "default_max_bankroll_fraction")]
    pub max_bankroll_fraction: f64,
    /// Total bankroll in dollars
    pub bankroll: Decimal,
    /// End of the initial training window; the first test period starts here
    pub train_cutoff_date: NaiveDate,
    /// Length of each walk-forward test window in days
    #[serde(default = "default_test_window_days")]
    pub test_window_days: u32,
    /// Minimum training rows to fit a period; smaller periods are skipped
    #[serde(default = "default_min_training_rows")]
    pub min_training_rows: usize,
    /// Rolling lookback windows (games)
    #[serde(default = "default_window_sizes")]
    pub window_sizes: Vec<usize>,
    /// Longshot calibration settings
    #[serde(default)]
    pub calibration: CalibrationSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings for the extreme-underdog calibration pipeline
#[derive(Debug, Clone, Deserialize)]
pub struct CalibrationSettings {
    /// American odds at and above which wagers divert to the calibration pipeline
    #[serde(default = "default_longshot_min_odds")]
    pub min_odds: i32,
    /// Upper bound of the calibrated odds range
    #[serde(default = "default_longshot_max_odds")]
    pub max_odds: i32,
    /// Chronological tail held out for calibrator evaluation
    #[serde(default = "default_test_ratio")]
    pub test_ratio: f64,
    /// Minimum sample count below which calibration refuses to fit
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            min_odds: default_longshot_min_odds(),
            max_odds: default_longshot_max_odds(),
            test_ratio: default_test_ratio(),
            min_samples: default_min_samples(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_spread_floor() -> f64 {
    2.0
}

fn default_kelly_multiplier() -> f64 {
    0.25
}

fn default_max_bankroll_fraction() -> f64 {
    0.10
}

fn default_test_window_days() -> u32 {
    30
}

fn default_min_training_rows() -> usize {
    100
}

fn default_window_sizes() -> Vec<usize> {
    vec![3, 5, 10]
}

fn default_longshot_min_odds() -> i32 {
    400
}

fn default_longshot_max_odds() -> i32 {
    2000
}

fn default_test_ratio() -> f64 {
    0.2
}

fn default_min_samples() -> usize {
    50
}

fn default_log_level() -> String {
    "info".to_string()
}

impl PipelineConfig {
    /// Load configuration from files and environment
    pub fn load() -> std::result::Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> std::result::Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Override with environment variables (COURTEDGE_BANKROLL, etc.)
            .add_source(
                Environment::with_prefix("COURTEDGE")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Reject structurally unusable configurations up front.
    pub fn validate(&self) -> Result<()> {
        if self.bankroll <= Decimal::ZERO {
            return Err(CourtedgeError::Validation(format!(
                "bankroll must be positive, got {}",
                self.bankroll
            )));
        }
        if !(self.kelly_multiplier > 0.0 && self.kelly_multiplier <= 1.0) {
            return Err(CourtedgeError::Validation(format!(
                "kelly_multiplier must be in (0, 1], got {}",
                self.kelly_multiplier
            )));
        }
        if !(self.max_bankroll_fraction > 0.0 && self.max_bankroll_fraction <= 1.0) {
            return Err(CourtedgeError::Validation(format!(
                "max_bankroll_fraction must be in (0, 1], got {}",
                self.max_bankroll_fraction
            )));
        }
        if self.test_window_days == 0 {
            return Err(CourtedgeError::Validation(
                "test_window_days must be > 0".to_string(),
            ));
        }
        if self.window_sizes.is_empty() || self.window_sizes.iter().any(|w| *w == 0) {
            return Err(CourtedgeError::Validation(
                "window_sizes must be non-empty and all > 0".to_string(),
            ));
        }
        if self.min_edge < 0.0 {
            return Err(CourtedgeError::Validation(format!(
                "min_edge must be >= 0, got {}",
                self.min_edge
            )));
        }
        let cal = &self.calibration;
        if cal.min_odds <= 0 || cal.max_odds <= cal.min_odds {
            return Err(CourtedgeError::Validation(format!(
                "calibration odds range invalid: +{} to +{}",
                cal.min_odds, cal.max_odds
            )));
        }
        // The band table diverts wagers to calibration at a fixed floor; a
        // different min_odds would drop the gap into neither system.
        if cal.min_odds != crate::policy::LONGSHOT_ODDS_FLOOR {
            return Err(CourtedgeError::Validation(format!(
                "calibration.min_odds must equal the longshot diversion floor (+{}), got +{}",
                crate::policy::LONGSHOT_ODDS_FLOOR,
                cal.min_odds
            )));
        }
        if !(cal.test_ratio > 0.0 && cal.test_ratio < 1.0) {
            return Err(CourtedgeError::Validation(format!(
                "calibration.test_ratio must be in (0, 1), got {}",
                cal.test_ratio
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn base_config() -> PipelineConfig {
        PipelineConfig {
            min_edge: 0.0,
            spread_edge_floor: 2.0,
            kelly_multiplier: 0.25,
            max_bankroll_fraction: 0.10,
            bankroll: dec!(10000),
            train_cutoff_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            test_window_days: 30,
            min_training_rows: 100,
            window_sizes: vec![3, 5, 10],
            calibration: CalibrationSettings::default(),
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn valid_config_passes() {
        base_config().validate().unwrap();
    }

    #[test]
    fn rejects_zero_bankroll() {
        let mut cfg = base_config();
        cfg.bankroll = Decimal::ZERO;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_kelly_multiplier() {
        let mut cfg = base_config();
        cfg.kelly_multiplier = 1.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_empty_windows() {
        let mut cfg = base_config();
        cfg.window_sizes.clear();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_inverted_calibration_range() {
        let mut cfg = base_config();
        cfg.calibration.max_odds = cfg.calibration.min_odds - 100;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_min_odds_detached_from_diversion_floor() {
        // Samples between the policy's diversion point and min_odds would
        // otherwise fall into neither the band table nor the calibrator.
        let mut cfg = base_config();
        cfg.calibration.min_odds = 500;
        cfg.calibration.max_odds = 2000;
        assert!(cfg.validate().is_err());
        cfg.calibration.min_odds = crate::policy::LONGSHOT_ODDS_FLOOR;
        cfg.validate().unwrap();
    }
}
