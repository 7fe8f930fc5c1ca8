//! Configuration structures for the price bounds engine.

use crate::error::{Error, Result};
use crate::types::{time_of_day, SchemaLayout};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Largest supported output precision (decimal places).
pub const MAX_PRECISION: u32 = 10;

/// Main configuration for a bounds run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Trailing window and reference-minute configuration.
    pub window: WindowConfig,
    /// Trading session configuration.
    pub sessions: SessionConfig,
    /// Bound rounding configuration.
    pub bounds: BoundsConfig,
    /// File locations and naming.
    pub io: IoConfig,
}

impl Config {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.window.trading_days == 0 {
            return Err(Error::config("window.trading_days must be at least 1"));
        }
        if let Some(precision) = self.bounds.precision {
            if precision > MAX_PRECISION {
                return Err(Error::config(format!(
                    "bounds.precision must be at most {MAX_PRECISION}, got {precision}"
                )));
            }
        }
        if self.sessions.sessions.is_empty() {
            return Err(Error::config("at least one trading session is required"));
        }
        for session in &self.sessions.sessions {
            if session.start > session.end {
                return Err(Error::config(format!(
                    "trading session starts after it ends: {} > {}",
                    session.start, session.end
                )));
            }
        }
        Ok(())
    }
}

/// Trailing window configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Number of most recent distinct trading dates to analyze.
    pub trading_days: usize,
    /// Minute whose open price is the day's movement baseline.
    pub daily_open_time: NaiveTime,
    /// Minute whose close price is the prior session's reference close.
    pub prior_close_time: NaiveTime,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            trading_days: 14,
            daily_open_time: time_of_day(9, 31, 0),
            prior_close_time: time_of_day(15, 0, 0),
        }
    }
}

/// A closed intraday interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingSession {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TradingSession {
    /// Create a session from its endpoints.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Both endpoints are inclusive.
    #[inline]
    pub fn contains(&self, time: NaiveTime) -> bool {
        self.start <= time && time <= self.end
    }
}

/// Standard trading hours.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Sessions in which minutes contribute to the volatility profile.
    pub sessions: Vec<TradingSession>,
}

impl SessionConfig {
    /// Check whether a minute falls inside any session.
    pub fn is_trading_time(&self, time: NaiveTime) -> bool {
        self.sessions.iter().any(|s| s.contains(time))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sessions: vec![
                TradingSession::new(time_of_day(9, 30, 0), time_of_day(11, 30, 0)),
                TradingSession::new(time_of_day(13, 0, 0), time_of_day(15, 0, 0)),
            ],
        }
    }
}

/// Bound rounding configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundsConfig {
    /// Decimal places for emitted bounds. `None` follows the input layout.
    pub precision: Option<u32>,
}

impl BoundsConfig {
    /// Precision to use for a table of the given layout.
    pub fn precision_for(&self, layout: SchemaLayout) -> u32 {
        self.precision.unwrap_or_else(|| layout.default_precision())
    }
}

/// File locations and output naming.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IoConfig {
    /// Conventional data directory searched when a path does not resolve.
    pub data_dir: PathBuf,
    /// Directory receiving per-security output files.
    pub output_dir: PathBuf,
    /// Prefix of derived output file names.
    pub output_prefix: String,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("."),
            output_prefix: "recent_".to_string(),
        }
    }
}
