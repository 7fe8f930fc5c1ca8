//! Per-minute volatility profile.
//!
//! For each minute-of-day, sigma is the mean absolute movement of the close
//! relative to that day's opening minute, across the trading window.

use crate::calendar::TradingWindow;
use bounds_core::config::SessionConfig;
use bounds_core::{Config, Price, SigmaPoint, SigmaProfile, Tick};
use chrono::{NaiveDate, NaiveTime};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use tracing::debug;

/// Volatility profile calculator.
#[derive(Debug, Clone)]
pub struct VolatilityProfiler {
    /// Minutes retained in the profile.
    sessions: SessionConfig,
    /// Minute whose open is the day's baseline.
    daily_open_time: NaiveTime,
}

impl VolatilityProfiler {
    /// Create a new profiler.
    pub fn new(sessions: SessionConfig, daily_open_time: NaiveTime) -> Self {
        Self {
            sessions,
            daily_open_time,
        }
    }

    /// Create a profiler from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.sessions.clone(), config.window.daily_open_time)
    }

    /// Opening price of each window date that has an opening minute.
    ///
    /// When a date carries several ticks at the opening minute, the first one
    /// in input order wins.
    pub fn daily_opens(&self, ticks: &[Tick], window: &TradingWindow) -> BTreeMap<NaiveDate, Price> {
        let mut opens = BTreeMap::new();
        for tick in ticks {
            if tick.time != self.daily_open_time || !window.contains(tick.date) {
                continue;
            }
            if opens.contains_key(&tick.date) {
                debug!(date = %tick.date, "Duplicate opening minute ignored");
                continue;
            }
            opens.insert(tick.date, tick.open_price);
        }
        opens
    }

    /// Compute the profile over the window.
    ///
    /// Ticks outside the window, outside the trading sessions, or on a date
    /// without an opening price do not contribute.
    pub fn profile(
        &self,
        ticks: &[Tick],
        window: &TradingWindow,
        daily_opens: &BTreeMap<NaiveDate, Price>,
    ) -> SigmaProfile {
        let mut samples: BTreeMap<NaiveTime, Vec<f64>> = BTreeMap::new();

        for tick in ticks {
            if !window.contains(tick.date) || !self.sessions.is_trading_time(tick.time) {
                continue;
            }
            let Some(&daily_open) = daily_opens.get(&tick.date) else {
                continue;
            };
            if let Some(movement) = tick.movement(daily_open).filter(|m| m.is_finite()) {
                samples.entry(tick.time).or_default().push(movement);
            }
        }

        let points = samples
            .into_iter()
            .map(|(time, moves)| {
                let point = SigmaPoint {
                    time,
                    sigma: moves.iter().mean(),
                    samples: moves.len(),
                };
                (time, point)
            })
            .collect();

        SigmaProfile::from_points(points)
    }
}

impl Default for VolatilityProfiler {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
