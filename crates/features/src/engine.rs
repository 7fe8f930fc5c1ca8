//! Per-security bounds pipeline.
//!
//! Combines window selection, volatility profiling and bound generation into a
//! single call that returns every derived artifact plus its diagnostics.

use crate::{
    boundary::BoundaryGenerator,
    calendar::{TradingCalendar, TradingWindow},
    volatility::VolatilityProfiler,
};
use bounds_core::{
    BoundaryRow, Config, Diagnostics, Price, ReferencePrices, SecurityId, SigmaProfile, Tick,
    Warning,
};
use chrono::NaiveTime;
use serde::Serialize;
use tracing::debug;

/// Everything derived for one security.
#[derive(Debug, Clone, Serialize)]
pub struct SecurityBounds {
    /// Canonical security code.
    pub security_id: SecurityId,
    /// Trading dates analyzed.
    pub window: TradingWindow,
    /// Reference prices anchoring the bounds.
    pub references: ReferencePrices,
    /// Per-minute volatility.
    pub profile: SigmaProfile,
    /// Per-minute bounds.
    pub rows: Vec<BoundaryRow>,
    /// Decimal places of the bounds.
    pub precision: u32,
    /// Non-fatal conditions raised for this security.
    pub diagnostics: Diagnostics,
}

/// Bounds engine.
#[derive(Debug, Clone)]
pub struct BoundsEngine {
    calendar: TradingCalendar,
    profiler: VolatilityProfiler,
    generator: BoundaryGenerator,
    /// Minute whose close is the prior session's reference close.
    prior_close_time: NaiveTime,
}

impl BoundsEngine {
    /// Create a new engine from configuration and an output precision.
    pub fn new(config: &Config, precision: u32) -> Self {
        Self {
            calendar: TradingCalendar::new(config.window.trading_days),
            profiler: VolatilityProfiler::from_config(config),
            generator: BoundaryGenerator::new(precision),
            prior_close_time: config.window.prior_close_time,
        }
    }

    /// Output precision.
    pub fn precision(&self) -> u32 {
        self.generator.precision()
    }

    /// Run the pipeline for one security. `ticks` must all belong to it.
    pub fn compute(&self, security_id: &SecurityId, ticks: &[Tick], today_open: Price) -> SecurityBounds {
        let mut diagnostics = Diagnostics::new();

        let window = self.calendar.select(ticks);
        if let Some(warning) = window.shortfall(security_id) {
            diagnostics.push(warning);
        }

        let daily_opens = self.profiler.daily_opens(ticks, &window);
        for &date in window.dates() {
            if !daily_opens.contains_key(&date) {
                diagnostics.push(Warning::MissingDailyOpen {
                    security_id: security_id.clone(),
                    date,
                });
            }
        }

        let profile = self.profiler.profile(ticks, &window, &daily_opens);
        if profile.is_empty() {
            diagnostics.push(Warning::EmptyProfile {
                security_id: security_id.clone(),
            });
        }

        let prior_close = self.prior_close(security_id, ticks, &window, today_open, &mut diagnostics);
        let references = ReferencePrices::new(today_open, prior_close);
        let rows = self.generator.generate(&profile, &references);

        debug!(
            security = %security_id,
            days = window.len(),
            minutes = profile.len(),
            min_price = references.min_price(),
            max_price = references.max_price(),
            "Computed bounds"
        );

        SecurityBounds {
            security_id: security_id.clone(),
            window,
            references,
            profile,
            rows,
            precision: self.precision(),
            diagnostics,
        }
    }

    /// Close of the latest window date at the closing minute.
    ///
    /// Falls back to the last minute at or before the closing minute that day,
    /// and to no prior close at all when the window is empty.
    fn prior_close(
        &self,
        security_id: &SecurityId,
        ticks: &[Tick],
        window: &TradingWindow,
        today_open: Price,
        diagnostics: &mut Diagnostics,
    ) -> Option<Price> {
        let no_prior_close = |diagnostics: &mut Diagnostics| -> Option<Price> {
            diagnostics.push(Warning::NoPriorClose {
                security_id: security_id.clone(),
                fallback: today_open,
            });
            None
        };

        let Some(latest) = window.latest() else {
            return no_prior_close(diagnostics);
        };

        let session: Vec<&Tick> = ticks.iter().filter(|t| t.date == latest).collect();
        if let Some(tick) = session.iter().find(|t| t.time == self.prior_close_time) {
            return Some(tick.close_price);
        }

        // Latest-time tick before the close; first in input order on ties.
        let mut substitute: Option<&Tick> = None;
        for &tick in session.iter().filter(|t| t.time <= self.prior_close_time) {
            if substitute.map_or(true, |s| tick.time > s.time) {
                substitute = Some(tick);
            }
        }

        match substitute {
            Some(tick) => {
                diagnostics.push(Warning::PriorCloseSubstituted {
                    security_id: security_id.clone(),
                    date: latest,
                    used_time: tick.time,
                });
                Some(tick.close_price)
            }
            None => no_prior_close(diagnostics),
        }
    }
}

impl Default for BoundsEngine {
    fn default() -> Self {
        let config = Config::default();
        Self::new(&config, 2)
    }
}
