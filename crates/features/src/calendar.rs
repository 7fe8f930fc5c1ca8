//! Trailing trading-day window selection.

use bounds_core::{SecurityId, Tick, Warning};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

/// The most recent distinct trading dates of one security, ascending.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradingWindow {
    dates: Vec<NaiveDate>,
    requested: usize,
}

impl TradingWindow {
    /// Dates in the window, ascending.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Most recent date, if any.
    pub fn latest(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Check whether a date is part of the window.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.binary_search(&date).is_ok()
    }

    /// Number of dates requested for the window.
    pub fn requested(&self) -> usize {
        self.requested
    }

    /// Whether the full requested history was available.
    pub fn is_complete(&self) -> bool {
        self.dates.len() >= self.requested
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Warning for a window shorter than requested.
    pub fn shortfall(&self, security_id: &SecurityId) -> Option<Warning> {
        (!self.is_complete()).then(|| Warning::InsufficientHistory {
            security_id: security_id.clone(),
            available: self.dates.len(),
            requested: self.requested,
        })
    }
}

/// Selects the trailing window of trading dates.
#[derive(Debug, Clone, Copy)]
pub struct TradingCalendar {
    trading_days: usize,
}

impl TradingCalendar {
    /// Create a selector keeping at most `trading_days` dates.
    pub fn new(trading_days: usize) -> Self {
        Self { trading_days }
    }

    pub fn trading_days(&self) -> usize {
        self.trading_days
    }

    /// Select the most recent distinct dates present in `ticks`.
    pub fn select(&self, ticks: &[Tick]) -> TradingWindow {
        let distinct: BTreeSet<NaiveDate> = ticks.iter().map(|t| t.date).collect();
        let skip = distinct.len().saturating_sub(self.trading_days);

        TradingWindow {
            dates: distinct.into_iter().skip(skip).collect(),
            requested: self.trading_days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bounds_core::time_of_day;

    fn tick_on(day: u32) -> Tick {
        Tick {
            security_id: SecurityId::canonicalize("1").unwrap(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            time: time_of_day(9, 31, 0),
            open_price: 10.0,
            close_price: 10.0,
        }
    }

    #[test]
    fn test_keeps_most_recent() {
        // 20 days, shuffled and duplicated
        let mut ticks: Vec<Tick> = (1..=20).rev().map(tick_on).collect();
        ticks.extend((1..=20).map(tick_on));

        let window = TradingCalendar::new(14).select(&ticks);
        assert_eq!(window.len(), 14);
        assert!(window.is_complete());
        assert_eq!(window.dates()[0], NaiveDate::from_ymd_opt(2024, 1, 7).unwrap());
        assert_eq!(window.latest(), NaiveDate::from_ymd_opt(2024, 1, 20));
        assert!(window.dates().windows(2).all(|w| w[0] < w[1]));
        assert!(!window.contains(NaiveDate::from_ymd_opt(2024, 1, 6).unwrap()));
    }

    #[test]
    fn test_short_history() {
        let ticks: Vec<Tick> = (1..=5).map(tick_on).collect();
        let window = TradingCalendar::new(14).select(&ticks);
        assert_eq!(window.len(), 5);

        let id = SecurityId::canonicalize("1").unwrap();
        match window.shortfall(&id) {
            Some(Warning::InsufficientHistory {
                available,
                requested,
                ..
            }) => {
                assert_eq!(available, 5);
                assert_eq!(requested, 14);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_empty() {
        let window = TradingCalendar::new(14).select(&[]);
        assert!(window.is_empty());
        assert!(window.latest().is_none());
        assert!(window.shortfall(&SecurityId::canonicalize("1").unwrap()).is_some());
    }
}
