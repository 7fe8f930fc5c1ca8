//! Bounds computation for the price bounds engine.
//!
//! This crate handles:
//! - Trailing trading-day window selection
//! - Per-minute volatility profiling
//! - Lower/upper bound generation with widening rounding
//! - The per-security pipeline combining the three

pub mod boundary;
pub mod calendar;
pub mod engine;
pub mod volatility;

pub use boundary::BoundaryGenerator;
pub use calendar::{TradingCalendar, TradingWindow};
pub use engine::{BoundsEngine, SecurityBounds};
pub use volatility::VolatilityProfiler;
