//! Core data types for the price bounds engine.

use crate::error::{Error, Result};
use chrono::{NaiveDate, NaiveTime};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Price type.
pub type Price = f64;

/// Rendering of a trading date (`YYYYMMDD`).
pub const DATE_FORMAT: &str = "%Y%m%d";

/// Rendering of a minute-of-day (`HH:MM:SS`).
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Build a minute-of-day; out-of-range components give midnight.
#[inline]
pub fn time_of_day(hour: u32, minute: u32, second: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, second).unwrap_or_default()
}

/// Exchange security code, always six zero-padded ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SecurityId(String);

impl SecurityId {
    /// Canonical width of a security code.
    pub const WIDTH: usize = 6;

    /// Canonicalize a raw code such as `"1"`, `" 600000 "` or `"1.0"`.
    ///
    /// Integer-valued decimal renderings (as written by spreadsheet exports)
    /// are accepted; anything else that is not 1 to 6 digits is rejected.
    pub fn canonicalize(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let digits = match trimmed.split_once('.') {
            Some((int, frac)) if !frac.is_empty() && frac.bytes().all(|b| b == b'0') => int,
            Some(_) => return Err(Error::InvalidSecurityCode(raw.to_string())),
            None => trimmed,
        };

        if digits.is_empty()
            || digits.len() > Self::WIDTH
            || !digits.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(Error::InvalidSecurityCode(raw.to_string()));
        }

        Ok(Self(format!("{:0>width$}", digits, width = Self::WIDTH)))
    }

    /// The canonical six-digit code.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SecurityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SecurityId {
    type Error = Error;

    fn try_from(raw: String) -> Result<Self> {
        Self::canonicalize(&raw)
    }
}

impl From<SecurityId> for String {
    fn from(id: SecurityId) -> Self {
        id.0
    }
}

/// Column layout of a raw tick table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaLayout {
    /// Combined `TimeStamp` datetime plus `SecurityCode` (multi-security exports).
    CombinedDateTime,
    /// Separate `Date` / `TimeStamp` plus `SecurityID` (legacy exports).
    SeparateDateTime,
}

impl SchemaLayout {
    /// Bound precision used when none is configured.
    pub fn default_precision(self) -> u32 {
        match self {
            SchemaLayout::CombinedDateTime => 3,
            SchemaLayout::SeparateDateTime => 2,
        }
    }

    /// Short human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            SchemaLayout::CombinedDateTime => "combined-datetime",
            SchemaLayout::SeparateDateTime => "separate-date-time",
        }
    }
}

/// A canonical one-minute record for a security.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    /// Canonical security code.
    pub security_id: SecurityId,
    /// Trading date.
    pub date: NaiveDate,
    /// Minute-of-day.
    pub time: NaiveTime,
    /// Open price of the minute.
    pub open_price: Price,
    /// Close price of the minute.
    pub close_price: Price,
}

impl Tick {
    /// Absolute relative deviation of this minute's close from `daily_open`.
    ///
    /// `None` when the baseline is not a positive price.
    #[inline]
    pub fn movement(&self, daily_open: Price) -> Option<f64> {
        if daily_open > 0.0 {
            Some((self.close_price / daily_open - 1.0).abs())
        } else {
            None
        }
    }
}

/// Mean movement at one minute-of-day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SigmaPoint {
    /// Minute-of-day.
    pub time: NaiveTime,
    /// Mean absolute movement across the window.
    pub sigma: f64,
    /// Number of trading days contributing to the mean.
    pub samples: usize,
}

/// Per-minute volatility profile, strictly ascending by minute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SigmaProfile {
    points: Vec<SigmaPoint>,
}

impl SigmaProfile {
    /// Build a profile from points keyed by minute.
    pub fn from_points(points: BTreeMap<NaiveTime, SigmaPoint>) -> Self {
        Self {
            points: points.into_values().collect(),
        }
    }

    /// All points, ascending by minute.
    pub fn points(&self) -> &[SigmaPoint] {
        &self.points
    }

    /// Look up the sigma at a minute.
    pub fn sigma_at(&self, time: NaiveTime) -> Option<f64> {
        self.points
            .binary_search_by_key(&time, |p| p.time)
            .ok()
            .map(|i| self.points[i].sigma)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Lower/upper bound for one minute-of-day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundaryRow {
    /// Minute-of-day.
    pub time: NaiveTime,
    /// Lower bound (floored).
    pub lower: Price,
    /// Upper bound (ceiled).
    pub upper: Price,
}

/// Where each security's opening price for today comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OpenPriceSource {
    /// One price for every security in the run.
    Uniform(Price),
    /// Per-security prices loaded from a reference table.
    PerSecurity(BTreeMap<SecurityId, Price>),
}

impl OpenPriceSource {
    /// Today's opening price for a security, if known.
    pub fn price_for(&self, security_id: &SecurityId) -> Option<Price> {
        match self {
            OpenPriceSource::Uniform(price) => Some(*price),
            OpenPriceSource::PerSecurity(prices) => prices.get(security_id).copied(),
        }
    }

    pub fn is_uniform(&self) -> bool {
        matches!(self, OpenPriceSource::Uniform(_))
    }
}

/// The two reference prices anchoring the bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferencePrices {
    /// Today's opening price.
    pub today_open: Price,
    /// Prior session's closing price, if any history exists.
    pub prior_close: Option<Price>,
}

impl ReferencePrices {
    pub fn new(today_open: Price, prior_close: Option<Price>) -> Self {
        Self {
            today_open,
            prior_close,
        }
    }

    /// Prior close, degrading to today's open when there is no history.
    #[inline]
    fn effective_prior_close(&self) -> Price {
        self.prior_close.unwrap_or(self.today_open)
    }

    /// Smaller reference, anchoring the lower bound.
    pub fn min_price(&self) -> Price {
        OrderedFloat(self.today_open)
            .min(OrderedFloat(self.effective_prior_close()))
            .into_inner()
    }

    /// Larger reference, anchoring the upper bound.
    pub fn max_price(&self) -> Price {
        OrderedFloat(self.today_open)
            .max(OrderedFloat(self.effective_prior_close()))
            .into_inner()
    }
}
