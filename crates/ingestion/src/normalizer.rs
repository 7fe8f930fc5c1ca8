//! Tick table normalization.
//!
//! Maps either supported raw CSV layout onto the canonical [`Tick`] shape.
//! The layout is detected once from the header row by column presence:
//! - `SecurityCode` present: combined `TimeStamp` datetime (`YYYY-MM-DD HH:MM:SS`)
//! - `SecurityID` present: separate `Date` (`YYYYMMDD`) and `TimeStamp` (`HH:MM:SS`)

use bounds_core::{Error, Result, SchemaLayout, SecurityId, Tick, DATE_FORMAT};
use chrono::{NaiveDate, NaiveTime, Timelike};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Columns required by the combined-datetime layout.
const COMBINED_COLUMNS: [&str; 4] = ["TimeStamp", "SecurityCode", "OpenPrice", "ClosePrice"];

/// Columns required by the separate-date-time layout.
const SEPARATE_COLUMNS: [&str; 5] = ["Date", "TimeStamp", "SecurityID", "OpenPrice", "ClosePrice"];

/// Row of a combined-datetime export.
#[derive(Debug, Deserialize)]
struct CombinedRow {
    #[serde(rename = "TimeStamp")]
    timestamp: String,
    #[serde(rename = "SecurityCode")]
    security_code: String,
    #[serde(rename = "OpenPrice", deserialize_with = "csv::invalid_option")]
    open_price: Option<f64>,
    #[serde(rename = "ClosePrice", deserialize_with = "csv::invalid_option")]
    close_price: Option<f64>,
}

/// Row of a separate-date-time export.
#[derive(Debug, Deserialize)]
struct SeparateRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "TimeStamp")]
    timestamp: String,
    #[serde(rename = "SecurityID")]
    security_id: String,
    #[serde(rename = "OpenPrice", deserialize_with = "csv::invalid_option")]
    open_price: Option<f64>,
    #[serde(rename = "ClosePrice", deserialize_with = "csv::invalid_option")]
    close_price: Option<f64>,
}

/// A raw row in one of the two supported layouts.
#[derive(Debug)]
enum RawTick {
    Combined(CombinedRow),
    Separate(SeparateRow),
}

impl RawTick {
    /// Deserialize a record according to the detected layout.
    fn from_record(
        layout: SchemaLayout,
        record: &StringRecord,
        headers: &StringRecord,
    ) -> std::result::Result<Self, csv::Error> {
        Ok(match layout {
            SchemaLayout::CombinedDateTime => RawTick::Combined(record.deserialize(Some(headers))?),
            SchemaLayout::SeparateDateTime => RawTick::Separate(record.deserialize(Some(headers))?),
        })
    }

    /// Convert to the canonical record.
    ///
    /// `Ok(None)` when either price is blank, unparseable or non-finite.
    fn into_tick(self) -> Result<Option<Tick>> {
        match self {
            RawTick::Combined(row) => {
                let (date, time) = split_combined(&row.timestamp).ok_or_else(|| {
                    Error::data(format!("unparseable TimeStamp {:?}", row.timestamp))
                })?;
                let security_id = SecurityId::canonicalize(&row.security_code)?;
                Ok(usable_prices(row.open_price, row.close_price).map(|(open, close)| Tick {
                    security_id,
                    date,
                    time,
                    open_price: open,
                    close_price: close,
                }))
            }
            RawTick::Separate(row) => {
                let date = parse_date(&row.date)
                    .ok_or_else(|| Error::data(format!("unparseable Date {:?}", row.date)))?;
                let time = parse_time(&row.timestamp).ok_or_else(|| {
                    Error::data(format!("unparseable TimeStamp {:?}", row.timestamp))
                })?;
                let security_id = SecurityId::canonicalize(&row.security_id)?;
                Ok(usable_prices(row.open_price, row.close_price).map(|(open, close)| Tick {
                    security_id,
                    date,
                    time,
                    open_price: open,
                    close_price: close,
                }))
            }
        }
    }
}

fn usable_prices(open: Option<f64>, close: Option<f64>) -> Option<(f64, f64)> {
    match (open, close) {
        (Some(open), Some(close)) if open.is_finite() && close.is_finite() => Some((open, close)),
        _ => None,
    }
}

/// Parse a date, ignoring separators (`20240105`, `2024-01-05`, `2024/01/05`).
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    NaiveDate::parse_from_str(&digits, DATE_FORMAT).ok()
}

/// Parse a minute-of-day, truncating fractional seconds.
fn parse_time(raw: &str) -> Option<NaiveTime> {
    let time = NaiveTime::parse_from_str(raw.trim(), "%H:%M:%S%.f").ok()?;
    time.with_nanosecond(0)
}

/// Split a combined datetime: the first 10 characters are the date, the
/// characters from offset 11 onward are the time.
fn split_combined(raw: &str) -> Option<(NaiveDate, NaiveTime)> {
    let raw = raw.trim();
    let date = parse_date(raw.get(..10)?)?;
    let time = parse_time(raw.get(11..)?)?;
    Some((date, time))
}

/// Detect the layout of a header row.
pub fn detect_layout(headers: &StringRecord) -> Result<SchemaLayout> {
    let has = |name: &str| headers.iter().any(|h| h == name);

    let (layout, required): (SchemaLayout, &[&str]) = if has("SecurityCode") {
        (SchemaLayout::CombinedDateTime, &COMBINED_COLUMNS)
    } else if has("SecurityID") {
        (SchemaLayout::SeparateDateTime, &SEPARATE_COLUMNS)
    } else {
        return Err(Error::schema(
            "tick table has neither a SecurityCode nor a SecurityID column",
        ));
    };

    if let Some(missing) = required.iter().find(|c| !has(c)) {
        return Err(Error::schema(format!(
            "{} layout is missing column {missing}",
            layout.name()
        )));
    }

    Ok(layout)
}

/// Strip a UTF-8 byte-order mark and surrounding whitespace from header names.
fn clean_headers(headers: &StringRecord) -> StringRecord {
    headers
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim())
        .collect()
}

/// Normalized ticks grouped by security, in first-appearance order.
#[derive(Debug, Clone)]
pub struct TickTable {
    layout: SchemaLayout,
    groups: Vec<(SecurityId, Vec<Tick>)>,
    index: HashMap<SecurityId, usize>,
}

impl TickTable {
    /// Build a table from already-canonical ticks.
    pub fn from_ticks(layout: SchemaLayout, ticks: impl IntoIterator<Item = Tick>) -> Self {
        let mut table = Self {
            layout,
            groups: Vec::new(),
            index: HashMap::new(),
        };
        for tick in ticks {
            table.push(tick);
        }
        table
    }

    fn push(&mut self, tick: Tick) {
        let slot = match self.index.get(&tick.security_id) {
            Some(&slot) => slot,
            None => {
                self.groups.push((tick.security_id.clone(), Vec::new()));
                let slot = self.groups.len() - 1;
                self.index.insert(tick.security_id.clone(), slot);
                slot
            }
        };
        self.groups[slot].1.push(tick);
    }

    /// Read and normalize a CSV tick table.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
        let headers = clean_headers(reader.headers()?);
        let layout = detect_layout(&headers)?;

        if headers.get(0).is_some_and(|h| h.is_empty() || h.starts_with("Unnamed")) {
            debug!("Dropping unnamed leading index column");
        }

        let mut table = Self::from_ticks(layout, std::iter::empty());
        let mut gaps = 0usize;
        for (i, record) in reader.records().enumerate() {
            let row = i + 1;
            let record = record?;
            let tick = RawTick::from_record(layout, &record, &headers)
                .map_err(|e| Error::data(format!("row {row}: {e}")))?
                .into_tick()
                .map_err(|e| match e {
                    Error::Data(msg) => Error::data(format!("row {row}: {msg}")),
                    other => other,
                })?;
            match tick {
                Some(tick) => table.push(tick),
                None => gaps += 1,
            }
        }

        if gaps > 0 {
            warn!(rows = gaps, "Dropped rows without a usable price");
        }

        debug!(
            layout = layout.name(),
            ticks = table.len(),
            securities = table.groups.len(),
            "Normalized tick table"
        );
        Ok(table)
    }

    /// Read and normalize a CSV tick table from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(file)
    }

    /// Detected raw layout.
    pub fn layout(&self) -> SchemaLayout {
        self.layout
    }

    /// Distinct securities in first-appearance order.
    pub fn security_ids(&self) -> impl Iterator<Item = &SecurityId> {
        self.groups.iter().map(|(id, _)| id)
    }

    /// Check whether a security is present.
    pub fn contains(&self, security_id: &SecurityId) -> bool {
        self.index.contains_key(security_id)
    }

    /// Ticks of one security, in input order.
    pub fn ticks_for(&self, security_id: &SecurityId) -> Option<&[Tick]> {
        self.index
            .get(security_id)
            .map(|&slot| self.groups[slot].1.as_slice())
    }

    /// All ticks, grouped by security.
    pub fn ticks(&self) -> impl Iterator<Item = &Tick> {
        self.groups.iter().flat_map(|(_, ticks)| ticks.iter())
    }

    /// Total number of ticks.
    pub fn len(&self) -> usize {
        self.groups.iter().map(|(_, ticks)| ticks.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
