//! Resolution of today's opening price.
//!
//! The open-price argument is either a number applied to every security, or a
//! path to a `SecurityCode,OpenPrice` reference table.

use crate::paths::resolve_with_fallback;
use bounds_core::{Error, OpenPriceSource, Price, Result, SecurityId};
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct ReferenceRow {
    #[serde(rename = "SecurityCode")]
    security_code: String,
    #[serde(rename = "OpenPrice")]
    open_price: f64,
}

fn check_price(price: f64, what: &str) -> Result<Price> {
    if price.is_finite() && price > 0.0 {
        Ok(price)
    } else {
        Err(Error::data(format!("{what}: opening price must be positive, got {price}")))
    }
}

/// Interpret the user-supplied open-price argument.
pub fn resolve_open_prices(arg: &str, data_dir: &Path) -> Result<OpenPriceSource> {
    if let Ok(price) = arg.trim().parse::<f64>() {
        if price.is_finite() {
            return Ok(OpenPriceSource::Uniform(check_price(price, "argument")?));
        }
    }

    let path = resolve_with_fallback(Path::new(arg), data_dir)
        .ok_or_else(|| Error::ReferenceFileNotFound(arg.to_string()))?;
    let prices = load_reference_table(&path)?;
    Ok(OpenPriceSource::PerSecurity(prices))
}

/// Load a reference table from disk.
pub fn load_reference_table(path: &Path) -> Result<BTreeMap<SecurityId, Price>> {
    let file = File::open(path)?;
    let prices = read_reference_table(file)?;
    debug!(path = %path.display(), securities = prices.len(), "Loaded opening prices");
    Ok(prices)
}

/// Parse a `SecurityCode,OpenPrice` table. A repeated code keeps its last value.
pub fn read_reference_table<R: Read>(reader: R) -> Result<BTreeMap<SecurityId, Price>> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let headers: csv::StringRecord = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}'))
        .collect();

    for column in ["SecurityCode", "OpenPrice"] {
        if !headers.iter().any(|h| h == column) {
            return Err(Error::schema(format!(
                "open price table is missing column {column}"
            )));
        }
    }

    let mut prices = BTreeMap::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let row: ReferenceRow = record
            .deserialize(Some(&headers))
            .map_err(|e| Error::data(format!("open price table row {}: {e}", i + 1)))?;
        let security_id = SecurityId::canonicalize(&row.security_code)?;
        let price = check_price(row.open_price, security_id.as_str())?;

        if let Some(previous) = prices.insert(security_id.clone(), price) {
            warn!(
                security = %security_id,
                previous,
                price,
                "Duplicate opening price, keeping the last one"
            );
        }
    }

    Ok(prices)
}
