//! CSV output of per-security bounds.

use bounds_core::config::IoConfig;
use bounds_core::{Result, SecurityId, TIME_FORMAT};
use bounds_features::SecurityBounds;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Header of every output file.
pub const OUTPUT_HEADER: [&str; 3] = ["TimeStamp", "lowerbound", "upperbound"];

/// Output path derived from a security code.
pub fn default_output_path(security_id: &SecurityId, io: &IoConfig) -> PathBuf {
    io.output_dir
        .join(format!("{}{}.csv", io.output_prefix, security_id))
}

/// Output path for each result.
///
/// The override is honored only when exactly one security was processed.
pub fn plan_outputs(
    results: &[SecurityBounds],
    override_path: Option<&Path>,
    io: &IoConfig,
) -> Vec<PathBuf> {
    match (override_path, results) {
        (Some(path), [_]) => vec![path.to_path_buf()],
        (override_path, _) => {
            if let Some(path) = override_path {
                warn!(
                    path = %path.display(),
                    securities = results.len(),
                    "Output override ignored for multi-security run"
                );
            }
            results
                .iter()
                .map(|bounds| default_output_path(&bounds.security_id, io))
                .collect()
        }
    }
}

/// Write one security's bounds as CSV.
pub fn write_bounds<W: Write>(writer: W, bounds: &SecurityBounds) -> Result<()> {
    let precision = bounds.precision as usize;
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(OUTPUT_HEADER)?;
    for row in &bounds.rows {
        writer.write_record([
            row.time.format(TIME_FORMAT).to_string(),
            format!("{:.*}", precision, row.lower),
            format!("{:.*}", precision, row.upper),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Write one security's bounds to a file, creating parent directories.
pub fn write_bounds_file(path: &Path, bounds: &SecurityBounds) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = fs::File::create(path)?;
    write_bounds(file, bounds)
}
