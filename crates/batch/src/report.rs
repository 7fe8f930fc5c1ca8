//! Batch run report.
//!
//! Summarizes what a run produced per security, for the operator console and
//! as a JSON artifact.

use crate::orchestrator::BatchOutcome;
use bounds_core::{BoundaryRow, Price, Result, SchemaLayout, SecurityId, Warning, TIME_FORMAT};
use bounds_features::SecurityBounds;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Per-security summary.
#[derive(Debug, Clone, Serialize)]
pub struct SecurityReport {
    pub security_id: SecurityId,
    /// Trading dates used.
    pub days: usize,
    /// Trading dates requested.
    pub requested_days: usize,
    pub today_open: Price,
    pub prior_close: Option<Price>,
    pub min_price: Price,
    pub max_price: Price,
    /// Number of bound rows.
    pub minutes: usize,
    pub precision: u32,
    /// Fewest contributing days at any minute.
    pub min_samples: Option<usize>,
    /// Row with the widest interval.
    pub widest: Option<BoundaryRow>,
    pub first: Option<BoundaryRow>,
    pub last: Option<BoundaryRow>,
    pub output: Option<PathBuf>,
    pub warnings: Vec<Warning>,
}

impl SecurityReport {
    /// Summarize one security's result.
    pub fn new(bounds: &SecurityBounds, output: Option<PathBuf>) -> Self {
        let widest = bounds
            .rows
            .iter()
            .copied()
            .max_by(|a, b| (a.upper - a.lower).total_cmp(&(b.upper - b.lower)));

        Self {
            security_id: bounds.security_id.clone(),
            days: bounds.window.len(),
            requested_days: bounds.window.requested(),
            today_open: bounds.references.today_open,
            prior_close: bounds.references.prior_close,
            min_price: bounds.references.min_price(),
            max_price: bounds.references.max_price(),
            minutes: bounds.rows.len(),
            precision: bounds.precision,
            min_samples: bounds.profile.points().iter().map(|p| p.samples).min(),
            widest,
            first: bounds.rows.first().copied(),
            last: bounds.rows.last().copied(),
            output,
            warnings: bounds.diagnostics.warnings().to_vec(),
        }
    }

    /// Human-readable summary lines.
    pub fn summary_lines(&self) -> Vec<String> {
        let p = self.precision as usize;
        let fmt_row = |row: &BoundaryRow| {
            format!(
                "{} [{:.*}, {:.*}]",
                row.time.format(TIME_FORMAT),
                p,
                row.lower,
                p,
                row.upper
            )
        };

        let mut lines = vec![
            format!("Security {}", self.security_id),
            format!("  Opening Price: {}", self.today_open),
            format!(
                "  Prior Close: {}",
                self.prior_close
                    .map_or_else(|| "n/a".to_string(), |c| c.to_string())
            ),
            format!("  Trading Days: {}/{}", self.days, self.requested_days),
            format!("  Minutes: {}", self.minutes),
        ];
        if let Some(row) = &self.first {
            lines.push(format!("  First: {}", fmt_row(row)));
        }
        if let Some(row) = &self.last {
            lines.push(format!("  Last: {}", fmt_row(row)));
        }
        if let Some(row) = &self.widest {
            lines.push(format!("  Widest: {}", fmt_row(row)));
        }
        if let Some(path) = &self.output {
            lines.push(format!("  Results saved to {}", path.display()));
        }
        lines
    }
}

/// Whole-run summary.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub layout: SchemaLayout,
    pub processed: usize,
    pub skipped: Vec<Warning>,
    pub securities: Vec<SecurityReport>,
}

impl BatchReport {
    /// Summarize an outcome; `outputs` pairs with `outcome.results` by index.
    pub fn new(outcome: &BatchOutcome, outputs: &[PathBuf]) -> Self {
        let securities = outcome
            .results
            .iter()
            .enumerate()
            .map(|(i, bounds)| SecurityReport::new(bounds, outputs.get(i).cloned()))
            .collect();

        Self {
            layout: outcome.layout,
            processed: outcome.results.len(),
            skipped: outcome.skipped.clone(),
            securities,
        }
    }

    /// Total warnings across processed and skipped securities.
    pub fn warning_count(&self) -> usize {
        self.skipped.len() + self.securities.iter().map(|s| s.warnings.len()).sum::<usize>()
    }

    /// Write the report as pretty JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
