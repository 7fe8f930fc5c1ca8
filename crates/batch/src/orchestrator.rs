//! Batch orchestration.
//!
//! Drives the per-security pipeline over every selected security. Only an
//! unknown requested code aborts the run; a security without an opening price
//! is skipped.

use crate::report::BatchReport;
use crate::selector::SecuritySelector;
use crate::writer::{plan_outputs, write_bounds_file};
use bounds_core::{Config, Error, OpenPriceSource, Result, SchemaLayout, SecurityId, Warning};
use bounds_features::{BoundsEngine, SecurityBounds};
use bounds_ingestion::{resolve_input, resolve_open_prices, TickTable};
use std::path::PathBuf;
use tracing::{info, warn};

/// Results of running the pipeline over a selection.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// Layout of the input table.
    pub layout: SchemaLayout,
    /// One entry per processed security, in processing order.
    pub results: Vec<SecurityBounds>,
    /// Securities skipped for lack of an opening price.
    pub skipped: Vec<Warning>,
}

/// Everything a file-based run needs.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    /// Tick table path (falls back to the data directory).
    pub input: PathBuf,
    /// Numeric opening price or path to a reference table.
    pub open_price: String,
    /// Securities to process.
    pub selector: SecuritySelector,
    /// Output path, honored only for a single processed security.
    pub output: Option<PathBuf>,
}

/// A completed file-based run.
#[derive(Debug, Clone)]
pub struct BatchRun {
    /// Resolved input path.
    pub input: PathBuf,
    pub outcome: BatchOutcome,
    /// Written files, paired with `outcome.results` by index.
    pub outputs: Vec<PathBuf>,
    pub report: BatchReport,
}

/// Batch runner.
pub struct BatchRunner {
    config: Config,
}

impl BatchRunner {
    /// Create a new runner.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve the securities to process.
    fn targets(&self, table: &TickTable, selector: &SecuritySelector) -> Result<Vec<SecurityId>> {
        match selector {
            SecuritySelector::All => Ok(table.security_ids().cloned().collect()),
            SecuritySelector::Single(id) if table.contains(id) => Ok(vec![id.clone()]),
            SecuritySelector::Single(id) => Err(Error::SecurityNotFound(id.to_string())),
        }
    }

    /// Run the pipeline over the selected securities of a table.
    pub fn run(
        &self,
        table: &TickTable,
        selector: &SecuritySelector,
        open_prices: &OpenPriceSource,
    ) -> Result<BatchOutcome> {
        let targets = self.targets(table, selector)?;
        let precision = self.config.bounds.precision_for(table.layout());
        let engine = BoundsEngine::new(&self.config, precision);

        let mut outcome = BatchOutcome {
            layout: table.layout(),
            results: Vec::with_capacity(targets.len()),
            skipped: Vec::new(),
        };

        for security_id in targets {
            let Some(today_open) = open_prices.price_for(&security_id) else {
                let warning = Warning::MissingOpenPrice { security_id };
                warn!(kind = warning.kind(), "{warning}");
                outcome.skipped.push(warning);
                continue;
            };

            let ticks = table.ticks_for(&security_id).unwrap_or_default();
            let bounds = engine.compute(&security_id, ticks, today_open);
            for warning in bounds.diagnostics.warnings() {
                warn!(kind = warning.kind(), "{warning}");
            }
            info!(
                security = %security_id,
                today_open,
                days = bounds.window.len(),
                minutes = bounds.rows.len(),
                "Bounds computed"
            );
            outcome.results.push(bounds);
        }

        info!(
            processed = outcome.results.len(),
            skipped = outcome.skipped.len(),
            "Batch complete"
        );
        Ok(outcome)
    }

    /// Load inputs from disk, run, and write one CSV per processed security.
    ///
    /// Every fatal condition is checked before the first file is written.
    pub fn execute(&self, request: &BatchRequest) -> Result<BatchRun> {
        let io = &self.config.io;
        let input = resolve_input(&request.input, &io.data_dir)?;
        let table = TickTable::from_path(&input)?;
        let open_prices = resolve_open_prices(&request.open_price, &io.data_dir)?;

        info!(
            input = %input.display(),
            layout = table.layout().name(),
            ticks = table.len(),
            selector = %request.selector,
            "Starting bounds run"
        );

        let outcome = self.run(&table, &request.selector, &open_prices)?;
        let outputs = plan_outputs(&outcome.results, request.output.as_deref(), io);
        for (bounds, path) in outcome.results.iter().zip(&outputs) {
            write_bounds_file(path, bounds)?;
            info!(security = %bounds.security_id, path = %path.display(), "Results saved");
        }

        let report = BatchReport::new(&outcome, &outputs);
        Ok(BatchRun {
            input,
            outcome,
            outputs,
            report,
        })
    }
}

impl Default for BatchRunner {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use bounds_core::config::IoConfig;
    use bounds_core::{time_of_day, Tick};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;
    use std::fmt::Write as _;
    use std::path::Path;

    fn id(raw: &str) -> SecurityId {
        SecurityId::canonicalize(raw).unwrap()
    }

    /// `days` flat sessions per code in the combined-datetime layout.
    fn combined_csv(codes: &[&str], days: u32) -> String {
        let mut csv = String::from("TimeStamp,SecurityCode,OpenPrice,ClosePrice\n");
        for code in codes {
            for day in 1..=days {
                for (time, close) in [("09:31:00", "10.00"), ("10:00:00", "10.10"), ("15:00:00", "10.00")] {
                    writeln!(csv, "2024-01-{day:02} {time},{code},10.00,{close}").unwrap();
                }
            }
        }
        csv
    }

    fn runner_in(dir: &Path) -> BatchRunner {
        let mut config = Config::default();
        config.io = IoConfig {
            data_dir: dir.join("data"),
            output_dir: dir.join("out"),
            ..IoConfig::default()
        };
        BatchRunner::new(config)
    }

    fn table(codes: &[&str], days: u32) -> TickTable {
        TickTable::from_reader(combined_csv(codes, days).as_bytes()).unwrap()
    }

    #[test]
    fn test_all_skips_missing_open_price() {
        let table = table(&["1", "2", "3"], 14);
        let mut prices = BTreeMap::new();
        prices.insert(id("1"), 10.0);
        prices.insert(id("3"), 10.0);

        let outcome = BatchRunner::default()
            .run(&table, &SecuritySelector::All, &OpenPriceSource::PerSecurity(prices))
            .unwrap();

        let processed: Vec<&str> = outcome.results.iter().map(|b| b.security_id.as_str()).collect();
        assert_eq!(processed, vec!["000001", "000003"]);
        assert_eq!(
            outcome.skipped,
            vec![Warning::MissingOpenPrice { security_id: id("2") }]
        );
    }

    #[test]
    fn test_single_not_found() {
        let table = table(&["1"], 3);
        let err = BatchRunner::default()
            .run(
                &table,
                &SecuritySelector::Single(id("999999")),
                &OpenPriceSource::Uniform(10.0),
            )
            .unwrap_err();
        assert!(matches!(err, Error::SecurityNotFound(code) if code == "999999"));
    }

    #[test]
    fn test_single_missing_open_price_skips() {
        let table = table(&["1"], 3);
        let outcome = BatchRunner::default()
            .run(
                &table,
                &SecuritySelector::Single(id("1")),
                &OpenPriceSource::PerSecurity(BTreeMap::new()),
            )
            .unwrap();
        assert!(outcome.results.is_empty());
        assert_eq!(
            outcome.skipped,
            vec![Warning::MissingOpenPrice { security_id: id("1") }]
        );
    }

    #[test]
    fn test_execute_single_missing_open_price_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("ticks.csv");
        std::fs::write(&input, combined_csv(&["1", "2"], 3)).unwrap();
        let prices = dir.path().join("open.csv");
        std::fs::write(&prices, "SecurityCode,OpenPrice\n2,10.0\n").unwrap();

        let run = runner_in(dir.path())
            .execute(&BatchRequest {
                input,
                open_price: prices.to_str().unwrap().to_string(),
                selector: SecuritySelector::Single(id("1")),
                output: None,
            })
            .unwrap();

        assert!(run.outputs.is_empty());
        assert_eq!(run.report.processed, 0);
        assert_eq!(run.report.skipped.len(), 1);
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_price_gap_does_not_stop_other_securities() {
        let mut csv = combined_csv(&["1", "2"], 2);
        csv.push_str("2024-01-02 10:30:00,2,10.00,\n");
        let table = TickTable::from_reader(csv.as_bytes()).unwrap();

        let outcome = BatchRunner::default()
            .run(&table, &SecuritySelector::All, &OpenPriceSource::Uniform(10.0))
            .unwrap();

        assert_eq!(outcome.results.len(), 2);
        for bounds in &outcome.results {
            assert_eq!(bounds.rows.len(), 3);
        }
    }

    #[test]
    fn test_precision_follows_layout() {
        let outcome = BatchRunner::default()
            .run(&table(&["1"], 2), &SecuritySelector::All, &OpenPriceSource::Uniform(10.0))
            .unwrap();
        assert_eq!(outcome.layout, SchemaLayout::CombinedDateTime);
        assert_eq!(outcome.results[0].precision, 3);
    }

    #[test]
    fn test_execute_all_with_reference_table() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        std::fs::create_dir_all(&data).unwrap();
        std::fs::write(data.join("ticks.csv"), combined_csv(&["1", "2", "3"], 14)).unwrap();
        std::fs::write(data.join("open.csv"), "SecurityCode,OpenPrice\n1,10.0\n3,10.0\n").unwrap();

        let run = runner_in(dir.path())
            .execute(&BatchRequest {
                input: PathBuf::from("ticks.csv"),
                open_price: "open.csv".to_string(),
                selector: SecuritySelector::All,
                output: Some(PathBuf::from("ignored.csv")),
            })
            .unwrap();

        assert_eq!(run.input, data.join("ticks.csv"));
        assert_eq!(run.outputs.len(), 2);
        assert_eq!(run.outcome.skipped.len(), 1);
        assert_eq!(run.report.processed, 2);

        let out = dir.path().join("out");
        assert!(out.join("recent_000001.csv").is_file());
        assert!(!out.join("recent_000002.csv").exists());
        assert!(out.join("recent_000003.csv").is_file());

        let content = std::fs::read_to_string(out.join("recent_000001.csv")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "TimeStamp,lowerbound,upperbound");
        assert_eq!(lines[1], "09:31:00,10.000,10.000");
        assert_eq!(lines[2], "10:00:00,9.900,10.100");
    }

    #[test]
    fn test_execute_unknown_security_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("ticks.csv");
        std::fs::write(&input, combined_csv(&["1"], 3)).unwrap();

        let err = runner_in(dir.path())
            .execute(&BatchRequest {
                input,
                open_price: "10".to_string(),
                selector: SecuritySelector::Single(id("999999")),
                output: None,
            })
            .unwrap_err();

        assert!(matches!(err, Error::SecurityNotFound(_)));
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_execute_single_honors_override() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("000001.csv");
        let mut csv = String::from(",Date,TimeStamp,SecurityID,OpenPrice,ClosePrice\n");
        let mut row = 0;
        for day in 1..=5 {
            for (time, close) in [("09:31:00", "10.00"), ("10:00:00", "10.20"), ("15:00:00", "10.40")] {
                writeln!(csv, "{row},202401{day:02},{time},1,10.00,{close}").unwrap();
                row += 1;
            }
        }
        std::fs::write(&input, csv).unwrap();
        let output = dir.path().join("custom.csv");

        let run = runner_in(dir.path())
            .execute(&BatchRequest {
                input,
                open_price: "10.00".to_string(),
                selector: "000001".parse().unwrap(),
                output: Some(output.clone()),
            })
            .unwrap();

        assert_eq!(run.outputs, vec![output.clone()]);
        let bounds = &run.outcome.results[0];
        assert_eq!(bounds.precision, 2);
        assert!(bounds.diagnostics.contains_kind("InsufficientHistory"));
        assert_eq!(bounds.references.prior_close, Some(10.4));
        assert_relative_eq!(
            bounds.profile.sigma_at(time_of_day(10, 0, 0)).unwrap(),
            0.02,
            epsilon = 1e-9
        );

        // 10:00: lower 10 * 0.98 = 9.80, upper 10.4 * 1.02 = 10.608 -> 10.61
        let content = std::fs::read_to_string(&output).unwrap();
        assert!(content.contains("10:00:00,9.80,10.61\n"));
    }

    #[test]
    fn test_run_is_idempotent() {
        let table = table(&["1", "2"], 20);
        let runner = BatchRunner::default();
        let a = runner
            .run(&table, &SecuritySelector::All, &OpenPriceSource::Uniform(10.03))
            .unwrap();
        let b = runner
            .run(&table, &SecuritySelector::All, &OpenPriceSource::Uniform(10.03))
            .unwrap();
        for (x, y) in a.results.iter().zip(&b.results) {
            assert_eq!(x.rows, y.rows);
        }
    }

    #[test]
    #[test]
    fn test_ticks_of_one_security_only() {
        // 000002 shares the date and minute; if its close leaked in, the mean
        // would be (0 + 1.0) / 2 = 0.5 over two samples.
        let table = TickTable::from_ticks(
            SchemaLayout::SeparateDateTime,
            [("1", 10.0), ("2", 20.0)].iter().map(|&(code, close)| Tick {
                security_id: id(code),
                date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                time: time_of_day(9, 31, 0),
                open_price: 10.0,
                close_price: close,
            }),
        );
        let outcome = BatchRunner::default()
            .run(&table, &SecuritySelector::Single(id("1")), &OpenPriceSource::Uniform(10.0))
            .unwrap();
        assert_eq!(outcome.results.len(), 1);
        let point = outcome.results[0].profile.points()[0];
        assert_eq!(point.sigma, 0.0);
        assert_eq!(point.samples, 1);
    }
}
