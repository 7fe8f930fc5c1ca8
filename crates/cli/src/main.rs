//! price-bounds CLI - per-minute price bounds from intraday tick history

mod args;

use anyhow::Context;
use args::Args;
use bounds_batch::{BatchReport, BatchRunner};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log filter used when `RUST_LOG` is unset: every workspace crate at info.
const DEFAULT_LOG_FILTER: &str =
    "price_bounds=info,bounds_batch=info,bounds_ingestion=info,bounds_features=info";

fn main() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    run(&Args::parse())?;
    Ok(())
}

/// Execute one invocation. An `Err` here becomes a non-zero exit status.
fn run(args: &Args) -> anyhow::Result<BatchReport> {
    let config = args.load_config().context("Invalid configuration")?;
    let runner = BatchRunner::new(config);
    let run = runner.execute(&args.request())?;

    println!("Stock Analysis for {}", run.input.display());
    for security in &run.report.securities {
        for line in security.summary_lines() {
            println!("{line}");
        }
    }
    for warning in &run.report.skipped {
        println!("Skipped {warning}");
    }

    if let Some(path) = &args.report {
        run.report
            .write_json(path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!(path = %path.display(), "Report written");
    }

    info!(
        processed = run.report.processed,
        skipped = run.report.skipped.len(),
        warnings = run.report.warning_count(),
        "Done"
    );
    Ok(run.report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bounds_core::Error;
    use std::fmt::Write as _;
    use std::path::Path;

    fn write_ticks(dir: &Path, codes: &[&str]) {
        let mut csv = String::from("TimeStamp,SecurityCode,OpenPrice,ClosePrice\n");
        for code in codes {
            for day in 1..=3 {
                for (time, close) in [("09:31:00", "10.00"), ("10:00:00", "10.10"), ("15:00:00", "10.00")] {
                    writeln!(csv, "2024-01-{day:02} {time},{code},10.00,{close}").unwrap();
                }
            }
        }
        std::fs::write(dir.join("ticks.csv"), csv).unwrap();
        std::fs::write(dir.join("open.csv"), "SecurityCode,OpenPrice\n1,10.0\n3,10.0\n").unwrap();
    }

    fn args(dir: &Path, security: &str) -> Args {
        Args::try_parse_from([
            "price-bounds",
            "ticks.csv",
            "open.csv",
            "--security",
            security,
            "--data-dir",
            dir.to_str().unwrap(),
            "--output-dir",
            dir.join("out").to_str().unwrap(),
            "--report",
            dir.join("report.json").to_str().unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn test_all_with_missing_mapping_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        write_ticks(dir.path(), &["1", "2", "3"]);

        let report = run(&args(dir.path(), "ALL")).unwrap();

        assert_eq!(report.processed, 2);
        assert_eq!(report.skipped.len(), 1);
        assert!(dir.path().join("out/recent_000001.csv").is_file());
        assert!(dir.path().join("out/recent_000003.csv").is_file());
        assert!(!dir.path().join("out/recent_000002.csv").exists());
        assert!(dir.path().join("report.json").is_file());
    }

    #[test]
    fn test_unknown_security_fails() {
        let dir = tempfile::tempdir().unwrap();
        write_ticks(dir.path(), &["1"]);

        let err = run(&args(dir.path(), "999999")).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::SecurityNotFound(code)) if code == "999999"
        ));
        assert!(!dir.path().join("out").exists());
        assert!(!dir.path().join("report.json").exists());
    }

    #[test]
    fn test_default_filter_covers_workspace_crates() {
        assert!(EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
        for target in ["bounds_batch", "bounds_ingestion", "bounds_features"] {
            assert!(DEFAULT_LOG_FILTER.contains(&format!("{target}=info")));
        }
    }
}
