//! Command-line arguments.

use bounds_batch::{BatchRequest, SecuritySelector};
use bounds_core::{Config, Result};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "price-bounds")]
#[command(about = "Generate per-minute lower/upper price bounds from intraday tick history")]
pub struct Args {
    /// Tick table (CSV); looked up under the data directory if not found
    #[arg(value_name = "INFILE")]
    pub infile: PathBuf,

    /// Today's opening price, or a reference table mapping SecurityCode to OpenPrice
    #[arg(value_name = "OPEN_PRICE")]
    pub open_price: String,

    /// Security code to process, or ALL
    #[arg(short, long, value_name = "CODE|ALL")]
    pub security: SecuritySelector,

    /// Output path (single security only)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Fallback directory for input files
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Directory for default-named outputs
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Decimal places of the bounds (defaults by input layout)
    #[arg(short, long)]
    pub precision: Option<u32>,

    /// Number of trailing trading days
    #[arg(long)]
    pub window_days: Option<usize>,

    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write a JSON run report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl Args {
    /// Configuration from the file (if any) with flag overrides applied.
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_file(path)?,
            None => Config::default(),
        };

        if let Some(dir) = &self.data_dir {
            config.io.data_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.io.output_dir = dir.clone();
        }
        if let Some(precision) = self.precision {
            config.bounds.precision = Some(precision);
        }
        if let Some(days) = self.window_days {
            config.window.trading_days = days;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn request(&self) -> BatchRequest {
        BatchRequest {
            input: self.infile.clone(),
            open_price: self.open_price.clone(),
            selector: self.security.clone(),
            output: self.output.clone(),
        }
    }
}
