//! Batch orchestration for the price bounds engine.
//!
//! This crate provides:
//! - Security selection (`ALL` or one code)
//! - The skip-or-abort batch loop over a tick table
//! - CSV output of per-minute bounds
//! - Operator summaries and JSON run reports

pub mod orchestrator;
pub mod report;
pub mod selector;
pub mod writer;

pub use orchestrator::{BatchOutcome, BatchRequest, BatchRun, BatchRunner};
pub use report::{BatchReport, SecurityReport};
pub use selector::SecuritySelector;
pub use writer::{default_output_path, plan_outputs, write_bounds, write_bounds_file};
