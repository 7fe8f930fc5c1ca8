//! Core types and configuration for the price bounds engine.
//!
//! This crate provides shared types used across all other crates:
//! - Canonical tick, profile and boundary types
//! - Configuration structures
//! - Common error types and non-fatal diagnostics

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod types;

pub use config::Config;
pub use diagnostics::{Diagnostics, Warning};
pub use error::{Error, Result};
pub use types::*;
