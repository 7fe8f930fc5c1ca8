//! Data ingestion and normalization for the price bounds engine.
//!
//! This crate handles:
//! - Schema detection and tick normalization
//! - Input path resolution (data-directory fallback)
//! - Opening price resolution (uniform price or reference table)

pub mod normalizer;
pub mod open_price;
pub mod paths;

pub use normalizer::{detect_layout, TickTable};
pub use open_price::{load_reference_table, read_reference_table, resolve_open_prices};
pub use paths::{resolve_input, resolve_with_fallback};
