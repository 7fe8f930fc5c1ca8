//! Error types for the price bounds engine.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the price bounds engine.
///
/// Every variant is fatal for the run. Recoverable conditions are reported as
/// [`crate::diagnostics::Warning`] instead.
#[derive(Error, Debug)]
pub enum Error {
    /// Neither the given input path nor its data-directory fallback exists.
    #[error("Input file not found: {}", .0.display())]
    InputFileNotFound(PathBuf),

    /// The tick table matches neither supported column layout.
    #[error("Schema error: {0}")]
    Schema(String),

    /// Open-price argument is neither a number nor a readable table.
    #[error("Open price reference not found: {0}")]
    ReferenceFileNotFound(String),

    /// An explicitly requested security is absent from the input data.
    #[error("Security {0} not found in input data")]
    SecurityNotFound(String),

    /// A security code that cannot be canonicalized to six digits.
    #[error("Invalid security code: {0:?}")]
    InvalidSecurityCode(String),

    /// Data error (unparseable or missing field values).
    #[error("Data error: {0}")]
    Data(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading/writing error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a schema error.
    pub fn schema(msg: impl Into<String>) -> Self {
        Error::Schema(msg.into())
    }

    /// Create a data error.
    pub fn data(msg: impl Into<String>) -> Self {
        Error::Data(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }
}
