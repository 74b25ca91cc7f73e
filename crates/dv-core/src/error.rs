//! Error types for dagviolations

use thiserror::Error;

/// dagviolations error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration or input data
    #[error("Validation error: {0}")]
    Validation(String),

    /// Numerical failure (singular design, empty strata, ...)
    #[error("Computation error: {0}")]
    Computation(String),

    /// The causal graph does not admit the requested estimand
    #[error("Identification error: {0}")]
    Identification(String),

    /// Malformed identifier or delimited input
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
