//! Error types for the tickbar resampling engine.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the resampling engine.
///
/// Only schema and context errors are fatal for a batch; per-record time
/// failures and data-quality findings are counted in the batch diagnostics
/// instead of raised.
#[derive(Error, Debug)]
pub enum Error {
    /// A required canonical field could not be resolved from any recognized
    /// source column. Rejects the whole batch.
    #[error("Schema error: missing required field `{0}`")]
    MissingRequiredField(&'static str),

    /// A time literal matched none of the recognized shapes.
    #[error("Time format error: unrecognized literal `{0}`")]
    TimeFormat(String),

    /// Batch context could not be established.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid or inconsistent data.
    #[error("Data error: {0}")]
    Data(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a time format error.
    pub fn time_format(literal: impl Into<String>) -> Self {
        Error::TimeFormat(literal.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a data error.
    pub fn data(msg: impl Into<String>) -> Self {
        Error::Data(msg.into())
    }
}
