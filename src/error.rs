//! Error types for lcfold.

use thiserror::Error;

/// Result type for period search and folding operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the period search pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed, empty or mismatched time/flux arrays, or an invalid setting.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Peak detection left no usable candidate frequency.
    #[error("no period found: {0}")]
    NoPeriodFound(String),

    /// Too few samples for the requested stage.
    #[error("insufficient data: need at least {needed} samples, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Malformed lightcurve or folded-lightcurve text.
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidInput(message.into())
    }
}
