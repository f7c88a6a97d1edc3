//! Error types for storepulse-core

use thiserror::Error;

/// Main error type for the storepulse-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error outside of metric evaluation (open, migrate, insert)
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// The data store could not be reached or a metric query failed.
    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    /// A metric query or comparison was built with missing or contradictory parameters.
    #[error("invalid metric: {0}")]
    InvalidMetric(String),
}

impl Error {
    /// True for transient store failures that a widget renders as degraded.
    pub fn is_data_unavailable(&self) -> bool {
        matches!(self, Error::DataUnavailable(_))
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidMetric(message.into())
    }
}

/// Result type alias for storepulse-core
pub type Result<T> = std::result::Result<T, Error>;
