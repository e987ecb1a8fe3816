//! Error types for the data adapters.

use malaga_traits::MalagaError;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors raised while reading feature files or writing results.
#[derive(Debug, Error)]
pub enum DataError {
    /// DataFrame operation failed.
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    /// Filesystem access failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required column is absent.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// A value could not be interpreted.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<DataError> for MalagaError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::Io(e) => Self::Io(e),
            DataError::Json(e) => Self::Json(e),
            other => Self::DataFetch(other.to_string()),
        }
    }
}
