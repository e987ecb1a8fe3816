//! Error types for the Malaga framework.
//!
//! This module defines the error type used throughout the Malaga workspace,
//! covering universe loading, label construction, model training and
//! inference, and the day-by-day simulation.

use crate::types::Date;
use thiserror::Error;

/// The main error type for Malaga operations.
#[derive(Debug, Error)]
pub enum MalagaError {
    /// The instrument set or date range produced no feature rows.
    #[error("Empty universe: {0}")]
    EmptyUniverse(String),

    /// No usable training rows, or the regression could not be fit.
    #[error("Training failed: {0}")]
    Training(String),

    /// The feature schema of a snapshot does not match the fitted model.
    #[error(
        "Inference failed{}: {reason}",
        .date.map(|d| format!(" on {d}")).unwrap_or_default()
    )]
    Inference {
        /// The simulated date, when known.
        date: Option<Date>,
        /// What did not match.
        reason: String,
    },

    /// A calendar date has no feature data. Recoverable: the date is skipped.
    #[error("No snapshot available for {0}")]
    MissingSnapshot(Date),

    /// Configuration values out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Error due to invalid or malformed data.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Error when a date is out of order or invalid.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// An operation was attempted in the wrong simulator state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Error fetching data from external sources.
    #[error("Data fetch error: {0}")]
    DataFetch(String),

    /// I/O error while reading or writing results.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),
}

impl MalagaError {
    /// Builds an inference error without date context.
    pub fn inference(reason: impl Into<String>) -> Self {
        Self::Inference {
            date: None,
            reason: reason.into(),
        }
    }

    /// Attaches the simulated date to an inference error.
    ///
    /// Other variants are returned unchanged.
    #[must_use]
    pub fn on_date(self, date: Date) -> Self {
        match self {
            Self::Inference { date: None, reason } => Self::Inference {
                date: Some(date),
                reason,
            },
            other => other,
        }
    }

    /// Whether the simulation may continue past this error.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::MissingSnapshot(_))
    }
}

impl From<String> for MalagaError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for MalagaError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

/// A specialized Result type for Malaga operations.
pub type Result<T> = std::result::Result<T, MalagaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MalagaError::Training("no labeled rows".to_string());
        assert_eq!(err.to_string(), "Training failed: no labeled rows");

        let err = MalagaError::EmptyUniverse("AAPL,MSFT".to_string());
        assert_eq!(err.to_string(), "Empty universe: AAPL,MSFT");
    }

    #[test]
    fn test_inference_display_with_and_without_date() {
        let err = MalagaError::inference("column count 3 != 4");
        assert_eq!(err.to_string(), "Inference failed: column count 3 != 4");

        let date = Date::from_ymd_opt(2024, 3, 1).unwrap();
        let err = err.on_date(date);
        assert_eq!(
            err.to_string(),
            "Inference failed on 2024-03-01: column count 3 != 4"
        );
    }

    #[test]
    fn test_on_date_keeps_existing_date() {
        let first = Date::from_ymd_opt(2024, 3, 1).unwrap();
        let second = Date::from_ymd_opt(2024, 3, 4).unwrap();
        let err = MalagaError::inference("x").on_date(first).on_date(second);
        assert!(matches!(err, MalagaError::Inference { date: Some(d), .. } if d == first));
    }

    #[test]
    fn test_recoverable() {
        let date = Date::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(MalagaError::MissingSnapshot(date).is_recoverable());
        assert!(!MalagaError::Training("x".into()).is_recoverable());
        assert!(!MalagaError::inference("x").is_recoverable());
    }

    #[test]
    fn test_error_from_str() {
        let err: MalagaError = "fail".into();
        assert!(matches!(err, MalagaError::Other(_)));
    }
}
