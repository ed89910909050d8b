//! Error types for the seriescast pipeline.

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur while loading, forecasting or assembling a report.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// None of the supported text encodings could decode the input.
    #[error("could not decode input with any of: {tried}")]
    Encoding { tried: String },

    /// Missing or unparseable date column, or an unknown/non-numeric column.
    #[error("schema error: {0}")]
    Schema(String),

    /// Request parameters out of range (horizon, strategy name).
    #[error("validation error: {0}")]
    Validation(String),

    /// Min-max scaling is undefined for a constant column.
    #[error("column '{column}' has zero range (all values equal {value})")]
    DegenerateRange { column: String, value: f64 },

    /// Every requested strategy failed.
    #[error("no forecast available: {0}")]
    NoForecastAvailable(String),

    /// Positionally aligned arrays disagree in length or axis.
    #[error("alignment error: {what} has {got} entries, expected {expected}")]
    Alignment {
        what: String,
        expected: usize,
        got: usize,
    },

    /// Reading the input failed.
    #[error("i/o error: {0}")]
    Io(String),

    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Timestamp-related error.
    #[error("timestamp error: {0}")]
    TimestampError(String),

    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// Computation error (e.g., numerical issues).
    #[error("computation error: {0}")]
    ComputationError(String),
}

impl ForecastError {
    /// Whether the error is caused by the caller's request or data rather
    /// than by an internal contract violation.
    pub fn is_user_facing(&self) -> bool {
        !matches!(
            self,
            ForecastError::Alignment { .. } | ForecastError::DimensionMismatch { .. }
        )
    }
}

impl From<std::io::Error> for ForecastError {
    fn from(err: std::io::Error) -> Self {
        ForecastError::Io(err.to_string())
    }
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::Schema(format!("malformed CSV: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = ForecastError::EmptyData;
        assert_eq!(err.to_string(), "empty input data");

        let err = ForecastError::InsufficientData { needed: 24, got: 5 };
        assert_eq!(err.to_string(), "insufficient data: need at least 24, got 5");

        let err = ForecastError::Validation("horizon must be between 1 and 120".to_string());
        assert_eq!(
            err.to_string(),
            "validation error: horizon must be between 1 and 120"
        );

        let err = ForecastError::DegenerateRange {
            column: "emissions".to_string(),
            value: 3.0,
        };
        assert_eq!(
            err.to_string(),
            "column 'emissions' has zero range (all values equal 3)"
        );

        let err = ForecastError::Alignment {
            what: "cluster labels".to_string(),
            expected: 36,
            got: 35,
        };
        assert_eq!(
            err.to_string(),
            "alignment error: cluster labels has 35 entries, expected 36"
        );
    }

    #[test]
    fn alignment_is_not_user_facing() {
        let err = ForecastError::Alignment {
            what: "anomaly labels".to_string(),
            expected: 2,
            got: 1,
        };
        assert!(!err.is_user_facing());
        assert!(ForecastError::Schema("x".into()).is_user_facing());
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ForecastError = io.into();
        assert!(matches!(err, ForecastError::Io(msg) if msg.contains("gone")));
    }

    #[test]
    fn errors_are_clonable_and_comparable() {
        let err1 = ForecastError::EmptyData;
        let err2 = err1.clone();
        assert_eq!(err1, err2);
    }
}
