//! Configuration error types.

use thiserror::Error;

use crate::column::Column;

/// Errors raised while validating pipeline configuration.
///
/// All of these are fatal and are reported before any data is read.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Column name that is not part of the visit schema.
    #[error("unknown column '{name}'")]
    UnknownColumn { name: String },

    /// The same column was listed twice in `required_columns`.
    #[error("required column '{column}' is listed more than once")]
    DuplicateRequiredColumn { column: Column },

    /// A rate threshold outside `[0, 1]` or not a number.
    #[error("{key} must be a rate between 0 and 1, got {value}")]
    RateOutOfRange { key: &'static str, value: f64 },

    /// A threshold that must be a finite, non-negative number.
    #[error("{key} must be a finite non-negative number, got {value}")]
    InvalidThreshold { key: &'static str, value: f64 },

    /// The watermark column cannot be compared against a timestamp.
    #[error("watermark column '{column}' must be a date or timestamp column")]
    NonTemporalWatermark { column: Column },

    /// Any other malformed value.
    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

/// Result type for configuration validation.
pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::RateOutOfRange {
            key: "dq.fail_on.required_null_rate_gt",
            value: 1.5,
        };
        assert_eq!(
            err.to_string(),
            "dq.fail_on.required_null_rate_gt must be a rate between 0 and 1, got 1.5"
        );
    }
}
