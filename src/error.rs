//! Error types for the store

use std::path::PathBuf;

use thiserror::Error;

use crate::ingestion::protocol::ParseError;

/// Main error type for the store
#[derive(Error, Debug)]
pub enum Error {
    /// Exposition text could not be parsed; the load was aborted
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Operation referenced a metric name the store does not hold
    #[error("Metric not found: {0}")]
    NotFound(String),

    /// File open/read/write failure
    #[error("IO error on {}: {}", .path.display(), .source)]
    Io {
        /// File the operation was working on
        path: PathBuf,
        /// Underlying cause
        #[source]
        source: std::io::Error,
    },

    /// Writer or reader failure not tied to a named file
    #[error("IO error: {0}")]
    Stream(#[from] std::io::Error),

    /// Invalid input such as a bad matcher regex or duration
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Wrap an IO error with the path it occurred on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

/// Validation errors
///
/// Raised by input checks that have a documented fallback at the call site
/// (e.g. backfill step durations) as well as strict checks.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Value is out of allowed range
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Field name being validated
        field: String,
        /// The invalid value
        value: String,
        /// Minimum allowed value
        min: String,
        /// Maximum allowed value
        max: String,
    },

    /// Invalid format
    #[error("Invalid format for {field}: {message}")]
    InvalidFormat {
        /// Field name being validated
        field: String,
        /// Description of the format error
        message: String,
    },

    /// Regex pattern failed to compile
    #[error("Invalid regex '{pattern}': {message}")]
    InvalidRegex {
        /// The offending pattern
        pattern: String,
        /// Compiler message
        message: String,
    },
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Error::Validation(e.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::protocol::ParseErrorKind;

    #[test]
    fn test_io_error_mentions_path() {
        let err = Error::io(
            "/tmp/missing.prom",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/tmp/missing.prom"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_parse_error_converts() {
        let err: Error = ParseError::new(ParseErrorKind::MissingValue).at_line(3).into();
        assert!(matches!(err, Error::Parse(_)));
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_validation_error_converts() {
        let err: Error = ValidationError::InvalidFormat {
            field: "step".to_string(),
            message: "missing unit".to_string(),
        }
        .into();
        assert!(matches!(err, Error::Validation(ref m) if m.contains("step")));
    }
}
