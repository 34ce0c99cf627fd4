//! Error types for feedwatch.

use thiserror::Error;

/// Common error type for feedwatch.
#[derive(Error, Debug)]
pub enum FeedwatchError {
    /// Database error.
    ///
    /// This is a generic database error that wraps errors from any database backend.
    /// Database errors from sqlx are automatically converted.
    #[error("database error: {0}")]
    Database(String),

    /// Database connection error.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Feed fetch or parse error.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Notification delivery error.
    #[error("notify error: {0}")]
    Notify(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

// Conversion from sqlx errors
impl From<sqlx::Error> for FeedwatchError {
    fn from(e: sqlx::Error) -> Self {
        FeedwatchError::Database(e.to_string())
    }
}

/// Result type alias for feedwatch operations.
pub type Result<T> = std::result::Result<T, FeedwatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        let err = FeedwatchError::Fetch("HTTP status 404".to_string());
        assert_eq!(err.to_string(), "fetch error: HTTP status 404");
    }

    #[test]
    fn test_notify_error_display() {
        let err = FeedwatchError::Notify("delivery timed out".to_string());
        assert_eq!(err.to_string(), "notify error: delivery timed out");
    }

    #[test]
    fn test_not_found_error_display() {
        let err = FeedwatchError::NotFound("feed source".to_string());
        assert_eq!(err.to_string(), "feed source not found");
    }

    #[test]
    fn test_config_error_display() {
        let err = FeedwatchError::Config("notify.bot_token is required".to_string());
        assert_eq!(
            err.to_string(),
            "configuration error: notify.bot_token is required"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: FeedwatchError = io_err.into();
        assert!(matches!(err, FeedwatchError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_result_alias() {
        fn sample_ok() -> Result<i32> {
            Ok(42)
        }

        fn sample_err() -> Result<i32> {
            Err(FeedwatchError::Fetch("test".to_string()))
        }

        assert_eq!(sample_ok().unwrap(), 42);
        assert!(sample_err().is_err());
    }
}
