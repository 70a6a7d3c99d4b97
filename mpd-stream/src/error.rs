use thiserror::Error;

use crate::logging::LoggingError;

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("Invalid router configuration: {0}")]
    Config(#[from] mpd_signals::ConfigError),

    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),
}

/// Convenience type alias for facade results
pub type Result<T> = std::result::Result<T, StreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = StreamError::from(mpd_signals::ConfigError::ZeroSignalBuffer);
        assert_eq!(
            error.to_string(),
            "Invalid router configuration: Signal buffer size must be greater than 0"
        );

        let error = StreamError::from(LoggingError::TracingInit("already set".to_string()));
        assert_eq!(
            error.to_string(),
            "Logging error: Failed to initialize tracing subscriber: already set"
        );
    }
}
