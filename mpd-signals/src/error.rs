//! Error types for the mpd-signals crate.

/// Failure of one request against the MPD connection.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request could not be sent or the response could not be read
    #[error("Request failed: {0}")]
    Request(String),

    /// The response did not have the expected shape
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The server answered with an `ACK` error
    #[error("Server error: {0}")]
    Server(String),

    /// The connection is closed
    #[error("Connection closed")]
    Closed,
}

/// Error item delivered on a signal stream.
///
/// Errors are local to the signal that produced them; the signal keeps
/// running and sibling signals are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignalError {
    /// The fetch issued for a trigger failed
    #[error("Fetch for signal '{signal}' failed: {message}")]
    Fetch {
        /// Name of the signal
        signal: &'static str,
        /// Rendered fetch error
        message: String,
    },
}

impl SignalError {
    /// Wrap a fetch failure for `signal`.
    pub fn fetch(signal: &'static str, error: &FetchError) -> Self {
        SignalError::Fetch {
            signal,
            message: error.to_string(),
        }
    }

    /// Name of the signal that reported the error.
    pub fn signal(&self) -> &'static str {
        match self {
            SignalError::Fetch { signal, .. } => signal,
        }
    }
}

/// Invalid router configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Debounce window must be greater than 0")]
    ZeroDebounce,

    #[error("Event buffer size must be greater than 0")]
    ZeroEventBuffer,

    #[error("Signal buffer size must be greater than 0")]
    ZeroSignalBuffer,
}

/// Convenience type alias for request results.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        assert_eq!(
            FetchError::Request("broken pipe".to_string()).to_string(),
            "Request failed: broken pipe"
        );
        assert_eq!(
            FetchError::Protocol("missing OK".to_string()).to_string(),
            "Protocol error: missing OK"
        );
        assert_eq!(FetchError::Closed.to_string(), "Connection closed");
    }

    #[test]
    fn test_signal_error_from_fetch() {
        let error = SignalError::fetch("stats", &FetchError::Server("[5@0] denied".to_string()));
        assert_eq!(error.signal(), "stats");
        assert_eq!(
            error.to_string(),
            "Fetch for signal 'stats' failed: Server error: [5@0] denied"
        );
    }

    #[test]
    fn test_config_error_display() {
        assert_eq!(
            ConfigError::ZeroDebounce.to_string(),
            "Debounce window must be greater than 0"
        );
    }
}
