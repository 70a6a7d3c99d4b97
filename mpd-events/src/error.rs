//! Error types for the mpd-events crate.

/// Failures reported by the underlying connection.
///
/// These are informational: they are relayed on the event sequence but never
/// terminate it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    /// Socket level failure
    #[error("I/O error: {0}")]
    Io(String),

    /// The server answered with something that is not valid protocol
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The server reported an `ACK` error for a command
    #[error("Server error: {0}")]
    Server(String),
}
