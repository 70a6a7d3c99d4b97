//! Event types for the mpd-events crate.

use crate::error::ConnectionError;
use crate::types::Subsystem;

/// Notification as produced by the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawEvent {
    /// Start of a subscription
    Initial,
    /// A subsystem reported a change
    SystemChange(Subsystem),
    /// The connection reported an error
    Error(ConnectionError),
    /// The connection is gone
    ConnectionClosed,
}

/// Event on the normalized sequence consumed by derived signals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedEvent {
    /// Emitted once at the start of every cursor
    Initial,
    /// A subsystem changed
    Subsystem(Subsystem),
    /// Informational connection error; never triggers a signal
    Error(String),
}

impl NormalizedEvent {
    /// The trigger tag of this event: `"initial"` or the subsystem name.
    ///
    /// Error events carry no tag.
    pub fn tag(&self) -> Option<&str> {
        match self {
            NormalizedEvent::Initial => Some("initial"),
            NormalizedEvent::Subsystem(subsystem) => Some(subsystem.as_str()),
            NormalizedEvent::Error(_) => None,
        }
    }

    /// Returns true for the subscription-start event.
    pub fn is_initial(&self) -> bool {
        matches!(self, NormalizedEvent::Initial)
    }

    /// Map a raw event onto the normalized sequence.
    ///
    /// Returns `None` for [`RawEvent::ConnectionClosed`], which ends the
    /// sequence instead of appearing on it.
    pub fn from_raw(raw: RawEvent) -> Option<Self> {
        match raw {
            RawEvent::Initial => Some(NormalizedEvent::Initial),
            RawEvent::SystemChange(subsystem) => Some(NormalizedEvent::Subsystem(subsystem)),
            RawEvent::Error(err) => Some(NormalizedEvent::Error(err.to_string())),
            RawEvent::ConnectionClosed => None,
        }
    }
}

impl From<Subsystem> for NormalizedEvent {
    fn from(subsystem: Subsystem) -> Self {
        NormalizedEvent::Subsystem(subsystem)
    }
}
