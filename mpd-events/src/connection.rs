//! Listener boundary of the external MPD connection.

use std::sync::Arc;

use crate::event::RawEvent;
use crate::types::{ListenerId, ListenerKind};

/// Callback invoked by a connection for every notification of one kind.
pub type Listener = Arc<dyn Fn(RawEvent) + Send + Sync>;

/// A live connection that delivers notifications to registered listeners.
///
/// Implementations deliver [`RawEvent::SystemChange`] to `System` listeners,
/// [`RawEvent::Error`] to `Error` listeners and [`RawEvent::ConnectionClosed`]
/// to `Close` listeners. Listeners must not be invoked while an internal lock
/// that `remove_listener` needs is held.
pub trait Connection: Send + Sync + 'static {
    /// Register a listener for one notification kind.
    fn add_listener(&self, kind: ListenerKind, listener: Listener) -> ListenerId;

    /// Deregister a listener. Returns false if the id was unknown.
    fn remove_listener(&self, id: ListenerId) -> bool;
}
