//! In-memory connection for tests.
//!
//! Enabled for this crate's unit tests and for dependents through the
//! `test-support` feature.

use parking_lot::Mutex;

use crate::connection::{Connection, Listener};
use crate::error::ConnectionError;
use crate::event::RawEvent;
use crate::types::{ListenerId, ListenerKind, Subsystem};

/// Connection double that lets tests push notifications by hand.
#[derive(Default)]
pub struct MockConnection {
    listeners: Mutex<Vec<(ListenerId, ListenerKind, Listener)>>,
}

impl MockConnection {
    /// Create a connection with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of listeners currently registered.
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Deliver a subsystem change notification.
    pub fn emit_system(&self, subsystem: impl Into<Subsystem>) {
        self.dispatch(ListenerKind::System, RawEvent::SystemChange(subsystem.into()));
    }

    /// Deliver a connection error.
    pub fn emit_error(&self, error: ConnectionError) {
        self.dispatch(ListenerKind::Error, RawEvent::Error(error));
    }

    /// Deliver connection closure.
    pub fn close(&self) {
        self.dispatch(ListenerKind::Close, RawEvent::ConnectionClosed);
    }

    fn dispatch(&self, kind: ListenerKind, event: RawEvent) {
        // Listeners run outside the lock so they may deregister themselves.
        let targets: Vec<Listener> = self
            .listeners
            .lock()
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(_, _, listener)| listener.clone())
            .collect();

        for listener in targets {
            listener(event.clone());
        }
    }
}

impl Connection for MockConnection {
    fn add_listener(&self, kind: ListenerKind, listener: Listener) -> ListenerId {
        let id = ListenerId::new();
        self.listeners.lock().push((id, kind, listener));
        id
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _, _)| *existing != id);
        listeners.len() != before
    }
}
