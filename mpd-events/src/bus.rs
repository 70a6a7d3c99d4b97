//! Shared, reference-counted event normalizer.
//!
//! The bus registers one set of listeners on the connection while at least one
//! cursor is open and relays every notification through a single broadcast
//! channel, so N consumers see each occurrence exactly once without
//! duplicating connection listeners.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::Stream;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::connection::{Connection, Listener};
use crate::event::{NormalizedEvent, RawEvent};
use crate::types::{ListenerId, ListenerKind};

/// Message relayed on the internal broadcast channel.
#[derive(Debug, Clone)]
enum BusMessage {
    Event(NormalizedEvent),
    Closed,
}

/// Listeners currently registered on the connection.
struct Registration {
    sender: broadcast::Sender<BusMessage>,
    listener_ids: Vec<ListenerId>,
}

struct BusState {
    registration: Option<Registration>,
    cursors: usize,
}

struct BusInner {
    connection: Arc<dyn Connection>,
    capacity: usize,
    closed: Arc<AtomicBool>,
    state: Mutex<BusState>,
}

/// Multicast normalized event sequence for one connection.
///
/// Cloning the bus is cheap; all clones share the same listeners and channel.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    /// Create a bus over `connection` with a broadcast buffer of `capacity` events.
    ///
    /// Nothing is registered on the connection until the first cursor is opened.
    pub fn new(connection: Arc<dyn Connection>, capacity: usize) -> Self {
        Self {
            inner: Arc::new(BusInner {
                connection,
                capacity: capacity.max(1),
                closed: Arc::new(AtomicBool::new(false)),
                state: Mutex::new(BusState {
                    registration: None,
                    cursors: 0,
                }),
            }),
        }
    }

    /// Open a cursor on the sequence.
    ///
    /// The cursor yields [`NormalizedEvent::Initial`] first, then every event
    /// relayed after this call. A cursor opened after the connection closed is
    /// already finished.
    pub fn subscribe(&self) -> EventCursor {
        if self.is_closed() {
            debug!("EventBus: cursor opened after connection closed");
            return EventCursor {
                initial_pending: false,
                finished: true,
                receiver: None,
                _lease: None,
            };
        }

        let mut state = self.inner.state.lock();

        let receiver = match &state.registration {
            Some(registration) => registration.sender.subscribe(),
            None => {
                let (sender, receiver) = broadcast::channel(self.inner.capacity);
                let listener_ids = self.register_listeners(&sender);
                info!(
                    listeners = listener_ids.len(),
                    "EventBus: listeners registered on connection"
                );
                state.registration = Some(Registration {
                    sender,
                    listener_ids,
                });
                receiver
            }
        };

        state.cursors += 1;

        EventCursor {
            initial_pending: true,
            finished: false,
            receiver: Some(receiver),
            _lease: Some(CursorLease {
                inner: Arc::clone(&self.inner),
            }),
        }
    }

    /// Number of open cursors.
    pub fn cursor_count(&self) -> usize {
        self.inner.state.lock().cursors
    }

    /// Returns true while listeners are registered on the connection.
    pub fn is_active(&self) -> bool {
        self.inner.state.lock().registration.is_some()
    }

    /// Returns true once the connection reported closure.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    fn register_listeners(&self, sender: &broadcast::Sender<BusMessage>) -> Vec<ListenerId> {
        let connection = &self.inner.connection;

        let relay = |tx: broadcast::Sender<BusMessage>| -> Listener {
            Arc::new(move |raw: RawEvent| {
                match &raw {
                    RawEvent::SystemChange(subsystem) => debug!(subsystem = %subsystem, "EventBus: system change"),
                    RawEvent::Error(err) => warn!(error = %err, "EventBus: connection error"),
                    _ => {}
                }
                if let Some(event) = NormalizedEvent::from_raw(raw) {
                    let _ = tx.send(BusMessage::Event(event));
                }
            })
        };
        let on_system = relay(sender.clone());
        let on_error = relay(sender.clone());

        let close_tx = sender.clone();
        let closed = Arc::clone(&self.inner.closed);
        let on_close: Listener = Arc::new(move |raw: RawEvent| {
            if matches!(raw, RawEvent::ConnectionClosed) {
                info!("EventBus: connection closed, completing sequence");
                closed.store(true, Ordering::Release);
                let _ = close_tx.send(BusMessage::Closed);
            }
        });

        vec![
            connection.add_listener(ListenerKind::System, on_system),
            connection.add_listener(ListenerKind::Error, on_error),
            connection.add_listener(ListenerKind::Close, on_close),
        ]
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("cursors", &self.cursor_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Keeps the bus registration alive; the last lease removes the listeners.
struct CursorLease {
    inner: Arc<BusInner>,
}

impl Drop for CursorLease {
    fn drop(&mut self) {
        let registration = {
            let mut state = self.inner.state.lock();
            state.cursors = state.cursors.saturating_sub(1);
            if state.cursors == 0 {
                state.registration.take()
            } else {
                None
            }
        };

        if let Some(registration) = registration {
            for id in registration.listener_ids {
                if !self.inner.connection.remove_listener(id) {
                    debug!(listener = %id, "EventBus: listener already removed");
                }
            }
            info!("EventBus: last cursor dropped, listeners removed");
        }
    }
}

/// One consumer's position on the normalized sequence.
pub struct EventCursor {
    initial_pending: bool,
    finished: bool,
    receiver: Option<broadcast::Receiver<BusMessage>>,
    _lease: Option<CursorLease>,
}

impl EventCursor {
    /// Receive the next event, or `None` once the connection closed.
    pub async fn recv(&mut self) -> Option<NormalizedEvent> {
        if self.finished {
            return None;
        }

        if self.initial_pending {
            self.initial_pending = false;
            return Some(NormalizedEvent::Initial);
        }

        let receiver = self.receiver.as_mut()?;
        loop {
            match receiver.recv().await {
                Ok(BusMessage::Event(event)) => return Some(event),
                Ok(BusMessage::Closed) | Err(broadcast::error::RecvError::Closed) => {
                    self.finished = true;
                    return None;
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "EventCursor lagged behind; skipping events");
                }
            }
        }
    }

    /// Returns true once the sequence has completed for this cursor.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Convert the cursor into a [`Stream`] of events.
    pub fn into_stream(self) -> impl Stream<Item = NormalizedEvent> + Send + Unpin {
        Box::pin(futures::stream::unfold(self, |mut cursor| async move {
            cursor.recv().await.map(|event| (event, cursor))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockConnection;
    use crate::types::Subsystem;
    use crate::ConnectionError;
    use futures::StreamExt;

    fn bus(connection: &Arc<MockConnection>) -> EventBus {
        EventBus::new(connection.clone(), 16)
    }

    #[tokio::test]
    async fn test_initial_is_emitted_first() {
        let connection = Arc::new(MockConnection::new());
        let bus = bus(&connection);

        let mut cursor = bus.subscribe();
        connection.emit_system("player");

        assert_eq!(cursor.recv().await, Some(NormalizedEvent::Initial));
        assert_eq!(
            cursor.recv().await,
            Some(NormalizedEvent::Subsystem(Subsystem::Player))
        );
    }

    #[tokio::test]
    async fn test_events_are_relayed_in_arrival_order() {
        let connection = Arc::new(MockConnection::new());
        let bus = bus(&connection);
        let mut cursor = bus.subscribe();

        for name in ["mixer", "player", "options", "database"] {
            connection.emit_system(name);
        }

        let mut seen = Vec::new();
        for _ in 0..5 {
            seen.push(cursor.recv().await.and_then(|e| e.tag().map(str::to_string)));
        }

        assert_eq!(
            seen,
            vec![
                Some("initial".to_string()),
                Some("mixer".to_string()),
                Some("player".to_string()),
                Some("options".to_string()),
                Some("database".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_error_does_not_terminate_sequence() {
        let connection = Arc::new(MockConnection::new());
        let bus = bus(&connection);
        let mut cursor = bus.subscribe();
        assert!(cursor.recv().await.unwrap().is_initial());

        connection.emit_error(ConnectionError::Io("timeout".to_string()));
        connection.emit_system("mixer");

        assert_eq!(
            cursor.recv().await,
            Some(NormalizedEvent::Error("I/O error: timeout".to_string()))
        );
        assert_eq!(
            cursor.recv().await,
            Some(NormalizedEvent::Subsystem(Subsystem::Mixer))
        );
        assert!(!cursor.is_finished());
    }

    #[tokio::test]
    async fn test_close_completes_every_cursor() {
        let connection = Arc::new(MockConnection::new());
        let bus = bus(&connection);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        connection.close();

        assert!(first.recv().await.unwrap().is_initial());
        assert_eq!(first.recv().await, None);
        assert!(second.recv().await.unwrap().is_initial());
        assert_eq!(second.recv().await, None);
        assert!(first.is_finished());
        assert!(bus.is_closed());

        let mut late = bus.subscribe();
        assert_eq!(late.recv().await, None);
    }

    #[tokio::test]
    async fn test_cursors_share_one_set_of_listeners() {
        let connection = Arc::new(MockConnection::new());
        let bus = bus(&connection);
        assert_eq!(connection.listener_count(), 0);

        let mut first = bus.subscribe();
        let mut second = bus.subscribe();
        assert_eq!(connection.listener_count(), 3);
        assert_eq!(bus.cursor_count(), 2);

        connection.emit_system("output");

        for cursor in [&mut first, &mut second] {
            assert!(cursor.recv().await.unwrap().is_initial());
            assert_eq!(
                cursor.recv().await,
                Some(NormalizedEvent::Subsystem(Subsystem::Output))
            );
        }
    }

    #[tokio::test]
    async fn test_dropping_last_cursor_removes_listeners() {
        let connection = Arc::new(MockConnection::new());
        let bus = bus(&connection);

        let first = bus.subscribe();
        let second = bus.subscribe();
        drop(first);
        assert_eq!(connection.listener_count(), 3);
        assert!(bus.is_active());

        drop(second);
        assert_eq!(connection.listener_count(), 0);
        assert!(!bus.is_active());

        // Re-subscribing registers again and starts with a fresh Initial.
        let mut cursor = bus.subscribe();
        assert_eq!(connection.listener_count(), 3);
        assert!(cursor.recv().await.unwrap().is_initial());
    }

    #[tokio::test]
    async fn test_lagged_cursor_skips_and_continues() {
        let connection = Arc::new(MockConnection::new());
        let bus = EventBus::new(connection.clone(), 2);
        let mut cursor = bus.subscribe();
        assert!(cursor.recv().await.unwrap().is_initial());

        for name in ["mixer", "mixer", "mixer", "player"] {
            connection.emit_system(name);
        }

        // Oldest events were overwritten; the cursor resumes at the oldest kept one.
        assert_eq!(
            cursor.recv().await,
            Some(NormalizedEvent::Subsystem(Subsystem::Mixer))
        );
        assert_eq!(
            cursor.recv().await,
            Some(NormalizedEvent::Subsystem(Subsystem::Player))
        );
    }

    #[tokio::test]
    async fn test_into_stream() {
        let connection = Arc::new(MockConnection::new());
        let bus = bus(&connection);
        let stream = bus.subscribe().into_stream();

        connection.emit_system("sticker");
        connection.close();

        let events: Vec<_> = stream.collect().await;
        assert_eq!(
            events,
            vec![
                NormalizedEvent::Initial,
                NormalizedEvent::Subsystem(Subsystem::Sticker)
            ]
        );
    }
}
