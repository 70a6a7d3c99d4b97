//! The bus over a connection implemented outside the crate.

use std::collections::HashMap;
use std::sync::Arc;

use mpd_events::{
    Connection, ConnectionError, EventBus, Listener, ListenerId, ListenerKind, NormalizedEvent,
    RawEvent, Subsystem,
};
use parking_lot::Mutex;

/// Connection that keeps one listener per kind, like a single-callback client.
#[derive(Default)]
struct CallbackConnection {
    listeners: Mutex<HashMap<ListenerId, (ListenerKind, Listener)>>,
}

impl CallbackConnection {
    fn fire(&self, kind: ListenerKind, event: RawEvent) {
        let targets: Vec<Listener> = self
            .listeners
            .lock()
            .values()
            .filter(|(k, _)| *k == kind)
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in targets {
            listener(event.clone());
        }
    }

    fn kinds(&self) -> Vec<ListenerKind> {
        let mut kinds: Vec<ListenerKind> = self.listeners.lock().values().map(|(k, _)| *k).collect();
        kinds.sort_by_key(|kind| *kind as u8);
        kinds
    }
}

impl Connection for CallbackConnection {
    fn add_listener(&self, kind: ListenerKind, listener: Listener) -> ListenerId {
        let id = ListenerId::new();
        self.listeners.lock().insert(id, (kind, listener));
        id
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.lock().remove(&id).is_some()
    }
}

#[tokio::test]
async fn test_one_listener_per_kind() {
    let connection = Arc::new(CallbackConnection::default());
    let bus = EventBus::new(connection.clone(), 64);

    let _cursors: Vec<_> = (0..4).map(|_| bus.subscribe()).collect();
    assert_eq!(
        connection.kinds(),
        vec![ListenerKind::System, ListenerKind::Error, ListenerKind::Close]
    );
}

#[tokio::test]
async fn test_unknown_subsystem_is_relayed() {
    let connection = Arc::new(CallbackConnection::default());
    let bus = EventBus::new(connection.clone(), 64);
    let mut cursor = bus.subscribe();

    connection.fire(
        ListenerKind::System,
        RawEvent::SystemChange(Subsystem::parse("custom_plugin")),
    );

    assert_eq!(cursor.recv().await, Some(NormalizedEvent::Initial));
    let event = cursor.recv().await.unwrap();
    assert_eq!(event.tag(), Some("custom_plugin"));
}

#[tokio::test]
async fn test_error_then_close() {
    let connection = Arc::new(CallbackConnection::default());
    let bus = EventBus::new(connection.clone(), 64);
    let mut cursor = bus.subscribe();
    assert!(cursor.recv().await.unwrap().is_initial());

    connection.fire(
        ListenerKind::Error,
        RawEvent::Error(ConnectionError::Protocol("unexpected line".to_string())),
    );
    connection.fire(ListenerKind::Close, RawEvent::ConnectionClosed);

    let error = cursor.recv().await.unwrap();
    assert_eq!(error.tag(), None);
    assert_eq!(cursor.recv().await, None);
    assert!(bus.is_closed());

    drop(cursor);
    assert!(connection.kinds().is_empty());
}
