//! # mpd-events
//!
//! Turns the listener-style notifications of a live MPD connection into one
//! ordered, multicast sequence of [`NormalizedEvent`]s.
//!
//! Every cursor opened on the [`EventBus`] starts with exactly one
//! [`NormalizedEvent::Initial`], which downstream consumers use to perform
//! their first snapshot fetch. Subsystem notifications follow in arrival
//! order. Connection errors are relayed as informational events; only
//! connection closure ends the sequence.
//!
//! ```rust,ignore
//! use mpd_events::{EventBus, NormalizedEvent};
//!
//! let bus = EventBus::new(connection, 1000);
//! let mut cursor = bus.subscribe();
//! while let Some(event) = cursor.recv().await {
//!     println!("changed: {:?}", event.tag());
//! }
//! ```

mod bus;
mod connection;
mod error;
mod event;
mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use bus::{EventBus, EventCursor};
pub use connection::{Connection, Listener};
pub use error::ConnectionError;
pub use event::{NormalizedEvent, RawEvent};
pub use types::{ListenerId, ListenerKind, Subsystem};
