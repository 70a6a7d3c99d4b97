//! # mpd-signals
//!
//! Debounced, de-duplicated state signals derived from the normalized MPD
//! event sequence.
//!
//! Each signal listens for a declared set of event tags, optionally waits out
//! a debounce window, and resolves the trigger into a value, usually by
//! fetching a fresh snapshot through [`MpdApi`]. Signals are lazy and
//! reference counted: the first subscriber starts the work, later subscribers
//! share it, and dropping the last subscriber tears it down.
//!
//! ```rust,ignore
//! use mpd_signals::prelude::*;
//!
//! let signals = Signals::new(bus, api, &RouterConfig::default())?;
//! let mut song = signals.current_song_unique.subscribe();
//! while let Some(item) = song.recv().await {
//!     match item {
//!         Ok(Some(track)) => println!("now playing {}", track.file),
//!         Ok(None) => println!("nothing playing"),
//!         Err(e) => eprintln!("{e}"),
//!     }
//! }
//! ```

pub mod api;
pub mod config;
pub mod distinct;
mod driver;
pub mod error;
pub mod model;
pub mod router;
pub mod signal;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use api::MpdApi;
pub use config::{FetchOrdering, RouterConfig};
pub use distinct::{by_eq, by_key, same_file, DistinctUntilChanged};
pub use error::{ConfigError, FetchError, FetchResult, SignalError};
pub use model::{
    ChannelMessage, Mount, Neighbor, Output, Partition, PlayState, Stats, StatusSnapshot,
    StoredPlaylist, Track, TrackLookup,
};
pub use router::{EventTrigger, Signals, EVENT_SIGNALS};
pub use signal::{Publisher, Signal, SignalItem, SignalTask, Subscription};

// Re-export the event layer so dependents need a single import.
pub use mpd_events::{EventBus, EventCursor, NormalizedEvent, Subsystem};

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        EventBus, FetchOrdering, MpdApi, NormalizedEvent, PlayState, RouterConfig, Signal,
        SignalError, SignalItem, Signals, StatusSnapshot, Subscription, Track,
    };
}
