//! # mpd-stream - Reactive state streams for MPD
//!
//! Turns a live MPD connection into de-duplicated state signals and a
//! per-track playback time measure:
//!
//! ```rust,ignore
//! use mpd_stream::{connect, RouterConfig};
//!
//! let streams = connect(client, RouterConfig::default())?;
//!
//! let mut songs = streams.current_song_unique.subscribe();
//! let mut playback = streams.playback.subscribe();
//!
//! while let Some(Ok(result)) = playback.recv().await {
//!     println!("{} played for {:?}", result.song.file, result.playback);
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! connection listeners (system / error / close)
//!     ↓
//! mpd-events     (EventBus: one normalized, multicast event sequence)
//!     ↓
//! mpd-signals    (Signals: debounced triggers → fetches → de-duplicated values)
//!     ↓
//! mpd-playback   (playback windows folded into PlaybackResult)
//! ```
//!
//! Every signal is lazy: nothing is registered on the connection and nothing
//! is fetched until something subscribes, and dropping the last subscription
//! releases everything again.

use std::ops::Deref;
use std::sync::Arc;

use mpd_events::{Connection, EventBus};
use mpd_playback::{playback_signal, Clock, MonotonicClock};
use mpd_signals::{MpdApi, Signal, Signals};
use tracing::info;

pub mod error;
pub mod logging;

pub use error::{Result, StreamError};
pub use logging::{init_logging, init_logging_from_env, LoggingError, LoggingMode};

// Re-export the layers so applications need a single dependency.
pub use mpd_events::{ConnectionError, EventCursor, NormalizedEvent, Subsystem};
pub use mpd_playback::{ManualClock, PlaybackResult};
pub use mpd_signals::{
    FetchError, FetchOrdering, PlayState, RouterConfig, SignalError, SignalItem, StatusSnapshot,
    Subscription, Track,
};

#[cfg(feature = "test-support")]
pub use mpd_signals::testing;

/// All streams of one connection.
///
/// Dereferences to [`Signals`], so `streams.status` names the status signal.
pub struct ClientStreams<C> {
    /// The derived state signals
    pub signals: Signals,
    /// Elapsed playback per track episode
    pub playback: Signal<PlaybackResult>,
    client: Arc<C>,
}

impl<C> ClientStreams<C> {
    /// The client the streams were built on.
    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    /// The normalized event sequence.
    pub fn events(&self) -> &EventBus {
        &self.signals.events
    }
}

impl<C> std::fmt::Debug for ClientStreams<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientStreams")
            .field("signals", &self.signals)
            .field("playback", &self.playback)
            .finish_non_exhaustive()
    }
}

impl<C> Clone for ClientStreams<C> {
    fn clone(&self) -> Self {
        Self {
            signals: self.signals.clone(),
            playback: self.playback.clone(),
            client: Arc::clone(&self.client),
        }
    }
}

impl<C> Deref for ClientStreams<C> {
    type Target = Signals;

    fn deref(&self) -> &Signals {
        &self.signals
    }
}

/// Build every stream on `client`, timing playback with the tokio clock.
///
/// Fails only on an invalid configuration. No listener is registered and no
/// request is issued until a stream is subscribed.
pub fn connect<C>(client: Arc<C>, config: RouterConfig) -> Result<ClientStreams<C>>
where
    C: Connection + MpdApi,
{
    connect_with_clock(client, config, Arc::new(MonotonicClock::new()))
}

/// Like [`connect`], with a custom playback clock.
pub fn connect_with_clock<C>(
    client: Arc<C>,
    config: RouterConfig,
    clock: Arc<dyn Clock>,
) -> Result<ClientStreams<C>>
where
    C: Connection + MpdApi,
{
    config.validate()?;

    let connection: Arc<dyn Connection> = client.clone();
    let bus = EventBus::new(connection, config.event_buffer_size);
    let signals = Signals::new(bus, Arc::clone(&client), &config)?;
    let playback = playback_signal(
        signals.status.clone(),
        signals.current_song.clone(),
        clock,
        config.signal_buffer_size,
    );

    info!(
        debounce = ?config.debounce,
        ordering = ?config.fetch_ordering,
        "MPD streams declared"
    );

    Ok(ClientStreams {
        signals,
        playback,
        client,
    })
}
