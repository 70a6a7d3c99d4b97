//! Derived Signal Router.
//!
//! Declares every derived signal on top of the normalized event bus. Event
//! driven signals react to the tags listed in their [`EventTrigger`]; `state`,
//! `current_song` and `current_song_unique` are derived from other signals and
//! de-duplicated. Nothing runs until a signal is subscribed.

use std::future::Future;
use std::sync::Arc;

use futures::{FutureExt, StreamExt};
use mpd_events::{EventBus, NormalizedEvent};
use parking_lot::Mutex;

use crate::api::MpdApi;
use crate::config::RouterConfig;
use crate::distinct::{by_eq, same_file, DistinctUntilChanged};
use crate::driver::{Pipeline, Resolver, Selection, Selector, SelectorFactory, Upstream};
use crate::error::{ConfigError, FetchResult};
use crate::model::{
    ChannelMessage, Mount, Neighbor, Output, Partition, PlayState, Stats, StatusSnapshot,
    StoredPlaylist, Track, TrackLookup,
};
use crate::signal::{Signal, SignalItem};

/// Trigger declaration of an event driven signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventTrigger {
    /// Signal name
    pub name: &'static str,
    /// Normalized event tags that trigger the signal
    pub tags: &'static [&'static str],
    /// Whether bursts of triggers are coalesced by the debounce window
    pub debounced: bool,
}

impl EventTrigger {
    /// Returns true if an event with `tag` triggers this signal.
    pub fn is_triggered_by(&self, tag: &str) -> bool {
        self.tags.contains(&tag)
    }
}

pub const STATUS: EventTrigger = EventTrigger {
    name: "status",
    tags: &["initial", "player", "options", "mixer"],
    debounced: true,
};

pub const PLAYLISTS: EventTrigger = EventTrigger {
    name: "playlists",
    tags: &["initial", "stored_playlist"],
    debounced: true,
};

pub const MESSAGE: EventTrigger = EventTrigger {
    name: "message",
    tags: &["message"],
    debounced: false,
};

pub const DATABASE_UPDATE: EventTrigger = EventTrigger {
    name: "database_update",
    tags: &["initial", "database"],
    debounced: false,
};

pub const STATS: EventTrigger = EventTrigger {
    name: "stats",
    tags: &["initial", "database"],
    debounced: false,
};

pub const PARTITION: EventTrigger = EventTrigger {
    name: "partition",
    tags: &["initial", "partition"],
    debounced: false,
};

pub const STICKER: EventTrigger = EventTrigger {
    name: "sticker",
    tags: &["initial", "sticker"],
    debounced: false,
};

pub const SUBSCRIPTION: EventTrigger = EventTrigger {
    name: "subscription",
    tags: &["initial", "subscription"],
    debounced: false,
};

pub const NEIGHBOR: EventTrigger = EventTrigger {
    name: "neighbor",
    tags: &["initial", "neighbor"],
    debounced: false,
};

pub const MOUNT: EventTrigger = EventTrigger {
    name: "mount",
    tags: &["initial", "mount"],
    debounced: false,
};

pub const OUTPUT: EventTrigger = EventTrigger {
    name: "output",
    tags: &["initial", "output"],
    debounced: false,
};

/// All event driven signals, in declaration order.
pub const EVENT_SIGNALS: [EventTrigger; 11] = [
    STATUS,
    PLAYLISTS,
    MESSAGE,
    DATABASE_UPDATE,
    STATS,
    PARTITION,
    STICKER,
    SUBSCRIPTION,
    NEIGHBOR,
    MOUNT,
    OUTPUT,
];

/// The declared derived signals of one connection.
#[derive(Debug, Clone)]
pub struct Signals {
    /// The normalized event sequence the signals are derived from
    pub events: EventBus,
    pub status: Signal<StatusSnapshot>,
    /// Play state, emitted when it changes
    pub state: Signal<PlayState>,
    /// Current track, emitted when the current song id changes
    pub current_song: Signal<Option<Track>>,
    /// Current track, emitted when the current file changes
    pub current_song_unique: Signal<Option<Track>>,
    pub playlists: Signal<Vec<StoredPlaylist>>,
    pub message: Signal<Vec<ChannelMessage>>,
    /// Notification only
    pub database_update: Signal<NormalizedEvent>,
    pub stats: Signal<Stats>,
    pub partition: Signal<Vec<Partition>>,
    /// Notification only
    pub sticker: Signal<NormalizedEvent>,
    /// Channels with at least one subscriber
    pub subscription: Signal<Vec<String>>,
    pub neighbor: Signal<Vec<Neighbor>>,
    pub mount: Signal<Vec<Mount>>,
    pub output: Signal<Vec<Output>>,
}

impl Signals {
    /// Declare every signal on `bus`, fetching through `api`.
    pub fn new<A: MpdApi>(bus: EventBus, api: Arc<A>, config: &RouterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let router = Router {
            bus: &bus,
            config,
        };

        let status = router.on_events(&STATUS, fetch(&api, |api| async move { api.status().await }));

        let state = router.derived(
            &status,
            "state",
            Arc::new(|| -> Selector<SignalItem<StatusSnapshot>, PlayState> {
                let mut distinct = by_eq::<PlayState>();
                Box::new(move |item: SignalItem<StatusSnapshot>| match item {
                    Ok(status) if distinct.check(&status.state) => Selection::Trigger(status.state),
                    Ok(_) => Selection::Skip,
                    Err(error) => Selection::Forward(error),
                })
            }),
            Resolver::Map(Arc::new(|state: PlayState| state)),
        );

        let current_song = {
            let api = Arc::clone(&api);
            // Song id whose lookup failed; seeing it again retries the lookup.
            let failed: Arc<Mutex<Option<Option<u64>>>> = Arc::new(Mutex::new(None));
            let retry = Arc::clone(&failed);
            router.derived(
                &status,
                "current_song",
                Arc::new(move || -> Selector<SignalItem<StatusSnapshot>, Option<u64>> {
                    let retry = Arc::clone(&retry);
                    *retry.lock() = None;
                    let mut distinct = by_eq::<Option<u64>>();
                    Box::new(move |item: SignalItem<StatusSnapshot>| match item {
                        Ok(status) => {
                            if retry.lock().take() == Some(status.songid) {
                                distinct.reset();
                            }
                            if distinct.check(&status.songid) {
                                Selection::Trigger(status.songid)
                            } else {
                                Selection::Skip
                            }
                        }
                        Err(error) => Selection::Forward(error),
                    })
                }),
                Resolver::Fetch(Arc::new(move |songid: Option<u64>| {
                    let api = Arc::clone(&api);
                    let failed = Arc::clone(&failed);
                    async move {
                        let track = match songid {
                            Some(id) => api.track_by_id(id).await.map(TrackLookup::into_track),
                            None => Ok(None),
                        };
                        if track.is_err() {
                            *failed.lock() = Some(songid);
                        }
                        track
                    }
                    .boxed()
                })),
            )
        };

        let current_song_unique = router.derived(
            &current_song,
            "current_song_unique",
            Arc::new(|| -> Selector<SignalItem<Option<Track>>, Option<Track>> {
                let mut distinct = DistinctUntilChanged::new(same_file);
                Box::new(move |item: SignalItem<Option<Track>>| match item {
                    Ok(track) if distinct.check(&track) => Selection::Trigger(track),
                    Ok(_) => Selection::Skip,
                    Err(error) => Selection::Forward(error),
                })
            }),
            Resolver::Map(Arc::new(|track: Option<Track>| track)),
        );

        Ok(Self {
            status,
            state,
            current_song,
            current_song_unique,
            playlists: router.on_events(
                &PLAYLISTS,
                fetch(&api, |api| async move { api.stored_playlists().await }),
            ),
            message: router.on_events(&MESSAGE, fetch(&api, |api| async move { api.read_messages().await })),
            database_update: router.on_events(&DATABASE_UPDATE, notify()),
            stats: router.on_events(&STATS, fetch(&api, |api| async move { api.stats().await })),
            partition: router.on_events(&PARTITION, fetch(&api, |api| async move { api.partitions().await })),
            sticker: router.on_events(&STICKER, notify()),
            subscription: router.on_events(
                &SUBSCRIPTION,
                fetch(&api, |api| async move { api.channels().await }),
            ),
            neighbor: router.on_events(&NEIGHBOR, fetch(&api, |api| async move { api.neighbors().await })),
            mount: router.on_events(&MOUNT, fetch(&api, |api| async move { api.mounts().await })),
            output: router.on_events(&OUTPUT, fetch(&api, |api| async move { api.outputs().await })),
            events: bus,
        })
    }
}

struct Router<'a> {
    bus: &'a EventBus,
    config: &'a RouterConfig,
}

impl Router<'_> {
    fn on_events<T>(&self, trigger: &EventTrigger, resolver: Resolver<NormalizedEvent, T>) -> Signal<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let bus = self.bus.clone();
        let upstream: Upstream<NormalizedEvent> = Arc::new(move || bus.subscribe().into_stream().boxed());

        let trigger = *trigger;
        let select: SelectorFactory<NormalizedEvent, NormalizedEvent> =
            Arc::new(move || -> Selector<NormalizedEvent, NormalizedEvent> {
                Box::new(move |event: NormalizedEvent| {
                    if event.tag().is_some_and(|tag| trigger.is_triggered_by(tag)) {
                        Selection::Trigger(event)
                    } else {
                        Selection::Skip
                    }
                })
            });

        Pipeline {
            name: trigger.name,
            upstream,
            select,
            resolver,
            debounce: trigger.debounced.then_some(self.config.debounce),
            ordering: self.config.fetch_ordering,
        }
        .into_signal(self.config.signal_buffer_size)
    }

    fn derived<U, K, T>(
        &self,
        source: &Signal<U>,
        name: &'static str,
        select: SelectorFactory<SignalItem<U>, K>,
        resolver: Resolver<K, T>,
    ) -> Signal<T>
    where
        U: Clone + Send + Sync + 'static,
        K: Send + 'static,
        T: Clone + Send + Sync + 'static,
    {
        let source = source.clone();
        let upstream: Upstream<SignalItem<U>> = Arc::new(move || source.subscribe().into_stream().boxed());

        Pipeline {
            name,
            upstream,
            select,
            resolver,
            debounce: None,
            ordering: self.config.fetch_ordering,
        }
        .into_signal(self.config.signal_buffer_size)
    }
}

/// Resolver that issues one request per trigger.
fn fetch<A, T, F, Fut>(api: &Arc<A>, request: F) -> Resolver<NormalizedEvent, T>
where
    A: MpdApi,
    F: Fn(Arc<A>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = FetchResult<T>> + Send + 'static,
{
    let api = Arc::clone(api);
    Resolver::Fetch(Arc::new(move |_event: NormalizedEvent| request(Arc::clone(&api)).boxed()))
}

/// Resolver that re-emits the triggering event.
fn notify() -> Resolver<NormalizedEvent, NormalizedEvent> {
    Resolver::Map(Arc::new(|event: NormalizedEvent| event))
}
