//! Scripted MPD client for tests.
//!
//! Enabled for this crate's unit tests and for dependents through the
//! `test-support` feature.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mpd_events::testing::MockConnection;
use mpd_events::{Connection, Listener, ListenerId, ListenerKind, Subsystem};
use parking_lot::Mutex;

use crate::api::MpdApi;
use crate::error::{FetchError, FetchResult};
use crate::model::{
    ChannelMessage, Mount, Neighbor, Output, Partition, Stats, StatusSnapshot, StoredPlaylist,
    Track, TrackLookup,
};

#[derive(Default)]
struct Responses {
    status: StatusSnapshot,
    stats: Stats,
    tracks: HashMap<u64, Track>,
    playlists: Vec<StoredPlaylist>,
    messages: Vec<ChannelMessage>,
    partitions: Vec<Partition>,
    channels: Vec<String>,
    neighbors: Vec<Neighbor>,
    mounts: Vec<Mount>,
    outputs: Vec<Output>,
}

#[derive(Default)]
struct Script {
    calls: HashMap<&'static str, usize>,
    failures: HashMap<&'static str, VecDeque<FetchError>>,
    delays: HashMap<&'static str, VecDeque<Duration>>,
}

/// Client double answering every query from settable responses.
///
/// Responses are captured when a call starts, so a delayed call resolves with
/// the values that were current when it was issued.
pub struct MockClient {
    connection: Arc<MockConnection>,
    responses: Mutex<Responses>,
    script: Mutex<Script>,
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockClient {
    /// Client with default responses and a fresh connection.
    pub fn new() -> Self {
        Self {
            connection: Arc::new(MockConnection::new()),
            responses: Mutex::new(Responses::default()),
            script: Mutex::new(Script::default()),
        }
    }

    /// The connection whose notifications feed the event bus.
    pub fn connection(&self) -> Arc<MockConnection> {
        Arc::clone(&self.connection)
    }

    /// Deliver a subsystem change notification on the connection.
    pub fn emit(&self, subsystem: Subsystem) {
        self.connection.emit_system(subsystem);
    }

    /// Number of calls made to `method` so far.
    pub fn calls(&self, method: &str) -> usize {
        self.script.lock().calls.get(method).copied().unwrap_or(0)
    }

    /// Make the next call to `method` fail with `error`.
    pub fn fail_next(&self, method: &'static str, error: FetchError) {
        self.script.lock().failures.entry(method).or_default().push_back(error);
    }

    /// Make the next call to `method` take `delay` to resolve.
    pub fn delay_next(&self, method: &'static str, delay: Duration) {
        self.script.lock().delays.entry(method).or_default().push_back(delay);
    }

    pub fn set_status(&self, status: StatusSnapshot) {
        self.responses.lock().status = status;
    }

    pub fn set_stats(&self, stats: Stats) {
        self.responses.lock().stats = stats;
    }

    /// Add or replace the queue entry with the track's id.
    pub fn insert_track(&self, track: Track) {
        if let Some(id) = track.id {
            self.responses.lock().tracks.insert(id, track);
        }
    }

    pub fn set_playlists(&self, playlists: Vec<StoredPlaylist>) {
        self.responses.lock().playlists = playlists;
    }

    pub fn set_messages(&self, messages: Vec<ChannelMessage>) {
        self.responses.lock().messages = messages;
    }

    pub fn set_outputs(&self, outputs: Vec<Output>) {
        self.responses.lock().outputs = outputs;
    }

    async fn respond<T>(&self, method: &'static str, response: T) -> FetchResult<T> {
        let (failure, delay) = {
            let mut script = self.script.lock();
            *script.calls.entry(method).or_default() += 1;
            let failure = script.failures.get_mut(method).and_then(VecDeque::pop_front);
            let delay = script.delays.get_mut(method).and_then(VecDeque::pop_front);
            (failure, delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match failure {
            Some(error) => Err(error),
            None => Ok(response),
        }
    }
}

/// Listeners go to the inner [`MockConnection`], so the client can serve as
/// both halves of a connection.
impl Connection for MockClient {
    fn add_listener(&self, kind: ListenerKind, listener: Listener) -> ListenerId {
        self.connection.add_listener(kind, listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.connection.remove_listener(id)
    }
}

#[async_trait]
impl MpdApi for MockClient {
    async fn status(&self) -> FetchResult<StatusSnapshot> {
        let response = self.responses.lock().status.clone();
        self.respond("status", response).await
    }

    async fn stats(&self) -> FetchResult<Stats> {
        let response = self.responses.lock().stats.clone();
        self.respond("stats", response).await
    }

    async fn track_by_id(&self, id: u64) -> FetchResult<TrackLookup> {
        // Unknown ids answer with an empty list, like a lookup of a removed entry.
        let response = TrackLookup::Many(self.responses.lock().tracks.get(&id).cloned().into_iter().collect());
        self.respond("track_by_id", response).await
    }

    async fn stored_playlists(&self) -> FetchResult<Vec<StoredPlaylist>> {
        let response = self.responses.lock().playlists.clone();
        self.respond("stored_playlists", response).await
    }

    async fn read_messages(&self) -> FetchResult<Vec<ChannelMessage>> {
        let response = self.responses.lock().messages.clone();
        self.respond("read_messages", response).await
    }

    async fn partitions(&self) -> FetchResult<Vec<Partition>> {
        let response = self.responses.lock().partitions.clone();
        self.respond("partitions", response).await
    }

    async fn channels(&self) -> FetchResult<Vec<String>> {
        let response = self.responses.lock().channels.clone();
        self.respond("channels", response).await
    }

    async fn neighbors(&self) -> FetchResult<Vec<Neighbor>> {
        let response = self.responses.lock().neighbors.clone();
        self.respond("neighbors", response).await
    }

    async fn mounts(&self) -> FetchResult<Vec<Mount>> {
        let response = self.responses.lock().mounts.clone();
        self.respond("mounts", response).await
    }

    async fn outputs(&self) -> FetchResult<Vec<Output>> {
        let response = self.responses.lock().outputs.clone();
        self.respond("outputs", response).await
    }
}
