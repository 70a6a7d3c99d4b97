//! Router behavior against an `MpdApi` implemented outside the crate.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mpd_events::testing::MockConnection;
use mpd_signals::model::{
    ChannelMessage, Mount, Neighbor, Output, Partition, Stats, StoredPlaylist, TrackLookup,
};
use mpd_signals::{
    EventBus, FetchResult, MpdApi, PlayState, RouterConfig, Signals, StatusSnapshot, Subsystem,
    Track,
};

/// Client that always reports the same player state.
#[derive(Default)]
struct SteadyClient {
    status_calls: AtomicUsize,
    playlist_calls: AtomicUsize,
}

#[async_trait]
impl MpdApi for SteadyClient {
    async fn status(&self) -> FetchResult<StatusSnapshot> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let mut status = StatusSnapshot::new(PlayState::Play, Some(4));
        status.volume = Some(60);
        Ok(status)
    }

    async fn stats(&self) -> FetchResult<Stats> {
        Ok(Stats::default())
    }

    async fn track_by_id(&self, id: u64) -> FetchResult<TrackLookup> {
        Ok(TrackLookup::One(Track::new(format!("music/{id}.flac"), id)))
    }

    async fn stored_playlists(&self) -> FetchResult<Vec<StoredPlaylist>> {
        self.playlist_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![StoredPlaylist {
            playlist: "evening".to_string(),
            last_modified: None,
        }])
    }

    async fn read_messages(&self) -> FetchResult<Vec<ChannelMessage>> {
        Ok(Vec::new())
    }

    async fn partitions(&self) -> FetchResult<Vec<Partition>> {
        Ok(vec![Partition {
            name: "default".to_string(),
        }])
    }

    async fn channels(&self) -> FetchResult<Vec<String>> {
        Ok(Vec::new())
    }

    async fn neighbors(&self) -> FetchResult<Vec<Neighbor>> {
        Ok(Vec::new())
    }

    async fn mounts(&self) -> FetchResult<Vec<Mount>> {
        Ok(Vec::new())
    }

    async fn outputs(&self) -> FetchResult<Vec<Output>> {
        Ok(Vec::new())
    }
}

fn setup() -> (Arc<MockConnection>, Arc<SteadyClient>, Signals) {
    let connection = Arc::new(MockConnection::new());
    let client = Arc::new(SteadyClient::default());
    let bus = EventBus::new(connection.clone(), 64);
    let signals = Signals::new(bus, Arc::clone(&client), &RouterConfig::default()).unwrap();
    (connection, client, signals)
}

#[tokio::test(start_paused = true)]
async fn test_replayed_snapshot_emits_at_most_once() {
    let (connection, client, signals) = setup();
    let mut status = signals.status.subscribe();
    let mut state = signals.state.subscribe();
    let mut song = signals.current_song.subscribe();
    let mut unique = signals.current_song_unique.subscribe();

    assert!(status.recv().await.unwrap().is_ok());
    assert_eq!(state.recv().await, Some(Ok(PlayState::Play)));
    assert!(song.recv().await.unwrap().unwrap().is_some());
    assert!(unique.recv().await.unwrap().unwrap().is_some());

    for _ in 0..3 {
        connection.emit_system(Subsystem::Player);
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    // Status itself re-emits every snapshot; the derived signals stay quiet.
    let mut snapshots = 0;
    while status.try_recv().is_some() {
        snapshots += 1;
    }
    assert_eq!(snapshots, 3);
    assert_eq!(client.status_calls.load(Ordering::SeqCst), 4);
    assert!(state.try_recv().is_none());
    assert!(song.try_recv().is_none());
    assert!(unique.try_recv().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_late_subscriber_shares_running_signal() {
    let (_connection, client, signals) = setup();
    let mut first = signals.playlists.subscribe();
    let lists = first.recv().await.unwrap().unwrap();
    assert_eq!(lists[0].playlist, "evening");

    let mut second = signals.playlists.subscribe();
    let replayed = second.recv().await.unwrap().unwrap();
    assert_eq!(replayed, lists);
    assert_eq!(client.playlist_calls.load(Ordering::SeqCst), 1);
    assert_eq!(signals.playlists.subscriber_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_unrelated_events_do_not_trigger() {
    let (connection, client, signals) = setup();
    let mut status = signals.status.subscribe();
    status.recv().await.unwrap().unwrap();

    connection.emit_system(Subsystem::Database);
    connection.emit_system(Subsystem::StoredPlaylist);
    connection.emit_system("custom_plugin");
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(client.status_calls.load(Ordering::SeqCst), 1);
    assert!(status.try_recv().is_none());
}
