//! Request boundary of the external MPD client.

use async_trait::async_trait;

use crate::error::FetchResult;
use crate::model::{
    ChannelMessage, Mount, Neighbor, Output, Partition, Stats, StatusSnapshot, StoredPlaylist,
    TrackLookup,
};

/// Snapshot queries the router issues when a signal is triggered.
///
/// Implementations must tolerate concurrent calls: a signal does not wait for
/// its previous fetch before issuing the next one.
#[async_trait]
pub trait MpdApi: Send + Sync + 'static {
    /// `status`
    async fn status(&self) -> FetchResult<StatusSnapshot>;

    /// `stats`
    async fn stats(&self) -> FetchResult<Stats>;

    /// `playlistid {id}`
    async fn track_by_id(&self, id: u64) -> FetchResult<TrackLookup>;

    /// `listplaylists`
    async fn stored_playlists(&self) -> FetchResult<Vec<StoredPlaylist>>;

    /// `readmessages`
    async fn read_messages(&self) -> FetchResult<Vec<ChannelMessage>>;

    /// `listpartitions`
    async fn partitions(&self) -> FetchResult<Vec<Partition>>;

    /// `channels`
    async fn channels(&self) -> FetchResult<Vec<String>>;

    /// `listneighbors`
    async fn neighbors(&self) -> FetchResult<Vec<Neighbor>>;

    /// `listmounts`
    async fn mounts(&self) -> FetchResult<Vec<Mount>>;

    /// `outputs`
    async fn outputs(&self) -> FetchResult<Vec<Output>>;
}
