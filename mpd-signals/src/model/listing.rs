//! Records returned by the listing queries.

use serde::{Deserialize, Serialize};

/// A stored playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPlaylist {
    /// Playlist name
    pub playlist: String,
    #[serde(default)]
    pub last_modified: Option<String>,
}

/// A message read from a subscribed client-to-client channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMessage {
    pub channel: String,
    pub message: String,
}

/// Database and uptime statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub artists: u64,
    pub albums: u64,
    pub songs: u64,
    /// Daemon uptime in seconds
    pub uptime: u64,
    /// Total play time of all songs in the database, in seconds
    pub db_playtime: u64,
    /// Unix time of the last database update
    pub db_update: u64,
    /// Time spent playing, in seconds
    pub playtime: u64,
}

/// A partition of the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    pub name: String,
}

/// A storage found by neighbor discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neighbor {
    /// Storage URI
    pub neighbor: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A mounted storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mount {
    /// Mount point relative to the music directory
    pub mount: String,
    #[serde(default)]
    pub storage: Option<String>,
}

/// An audio output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub outputid: u32,
    pub outputname: String,
    pub outputenabled: bool,
    #[serde(default)]
    pub plugin: Option<String>,
}
