//! Snapshot records returned by the MPD request boundary.

pub mod listing;
pub mod status;
pub mod track;

pub use listing::{ChannelMessage, Mount, Neighbor, Output, Partition, Stats, StoredPlaylist};
pub use status::{PlayState, StatusSnapshot};
pub use track::{Track, TrackLookup};
