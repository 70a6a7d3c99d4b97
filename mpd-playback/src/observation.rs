//! Values flowing through the playback accumulator.

use std::time::Duration;

use chrono::{DateTime, Utc};
use mpd_signals::{PlayState, StatusSnapshot, Track};
use serde::Serialize;

/// One entry of the status timeline.
///
/// Two entries are equal when they describe the same `(state, songid)`; the
/// timestamp is ignored so a repeated snapshot is recognized as a repeat.
#[derive(Debug, Clone, Serialize)]
pub struct SongTimestamp {
    pub state: PlayState,
    pub songid: Option<u64>,
    pub ts: DateTime<Utc>,
}

impl SongTimestamp {
    /// Timeline entry for `status` observed at `ts`.
    pub fn from_status(status: &StatusSnapshot, ts: DateTime<Utc>) -> Self {
        Self {
            state: status.state,
            songid: status.songid,
            ts,
        }
    }
}

impl PartialEq for SongTimestamp {
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state && self.songid == other.songid
    }
}

impl Eq for SongTimestamp {}

/// Element of a playback window.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// A timeline entry attributed to the current track
    Status {
        song: Track,
        state: PlayState,
        songid: Option<u64>,
        ts: DateTime<Utc>,
    },
    /// Synthetic end of the window
    Closing { ts: DateTime<Utc> },
}

impl Observation {
    /// Attribute a timeline entry to `song`.
    pub fn status(song: &Track, entry: &SongTimestamp) -> Self {
        Observation::Status {
            song: song.clone(),
            state: entry.state,
            songid: entry.songid,
            ts: entry.ts,
        }
    }

    pub fn ts(&self) -> DateTime<Utc> {
        match self {
            Observation::Status { ts, .. } | Observation::Closing { ts } => *ts,
        }
    }
}

/// Time spent playing one track during one episode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackResult {
    pub song: Track,
    pub playback: Duration,
    /// When the episode ended
    pub ts: DateTime<Utc>,
}
