//! Player status snapshot.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Playback state reported in the `state` field of a status response.
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayState {
    /// Currently playing
    Play,
    /// Paused
    Pause,
    /// Stopped
    #[default]
    Stop,
}

impl PlayState {
    /// The protocol spelling of this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayState::Play => "play",
            PlayState::Pause => "pause",
            PlayState::Stop => "stop",
        }
    }
}

impl fmt::Display for PlayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlayState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "play" => Ok(PlayState::Play),
            "pause" => Ok(PlayState::Pause),
            "stop" => Ok(PlayState::Stop),
            other => Err(format!("unknown play state: {other}")),
        }
    }
}

/// Result of the status query.
///
/// Only `state` and `songid` drive the derived signals; the remaining fields
/// are carried for consumers. Fields this crate does not model are kept in
/// `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Playback state
    pub state: PlayState,
    /// Queue id of the current song, if any
    #[serde(default)]
    pub songid: Option<u64>,
    /// Queue position of the current song
    #[serde(default)]
    pub song: Option<u32>,
    /// Queue id of the next song
    #[serde(default)]
    pub nextsongid: Option<u64>,
    /// Queue position of the next song
    #[serde(default)]
    pub nextsong: Option<u32>,
    /// Volume 0-100, absent when no mixer is available
    #[serde(default)]
    pub volume: Option<i32>,
    #[serde(default)]
    pub repeat: bool,
    #[serde(default)]
    pub random: bool,
    #[serde(default)]
    pub single: bool,
    #[serde(default)]
    pub consume: bool,
    /// Queue version
    #[serde(default)]
    pub playlist: u64,
    /// Queue length
    #[serde(default)]
    pub playlistlength: u32,
    /// Seconds elapsed in the current song
    #[serde(default)]
    pub elapsed: Option<f64>,
    /// Duration of the current song in seconds
    #[serde(default)]
    pub duration: Option<f64>,
    /// Instantaneous bitrate in kbps
    #[serde(default)]
    pub bitrate: Option<u32>,
    /// Audio format as `samplerate:bits:channels`
    #[serde(default)]
    pub audio: Option<String>,
    /// Job id of a running database update
    #[serde(default)]
    pub updating_db: Option<u64>,
    /// Last player error
    #[serde(default)]
    pub error: Option<String>,
    /// Partition this client is bound to
    #[serde(default)]
    pub partition: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl StatusSnapshot {
    /// Snapshot with only the fields that drive the derived signals.
    pub fn new(state: PlayState, songid: Option<u64>) -> Self {
        Self {
            state,
            songid,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_play_state_parse() {
        assert_eq!("play".parse::<PlayState>(), Ok(PlayState::Play));
        assert_eq!("pause".parse::<PlayState>(), Ok(PlayState::Pause));
        assert_eq!("stop".parse::<PlayState>(), Ok(PlayState::Stop));
        assert!("playing".parse::<PlayState>().is_err());
        assert_eq!(PlayState::default(), PlayState::Stop);
    }

    #[test]
    fn test_status_deserialize_keeps_unknown_fields() {
        let status: StatusSnapshot = serde_json::from_value(json!({
            "state": "play",
            "songid": 12,
            "song": 3,
            "volume": 80,
            "repeat": true,
            "playlistlength": 20,
            "elapsed": 12.5,
            "mixrampdb": 0.0,
            "xfade": 5
        }))
        .unwrap();

        assert_eq!(status.state, PlayState::Play);
        assert_eq!(status.songid, Some(12));
        assert_eq!(status.song, Some(3));
        assert_eq!(status.volume, Some(80));
        assert!(status.repeat);
        assert!(!status.random);
        assert_eq!(status.extra.get("xfade"), Some(&json!(5)));
        assert!(status.extra.contains_key("mixrampdb"));
    }

    #[test]
    fn test_status_without_song() {
        let status: StatusSnapshot = serde_json::from_value(json!({ "state": "stop" })).unwrap();
        assert_eq!(status, StatusSnapshot::new(PlayState::Stop, None));
    }
}
