//! Queue entries returned by the track-by-id lookup.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A song in the queue.
///
/// `file` is the stable identity of the song; `id` is its queue id, which
/// changes when the same file is requeued.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Path of the song relative to the music directory, or a stream URI
    pub file: String,
    /// Queue id
    #[serde(default)]
    pub id: Option<u64>,
    /// Queue position
    #[serde(default)]
    pub pos: Option<u32>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub album_artist: Option<String>,
    /// Duration in seconds
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Track {
    /// Create a track with a file and queue id.
    pub fn new(file: impl Into<String>, id: u64) -> Self {
        Self {
            file: file.into(),
            id: Some(id),
            ..Default::default()
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Response of the track-by-id lookup.
///
/// Depending on the client library the record arrives on its own or as the
/// first element of a list; both shapes are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrackLookup {
    Many(Vec<Track>),
    One(Track),
}

impl TrackLookup {
    /// Normalize to the looked-up record, if any.
    pub fn into_track(self) -> Option<Track> {
        match self {
            TrackLookup::One(track) => Some(track),
            TrackLookup::Many(tracks) => tracks.into_iter().next(),
        }
    }
}

impl From<Track> for TrackLookup {
    fn from(track: Track) -> Self {
        TrackLookup::One(track)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_single_record() {
        let lookup: TrackLookup =
            serde_json::from_value(json!({ "file": "a.flac", "id": 4, "title": "A" })).unwrap();
        let track = lookup.into_track().unwrap();
        assert_eq!(track.file, "a.flac");
        assert_eq!(track.id, Some(4));
        assert_eq!(track.title.as_deref(), Some("A"));
    }

    #[test]
    fn test_lookup_list_takes_first() {
        let lookup: TrackLookup = serde_json::from_value(json!([
            { "file": "a.flac", "id": 4 },
            { "file": "b.flac", "id": 5 }
        ]))
        .unwrap();
        assert_eq!(lookup.into_track().unwrap().file, "a.flac");
    }

    #[test]
    fn test_lookup_empty_list() {
        let lookup: TrackLookup = serde_json::from_value(json!([])).unwrap();
        assert_eq!(lookup.into_track(), None);
    }
}
