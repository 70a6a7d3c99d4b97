//! Core types for the mpd-events crate.

use std::fmt;

use uuid::Uuid;

/// MPD idle subsystem reported as changed by the server.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub enum Subsystem {
    /// The song database has been modified after an update
    Database,
    /// A database update has started or finished
    Update,
    /// A stored playlist has been modified, renamed, created or deleted
    StoredPlaylist,
    /// The queue has been modified
    Playlist,
    /// The player has been started, stopped or seeked, or tags changed
    Player,
    /// The volume has been changed
    Mixer,
    /// An audio output has been added, removed, enabled or disabled
    Output,
    /// Options like repeat, random, crossfade or replay gain changed
    Options,
    /// A partition was added, removed or changed
    Partition,
    /// The sticker database has been modified
    Sticker,
    /// A client has subscribed to or unsubscribed from a channel
    Subscription,
    /// A message was received on a subscribed channel
    Message,
    /// A neighbor was found or lost
    Neighbor,
    /// The mount list has changed
    Mount,
    /// Subsystem name not known to this crate
    Other(String),
}

impl Subsystem {
    /// Parse a subsystem name as sent in a `changed:` line.
    ///
    /// Parsing is total: unknown names become [`Subsystem::Other`].
    pub fn parse(name: &str) -> Self {
        match name {
            "database" => Subsystem::Database,
            "update" => Subsystem::Update,
            "stored_playlist" => Subsystem::StoredPlaylist,
            "playlist" => Subsystem::Playlist,
            "player" => Subsystem::Player,
            "mixer" => Subsystem::Mixer,
            "output" => Subsystem::Output,
            "options" => Subsystem::Options,
            "partition" => Subsystem::Partition,
            "sticker" => Subsystem::Sticker,
            "subscription" => Subsystem::Subscription,
            "message" => Subsystem::Message,
            "neighbor" => Subsystem::Neighbor,
            "mount" => Subsystem::Mount,
            other => Subsystem::Other(other.to_string()),
        }
    }

    /// The protocol name of this subsystem.
    pub fn as_str(&self) -> &str {
        match self {
            Subsystem::Database => "database",
            Subsystem::Update => "update",
            Subsystem::StoredPlaylist => "stored_playlist",
            Subsystem::Playlist => "playlist",
            Subsystem::Player => "player",
            Subsystem::Mixer => "mixer",
            Subsystem::Output => "output",
            Subsystem::Options => "options",
            Subsystem::Partition => "partition",
            Subsystem::Sticker => "sticker",
            Subsystem::Subscription => "subscription",
            Subsystem::Message => "message",
            Subsystem::Neighbor => "neighbor",
            Subsystem::Mount => "mount",
            Subsystem::Other(name) => name,
        }
    }
}

impl From<&str> for Subsystem {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three notification kinds a connection delivers to listeners.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum ListenerKind {
    /// Subsystem change notifications
    System,
    /// Connection errors
    Error,
    /// Connection closure
    Close,
}

/// Handle returned when a listener is registered on a connection.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct ListenerId(Uuid);

impl ListenerId {
    /// Allocate a fresh listener id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
