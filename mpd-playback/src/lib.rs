//! # mpd-playback
//!
//! Measures how long each track actually played.
//!
//! The accumulator watches the status signal (reduced to a de-duplicated
//! `(state, songid)` timeline) together with the current track. Observations
//! of the current track are collected into a window until the track changes
//! or playback stops; the window is then folded into a [`PlaybackResult`].
//! Time accrues only between a `play` observation and the next pause or
//! window end.
//!
//! ```rust,ignore
//! use mpd_playback::{playback_signal, MonotonicClock};
//!
//! let playback = playback_signal(
//!     signals.status.clone(),
//!     signals.current_song.clone(),
//!     Arc::new(MonotonicClock::new()),
//!     64,
//! );
//! let mut results = playback.subscribe();
//! while let Some(Ok(result)) = results.recv().await {
//!     println!("{} played for {:?}", result.song.file, result.playback);
//! }
//! ```

pub mod accumulator;
pub mod clock;
pub mod fold;
pub mod observation;

pub use accumulator::{playback_signal, PlaybackAccumulator};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use fold::fold_window;
pub use observation::{Observation, PlaybackResult, SongTimestamp};
