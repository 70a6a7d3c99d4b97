//! Playback Time Accumulator.
//!
//! Combines the status timeline with the current track into playback
//! windows. A window is closed by a track change or by a `stop` entry; each
//! closed window is folded into one [`PlaybackResult`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use mpd_signals::{by_eq, PlayState, Publisher, Signal, SignalTask, StatusSnapshot, Track};
use tracing::{debug, trace};

use crate::clock::Clock;
use crate::fold::fold_window;
use crate::observation::{Observation, PlaybackResult, SongTimestamp};

/// Window state machine of the accumulator.
///
/// The first track and the first timeline entry are baselines. Afterwards a
/// track change or a `stop` entry is a boundary; the boundary is handled
/// before the entry that caused it joins a window, so the `stop` entry opens
/// the next window.
#[derive(Debug, Default)]
pub struct PlaybackAccumulator {
    track: Option<Track>,
    latest: Option<SongTimestamp>,
    window: Vec<Observation>,
    seen_track: bool,
    seen_status: bool,
}

impl PlaybackAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The track observations are currently attributed to.
    pub fn track(&self) -> Option<&Track> {
        self.track.as_ref()
    }

    /// Observations of the open window.
    pub fn window(&self) -> &[Observation] {
        &self.window
    }

    /// A new current track, seen at `now`.
    ///
    /// Closes the open window unless this is the first track, then
    /// re-baselines the new track on the latest timeline entry.
    pub fn on_track(&mut self, track: Track, now: DateTime<Utc>) -> Option<PlaybackResult> {
        let result = if self.seen_track { self.close(now) } else { None };
        self.seen_track = true;

        debug!(file = %track.file, id = ?track.id, "Current track changed");
        self.track = Some(track);
        if let Some(entry) = self.latest.clone() {
            self.observe(&entry);
        }
        result
    }

    /// A new, already de-duplicated, timeline entry.
    pub fn on_status(&mut self, entry: SongTimestamp) -> Option<PlaybackResult> {
        let boundary = self.seen_status && entry.state == PlayState::Stop;
        self.seen_status = true;

        let result = if boundary { self.close(entry.ts) } else { None };
        self.observe(&entry);
        self.latest = Some(entry);
        result
    }

    /// Close the open window at `now`; used when the inputs complete.
    pub fn finish(&mut self, now: DateTime<Utc>) -> Option<PlaybackResult> {
        self.close(now)
    }

    fn observe(&mut self, entry: &SongTimestamp) {
        if let Some(track) = &self.track {
            // Entries for another song belong to a track not yet fetched.
            if track.id.is_some() && entry.songid == track.id {
                trace!(state = %entry.state, "Observation added to window");
                self.window.push(Observation::status(track, entry));
            }
        }
    }

    fn close(&mut self, ts: DateTime<Utc>) -> Option<PlaybackResult> {
        if self.window.is_empty() {
            return None;
        }
        let mut window = std::mem::take(&mut self.window);
        window.push(Observation::Closing { ts });
        let result = fold_window(&window)?;
        debug!(
            file = %result.song.file,
            playback = ?result.playback,
            "Playback window closed"
        );
        Some(result)
    }
}

/// Declare the playback signal over `status` and `current_song`.
///
/// Like every other signal it runs only while subscribed; subscribing starts
/// (or shares) both inputs. Errors of either input are relayed once.
pub fn playback_signal(
    status: Signal<StatusSnapshot>,
    current_song: Signal<Option<Track>>,
    clock: Arc<dyn Clock>,
    capacity: usize,
) -> Signal<PlaybackResult> {
    let task: SignalTask<PlaybackResult> = Arc::new(move |publisher: Publisher<PlaybackResult>| {
        let status = status.clone();
        let current_song = current_song.clone();
        let clock = Arc::clone(&clock);
        run(status, current_song, clock, publisher).boxed()
    });
    Signal::new("playback", capacity, task)
}

async fn run(
    status: Signal<StatusSnapshot>,
    current_song: Signal<Option<Track>>,
    clock: Arc<dyn Clock>,
    publisher: Publisher<PlaybackResult>,
) {
    let mut status_items = status.subscribe();
    let mut song_items = current_song.subscribe();
    let (mut status_done, mut song_done) = (false, false);

    let mut timeline = by_eq::<SongTimestamp>();
    let mut accumulator = PlaybackAccumulator::new();

    loop {
        tokio::select! {
            // Status first, so an entry and the track it leads to are seen in
            // cause order.
            biased;

            item = status_items.recv(), if !status_done => match item {
                Some(Ok(snapshot)) => {
                    let entry = SongTimestamp::from_status(&snapshot, clock.now());
                    if timeline.check(&entry) {
                        if let Some(result) = accumulator.on_status(entry) {
                            publisher.emit(result);
                        }
                    }
                }
                Some(Err(error)) => publisher.publish(Err(error)),
                None => status_done = true,
            },

            item = song_items.recv(), if !song_done => match item {
                Some(Ok(Some(track))) => {
                    if let Some(result) = accumulator.on_track(track, clock.now()) {
                        publisher.emit(result);
                    }
                }
                Some(Ok(None)) => {}
                // Status errors already arrived through the status input.
                Some(Err(error)) if error.signal() != status.name() => publisher.publish(Err(error)),
                Some(Err(_)) => {}
                None => song_done = true,
            },

            else => break,
        }
    }

    if let Some(result) = accumulator.finish(clock.now()) {
        publisher.emit(result);
    }
    debug!("Playback inputs completed");
}
