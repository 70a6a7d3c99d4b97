//! Folding a closed playback window into a [`PlaybackResult`].

use std::time::Duration;

use chrono::{DateTime, Utc};
use mpd_signals::{PlayState, Track};

use crate::observation::{Observation, PlaybackResult};

/// Running state of the fold.
#[derive(Debug, Default)]
struct FoldState {
    song: Option<Track>,
    playback: Duration,
    reference: Option<DateTime<Utc>>,
}

impl FoldState {
    /// Add the time since the reference, then drop the reference.
    fn accrue(&mut self, ts: DateTime<Utc>) {
        if let Some(reference) = self.reference.take() {
            // A clock step backwards contributes nothing.
            self.playback += (ts - reference).to_std().unwrap_or(Duration::ZERO);
        }
    }
}

/// Fold a window, left to right, into the time spent playing.
///
/// `play` starts a reference point and `stop` leaves it untouched. Any other
/// observation, including the closing one, adds the time since the reference
/// and clears it, so time only accrues while a play reference is active.
///
/// Returns `None` for a window without a song.
pub fn fold_window(observations: &[Observation]) -> Option<PlaybackResult> {
    let mut state = FoldState::default();
    let mut last_ts = None;

    for observation in observations {
        let ts = observation.ts();
        match observation {
            Observation::Status {
                song,
                state: play_state,
                ..
            } => {
                if state.song.is_none() {
                    state.song = Some(song.clone());
                }
                match play_state {
                    PlayState::Play => state.reference = Some(ts),
                    PlayState::Stop => {}
                    PlayState::Pause => state.accrue(ts),
                }
            }
            Observation::Closing { .. } => state.accrue(ts),
        }
        last_ts = Some(ts);
    }

    Some(PlaybackResult {
        song: state.song?,
        playback: state.playback,
        ts: last_ts?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use proptest::prelude::*;
    use rstest::rstest;

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + TimeDelta::milliseconds(ms)
    }

    fn song() -> Track {
        Track::new("music/a.flac", 1)
    }

    fn obs(state: PlayState, ms: i64) -> Observation {
        Observation::Status {
            song: song(),
            state,
            songid: Some(1),
            ts: at(ms),
        }
    }

    fn closing(ms: i64) -> Observation {
        Observation::Closing { ts: at(ms) }
    }

    fn millis(observations: &[Observation]) -> u128 {
        fold_window(observations).unwrap().playback.as_millis()
    }

    #[test]
    fn test_play_until_close() {
        let result = fold_window(&[obs(PlayState::Play, 0), closing(9000)]).unwrap();
        assert_eq!(result.playback, Duration::from_millis(9000));
        assert_eq!(result.song, song());
        assert_eq!(result.ts, at(9000));
    }

    #[rstest]
    #[case::pause_then_resume(&[obs(PlayState::Play, 0), obs(PlayState::Pause, 3000), obs(PlayState::Play, 5000), closing(6000)], 4000)]
    #[case::pause_until_close(&[obs(PlayState::Play, 0), obs(PlayState::Pause, 3000), closing(10000)], 3000)]
    #[case::stop_keeps_reference(&[obs(PlayState::Play, 0), obs(PlayState::Stop, 2000), closing(5000)], 5000)]
    #[case::stopped_window(&[obs(PlayState::Stop, 0), closing(5000)], 0)]
    #[case::paused_window(&[obs(PlayState::Pause, 0), closing(5000)], 0)]
    #[case::repeated_play_resets_reference(&[obs(PlayState::Play, 0), obs(PlayState::Play, 4000), closing(5000)], 1000)]
    fn test_fold_cases(#[case] observations: &[Observation], #[case] expected: u128) {
        assert_eq!(millis(observations), expected);
    }

    #[test]
    fn test_backwards_clock_adds_nothing() {
        assert_eq!(millis(&[obs(PlayState::Play, 5000), closing(1000)]), 0);
    }

    #[test]
    fn test_window_without_song_has_no_result() {
        assert_eq!(fold_window(&[]), None);
        assert_eq!(fold_window(&[closing(1000)]), None);
    }

    #[test]
    fn test_first_observation_seeds_song() {
        let other = Observation::Status {
            song: Track::new("music/b.flac", 2),
            state: PlayState::Play,
            songid: Some(2),
            ts: at(100),
        };
        let result = fold_window(&[obs(PlayState::Play, 0), other, closing(200)]).unwrap();
        assert_eq!(result.song.file, "music/a.flac");
    }

    fn arb_state() -> impl Strategy<Value = PlayState> {
        prop_oneof![Just(PlayState::Play), Just(PlayState::Pause), Just(PlayState::Stop)]
    }

    proptest! {
        #[test]
        fn prop_playback_never_exceeds_window_span(
            steps in proptest::collection::vec((arb_state(), 0i64..10_000), 1..32),
            tail in 0i64..10_000,
        ) {
            let mut ts = 0;
            let mut window = Vec::new();
            for (state, gap) in steps {
                ts += gap;
                window.push(obs(state, ts));
            }
            window.push(closing(ts + tail));

            let playback = fold_window(&window).unwrap().playback;
            prop_assert!(playback <= Duration::from_millis((ts + tail) as u64));
        }

        #[test]
        fn prop_no_play_means_no_playback(
            steps in proptest::collection::vec((prop_oneof![Just(PlayState::Pause), Just(PlayState::Stop)], 0i64..10_000), 1..32),
        ) {
            let mut ts = 0;
            let mut window = Vec::new();
            for (state, gap) in steps {
                ts += gap;
                window.push(obs(state, ts));
            }
            window.push(closing(ts + 1000));
            prop_assert_eq!(fold_window(&window).unwrap().playback, Duration::ZERO);
        }
    }
}
