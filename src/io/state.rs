use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::io::recovery::atomic_write;
use crate::model::timer::FocusTimer;
use crate::ops::timer_ops::{self, TickOutcome};

const TIMER_FILE: &str = ".timer.json";

/// Focus timer kept between `pri` invocations (written to .timer.json)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    #[serde(default)]
    pub timer: FocusTimer,
    /// Wall-clock instant up to which ticks have been fed. Set while running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub running_since: Option<DateTime<Utc>>,
}

impl TimerState {
    /// Feed the whole seconds elapsed since the anchor into the timer.
    ///
    /// The anchor moves forward by the seconds consumed, so a fractional
    /// second carries over to the next catch-up. Completion stops the timer
    /// and clears the anchor.
    pub fn catch_up(&mut self, now: DateTime<Utc>) -> TickOutcome {
        let Some(since) = self.running_since else {
            return TickOutcome::Ignored;
        };
        if !self.timer.running {
            self.running_since = None;
            return TickOutcome::Ignored;
        }
        let elapsed = (now - since).num_seconds().max(0) as u64;
        if elapsed == 0 {
            return TickOutcome::Ignored;
        }
        let before = self.timer.seconds_remaining;
        let outcome = timer_ops::advance(&mut self.timer, elapsed);
        match outcome {
            TickOutcome::Completed { .. } => self.running_since = None,
            _ => {
                let consumed = before - self.timer.seconds_remaining;
                self.running_since = Some(since + chrono::Duration::seconds(consumed));
            }
        }
        outcome
    }

    pub fn start(&mut self, now: DateTime<Utc>) -> bool {
        let started = timer_ops::start(&mut self.timer);
        if started {
            self.running_since = Some(now);
        }
        started
    }

    /// Catch up first so the paused clock reflects time already spent.
    pub fn pause(&mut self, now: DateTime<Utc>) -> bool {
        self.catch_up(now);
        self.running_since = None;
        timer_ops::pause(&mut self.timer)
    }

    pub fn reset(&mut self) {
        timer_ops::reset(&mut self.timer);
        self.running_since = None;
    }
}

/// Read .timer.json; a missing or unreadable file is a fresh timer
pub fn read_timer_state(data_dir: &Path) -> TimerState {
    fs::read_to_string(data_dir.join(TIMER_FILE))
        .ok()
        .and_then(|content| serde_json::from_str(&content).ok())
        .unwrap_or_default()
}

pub fn write_timer_state(data_dir: &Path, state: &TimerState) -> Result<(), std::io::Error> {
    let content = serde_json::to_string_pretty(state)?;
    atomic_write(&data_dir.join(TIMER_FILE), content.as_bytes())
}

/// One step of a foreground countdown: re-read the stored timer, catch it up
/// to `now` and write it back.
///
/// The stored file is the source of truth, so a pause or reset made by
/// another `pri` process is picked up here instead of being overwritten.
/// A timer that is not running is returned as found and not rewritten.
pub fn advance_stored(
    data_dir: &Path,
    now: DateTime<Utc>,
) -> Result<(TimerState, TickOutcome), std::io::Error> {
    let mut state = read_timer_state(data_dir);
    if !state.timer.running {
        return Ok((state, TickOutcome::Ignored));
    }
    let outcome = state.catch_up(now);
    write_timer_state(data_dir, &state)?;
    Ok((state, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::timer::{POMODORO_SECS, SHORT_BREAK_SECS, TimerMode};
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_750_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn write_and_read_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut state = TimerState::default();
        state.start(at(0));
        write_timer_state(dir.path(), &state).unwrap();
        assert_eq!(read_timer_state(dir.path()), state);
    }

    #[test]
    fn write_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        write_timer_state(dir.path(), &TimerState::default()).unwrap();
        write_timer_state(dir.path(), &TimerState::default()).unwrap();
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from(TIMER_FILE)]);
    }

    #[test]
    fn advance_stored_counts_down_on_disk() {
        let dir = TempDir::new().unwrap();
        let mut state = TimerState::default();
        state.start(at(0));
        write_timer_state(dir.path(), &state).unwrap();

        let (state, outcome) = advance_stored(dir.path(), at(30)).unwrap();
        assert_eq!(outcome, TickOutcome::Counted);
        assert_eq!(state.timer.seconds_remaining, POMODORO_SECS - 30);
        assert_eq!(read_timer_state(dir.path()), state);
    }

    #[test]
    fn advance_stored_respects_a_pause_made_elsewhere() {
        let dir = TempDir::new().unwrap();
        let mut running = TimerState::default();
        running.start(at(0));
        write_timer_state(dir.path(), &running).unwrap();
        advance_stored(dir.path(), at(10)).unwrap();

        // another process pauses, then resets
        let mut other = read_timer_state(dir.path());
        other.pause(at(20));
        write_timer_state(dir.path(), &other).unwrap();
        let (state, outcome) = advance_stored(dir.path(), at(40)).unwrap();
        assert_eq!(outcome, TickOutcome::Ignored);
        assert!(!state.timer.running);
        assert_eq!(state.timer.seconds_remaining, POMODORO_SECS - 20);

        other.reset();
        write_timer_state(dir.path(), &other).unwrap();
        advance_stored(dir.path(), at(50)).unwrap();
        assert_eq!(read_timer_state(dir.path()), TimerState::default());
    }

    #[test]
    fn missing_or_malformed_file_is_fresh() {
        let dir = TempDir::new().unwrap();
        assert_eq!(read_timer_state(dir.path()), TimerState::default());
        fs::write(dir.path().join(TIMER_FILE), "not json {{{").unwrap();
        assert_eq!(read_timer_state(dir.path()), TimerState::default());
    }

    #[test]
    fn catch_up_counts_elapsed_seconds() {
        let mut state = TimerState::default();
        state.start(at(0));
        assert_eq!(state.catch_up(at(90)), TickOutcome::Counted);
        assert_eq!(state.timer.seconds_remaining, POMODORO_SECS - 90);
        assert_eq!(state.running_since, Some(at(90)));
        // no double counting
        assert_eq!(state.catch_up(at(90)), TickOutcome::Ignored);
        assert_eq!(state.timer.seconds_remaining, POMODORO_SECS - 90);
    }

    #[test]
    fn catch_up_past_the_end_completes_once() {
        let mut state = TimerState::default();
        state.start(at(0));
        let outcome = state.catch_up(at(10_000));
        assert_eq!(
            outcome,
            TickOutcome::Completed {
                finished: TimerMode::Pomodoro,
                next: TimerMode::ShortBreak
            }
        );
        assert!(!state.timer.running);
        assert!(state.running_since.is_none());
        assert_eq!(state.timer.seconds_remaining, SHORT_BREAK_SECS);
        assert_eq!(state.timer.completed_cycles, 1);
    }

    #[test]
    fn pause_freezes_the_clock() {
        let mut state = TimerState::default();
        state.start(at(0));
        assert!(state.pause(at(60)));
        assert_eq!(state.timer.seconds_remaining, POMODORO_SECS - 60);
        assert_eq!(state.catch_up(at(600)), TickOutcome::Ignored);
        assert_eq!(state.timer.seconds_remaining, POMODORO_SECS - 60);
        assert!(!state.pause(at(700)));
    }
}
