//! Focus timer transitions.
//!
//! The timer never schedules itself. A host calls `tick` once per elapsed
//! second while the timer is running (or `advance` with a batch of seconds).

use crate::model::timer::{FocusTimer, LONG_BREAK_EVERY, TimerMode};

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The timer was idle
    Ignored,
    /// One second counted down
    Counted,
    /// The interval ran out and the timer switched modes and stopped
    Completed { finished: TimerMode, next: TimerMode },
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// Idle → Running. Returns false if already running.
pub fn start(timer: &mut FocusTimer) -> bool {
    if timer.running {
        return false;
    }
    timer.running = true;
    true
}

/// Running → Idle. Returns false if already idle.
pub fn pause(timer: &mut FocusTimer) -> bool {
    if !timer.running {
        return false;
    }
    timer.running = false;
    true
}

/// Back to a fresh, idle focus interval with no completed cycles.
pub fn reset(timer: &mut FocusTimer) {
    *timer = FocusTimer::default();
}

/// Count one second down. Completion fires once the remaining time drops
/// below zero, so an interval of N seconds takes N + 1 ticks.
pub fn tick(timer: &mut FocusTimer) -> TickOutcome {
    if !timer.running {
        return TickOutcome::Ignored;
    }
    timer.seconds_remaining -= 1;
    if timer.seconds_remaining < 0 {
        return complete(timer);
    }
    TickOutcome::Counted
}

/// Feed up to `seconds` ticks. Stops early when the interval completes,
/// since completion also stops the timer.
pub fn advance(timer: &mut FocusTimer, seconds: u64) -> TickOutcome {
    let mut last = TickOutcome::Ignored;
    for _ in 0..seconds {
        last = tick(timer);
        match last {
            TickOutcome::Counted => continue,
            TickOutcome::Ignored | TickOutcome::Completed { .. } => break,
        }
    }
    last
}

fn complete(timer: &mut FocusTimer) -> TickOutcome {
    let finished = timer.mode;
    timer.running = false;
    let next = match finished {
        TimerMode::Pomodoro => {
            timer.completed_cycles += 1;
            if timer.completed_cycles % LONG_BREAK_EVERY == 0 {
                TimerMode::LongBreak
            } else {
                TimerMode::ShortBreak
            }
        }
        TimerMode::ShortBreak | TimerMode::LongBreak => TimerMode::Pomodoro,
    };
    timer.mode = next;
    timer.seconds_remaining = next.duration_secs();
    TickOutcome::Completed { finished, next }
}

// ---------------------------------------------------------------------------
// Display helpers
// ---------------------------------------------------------------------------

/// Elapsed fraction of the current interval. Reads slightly negative only in
/// the instant before completion fires.
pub fn progress(timer: &FocusTimer) -> f64 {
    let total = timer.mode.duration_secs() as f64;
    (total - timer.seconds_remaining as f64) / total
}

/// `MM:SS`, clamped at zero
pub fn format_clock(seconds: i64) -> String {
    let s = seconds.max(0);
    format!("{:02}:{:02}", s / 60, s % 60)
}
