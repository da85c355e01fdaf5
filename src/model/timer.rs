use std::fmt;

use serde::{Deserialize, Serialize};

pub const POMODORO_SECS: i64 = 25 * 60;
pub const SHORT_BREAK_SECS: i64 = 5 * 60;
pub const LONG_BREAK_SECS: i64 = 15 * 60;

/// Every Nth completed focus interval earns a long break
pub const LONG_BREAK_EVERY: u32 = 4;

/// Which interval the focus timer is counting down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimerMode {
    Pomodoro,
    ShortBreak,
    LongBreak,
}

impl TimerMode {
    pub fn duration_secs(self) -> i64 {
        match self {
            TimerMode::Pomodoro => POMODORO_SECS,
            TimerMode::ShortBreak => SHORT_BREAK_SECS,
            TimerMode::LongBreak => LONG_BREAK_SECS,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimerMode::Pomodoro => "Focus",
            TimerMode::ShortBreak => "Short Break",
            TimerMode::LongBreak => "Long Break",
        }
    }
}

impl fmt::Display for TimerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Focus timer state. Transitions live in `ops::timer_ops`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusTimer {
    pub mode: TimerMode,
    pub running: bool,
    /// Seconds left; completion fires on the tick that takes it below zero
    pub seconds_remaining: i64,
    /// Completed focus intervals; breaks never count
    pub completed_cycles: u32,
}

impl Default for FocusTimer {
    fn default() -> Self {
        FocusTimer {
            mode: TimerMode::Pomodoro,
            running: false,
            seconds_remaining: POMODORO_SECS,
            completed_cycles: 0,
        }
    }
}

impl FocusTimer {
    pub fn new() -> Self {
        Self::default()
    }
}
