//! Date-boundary rollover.
//!
//! Runs once per calendar day when a session opens. Incomplete Today tasks
//! are re-filed under This Week / Medium; on Sundays the week's leftovers go
//! to This Month / Medium; on the 1st of the month This Month is emptied.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate, Weekday};

use crate::model::bucket::{BucketKey, Buckets};
use crate::model::task::{Priority, Task, TimeCategory};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Carried tasks always land here, whatever their original priority.
const WEEK_CARRY: BucketKey = BucketKey {
    time: TimeCategory::ThisWeek,
    priority: Priority::Medium,
};

const MONTH_CARRY: BucketKey = BucketKey {
    time: TimeCategory::ThisMonth,
    priority: Priority::Medium,
};

/// What a rollover pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RolloverReport {
    /// Incomplete Today tasks prepended to This Week / Medium
    pub carried_to_week: usize,
    /// Completed Today tasks dropped
    pub dropped_today: usize,
    /// Whether the Sunday step ran
    pub weekly: bool,
    /// Incomplete This Week tasks prepended to This Month / Medium
    pub carried_to_month: usize,
    /// Completed or just-carried tasks dropped with the week
    pub dropped_week: usize,
    /// Whether the first-of-month step ran
    pub monthly: bool,
    /// Tasks discarded when This Month was cleared
    pub discarded_month: usize,
}

impl RolloverReport {
    /// True when the pass removed or moved nothing
    pub fn is_quiet(&self) -> bool {
        self.carried_to_week == 0
            && self.dropped_today == 0
            && self.carried_to_month == 0
            && self.dropped_week == 0
            && self.discarded_month == 0
    }
}

/// Result of reconciling a stored snapshot against today
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub tasks: Buckets,
    /// New value for the last-visited date
    pub visited: String,
    /// `None` when no rollover was due
    pub report: Option<RolloverReport>,
}

/// Format a date the way `lastVisitedDate` is stored.
pub fn today_str(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Whether a session last seen on `last_visited` needs a rollover today.
///
/// A first visit (no stored date) never rolls over.
pub fn rollover_due(last_visited: Option<&str>, today: NaiveDate) -> bool {
    match last_visited {
        Some(last) => last != today_str(today),
        None => false,
    }
}

/// Reconcile a task grid against today's date.
///
/// Pure: the input is never modified. Running it again with the returned
/// `visited` date short-circuits, so a day rolls over at most once.
pub fn reconcile(store: &Buckets, last_visited: Option<&str>, today: NaiveDate) -> Reconciliation {
    let visited = today_str(today);
    if !rollover_due(last_visited, today) {
        return Reconciliation {
            tasks: store.clone(),
            visited,
            report: None,
        };
    }

    let mut tasks = store.clone();
    let mut report = RolloverReport::default();

    let carried = roll_day(&mut tasks, &mut report);
    if today.weekday() == Weekday::Sun {
        roll_week(&mut tasks, &carried, &mut report);
    }
    if today.day() == 1 {
        roll_month(&mut tasks, &mut report);
    }

    Reconciliation {
        tasks,
        visited,
        report: Some(report),
    }
}

/// Prepend incomplete Today tasks (High, Medium, Low order) to This Week /
/// Medium and clear Today. Returns the ids that were carried.
fn roll_day(tasks: &mut Buckets, report: &mut RolloverReport) -> HashSet<String> {
    let (incomplete, completed): (Vec<Task>, Vec<Task>) = tasks
        .category(TimeCategory::Today)
        .cloned()
        .partition(|t| !t.is_completed);

    report.carried_to_week = incomplete.len();
    report.dropped_today = completed.len();
    let carried = incomplete.iter().map(|t| t.id.clone()).collect();

    prepend(tasks.bucket_mut(WEEK_CARRY), incomplete);
    tasks.clear_category(TimeCategory::Today);
    carried
}

/// Prepend incomplete This Week tasks not carried today to This Month /
/// Medium, then clear the whole week including today's carry-over.
fn roll_week(tasks: &mut Buckets, carried_today: &HashSet<String>, report: &mut RolloverReport) {
    report.weekly = true;
    let leftovers: Vec<Task> = tasks
        .category(TimeCategory::ThisWeek)
        .filter(|t| !t.is_completed && !carried_today.contains(&t.id))
        .cloned()
        .collect();

    report.carried_to_month = leftovers.len();
    report.dropped_week = tasks.category_len(TimeCategory::ThisWeek) - leftovers.len();

    prepend(tasks.bucket_mut(MONTH_CARRY), leftovers);
    tasks.clear_category(TimeCategory::ThisWeek);
}

/// Empty This Month. Nothing is carried anywhere.
fn roll_month(tasks: &mut Buckets, report: &mut RolloverReport) {
    report.monthly = true;
    report.discarded_month = tasks.category_len(TimeCategory::ThisMonth);
    tasks.clear_category(TimeCategory::ThisMonth);
}

fn prepend(bucket: &mut Vec<Task>, front: Vec<Task>) {
    bucket.splice(0..0, front);
}
