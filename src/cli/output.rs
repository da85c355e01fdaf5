use serde::Serialize;

use crate::model::bucket::{BucketKey, Buckets};
use crate::model::goal::Goal;
use crate::model::task::{Priority, Task, TimeCategory};
use crate::model::timer::FocusTimer;
use crate::ops::command::Notice;
use crate::ops::goal_ops;
use crate::ops::rollover::RolloverReport;
use crate::ops::stats::DashboardStats;
use crate::ops::timer_ops;

/// How many characters of an ID to show in text output
const SHORT_ID_LEN: usize = 8;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    pub id: String,
    pub time: TimeCategory,
    pub priority: Priority,
    pub text: String,
    pub completed: bool,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct GoalJson {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub target_year: i32,
    pub status: &'static str,
    pub progress: u8,
    pub milestones: Vec<MilestoneJson>,
}

#[derive(Serialize)]
pub struct MilestoneJson {
    pub id: String,
    pub text: String,
    pub completed: bool,
}

#[derive(Serialize)]
pub struct CompletionJson {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub rate: u8,
}

#[derive(Serialize)]
pub struct StatsJson {
    pub overall: CompletionJson,
    pub by_time: Vec<TimeStatsJson>,
    pub by_priority: Vec<PriorityCountJson>,
}

#[derive(Serialize)]
pub struct TimeStatsJson {
    pub time: TimeCategory,
    #[serde(flatten)]
    pub completion: CompletionJson,
}

#[derive(Serialize)]
pub struct PriorityCountJson {
    pub priority: Priority,
    pub count: usize,
}

#[derive(Serialize)]
pub struct TimerJson {
    pub mode: &'static str,
    pub running: bool,
    pub seconds_remaining: i64,
    pub clock: String,
    pub completed_cycles: u32,
    pub progress: f64,
}

#[derive(Serialize)]
pub struct NoticeJson {
    pub kind: &'static str,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

pub fn task_to_json(key: BucketKey, task: &Task) -> TaskJson {
    TaskJson {
        id: task.id.clone(),
        time: key.time,
        priority: key.priority,
        text: task.text.clone(),
        completed: task.is_completed,
        created_at: task.created_at.to_rfc3339(),
    }
}

pub fn goal_to_json(goal: &Goal) -> GoalJson {
    GoalJson {
        id: goal.id.clone(),
        title: goal.title.clone(),
        description: goal.description.clone(),
        target_year: goal.target_year,
        status: goal.status.label(),
        progress: goal_ops::progress(goal),
        milestones: goal
            .milestones
            .iter()
            .map(|m| MilestoneJson {
                id: m.id.clone(),
                text: m.text.clone(),
                completed: m.is_completed,
            })
            .collect(),
    }
}

pub fn stats_to_json(stats: &DashboardStats) -> StatsJson {
    let completion = |c: &crate::ops::stats::Completion| CompletionJson {
        total: c.total,
        completed: c.completed,
        pending: c.pending(),
        rate: c.rate(),
    };
    StatsJson {
        overall: completion(&stats.overall),
        by_time: stats
            .by_time
            .iter()
            .map(|(time, c)| TimeStatsJson {
                time: *time,
                completion: completion(c),
            })
            .collect(),
        by_priority: stats
            .by_priority
            .iter()
            .map(|(priority, count)| PriorityCountJson {
                priority: *priority,
                count: *count,
            })
            .collect(),
    }
}

pub fn timer_to_json(timer: &FocusTimer) -> TimerJson {
    TimerJson {
        mode: timer.mode.label(),
        running: timer.running,
        seconds_remaining: timer.seconds_remaining,
        clock: timer_ops::format_clock(timer.seconds_remaining),
        completed_cycles: timer.completed_cycles,
        progress: timer_ops::progress(timer),
    }
}

pub fn notice_to_json(notice: &Notice) -> NoticeJson {
    let kind = match notice {
        Notice::Error { .. } => "error",
        Notice::Info { .. } => "info",
        Notice::Review { .. } => "review",
    };
    NoticeJson {
        kind,
        message: notice.body().to_string(),
    }
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

pub fn format_task_line(task: &Task) -> String {
    let check = if task.is_completed { "x" } else { " " };
    format!("[{}] {} {}", check, short_id(&task.id), task.text)
}

/// The grid, one time horizon at a time, High to Low.
pub fn format_listing(store: &Buckets, only: Option<TimeCategory>, pending: bool) -> Vec<String> {
    let mut lines = Vec::new();
    for time in TimeCategory::ALL {
        if only.is_some_and(|t| t != time) {
            continue;
        }
        if !lines.is_empty() {
            lines.push(String::new());
        }
        let done = store.category(time).filter(|t| t.is_completed).count();
        lines.push(format!(
            "{} ({}/{} done)",
            time,
            done,
            store.category_len(time)
        ));
        for priority in Priority::ALL {
            lines.push(format!("  {}", priority));
            for task in store.bucket(BucketKey::new(time, priority)) {
                if pending && task.is_completed {
                    continue;
                }
                lines.push(format!("    {}", format_task_line(task)));
            }
        }
    }
    lines
}

pub fn format_goal(goal: &Goal) -> Vec<String> {
    let mut lines = vec![format!(
        "{} {} ({}) {}% [{}]",
        short_id(&goal.id),
        goal.title,
        goal.target_year,
        goal_ops::progress(goal),
        goal.status.label()
    )];
    if !goal.description.is_empty() {
        lines.push(format!("    {}", goal.description));
    }
    for m in &goal.milestones {
        let check = if m.is_completed { "x" } else { " " };
        lines.push(format!("  [{}] {} {}", check, short_id(&m.id), m.text));
    }
    lines
}

pub fn format_stats(stats: &DashboardStats) -> Vec<String> {
    let o = &stats.overall;
    let mut lines = vec![
        format!(
            "Tasks: {} total, {} done, {} pending ({}%)",
            o.total,
            o.completed,
            o.pending(),
            o.rate()
        ),
        String::new(),
    ];
    for (time, c) in &stats.by_time {
        lines.push(format!(
            "{:<11} {:>3}/{:<3} {:>3}%",
            time.label(),
            c.completed,
            c.total,
            c.rate()
        ));
    }
    lines.push(String::new());
    for (priority, count) in &stats.by_priority {
        lines.push(format!("{:<7} {}", priority.label(), count));
    }
    lines
}

pub fn format_timer(timer: &FocusTimer) -> String {
    let state = if timer.running { "running" } else { "paused" };
    format!(
        "{} {} ({}) - {} focus cycle{} done",
        timer.mode.label(),
        timer_ops::format_clock(timer.seconds_remaining),
        state,
        timer.completed_cycles,
        if timer.completed_cycles == 1 { "" } else { "s" }
    )
}

/// One line about an opening rollover; `None` if it moved nothing.
pub fn format_rollover(report: &RolloverReport) -> Option<String> {
    if report.is_quiet() {
        return None;
    }
    let mut parts = vec![format!(
        "{} carried to This Week, {} completed cleared from Today",
        report.carried_to_week, report.dropped_today
    )];
    if report.weekly {
        parts.push(format!(
            "week closed: {} carried to This Month",
            report.carried_to_month
        ));
    }
    if report.monthly {
        parts.push(format!(
            "month closed: {} discarded",
            report.discarded_month
        ));
    }
    Some(format!("New day: {}", parts.join("; ")))
}

pub fn format_notice(notice: &Notice) -> String {
    match notice {
        Notice::Review { content } => format!("{}\n{}", notice.title(), content),
        _ => format!("{}: {}", notice.title(), notice.body()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::goal::Milestone;
    use crate::ops::stats;
    use crate::ops::timer_ops::{advance, start};

    fn task(id: &str, text: &str, done: bool) -> Task {
        let mut t = Task::new(text);
        t.id = id.into();
        t.is_completed = done;
        t
    }

    fn sample_store() -> Buckets {
        let mut store = Buckets::new();
        let today_high = BucketKey::new(TimeCategory::Today, Priority::High);
        store
            .bucket_mut(today_high)
            .push(task("0a1b2c3d-aaaa", "write report", false));
        store
            .bucket_mut(today_high)
            .push(task("4e5f6a7b-bbbb", "call bank", true));
        store
            .bucket_mut(BucketKey::new(TimeCategory::ThisMonth, Priority::Low))
            .push(task("8c9d0e1f-cccc", "renew passport", false));
        store
    }

    #[test]
    fn listing_snapshot() {
        let lines = format_listing(&sample_store(), None, false);
        insta::assert_snapshot!(lines.join("\n"), @r"
        Today (1/2 done)
          High
            [ ] 0a1b2c3d write report
            [x] 4e5f6a7b call bank
          Medium
          Low

        This Week (0/0 done)
          High
          Medium
          Low

        This Month (0/1 done)
          High
          Medium
          Low
            [ ] 8c9d0e1f renew passport
        ");
    }

    #[test]
    fn listing_filters() {
        let lines = format_listing(&sample_store(), Some(TimeCategory::Today), true);
        assert_eq!(
            lines,
            vec![
                "Today (1/2 done)",
                "  High",
                "    [ ] 0a1b2c3d write report",
                "  Medium",
                "  Low",
            ]
        );
    }

    #[test]
    fn goal_snapshot() {
        let mut goal = Goal::new("Run a marathon", "sub-4h", 2027);
        goal.id = "feedbeef-1234".into();
        let mut m1 = Milestone::new("10k");
        m1.id = "11111111-a".into();
        m1.is_completed = true;
        let mut m2 = Milestone::new("half");
        m2.id = "22222222-b".into();
        let mut m3 = Milestone::new("full");
        m3.id = "33333333-c".into();
        goal.milestones = vec![m1, m2, m3];

        insta::assert_snapshot!(format_goal(&goal).join("\n"), @r"
        feedbeef Run a marathon (2027) 33% [In Progress]
            sub-4h
          [x] 11111111 10k
          [ ] 22222222 half
          [ ] 33333333 full
        ");
    }

    #[test]
    fn stats_snapshot() {
        let stats = stats::dashboard(&sample_store());
        insta::assert_snapshot!(format_stats(&stats).join("\n"), @r"
        Tasks: 3 total, 1 done, 2 pending (33%)

        Today         1/2    50%
        This Week     0/0     0%
        This Month    0/1     0%

        High    2
        Medium  0
        Low     1
        ");
    }

    #[test]
    fn timer_line() {
        let mut timer = FocusTimer::new();
        assert_eq!(format_timer(&timer), "Focus 25:00 (paused) - 0 focus cycles done");
        start(&mut timer);
        advance(&mut timer, 61);
        assert_eq!(format_timer(&timer), "Focus 23:59 (running) - 0 focus cycles done");
        let json = timer_to_json(&timer);
        assert_eq!(json.clock, "23:59");
        assert_eq!(json.mode, "Focus");
    }

    #[test]
    fn rollover_line() {
        assert_eq!(format_rollover(&RolloverReport::default()), None);
        let report = RolloverReport {
            carried_to_week: 2,
            dropped_today: 1,
            weekly: true,
            carried_to_month: 3,
            ..Default::default()
        };
        assert_eq!(
            format_rollover(&report).unwrap(),
            "New day: 2 carried to This Week, 1 completed cleared from Today; \
             week closed: 3 carried to This Month"
        );
    }

    #[test]
    fn notice_text() {
        assert_eq!(format_notice(&Notice::info("hi")), "Info: hi");
        let review = Notice::Review {
            content: "Good week.\nOnwards.".into(),
        };
        assert_eq!(format_notice(&review), "Weekly Review\nGood week.\nOnwards.");
    }

    #[test]
    fn short_ids() {
        assert_eq!(short_id("0a1b2c3d-aaaa"), "0a1b2c3d");
        assert_eq!(short_id("abc"), "abc");
    }
}
