//! End-to-end session behavior against an in-memory store: opening,
//! rollover, commands, and text-service results landing in the grid.

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use serde_json::json;

use priority::io::snapshot_io::MemoryStore;
use priority::model::bucket::BucketKey;
use priority::model::task::{Priority, TimeCategory};
use priority::ops::command::{Command, Notice};
use priority::ops::session::{PlannerError, Session};
use priority::ops::transform::{TransformError, TransformGateway};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn key(time: TimeCategory, priority: Priority) -> BucketKey {
    BucketKey::new(time, priority)
}

fn task(id: &str, text: &str, done: bool) -> serde_json::Value {
    json!({ "id": id, "text": text, "isCompleted": done, "createdAt": "2025-07-01T09:00:00Z" })
}

fn ids(session: &Session<&MemoryStore>, key: BucketKey) -> Vec<String> {
    session
        .snapshot()
        .tasks
        .bucket(key)
        .iter()
        .map(|t| t.id.clone())
        .collect()
}

/// Canned answers for every request.
struct CannedGateway {
    pieces: Vec<String>,
    review: String,
}

impl TransformGateway for CannedGateway {
    fn breakdown(&self, _task_text: &str) -> Result<Vec<String>, TransformError> {
        Ok(self.pieces.clone())
    }

    fn suggest(&self, _monthly_text: &str) -> Result<Vec<String>, TransformError> {
        Ok(self.pieces.clone())
    }

    fn review(&self, _completed_text: &str) -> Result<String, TransformError> {
        Ok(self.review.clone())
    }
}

struct DownGateway;

impl TransformGateway for DownGateway {
    fn breakdown(&self, _task_text: &str) -> Result<Vec<String>, TransformError> {
        Err(TransformError::Request("connection refused".into()))
    }

    fn suggest(&self, _monthly_text: &str) -> Result<Vec<String>, TransformError> {
        Err(TransformError::Request("connection refused".into()))
    }

    fn review(&self, _completed_text: &str) -> Result<String, TransformError> {
        Err(TransformError::Request("connection refused".into()))
    }
}

// ---------------------------------------------------------------------------
// Opening and rollover
// ---------------------------------------------------------------------------

#[test]
fn sunday_visit_carries_today_then_closes_the_week() {
    let store = MemoryStore::with_document(json!({
        "lastVisitedDate": "2025-07-19",
        "tasks": {
            "Today": {
                "High": [task("t1", "open today", false), task("t2", "done today", true)],
                "Medium": [], "Low": []
            },
            "This Week": {
                "High": [task("w1", "open week", false)],
                "Medium": [task("w2", "done week", true)],
                "Low": []
            },
            "This Month": { "High": [], "Medium": [task("m1", "month", false)], "Low": [] }
        },
        "goals": []
    }));

    // 2025-07-20 is a Sunday
    let session = Session::open(&store, date(2025, 7, 20));
    let report = session.report().unwrap();
    assert!(report.weekly);
    assert!(!report.monthly);
    assert_eq!(report.carried_to_week, 1);
    assert_eq!(report.carried_to_month, 1);

    assert!(session.snapshot().tasks.category(TimeCategory::Today).next().is_none());
    assert!(session.snapshot().tasks.category(TimeCategory::ThisWeek).next().is_none());
    assert_eq!(
        ids(&session, key(TimeCategory::ThisMonth, Priority::Medium)),
        vec!["w1", "m1"]
    );
    assert_eq!(store.saves(), 1);
    assert_eq!(store.document().unwrap()["lastVisitedDate"], "2025-07-20");
}

#[test]
fn first_of_month_discards_this_month() {
    let store = MemoryStore::with_document(json!({
        "lastVisitedDate": "2025-06-30",
        "tasks": {
            "Today": { "High": [], "Medium": [], "Low": [task("t1", "carry me", false)] },
            "This Month": { "High": [task("m1", "old plan", false)] }
        }
    }));

    // Tuesday the 1st
    let session = Session::open(&store, date(2025, 7, 1));
    let report = session.report().unwrap();
    assert!(report.monthly);
    assert!(!report.weekly);
    assert_eq!(report.discarded_month, 1);
    assert_eq!(ids(&session, key(TimeCategory::ThisWeek, Priority::Medium)), vec!["t1"]);
    assert_eq!(session.snapshot().tasks.category_len(TimeCategory::ThisMonth), 0);
}

#[test]
fn reopening_the_same_day_changes_nothing() {
    let store = MemoryStore::with_document(json!({
        "lastVisitedDate": "2025-07-21",
        "tasks": { "Today": { "High": [task("t1", "a", false)] } }
    }));

    let first = Session::open(&store, date(2025, 7, 22));
    assert!(first.report().is_some());
    let after_first = store.document();
    drop(first);

    let second = Session::open(&store, date(2025, 7, 22));
    assert!(second.report().is_none());
    assert_eq!(store.saves(), 1);
    assert_eq!(store.document(), after_first);
}

#[test]
fn first_visit_records_the_date_without_rolling() {
    let store = MemoryStore::with_document(json!({
        "tasks": { "Today": { "High": [task("t1", "a", true)] } }
    }));
    let session = Session::open(&store, date(2025, 7, 22));
    assert!(session.report().is_none());
    assert_eq!(ids(&session, key(TimeCategory::Today, Priority::High)), vec!["t1"]);
    assert_eq!(store.document().unwrap()["lastVisitedDate"], "2025-07-22");
}

#[test]
fn unreadable_store_is_never_overwritten() {
    let store = MemoryStore::with_document(json!({ "lastVisitedDate": "2025-07-01" }));
    store.set_fail_load(true);

    let mut session = Session::open(&store, date(2025, 7, 22));
    assert!(session.load_error().is_some());
    assert!(matches!(
        session.drain_notices().as_slice(),
        [Notice::Error { .. }]
    ));

    session
        .apply(Command::AddTask {
            key: key(TimeCategory::Today, Priority::High),
            text: "in memory only".into(),
        })
        .unwrap();
    assert_eq!(session.snapshot().tasks.len(), 1);
    assert_eq!(store.saves(), 0);
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[test]
fn task_ids_are_conserved_by_moves_and_deletes() {
    let store = MemoryStore::new();
    let mut session = Session::open(&store, date(2025, 7, 22));
    let today_high = key(TimeCategory::Today, Priority::High);
    let week_low = key(TimeCategory::ThisWeek, Priority::Low);

    for text in ["a", "b", "c"] {
        session
            .apply(Command::AddTask {
                key: today_high,
                text: text.into(),
            })
            .unwrap();
    }
    let moved = ids(&session, today_high)[1].clone();
    session
        .apply(Command::MoveTask {
            task_id: moved.clone(),
            from: today_high,
            to: week_low,
        })
        .unwrap();

    assert_eq!(session.snapshot().tasks.len(), 3);
    assert_eq!(ids(&session, week_low), vec![moved.clone()]);

    // a stale move is a no-op
    let outcome = session
        .apply(Command::MoveTask {
            task_id: moved,
            from: today_high,
            to: week_low,
        })
        .unwrap();
    assert!(!outcome.changed());
    assert_eq!(session.snapshot().tasks.len(), 3);

    // deleting removes exactly that id and nothing else
    let mut before: Vec<String> = session.snapshot().tasks.iter().map(|(_, t)| t.id.clone()).collect();
    let removed = ids(&session, today_high)[0].clone();
    session
        .apply(Command::DeleteTask {
            key: today_high,
            task_id: removed.clone(),
        })
        .unwrap();
    let mut after: Vec<String> = session.snapshot().tasks.iter().map(|(_, t)| t.id.clone()).collect();
    before.retain(|id| *id != removed);
    before.sort();
    after.sort();
    assert_eq!(after, before);
    assert_eq!(session.snapshot().tasks.len(), 2);
}

#[test]
fn reset_keeps_the_visit_date() {
    let store = MemoryStore::new();
    let mut session = Session::open(&store, date(2025, 7, 22));
    session
        .apply(Command::AddGoal {
            title: "Learn piano".into(),
            description: String::new(),
            target_year: 2026,
        })
        .unwrap();
    session.apply(Command::ResetAll).unwrap();

    let doc = store.document().unwrap();
    assert_eq!(doc["goals"], json!([]));
    assert_eq!(doc["lastVisitedDate"], "2025-07-22");
}

// ---------------------------------------------------------------------------
// Text service
// ---------------------------------------------------------------------------

#[test]
fn breakdown_replaces_the_task_in_place() {
    let store = MemoryStore::with_document(json!({
        "lastVisitedDate": "2025-07-22",
        "tasks": { "This Week": { "High": [
            task("a", "before", false),
            task("b", "plan trip", false),
            task("c", "after", false)
        ] } }
    }));
    let mut session = Session::open(&store, date(2025, 7, 22));
    let gateway = CannedGateway {
        pieces: vec!["book hotel".into(), "buy tickets".into()],
        review: String::new(),
    };
    let week_high = key(TimeCategory::ThisWeek, Priority::High);

    let created = session.breakdown(&gateway, week_high, "b").unwrap();
    assert_eq!(created.len(), 2);

    let texts: Vec<_> = session
        .snapshot()
        .tasks
        .bucket(week_high)
        .iter()
        .map(|t| t.text.as_str())
        .collect();
    assert_eq!(texts, vec!["before", "book hotel", "buy tickets", "after"]);
    assert_eq!(store.saves(), 1);
}

#[test]
fn failed_breakdown_leaves_the_task_alone() {
    let store = MemoryStore::with_document(json!({
        "lastVisitedDate": "2025-07-22",
        "tasks": { "Today": { "Low": [task("x", "big job", false)] } }
    }));
    let mut session = Session::open(&store, date(2025, 7, 22));
    let today_low = key(TimeCategory::Today, Priority::Low);

    let result = session.breakdown(&DownGateway, today_low, "x");
    assert!(matches!(result, Err(PlannerError::TransformFailure(_))));
    assert_eq!(ids(&session, today_low), vec!["x"]);
    assert!(matches!(
        session.drain_notices().as_slice(),
        [Notice::Error { .. }]
    ));
    assert_eq!(store.saves(), 0);
}

#[test]
fn suggestions_land_in_this_week_medium() {
    let store = MemoryStore::with_document(json!({
        "lastVisitedDate": "2025-07-22",
        "tasks": {
            "This Week": { "Medium": [task("w", "existing", false)] },
            "This Month": { "High": [task("m", "launch site", false)] }
        }
    }));
    let mut session = Session::open(&store, date(2025, 7, 22));
    let gateway = CannedGateway {
        pieces: vec!["write copy".into(), "pick hosting".into()],
        review: String::new(),
    };

    let created = session.suggest(&gateway).unwrap();
    assert_eq!(created.len(), 2);
    let week_medium = ids(&session, key(TimeCategory::ThisWeek, Priority::Medium));
    assert_eq!(week_medium[0], "w");
    assert_eq!(&week_medium[1..], created.as_slice());
}

#[test]
fn review_without_completed_work_is_an_info_notice() {
    let store = MemoryStore::new();
    let mut session = Session::open(&store, date(2025, 7, 22));
    let gateway = CannedGateway {
        pieces: Vec::new(),
        review: "Great week.".into(),
    };

    session.review(&gateway).unwrap();
    assert!(matches!(
        session.drain_notices().as_slice(),
        [Notice::Info { .. }]
    ));
}

#[test]
fn review_of_completed_work_is_shown_not_stored() {
    let store = MemoryStore::with_document(json!({
        "lastVisitedDate": "2025-07-22",
        "tasks": { "Today": { "High": [task("d", "shipped it", true)] } }
    }));
    let mut session = Session::open(&store, date(2025, 7, 22));
    let gateway = CannedGateway {
        pieces: Vec::new(),
        review: "  Great week.  ".into(),
    };

    session.review(&gateway).unwrap();
    assert_eq!(
        session.drain_notices(),
        vec![Notice::Review {
            content: "Great week.".into()
        }]
    );
    assert_eq!(store.saves(), 0);
}
