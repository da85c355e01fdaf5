use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Time horizon a task is filed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimeCategory {
    #[serde(rename = "Today")]
    Today,
    #[serde(rename = "This Week")]
    ThisWeek,
    #[serde(rename = "This Month")]
    ThisMonth,
}

impl TimeCategory {
    /// All categories in display (and rollover) order
    pub const ALL: [TimeCategory; 3] = [
        TimeCategory::Today,
        TimeCategory::ThisWeek,
        TimeCategory::ThisMonth,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            TimeCategory::Today => 0,
            TimeCategory::ThisWeek => 1,
            TimeCategory::ThisMonth => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimeCategory::Today => "Today",
            TimeCategory::ThisWeek => "This Week",
            TimeCategory::ThisMonth => "This Month",
        }
    }

    /// Parse a user-supplied category name. Accepts the display label as well
    /// as short forms like `week` or `this-month`, case-insensitively.
    pub fn parse_category(s: &str) -> Option<Self> {
        let norm: String = s
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        match norm.as_str() {
            "today" | "day" | "d" => Some(TimeCategory::Today),
            "thisweek" | "week" | "w" => Some(TimeCategory::ThisWeek),
            "thismonth" | "month" | "m" => Some(TimeCategory::ThisMonth),
            _ => None,
        }
    }
}

impl fmt::Display for TimeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Task priority within a time horizon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// All priorities, highest first
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub(crate) fn index(self) -> usize {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }

    pub fn parse_priority(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" | "hi" | "h" => Some(Priority::High),
            "medium" | "med" | "m" => Some(Priority::Medium),
            "low" | "lo" | "l" => Some(Priority::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single work item.
///
/// `id` and `created_at` are fixed at creation; every move or rollover carries
/// the record over unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Create a new incomplete task with a freshly minted id
    pub fn new(text: impl Into<String>) -> Self {
        Task {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            is_completed: false,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn new_tasks_get_distinct_ids() {
        let a = Task::new("write report");
        let b = Task::new("write report");
        assert_ne!(a.id, b.id);
        assert!(!a.is_completed);
    }

    #[test]
    fn parse_category_short_forms() {
        assert_eq!(TimeCategory::parse_category("today"), Some(TimeCategory::Today));
        assert_eq!(TimeCategory::parse_category("This Week"), Some(TimeCategory::ThisWeek));
        assert_eq!(TimeCategory::parse_category("this-month"), Some(TimeCategory::ThisMonth));
        assert_eq!(TimeCategory::parse_category("W"), Some(TimeCategory::ThisWeek));
        assert_eq!(TimeCategory::parse_category("year"), None);
    }

    #[test]
    fn parse_priority_short_forms() {
        assert_eq!(Priority::parse_priority("H"), Some(Priority::High));
        assert_eq!(Priority::parse_priority("med"), Some(Priority::Medium));
        assert_eq!(Priority::parse_priority(" low "), Some(Priority::Low));
        assert_eq!(Priority::parse_priority("urgent"), None);
    }

    #[test]
    fn task_wire_format_is_camel_case() {
        let json = r#"{"id":"t1","text":"x","isCompleted":true,"createdAt":"2025-07-21T10:00:00.000Z"}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.id, "t1");
        assert!(task.is_completed);

        let out = serde_json::to_value(&task).unwrap();
        assert_eq!(out["isCompleted"], serde_json::json!(true));
        assert!(out.get("createdAt").is_some());
    }

    #[test]
    fn category_serializes_with_display_label() {
        let v = serde_json::to_value(TimeCategory::ThisWeek).unwrap();
        assert_eq!(v, serde_json::json!("This Week"));
    }
}
