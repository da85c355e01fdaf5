use serde::{Deserialize, Serialize};

use super::bucket::Buckets;
use super::goal::Goal;

/// The whole session document: buckets, goals, and the last visit date.
///
/// This is the single owned state object every command mutates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub tasks: Buckets,
    #[serde(default)]
    pub goals: Vec<Goal>,
    /// `YYYY-MM-DD` of the last reconciled visit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_visited_date: Option<String>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty every bucket and drop every goal. The visit date is kept so a
    /// reset does not re-trigger rollover.
    pub fn reset_all(&mut self) {
        self.tasks = Buckets::new();
        self.goals.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_default_to_empty() {
        let snap: Snapshot = serde_json::from_str("{}").unwrap();
        assert!(snap.tasks.is_empty());
        assert!(snap.goals.is_empty());
        assert!(snap.last_visited_date.is_none());
    }

    #[test]
    fn last_visited_date_uses_camel_case_key() {
        let snap = Snapshot {
            last_visited_date: Some("2025-07-21".into()),
            ..Default::default()
        };
        let value = serde_json::to_value(&snap).unwrap();
        assert_eq!(value["lastVisitedDate"], serde_json::json!("2025-07-21"));
        assert!(value.get("tasks").is_some());
        assert!(value.get("goals").is_some());
    }
}
