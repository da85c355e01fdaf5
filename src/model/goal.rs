use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Goal status. Nothing moves a goal out of `InProgress` today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalStatus {
    #[default]
    #[serde(rename = "In Progress")]
    InProgress,
}

impl GoalStatus {
    pub fn label(self) -> &'static str {
        match self {
            GoalStatus::InProgress => "In Progress",
        }
    }
}

/// A checkpoint owned by exactly one goal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub is_completed: bool,
}

impl Milestone {
    pub fn new(text: impl Into<String>) -> Self {
        Milestone {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            is_completed: false,
        }
    }
}

/// A long-term objective with ordered milestones
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Target year, stored under `targetDate`
    #[serde(rename = "targetDate", deserialize_with = "year_from_number_or_string")]
    pub target_year: i32,
    #[serde(default)]
    pub status: GoalStatus,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
}

impl Goal {
    pub fn new(title: impl Into<String>, description: impl Into<String>, target_year: i32) -> Self {
        Goal {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            description: description.into(),
            target_year,
            status: GoalStatus::InProgress,
            milestones: Vec::new(),
        }
    }

    pub fn completed_milestones(&self) -> usize {
        self.milestones.iter().filter(|m| m.is_completed).count()
    }
}

/// Older documents stored the year as the raw text of a form field.
fn year_from_number_or_string<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum YearRepr {
        Number(i64),
        Text(String),
    }

    match YearRepr::deserialize(deserializer)? {
        YearRepr::Number(n) => i32::try_from(n)
            .map_err(|_| serde::de::Error::custom(format!("year out of range: {}", n))),
        YearRepr::Text(s) => s
            .trim()
            .parse::<i32>()
            .map_err(|_| serde::de::Error::custom(format!("invalid year: {:?}", s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn new_goal_is_in_progress_without_milestones() {
        let goal = Goal::new("Run a marathon", "", 2027);
        assert_eq!(goal.status, GoalStatus::InProgress);
        assert!(goal.milestones.is_empty());
        assert_eq!(goal.completed_milestones(), 0);
    }

    #[test]
    fn target_date_accepts_number_or_string() {
        let a: Goal =
            serde_json::from_str(r#"{"id":"g1","title":"A","targetDate":2030}"#).unwrap();
        let b: Goal =
            serde_json::from_str(r#"{"id":"g2","title":"B","targetDate":"2031"}"#).unwrap();
        assert_eq!(a.target_year, 2030);
        assert_eq!(b.target_year, 2031);
        assert_eq!(b.status, GoalStatus::InProgress);
        assert!(serde_json::from_str::<Goal>(r#"{"id":"g3","title":"C","targetDate":"soon"}"#).is_err());
    }

    #[test]
    fn status_serializes_as_label() {
        let goal = Goal::new("Learn Rust", "ownership first", 2026);
        let value = serde_json::to_value(&goal).unwrap();
        assert_eq!(value["status"], serde_json::json!("In Progress"));
        assert_eq!(value["targetDate"], serde_json::json!(2026));
    }
}
