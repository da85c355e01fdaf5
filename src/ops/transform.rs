//! Contract with the text-generation service: prompts, response parsing,
//! and the task text fed into each request.

use std::collections::HashSet;

use serde_json::Value;

use crate::model::bucket::{BucketKey, Buckets};
use crate::model::task::{Priority, TimeCategory};

/// Error type for text-generation requests
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("API key not set: export {0}")]
    MissingApiKey(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("service returned no content")]
    Empty,
}

/// The text-generation service, as seen by the planner
pub trait TransformGateway {
    /// Split one task into smaller tasks
    fn breakdown(&self, task_text: &str) -> Result<Vec<String>, TransformError>;
    /// Propose weekly tasks from the month's high-priority work
    fn suggest(&self, monthly_text: &str) -> Result<Vec<String>, TransformError>;
    /// Free-form review of completed work
    fn review(&self, completed_text: &str) -> Result<String, TransformError>;
}

pub const BREAKDOWN_FIELD: &str = "subtasks";
pub const SUGGEST_FIELD: &str = "weekly_tasks";

/// Suggestions are filed here
pub const SUGGEST_TARGET: BucketKey = BucketKey {
    time: TimeCategory::ThisWeek,
    priority: Priority::Medium,
};

const SUGGEST_SOURCE: BucketKey = BucketKey {
    time: TimeCategory::ThisMonth,
    priority: Priority::High,
};

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

pub fn breakdown_prompt(task_text: &str) -> String {
    format!("Break down the task: \"{}\" into smaller sub-tasks.", task_text)
}

pub fn suggest_prompt(monthly_text: &str) -> String {
    format!(
        "Based on monthly goals: \"{}\", suggest 3-4 tasks for this week.",
        monthly_text
    )
}

pub fn review_prompt(completed_text: &str) -> String {
    format!(
        "Completed tasks: \"{}\". Write a short, encouraging summary of progress and a \
         motivational quote. Format as: Summary text\nQuote text.",
        completed_text
    )
}

/// Response schema for a JSON object with one string-array field
pub fn string_list_schema(field: &str) -> Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            field: { "type": "ARRAY", "items": { "type": "STRING" } }
        }
    })
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Parse `{"<field>": ["...", ...]}` out of model output.
///
/// Tolerates a surrounding markdown code fence. Blank entries are dropped;
/// a list with nothing left is `Empty`.
pub fn parse_string_list(raw: &str, field: &str) -> Result<Vec<String>, TransformError> {
    let json_str = strip_code_fence(raw);
    let value: Value = serde_json::from_str(json_str)
        .map_err(|e| TransformError::Malformed(format!("not JSON: {}", e)))?;
    let items = value
        .get(field)
        .and_then(Value::as_array)
        .ok_or_else(|| TransformError::Malformed(format!("missing array field '{}'", field)))?;

    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let text = item
            .as_str()
            .ok_or_else(|| TransformError::Malformed(format!("non-string entry in '{}'", field)))?;
        let text = text.trim();
        if !text.is_empty() {
            out.push(text.to_string());
        }
    }
    if out.is_empty() {
        return Err(TransformError::Empty);
    }
    Ok(out)
}

fn strip_code_fence(raw: &str) -> &str {
    let text = raw.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

// ---------------------------------------------------------------------------
// Request sources
// ---------------------------------------------------------------------------

/// Text of This Month / High tasks, comma-joined. `None` if there are none.
pub fn monthly_focus_text(store: &Buckets) -> Option<String> {
    let texts: Vec<&str> = store
        .bucket(SUGGEST_SOURCE)
        .iter()
        .map(|t| t.text.as_str())
        .collect();
    (!texts.is_empty()).then(|| texts.join(", "))
}

/// Text of completed Today and This Week tasks, semicolon-joined.
pub fn completed_recent_text(store: &Buckets) -> Option<String> {
    let texts: Vec<&str> = [TimeCategory::Today, TimeCategory::ThisWeek]
        .into_iter()
        .flat_map(|time| store.category(time))
        .filter(|t| t.is_completed)
        .map(|t| t.text.as_str())
        .collect();
    (!texts.is_empty()).then(|| texts.join("; "))
}

// ---------------------------------------------------------------------------
// In-flight tracking
// ---------------------------------------------------------------------------

/// Task ids with a breakdown request outstanding.
///
/// Requests cannot be cancelled, so a second request for the same task must
/// be turned away until the first one finishes. `Session` needs none of this
/// since it holds `&mut self` for the whole request; a host that sends
/// requests from worker threads and applies results later keeps one of these.
#[derive(Debug, Default)]
pub struct BusySet {
    in_flight: HashSet<String>,
}

impl BusySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a task busy. Returns false if it already was.
    pub fn try_begin(&mut self, task_id: &str) -> bool {
        self.in_flight.insert(task_id.to_string())
    }

    pub fn finish(&mut self, task_id: &str) {
        self.in_flight.remove(task_id);
    }

    pub fn is_busy(&self, task_id: &str) -> bool {
        self.in_flight.contains(task_id)
    }
}
