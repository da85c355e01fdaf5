use crate::model::bucket::{BucketKey, Buckets};
use crate::model::task::Task;

/// Error type for task operations
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("task not found: {0}")]
    NotFound(String),
    #[error("task id prefix {0} is ambiguous")]
    Ambiguous(String),
    #[error("task id already present: {0}")]
    DuplicateId(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

// ---------------------------------------------------------------------------
// Task CRUD
// ---------------------------------------------------------------------------

/// Append a new task to the end of a bucket. Returns the minted ID.
pub fn add_task(store: &mut Buckets, key: BucketKey, text: &str) -> Result<String, TaskError> {
    let text = non_blank(text)?;
    let task = Task::new(text);
    let id = task.id.clone();
    store.bucket_mut(key).push(task);
    Ok(id)
}

/// Replace a task's text in place.
pub fn edit_task(
    store: &mut Buckets,
    key: BucketKey,
    task_id: &str,
    text: &str,
) -> Result<(), TaskError> {
    let text = non_blank(text)?;
    let task = find_in_bucket_mut(store, key, task_id)?;
    task.text = text.to_string();
    Ok(())
}

/// Remove a task from its bucket, returning the removed record.
pub fn delete_task(store: &mut Buckets, key: BucketKey, task_id: &str) -> Result<Task, TaskError> {
    let bucket = store.bucket_mut(key);
    let idx = position(bucket, task_id)?;
    Ok(bucket.remove(idx))
}

/// Flip completion. Returns the new state.
pub fn toggle_complete(
    store: &mut Buckets,
    key: BucketKey,
    task_id: &str,
) -> Result<bool, TaskError> {
    let task = find_in_bucket_mut(store, key, task_id)?;
    task.is_completed = !task.is_completed;
    Ok(task.is_completed)
}

/// Append already-built tasks to a bucket. Rejects the whole batch if any
/// id is already in the store or repeated within the batch.
pub fn append_tasks(
    store: &mut Buckets,
    key: BucketKey,
    tasks: Vec<Task>,
) -> Result<usize, TaskError> {
    let mut seen = std::collections::HashSet::new();
    for task in &tasks {
        if store.contains_id(&task.id) || !seen.insert(task.id.as_str()) {
            return Err(TaskError::DuplicateId(task.id.clone()));
        }
    }
    let count = tasks.len();
    store.bucket_mut(key).extend(tasks);
    Ok(count)
}

// ---------------------------------------------------------------------------
// Re-bucketing
// ---------------------------------------------------------------------------

/// Move a task between buckets, appending it to the end of `to`.
///
/// Moving into the bucket it already sits in is a no-op. The task record is
/// carried over unchanged.
pub fn move_task(
    store: &mut Buckets,
    task_id: &str,
    from: BucketKey,
    to: BucketKey,
) -> Result<(), TaskError> {
    if from == to {
        return Ok(());
    }
    let source = store.bucket_mut(from);
    let idx = position(source, task_id)?;
    let task = source.remove(idx);
    store.bucket_mut(to).push(task);
    Ok(())
}

/// Replace one task with freshly minted tasks, one per non-blank fragment.
///
/// New tasks are appended to the source bucket before the original is
/// removed. Nothing changes unless both the source task and at least one
/// usable fragment exist. Returns the new IDs.
pub fn breakdown_task(
    store: &mut Buckets,
    key: BucketKey,
    task_id: &str,
    fragments: &[String],
) -> Result<Vec<String>, TaskError> {
    let texts: Vec<&str> = fragments
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .collect();
    if texts.is_empty() {
        return Err(TaskError::InvalidInput("no sub-tasks to add".into()));
    }
    position(store.bucket(key), task_id)?;

    let new_tasks: Vec<Task> = texts.into_iter().map(Task::new).collect();
    let ids = new_tasks.iter().map(|t| t.id.clone()).collect();
    let bucket = store.bucket_mut(key);
    bucket.extend(new_tasks);
    bucket.retain(|t| t.id != task_id);
    Ok(ids)
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Resolve a full ID or a unique ID prefix to a task ID and its bucket.
pub fn resolve_task_id(store: &Buckets, query: &str) -> Result<(String, BucketKey), TaskError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(TaskError::NotFound(String::new()));
    }
    if let Some((key, task)) = store.find(query) {
        return Ok((task.id.clone(), key));
    }
    let mut matches = store.iter().filter(|(_, t)| t.id.starts_with(query));
    match (matches.next(), matches.next()) {
        (Some((key, task)), None) => Ok((task.id.clone(), key)),
        (Some(_), Some(_)) => Err(TaskError::Ambiguous(query.to_string())),
        (None, _) => Err(TaskError::NotFound(query.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn non_blank(text: &str) -> Result<&str, TaskError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(TaskError::InvalidInput("task text cannot be empty".into()));
    }
    Ok(trimmed)
}

fn position(tasks: &[Task], task_id: &str) -> Result<usize, TaskError> {
    tasks
        .iter()
        .position(|t| t.id == task_id)
        .ok_or_else(|| TaskError::NotFound(task_id.to_string()))
}

fn find_in_bucket_mut<'a>(
    store: &'a mut Buckets,
    key: BucketKey,
    task_id: &str,
) -> Result<&'a mut Task, TaskError> {
    store
        .bucket_mut(key)
        .iter_mut()
        .find(|t| t.id == task_id)
        .ok_or_else(|| TaskError::NotFound(task_id.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
