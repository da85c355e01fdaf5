use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::task::{Priority, Task, TimeCategory};

/// Address of one bucket in the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BucketKey {
    pub time: TimeCategory,
    pub priority: Priority,
}

impl BucketKey {
    pub fn new(time: TimeCategory, priority: Priority) -> Self {
        BucketKey { time, priority }
    }

    /// Every key, in category-major order
    pub fn all() -> impl Iterator<Item = BucketKey> {
        TimeCategory::ALL
            .into_iter()
            .flat_map(|time| Priority::ALL.into_iter().map(move |p| BucketKey::new(time, p)))
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.time, self.priority)
    }
}

/// On-disk shape: `{"Today": {"High": [...], ...}, "This Week": {...}, ...}`
type BucketMap = IndexMap<TimeCategory, IndexMap<Priority, Vec<Task>>>;

/// The 3×3 grid of ordered task lists.
///
/// Every (category, priority) pair always has a bucket, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BucketMap", into = "BucketMap")]
pub struct Buckets {
    grid: [[Vec<Task>; 3]; 3],
}

impl Buckets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tasks in one bucket, in order
    pub fn bucket(&self, key: BucketKey) -> &[Task] {
        &self.grid[key.time.index()][key.priority.index()]
    }

    pub fn bucket_mut(&mut self, key: BucketKey) -> &mut Vec<Task> {
        &mut self.grid[key.time.index()][key.priority.index()]
    }

    /// Tasks of one category, High then Medium then Low
    pub fn category(&self, time: TimeCategory) -> impl Iterator<Item = &Task> {
        self.grid[time.index()].iter().flatten()
    }

    /// Empty all three buckets of a category
    pub fn clear_category(&mut self, time: TimeCategory) {
        for bucket in &mut self.grid[time.index()] {
            bucket.clear();
        }
    }

    /// Number of tasks in a category across priorities
    pub fn category_len(&self, time: TimeCategory) -> usize {
        self.grid[time.index()].iter().map(Vec::len).sum()
    }

    /// Every task with its bucket key, in category-major order
    pub fn iter(&self) -> impl Iterator<Item = (BucketKey, &Task)> {
        BucketKey::all().flat_map(move |key| self.bucket(key).iter().map(move |t| (key, t)))
    }

    pub fn len(&self) -> usize {
        self.grid.iter().flatten().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Locate a task anywhere in the grid
    pub fn find(&self, task_id: &str) -> Option<(BucketKey, &Task)> {
        self.iter().find(|(_, t)| t.id == task_id)
    }

    pub fn contains_id(&self, task_id: &str) -> bool {
        self.find(task_id).is_some()
    }
}

impl From<BucketMap> for Buckets {
    fn from(map: BucketMap) -> Self {
        let mut buckets = Buckets::default();
        for (time, by_priority) in map {
            for (priority, tasks) in by_priority {
                *buckets.bucket_mut(BucketKey::new(time, priority)) = tasks;
            }
        }
        buckets
    }
}

impl From<Buckets> for BucketMap {
    fn from(buckets: Buckets) -> Self {
        let Buckets { grid } = buckets;
        TimeCategory::ALL
            .into_iter()
            .zip(grid)
            .map(|(time, row)| (time, Priority::ALL.into_iter().zip(row).collect()))
            .collect()
    }
}
