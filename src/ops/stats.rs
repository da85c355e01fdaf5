use crate::model::bucket::{BucketKey, Buckets};
use crate::model::task::{Priority, TimeCategory};

/// Completion counts for one slice of the grid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Completion {
    pub total: usize,
    pub completed: usize,
}

impl Completion {
    pub fn pending(&self) -> usize {
        self.total - self.completed
    }

    /// Whole percent completed, rounded half up; 0 when empty
    pub fn rate(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((200 * self.completed + self.total) / (2 * self.total)) as u8
    }
}

/// Dashboard summary of the whole grid
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub overall: Completion,
    pub by_time: Vec<(TimeCategory, Completion)>,
    /// Task counts per priority, across all time categories
    pub by_priority: Vec<(Priority, usize)>,
}

pub fn dashboard(store: &Buckets) -> DashboardStats {
    let mut overall = Completion::default();
    let mut by_time = Vec::with_capacity(3);
    for time in TimeCategory::ALL {
        let mut c = Completion::default();
        for task in store.category(time) {
            c.total += 1;
            if task.is_completed {
                c.completed += 1;
            }
        }
        overall.total += c.total;
        overall.completed += c.completed;
        by_time.push((time, c));
    }

    let by_priority = Priority::ALL
        .into_iter()
        .map(|p| {
            let count = TimeCategory::ALL
                .into_iter()
                .map(|t| store.bucket(BucketKey::new(t, p)).len())
                .sum();
            (p, count)
        })
        .collect();

    DashboardStats {
        overall,
        by_time,
        by_priority,
    }
}
