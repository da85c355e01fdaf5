//! A planning session: one loaded snapshot, reconciled once, with every
//! mutation written back through the store.

use chrono::NaiveDate;

use crate::io::snapshot_io::{SnapshotError, SnapshotStore};
use crate::model::bucket::BucketKey;
use crate::model::snapshot::Snapshot;
use crate::model::task::Task;
use crate::ops::command::{self, Command, CommandError, Notice, Outcome};
use crate::ops::rollover::{self, RolloverReport};
use crate::ops::task_ops::{self, TaskError};
use crate::ops::transform::{self, TransformError, TransformGateway};

const NO_MONTHLY_FOCUS: &str = "Add high-priority tasks to 'This Month' to get suggestions.";
const NO_COMPLETED_WORK: &str = "Complete some tasks in 'Today' or 'This Week' to get a review.";

/// Session-level failures
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    /// Persistence failed; the in-memory state is still authoritative
    #[error("storage unavailable: {0}")]
    GatewayUnavailable(#[from] SnapshotError),
    /// The text service failed; nothing was changed
    #[error("transform failed: {0}")]
    TransformFailure(#[from] TransformError),
    /// A stale id. Callers absorb this; it is never shown to the user.
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Rejected(#[from] CommandError),
}

/// Owns the snapshot for the lifetime of one session.
pub struct Session<S: SnapshotStore> {
    store: S,
    snapshot: Snapshot,
    report: Option<RolloverReport>,
    notices: Vec<Notice>,
    /// Set when the stored document could not be read; saves are held back
    /// so the unreadable document is not overwritten.
    load_error: Option<String>,
}

impl<S: SnapshotStore> Session<S> {
    /// Load the snapshot and reconcile it against `today`.
    ///
    /// No command can be applied before this returns, so rollover always
    /// sets the baseline. A failed load leaves an empty in-memory session
    /// with an error notice.
    pub fn open(store: S, today: NaiveDate) -> Self {
        let (loaded, load_error) = match store.load() {
            Ok(snapshot) => (snapshot.unwrap_or_default(), None),
            Err(e) => {
                tracing::warn!(error = %e, "snapshot load failed, continuing in memory");
                (Snapshot::new(), Some(e.to_string()))
            }
        };

        let mut session = Session {
            store,
            snapshot: loaded,
            report: None,
            notices: Vec::new(),
            load_error,
        };
        if let Some(message) = &session.load_error {
            session.notices.push(Notice::error(format!(
                "Could not load your data: {}",
                message
            )));
            return session;
        }
        session.reconcile(today);
        session
    }

    fn reconcile(&mut self, today: NaiveDate) {
        let last = self.snapshot.last_visited_date.clone();
        let rec = rollover::reconcile(&self.snapshot.tasks, last.as_deref(), today);
        if last.as_deref() == Some(rec.visited.as_str()) {
            return;
        }
        if let Some(report) = &rec.report {
            tracing::info!(
                from = last.as_deref().unwrap_or("-"),
                to = %rec.visited,
                carried_to_week = report.carried_to_week,
                dropped_today = report.dropped_today,
                weekly = report.weekly,
                carried_to_month = report.carried_to_month,
                monthly = report.monthly,
                discarded_month = report.discarded_month,
                "rollover"
            );
        }
        self.snapshot.tasks = rec.tasks;
        self.snapshot.last_visited_date = Some(rec.visited);
        self.report = rec.report;
        self.persist();
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// What the opening rollover did, if one ran
    pub fn report(&self) -> Option<&RolloverReport> {
        self.report.as_ref()
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// Take the notices raised since the last drain.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Apply a command and persist if it changed anything.
    pub fn apply(&mut self, cmd: Command) -> Result<Outcome, PlannerError> {
        tracing::debug!(command = cmd.name(), "apply");
        let outcome = command::apply(&mut self.snapshot, cmd)?;
        if outcome.changed() {
            self.persist();
        }
        Ok(outcome)
    }

    /// Replace a task with the sub-tasks the service proposes.
    ///
    /// Returns the new task IDs. A task that vanished while the request was
    /// out yields an empty list and no change.
    pub fn breakdown(
        &mut self,
        gateway: &dyn TransformGateway,
        key: BucketKey,
        task_id: &str,
    ) -> Result<Vec<String>, PlannerError> {
        let text = match self.snapshot.tasks.bucket(key).iter().find(|t| t.id == task_id) {
            Some(task) => task.text.clone(),
            None => return Ok(absorb_stale(task_id)),
        };
        // `&mut self` is held across the request, so a second breakdown of
        // the same task cannot start until this one returns
        let fragments = self.surface(gateway.breakdown(&text))?;
        match self.finish_breakdown(key, task_id, &fragments) {
            Err(PlannerError::NotFound(id)) => Ok(absorb_stale(&id)),
            other => other,
        }
    }

    fn finish_breakdown(
        &mut self,
        key: BucketKey,
        task_id: &str,
        fragments: &[String],
    ) -> Result<Vec<String>, PlannerError> {
        let ids = match task_ops::breakdown_task(&mut self.snapshot.tasks, key, task_id, fragments)
        {
            Ok(ids) => ids,
            Err(TaskError::NotFound(id)) => return Err(PlannerError::NotFound(id)),
            Err(e) => {
                let err = PlannerError::TransformFailure(TransformError::Malformed(e.to_string()));
                self.notices.push(Notice::error(err.to_string()));
                return Err(err);
            }
        };
        tracing::info!(task = task_id, subtasks = ids.len(), "breakdown applied");
        self.persist();
        Ok(ids)
    }

    /// Append suggested weekly tasks drawn from This Month / High.
    ///
    /// With no monthly focus there is nothing to ask about: an info notice is
    /// raised and no request is made.
    pub fn suggest(&mut self, gateway: &dyn TransformGateway) -> Result<Vec<String>, PlannerError> {
        let Some(source) = transform::monthly_focus_text(&self.snapshot.tasks) else {
            self.notices.push(Notice::info(NO_MONTHLY_FOCUS));
            return Ok(Vec::new());
        };
        let texts = self.surface(gateway.suggest(&source))?;
        let texts: Vec<&str> = texts.iter().map(|t| t.trim()).filter(|t| !t.is_empty()).collect();
        if texts.is_empty() {
            return self.surface(Err(TransformError::Empty));
        }
        let tasks: Vec<Task> = texts.into_iter().map(Task::new).collect();
        let ids = tasks.iter().map(|t| t.id.clone()).collect();
        task_ops::append_tasks(&mut self.snapshot.tasks, transform::SUGGEST_TARGET, tasks)
            .map_err(CommandError::Task)?;
        tracing::info!(target_bucket = %transform::SUGGEST_TARGET, "suggestions appended");
        self.persist();
        Ok(ids)
    }

    /// Ask for a review of completed Today and This Week work. The review
    /// arrives as a notice; the snapshot never changes.
    pub fn review(&mut self, gateway: &dyn TransformGateway) -> Result<(), PlannerError> {
        let Some(source) = transform::completed_recent_text(&self.snapshot.tasks) else {
            self.notices.push(Notice::info(NO_COMPLETED_WORK));
            return Ok(());
        };
        let content = self.surface(gateway.review(&source))?;
        let content = content.trim();
        if content.is_empty() {
            return self.surface(Err(TransformError::Empty));
        }
        self.notices.push(Notice::Review {
            content: content.to_string(),
        });
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Turn a gateway failure into an error notice plus an error result.
    fn surface<T>(&mut self, result: Result<T, TransformError>) -> Result<T, PlannerError> {
        result.map_err(|e| {
            tracing::warn!(error = %e, "transform request failed");
            let err = PlannerError::TransformFailure(e);
            self.notices.push(Notice::error(err.to_string()));
            err
        })
    }

    /// Write the snapshot back. Failure is reported as a notice only.
    fn persist(&mut self) {
        if self.load_error.is_some() {
            tracing::debug!("skipping save, stored document was unreadable");
            return;
        }
        if let Err(e) = self.store.save(&self.snapshot) {
            let err = PlannerError::GatewayUnavailable(e);
            tracing::warn!(error = %err, "snapshot save failed");
            self.notices.push(Notice::error(format!("Could not save your data: {}", err)));
        }
    }
}

fn absorb_stale(task_id: &str) -> Vec<String> {
    tracing::debug!(task = task_id, "stale task id, ignoring");
    Vec::new()
}
