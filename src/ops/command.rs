//! User commands and the notices shown back to the user.

use crate::model::bucket::BucketKey;
use crate::model::snapshot::Snapshot;
use crate::ops::goal_ops::{self, GoalError, GoalUpdate};
use crate::ops::task_ops::{self, TaskError};

/// Every mutation a user can ask for. Each variant carries only what it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddTask {
        key: BucketKey,
        text: String,
    },
    EditTask {
        key: BucketKey,
        task_id: String,
        text: String,
    },
    DeleteTask {
        key: BucketKey,
        task_id: String,
    },
    ToggleTask {
        key: BucketKey,
        task_id: String,
    },
    /// A confirmed drop
    MoveTask {
        task_id: String,
        from: BucketKey,
        to: BucketKey,
    },
    AddGoal {
        title: String,
        description: String,
        target_year: i32,
    },
    EditGoal {
        goal_id: String,
        update: GoalUpdate,
    },
    DeleteGoal {
        goal_id: String,
    },
    AddMilestone {
        goal_id: String,
        text: String,
    },
    ToggleMilestone {
        goal_id: String,
        milestone_id: String,
    },
    DeleteMilestone {
        goal_id: String,
        milestone_id: String,
    },
    /// Clear every bucket and every goal
    ResetAll,
}

impl Command {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::AddTask { .. } => "add-task",
            Command::EditTask { .. } => "edit-task",
            Command::DeleteTask { .. } => "delete-task",
            Command::ToggleTask { .. } => "toggle-task",
            Command::MoveTask { .. } => "move-task",
            Command::AddGoal { .. } => "add-goal",
            Command::EditGoal { .. } => "edit-goal",
            Command::DeleteGoal { .. } => "delete-goal",
            Command::AddMilestone { .. } => "add-milestone",
            Command::ToggleMilestone { .. } => "toggle-milestone",
            Command::DeleteMilestone { .. } => "delete-milestone",
            Command::ResetAll => "reset-all",
        }
    }
}

/// A message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Error { message: String },
    Info { message: String },
    Review { content: String },
}

impl Notice {
    pub fn error(message: impl Into<String>) -> Self {
        Notice::Error {
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Notice::Info {
            message: message.into(),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Notice::Error { .. } => "Error",
            Notice::Info { .. } => "Info",
            Notice::Review { .. } => "Weekly Review",
        }
    }

    pub fn body(&self) -> &str {
        match self {
            Notice::Error { message } | Notice::Info { message } => message,
            Notice::Review { content } => content,
        }
    }
}

/// What applying a command did to the snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The snapshot changed. `created` holds the new entity's ID for adds.
    Applied { created: Option<String> },
    /// Nothing changed: a stale ID or a move onto the same bucket
    Unchanged,
}

impl Outcome {
    pub fn changed(&self) -> bool {
        matches!(self, Outcome::Applied { .. })
    }

    fn applied() -> Self {
        Outcome::Applied { created: None }
    }

    fn created(id: String) -> Self {
        Outcome::Applied { created: Some(id) }
    }
}

/// A command that was rejected outright. Stale IDs are not errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error(transparent)]
    Task(TaskError),
    #[error(transparent)]
    Goal(GoalError),
}

/// Apply one command to the snapshot.
///
/// Either the command applies fully or the snapshot is left as it was.
/// References to IDs that no longer exist come back as `Unchanged`.
pub fn apply(snapshot: &mut Snapshot, command: Command) -> Result<Outcome, CommandError> {
    let name = command.name();
    let result = match command {
        Command::AddTask { key, text } => {
            task_ops::add_task(&mut snapshot.tasks, key, &text).map(Outcome::created)
        }
        Command::EditTask { key, task_id, text } => {
            task_ops::edit_task(&mut snapshot.tasks, key, &task_id, &text).map(|_| Outcome::applied())
        }
        Command::DeleteTask { key, task_id } => {
            task_ops::delete_task(&mut snapshot.tasks, key, &task_id).map(|_| Outcome::applied())
        }
        Command::ToggleTask { key, task_id } => {
            task_ops::toggle_complete(&mut snapshot.tasks, key, &task_id)
                .map(|_| Outcome::applied())
        }
        Command::MoveTask { from, to, .. } if from == to => Ok(Outcome::Unchanged),
        Command::MoveTask { task_id, from, to } => {
            task_ops::move_task(&mut snapshot.tasks, &task_id, from, to).map(|_| Outcome::applied())
        }
        Command::AddGoal {
            title,
            description,
            target_year,
        } => {
            return absorb_goal(
                name,
                goal_ops::add_goal(&mut snapshot.goals, &title, &description, target_year)
                    .map(Outcome::created),
            );
        }
        Command::EditGoal { update, .. } if update.is_empty() => Ok(Outcome::Unchanged),
        Command::EditGoal { goal_id, update } => {
            return absorb_goal(
                name,
                goal_ops::update_goal(&mut snapshot.goals, &goal_id, update)
                    .map(|_| Outcome::applied()),
            );
        }
        Command::DeleteGoal { goal_id } => {
            return absorb_goal(
                name,
                goal_ops::delete_goal(&mut snapshot.goals, &goal_id).map(|_| Outcome::applied()),
            );
        }
        Command::AddMilestone { goal_id, text } => {
            return absorb_goal(
                name,
                goal_ops::add_milestone(&mut snapshot.goals, &goal_id, &text)
                    .map(Outcome::created),
            );
        }
        Command::ToggleMilestone {
            goal_id,
            milestone_id,
        } => {
            return absorb_goal(
                name,
                goal_ops::toggle_milestone(&mut snapshot.goals, &goal_id, &milestone_id)
                    .map(|_| Outcome::applied()),
            );
        }
        Command::DeleteMilestone {
            goal_id,
            milestone_id,
        } => {
            return absorb_goal(
                name,
                goal_ops::delete_milestone(&mut snapshot.goals, &goal_id, &milestone_id)
                    .map(|_| Outcome::applied()),
            );
        }
        Command::ResetAll => {
            snapshot.reset_all();
            Ok(Outcome::applied())
        }
    };
    absorb_task(name, result)
}

fn absorb_task(name: &str, result: Result<Outcome, TaskError>) -> Result<Outcome, CommandError> {
    match result {
        Ok(outcome) => Ok(outcome),
        Err(TaskError::NotFound(id)) => {
            tracing::debug!(command = name, id = %id, "stale task id, ignoring");
            Ok(Outcome::Unchanged)
        }
        Err(e) => Err(CommandError::Task(e)),
    }
}

fn absorb_goal(name: &str, result: Result<Outcome, GoalError>) -> Result<Outcome, CommandError> {
    match result {
        Ok(outcome) => Ok(outcome),
        Err(GoalError::NotFound(id)) => {
            tracing::debug!(command = name, id = %id, "stale goal id, ignoring");
            Ok(Outcome::Unchanged)
        }
        Err(GoalError::MilestoneNotFound { goal, milestone }) => {
            tracing::debug!(command = name, goal = %goal, milestone = %milestone, "stale milestone id, ignoring");
            Ok(Outcome::Unchanged)
        }
        Err(e) => Err(CommandError::Goal(e)),
    }
}
