use crate::model::goal::{Goal, Milestone};

/// Error type for goal and milestone operations
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GoalError {
    #[error("goal not found: {0}")]
    NotFound(String),
    #[error("milestone {milestone} not found in goal {goal}")]
    MilestoneNotFound { goal: String, milestone: String },
    #[error("id prefix {0} is ambiguous")]
    Ambiguous(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Fields to change on an existing goal; `None` leaves a field as is
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub target_year: Option<i32>,
}

impl GoalUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.target_year.is_none()
    }
}

// ---------------------------------------------------------------------------
// Goal CRUD
// ---------------------------------------------------------------------------

/// Create a goal with no milestones. Returns its ID.
pub fn add_goal(
    goals: &mut Vec<Goal>,
    title: &str,
    description: &str,
    target_year: i32,
) -> Result<String, GoalError> {
    let title = required(title, "goal title")?;
    let goal = Goal::new(title, description.trim(), target_year);
    let id = goal.id.clone();
    goals.push(goal);
    Ok(id)
}

pub fn update_goal(goals: &mut [Goal], goal_id: &str, update: GoalUpdate) -> Result<(), GoalError> {
    // Validate before touching the goal so a bad title changes nothing
    let title = update
        .title
        .as_deref()
        .map(|t| required(t, "goal title"))
        .transpose()?
        .map(str::to_string);
    let goal = find_goal_mut(goals, goal_id)?;
    if let Some(title) = title {
        goal.title = title;
    }
    if let Some(description) = update.description {
        goal.description = description.trim().to_string();
    }
    if let Some(year) = update.target_year {
        goal.target_year = year;
    }
    Ok(())
}

/// Remove a goal together with all of its milestones.
pub fn delete_goal(goals: &mut Vec<Goal>, goal_id: &str) -> Result<Goal, GoalError> {
    let idx = goals
        .iter()
        .position(|g| g.id == goal_id)
        .ok_or_else(|| GoalError::NotFound(goal_id.to_string()))?;
    Ok(goals.remove(idx))
}

// ---------------------------------------------------------------------------
// Milestones
// ---------------------------------------------------------------------------

pub fn add_milestone(goals: &mut [Goal], goal_id: &str, text: &str) -> Result<String, GoalError> {
    let text = required(text, "milestone text")?;
    let goal = find_goal_mut(goals, goal_id)?;
    let milestone = Milestone::new(text);
    let id = milestone.id.clone();
    goal.milestones.push(milestone);
    Ok(id)
}

/// Flip a milestone's completion. Returns the new state.
pub fn toggle_milestone(
    goals: &mut [Goal],
    goal_id: &str,
    milestone_id: &str,
) -> Result<bool, GoalError> {
    let milestone = find_milestone_mut(goals, goal_id, milestone_id)?;
    milestone.is_completed = !milestone.is_completed;
    Ok(milestone.is_completed)
}

pub fn delete_milestone(
    goals: &mut [Goal],
    goal_id: &str,
    milestone_id: &str,
) -> Result<Milestone, GoalError> {
    let goal = find_goal_mut(goals, goal_id)?;
    let idx = goal
        .milestones
        .iter()
        .position(|m| m.id == milestone_id)
        .ok_or_else(|| GoalError::MilestoneNotFound {
            goal: goal_id.to_string(),
            milestone: milestone_id.to_string(),
        })?;
    Ok(goal.milestones.remove(idx))
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Percentage of completed milestones, rounded half up. 0 with no milestones.
pub fn progress(goal: &Goal) -> u8 {
    let total = goal.milestones.len();
    if total == 0 {
        return 0;
    }
    let done = goal.completed_milestones();
    ((200 * done + total) / (2 * total)) as u8
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

pub fn find_goal<'a>(goals: &'a [Goal], goal_id: &str) -> Option<&'a Goal> {
    goals.iter().find(|g| g.id == goal_id)
}

/// Resolve a full goal ID or unique prefix.
pub fn resolve_goal_id(goals: &[Goal], query: &str) -> Result<String, GoalError> {
    resolve_prefix(goals.iter().map(|g| g.id.as_str()), query)
        .map_err(|e| e.unwrap_or_else(|| GoalError::NotFound(query.to_string())))
}

/// Resolve a milestone ID or unique prefix within one goal.
pub fn resolve_milestone_id(goal: &Goal, query: &str) -> Result<String, GoalError> {
    resolve_prefix(goal.milestones.iter().map(|m| m.id.as_str()), query).map_err(|e| {
        e.unwrap_or_else(|| GoalError::MilestoneNotFound {
            goal: goal.id.clone(),
            milestone: query.to_string(),
        })
    })
}

/// `Err(None)` means not found; `Err(Some(_))` carries an ambiguity error.
fn resolve_prefix<'a>(
    ids: impl Iterator<Item = &'a str> + Clone,
    query: &str,
) -> Result<String, Option<GoalError>> {
    let query = query.trim();
    if query.is_empty() {
        return Err(None);
    }
    if let Some(exact) = ids.clone().find(|id| *id == query) {
        return Ok(exact.to_string());
    }
    let mut matches = ids.filter(|id| id.starts_with(query));
    match (matches.next(), matches.next()) {
        (Some(id), None) => Ok(id.to_string()),
        (Some(_), Some(_)) => Err(Some(GoalError::Ambiguous(query.to_string()))),
        (None, _) => Err(None),
    }
}

fn required<'a>(text: &'a str, what: &str) -> Result<&'a str, GoalError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(GoalError::InvalidInput(format!("{} cannot be empty", what)));
    }
    Ok(trimmed)
}

fn find_goal_mut<'a>(goals: &'a mut [Goal], goal_id: &str) -> Result<&'a mut Goal, GoalError> {
    goals
        .iter_mut()
        .find(|g| g.id == goal_id)
        .ok_or_else(|| GoalError::NotFound(goal_id.to_string()))
}

fn find_milestone_mut<'a>(
    goals: &'a mut [Goal],
    goal_id: &str,
    milestone_id: &str,
) -> Result<&'a mut Milestone, GoalError> {
    find_goal_mut(goals, goal_id)?
        .milestones
        .iter_mut()
        .find(|m| m.id == milestone_id)
        .ok_or_else(|| GoalError::MilestoneNotFound {
            goal: goal_id.to_string(),
            milestone: milestone_id.to_string(),
        })
}
