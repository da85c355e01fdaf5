use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "pri", about = concat!("pri v", env!("CARGO_PKG_VERSION"), " - today, this week, this month"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use a different data directory (default: $PRIORITY_DIR or the current directory)
    #[arg(short = 'C', long = "data-dir", global = true)]
    pub data_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a starter config.toml and an empty planner
    Init(InitArgs),
    /// List tasks by time horizon and priority
    List(ListArgs),
    /// Add a task to a bucket
    Add(AddArgs),
    /// Change a task's text
    Edit(EditArgs),
    /// Delete a task
    Rm(TaskIdArg),
    /// Toggle a task's completion
    Done(TaskIdArg),
    /// Move a task to another bucket
    Mv(MvArgs),
    /// Split a task into smaller tasks via the text service
    Breakdown(TaskIdArg),
    /// Suggest weekly tasks from This Month's high-priority work
    Suggest,
    /// Summarize completed work from Today and This Week
    Review,
    /// Show completion statistics
    Stats,
    /// Manage long-term goals
    Goal(GoalCmd),
    /// Manage a goal's milestones
    Milestone(MilestoneCmd),
    /// Focus timer
    Timer(TimerCmd),
    /// Delete every task and every goal
    Reset(ResetArgs),
}

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Planner name (default: inferred from directory name)
    #[arg(long)]
    pub name: Option<String>,
    /// Overwrite an existing config.toml
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ListArgs {
    /// Only this time horizon (today, week, month)
    #[arg(long)]
    pub time: Option<String>,
    /// Hide completed tasks
    #[arg(long)]
    pub pending: bool,
}

#[derive(Args)]
pub struct AddArgs {
    /// Time horizon: today, week, month
    pub time: String,
    /// Priority: high, medium, low
    pub priority: String,
    /// Task text
    pub text: String,
}

#[derive(Args)]
pub struct EditArgs {
    /// Task ID (or unique prefix)
    pub id: String,
    /// New text
    pub text: String,
}

#[derive(Args)]
pub struct TaskIdArg {
    /// Task ID (or unique prefix)
    pub id: String,
}

#[derive(Args)]
pub struct MvArgs {
    /// Task ID (or unique prefix)
    pub id: String,
    /// Target time horizon
    pub time: String,
    /// Target priority
    pub priority: String,
}

// ---------------------------------------------------------------------------
// Goals
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct GoalCmd {
    #[command(subcommand)]
    pub action: Option<GoalAction>,
}

#[derive(Subcommand)]
pub enum GoalAction {
    /// List goals with progress (default)
    List,
    /// Add a goal
    Add(GoalAddArgs),
    /// Change a goal's title, description or target year
    Edit(GoalEditArgs),
    /// Delete a goal and its milestones
    Rm(GoalIdArg),
}

#[derive(Args)]
pub struct GoalAddArgs {
    /// Goal title
    pub title: String,
    /// Longer description
    #[arg(long, short)]
    pub description: Option<String>,
    /// Target year (default: this year)
    #[arg(long, value_parser = clap::value_parser!(i32).range(1970..=2100))]
    pub year: Option<i32>,
}

#[derive(Args)]
pub struct GoalEditArgs {
    /// Goal ID (or unique prefix)
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long, short)]
    pub description: Option<String>,
    #[arg(long, value_parser = clap::value_parser!(i32).range(1970..=2100))]
    pub year: Option<i32>,
}

#[derive(Args)]
pub struct GoalIdArg {
    /// Goal ID (or unique prefix)
    pub id: String,
}

#[derive(Args)]
pub struct MilestoneCmd {
    #[command(subcommand)]
    pub action: MilestoneAction,
}

#[derive(Subcommand)]
pub enum MilestoneAction {
    /// Add a milestone to a goal
    Add(MilestoneAddArgs),
    /// Toggle a milestone's completion
    Done(MilestoneIdArgs),
    /// Delete a milestone
    Rm(MilestoneIdArgs),
}

#[derive(Args)]
pub struct MilestoneAddArgs {
    /// Goal ID (or unique prefix)
    pub goal: String,
    /// Milestone text
    pub text: String,
}

#[derive(Args)]
pub struct MilestoneIdArgs {
    /// Goal ID (or unique prefix)
    pub goal: String,
    /// Milestone ID (or unique prefix)
    pub milestone: String,
}

// ---------------------------------------------------------------------------
// Timer
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct TimerCmd {
    #[command(subcommand)]
    pub action: Option<TimerAction>,
}

#[derive(Subcommand)]
pub enum TimerAction {
    /// Show the current interval (default)
    Status,
    /// Start or resume the countdown
    Start,
    /// Pause the countdown
    Pause,
    /// Back to a fresh focus interval with no completed cycles
    Reset,
    /// Start and count down in the foreground until the interval ends
    Run,
}

// ---------------------------------------------------------------------------
// Reset
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ResetArgs {
    /// Confirm deleting everything
    #[arg(long)]
    pub yes: bool,
}
