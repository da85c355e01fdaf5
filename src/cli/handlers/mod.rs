mod init;
pub use init::cmd_init;

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use chrono::{Datelike, Local, Utc};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::lock::FileLock;
use crate::io::snapshot_io::JsonFileStore;
use crate::io::state::{self, TimerState};
use crate::io::transform_client::HttpTransformGateway;
use crate::model::bucket::BucketKey;
use crate::model::config::PlannerConfig;
use crate::model::task::{Priority, TimeCategory};
use crate::ops::command::{Command, Notice, Outcome};
use crate::ops::goal_ops::{self, GoalUpdate};
use crate::ops::session::{PlannerError, Session};
use crate::ops::timer_ops::TickOutcome;
use crate::ops::transform::SUGGEST_TARGET;
use crate::ops::{stats, task_ops};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let data_dir = config_io::resolve_data_dir(cli.data_dir.as_deref())?;
    tracing::debug!(data_dir = %data_dir.display(), "resolved data directory");

    match cli.command {
        Commands::Init(args) => cmd_init(&data_dir, args),

        // Read commands
        Commands::List(args) => cmd_list(&data_dir, args, json),
        Commands::Stats => cmd_stats(&data_dir, json),
        Commands::Goal(GoalCmd { action: None })
        | Commands::Goal(GoalCmd {
            action: Some(GoalAction::List),
        }) => cmd_goal_list(&data_dir, json),

        // Task commands
        Commands::Add(args) => cmd_add(&data_dir, args),
        Commands::Edit(args) => cmd_edit(&data_dir, args),
        Commands::Rm(args) => cmd_rm(&data_dir, args),
        Commands::Done(args) => cmd_done(&data_dir, args),
        Commands::Mv(args) => cmd_mv(&data_dir, args),

        // Text service
        Commands::Breakdown(args) => cmd_breakdown(&data_dir, args, json),
        Commands::Suggest => cmd_suggest(&data_dir, json),
        Commands::Review => cmd_review(&data_dir, json),

        // Goals
        Commands::Goal(GoalCmd {
            action: Some(action),
        }) => cmd_goal(&data_dir, action),
        Commands::Milestone(args) => cmd_milestone(&data_dir, args.action),

        Commands::Timer(args) => {
            cmd_timer(&data_dir, args.action.unwrap_or(TimerAction::Status), json)
        }
        Commands::Reset(args) => cmd_reset(&data_dir, args),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// An open session plus the lock that guards it. The lock is released when
/// this is dropped, after the last save.
struct Planner {
    session: Session<JsonFileStore>,
    _lock: FileLock,
}

fn require_data_dir(data_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !data_dir.is_dir() {
        return Err(format!(
            "data directory not found: {} (run `pri init` first)",
            data_dir.display()
        )
        .into());
    }
    Ok(())
}

/// Lock the data directory, load the snapshot and run the day's rollover.
fn open_planner(data_dir: &Path) -> Result<Planner, Box<dyn std::error::Error>> {
    require_data_dir(data_dir)?;
    let lock = FileLock::acquire_default(data_dir)?;
    let store = JsonFileStore::new(data_dir);
    let path = store.path();
    let session = Session::open(store, Local::now().date_naive());
    if let Some(err) = session.load_error() {
        return Err(format!("could not load {}: {}", path.display(), err).into());
    }
    if let Some(line) = session.report().and_then(format_rollover) {
        eprintln!("{}", line);
    }
    Ok(Planner {
        session,
        _lock: lock,
    })
}

fn load_config(data_dir: &Path) -> Result<PlannerConfig, Box<dyn std::error::Error>> {
    Ok(config_io::read_config(data_dir)?)
}

/// Print info and review notices. Error notices (a failed save) turn into
/// the command's error so the exit status reflects them.
fn flush_notices(session: &mut Session<JsonFileStore>, json: bool) -> CmdResult {
    let mut errors = Vec::new();
    for notice in session.drain_notices() {
        match notice {
            Notice::Error { message } => errors.push(message),
            other if json => println!("{}", serde_json::to_string_pretty(&notice_to_json(&other))?),
            other => println!("{}", format_notice(&other)),
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join("\n").into())
    }
}

fn parse_time(s: &str) -> Result<TimeCategory, String> {
    TimeCategory::parse_category(s)
        .ok_or_else(|| format!("unknown time horizon '{}' (expected today, week or month)", s))
}

fn parse_key(time: &str, priority: &str) -> Result<BucketKey, String> {
    let time = parse_time(time)?;
    let priority = Priority::parse_priority(priority)
        .ok_or_else(|| format!("unknown priority '{}' (expected high, medium or low)", priority))?;
    Ok(BucketKey::new(time, priority))
}

/// Resolve a task ID prefix to its full ID and bucket.
fn resolve_task(planner: &Planner, query: &str) -> Result<(String, BucketKey), Box<dyn std::error::Error>> {
    Ok(task_ops::resolve_task_id(&planner.session.snapshot().tasks, query)?)
}

fn resolve_goal(planner: &Planner, query: &str) -> Result<String, Box<dyn std::error::Error>> {
    Ok(goal_ops::resolve_goal_id(&planner.session.snapshot().goals, query)?)
}

fn created_id(outcome: Outcome) -> Option<String> {
    match outcome {
        Outcome::Applied { created } => created,
        Outcome::Unchanged => None,
    }
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(data_dir: &Path, args: ListArgs, json: bool) -> CmdResult {
    let only = args.time.as_deref().map(parse_time).transpose()?;
    let mut planner = open_planner(data_dir)?;
    let tasks = &planner.session.snapshot().tasks;

    if json {
        let items: Vec<TaskJson> = tasks
            .iter()
            .filter(|(key, _)| only.is_none_or(|t| t == key.time))
            .filter(|(_, task)| !(args.pending && task.is_completed))
            .map(|(key, task)| task_to_json(key, task))
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        for line in format_listing(tasks, only, args.pending) {
            println!("{}", line);
        }
    }
    flush_notices(&mut planner.session, json)
}

fn cmd_stats(data_dir: &Path, json: bool) -> CmdResult {
    let mut planner = open_planner(data_dir)?;
    let dashboard = stats::dashboard(&planner.session.snapshot().tasks);
    if json {
        println!("{}", serde_json::to_string_pretty(&stats_to_json(&dashboard))?);
    } else {
        for line in format_stats(&dashboard) {
            println!("{}", line);
        }
    }
    flush_notices(&mut planner.session, json)
}

fn cmd_goal_list(data_dir: &Path, json: bool) -> CmdResult {
    let mut planner = open_planner(data_dir)?;
    let goals = &planner.session.snapshot().goals;
    if json {
        let items: Vec<GoalJson> = goals.iter().map(goal_to_json).collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if goals.is_empty() {
        println!("No goals yet. Add one with `pri goal add <title>`.");
    } else {
        for (i, goal) in goals.iter().enumerate() {
            if i > 0 {
                println!();
            }
            for line in format_goal(goal) {
                println!("{}", line);
            }
        }
    }
    flush_notices(&mut planner.session, json)
}

// ---------------------------------------------------------------------------
// Task commands
// ---------------------------------------------------------------------------

fn cmd_add(data_dir: &Path, args: AddArgs) -> CmdResult {
    let key = parse_key(&args.time, &args.priority)?;
    let mut planner = open_planner(data_dir)?;
    let outcome = planner.session.apply(Command::AddTask {
        key,
        text: args.text,
    })?;
    flush_notices(&mut planner.session, false)?;
    if let Some(id) = created_id(outcome) {
        println!("{}", id);
    }
    Ok(())
}

fn cmd_edit(data_dir: &Path, args: EditArgs) -> CmdResult {
    let mut planner = open_planner(data_dir)?;
    let (task_id, key) = resolve_task(&planner, &args.id)?;
    planner.session.apply(Command::EditTask {
        key,
        task_id,
        text: args.text,
    })?;
    flush_notices(&mut planner.session, false)
}

fn cmd_rm(data_dir: &Path, args: TaskIdArg) -> CmdResult {
    let mut planner = open_planner(data_dir)?;
    let (task_id, key) = resolve_task(&planner, &args.id)?;
    planner.session.apply(Command::DeleteTask { key, task_id })?;
    flush_notices(&mut planner.session, false)
}

fn cmd_done(data_dir: &Path, args: TaskIdArg) -> CmdResult {
    let mut planner = open_planner(data_dir)?;
    let (task_id, key) = resolve_task(&planner, &args.id)?;
    planner.session.apply(Command::ToggleTask {
        key,
        task_id: task_id.clone(),
    })?;
    flush_notices(&mut planner.session, false)?;
    if let Some((_, task)) = planner.session.snapshot().tasks.find(&task_id) {
        println!("{}", format_task_line(task));
    }
    Ok(())
}

fn cmd_mv(data_dir: &Path, args: MvArgs) -> CmdResult {
    let to = parse_key(&args.time, &args.priority)?;
    let mut planner = open_planner(data_dir)?;
    let (task_id, from) = resolve_task(&planner, &args.id)?;
    planner.session.apply(Command::MoveTask { task_id, from, to })?;
    flush_notices(&mut planner.session, false)?;
    println!("{} -> {}", from, to);
    Ok(())
}

// ---------------------------------------------------------------------------
// Text service
// ---------------------------------------------------------------------------

fn gateway(data_dir: &Path) -> Result<HttpTransformGateway, Box<dyn std::error::Error>> {
    let config = load_config(data_dir)?;
    Ok(HttpTransformGateway::from_config(&config.transform)?)
}

fn cmd_breakdown(data_dir: &Path, args: TaskIdArg, json: bool) -> CmdResult {
    let mut planner = open_planner(data_dir)?;
    let (task_id, key) = resolve_task(&planner, &args.id)?;
    let gateway = gateway(data_dir)?;

    let result = planner.session.breakdown(&gateway, key, &task_id);
    print_created(&mut planner, result, key, json)
}

fn cmd_suggest(data_dir: &Path, json: bool) -> CmdResult {
    let mut planner = open_planner(data_dir)?;
    let gateway = gateway(data_dir)?;
    let result = planner.session.suggest(&gateway);
    print_created(&mut planner, result, SUGGEST_TARGET, json)
}

/// Print tasks a transform created, then any notices.
fn print_created(
    planner: &mut Planner,
    result: Result<Vec<String>, PlannerError>,
    key: BucketKey,
    json: bool,
) -> CmdResult {
    let ids = match result {
        Ok(ids) => ids,
        Err(e) => {
            // the error notice repeats the error itself
            planner.session.drain_notices();
            return Err(e.into());
        }
    };
    let tasks = planner.session.snapshot().tasks.bucket(key);
    let created: Vec<_> = tasks.iter().filter(|t| ids.contains(&t.id)).collect();
    if json {
        let items: Vec<TaskJson> = created.iter().map(|t| task_to_json(key, t)).collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if !created.is_empty() {
        println!("Added to {}:", key);
        for task in created {
            println!("  {}", format_task_line(task));
        }
    }
    flush_notices(&mut planner.session, json)
}

fn cmd_review(data_dir: &Path, json: bool) -> CmdResult {
    let mut planner = open_planner(data_dir)?;
    let gateway = gateway(data_dir)?;
    if let Err(e) = planner.session.review(&gateway) {
        planner.session.drain_notices();
        return Err(e.into());
    }
    flush_notices(&mut planner.session, json)
}

// ---------------------------------------------------------------------------
// Goals
// ---------------------------------------------------------------------------

fn cmd_goal(data_dir: &Path, action: GoalAction) -> CmdResult {
    match action {
        GoalAction::List => cmd_goal_list(data_dir, false),
        GoalAction::Add(args) => {
            let mut planner = open_planner(data_dir)?;
            let outcome = planner.session.apply(Command::AddGoal {
                title: args.title,
                description: args.description.unwrap_or_default(),
                target_year: args.year.unwrap_or_else(|| Local::now().year()),
            })?;
            flush_notices(&mut planner.session, false)?;
            if let Some(id) = created_id(outcome) {
                println!("{}", id);
            }
            Ok(())
        }
        GoalAction::Edit(args) => {
            let update = GoalUpdate {
                title: args.title,
                description: args.description,
                target_year: args.year,
            };
            if update.is_empty() {
                return Err("nothing to change (use --title, --description or --year)".into());
            }
            let mut planner = open_planner(data_dir)?;
            let goal_id = resolve_goal(&planner, &args.id)?;
            planner.session.apply(Command::EditGoal { goal_id, update })?;
            flush_notices(&mut planner.session, false)
        }
        GoalAction::Rm(args) => {
            let mut planner = open_planner(data_dir)?;
            let goal_id = resolve_goal(&planner, &args.id)?;
            planner.session.apply(Command::DeleteGoal { goal_id })?;
            flush_notices(&mut planner.session, false)
        }
    }
}

fn cmd_milestone(data_dir: &Path, action: MilestoneAction) -> CmdResult {
    let mut planner = open_planner(data_dir)?;
    let (goal_id, command) = match action {
        MilestoneAction::Add(args) => {
            let goal_id = resolve_goal(&planner, &args.goal)?;
            let command = Command::AddMilestone {
                goal_id: goal_id.clone(),
                text: args.text,
            };
            (goal_id, command)
        }
        MilestoneAction::Done(args) => {
            let (goal_id, milestone_id) = resolve_milestone(&planner, &args)?;
            let command = Command::ToggleMilestone {
                goal_id: goal_id.clone(),
                milestone_id,
            };
            (goal_id, command)
        }
        MilestoneAction::Rm(args) => {
            let (goal_id, milestone_id) = resolve_milestone(&planner, &args)?;
            let command = Command::DeleteMilestone {
                goal_id: goal_id.clone(),
                milestone_id,
            };
            (goal_id, command)
        }
    };
    planner.session.apply(command)?;
    flush_notices(&mut planner.session, false)?;
    if let Some(goal) = goal_ops::find_goal(&planner.session.snapshot().goals, &goal_id) {
        for line in format_goal(goal) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn resolve_milestone(
    planner: &Planner,
    args: &MilestoneIdArgs,
) -> Result<(String, String), Box<dyn std::error::Error>> {
    let goals = &planner.session.snapshot().goals;
    let goal_id = goal_ops::resolve_goal_id(goals, &args.goal)?;
    let goal = goal_ops::find_goal(goals, &goal_id)
        .ok_or_else(|| format!("goal not found: {}", args.goal))?;
    let milestone_id = goal_ops::resolve_milestone_id(goal, &args.milestone)?;
    Ok((goal_id, milestone_id))
}

// ---------------------------------------------------------------------------
// Timer
// ---------------------------------------------------------------------------

fn announce(outcome: TickOutcome, bell: bool) {
    if let TickOutcome::Completed { finished, next } = outcome {
        if bell {
            print!("\x07");
        }
        println!("{} finished. Next up: {}.", finished, next);
    }
}

fn print_timer(timer_state: &TimerState, json: bool) -> CmdResult {
    if json {
        println!("{}", serde_json::to_string_pretty(&timer_to_json(&timer_state.timer))?);
    } else {
        println!("{}", format_timer(&timer_state.timer));
    }
    Ok(())
}

fn cmd_timer(data_dir: &Path, action: TimerAction, json: bool) -> CmdResult {
    require_data_dir(data_dir)?;
    let bell = load_config(data_dir)?.timer.bell;
    if let TimerAction::Run = action {
        return cmd_timer_run(data_dir, bell);
    }

    let _lock = FileLock::acquire_default(data_dir)?;
    let mut timer_state = state::read_timer_state(data_dir);
    let now = Utc::now();
    let outcome = timer_state.catch_up(now);
    if !json {
        announce(outcome, bell);
    }

    match action {
        TimerAction::Status | TimerAction::Run => {}
        TimerAction::Start => {
            if !timer_state.start(now) {
                eprintln!("timer is already running");
            }
        }
        TimerAction::Pause => {
            if !timer_state.pause(now) {
                eprintln!("timer is not running");
            }
        }
        TimerAction::Reset => timer_state.reset(),
    }
    state::write_timer_state(data_dir, &timer_state)?;
    print_timer(&timer_state, json)
}

/// Count down in the foreground, one tick per second, until the interval
/// completes or another `pri` stops it. Each step re-reads `.timer.json`
/// under the data-dir lock, so a pause or reset from elsewhere wins. The lock
/// is only held for the step itself.
fn cmd_timer_run(data_dir: &Path, bell: bool) -> CmdResult {
    let mut timer_state = {
        let _lock = FileLock::acquire_default(data_dir)?;
        let mut timer_state = state::read_timer_state(data_dir);
        announce(timer_state.catch_up(Utc::now()), bell);
        timer_state.start(Utc::now());
        state::write_timer_state(data_dir, &timer_state)?;
        timer_state
    };

    let mut stdout = std::io::stdout();
    loop {
        print!("\r{}   ", format_timer(&timer_state.timer));
        stdout.flush()?;
        std::thread::sleep(Duration::from_secs(1));

        let (latest, outcome) = {
            let _lock = FileLock::acquire_default(data_dir)?;
            state::advance_stored(data_dir, Utc::now())?
        };
        timer_state = latest;
        if matches!(outcome, TickOutcome::Completed { .. }) {
            println!();
            announce(outcome, bell);
            break;
        }
        if !timer_state.timer.running {
            println!();
            eprintln!("timer stopped elsewhere");
            break;
        }
    }
    println!("{}", format_timer(&timer_state.timer));
    Ok(())
}

// ---------------------------------------------------------------------------
// Reset
// ---------------------------------------------------------------------------

fn cmd_reset(data_dir: &Path, args: ResetArgs) -> CmdResult {
    if !args.yes {
        return Err("this deletes every task and goal; pass --yes to confirm".into());
    }
    let mut planner = open_planner(data_dir)?;
    let snapshot = planner.session.snapshot();
    let (tasks, goals) = (snapshot.tasks.len(), snapshot.goals.len());
    planner.session.apply(Command::ResetAll)?;
    flush_notices(&mut planner.session, false)?;
    println!("Deleted {} tasks and {} goals", tasks, goals);
    Ok(())
}
