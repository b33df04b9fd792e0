//! Questmaster command-line driver.
//!
//! # Responsibility
//! - Open the per-directory SQLite store and start file logging.
//! - Map one command-line verb to one `QuestEngine` operation.
//! - Print the derived views after every accepted change.
//!
//! # Invariants
//! - Every write goes through `QuestEngine`; the CLI never touches SQL.
//! - Logging failures are reported on stderr but never abort a command.

mod render;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::info;
use questmaster_core::db::{open_db, DbError};
use questmaster_core::{
    default_log_level, init_logging, CommitPolicy, EngineConfig, EngineError, NewHabit, NewTask,
    QuestEngine, SqliteStateStore, SystemClock, TaskStatus, WeekStart,
};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use uuid::Uuid;

const DB_FILE_NAME: &str = "questmaster.db";
const DEFAULT_DATA_DIR: &str = ".questmaster";

/// Gamified habit and task tracker.
#[derive(Parser)]
#[command(name = "questmaster")]
#[command(about = "Level up by completing habits, tasks and projects")]
#[command(version)]
struct Cli {
    /// Directory holding the database and logs
    #[arg(long, global = true, env = "QUESTMASTER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Player whose state is loaded
    #[arg(long, global = true, env = "QUESTMASTER_USER", default_value = "local")]
    user: String,

    /// trace | debug | info | warn | error
    #[arg(long, global = true, env = "QUESTMASTER_LOG_LEVEL")]
    log_level: Option<String>,

    /// Weekly chart anchor: rolling | sunday | monday
    #[arg(long, global = true, env = "QUESTMASTER_WEEK_START", value_parser = parse_week_start, default_value = "rolling")]
    week_start: WeekStart,

    /// Show changes before the store confirms them
    #[arg(long, global = true)]
    optimistic: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show level, today's habits, active quests and the weekly chart
    Status,
    /// List every habit with its schedule
    Habits,
    /// List every task and project
    Tasks,
    /// Show the completion history grouped by day
    Log,
    /// Add a recurring habit
    AddHabit {
        title: String,
        /// Weekday indices, 0 = Sunday (default: every day)
        #[arg(long, value_delimiter = ',', value_parser = clap::value_parser!(u8).range(0..=6))]
        days: Vec<u8>,
    },
    /// Add a task; repeat --step to make it a project
    AddTask {
        title: String,
        #[arg(long = "step")]
        steps: Vec<String>,
        /// Start in the active list instead of paused
        #[arg(long)]
        active: bool,
    },
    /// Check off a habit (id or unique id prefix)
    CompleteHabit {
        id: String,
        /// Day to record, YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Complete a task, or advance a project by one step
    CompleteTask { id: String },
    /// Switch a task between active and paused
    Toggle { id: String },
    /// Replace a project's steps and restart it
    SetSteps {
        id: String,
        #[arg(required = true)]
        steps: Vec<String>,
    },
    /// Remove a habit
    DeleteHabit { id: String },
    /// Remove a task or project
    DeleteTask { id: String },
}

#[derive(Debug)]
enum CliError {
    DataDir { path: PathBuf, message: String },
    Db(DbError),
    Engine(EngineError),
    /// Id argument matched no record, or more than one.
    UnknownId { kind: &'static str, query: String },
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DataDir { path, message } => {
                write!(f, "cannot use data directory `{}`: {message}", path.display())
            }
            Self::Db(err) => write!(f, "database error: {err}"),
            Self::Engine(err) => write!(f, "{err}"),
            Self::UnknownId { kind, query } => {
                write!(f, "no single {kind} matches id `{query}`")
            }
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Engine(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<EngineError> for CliError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

type Engine<'conn> = QuestEngine<SqliteStateStore<'conn>, SystemClock>;

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let data_dir = resolve_data_dir(cli.data_dir.as_deref())?;
    start_logging(&data_dir, cli.log_level.as_deref());

    let conn = open_db(data_dir.join(DB_FILE_NAME))?;
    let config = EngineConfig {
        week_start: cli.week_start,
        commit_policy: if cli.optimistic {
            CommitPolicy::Optimistic
        } else {
            CommitPolicy::ConfirmFirst
        },
    };
    let mut engine = QuestEngine::init(
        SqliteStateStore::new(&conn),
        SystemClock,
        cli.user.as_str(),
        config,
    )?;
    info!(
        "event=cli_command module=cli status=start command={}",
        cli.command.name()
    );

    execute(&mut engine, cli.command)
}

fn execute(engine: &mut Engine<'_>, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Status => render::status(&engine.views()),
        Commands::Habits => render::habits(&engine.state().habits),
        Commands::Tasks => render::tasks(&engine.state().tasks),
        Commands::Log => render::history(&engine.views().history),
        Commands::AddHabit { title, days } => {
            let id = engine.add_habit(NewHabit {
                title,
                recurrence_days: days,
            })?;
            println!("added habit {}", render::short_id(id));
        }
        Commands::AddTask {
            title,
            steps,
            active,
        } => {
            let request = if steps.is_empty() {
                NewTask::simple(title)
            } else {
                NewTask::project(title, steps)
            };
            let status = if active {
                TaskStatus::Active
            } else {
                TaskStatus::Paused
            };
            let id = engine.add_task(request.with_status(status))?;
            println!("added task {}", render::short_id(id));
        }
        Commands::CompleteHabit { id, date } => {
            let habit_id = resolve_habit(engine, &id)?;
            let result = match date {
                Some(date) => engine.complete_habit(habit_id, date)?,
                None => engine.complete_habit_today(habit_id)?,
            };
            match result {
                Some(completion) => render::reward(
                    completion.exp_gained,
                    completion.new_level,
                    engine.state().profile,
                ),
                None => println!("already done for that day"),
            }
        }
        Commands::CompleteTask { id } => {
            let task_id = resolve_task(engine, &id)?;
            if let Some(completion) = engine.complete_task(task_id)? {
                if !completion.is_full_complete {
                    println!("step done");
                }
                render::reward(
                    completion.exp_gained,
                    completion.new_level,
                    engine.state().profile,
                );
            }
        }
        Commands::Toggle { id } => {
            let task_id = resolve_task(engine, &id)?;
            if let Some(status) = engine.toggle_task_status(task_id)? {
                println!("task is now {}", status.as_str());
            }
        }
        Commands::SetSteps { id, steps } => {
            let task_id = resolve_task(engine, &id)?;
            if engine.set_project_steps(task_id, steps)? {
                println!("steps replaced");
            } else {
                println!("not a project, or no usable steps given");
            }
        }
        Commands::DeleteHabit { id } => {
            let habit_id = resolve_habit(engine, &id)?;
            engine.delete_habit(habit_id)?;
            println!("habit deleted");
        }
        Commands::DeleteTask { id } => {
            let task_id = resolve_task(engine, &id)?;
            engine.delete_task(task_id)?;
            println!("task deleted");
        }
    }
    Ok(())
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Habits => "habits",
            Self::Tasks => "tasks",
            Self::Log => "log",
            Self::AddHabit { .. } => "add_habit",
            Self::AddTask { .. } => "add_task",
            Self::CompleteHabit { .. } => "complete_habit",
            Self::CompleteTask { .. } => "complete_task",
            Self::Toggle { .. } => "toggle",
            Self::SetSteps { .. } => "set_steps",
            Self::DeleteHabit { .. } => "delete_habit",
            Self::DeleteTask { .. } => "delete_task",
        }
    }
}

fn resolve_habit(engine: &Engine<'_>, query: &str) -> Result<Uuid, CliError> {
    let ids = engine.state().habits.iter().map(|habit| habit.id);
    match_id(ids, query).ok_or_else(|| CliError::UnknownId {
        kind: "habit",
        query: query.to_string(),
    })
}

fn resolve_task(engine: &Engine<'_>, query: &str) -> Result<Uuid, CliError> {
    let ids = engine.state().tasks.iter().map(|task| task.id);
    match_id(ids, query).ok_or_else(|| CliError::UnknownId {
        kind: "task",
        query: query.to_string(),
    })
}

/// Finds the one id whose hyphenated form starts with `query`.
fn match_id(ids: impl Iterator<Item = Uuid>, query: &str) -> Option<Uuid> {
    let query = query.trim().to_ascii_lowercase();
    if query.is_empty() {
        return None;
    }
    let mut matches = ids.filter(|id| id.to_string().starts_with(&query));
    let first = matches.next()?;
    matches.next().is_none().then_some(first)
}

fn resolve_data_dir(configured: Option<&Path>) -> Result<PathBuf, CliError> {
    let path = match configured {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(DEFAULT_DATA_DIR),
    };
    let path = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .map_err(|err| CliError::DataDir {
                path: path.clone(),
                message: err.to_string(),
            })?
            .join(path)
    };
    std::fs::create_dir_all(&path).map_err(|err| CliError::DataDir {
        path: path.clone(),
        message: err.to_string(),
    })?;
    Ok(path)
}

fn start_logging(data_dir: &Path, level: Option<&str>) {
    let log_dir = data_dir.join("logs");
    let Some(log_dir) = log_dir.to_str() else {
        eprintln!("warning: log directory is not valid UTF-8; logging disabled");
        return;
    };
    let level = level.unwrap_or(default_log_level());
    if let Err(err) = init_logging(level, log_dir) {
        eprintln!("warning: logging disabled: {err}");
    }
}

fn parse_week_start(value: &str) -> Result<WeekStart, String> {
    WeekStart::parse(value).ok_or_else(|| format!("expected rolling|sunday|monday, got `{value}`"))
}

#[cfg(test)]
mod tests {
    use super::{match_id, parse_week_start, start_logging, Cli};
    use clap::{CommandFactory, Parser};
    use questmaster_core::WeekStart;
    use uuid::Uuid;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn match_id_accepts_unique_prefixes_only() {
        let a = Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap();
        let b = Uuid::parse_str("11119999-2222-4333-8444-555555555555").unwrap();

        assert_eq!(match_id([a, b].into_iter(), "11111"), Some(a));
        assert_eq!(match_id([a, b].into_iter(), "1111"), None);
        assert_eq!(match_id([a, b].into_iter(), ""), None);
        assert_eq!(match_id([a, b].into_iter(), &b.to_string().to_uppercase()), Some(b));
    }

    #[test]
    fn start_logging_accepts_level_borrowed_from_arguments() {
        let data_dir = tempfile::tempdir().unwrap();
        let level = String::from("INFO");

        start_logging(data_dir.path(), Some(level.as_str()));

        let (active_level, active_dir) = questmaster_core::logging_status().unwrap();
        assert_eq!(active_level, "info");
        assert_eq!(active_dir, data_dir.path().join("logs"));
    }

    #[test]
    fn week_start_flag_parses_known_anchors() {
        assert_eq!(parse_week_start("Monday").unwrap(), WeekStart::Monday);
        assert!(parse_week_start("friday").is_err());
    }

    #[test]
    fn add_habit_days_are_comma_separated() {
        let cli = Cli::try_parse_from(["questmaster", "add-habit", "run", "--days", "1,3,5"])
            .unwrap();
        match cli.command {
            super::Commands::AddHabit { title, days } => {
                assert_eq!(title, "run");
                assert_eq!(days, vec![1, 3, 5]);
            }
            _ => panic!("unexpected command"),
        }
        assert!(Cli::try_parse_from(["questmaster", "add-habit", "run", "--days", "7"]).is_err());
    }
}
