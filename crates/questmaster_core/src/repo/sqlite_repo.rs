//! SQLite-backed state store.
//!
//! # Responsibility
//! - Translate one `Mutation` into the row writes it needs, in one
//!   transaction.
//! - Rebuild `CanonicalState` from rows, validating every record.
//!
//! # Invariants
//! - Write paths validate records before SQL mutations.
//! - Logs are read back newest-first by insertion sequence.
//! - Dates are stored as `YYYY-MM-DD`, timestamps as local naive ISO-8601.

use crate::model::habit::Habit;
use crate::model::log_entry::{LogEntry, LogKind};
use crate::model::mutation::Mutation;
use crate::model::profile::PlayerProfile;
use crate::model::state::CanonicalState;
use crate::model::task::{normalize_steps, Task, TaskId, TaskKind, TaskStatus};
use crate::model::validation::ValidationError;
use crate::repo::state_repo::{RepoError, RepoResult, StateStore};
use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, error};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeSet;
use std::time::Instant;
use uuid::Uuid;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// State store over a migrated SQLite connection (see `db::open_db`).
pub struct SqliteStateStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStateStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl StateStore for SqliteStateStore<'_> {
    fn load(&self, user_id: &str) -> RepoResult<CanonicalState> {
        let profile = self
            .conn
            .query_row(
                "SELECT level, exp FROM profiles WHERE user_id = ?1;",
                [user_id],
                |row| {
                    Ok(PlayerProfile {
                        level: row.get("level")?,
                        exp: row.get("exp")?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| RepoError::NotFound(user_id.to_string()))?;
        profile.validate()?;

        Ok(CanonicalState {
            profile,
            habits: load_habits(self.conn, user_id)?,
            tasks: load_tasks(self.conn, user_id)?,
            logs: load_logs(self.conn, user_id)?,
        })
    }

    fn commit(&self, user_id: &str, mutation: &Mutation) -> RepoResult<()> {
        let started_at = Instant::now();
        let tx = self.conn.unchecked_transaction()?;

        match apply_mutation(&tx, user_id, mutation) {
            Ok(()) => {
                tx.commit()?;
                debug!(
                    "event=state_commit module=repo status=ok mutation={} duration_ms={}",
                    mutation.name(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                // Dropping `tx` rolls back every partial write.
                error!(
                    "event=state_commit module=repo status=error mutation={} duration_ms={} error={}",
                    mutation.name(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }
}

fn apply_mutation(conn: &Connection, user_id: &str, mutation: &Mutation) -> RepoResult<()> {
    match mutation {
        Mutation::Initialize(state) => {
            state.validate()?;
            // Cascades to habits, completions, tasks, steps and logs.
            conn.execute("DELETE FROM profiles WHERE user_id = ?1;", [user_id])?;
            conn.execute(
                "INSERT INTO profiles (user_id, level, exp) VALUES (?1, ?2, ?3);",
                params![user_id, state.profile.level, state.profile.exp],
            )?;
            for habit in &state.habits {
                insert_habit(conn, user_id, habit)?;
            }
            for task in &state.tasks {
                insert_task(conn, user_id, task)?;
            }
            // Oldest first so `seq DESC` reads back newest-first.
            for entry in state.logs.iter().rev() {
                insert_log(conn, user_id, entry)?;
            }
        }
        Mutation::HabitCompleted {
            habit_id,
            date,
            log,
            profile,
        } => {
            let exists = conn
                .query_row(
                    "SELECT 1 FROM habits WHERE uuid = ?1 AND user_id = ?2;",
                    params![habit_id.to_string(), user_id],
                    |_| Ok(()),
                )
                .optional()?;
            if exists.is_none() {
                return Err(RepoError::MissingRecord {
                    table: "habits",
                    id: *habit_id,
                });
            }
            conn.execute(
                "INSERT OR IGNORE INTO habit_completions (habit_uuid, completed_on)
                 VALUES (?1, ?2);",
                params![habit_id.to_string(), date.format(DATE_FORMAT).to_string()],
            )?;
            insert_log(conn, user_id, log)?;
            update_profile(conn, user_id, profile)?;
        }
        Mutation::ProjectStepAdvanced {
            task_id,
            current_step,
            log,
            profile,
        } => {
            let step_count = project_step_count(conn, user_id, *task_id)?;
            if *current_step >= step_count {
                return Err(ValidationError::StepOutOfRange {
                    current_step: *current_step,
                    step_count,
                }
                .into());
            }
            conn.execute(
                "UPDATE tasks SET current_step = ?1 WHERE uuid = ?2 AND user_id = ?3;",
                params![to_sql_index(*current_step)?, task_id.to_string(), user_id],
            )?;
            insert_log(conn, user_id, log)?;
            update_profile(conn, user_id, profile)?;
        }
        Mutation::TaskCompleted {
            task_id,
            log,
            profile,
        } => {
            conn.execute(
                "DELETE FROM tasks WHERE uuid = ?1 AND user_id = ?2;",
                params![task_id.to_string(), user_id],
            )?;
            insert_log(conn, user_id, log)?;
            update_profile(conn, user_id, profile)?;
        }
        Mutation::TaskStatusChanged { task_id, status } => {
            let changed = conn.execute(
                "UPDATE tasks SET status = ?1 WHERE uuid = ?2 AND user_id = ?3;",
                params![status.as_str(), task_id.to_string(), user_id],
            )?;
            if changed == 0 {
                return Err(RepoError::MissingRecord {
                    table: "tasks",
                    id: *task_id,
                });
            }
        }
        Mutation::HabitAdded(habit) => insert_habit(conn, user_id, habit)?,
        Mutation::TaskAdded(task) => insert_task(conn, user_id, task)?,
        Mutation::HabitDeleted(habit_id) => {
            conn.execute(
                "DELETE FROM habits WHERE uuid = ?1 AND user_id = ?2;",
                params![habit_id.to_string(), user_id],
            )?;
        }
        Mutation::TaskDeleted(task_id) => {
            conn.execute(
                "DELETE FROM tasks WHERE uuid = ?1 AND user_id = ?2;",
                params![task_id.to_string(), user_id],
            )?;
        }
        Mutation::ProjectStepsReplaced { task_id, steps } => {
            let steps = normalize_steps(steps.iter().cloned())?;
            project_step_count(conn, user_id, *task_id)?;
            conn.execute(
                "UPDATE tasks SET current_step = 0 WHERE uuid = ?1 AND user_id = ?2;",
                params![task_id.to_string(), user_id],
            )?;
            conn.execute(
                "DELETE FROM task_steps WHERE task_uuid = ?1;",
                [task_id.to_string()],
            )?;
            insert_steps(conn, *task_id, &steps)?;
        }
    }
    Ok(())
}

fn update_profile(conn: &Connection, user_id: &str, profile: &PlayerProfile) -> RepoResult<()> {
    profile.validate()?;
    let changed = conn.execute(
        "UPDATE profiles
         SET
            level = ?1,
            exp = ?2,
            updated_at = (strftime('%s', 'now') * 1000)
         WHERE user_id = ?3;",
        params![profile.level, profile.exp, user_id],
    )?;
    if changed == 0 {
        return Err(RepoError::NotFound(user_id.to_string()));
    }
    Ok(())
}

/// Step count of a stored project; errors when the row is absent or simple.
fn project_step_count(conn: &Connection, user_id: &str, task_id: TaskId) -> RepoResult<usize> {
    let count: Option<i64> = conn
        .query_row(
            "SELECT (SELECT COUNT(*) FROM task_steps WHERE task_uuid = t.uuid)
             FROM tasks t
             WHERE t.uuid = ?1 AND t.user_id = ?2 AND t.type = 'project';",
            params![task_id.to_string(), user_id],
            |row| row.get(0),
        )
        .optional()?;
    let count = count.ok_or(RepoError::MissingRecord {
        table: "tasks",
        id: task_id,
    })?;
    usize::try_from(count)
        .map_err(|_| RepoError::InvalidData(format!("invalid step count `{count}`")))
}

fn insert_habit(conn: &Connection, user_id: &str, habit: &Habit) -> RepoResult<()> {
    habit.validate()?;
    conn.execute(
        "INSERT INTO habits (uuid, user_id, title, recurrence_mask, position)
         VALUES (
            ?1, ?2, ?3, ?4,
            (SELECT COALESCE(MAX(position), -1) + 1 FROM habits WHERE user_id = ?2)
         );",
        params![
            habit.id.to_string(),
            user_id,
            habit.title.as_str(),
            habit.recurrence_mask(),
        ],
    )?;
    for date in &habit.completed_dates {
        conn.execute(
            "INSERT INTO habit_completions (habit_uuid, completed_on) VALUES (?1, ?2);",
            params![habit.id.to_string(), date.format(DATE_FORMAT).to_string()],
        )?;
    }
    Ok(())
}

fn insert_task(conn: &Connection, user_id: &str, task: &Task) -> RepoResult<()> {
    task.validate()?;
    let (type_text, current_step) = match &task.kind {
        TaskKind::Simple => ("simple", 0),
        TaskKind::Project { current_step, .. } => ("project", *current_step),
    };
    conn.execute(
        "INSERT INTO tasks (uuid, user_id, title, type, status, current_step, created_at, position)
         VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7,
            (SELECT COALESCE(MAX(position), -1) + 1 FROM tasks WHERE user_id = ?2)
         );",
        params![
            task.id.to_string(),
            user_id,
            task.title.as_str(),
            type_text,
            task.status.as_str(),
            to_sql_index(current_step)?,
            task.created_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )?;
    if let TaskKind::Project { steps, .. } = &task.kind {
        insert_steps(conn, task.id, steps)?;
    }
    Ok(())
}

fn insert_steps(conn: &Connection, task_id: TaskId, steps: &[String]) -> RepoResult<()> {
    let mut stmt =
        conn.prepare("INSERT INTO task_steps (task_uuid, position, label) VALUES (?1, ?2, ?3);")?;
    for (position, label) in steps.iter().enumerate() {
        stmt.execute(params![
            task_id.to_string(),
            to_sql_index(position)?,
            label.as_str()
        ])?;
    }
    Ok(())
}

fn insert_log(conn: &Connection, user_id: &str, entry: &LogEntry) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO logs (uuid, user_id, title, kind, completed_at, exp_gained)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
        params![
            entry.id.to_string(),
            user_id,
            entry.title.as_str(),
            entry.kind.as_str(),
            entry.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            entry.exp_gained,
        ],
    )?;
    Ok(())
}

fn load_habits(conn: &Connection, user_id: &str) -> RepoResult<Vec<Habit>> {
    let mut stmt = conn.prepare(
        "SELECT uuid, title, recurrence_mask
         FROM habits
         WHERE user_id = ?1
         ORDER BY position ASC, rowid ASC;",
    )?;
    let mut completions_stmt = conn.prepare(
        "SELECT completed_on
         FROM habit_completions
         WHERE habit_uuid = ?1
         ORDER BY completed_on ASC;",
    )?;

    let mut rows = stmt.query([user_id])?;
    let mut habits = Vec::new();
    while let Some(row) = rows.next()? {
        let uuid_text: String = row.get("uuid")?;
        let id = parse_uuid(&uuid_text, "habits.uuid")?;

        let mask: i64 = row.get("recurrence_mask")?;
        let mask = u8::try_from(mask).map_err(|_| {
            RepoError::InvalidData(format!(
                "invalid recurrence mask `{mask}` in habits.recurrence_mask"
            ))
        })?;

        let mut completed_dates = BTreeSet::new();
        let mut completion_rows = completions_stmt.query([uuid_text.as_str()])?;
        while let Some(completion) = completion_rows.next()? {
            let text: String = completion.get("completed_on")?;
            completed_dates.insert(parse_date(&text)?);
        }

        let habit = Habit {
            id,
            title: row.get("title")?,
            recurrence_days: Habit::days_from_mask(mask),
            completed_dates,
        };
        habit.validate()?;
        habits.push(habit);
    }
    Ok(habits)
}

fn load_tasks(conn: &Connection, user_id: &str) -> RepoResult<Vec<Task>> {
    let mut stmt = conn.prepare(
        "SELECT uuid, title, type, status, current_step, created_at
         FROM tasks
         WHERE user_id = ?1
         ORDER BY position ASC, rowid ASC;",
    )?;
    let mut steps_stmt = conn.prepare(
        "SELECT label FROM task_steps WHERE task_uuid = ?1 ORDER BY position ASC;",
    )?;

    let mut rows = stmt.query([user_id])?;
    let mut tasks = Vec::new();
    while let Some(row) = rows.next()? {
        let uuid_text: String = row.get("uuid")?;
        let id = parse_uuid(&uuid_text, "tasks.uuid")?;

        let status_text: String = row.get("status")?;
        let status = TaskStatus::parse(&status_text).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid task status `{status_text}` in tasks.status"))
        })?;

        let type_text: String = row.get("type")?;
        let kind = match type_text.as_str() {
            "simple" => TaskKind::Simple,
            "project" => {
                let steps = steps_stmt
                    .query_map([uuid_text.as_str()], |step| step.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                let current_step: i64 = row.get("current_step")?;
                let current_step = usize::try_from(current_step).map_err(|_| {
                    RepoError::InvalidData(format!(
                        "invalid current step `{current_step}` in tasks.current_step"
                    ))
                })?;
                TaskKind::Project {
                    steps,
                    current_step,
                }
            }
            other => {
                return Err(RepoError::InvalidData(format!(
                    "invalid task type `{other}` in tasks.type"
                )));
            }
        };

        let created_text: String = row.get("created_at")?;
        let task = Task {
            id,
            title: row.get("title")?,
            status,
            created_at: parse_timestamp(&created_text)?,
            kind,
        };
        task.validate()?;
        tasks.push(task);
    }
    Ok(tasks)
}

fn load_logs(conn: &Connection, user_id: &str) -> RepoResult<Vec<LogEntry>> {
    let mut stmt = conn.prepare(
        "SELECT uuid, title, kind, completed_at, exp_gained
         FROM logs
         WHERE user_id = ?1
         ORDER BY seq DESC;",
    )?;
    let mut rows = stmt.query([user_id])?;
    let mut logs = Vec::new();
    while let Some(row) = rows.next()? {
        logs.push(parse_log_row(row)?);
    }
    Ok(logs)
}

fn parse_log_row(row: &Row<'_>) -> RepoResult<LogEntry> {
    let uuid_text: String = row.get("uuid")?;
    let kind_text: String = row.get("kind")?;
    let kind = LogKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid log kind `{kind_text}` in logs.kind"))
    })?;
    let completed_text: String = row.get("completed_at")?;

    Ok(LogEntry {
        id: parse_uuid(&uuid_text, "logs.uuid")?,
        title: row.get("title")?,
        kind,
        timestamp: parse_timestamp(&completed_text)?,
        exp_gained: row.get("exp_gained")?,
    })
}

fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

fn parse_date(value: &str) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|err| RepoError::InvalidData(format!("invalid date `{value}`: {err}")))
}

fn parse_timestamp(value: &str) -> RepoResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map_err(|err| RepoError::InvalidData(format!("invalid timestamp `{value}`: {err}")))
}

fn to_sql_index(value: usize) -> RepoResult<i64> {
    i64::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("index `{value}` exceeds SQLite integer range")))
}
