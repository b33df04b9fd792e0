//! Completion service: pure state transitions over `CanonicalState`.
//!
//! # Responsibility
//! - Decide whether an operation applies, and build its `Mutation`.
//! - Compute the next canonical state and the caller-facing result.
//!
//! # Invariants
//! - Operations never touch the input state; they return a `Transition` or a
//!   `Rejection`, so a rejected operation has no partial effect.
//! - The next state is always derived through `CanonicalState::apply`.
//! - EXP is credited exactly once per completion; a habit is credited at
//!   most once per calendar day.
//! - Recurrence is not checked here; the today view owns that filter.

use crate::model::habit::{Habit, HabitId};
use crate::model::log_entry::{LogEntry, LogKind};
use crate::model::mutation::Mutation;
use crate::model::state::CanonicalState;
use crate::model::task::{normalize_steps, Task, TaskId, TaskKind, TaskStatus};
use crate::model::validation::ValidationError;
use crate::service::leveling::apply_exp;
use chrono::{NaiveDate, NaiveDateTime};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Why an operation was not applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    HabitNotFound(HabitId),
    TaskNotFound(TaskId),
    /// The habit already holds this date.
    AlreadyCompletedToday { habit_id: HabitId, date: NaiveDate },
    /// Step replacement targeted a simple task.
    NotAProject(TaskId),
    /// Input would produce a record that breaks a model invariant.
    InvalidRecord(ValidationError),
}

impl Display for Rejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HabitNotFound(id) => write!(f, "habit not found: {id}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::AlreadyCompletedToday { habit_id, date } => {
                write!(f, "habit {habit_id} already completed on {date}")
            }
            Self::NotAProject(id) => write!(f, "task is not a project: {id}"),
            Self::InvalidRecord(err) => write!(f, "{err}"),
        }
    }
}

impl Error for Rejection {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidRecord(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for Rejection {
    fn from(value: ValidationError) -> Self {
        Self::InvalidRecord(value)
    }
}

impl Rejection {
    /// Stable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::HabitNotFound(_) | Self::TaskNotFound(_) => "not_found",
            Self::AlreadyCompletedToday { .. } => "already_completed",
            Self::NotAProject(_) => "not_a_project",
            Self::InvalidRecord(_) => "invalid_record",
        }
    }
}

/// Accepted operation: the state to publish, the mutation to commit, and the
/// caller-facing result.
#[derive(Debug, Clone)]
pub struct Transition<R> {
    pub next: CanonicalState,
    pub mutation: Mutation,
    pub outcome: R,
}

pub type ServiceResult<R> = Result<Transition<R>, Rejection>;

/// Result of a habit check-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HabitCompletion {
    pub leveled_up: bool,
    pub new_level: Option<u32>,
    pub exp_gained: u32,
}

/// Result of a task completion or project step advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskCompletion {
    pub leveled_up: bool,
    pub new_level: Option<u32>,
    pub exp_gained: u32,
    /// False when a project only advanced one step.
    pub is_full_complete: bool,
}

/// Input for `add_habit`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewHabit {
    pub title: String,
    /// Weekday indices (0 = Sunday). Empty means every day.
    pub recurrence_days: Vec<u8>,
}

/// Input for `add_task`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    /// `Some` creates a project with these steps.
    pub steps: Option<Vec<String>>,
    pub status: TaskStatus,
}

impl NewTask {
    pub fn simple(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn project(title: impl Into<String>, steps: Vec<String>) -> Self {
        Self {
            title: title.into(),
            steps: Some(steps),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }
}

fn transition<R>(state: &CanonicalState, mutation: Mutation, outcome: R) -> Transition<R> {
    let mut next = state.clone();
    next.apply(&mutation);
    Transition {
        next,
        mutation,
        outcome,
    }
}

/// Checks off `habit_id` for `today`, crediting the habit reward.
pub fn complete_habit(
    state: &CanonicalState,
    habit_id: HabitId,
    today: NaiveDate,
    at: NaiveDateTime,
) -> ServiceResult<HabitCompletion> {
    let habit = state
        .habit(habit_id)
        .ok_or(Rejection::HabitNotFound(habit_id))?;
    if habit.is_completed_on(today) {
        return Err(Rejection::AlreadyCompletedToday {
            habit_id,
            date: today,
        });
    }

    let log = LogEntry::new(habit.title.clone(), LogKind::Habit, at);
    let exp_gained = log.exp_gained;
    let (profile, level) = apply_exp(state.profile, exp_gained);
    let mutation = Mutation::HabitCompleted {
        habit_id,
        date: today,
        log,
        profile,
    };

    Ok(transition(
        state,
        mutation,
        HabitCompletion {
            leveled_up: level.leveled_up,
            new_level: level.new_level,
            exp_gained,
        },
    ))
}

/// Completes a simple task, or advances/finishes a project.
///
/// "Last step" is decided before the cursor moves, so a single-step project
/// finishes on the first call.
pub fn complete_task(
    state: &CanonicalState,
    task_id: TaskId,
    at: NaiveDateTime,
) -> ServiceResult<TaskCompletion> {
    let task = state.task(task_id).ok_or(Rejection::TaskNotFound(task_id))?;
    task.validate()?;

    let is_full_complete = task.completes_on_next();
    let log = match (&task.kind, is_full_complete) {
        (TaskKind::Simple, _) => LogEntry::new(task.title.clone(), LogKind::Task, at),
        (TaskKind::Project { .. }, true) => {
            LogEntry::new(task.title.clone(), LogKind::ProjectDone, at)
        }
        (TaskKind::Project { .. }, false) => {
            let step = task.current_step_label().unwrap_or_default();
            LogEntry::new(
                format!("{} - {} done", task.title, step),
                LogKind::ProjectStep,
                at,
            )
        }
    };
    let exp_gained = log.exp_gained;
    let (profile, level) = apply_exp(state.profile, exp_gained);

    let mutation = match &task.kind {
        TaskKind::Project { current_step, .. } if !is_full_complete => {
            Mutation::ProjectStepAdvanced {
                task_id,
                current_step: current_step + 1,
                log,
                profile,
            }
        }
        _ => Mutation::TaskCompleted {
            task_id,
            log,
            profile,
        },
    };

    Ok(transition(
        state,
        mutation,
        TaskCompletion {
            leveled_up: level.leveled_up,
            new_level: level.new_level,
            exp_gained,
            is_full_complete,
        },
    ))
}

/// Flips `active <-> paused`. Returns the new status.
pub fn toggle_task_status(state: &CanonicalState, task_id: TaskId) -> ServiceResult<TaskStatus> {
    let task = state.task(task_id).ok_or(Rejection::TaskNotFound(task_id))?;
    let status = task.status.toggled();
    Ok(transition(
        state,
        Mutation::TaskStatusChanged { task_id, status },
        status,
    ))
}

pub fn add_habit(state: &CanonicalState, request: &NewHabit) -> ServiceResult<HabitId> {
    let habit = Habit::with_recurrence(&request.title, request.recurrence_days.iter().copied())?;
    let id = habit.id;
    Ok(transition(state, Mutation::HabitAdded(habit), id))
}

pub fn add_task(
    state: &CanonicalState,
    request: &NewTask,
    at: NaiveDateTime,
) -> ServiceResult<TaskId> {
    let mut task = match &request.steps {
        None => Task::simple(&request.title, at)?,
        Some(steps) => Task::project(&request.title, steps.iter().cloned(), at)?,
    };
    task.status = request.status;
    let id = task.id;
    Ok(transition(state, Mutation::TaskAdded(task), id))
}

pub fn delete_habit(state: &CanonicalState, habit_id: HabitId) -> ServiceResult<()> {
    state
        .habit(habit_id)
        .ok_or(Rejection::HabitNotFound(habit_id))?;
    Ok(transition(state, Mutation::HabitDeleted(habit_id), ()))
}

pub fn delete_task(state: &CanonicalState, task_id: TaskId) -> ServiceResult<()> {
    state.task(task_id).ok_or(Rejection::TaskNotFound(task_id))?;
    Ok(transition(state, Mutation::TaskDeleted(task_id), ()))
}

/// Replaces a project's steps and rewinds it to the first step.
pub fn set_project_steps(
    state: &CanonicalState,
    task_id: TaskId,
    steps: Vec<String>,
) -> ServiceResult<()> {
    let task = state.task(task_id).ok_or(Rejection::TaskNotFound(task_id))?;
    if !task.is_project() {
        return Err(Rejection::NotAProject(task_id));
    }
    let steps = normalize_steps(steps)?;
    Ok(transition(
        state,
        Mutation::ProjectStepsReplaced { task_id, steps },
        (),
    ))
}
