//! Committed state transitions.
//!
//! # Responsibility
//! - Describe one logical engine transition as a single commit unit.
//! - Carry every value a store needs to replay the transition, so stores never
//!   recompute rewards or levels themselves.
//!
//! # Invariants
//! - Mutations are only built by the completion service from validated state.
//! - Replaying a mutation through `CanonicalState::apply` yields the same state
//!   the engine publishes.

use crate::model::habit::{Habit, HabitId};
use crate::model::log_entry::LogEntry;
use crate::model::profile::PlayerProfile;
use crate::model::state::CanonicalState;
use crate::model::task::{Task, TaskId, TaskStatus};
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Replace everything stored for the user (first run or reset).
    Initialize(Box<CanonicalState>),
    /// Append a completion date, log the reward and store the new profile.
    HabitCompleted {
        habit_id: HabitId,
        date: NaiveDate,
        log: LogEntry,
        profile: PlayerProfile,
    },
    /// Move a project cursor forward by one step.
    ProjectStepAdvanced {
        task_id: TaskId,
        current_step: usize,
        log: LogEntry,
        profile: PlayerProfile,
    },
    /// Remove a fully completed task or project.
    TaskCompleted {
        task_id: TaskId,
        log: LogEntry,
        profile: PlayerProfile,
    },
    TaskStatusChanged {
        task_id: TaskId,
        status: TaskStatus,
    },
    HabitAdded(Habit),
    TaskAdded(Task),
    HabitDeleted(HabitId),
    TaskDeleted(TaskId),
    /// Replace a project's steps and rewind it to the first one.
    ProjectStepsReplaced {
        task_id: TaskId,
        steps: Vec<String>,
    },
}

impl Mutation {
    /// Stable name used in log events.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initialize(_) => "initialize",
            Self::HabitCompleted { .. } => "habit_completed",
            Self::ProjectStepAdvanced { .. } => "project_step_advanced",
            Self::TaskCompleted { .. } => "task_completed",
            Self::TaskStatusChanged { .. } => "task_status_changed",
            Self::HabitAdded(_) => "habit_added",
            Self::TaskAdded(_) => "task_added",
            Self::HabitDeleted(_) => "habit_deleted",
            Self::TaskDeleted(_) => "task_deleted",
            Self::ProjectStepsReplaced { .. } => "project_steps_replaced",
        }
    }

    /// Log entry appended by this mutation, if any.
    pub fn log_entry(&self) -> Option<&LogEntry> {
        match self {
            Self::HabitCompleted { log, .. }
            | Self::ProjectStepAdvanced { log, .. }
            | Self::TaskCompleted { log, .. } => Some(log),
            _ => None,
        }
    }
}
