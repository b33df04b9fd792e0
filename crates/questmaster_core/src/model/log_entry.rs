//! Activity log entries: the audit trail for EXP accounting.

use crate::constants::{HABIT_REWARD, PROJECT_DONE_REWARD, PROJECT_STEP_REWARD, TASK_REWARD};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type LogEntryId = Uuid;

/// What kind of completion produced a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Habit,
    Task,
    ProjectStep,
    ProjectDone,
}

impl LogKind {
    /// Fixed EXP reward for this completion kind.
    pub fn reward(self) -> u32 {
        match self {
            Self::Habit => HABIT_REWARD,
            Self::Task => TASK_REWARD,
            Self::ProjectStep => PROJECT_STEP_REWARD,
            Self::ProjectDone => PROJECT_DONE_REWARD,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Habit => "habit",
            Self::Task => "task",
            Self::ProjectStep => "project_step",
            Self::ProjectDone => "project_done",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "habit" => Some(Self::Habit),
            "task" => Some(Self::Task),
            "project_step" => Some(Self::ProjectStep),
            "project_done" => Some(Self::ProjectDone),
            _ => None,
        }
    }
}

/// Immutable record of one completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: LogEntryId,
    /// Title snapshot taken at completion time.
    pub title: String,
    #[serde(rename = "type")]
    pub kind: LogKind,
    /// Local wall-clock completion time.
    pub timestamp: NaiveDateTime,
    pub exp_gained: u32,
}

impl LogEntry {
    /// Creates an entry crediting the fixed reward for `kind`.
    pub fn new(title: impl Into<String>, kind: LogKind, timestamp: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            kind,
            timestamp,
            exp_gained: kind.reward(),
        }
    }
}
