//! Task domain model.
//!
//! # Responsibility
//! - Represent single-shot tasks and multi-step projects as one sum type.
//! - Own the `active`/`paused` status that gates the active-quest view.
//!
//! # Invariants
//! - Projects always have at least one step.
//! - `current_step <= steps.len() - 1` while the project exists.
//! - Completed tasks are removed, never kept with a "done" status.

use crate::model::validation::{normalize_title, ValidationError};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a task or project.
pub type TaskId = Uuid;

/// Whether a task is currently pursued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Listed in the active-quest view.
    Active,
    /// Kept, but hidden from the active-quest view. New tasks start here.
    #[default]
    Paused,
}

impl TaskStatus {
    /// Returns the opposite status.
    pub fn toggled(self) -> Self {
        match self {
            Self::Active => Self::Paused,
            Self::Paused => Self::Active,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "paused" => Some(Self::Paused),
            _ => None,
        }
    }
}

/// Variant-specific task data. Serialized under the `type` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskKind {
    /// Completing it once finishes it.
    Simple,
    /// Ordered steps completed one at a time.
    Project {
        steps: Vec<String>,
        current_step: usize,
    },
}

/// Canonical task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub status: TaskStatus,
    /// Local wall-clock creation time.
    pub created_at: NaiveDateTime,
    #[serde(flatten)]
    pub kind: TaskKind,
}

impl Task {
    /// Creates a paused single-shot task.
    pub fn simple(title: &str, created_at: NaiveDateTime) -> Result<Self, ValidationError> {
        Ok(Self {
            id: Uuid::new_v4(),
            title: normalize_title(title)?,
            status: TaskStatus::default(),
            created_at,
            kind: TaskKind::Simple,
        })
    }

    /// Creates a paused project positioned at its first step.
    ///
    /// Step labels are trimmed and blank labels dropped; at least one label
    /// must remain.
    pub fn project(
        title: &str,
        steps: impl IntoIterator<Item = String>,
        created_at: NaiveDateTime,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            id: Uuid::new_v4(),
            title: normalize_title(title)?,
            status: TaskStatus::default(),
            created_at,
            kind: TaskKind::Project {
                steps: normalize_steps(steps)?,
                current_step: 0,
            },
        })
    }

    pub fn is_project(&self) -> bool {
        matches!(self.kind, TaskKind::Project { .. })
    }

    pub fn is_active(&self) -> bool {
        self.status == TaskStatus::Active
    }

    /// Label of the step the project is currently on.
    pub fn current_step_label(&self) -> Option<&str> {
        match &self.kind {
            TaskKind::Simple => None,
            TaskKind::Project {
                steps,
                current_step,
            } => steps.get(*current_step).map(String::as_str),
        }
    }

    /// Returns whether the next completion finishes the task entirely.
    ///
    /// Simple tasks always do. Projects do once the cursor sits on the last
    /// step, so a single-step project never advances.
    pub fn completes_on_next(&self) -> bool {
        match &self.kind {
            TaskKind::Simple => true,
            TaskKind::Project {
                steps,
                current_step,
            } => *current_step + 1 >= steps.len(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_nil() {
            return Err(ValidationError::NilId);
        }
        if self.title.trim().is_empty() {
            return Err(ValidationError::BlankTitle);
        }
        if let TaskKind::Project {
            steps,
            current_step,
        } = &self.kind
        {
            if steps.is_empty() {
                return Err(ValidationError::EmptySteps);
            }
            if *current_step >= steps.len() {
                return Err(ValidationError::StepOutOfRange {
                    current_step: *current_step,
                    step_count: steps.len(),
                });
            }
        }
        Ok(())
    }
}

/// Trims step labels, drops blank ones, and requires at least one.
pub fn normalize_steps(
    steps: impl IntoIterator<Item = String>,
) -> Result<Vec<String>, ValidationError> {
    let normalized: Vec<String> = steps
        .into_iter()
        .map(|step| step.trim().to_string())
        .filter(|step| !step.is_empty())
        .collect();
    if normalized.is_empty() {
        return Err(ValidationError::EmptySteps);
    }
    Ok(normalized)
}
