//! Canonical per-user state and the single definition of mutation replay.

use crate::model::habit::{Habit, HabitId};
use crate::model::log_entry::LogEntry;
use crate::model::mutation::Mutation;
use crate::model::profile::PlayerProfile;
use crate::model::task::{Task, TaskId, TaskKind};
use crate::model::validation::ValidationError;
use serde::{Deserialize, Serialize};

/// Opaque user identifier supplied by the identity provider.
pub type UserId = String;

/// Single in-memory source of truth for one user's session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalState {
    pub profile: PlayerProfile,
    pub habits: Vec<Habit>,
    pub tasks: Vec<Task>,
    /// Newest first.
    pub logs: Vec<LogEntry>,
}

impl CanonicalState {
    pub fn habit(&self, id: HabitId) -> Option<&Habit> {
        self.habits.iter().find(|habit| habit.id == id)
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    fn task_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == id)
    }

    /// Validates every record held by this state.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.profile.validate()?;
        for habit in &self.habits {
            habit.validate()?;
        }
        for task in &self.tasks {
            task.validate()?;
        }
        Ok(())
    }

    /// Applies one committed mutation.
    ///
    /// References to records that no longer exist are skipped; the log and
    /// profile parts of a completion still apply (last write wins).
    pub fn apply(&mut self, mutation: &Mutation) {
        match mutation {
            Mutation::Initialize(state) => {
                *self = (**state).clone();
            }
            Mutation::HabitCompleted {
                habit_id,
                date,
                log,
                profile,
            } => {
                if let Some(habit) = self.habits.iter_mut().find(|h| h.id == *habit_id) {
                    habit.completed_dates.insert(*date);
                }
                self.push_log(log.clone());
                self.profile = *profile;
            }
            Mutation::ProjectStepAdvanced {
                task_id,
                current_step: next_step,
                log,
                profile,
            } => {
                if let Some(task) = self.task_mut(*task_id) {
                    if let TaskKind::Project { current_step, .. } = &mut task.kind {
                        *current_step = *next_step;
                    }
                }
                self.push_log(log.clone());
                self.profile = *profile;
            }
            Mutation::TaskCompleted {
                task_id,
                log,
                profile,
            } => {
                self.tasks.retain(|task| task.id != *task_id);
                self.push_log(log.clone());
                self.profile = *profile;
            }
            Mutation::TaskStatusChanged { task_id, status } => {
                if let Some(task) = self.task_mut(*task_id) {
                    task.status = *status;
                }
            }
            Mutation::HabitAdded(habit) => self.habits.push(habit.clone()),
            Mutation::TaskAdded(task) => self.tasks.push(task.clone()),
            Mutation::HabitDeleted(habit_id) => {
                self.habits.retain(|habit| habit.id != *habit_id);
            }
            Mutation::TaskDeleted(task_id) => {
                self.tasks.retain(|task| task.id != *task_id);
            }
            Mutation::ProjectStepsReplaced { task_id, steps } => {
                if let Some(task) = self.task_mut(*task_id) {
                    if let TaskKind::Project { .. } = task.kind {
                        task.kind = TaskKind::Project {
                            steps: steps.clone(),
                            current_step: 0,
                        };
                    }
                }
            }
        }
    }

    fn push_log(&mut self, entry: LogEntry) {
        self.logs.insert(0, entry);
    }
}
