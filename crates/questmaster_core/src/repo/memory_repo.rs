//! In-process state store for tests and local-only sessions.

use crate::model::mutation::Mutation;
use crate::model::state::{CanonicalState, UserId};
use crate::model::task::TaskKind;
use crate::repo::state_repo::{RepoError, RepoResult, StateStore};
use std::cell::RefCell;
use std::collections::HashMap;

/// Keeps one `CanonicalState` per user and replays mutations onto it.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    states: RefCell<HashMap<UserId, CanonicalState>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store already holding `state` for `user_id`.
    pub fn with_state(user_id: impl Into<UserId>, state: CanonicalState) -> Self {
        let store = Self::default();
        store.states.borrow_mut().insert(user_id.into(), state);
        store
    }

    /// Copy of what is stored for `user_id`, if anything.
    pub fn snapshot(&self, user_id: &str) -> Option<CanonicalState> {
        self.states.borrow().get(user_id).cloned()
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self, user_id: &str) -> RepoResult<CanonicalState> {
        self.snapshot(user_id)
            .ok_or_else(|| RepoError::NotFound(user_id.to_string()))
    }

    fn commit(&self, user_id: &str, mutation: &Mutation) -> RepoResult<()> {
        let mut states = self.states.borrow_mut();
        if let Mutation::Initialize(state) = mutation {
            state.validate()?;
            states.insert(user_id.to_string(), (**state).clone());
            return Ok(());
        }

        let state = states
            .get_mut(user_id)
            .ok_or_else(|| RepoError::NotFound(user_id.to_string()))?;
        ensure_targets_exist(state, mutation)?;
        state.apply(mutation);
        Ok(())
    }
}

/// Rejects mutations whose habit or project row is absent, like the SQLite
/// store does.
fn ensure_targets_exist(state: &CanonicalState, mutation: &Mutation) -> RepoResult<()> {
    match mutation {
        Mutation::HabitCompleted { habit_id, .. } if state.habit(*habit_id).is_none() => {
            Err(RepoError::MissingRecord {
                table: "habits",
                id: *habit_id,
            })
        }
        Mutation::TaskStatusChanged { task_id, .. } if state.task(*task_id).is_none() => {
            Err(RepoError::MissingRecord {
                table: "tasks",
                id: *task_id,
            })
        }
        Mutation::ProjectStepAdvanced { task_id, .. }
        | Mutation::ProjectStepsReplaced { task_id, .. } => match state.task(*task_id) {
            Some(task) if matches!(task.kind, TaskKind::Project { .. }) => Ok(()),
            _ => Err(RepoError::MissingRecord {
                table: "tasks",
                id: *task_id,
            }),
        },
        _ => Ok(()),
    }
}
