//! Quest engine: one user's canonical state, persisted and published.
//!
//! # Responsibility
//! - Own `CanonicalState` for one user session (`init -> mutate -> publish`).
//! - Run completion-service transitions through the `StateStore`.
//! - Rebuild derived views and notify subscribers after each accepted change.
//!
//! # Invariants
//! - `CommitPolicy::ConfirmFirst` never publishes state the store rejected.
//! - `CommitPolicy::Optimistic` restores and republishes the previous state
//!   when the store rejects a commit.
//! - Absent ids and repeated same-day completions are no-ops (`Ok(None)`),
//!   never errors.

use crate::clock::{Clock, SystemClock};
use crate::model::habit::HabitId;
use crate::model::mutation::Mutation;
use crate::model::state::{CanonicalState, UserId};
use crate::model::task::{TaskId, TaskStatus};
use crate::repo::state_repo::{RepoError, StateStore};
use crate::service::completion::{
    self, HabitCompletion, NewHabit, NewTask, Rejection, ServiceResult, TaskCompletion,
    Transition,
};
use crate::view::history::WeekStart;
use crate::view::snapshot::DerivedViews;
use chrono::NaiveDate;
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// When new state becomes visible relative to persistence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommitPolicy {
    /// Persist first, publish only after the store accepts.
    #[default]
    ConfirmFirst,
    /// Publish first, then persist; roll back on failure.
    Optimistic,
}

/// Engine tuning knobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineConfig {
    pub week_start: WeekStart,
    pub commit_policy: CommitPolicy,
}

#[derive(Debug)]
pub enum EngineError {
    /// Store rejected or could not be reached.
    Persistence(RepoError),
    /// Caller input cannot form a valid record.
    Invalid(Rejection),
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Persistence(err) => write!(f, "persistence failure: {err}"),
            Self::Invalid(err) => write!(f, "invalid input: {err}"),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Persistence(err) => Some(err),
            Self::Invalid(err) => Some(err),
        }
    }
}

impl From<RepoError> for EngineError {
    fn from(value: RepoError) -> Self {
        Self::Persistence(value)
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

type Subscriber = Box<dyn Fn(&CanonicalState, &DerivedViews)>;

/// Stateful engine for one user session.
pub struct QuestEngine<S: StateStore, C: Clock = SystemClock> {
    store: S,
    clock: C,
    config: EngineConfig,
    user_id: UserId,
    state: CanonicalState,
    subscribers: Vec<Subscriber>,
}

impl<S: StateStore, C: Clock> QuestEngine<S, C> {
    /// Loads the user's state, or initializes and persists defaults when the
    /// store has none.
    pub fn init(
        store: S,
        clock: C,
        user_id: impl Into<UserId>,
        config: EngineConfig,
    ) -> EngineResult<Self> {
        let user_id = user_id.into();
        let started_at = Instant::now();

        let state = match store.load(&user_id) {
            Ok(state) => {
                info!(
                    "event=engine_init module=engine status=ok source=store habits={} tasks={} logs={} duration_ms={}",
                    state.habits.len(),
                    state.tasks.len(),
                    state.logs.len(),
                    started_at.elapsed().as_millis()
                );
                state
            }
            Err(RepoError::NotFound(_)) => {
                let state = CanonicalState::default();
                store.commit(&user_id, &Mutation::Initialize(Box::new(state.clone())))?;
                info!(
                    "event=engine_init module=engine status=ok source=default duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                state
            }
            Err(err) => {
                error!(
                    "event=engine_init module=engine status=error error_code=load_failed error={}",
                    err
                );
                return Err(err.into());
            }
        };

        Ok(Self {
            store,
            clock,
            config,
            user_id,
            state,
            subscribers: Vec::new(),
        })
    }

    pub fn state(&self) -> &CanonicalState {
        &self.state
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Derived views for the clock's current day.
    pub fn views(&self) -> DerivedViews {
        DerivedViews::build(&self.state, self.clock.today(), self.config.week_start)
    }

    /// Registers a callback invoked with fresh views on every publish.
    pub fn subscribe(&mut self, subscriber: impl Fn(&CanonicalState, &DerivedViews) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Re-sends the current state to every subscriber.
    pub fn publish(&self) {
        if self.subscribers.is_empty() {
            return;
        }
        let views = self.views();
        for subscriber in &self.subscribers {
            subscriber(&self.state, &views);
        }
    }

    /// Checks off a habit for `today`.
    ///
    /// Returns `Ok(None)` when the habit is absent or already done that day.
    pub fn complete_habit(
        &mut self,
        habit_id: HabitId,
        today: NaiveDate,
    ) -> EngineResult<Option<HabitCompletion>> {
        let now = self.clock.now();
        let result = completion::complete_habit(&self.state, habit_id, today, now);
        self.run("complete_habit", result)
    }

    /// Checks off a habit for the clock's current day.
    pub fn complete_habit_today(
        &mut self,
        habit_id: HabitId,
    ) -> EngineResult<Option<HabitCompletion>> {
        let today = self.clock.today();
        self.complete_habit(habit_id, today)
    }

    /// Completes a task, or advances a project by one step.
    pub fn complete_task(&mut self, task_id: TaskId) -> EngineResult<Option<TaskCompletion>> {
        let now = self.clock.now();
        let result = completion::complete_task(&self.state, task_id, now);
        self.run("complete_task", result)
    }

    /// Flips a task between active and paused. Returns the new status.
    pub fn toggle_task_status(&mut self, task_id: TaskId) -> EngineResult<Option<TaskStatus>> {
        let result = completion::toggle_task_status(&self.state, task_id);
        self.run("toggle_task_status", result)
    }

    pub fn add_habit(&mut self, request: NewHabit) -> EngineResult<HabitId> {
        let result = completion::add_habit(&self.state, &request);
        self.run_required("add_habit", result)
    }

    pub fn add_task(&mut self, request: NewTask) -> EngineResult<TaskId> {
        let now = self.clock.now();
        let result = completion::add_task(&self.state, &request, now);
        self.run_required("add_task", result)
    }

    /// Returns `Ok(false)` when the habit was already absent.
    pub fn delete_habit(&mut self, habit_id: HabitId) -> EngineResult<bool> {
        let result = completion::delete_habit(&self.state, habit_id);
        Ok(self.run("delete_habit", result)?.is_some())
    }

    /// Returns `Ok(false)` when the task was already absent.
    pub fn delete_task(&mut self, task_id: TaskId) -> EngineResult<bool> {
        let result = completion::delete_task(&self.state, task_id);
        Ok(self.run("delete_task", result)?.is_some())
    }

    /// Replaces a project's steps and rewinds it to the first step.
    ///
    /// Returns `Ok(false)` for absent tasks, simple tasks, or an empty list.
    pub fn set_project_steps(&mut self, task_id: TaskId, steps: Vec<String>) -> EngineResult<bool> {
        let result = completion::set_project_steps(&self.state, task_id, steps);
        Ok(self.run("set_project_steps", result)?.is_some())
    }

    fn run_required<R>(&mut self, op: &'static str, result: ServiceResult<R>) -> EngineResult<R> {
        match result {
            Ok(transition) => self.commit(op, transition),
            Err(rejection) => {
                warn!(
                    "event=engine_op module=engine status=rejected op={} error_code={} error={}",
                    op,
                    rejection.code(),
                    rejection
                );
                Err(EngineError::Invalid(rejection))
            }
        }
    }

    fn run<R>(&mut self, op: &'static str, result: ServiceResult<R>) -> EngineResult<Option<R>> {
        match result {
            Ok(transition) => self.commit(op, transition).map(Some),
            Err(rejection) => {
                debug!(
                    "event=engine_op module=engine status=skip op={} reason={}",
                    op,
                    rejection.code()
                );
                Ok(None)
            }
        }
    }

    fn commit<R>(&mut self, op: &'static str, transition: Transition<R>) -> EngineResult<R> {
        let Transition {
            next,
            mutation,
            outcome,
        } = transition;
        let started_at = Instant::now();

        match self.config.commit_policy {
            CommitPolicy::ConfirmFirst => {
                if let Err(err) = self.store.commit(&self.user_id, &mutation) {
                    self.log_commit_failure(op, &mutation, &err);
                    return Err(err.into());
                }
                self.state = next;
                self.publish();
            }
            CommitPolicy::Optimistic => {
                let previous = std::mem::replace(&mut self.state, next);
                self.publish();
                if let Err(err) = self.store.commit(&self.user_id, &mutation) {
                    self.log_commit_failure(op, &mutation, &err);
                    self.state = previous;
                    self.publish();
                    return Err(err.into());
                }
            }
        }

        info!(
            "event=engine_op module=engine status=ok op={} mutation={} exp_gained={} level={} duration_ms={}",
            op,
            mutation.name(),
            mutation.log_entry().map_or(0, |entry| entry.exp_gained),
            self.state.profile.level,
            started_at.elapsed().as_millis()
        );
        Ok(outcome)
    }

    fn log_commit_failure(&self, op: &str, mutation: &Mutation, err: &RepoError) {
        error!(
            "event=engine_op module=engine status=error op={} mutation={} policy={:?} error_code=commit_failed error={}",
            op,
            mutation.name(),
            self.config.commit_policy,
            err
        );
    }
}
