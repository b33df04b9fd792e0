//! Core domain logic for Questmaster.
//! This crate is the single source of truth for EXP, leveling and quest
//! completion invariants.

pub mod clock;
pub mod constants;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod view;

pub use clock::{Clock, FixedClock, SystemClock};
pub use constants::{
    EXP_PER_LEVEL, HABIT_REWARD, PROJECT_DONE_REWARD, PROJECT_STEP_REWARD, TASK_REWARD,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::habit::{weekday_index, Habit, HabitId, ALL_WEEKDAYS};
pub use model::log_entry::{LogEntry, LogEntryId, LogKind};
pub use model::mutation::Mutation;
pub use model::profile::{required_exp_for_level, PlayerProfile};
pub use model::state::{CanonicalState, UserId};
pub use model::task::{Task, TaskId, TaskKind, TaskStatus};
pub use model::validation::ValidationError;
pub use repo::memory_repo::MemoryStateStore;
pub use repo::sqlite_repo::SqliteStateStore;
pub use repo::state_repo::{RepoError, RepoResult, StateStore};
pub use service::completion::{
    HabitCompletion, NewHabit, NewTask, Rejection, ServiceResult, TaskCompletion, Transition,
};
pub use service::leveling::{apply_exp, LevelOutcome};
pub use service::quest_engine::{
    CommitPolicy, EngineConfig, EngineError, EngineResult, QuestEngine,
};
pub use view::history::{
    group_by_date_label, weekly_stats, DateGroup, DateLabel, DayBucket, WeekStart, WeeklyStats,
};
pub use view::snapshot::{DerivedViews, LevelProgress};
pub use view::today::{active_tasks, today_habits};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
