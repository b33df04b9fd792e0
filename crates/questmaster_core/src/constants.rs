//! Fixed gameplay constants shared by every engine implementation.

/// EXP awarded for checking off a habit for one calendar day.
pub const HABIT_REWARD: u32 = 15;

/// EXP awarded for completing a simple (single-shot) task.
pub const TASK_REWARD: u32 = 25;

/// EXP awarded for advancing a project by one intermediate step.
pub const PROJECT_STEP_REWARD: u32 = 10;

/// EXP awarded when the last step of a project completes.
pub const PROJECT_DONE_REWARD: u32 = 40;

/// EXP cost multiplier: advancing out of level `L` costs `L * EXP_PER_LEVEL`.
pub const EXP_PER_LEVEL: u32 = 100;

/// Number of days covered by the weekly activity window.
pub const WEEK_LEN: usize = 7;
