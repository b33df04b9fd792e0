//! Bundle of every derived view, rebuilt on each publish.

use crate::model::habit::Habit;
use crate::model::state::CanonicalState;
use crate::model::task::Task;
use crate::view::history::{group_by_date_label, weekly_stats, DateGroup, WeekStart, WeeklyStats};
use crate::view::today::{active_tasks, today_habits};
use chrono::NaiveDate;

/// Level bar data: current EXP against the threshold of the current level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelProgress {
    pub level: u32,
    pub exp: u32,
    pub required: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedViews {
    pub today: NaiveDate,
    pub progress: LevelProgress,
    pub today_habits: Vec<Habit>,
    pub active_tasks: Vec<Task>,
    pub weekly: WeeklyStats,
    pub history: Vec<DateGroup>,
}

impl DerivedViews {
    pub fn build(state: &CanonicalState, today: NaiveDate, week_start: WeekStart) -> Self {
        Self {
            today,
            progress: LevelProgress {
                level: state.profile.level,
                exp: state.profile.exp,
                required: state.profile.required_exp(),
            },
            today_habits: today_habits(&state.habits, today),
            active_tasks: active_tasks(&state.tasks),
            weekly: weekly_stats(&state.logs, today, week_start),
            history: group_by_date_label(&state.logs, today),
        }
    }
}
