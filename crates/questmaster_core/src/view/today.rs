//! "What is actionable now" views.

use crate::model::habit::Habit;
use crate::model::task::Task;
use chrono::NaiveDate;

/// Habits scheduled on `today`'s weekday and not yet checked off today.
pub fn today_habits(habits: &[Habit], today: NaiveDate) -> Vec<Habit> {
    habits
        .iter()
        .filter(|habit| habit.is_scheduled_on(today) && !habit.is_completed_on(today))
        .cloned()
        .collect()
}

/// Tasks and projects with `active` status, in canonical order.
pub fn active_tasks(tasks: &[Task]) -> Vec<Task> {
    tasks.iter().filter(|task| task.is_active()).cloned().collect()
}
