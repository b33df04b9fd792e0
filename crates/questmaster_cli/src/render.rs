//! Plain-text rendering of engine state and derived views.

use questmaster_core::{
    DateGroup, DerivedViews, Habit, LogEntry, LogKind, PlayerProfile, Task, TaskKind, WeeklyStats,
};
use uuid::Uuid;

const BAR_WIDTH: usize = 20;
const WEEKDAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// First block of the hyphenated id; enough to address a record.
pub fn short_id(id: Uuid) -> String {
    id.to_string().chars().take(8).collect()
}

pub fn status(views: &DerivedViews) {
    let progress = views.progress;
    println!(
        "Level {}  [{}]  {}/{} EXP",
        progress.level,
        bar(progress.exp, progress.required, BAR_WIDTH),
        progress.exp,
        progress.required
    );

    println!();
    println!("Today's habits ({})", views.today.format("%a %Y-%m-%d"));
    if views.today_habits.is_empty() {
        println!("  all done");
    }
    for habit in &views.today_habits {
        println!("  {}  {}", short_id(habit.id), habit.title);
    }

    println!();
    println!("Active quests");
    if views.active_tasks.is_empty() {
        println!("  none");
    }
    for task in &views.active_tasks {
        println!("  {}  {}", short_id(task.id), task_line(task));
    }

    println!();
    weekly(&views.weekly);
}

pub fn habits(habits: &[Habit]) {
    if habits.is_empty() {
        println!("no habits yet");
    }
    for habit in habits {
        let days: Vec<&str> = habit
            .recurrence_days
            .iter()
            .filter_map(|day| WEEKDAY_NAMES.get(usize::from(*day)).copied())
            .collect();
        println!(
            "{}  {}  [{}]  done {} times",
            short_id(habit.id),
            habit.title,
            days.join(","),
            habit.completed_dates.len()
        );
    }
}

pub fn tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("no tasks yet");
    }
    for task in tasks {
        println!(
            "{}  {:<6}  {}",
            short_id(task.id),
            task.status.as_str(),
            task_line(task)
        );
    }
}

pub fn history(groups: &[DateGroup]) {
    if groups.is_empty() {
        println!("nothing completed yet");
    }
    for group in groups {
        println!("{}", group.label);
        for entry in &group.entries {
            println!("  {}", log_line(entry));
        }
    }
}

pub fn reward(exp_gained: u32, new_level: Option<u32>, profile: PlayerProfile) {
    println!(
        "+{exp_gained} EXP  (level {}, {}/{})",
        profile.level,
        profile.exp,
        profile.required_exp()
    );
    if let Some(level) = new_level {
        println!("LEVEL UP! You reached level {level}.");
    }
}

fn weekly(stats: &WeeklyStats) {
    println!(
        "This week: {} completions, {} EXP",
        stats.total_count, stats.total_exp
    );
    for day in &stats.days {
        println!(
            "  {}  {:<width$}  {}",
            day.date.format("%a %m-%d"),
            "#".repeat(scaled(day.count, stats.max_count, BAR_WIDTH)),
            day.count,
            width = BAR_WIDTH
        );
    }
}

fn task_line(task: &Task) -> String {
    match &task.kind {
        TaskKind::Simple => task.title.clone(),
        TaskKind::Project {
            steps,
            current_step,
        } => format!(
            "{}  (step {}/{}: {})",
            task.title,
            current_step + 1,
            steps.len(),
            task.current_step_label().unwrap_or_default()
        ),
    }
}

fn log_line(entry: &LogEntry) -> String {
    let marker = match entry.kind {
        LogKind::Habit => "habit",
        LogKind::Task => "task",
        LogKind::ProjectStep => "step",
        LogKind::ProjectDone => "project",
    };
    format!(
        "{}  {:<7}  +{:<3}  {}",
        entry.timestamp.format("%H:%M"),
        marker,
        entry.exp_gained,
        entry.title
    )
}

fn bar(value: u32, max: u32, width: usize) -> String {
    let filled = scaled(value, max, width);
    format!("{}{}", "#".repeat(filled), "-".repeat(width - filled))
}

fn scaled(value: u32, max: u32, width: usize) -> usize {
    if max == 0 {
        return 0;
    }
    let filled = u64::from(value.min(max)) * width as u64 / u64::from(max);
    usize::try_from(filled).unwrap_or(width).min(width)
}
