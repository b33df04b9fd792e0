use chrono::{NaiveDate, NaiveDateTime};
use questmaster_core::service::completion::{
    add_habit, add_task, complete_habit, complete_task, delete_habit, delete_task,
    set_project_steps, toggle_task_status,
};
use questmaster_core::{
    CanonicalState, Habit, LogKind, Mutation, NewHabit, NewTask, PlayerProfile, Rejection, Task,
    TaskKind, TaskStatus, ValidationError,
};
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(day: NaiveDate, hour: u32) -> NaiveDateTime {
    day.and_hms_opt(hour, 0, 0).unwrap()
}

fn project(steps: &[&str], current_step: usize) -> Task {
    let mut task = Task::project(
        "ship release",
        steps.iter().map(|step| step.to_string()),
        at(date(2026, 10, 1), 9),
    )
    .unwrap();
    if let TaskKind::Project {
        current_step: cursor,
        ..
    } = &mut task.kind
    {
        *cursor = current_step;
    }
    task
}

fn state_with_task(task: Task) -> CanonicalState {
    CanonicalState {
        tasks: vec![task],
        ..CanonicalState::default()
    }
}

#[test]
fn complete_habit_appends_date_log_and_reward() {
    let habit = Habit::new("stretch").unwrap();
    let habit_id = habit.id;
    let state = CanonicalState {
        habits: vec![habit],
        ..CanonicalState::default()
    };
    let today = date(2026, 10, 19);

    let transition = complete_habit(&state, habit_id, today, at(today, 8)).unwrap();

    assert_eq!(transition.outcome.exp_gained, 15);
    assert!(!transition.outcome.leveled_up);
    assert_eq!(transition.next.profile, PlayerProfile { level: 1, exp: 15 });
    assert!(transition.next.habit(habit_id).unwrap().is_completed_on(today));
    assert_eq!(transition.next.logs.len(), 1);
    assert_eq!(transition.next.logs[0].kind, LogKind::Habit);
    assert_eq!(transition.next.logs[0].title, "stretch");
    assert!(matches!(
        transition.mutation,
        Mutation::HabitCompleted { date, .. } if date == today
    ));
    // Input state is untouched.
    assert!(state.logs.is_empty());
}

#[test]
fn complete_habit_ignores_recurrence() {
    // Weekdays only; 2026-10-18 is a Sunday.
    let habit = Habit::with_recurrence("commute by bike", [1, 2, 3, 4, 5]).unwrap();
    let habit_id = habit.id;
    let state = CanonicalState {
        habits: vec![habit],
        ..CanonicalState::default()
    };
    let sunday = date(2026, 10, 18);

    let transition = complete_habit(&state, habit_id, sunday, at(sunday, 10)).unwrap();
    assert_eq!(transition.outcome.exp_gained, 15);
}

#[test]
fn second_completion_on_same_date_is_rejected() {
    let habit = Habit::new("water").unwrap();
    let habit_id = habit.id;
    let state = CanonicalState {
        habits: vec![habit],
        ..CanonicalState::default()
    };
    let today = date(2026, 10, 19);

    let first = complete_habit(&state, habit_id, today, at(today, 8)).unwrap();
    let err = complete_habit(&first.next, habit_id, today, at(today, 9)).unwrap_err();

    assert_eq!(
        err,
        Rejection::AlreadyCompletedToday {
            habit_id,
            date: today
        }
    );
    assert_eq!(first.next.habit(habit_id).unwrap().completed_dates.len(), 1);

    let tomorrow = today.succ_opt().unwrap();
    let next_day = complete_habit(&first.next, habit_id, tomorrow, at(tomorrow, 8)).unwrap();
    assert_eq!(next_day.next.profile.exp, 30);
}

#[test]
fn complete_habit_with_unknown_id_is_rejected() {
    let missing = Uuid::new_v4();
    let today = date(2026, 10, 19);
    let err = complete_habit(&CanonicalState::default(), missing, today, at(today, 8)).unwrap_err();
    assert_eq!(err, Rejection::HabitNotFound(missing));
}

#[test]
fn habit_reward_can_level_up() {
    let habit = Habit::new("read").unwrap();
    let habit_id = habit.id;
    let state = CanonicalState {
        profile: PlayerProfile { level: 1, exp: 95 },
        habits: vec![habit],
        ..CanonicalState::default()
    };
    let today = date(2026, 10, 19);

    let transition = complete_habit(&state, habit_id, today, at(today, 8)).unwrap();
    assert!(transition.outcome.leveled_up);
    assert_eq!(transition.outcome.new_level, Some(2));
    assert_eq!(transition.next.profile, PlayerProfile { level: 2, exp: 10 });
}

#[test]
fn simple_task_completion_removes_task_and_logs_task_reward() {
    let task = Task::simple("post photo", at(date(2026, 10, 1), 9)).unwrap();
    let task_id = task.id;
    let state = state_with_task(task);

    let transition = complete_task(&state, task_id, at(date(2026, 10, 19), 12)).unwrap();

    assert!(transition.outcome.is_full_complete);
    assert_eq!(transition.outcome.exp_gained, 25);
    assert!(transition.next.task(task_id).is_none());
    assert_eq!(transition.next.logs[0].kind, LogKind::Task);
    assert_eq!(transition.next.profile.exp, 25);
}

#[test]
fn project_step_advances_cursor_and_keeps_project() {
    let task = project(&["A", "B"], 0);
    let task_id = task.id;
    let state = state_with_task(task);

    let transition = complete_task(&state, task_id, at(date(2026, 10, 19), 12)).unwrap();

    assert!(!transition.outcome.is_full_complete);
    assert_eq!(transition.outcome.exp_gained, 10);
    let advanced = transition.next.task(task_id).unwrap();
    assert_eq!(advanced.status, TaskStatus::Paused);
    assert!(matches!(
        advanced.kind,
        TaskKind::Project { current_step: 1, .. }
    ));
    let entry = &transition.next.logs[0];
    assert_eq!(entry.kind, LogKind::ProjectStep);
    assert!(entry.title.contains('A'), "title was {}", entry.title);
}

#[test]
fn project_last_step_removes_project_with_done_reward() {
    let task = project(&["A", "B"], 1);
    let task_id = task.id;
    let state = state_with_task(task);

    let transition = complete_task(&state, task_id, at(date(2026, 10, 19), 12)).unwrap();

    assert!(transition.outcome.is_full_complete);
    assert_eq!(transition.outcome.exp_gained, 40);
    assert!(transition.next.task(task_id).is_none());
    assert_eq!(transition.next.logs[0].kind, LogKind::ProjectDone);
    assert_eq!(transition.next.logs[0].title, "ship release");
}

#[test]
fn single_step_project_completes_on_first_call() {
    let task = project(&["only"], 0);
    let task_id = task.id;
    let state = state_with_task(task);

    let transition = complete_task(&state, task_id, at(date(2026, 10, 19), 12)).unwrap();

    assert!(transition.outcome.is_full_complete);
    assert_eq!(transition.outcome.exp_gained, 40);
    assert!(transition.next.tasks.is_empty());
}

#[test]
fn toggle_flips_status_and_keeps_cursor() {
    let task = project(&["A", "B", "C"], 2);
    let task_id = task.id;
    let state = state_with_task(task);

    let first = toggle_task_status(&state, task_id).unwrap();
    assert_eq!(first.outcome, TaskStatus::Active);
    let second = toggle_task_status(&first.next, task_id).unwrap();
    assert_eq!(second.outcome, TaskStatus::Paused);

    let task = second.next.task(task_id).unwrap();
    assert!(matches!(task.kind, TaskKind::Project { current_step: 2, .. }));
    assert!(second.next.logs.is_empty());
    assert_eq!(second.next.profile, PlayerProfile::default());
}

#[test]
fn add_operations_apply_defaults() {
    let state = CanonicalState::default();

    let habit = add_habit(
        &state,
        &NewHabit {
            title: "  meditate ".to_string(),
            recurrence_days: Vec::new(),
        },
    )
    .unwrap();
    let created = habit.next.habit(habit.outcome).unwrap();
    assert_eq!(created.title, "meditate");
    assert_eq!(created.recurrence_days.len(), 7);

    let task = add_task(&habit.next, &NewTask::simple("file taxes"), at(date(2026, 10, 19), 9))
        .unwrap();
    let created = task.next.task(task.outcome).unwrap();
    assert_eq!(created.status, TaskStatus::Paused);
    assert_eq!(created.kind, TaskKind::Simple);
}

#[test]
fn add_rejects_invalid_input() {
    let state = CanonicalState::default();
    let now = at(date(2026, 10, 19), 9);

    let blank = add_task(&state, &NewTask::simple("   "), now).unwrap_err();
    assert_eq!(blank, Rejection::InvalidRecord(ValidationError::BlankTitle));

    let no_steps = add_task(&state, &NewTask::project("plan", vec![" ".to_string()]), now)
        .unwrap_err();
    assert_eq!(no_steps, Rejection::InvalidRecord(ValidationError::EmptySteps));

    let bad_day = add_habit(
        &state,
        &NewHabit {
            title: "swim".to_string(),
            recurrence_days: vec![7],
        },
    )
    .unwrap_err();
    assert_eq!(
        bad_day,
        Rejection::InvalidRecord(ValidationError::WeekdayOutOfRange(7))
    );
}

#[test]
fn delete_removes_records_and_rejects_unknown_ids() {
    let habit = Habit::new("walk").unwrap();
    let task = Task::simple("call bank", at(date(2026, 10, 1), 9)).unwrap();
    let (habit_id, task_id) = (habit.id, task.id);
    let state = CanonicalState {
        habits: vec![habit],
        tasks: vec![task],
        ..CanonicalState::default()
    };

    let without_habit = delete_habit(&state, habit_id).unwrap().next;
    assert!(without_habit.habits.is_empty());
    let without_task = delete_task(&without_habit, task_id).unwrap().next;
    assert!(without_task.tasks.is_empty());

    assert_eq!(
        delete_task(&without_task, task_id).unwrap_err(),
        Rejection::TaskNotFound(task_id)
    );
}

#[test]
fn set_project_steps_rewinds_and_rejects_simple_tasks() {
    let task = project(&["A", "B"], 1);
    let task_id = task.id;
    let simple = Task::simple("errand", at(date(2026, 10, 1), 9)).unwrap();
    let simple_id = simple.id;
    let state = CanonicalState {
        tasks: vec![task, simple],
        ..CanonicalState::default()
    };

    let transition = set_project_steps(
        &state,
        task_id,
        vec!["collect".to_string(), " login ".to_string(), "issue".to_string()],
    )
    .unwrap();
    assert_eq!(
        transition.next.task(task_id).unwrap().kind,
        TaskKind::Project {
            steps: vec![
                "collect".to_string(),
                "login".to_string(),
                "issue".to_string()
            ],
            current_step: 0,
        }
    );

    assert_eq!(
        set_project_steps(&state, simple_id, vec!["x".to_string()]).unwrap_err(),
        Rejection::NotAProject(simple_id)
    );
    assert_eq!(
        set_project_steps(&state, task_id, Vec::new()).unwrap_err(),
        Rejection::InvalidRecord(ValidationError::EmptySteps)
    );
}

#[test]
fn logs_stay_newest_first() {
    let habit = Habit::new("journal").unwrap();
    let habit_id = habit.id;
    let task = Task::simple("laundry", at(date(2026, 10, 1), 9)).unwrap();
    let task_id = task.id;
    let state = CanonicalState {
        habits: vec![habit],
        tasks: vec![task],
        ..CanonicalState::default()
    };
    let today = date(2026, 10, 19);

    let first = complete_habit(&state, habit_id, today, at(today, 7)).unwrap();
    let second = complete_task(&first.next, task_id, at(today, 20)).unwrap();

    let kinds: Vec<LogKind> = second.next.logs.iter().map(|entry| entry.kind).collect();
    assert_eq!(kinds, vec![LogKind::Task, LogKind::Habit]);
    assert_eq!(second.next.profile.exp, 40);
}
