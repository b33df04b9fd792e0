use chrono::{NaiveDate, NaiveDateTime};
use questmaster_core::db::open_db_in_memory;
use questmaster_core::service::completion::{
    add_habit, add_task, complete_habit, complete_task, delete_habit, delete_task,
    set_project_steps, toggle_task_status,
};
use questmaster_core::{
    CanonicalState, Habit, LogEntry, LogKind, MemoryStateStore, Mutation, NewHabit, NewTask,
    PlayerProfile, RepoError, SqliteStateStore, StateStore, Task, TaskStatus, Transition,
};
use uuid::Uuid;

const USER: &str = "user-1";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(day: NaiveDate, hour: u32, minute: u32) -> NaiveDateTime {
    day.and_hms_opt(hour, minute, 0).unwrap()
}

/// Commits a transition to the store and returns the next state.
fn commit<R>(store: &impl StateStore, transition: Transition<R>) -> (CanonicalState, R) {
    store.commit(USER, &transition.mutation).unwrap();
    (transition.next, transition.outcome)
}

fn initialize(store: &impl StateStore) -> CanonicalState {
    let state = CanonicalState::default();
    store
        .commit(USER, &Mutation::Initialize(Box::new(state.clone())))
        .unwrap();
    state
}

/// Runs every mutation kind and checks the store mirrors the in-memory state.
fn assert_replays_every_mutation(store: &impl StateStore) {
    let today = date(2026, 10, 19);
    let state = initialize(store);
    assert_eq!(store.load(USER).unwrap(), state);

    let (state, habit_id) = commit(
        store,
        add_habit(
            &state,
            &NewHabit {
                title: "stretch".to_string(),
                recurrence_days: vec![1, 3, 5],
            },
        )
        .unwrap(),
    );
    let (state, other_habit) = commit(
        store,
        add_habit(
            &state,
            &NewHabit {
                title: "water plants".to_string(),
                recurrence_days: Vec::new(),
            },
        )
        .unwrap(),
    );
    let (state, simple_id) = commit(
        store,
        add_task(
            &state,
            &NewTask::simple("return library book").with_status(TaskStatus::Active),
            at(today, 8, 0),
        )
        .unwrap(),
    );
    let (state, project_id) = commit(
        store,
        add_task(
            &state,
            &NewTask::project(
                "launch blog",
                vec!["theme".to_string(), "post".to_string(), "share".to_string()],
            ),
            at(today, 8, 5),
        )
        .unwrap(),
    );
    assert_eq!(store.load(USER).unwrap(), state);

    let (state, _) = commit(
        store,
        complete_habit(&state, habit_id, today, at(today, 9, 15)).unwrap(),
    );
    let (state, _) = commit(
        store,
        complete_task(&state, project_id, at(today, 10, 30)).unwrap(),
    );
    let (state, status) = commit(store, toggle_task_status(&state, project_id).unwrap());
    assert_eq!(status, TaskStatus::Active);
    let (state, _) = commit(
        store,
        complete_task(&state, simple_id, at(today, 11, 0)).unwrap(),
    );
    let (state, _) = commit(
        store,
        set_project_steps(
            &state,
            project_id,
            vec!["draft".to_string(), "publish".to_string()],
        )
        .unwrap(),
    );
    let (state, _) = commit(store, delete_habit(&state, other_habit).unwrap());
    assert_eq!(store.load(USER).unwrap(), state);

    let (state, _) = commit(store, delete_task(&state, project_id).unwrap());
    let loaded = store.load(USER).unwrap();
    assert_eq!(loaded, state);
    assert_eq!(loaded.profile, PlayerProfile { level: 1, exp: 50 });
    let kinds: Vec<LogKind> = loaded.logs.iter().map(|entry| entry.kind).collect();
    assert_eq!(
        kinds,
        vec![LogKind::Task, LogKind::ProjectStep, LogKind::Habit]
    );
}

#[test]
fn sqlite_store_replays_every_mutation() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStateStore::new(&conn);
    assert_replays_every_mutation(&store);
}

#[test]
fn memory_store_replays_every_mutation() {
    let store = MemoryStateStore::new();
    assert_replays_every_mutation(&store);
    assert!(store.snapshot(USER).is_some());
}

#[test]
fn load_unknown_user_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStateStore::new(&conn);

    match store.load("nobody").unwrap_err() {
        RepoError::NotFound(user_id) => assert_eq!(user_id, "nobody"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(matches!(
        MemoryStateStore::new().load("nobody"),
        Err(RepoError::NotFound(_))
    ));
}

#[test]
fn initialize_replaces_existing_state_and_keeps_log_order() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStateStore::new(&conn);
    initialize(&store);

    let day = date(2026, 10, 18);
    let mut habit = Habit::new("meditate").unwrap();
    habit.completed_dates.insert(day);
    let task = Task::project(
        "paint fence",
        vec!["sand".to_string(), "prime".to_string()],
        at(day, 7, 0),
    )
    .unwrap();
    let seeded = CanonicalState {
        profile: PlayerProfile { level: 4, exp: 399 },
        habits: vec![habit],
        tasks: vec![task],
        logs: vec![
            LogEntry::new("newest", LogKind::Task, at(day, 20, 0)),
            LogEntry::new("oldest", LogKind::Habit, at(day, 6, 30)),
        ],
    };
    store
        .commit(USER, &Mutation::Initialize(Box::new(seeded.clone())))
        .unwrap();

    assert_eq!(store.load(USER).unwrap(), seeded);
}

#[test]
fn sub_second_timestamps_survive_storage() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStateStore::new(&conn);
    let state = initialize(&store);
    let habit = Habit::new("tea").unwrap();
    let habit_id = habit.id;
    let (state, _) = commit(&store, {
        let mut next = state.clone();
        let mutation = Mutation::HabitAdded(habit);
        next.apply(&mutation);
        Transition {
            next,
            mutation,
            outcome: (),
        }
    });

    let today = date(2026, 10, 19);
    let precise = today.and_hms_milli_opt(9, 15, 30, 125).unwrap();
    let (state, _) = commit(
        &store,
        complete_habit(&state, habit_id, today, precise).unwrap(),
    );

    let loaded = store.load(USER).unwrap();
    assert_eq!(loaded.logs[0].timestamp, precise);
    assert_eq!(loaded, state);
}

/// Commits a completion for an unknown habit and checks nothing was written.
fn assert_missing_habit_rejected(store: &impl StateStore) {
    initialize(store);

    let missing = Uuid::new_v4();
    let today = date(2026, 10, 19);
    let mutation = Mutation::HabitCompleted {
        habit_id: missing,
        date: today,
        log: LogEntry::new("ghost", LogKind::Habit, at(today, 9, 0)),
        profile: PlayerProfile { level: 1, exp: 15 },
    };

    match store.commit(USER, &mutation).unwrap_err() {
        RepoError::MissingRecord { table, id } => {
            assert_eq!(table, "habits");
            assert_eq!(id, missing);
        }
        other => panic!("unexpected error: {other}"),
    }
    let loaded = store.load(USER).unwrap();
    assert!(loaded.logs.is_empty());
    assert_eq!(loaded.profile, PlayerProfile::default());
}

#[test]
fn sqlite_store_rejects_completion_for_missing_habit() {
    let conn = open_db_in_memory().unwrap();
    assert_missing_habit_rejected(&SqliteStateStore::new(&conn));
}

#[test]
fn memory_store_rejects_completion_for_missing_habit() {
    assert_missing_habit_rejected(&MemoryStateStore::new());
}

#[test]
fn memory_store_rejects_step_changes_for_missing_project() {
    let store = MemoryStateStore::new();
    let state = initialize(&store);
    let simple = Task::simple("errand", at(date(2026, 10, 19), 8, 0)).unwrap();
    let simple_id = simple.id;
    let mut next = state.clone();
    let added = Mutation::TaskAdded(simple);
    next.apply(&added);
    store.commit(USER, &added).unwrap();

    let err = store
        .commit(
            USER,
            &Mutation::ProjectStepsReplaced {
                task_id: simple_id,
                steps: vec!["a".to_string()],
            },
        )
        .unwrap_err();
    assert!(matches!(err, RepoError::MissingRecord { table: "tasks", .. }));

    let err = store
        .commit(
            USER,
            &Mutation::TaskStatusChanged {
                task_id: Uuid::new_v4(),
                status: TaskStatus::Active,
            },
        )
        .unwrap_err();
    assert!(matches!(err, RepoError::MissingRecord { table: "tasks", .. }));
    assert_eq!(store.load(USER).unwrap(), next);
}

#[test]
fn status_change_for_missing_task_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStateStore::new(&conn);
    initialize(&store);

    let missing = Uuid::new_v4();
    let err = store
        .commit(
            USER,
            &Mutation::TaskStatusChanged {
                task_id: missing,
                status: TaskStatus::Active,
            },
        )
        .unwrap_err();
    assert!(matches!(err, RepoError::MissingRecord { table: "tasks", .. }));
}

#[test]
fn invalid_profile_is_rejected_before_writing() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStateStore::new(&conn);
    let broken = CanonicalState {
        profile: PlayerProfile { level: 1, exp: 100 },
        ..CanonicalState::default()
    };

    let err = store
        .commit(USER, &Mutation::Initialize(Box::new(broken)))
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert!(matches!(store.load(USER), Err(RepoError::NotFound(_))));
}

#[test]
fn users_are_isolated() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStateStore::new(&conn);
    initialize(&store);
    let other = CanonicalState {
        habits: vec![Habit::new("other user habit").unwrap()],
        ..CanonicalState::default()
    };
    store
        .commit("user-2", &Mutation::Initialize(Box::new(other.clone())))
        .unwrap();

    assert!(store.load(USER).unwrap().habits.is_empty());
    assert_eq!(store.load("user-2").unwrap(), other);
}
