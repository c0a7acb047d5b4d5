use std::sync::Arc;

use chrono::NaiveDate;
use rusqlite::params;

use daybook::application::services::{RecurrenceInput, TaskError, TaskService, TimezoneService};
use daybook::domain::repositories::TaskRepository;
use daybook::domain::value_objects::recurrence::{
    RecurrenceBehavior, RecurrenceRule, RecurrenceType, RecurrenceUnit, StoredRule,
};
use daybook::infrastructure::database::DatabaseManager;
use daybook::infrastructure::repositories::{SqliteTaskRepository, SqliteUserPreferencesRepository};

struct Harness {
    db: DatabaseManager,
    task_repo: Arc<SqliteTaskRepository>,
    task_service: TaskService,
}

async fn harness() -> Harness {
    daybook::utils::logger::setup_logging();
    let db = DatabaseManager::open_in_memory().expect("open in-memory db");
    db.initialize_database().await.expect("initialize schema");

    let task_repo = Arc::new(SqliteTaskRepository::new(db.clone()));
    let prefs_repo = Arc::new(SqliteUserPreferencesRepository::new(db.clone()));
    let timezone_service = Arc::new(TimezoneService::new(prefs_repo));

    Harness {
        db,
        task_repo: task_repo.clone(),
        task_service: TaskService::new(task_repo, timezone_service),
    }
}

fn day(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
}

fn custom(interval: u32, unit: RecurrenceUnit) -> RecurrenceInput {
    RecurrenceInput {
        recurrence_type: RecurrenceType::Custom,
        recurrence_behavior: None,
        recurrence_rule: Some(RecurrenceRule::new(interval, unit).into()),
    }
}

fn assert_validation(err: TaskError, expected: &str) {
    match err {
        TaskError::Validation(msg) => assert_eq!(msg, expected),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn custom_type_without_rule_is_rejected() {
    let h = harness().await;
    let err = h
        .task_service
        .create_task(
            1,
            "water plants".to_string(),
            None,
            None,
            RecurrenceInput {
                recurrence_type: RecurrenceType::Custom,
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_validation(err, "recurrence_rule is required when recurrence_type is custom");
}

#[tokio::test]
async fn rule_on_builtin_type_is_rejected() {
    let h = harness().await;
    let err = h
        .task_service
        .create_task(
            1,
            "water plants".to_string(),
            None,
            None,
            RecurrenceInput {
                recurrence_type: RecurrenceType::Daily,
                recurrence_behavior: None,
                recurrence_rule: Some(RecurrenceRule::new(1, RecurrenceUnit::Day).into()),
            },
        )
        .await
        .unwrap_err();
    assert_validation(err, "recurrence_rule can only be set when recurrence_type is custom");
}

#[tokio::test]
async fn duplicate_on_schedule_without_due_date_is_rejected() {
    let h = harness().await;
    let mut input = custom(2, RecurrenceUnit::Week);
    input.recurrence_behavior = Some(RecurrenceBehavior::DuplicateOnSchedule);

    let err = h
        .task_service
        .create_task(1, "water plants".to_string(), None, None, input.clone())
        .await
        .unwrap_err();
    assert_validation(
        err,
        "due_date is required when recurrence_behavior is duplicate_on_schedule",
    );

    // With an anchor the same input is accepted.
    let id = h
        .task_service
        .create_task(1, "water plants".to_string(), None, Some(day("2026-03-01")), input)
        .await
        .unwrap();
    assert!(id > 0);
}

#[tokio::test]
async fn malformed_custom_rule_is_rejected_loudly_on_write() {
    let h = harness().await;
    let err = h
        .task_service
        .create_task(
            1,
            "water plants".to_string(),
            None,
            None,
            RecurrenceInput {
                recurrence_type: RecurrenceType::Custom,
                recurrence_behavior: None,
                recurrence_rule: Some(StoredRule::Encoded("{not json".to_string())),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::Validation(_)));
}

#[tokio::test]
async fn completing_a_monthly_task_clamps_and_stays_open() {
    let h = harness().await;
    let id = h
        .task_service
        .create_task(
            1,
            "pay rent".to_string(),
            None,
            Some(day("2026-01-31")),
            RecurrenceInput {
                recurrence_type: RecurrenceType::Monthly,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let task = h.task_service.complete_task(id).await.unwrap();
    // 2026 is not a leap year: Jan 31 clamps to Feb 28.
    assert_eq!(task.due_date, Some(day("2026-02-28")));
    assert!(!task.completed, "after_completion recurrence keeps the task open");
}

#[tokio::test]
async fn completing_a_custom_task_steps_by_its_rule() {
    let h = harness().await;
    let id = h
        .task_service
        .create_task(
            1,
            "biweekly review".to_string(),
            None,
            Some(day("2024-03-15")),
            custom(2, RecurrenceUnit::Week),
        )
        .await
        .unwrap();

    let task = h.task_service.complete_task(id).await.unwrap();
    assert_eq!(task.due_date, Some(day("2024-03-29")));
    assert!(!task.completed);
}

#[tokio::test]
async fn completing_a_plain_task_closes_it() {
    let h = harness().await;
    let id = h
        .task_service
        .create_task(1, "one-off errand".to_string(), None, None, RecurrenceInput::default())
        .await
        .unwrap();

    let task = h.task_service.complete_task(id).await.unwrap();
    assert!(task.completed);
    assert_eq!(task.due_date, None);
}

#[tokio::test]
async fn preview_respects_the_target_date() {
    let h = harness().await;
    let id = h
        .task_service
        .create_task(
            1,
            "standup notes".to_string(),
            None,
            Some(day("2024-01-01")),
            custom(10, RecurrenceUnit::Day),
        )
        .await
        .unwrap();

    let next = h
        .task_service
        .preview_next_occurrence(id, Some(day("2024-01-25")))
        .await
        .unwrap();
    assert_eq!(next, Some(day("2024-01-31")));

    // Anchor already past the target comes back unchanged.
    let next = h
        .task_service
        .preview_next_occurrence(id, Some(day("2023-12-01")))
        .await
        .unwrap();
    assert_eq!(next, Some(day("2024-01-01")));
}

#[tokio::test]
async fn corrupt_stored_rule_degrades_to_no_recurrence_on_read() {
    let h = harness().await;
    let id = h
        .task_service
        .create_task(
            1,
            "legacy task".to_string(),
            None,
            Some(day("2026-01-10")),
            custom(3, RecurrenceUnit::Day),
        )
        .await
        .unwrap();

    // Simulate a half-written row from an older client.
    h.db.execute_blocking(move |conn| {
        conn.execute(
            "UPDATE tasks SET recurrence_rule = ?2 WHERE id = ?1",
            params![id, "{definitely broken"],
        )
    })
    .await
    .unwrap();

    let task = h.task_repo.get(id).await.unwrap().unwrap();
    assert_eq!(task.recurrence_type, RecurrenceType::Custom);
    assert_eq!(task.recurrence_rule, None, "broken rule reads as absent");
    assert_eq!(task.describe_recurrence(), "No recurrence");

    // Completing it behaves like a non-recurring task instead of erroring.
    let task = h.task_service.complete_task(id).await.unwrap();
    assert!(task.completed);
}

#[tokio::test]
async fn listing_skips_soft_deleted_tasks() {
    let h = harness().await;
    let kept = h
        .task_service
        .create_task(1, "kept".to_string(), None, None, RecurrenceInput::default())
        .await
        .unwrap();
    let dropped = h
        .task_service
        .create_task(1, "dropped".to_string(), None, None, RecurrenceInput::default())
        .await
        .unwrap();
    h.task_service.delete_task(dropped).await.unwrap();

    let tasks = h.task_service.list_tasks(1).await.unwrap();
    assert_eq!(tasks.iter().map(|t| t.id).collect::<Vec<_>>(), vec![kept]);

    assert_eq!(
        h.task_service.describe_recurrence(kept).await.unwrap(),
        "No recurrence"
    );
    let err = h.task_service.describe_recurrence(dropped).await.unwrap_err();
    assert!(matches!(err, TaskError::NotFound));
}

#[tokio::test]
async fn update_recurrence_validates_against_current_due_date() {
    let h = harness().await;
    let id = h
        .task_service
        .create_task(1, "water plants".to_string(), None, None, RecurrenceInput::default())
        .await
        .unwrap();

    let mut input = custom(1, RecurrenceUnit::Week);
    input.recurrence_behavior = Some(RecurrenceBehavior::DuplicateOnSchedule);
    let err = h.task_service.update_recurrence(id, input).await.unwrap_err();
    assert_validation(
        err,
        "due_date is required when recurrence_behavior is duplicate_on_schedule",
    );

    h.task_service.set_due_date(id, Some(day("2026-04-01"))).await.unwrap();
    let mut input = custom(1, RecurrenceUnit::Week);
    input.recurrence_behavior = Some(RecurrenceBehavior::DuplicateOnSchedule);
    let task = h.task_service.update_recurrence(id, input).await.unwrap();
    assert_eq!(task.recurrence_behavior, RecurrenceBehavior::DuplicateOnSchedule);
}
