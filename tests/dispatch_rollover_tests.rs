use std::sync::Arc;

use chrono::NaiveDate;

use daybook::application::services::{
    DispatchError, DispatchOrchestrator, RecurrenceInput, TaskService, TimezoneService,
};
use daybook::domain::repositories::DispatchRepository;
use daybook::infrastructure::database::DatabaseManager;
use daybook::infrastructure::repositories::{
    SqliteDispatchRepository, SqliteTaskRepository, SqliteUserPreferencesRepository,
};

struct Harness {
    orchestrator: DispatchOrchestrator,
    task_service: TaskService,
    dispatch_repo: Arc<SqliteDispatchRepository>,
}

async fn harness() -> Harness {
    daybook::utils::logger::setup_logging();
    let db = DatabaseManager::open_in_memory().expect("open in-memory db");
    db.initialize_database().await.expect("initialize schema");

    let task_repo = Arc::new(SqliteTaskRepository::new(db.clone()));
    let dispatch_repo = Arc::new(SqliteDispatchRepository::new(db.clone()));
    let prefs_repo = Arc::new(SqliteUserPreferencesRepository::new(db.clone()));
    let timezone_service = Arc::new(TimezoneService::new(prefs_repo));

    Harness {
        orchestrator: DispatchOrchestrator::new(dispatch_repo.clone(), task_repo.clone()),
        task_service: TaskService::new(task_repo, timezone_service),
        dispatch_repo,
    }
}

fn day(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
}

async fn add_task(h: &Harness, user_id: i64, title: &str) -> i64 {
    h.task_service
        .create_task(user_id, title.to_string(), None, None, RecurrenceInput::default())
        .await
        .expect("create task")
}

#[tokio::test]
async fn rollover_moves_unfinished_tasks_one_day_forward() {
    let h = harness().await;
    let dispatch = h.orchestrator.get_or_create(1, day("2026-02-21")).await.unwrap();

    let done = add_task(&h, 1, "ship report").await;
    let open_a = add_task(&h, 1, "write retro").await;
    let open_b = add_task(&h, 1, "plan sprint").await;
    for id in [done, open_a, open_b] {
        h.orchestrator.link_task(dispatch.id, id).await.unwrap();
    }
    h.task_service.complete_task(done).await.unwrap();

    let completion = h.orchestrator.complete(dispatch.id).await.unwrap();
    assert!(completion.dispatch.finalized);
    assert_eq!(completion.rolled_over, 2);

    let next_id = completion.next_dispatch_id.expect("next dispatch created");
    let next = h.dispatch_repo.get(next_id).await.unwrap().unwrap();
    assert_eq!(next.date, day("2026-02-22"));
    assert!(!next.finalized);

    let mut linked = h.dispatch_repo.linked_task_ids(next_id).await.unwrap();
    linked.sort_unstable();
    let mut expected = vec![open_a, open_b];
    expected.sort_unstable();
    assert_eq!(linked, expected);
}

#[tokio::test]
async fn second_completion_fails_without_side_effects() {
    let h = harness().await;
    let dispatch = h.orchestrator.get_or_create(1, day("2026-02-21")).await.unwrap();
    let task = add_task(&h, 1, "write retro").await;
    h.orchestrator.link_task(dispatch.id, task).await.unwrap();

    let first = h.orchestrator.complete(dispatch.id).await.unwrap();
    let next_id = first.next_dispatch_id.unwrap();

    let err = h.orchestrator.complete(dispatch.id).await.unwrap_err();
    assert!(matches!(err, DispatchError::AlreadyFinalized));

    // The next-day dispatch is untouched by the failed retry.
    let linked = h.dispatch_repo.linked_task_ids(next_id).await.unwrap();
    assert_eq!(linked, vec![task]);
}

#[tokio::test]
async fn completing_a_finished_day_creates_no_next_dispatch() {
    let h = harness().await;
    let dispatch = h.orchestrator.get_or_create(1, day("2026-02-21")).await.unwrap();
    let task = add_task(&h, 1, "ship report").await;
    h.orchestrator.link_task(dispatch.id, task).await.unwrap();
    h.task_service.complete_task(task).await.unwrap();

    let completion = h.orchestrator.complete(dispatch.id).await.unwrap();
    assert_eq!(completion.rolled_over, 0);
    assert_eq!(completion.next_dispatch_id, None);

    let next = h
        .dispatch_repo
        .find_by_user_date(1, day("2026-02-22"))
        .await
        .unwrap();
    assert!(next.is_none(), "no empty next-day dispatch should exist");
}

#[tokio::test]
async fn get_or_create_is_idempotent() {
    let h = harness().await;
    let first = h.orchestrator.get_or_create(7, day("2026-03-01")).await.unwrap();
    let second = h.orchestrator.get_or_create(7, day("2026-03-01")).await.unwrap();
    assert_eq!(first.id, second.id);

    // A different user on the same date gets a distinct dispatch.
    let other = h.orchestrator.get_or_create(8, day("2026-03-01")).await.unwrap();
    assert_ne!(first.id, other.id);
}

#[tokio::test]
async fn linking_is_idempotent_and_unlinking_tolerates_absence() {
    let h = harness().await;
    let dispatch = h.orchestrator.get_or_create(1, day("2026-02-21")).await.unwrap();
    let task = add_task(&h, 1, "write retro").await;

    h.orchestrator.link_task(dispatch.id, task).await.unwrap();
    h.orchestrator.link_task(dispatch.id, task).await.unwrap();
    let linked = h.dispatch_repo.linked_task_ids(dispatch.id).await.unwrap();
    assert_eq!(linked, vec![task]);

    h.orchestrator.unlink_task(dispatch.id, task).await.unwrap();
    h.orchestrator.unlink_task(dispatch.id, task).await.unwrap();
    let linked = h.dispatch_repo.linked_task_ids(dispatch.id).await.unwrap();
    assert!(linked.is_empty());
}

#[tokio::test]
async fn finalized_dispatch_rejects_every_edit() {
    let h = harness().await;
    let dispatch = h.orchestrator.get_or_create(1, day("2026-02-21")).await.unwrap();
    let task = add_task(&h, 1, "write retro").await;
    h.orchestrator.complete(dispatch.id).await.unwrap();

    let err = h.orchestrator.update_summary(dispatch.id, "late edit").await.unwrap_err();
    assert!(matches!(err, DispatchError::AlreadyFinalized));

    let err = h.orchestrator.link_task(dispatch.id, task).await.unwrap_err();
    assert!(matches!(err, DispatchError::AlreadyFinalized));

    let err = h.orchestrator.unlink_task(dispatch.id, task).await.unwrap_err();
    assert!(matches!(err, DispatchError::AlreadyFinalized));
}

#[tokio::test]
async fn storage_writes_refuse_finalized_dispatches() {
    let h = harness().await;
    let dispatch = h.orchestrator.get_or_create(1, day("2026-02-21")).await.unwrap();
    let task = add_task(&h, 1, "write retro").await;
    h.orchestrator.link_task(dispatch.id, task).await.unwrap();
    h.task_service.complete_task(task).await.unwrap();
    h.orchestrator.complete(dispatch.id).await.unwrap();

    // The guard lives in the write itself, so even a caller that read the
    // dispatch as open before a completion landed cannot mutate the row.
    assert!(!h.dispatch_repo.update_summary(dispatch.id, "rewritten").await.unwrap());
    assert!(!h.dispatch_repo.link_task(dispatch.id, task).await.unwrap());
    assert!(!h.dispatch_repo.unlink_task(dispatch.id, task).await.unwrap());

    let reloaded = h.dispatch_repo.get(dispatch.id).await.unwrap().unwrap();
    assert_eq!(reloaded.summary, "");
    assert_eq!(h.dispatch_repo.linked_task_ids(dispatch.id).await.unwrap(), vec![task]);
}

#[tokio::test]
async fn linking_checks_task_preconditions() {
    let h = harness().await;
    let dispatch = h.orchestrator.get_or_create(1, day("2026-02-21")).await.unwrap();

    let err = h.orchestrator.link_task(dispatch.id, 9999).await.unwrap_err();
    assert!(matches!(err, DispatchError::TaskNotFound));

    let foreign = add_task(&h, 2, "someone else's task").await;
    let err = h.orchestrator.link_task(dispatch.id, foreign).await.unwrap_err();
    assert!(matches!(err, DispatchError::TaskNotOwned));

    let deleted = add_task(&h, 1, "abandoned").await;
    h.task_service.delete_task(deleted).await.unwrap();
    let err = h.orchestrator.link_task(dispatch.id, deleted).await.unwrap_err();
    assert!(matches!(err, DispatchError::TaskNotFound));
}

#[tokio::test]
async fn rollover_reuses_an_existing_next_day_dispatch() {
    let h = harness().await;
    let dispatch = h.orchestrator.get_or_create(1, day("2026-02-21")).await.unwrap();
    let existing_next = h.orchestrator.get_or_create(1, day("2026-02-22")).await.unwrap();

    let open_a = add_task(&h, 1, "write retro").await;
    let open_b = add_task(&h, 1, "plan sprint").await;
    h.orchestrator.link_task(dispatch.id, open_a).await.unwrap();
    h.orchestrator.link_task(dispatch.id, open_b).await.unwrap();
    // One task is already on tomorrow's plan; rollover must not duplicate it.
    h.orchestrator.link_task(existing_next.id, open_a).await.unwrap();

    let completion = h.orchestrator.complete(dispatch.id).await.unwrap();
    assert_eq!(completion.next_dispatch_id, Some(existing_next.id));
    assert_eq!(completion.rolled_over, 2);

    let mut linked = h.dispatch_repo.linked_task_ids(existing_next.id).await.unwrap();
    linked.sort_unstable();
    let mut expected = vec![open_a, open_b];
    expected.sort_unstable();
    assert_eq!(linked, expected);
}

#[tokio::test]
async fn deleted_tasks_do_not_roll_over() {
    let h = harness().await;
    let dispatch = h.orchestrator.get_or_create(1, day("2026-02-21")).await.unwrap();
    let kept = add_task(&h, 1, "write retro").await;
    let dropped = add_task(&h, 1, "cancelled work").await;
    h.orchestrator.link_task(dispatch.id, kept).await.unwrap();
    h.orchestrator.link_task(dispatch.id, dropped).await.unwrap();
    h.task_service.delete_task(dropped).await.unwrap();

    let completion = h.orchestrator.complete(dispatch.id).await.unwrap();
    assert_eq!(completion.rolled_over, 1);
    let linked = h
        .dispatch_repo
        .linked_task_ids(completion.next_dispatch_id.unwrap())
        .await
        .unwrap();
    assert_eq!(linked, vec![kept]);
}

#[tokio::test]
async fn summary_edits_apply_while_open() {
    let h = harness().await;
    let dispatch = h.orchestrator.get_or_create(1, day("2026-02-21")).await.unwrap();

    let updated = h
        .orchestrator
        .update_summary(dispatch.id, "focus: release prep")
        .await
        .unwrap();
    assert_eq!(updated.summary, "focus: release prep");

    let reloaded = h.dispatch_repo.get(dispatch.id).await.unwrap().unwrap();
    assert_eq!(reloaded.summary, "focus: release prep");
}
