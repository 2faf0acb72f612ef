//! Repository behaviour against a real `PostgreSQL` database.

use super::helpers::{BoxError, PgEngine};
use permitdesk::task::{
    domain::{ApprovalStatus, ExecutionStatus, TaskListQuery, UserId},
    ports::TaskRepository,
    services::{ErrorKind, TaskLifecycleError, UpdateTaskRequest},
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_persists_task_and_slots() -> Result<(), BoxError> {
    let Some(engine) = PgEngine::from_env()? else {
        return Ok(());
    };

    let created = engine
        .service
        .create(
            engine.tenant,
            engine.requester,
            engine.request("Pour foundation").with_description("Slab B"),
        )
        .await?;

    let fetched = engine.service.get(engine.tenant, created.id()).await?;
    assert_eq!(fetched.code().as_str(), "ENG-TASK-0001");
    assert_eq!(fetched.title().as_str(), "Pour foundation");
    assert_eq!(fetched.description(), Some("Slab B"));
    assert_eq!(fetched.status(), ExecutionStatus::ToDo);
    assert_eq!(fetched.approval_status(), ApprovalStatus::Waiting);
    assert_eq!(fetched.approvals(), created.approvals());

    let by_code = engine
        .service
        .get_by_code(engine.tenant, "ENG-TASK-0001")
        .await?;
    assert_eq!(by_code.id(), created.id());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn sequence_counter_skips_deleted_codes() -> Result<(), BoxError> {
    let Some(engine) = PgEngine::from_env()? else {
        return Ok(());
    };

    let first = engine
        .service
        .create(engine.tenant, engine.requester, engine.request("One"))
        .await?;
    engine.service.delete(engine.tenant, first.id()).await?;
    let second = engine
        .service
        .create(engine.tenant, engine.requester, engine.request("Two"))
        .await?;

    assert_eq!(second.code().as_str(), "ENG-TASK-0002");
    assert!(
        engine
            .repository
            .find_by_id(engine.tenant, first.id())
            .await?
            .is_none()
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn patch_updates_only_named_columns() -> Result<(), BoxError> {
    let Some(engine) = PgEngine::from_env()? else {
        return Ok(());
    };
    let assignee = UserId::new(55)?;
    let created = engine
        .service
        .create(
            engine.tenant,
            engine.requester,
            engine.request("Frame walls").with_assignee(assignee),
        )
        .await?;

    let updated = engine
        .service
        .update(
            engine.tenant,
            engine.requester,
            created.id(),
            UpdateTaskRequest::new().with_description("Use steel studs"),
        )
        .await?;

    assert_eq!(updated.description(), Some("Use steel studs"));
    assert_eq!(updated.assigned_to(), Some(assignee));
    assert_eq!(updated.priority(), created.priority());
    assert_eq!(updated.title().as_str(), "Frame walls");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn listing_searches_and_counts() -> Result<(), BoxError> {
    let Some(engine) = PgEngine::from_env()? else {
        return Ok(());
    };
    for title in ["Roof 100% done", "Roof gutters", "Basement"] {
        engine
            .service
            .create(engine.tenant, engine.requester, engine.request(title))
            .await?;
    }

    let roofs = engine
        .service
        .list_requests(engine.tenant, TaskListQuery::new().with_search("roof"))
        .await?;
    let literal = engine
        .service
        .list_requests(engine.tenant, TaskListQuery::new().with_search("100%"))
        .await?;
    let board = engine
        .service
        .list_tasks(engine.tenant, TaskListQuery::new())
        .await?;

    assert_eq!(roofs.total, 2);
    assert_eq!(literal.total, 1);
    assert_eq!(board.total, 0);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn soft_deleted_rows_reject_writes() -> Result<(), BoxError> {
    let Some(engine) = PgEngine::from_env()? else {
        return Ok(());
    };
    let created = engine
        .service
        .create(engine.tenant, engine.requester, engine.request("Gone"))
        .await?;
    engine.service.delete(engine.tenant, created.id()).await?;

    let result = engine
        .service
        .set_reason(engine.tenant, engine.requester, created.id(), "late")
        .await;

    assert!(matches!(result, Err(TaskLifecycleError::TaskNotFound(_))));
    let again = engine.service.delete(engine.tenant, created.id()).await;
    assert_eq!(
        again.err().map(|err| err.kind()),
        Some(ErrorKind::NotFound)
    );
    Ok(())
}
