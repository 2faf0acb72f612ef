//! Parallel creation and approval races against in-memory adapters.

use std::collections::HashSet;
use std::sync::Arc;

use super::helpers::{Engine, engine};
use permitdesk::task::{
    domain::{ApprovalStatus, TaskListQuery, UserId},
    services::ErrorKind,
};
use rstest::rstest;
use tokio::task::JoinSet;

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_get_distinct_codes(engine: Engine) -> Result<(), eyre::Report> {
    let engine = Arc::new(engine);
    let mut creations = JoinSet::new();
    for index in 0..20 {
        let shared = Arc::clone(&engine);
        creations.spawn(async move {
            shared
                .service
                .create(
                    shared.tenant,
                    shared.requester,
                    shared.request(&format!("Parallel task {index}")),
                )
                .await
        });
    }

    let mut codes = HashSet::new();
    while let Some(joined) = creations.join_next().await {
        let task = joined??;
        codes.insert(task.code().as_str().to_owned());
    }

    assert_eq!(codes.len(), 20);
    let page = engine
        .service
        .list_requests(engine.tenant, TaskListQuery::new().with_page(1, 100)?)
        .await?;
    assert_eq!(page.total, 20);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn only_one_approver_wins_a_slot(engine: Engine) -> Result<(), eyre::Report> {
    let created = engine.create("Contested").await?;
    let task_id = created.id();
    let slot_id = created.approvals().first().id();
    let engine = Arc::new(engine);

    let mut approvals = JoinSet::new();
    for approver in 1..=8 {
        let shared = Arc::clone(&engine);
        approvals.spawn(async move {
            let user = UserId::new(1000 + approver)?;
            Ok::<_, eyre::Report>(
                shared
                    .service
                    .approve_slot(shared.tenant, user, task_id, slot_id, None)
                    .await,
            )
        });
    }

    let mut winners = 0;
    while let Some(joined) = approvals.join_next().await {
        match joined?? {
            Ok(task) => {
                winners += 1;
                assert_eq!(
                    task.approval_status(),
                    ApprovalStatus::PendingSecondApproval
                );
            }
            Err(err) => assert_eq!(err.kind(), ErrorKind::AlreadyResolved),
        }
    }

    assert_eq!(winners, 1);
    Ok(())
}
