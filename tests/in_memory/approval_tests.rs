//! Two-stage approval flows against in-memory adapters.

use super::helpers::{Engine, engine, strict_engine};
use permitdesk::task::{
    domain::{ApprovalSequence, ApprovalStatus, ExecutionStatus, SlotStatus, TaskDomainError},
    services::{ErrorKind, TaskLifecycleError},
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn approving_both_stages_completes_the_task(engine: Engine) -> Result<(), eyre::Report> {
    let created = engine.create("Weld bracket").await?;
    let first_slot = created.approvals().first().id();
    let second_slot = created.approvals().second().id();

    let halfway = engine
        .service
        .approve_slot(
            engine.tenant,
            engine.first_approver,
            created.id(),
            first_slot,
            Some("Looks safe"),
        )
        .await?;
    assert_eq!(
        halfway.approval_status(),
        ApprovalStatus::PendingSecondApproval
    );
    assert_eq!(halfway.approved_by(), None);
    assert_eq!(
        halfway.approvals().first().approved_by(),
        Some(engine.first_approver)
    );
    assert_eq!(halfway.approvals().first().note(), Some("Looks safe"));

    let done = engine
        .service
        .approve_slot(
            engine.tenant,
            engine.second_approver,
            created.id(),
            second_slot,
            None,
        )
        .await?;
    assert_eq!(done.approval_status(), ApprovalStatus::Approved);
    assert_eq!(done.approved_by(), Some(engine.second_approver));
    assert!(done.approval_date().is_some());
    assert_eq!(done.status(), ExecutionStatus::ToDo);

    let stored = engine.service.get(engine.tenant, created.id()).await?;
    assert_eq!(stored, done);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejecting_stage_two_keeps_stage_one_approval(engine: Engine) -> Result<(), eyre::Report> {
    let created = engine.create("Reroute cable").await?;
    engine
        .service
        .approve_slot(
            engine.tenant,
            engine.first_approver,
            created.id(),
            created.approvals().first().id(),
            None,
        )
        .await?;

    let rejected = engine
        .service
        .reject_slot(
            engine.tenant,
            engine.second_approver,
            created.id(),
            created.approvals().second().id(),
            Some("Missing drawings"),
        )
        .await?;

    assert_eq!(rejected.approval_status(), ApprovalStatus::Rejected);
    assert_eq!(rejected.approved_by(), None);
    let first = engine
        .service
        .approval_slot(engine.tenant, created.id(), ApprovalSequence::First)
        .await?;
    let second = engine
        .service
        .approval_slot(engine.tenant, created.id(), ApprovalSequence::Second)
        .await?;
    assert_eq!(first.status(), SlotStatus::Approved);
    assert_eq!(second.status(), SlotStatus::Rejected);
    assert_eq!(second.note(), Some("Missing drawings"));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejecting_stage_one_closes_both_slots(engine: Engine) -> Result<(), eyre::Report> {
    let created = engine.create("Demolish shed").await?;

    let rejected = engine
        .service
        .reject_slot(
            engine.tenant,
            engine.first_approver,
            created.id(),
            created.approvals().first().id(),
            None,
        )
        .await?;

    assert_eq!(rejected.approval_status(), ApprovalStatus::Rejected);
    let slots = engine
        .service
        .approval_slots(engine.tenant, created.id())
        .await?;
    for slot in &slots {
        assert_eq!(slot.status(), SlotStatus::Rejected);
        assert_eq!(slot.approved_by(), Some(engine.first_approver));
    }

    let late = engine
        .service
        .approve_slot(
            engine.tenant,
            engine.second_approver,
            created.id(),
            created.approvals().second().id(),
            None,
        )
        .await;
    let err = late.err().ok_or_else(|| eyre::eyre!("closed slot should refuse"))?;
    assert_eq!(err.kind(), ErrorKind::AlreadyResolved);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn resolving_a_slot_twice_is_refused(engine: Engine) -> Result<(), eyre::Report> {
    let created = engine.create("Double sign").await?;
    let slot = created.approvals().first().id();
    let approved = engine
        .service
        .approve_slot(engine.tenant, engine.first_approver, created.id(), slot, None)
        .await?;

    let repeat = engine
        .service
        .reject_slot(engine.tenant, engine.second_approver, created.id(), slot, None)
        .await;

    assert!(matches!(
        repeat,
        Err(TaskLifecycleError::Domain(
            TaskDomainError::SlotAlreadyResolved {
                status: SlotStatus::Approved,
                ..
            }
        ))
    ));
    let unchanged = engine.service.get(engine.tenant, created.id()).await?;
    assert_eq!(unchanged, approved);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn slot_of_another_task_is_not_found(engine: Engine) -> Result<(), eyre::Report> {
    let target = engine.create("Target").await?;
    let other = engine.create("Other").await?;

    let result = engine
        .service
        .approve_slot(
            engine.tenant,
            engine.first_approver,
            target.id(),
            other.approvals().first().id(),
            None,
        )
        .await;

    let err = result.err().ok_or_else(|| eyre::eyre!("foreign slot should fail"))?;
    assert_eq!(err.kind(), ErrorKind::NotFound);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn strict_ordering_requires_stage_one_first(
    strict_engine: Engine,
) -> Result<(), eyre::Report> {
    let engine = strict_engine;
    let created = engine.create("Ordered").await?;

    let early = engine
        .service
        .approve_slot(
            engine.tenant,
            engine.second_approver,
            created.id(),
            created.approvals().second().id(),
            None,
        )
        .await;
    let err = early.err().ok_or_else(|| eyre::eyre!("stage two should wait"))?;
    assert_eq!(err.kind(), ErrorKind::OutOfOrder);

    engine
        .service
        .approve_slot(
            engine.tenant,
            engine.first_approver,
            created.id(),
            created.approvals().first().id(),
            None,
        )
        .await?;
    let done = engine
        .service
        .approve_slot(
            engine.tenant,
            engine.second_approver,
            created.id(),
            created.approvals().second().id(),
            None,
        )
        .await?;
    assert_eq!(done.approval_status(), ApprovalStatus::Approved);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleted_tasks_cannot_be_approved(engine: Engine) -> Result<(), eyre::Report> {
    let created = engine.create("Withdrawn").await?;
    engine.service.delete(engine.tenant, created.id()).await?;

    let result = engine
        .service
        .approve_slot(
            engine.tenant,
            engine.first_approver,
            created.id(),
            created.approvals().first().id(),
            None,
        )
        .await;

    assert!(matches!(result, Err(TaskLifecycleError::TaskNotFound(_))));
    Ok(())
}
