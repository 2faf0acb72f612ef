//! Approval persistence against a real `PostgreSQL` database.

use super::helpers::{BoxError, PgEngine};
use permitdesk::task::{
    domain::{ApprovalSequence, ApprovalStatus, SlotStatus, UserId},
    services::ErrorKind,
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn two_stage_approval_is_persisted() -> Result<(), BoxError> {
    let Some(engine) = PgEngine::from_env()? else {
        return Ok(());
    };
    let created = engine
        .service
        .create(engine.tenant, engine.requester, engine.request("Anchor mast"))
        .await?;
    let first_approver = UserId::new(21)?;
    let second_approver = UserId::new(22)?;

    engine
        .service
        .approve_slot(
            engine.tenant,
            first_approver,
            created.id(),
            created.approvals().first().id(),
            Some("ok"),
        )
        .await?;
    engine
        .service
        .approve_slot(
            engine.tenant,
            second_approver,
            created.id(),
            created.approvals().second().id(),
            None,
        )
        .await?;

    let stored = engine.service.get(engine.tenant, created.id()).await?;
    assert_eq!(stored.approval_status(), ApprovalStatus::Approved);
    assert_eq!(stored.approved_by(), Some(second_approver));
    let first = engine
        .service
        .approval_slot(engine.tenant, created.id(), ApprovalSequence::First)
        .await?;
    assert_eq!(first.status(), SlotStatus::Approved);
    assert_eq!(first.approved_by(), Some(first_approver));
    assert_eq!(first.note(), Some("ok"));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stage_one_rejection_updates_both_rows() -> Result<(), BoxError> {
    let Some(engine) = PgEngine::from_env()? else {
        return Ok(());
    };
    let created = engine
        .service
        .create(engine.tenant, engine.requester, engine.request("Excavate"))
        .await?;

    engine
        .service
        .reject_slot(
            engine.tenant,
            UserId::new(21)?,
            created.id(),
            created.approvals().first().id(),
            None,
        )
        .await?;

    let slots = engine
        .service
        .approval_slots(engine.tenant, created.id())
        .await?;
    assert_eq!(slots.len(), 2);
    assert!(slots.iter().all(|slot| slot.status() == SlotStatus::Rejected));

    let late = engine
        .service
        .approve_slot(
            engine.tenant,
            UserId::new(22)?,
            created.id(),
            created.approvals().second().id(),
            None,
        )
        .await;
    assert_eq!(
        late.err().map(|err| err.kind()),
        Some(ErrorKind::AlreadyResolved)
    );
    Ok(())
}
