//! Then steps for task approval BDD scenarios.

use super::world::{TaskApprovalWorld, run_async};
use permitdesk::task::domain::ApprovalSequence;
use rstest_bdd_macros::then;

#[then(r#"the task code is "{code}""#)]
fn task_code_is(world: &TaskApprovalWorld, code: String) -> Result<(), eyre::Report> {
    let actual = world.task()?.code().as_str();
    eyre::ensure!(actual == code, "expected code {code}, found {actual}");
    Ok(())
}

#[then(r#"the approval status is "{status}""#)]
fn approval_status_is(world: &TaskApprovalWorld, status: String) -> Result<(), eyre::Report> {
    let stored = run_async(world.service.get(world.tenant, world.task()?.id()))?;
    let actual = stored.approval_status().as_str();
    eyre::ensure!(
        actual == status,
        "expected approval status {status}, found {actual}"
    );
    Ok(())
}

#[then(r#"the execution status is "{status}""#)]
fn execution_status_is(world: &TaskApprovalWorld, status: String) -> Result<(), eyre::Report> {
    let actual = world.task()?.status().as_str();
    eyre::ensure!(
        actual == status,
        "expected execution status {status}, found {actual}"
    );
    Ok(())
}

#[then("the final approver is recorded")]
fn final_approver_recorded(world: &TaskApprovalWorld) -> Result<(), eyre::Report> {
    let task = world.task()?;
    let expected = TaskApprovalWorld::approver(ApprovalSequence::Second.value())?;
    eyre::ensure!(
        task.approved_by() == Some(expected),
        "expected final approver {expected}, found {:?}",
        task.approved_by()
    );
    eyre::ensure!(task.approval_date().is_some(), "approval date missing");
    Ok(())
}

#[then(r#"both approval slots are "{status}""#)]
fn both_slots_are(world: &TaskApprovalWorld, status: String) -> Result<(), eyre::Report> {
    let slots = run_async(world.service.approval_slots(world.tenant, world.task()?.id()))?;
    eyre::ensure!(slots.len() == 2, "expected two slots, found {}", slots.len());
    for slot in &slots {
        let actual = slot.status().as_str();
        eyre::ensure!(
            actual == status,
            "slot {} is {actual}, expected {status}",
            slot.sequence().value()
        );
    }
    Ok(())
}

#[then(r#"the request fails with "{kind}""#)]
fn request_fails_with(world: &TaskApprovalWorld, kind: String) -> Result<(), eyre::Report> {
    let err = world
        .last_error
        .as_ref()
        .ok_or_else(|| eyre::eyre!("expected the last request to fail"))?;
    let actual = err.kind().as_str();
    eyre::ensure!(actual == kind, "expected {kind} failure, found {actual}: {err}");
    Ok(())
}
