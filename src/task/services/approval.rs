//! Two-stage approval orchestration.

use super::error::{TaskLifecycleError, TaskLifecycleResult};
use crate::task::{
    domain::{
        ApprovalDecision, ApprovalOrdering, ApprovalSequence, ApprovalSlot, ApprovalSlotId,
        Task, TaskDomainError, TaskId, TenantId, UserId,
    },
    ports::TaskRepository,
};
use mockable::Clock;
use std::sync::Arc;
use tracing::info;

/// Resolves approval slots and keeps the task's aggregate approval status in
/// step.
#[derive(Clone)]
pub struct ApprovalSequencer<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    ordering: ApprovalOrdering,
}

impl<R, C> ApprovalSequencer<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a sequencer.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>, ordering: ApprovalOrdering) -> Self {
        Self {
            repository,
            clock,
            ordering,
        }
    }

    /// Approves a waiting slot.
    ///
    /// Approving stage one moves the task to pending second approval;
    /// approving stage two completes it and records the final approver.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError`] when the task or slot is not found,
    /// the slot is already resolved, ordering is violated, or persistence
    /// fails.
    pub async fn approve(
        &self,
        tenant: TenantId,
        task_id: TaskId,
        slot_id: ApprovalSlotId,
        approver: UserId,
        note: Option<&str>,
    ) -> TaskLifecycleResult<Task> {
        self.resolve(tenant, task_id, slot_id, ApprovalDecision::Approve, approver, note)
            .await
    }

    /// Rejects a waiting slot.
    ///
    /// Rejecting stage one closes both slots; rejecting stage two leaves the
    /// stage-one outcome untouched.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError`] under the same conditions as
    /// [`Self::approve`].
    pub async fn reject(
        &self,
        tenant: TenantId,
        task_id: TaskId,
        slot_id: ApprovalSlotId,
        approver: UserId,
        note: Option<&str>,
    ) -> TaskLifecycleResult<Task> {
        self.resolve(tenant, task_id, slot_id, ApprovalDecision::Reject, approver, note)
            .await
    }

    /// Returns both approval slots of a live task, in sequence order.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::TaskNotFound`] when the task is not
    /// visible to the tenant.
    pub async fn slots(
        &self,
        tenant: TenantId,
        task_id: TaskId,
    ) -> TaskLifecycleResult<Vec<ApprovalSlot>> {
        self.find_or_error(tenant, task_id).await?;
        Ok(self.repository.list_approval_slots(task_id).await?)
    }

    /// Returns the slot at one pipeline position of a live task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::TaskNotFound`] when the task is not
    /// visible to the tenant, and a storage error if the slot row is
    /// missing.
    pub async fn slot(
        &self,
        tenant: TenantId,
        task_id: TaskId,
        sequence: ApprovalSequence,
    ) -> TaskLifecycleResult<ApprovalSlot> {
        self.find_or_error(tenant, task_id).await?;
        self.repository
            .find_approval_slot(task_id, sequence)
            .await?
            .ok_or(TaskLifecycleError::Domain(
                TaskDomainError::MalformedApprovalPipeline { task_id, found: 1 },
            ))
    }

    async fn resolve(
        &self,
        tenant: TenantId,
        task_id: TaskId,
        slot_id: ApprovalSlotId,
        decision: ApprovalDecision,
        approver: UserId,
        note: Option<&str>,
    ) -> TaskLifecycleResult<Task> {
        let mut task = self.find_or_error(tenant, task_id).await?;
        let resolution = task.approvals().resolve(
            slot_id,
            decision,
            approver,
            note,
            self.clock.utc(),
            self.ordering,
        )?;

        self.repository
            .update_approval_slots(tenant, &resolution)
            .await?;
        task.apply_approval(&resolution);

        info!(
            %task_id,
            %slot_id,
            sequence = resolution.sequence.value(),
            ?decision,
            %approver,
            approval_status = %resolution.task_status,
            "approval slot resolved"
        );
        Ok(task)
    }

    async fn find_or_error(&self, tenant: TenantId, task_id: TaskId) -> TaskLifecycleResult<Task> {
        self.repository
            .find_by_id(tenant, task_id)
            .await?
            .ok_or(TaskLifecycleError::TaskNotFound(task_id))
    }
}
