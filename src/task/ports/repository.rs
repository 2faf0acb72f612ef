//! Repository port for task, approval slot and attachment persistence.

use crate::task::domain::{
    ApprovalResolution, ApprovalSequence, ApprovalSlot, ApprovalSlotId, ProjectId, Task,
    TaskCode, TaskFile, TaskId, TaskListQuery, TaskPage, TaskPatch, TenantId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Task persistence contract.
///
/// Every read excludes soft-deleted tasks and every tenant-carrying call is
/// scoped by tenant: a task owned by another tenant behaves exactly like a
/// missing one.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Allocates the next code sequence number for a project.
    ///
    /// The counter is atomic per (tenant, project). On first use it starts
    /// after the number of tasks already stored for the project, deleted
    /// rows included.
    async fn next_code_sequence(
        &self,
        tenant: TenantId,
        project: ProjectId,
    ) -> TaskRepositoryResult<u32>;

    /// Stores a new task together with its two approval slots and any
    /// attachments, atomically.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateCode`] when the tenant already
    /// has a task with the same code, in which case nothing is written.
    async fn create_with_approval_slots(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Finds a live task by identifier.
    async fn find_by_id(&self, tenant: TenantId, id: TaskId)
    -> TaskRepositoryResult<Option<Task>>;

    /// Finds a live task by code.
    async fn find_by_code(
        &self,
        tenant: TenantId,
        code: &TaskCode,
    ) -> TaskRepositoryResult<Option<Task>>;

    /// Returns one page of live tasks matching the query, newest first.
    async fn list(&self, tenant: TenantId, query: &TaskListQuery)
    -> TaskRepositoryResult<TaskPage>;

    /// Writes only the fields present in `patch` and appends its attachment
    /// rows, atomically.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when no live task matches.
    async fn update_fields(
        &self,
        tenant: TenantId,
        id: TaskId,
        patch: &TaskPatch,
    ) -> TaskRepositoryResult<()>;

    /// Appends attachment rows to a live task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when no live task matches.
    async fn create_attachments(
        &self,
        tenant: TenantId,
        id: TaskId,
        files: &[TaskFile],
    ) -> TaskRepositoryResult<()> {
        let patch = TaskPatch {
            new_attachments: files.to_vec(),
            ..TaskPatch::default()
        };
        self.update_fields(tenant, id, &patch).await
    }

    /// Sets the soft-delete marker. Approval slots and attachments stay in
    /// place.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when no live task matches.
    async fn soft_delete(
        &self,
        tenant: TenantId,
        id: TaskId,
        deleted_at: DateTime<Utc>,
    ) -> TaskRepositoryResult<()>;

    /// Returns the approval slots of a task in sequence order.
    async fn list_approval_slots(&self, task_id: TaskId)
    -> TaskRepositoryResult<Vec<ApprovalSlot>>;

    /// Returns the approval slot at a pipeline position.
    async fn find_approval_slot(
        &self,
        task_id: TaskId,
        sequence: ApprovalSequence,
    ) -> TaskRepositoryResult<Option<ApprovalSlot>>;

    /// Persists an approval resolution atomically: every slot write is a
    /// compare-and-swap against its expected status, and the task's
    /// aggregate approval fields are updated in the same unit.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::SlotConflict`] when a slot no longer
    /// holds its expected status, and [`TaskRepositoryError::NotFound`] when
    /// no live task matches; nothing is written in either case.
    async fn update_approval_slots(
        &self,
        tenant: TenantId,
        resolution: &ApprovalResolution,
    ) -> TaskRepositoryResult<()>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// The tenant already has a task with this code.
    #[error("duplicate task code: {0}")]
    DuplicateCode(TaskCode),

    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found for the tenant.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// An approval slot was resolved concurrently.
    #[error("approval slot {0} was modified concurrently")]
    SlotConflict(ApprovalSlotId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
