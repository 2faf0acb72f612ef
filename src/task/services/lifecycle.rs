//! Service layer for task creation, editing, listing and approval.

use super::{
    approval::ApprovalSequencer,
    attachments,
    code::CodeGenerator,
    error::{TaskLifecycleError, TaskLifecycleResult},
    requests::{CreateTaskRequest, ReviewSubmission, UpdateTaskRequest},
};
use crate::config::EngineConfig;
use crate::task::{
    domain::{
        ApprovalSequence, ApprovalSlot, ApprovalSlotId, AttachmentCategory, AttachmentUpload,
        ExecutionStatus, ListMode, NewTaskData, ProjectCode, ReferenceId, Task,
        TaskCode, TaskFile, TaskId, TaskListQuery, TaskPage, TaskPatch, TaskTitle, TenantId,
        UserId,
    },
    ports::{AttachmentStorage, ProjectDirectory, TaskRepository, TaskRepositoryError},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Task lifecycle orchestration service.
///
/// Compound operations save attachments first and then persist every field,
/// attachment row and status change in a single repository write. Saved
/// blobs are deleted again when that write fails.
#[derive(Clone)]
pub struct TaskLifecycleService<R, P, S, C>
where
    R: TaskRepository,
    P: ProjectDirectory,
    S: AttachmentStorage,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    storage: Arc<S>,
    clock: Arc<C>,
    codes: CodeGenerator<R, P>,
    approvals: ApprovalSequencer<R, C>,
    max_code_attempts: u32,
}

impl<R, P, S, C> TaskLifecycleService<R, P, S, C>
where
    R: TaskRepository,
    P: ProjectDirectory,
    S: AttachmentStorage,
    C: Clock + Send + Sync,
{
    /// Creates a new task lifecycle service.
    #[must_use]
    pub fn new(
        repository: Arc<R>,
        projects: Arc<P>,
        storage: Arc<S>,
        clock: Arc<C>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            codes: CodeGenerator::new(
                Arc::clone(&repository),
                projects,
                config.code_sequence_width,
            ),
            approvals: ApprovalSequencer::new(
                Arc::clone(&repository),
                Arc::clone(&clock),
                config.approval_ordering(),
            ),
            repository,
            storage,
            clock,
            max_code_attempts: config.max_code_attempts.max(1),
        }
    }

    /// Returns the approval sequencer used by this service.
    #[must_use]
    pub const fn approvals(&self) -> &ApprovalSequencer<R, C> {
        &self.approvals
    }

    /// Creates a task in `ToDo` with two waiting approval slots.
    ///
    /// Attachments are stored under the creation category. A code collision
    /// draws a fresh code, up to the configured number of attempts.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError`] when the title is invalid, the project
    /// does not exist, an attachment is rejected, every code collides, or
    /// persistence fails.
    pub async fn create(
        &self,
        tenant: TenantId,
        actor: UserId,
        request: CreateTaskRequest,
    ) -> TaskLifecycleResult<Task> {
        let title = TaskTitle::new(request.title)?;
        let project = request.project_id;
        let project_code = self.codes.project_code(tenant, project).await?;
        let code = self.codes.next_code(tenant, project, &project_code).await?;

        let task_id = TaskId::new();
        let now = self.clock.utc();
        let files = attachments::save_all(
            &*self.storage,
            task_id,
            &request.attachments,
            AttachmentCategory::Creation,
            now,
        )
        .await?;

        let draft = NewTaskData {
            id: task_id,
            tenant_id: tenant,
            project_id: project,
            code,
            title,
            description: request.description,
            priority: request.priority,
            stack: request.stack,
            assigned_to: request.assigned_to,
            due_date: request.due_date,
            created_by: actor,
            attachments: files.clone(),
        };

        match self.insert_with_fresh_code(draft, &project_code, now).await {
            Ok(task) => {
                info!(
                    %tenant,
                    task_id = %task.id(),
                    code = %task.code(),
                    %actor,
                    "task created"
                );
                Ok(task)
            }
            Err(err) => {
                attachments::discard(&*self.storage, task_id, &files).await;
                Err(err)
            }
        }
    }

    async fn insert_with_fresh_code(
        &self,
        mut draft: NewTaskData,
        project_code: &ProjectCode,
        now: DateTime<Utc>,
    ) -> TaskLifecycleResult<Task> {
        let tenant = draft.tenant_id;
        let project = draft.project_id;
        let mut attempt = 1;
        loop {
            let task = Task::create(draft.clone(), now);
            let taken = match self.repository.create_with_approval_slots(&task).await {
                Ok(()) => return Ok(task),
                Err(TaskRepositoryError::DuplicateCode(taken)) => taken,
                Err(err) => return Err(err.into()),
            };
            if attempt >= self.max_code_attempts {
                return Err(TaskLifecycleError::CodeConflict {
                    project,
                    attempts: attempt,
                });
            }
            warn!(%tenant, %project, code = %taken, attempt, "task code collision, retrying");
            attempt += 1;
            draft.code = self.codes.next_code(tenant, project, project_code).await?;
        }
    }

    /// Retrieves a live task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::TaskNotFound`] when the task does not
    /// exist, is deleted, or belongs to another tenant.
    pub async fn get(&self, tenant: TenantId, id: TaskId) -> TaskLifecycleResult<Task> {
        self.find_or_error(tenant, id).await
    }

    /// Retrieves a live task by code.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed code and
    /// [`TaskLifecycleError::TaskCodeNotFound`] when no live task carries it.
    pub async fn get_by_code(&self, tenant: TenantId, code: &str) -> TaskLifecycleResult<Task> {
        let parsed = TaskCode::parse(code)?;
        self.repository
            .find_by_code(tenant, &parsed)
            .await?
            .ok_or(TaskLifecycleError::TaskCodeNotFound(parsed))
    }

    /// Lists live tasks.
    ///
    /// [`ListMode::Tasks`] only returns fully approved tasks;
    /// [`ListMode::Requests`] honours the query's approval filter.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when the query fails.
    pub async fn list(
        &self,
        tenant: TenantId,
        query: TaskListQuery,
        mode: ListMode,
    ) -> TaskLifecycleResult<TaskPage> {
        let effective = query.for_mode(mode);
        Ok(self.repository.list(tenant, &effective).await?)
    }

    /// Lists fully approved tasks.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when the query fails.
    pub async fn list_tasks(
        &self,
        tenant: TenantId,
        query: TaskListQuery,
    ) -> TaskLifecycleResult<TaskPage> {
        self.list(tenant, query, ListMode::Tasks).await
    }

    /// Lists tasks as approval requests, in any approval state.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when the query fails.
    pub async fn list_requests(
        &self,
        tenant: TenantId,
        query: TaskListQuery,
    ) -> TaskLifecycleResult<TaskPage> {
        self.list(tenant, query, ListMode::Requests).await
    }

    /// Updates only the fields set on `request`.
    ///
    /// New attachments are stored under the creation category. Moving the
    /// task to another project keeps its code. The review narratives can be
    /// corrected here without changing the execution status.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError`] when the task or new project is not
    /// found, the title is invalid, an attachment is rejected, or
    /// persistence fails.
    pub async fn update(
        &self,
        tenant: TenantId,
        actor: UserId,
        id: TaskId,
        request: UpdateTaskRequest,
    ) -> TaskLifecycleResult<Task> {
        let mut patch = TaskPatch::touched_by(actor, self.clock.utc());
        patch.title = request.title.map(TaskTitle::new).transpose()?;
        if let Some(project) = request.project_id {
            self.codes.project_code(tenant, project).await?;
            patch.project_id = Some(project);
        }
        patch.description = request.description;
        patch.priority = request.priority;
        patch.assigned_to = request.assigned_to;
        patch.stack = request.stack;
        patch.due_date = request.due_date;
        patch.description_before = request.description_before;
        patch.description_after = request.description_after;

        self.write(
            tenant,
            id,
            patch,
            &request.attachments,
            AttachmentCategory::Creation,
        )
        .await
    }

    /// Soft deletes a task. Approval slots and attachments stay in place.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::TaskNotFound`] when the task is missing
    /// or already deleted.
    pub async fn delete(&self, tenant: TenantId, id: TaskId) -> TaskLifecycleResult<()> {
        self.repository
            .soft_delete(tenant, id, self.clock.utc())
            .await
            .map_err(|err| match err {
                TaskRepositoryError::NotFound(missing) => TaskLifecycleError::TaskNotFound(missing),
                other => other.into(),
            })?;
        info!(%tenant, task_id = %id, "task deleted");
        Ok(())
    }

    /// Writes the execution status. Any status may follow any other;
    /// moving to `Done` also records who finished the task and when.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError`] when the task is not found or
    /// persistence fails.
    pub async fn change_execution_status(
        &self,
        tenant: TenantId,
        actor: UserId,
        id: TaskId,
        status: ExecutionStatus,
    ) -> TaskLifecycleResult<Task> {
        let now = self.clock.utc();
        let mut patch = TaskPatch::touched_by(actor, now);
        patch.status = Some(status);
        if status == ExecutionStatus::Done {
            patch.done = Some((actor, now));
        }
        self.write(tenant, id, patch, &[], AttachmentCategory::Creation)
            .await
    }

    /// Writes the task type.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError`] when the task is not found or
    /// persistence fails.
    pub async fn change_type(
        &self,
        tenant: TenantId,
        actor: UserId,
        id: TaskId,
        task_type: ReferenceId,
    ) -> TaskLifecycleResult<Task> {
        let mut patch = TaskPatch::touched_by(actor, self.clock.utc());
        patch.task_type = Some(Some(task_type));
        self.write(tenant, id, patch, &[], AttachmentCategory::Creation)
            .await
    }

    /// Records the review narrative, stores review attachments and moves the
    /// task to `InReview`, as one write.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError`] when the task is not found, an
    /// attachment is rejected, or persistence fails. Nothing is written in
    /// either case.
    pub async fn enter_review(
        &self,
        tenant: TenantId,
        actor: UserId,
        id: TaskId,
        submission: ReviewSubmission,
    ) -> TaskLifecycleResult<Task> {
        let mut patch = TaskPatch::touched_by(actor, self.clock.utc());
        patch.description_before = Some(submission.description_before);
        patch.description_after = Some(submission.description_after);
        patch.status = Some(ExecutionStatus::InReview);
        self.write(
            tenant,
            id,
            patch,
            &submission.attachments,
            AttachmentCategory::Review,
        )
        .await
    }

    /// Records the reason text. The execution status is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError`] when the task is not found or
    /// persistence fails.
    pub async fn set_reason(
        &self,
        tenant: TenantId,
        actor: UserId,
        id: TaskId,
        reason: impl Into<String>,
    ) -> TaskLifecycleResult<Task> {
        let mut patch = TaskPatch::touched_by(actor, self.clock.utc());
        patch.reason = Some(Some(reason.into()));
        self.write(tenant, id, patch, &[], AttachmentCategory::Creation)
            .await
    }

    /// Records the revision text, stores revision attachments and moves the
    /// task to `Revision`, as one write.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError`] when the task is not found, an
    /// attachment is rejected, or persistence fails. Nothing is written in
    /// either case.
    pub async fn set_revision(
        &self,
        tenant: TenantId,
        actor: UserId,
        id: TaskId,
        revision: impl Into<String>,
        uploads: &[AttachmentUpload],
    ) -> TaskLifecycleResult<Task> {
        let mut patch = TaskPatch::touched_by(actor, self.clock.utc());
        patch.revision = Some(Some(revision.into()));
        patch.status = Some(ExecutionStatus::Revision);
        self.write(tenant, id, patch, uploads, AttachmentCategory::Revision)
            .await
    }

    /// Approves an approval slot of a task.
    ///
    /// # Errors
    ///
    /// See [`ApprovalSequencer::approve`].
    pub async fn approve_slot(
        &self,
        tenant: TenantId,
        actor: UserId,
        task_id: TaskId,
        slot_id: ApprovalSlotId,
        note: Option<&str>,
    ) -> TaskLifecycleResult<Task> {
        self.approvals
            .approve(tenant, task_id, slot_id, actor, note)
            .await
    }

    /// Rejects an approval slot of a task.
    ///
    /// # Errors
    ///
    /// See [`ApprovalSequencer::reject`].
    pub async fn reject_slot(
        &self,
        tenant: TenantId,
        actor: UserId,
        task_id: TaskId,
        slot_id: ApprovalSlotId,
        note: Option<&str>,
    ) -> TaskLifecycleResult<Task> {
        self.approvals
            .reject(tenant, task_id, slot_id, actor, note)
            .await
    }

    /// Returns both approval slots of a task.
    ///
    /// # Errors
    ///
    /// See [`ApprovalSequencer::slots`].
    pub async fn approval_slots(
        &self,
        tenant: TenantId,
        task_id: TaskId,
    ) -> TaskLifecycleResult<Vec<ApprovalSlot>> {
        self.approvals.slots(tenant, task_id).await
    }

    /// Returns one approval slot of a task.
    ///
    /// # Errors
    ///
    /// See [`ApprovalSequencer::slot`].
    pub async fn approval_slot(
        &self,
        tenant: TenantId,
        task_id: TaskId,
        sequence: ApprovalSequence,
    ) -> TaskLifecycleResult<ApprovalSlot> {
        self.approvals.slot(tenant, task_id, sequence).await
    }

    async fn write(
        &self,
        tenant: TenantId,
        id: TaskId,
        mut patch: TaskPatch,
        uploads: &[AttachmentUpload],
        category: AttachmentCategory,
    ) -> TaskLifecycleResult<Task> {
        self.find_or_error(tenant, id).await?;
        let files: Vec<TaskFile> =
            attachments::save_all(&*self.storage, id, uploads, category, self.clock.utc())
                .await?;
        patch.new_attachments.clone_from(&files);

        if let Err(err) = self.repository.update_fields(tenant, id, &patch).await {
            attachments::discard(&*self.storage, id, &files).await;
            return Err(match err {
                TaskRepositoryError::NotFound(missing) => TaskLifecycleError::TaskNotFound(missing),
                other => other.into(),
            });
        }
        debug!(
            %tenant,
            task_id = %id,
            status = ?patch.status,
            attachments = files.len(),
            "task fields written"
        );
        self.find_or_error(tenant, id).await
    }

    async fn find_or_error(&self, tenant: TenantId, id: TaskId) -> TaskLifecycleResult<Task> {
        self.repository
            .find_by_id(tenant, id)
            .await?
            .ok_or(TaskLifecycleError::TaskNotFound(id))
    }
}
