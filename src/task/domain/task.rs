//! Task aggregate root.

use super::{
    ApprovalPipeline, ApprovalResolution, ApprovalStatus, ExecutionStatus, ProjectId,
    ReferenceId, TaskCode, TaskDomainError, TaskFile, TaskId, TenantId, UserId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const MAX_TITLE_LENGTH: usize = 255;

/// Validated task title.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskTitle(String);

impl TaskTitle {
    /// Creates a trimmed, non-empty title of at most 255 characters.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] or
    /// [`TaskDomainError::TitleTooLong`].
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyTitle);
        }
        let actual = trimmed.chars().count();
        if actual > MAX_TITLE_LENGTH {
            return Err(TaskDomainError::TitleTooLong {
                max: MAX_TITLE_LENGTH,
                actual,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the title as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validated input for a brand-new task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTaskData {
    /// Pre-allocated identifier, so attachments can be linked before insert.
    pub id: TaskId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Generated code.
    pub code: TaskCode,
    /// Title.
    pub title: TaskTitle,
    /// Optional description.
    pub description: Option<String>,
    /// Priority lookup id.
    pub priority: ReferenceId,
    /// Optional stack lookup id.
    pub stack: Option<ReferenceId>,
    /// Optional assignee.
    pub assigned_to: Option<UserId>,
    /// Optional due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Creating user.
    pub created_by: UserId,
    /// Creation-category attachments.
    pub attachments: Vec<TaskFile>,
}

/// Task aggregate root.
///
/// Execution status and approval status move independently. The approval
/// pipeline always holds exactly two slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    tenant_id: TenantId,
    project_id: ProjectId,
    code: TaskCode,
    title: TaskTitle,
    description: Option<String>,
    description_before: Option<String>,
    description_after: Option<String>,
    reason: Option<String>,
    revision: Option<String>,
    priority: ReferenceId,
    task_type: Option<ReferenceId>,
    stack: Option<ReferenceId>,
    assigned_to: Option<UserId>,
    created_by: UserId,
    updated_by: Option<UserId>,
    approved_by: Option<UserId>,
    completed_by: Option<UserId>,
    done_by: Option<UserId>,
    status: ExecutionStatus,
    active: bool,
    approval_status: ApprovalStatus,
    approval_date: Option<DateTime<Utc>>,
    start_date: Option<DateTime<Utc>>,
    due_date: Option<DateTime<Utc>>,
    completed_date: Option<DateTime<Utc>>,
    done_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
    attachments: Vec<TaskFile>,
    approvals: ApprovalPipeline,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Task identifier.
    pub id: TaskId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Task code.
    pub code: TaskCode,
    /// Title.
    pub title: TaskTitle,
    /// Description.
    pub description: Option<String>,
    /// Narrative captured before review.
    pub description_before: Option<String>,
    /// Narrative captured after review.
    pub description_after: Option<String>,
    /// Reason text.
    pub reason: Option<String>,
    /// Revision text.
    pub revision: Option<String>,
    /// Priority lookup id.
    pub priority: ReferenceId,
    /// Type lookup id.
    pub task_type: Option<ReferenceId>,
    /// Stack lookup id.
    pub stack: Option<ReferenceId>,
    /// Assignee.
    pub assigned_to: Option<UserId>,
    /// Creator.
    pub created_by: UserId,
    /// Last editor.
    pub updated_by: Option<UserId>,
    /// Final approver.
    pub approved_by: Option<UserId>,
    /// Completing user.
    pub completed_by: Option<UserId>,
    /// User who marked the task done.
    pub done_by: Option<UserId>,
    /// Execution status.
    pub status: ExecutionStatus,
    /// Soft usability flag.
    pub active: bool,
    /// Aggregate approval status.
    pub approval_status: ApprovalStatus,
    /// Final approval timestamp.
    pub approval_date: Option<DateTime<Utc>>,
    /// Work start date.
    pub start_date: Option<DateTime<Utc>>,
    /// Due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Completion date.
    pub completed_date: Option<DateTime<Utc>>,
    /// Done timestamp.
    pub done_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Attachment rows.
    pub attachments: Vec<TaskFile>,
    /// Approval slots.
    pub approvals: ApprovalPipeline,
}

impl Task {
    /// Creates a new task in `ToDo` with two waiting approval slots.
    #[must_use]
    pub fn create(data: NewTaskData, at: DateTime<Utc>) -> Self {
        Self {
            id: data.id,
            tenant_id: data.tenant_id,
            project_id: data.project_id,
            code: data.code,
            title: data.title,
            description: data.description,
            description_before: None,
            description_after: None,
            reason: None,
            revision: None,
            priority: data.priority,
            task_type: None,
            stack: data.stack,
            assigned_to: data.assigned_to,
            created_by: data.created_by,
            updated_by: None,
            approved_by: None,
            completed_by: None,
            done_by: None,
            status: ExecutionStatus::ToDo,
            active: true,
            approval_status: ApprovalStatus::Waiting,
            approval_date: None,
            start_date: None,
            due_date: data.due_date,
            completed_date: None,
            done_at: None,
            created_at: at,
            updated_at: at,
            deleted_at: None,
            attachments: data.attachments,
            approvals: ApprovalPipeline::seed(data.id, at),
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            tenant_id: data.tenant_id,
            project_id: data.project_id,
            code: data.code,
            title: data.title,
            description: data.description,
            description_before: data.description_before,
            description_after: data.description_after,
            reason: data.reason,
            revision: data.revision,
            priority: data.priority,
            task_type: data.task_type,
            stack: data.stack,
            assigned_to: data.assigned_to,
            created_by: data.created_by,
            updated_by: data.updated_by,
            approved_by: data.approved_by,
            completed_by: data.completed_by,
            done_by: data.done_by,
            status: data.status,
            active: data.active,
            approval_status: data.approval_status,
            approval_date: data.approval_date,
            start_date: data.start_date,
            due_date: data.due_date,
            completed_date: data.completed_date,
            done_at: data.done_at,
            created_at: data.created_at,
            updated_at: data.updated_at,
            deleted_at: data.deleted_at,
            attachments: data.attachments,
            approvals: data.approvals,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the owning tenant.
    #[must_use]
    pub const fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the owning project.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the task code.
    #[must_use]
    pub const fn code(&self) -> &TaskCode {
        &self.code
    }

    /// Returns the title.
    #[must_use]
    pub const fn title(&self) -> &TaskTitle {
        &self.title
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the narrative captured before review.
    #[must_use]
    pub fn description_before(&self) -> Option<&str> {
        self.description_before.as_deref()
    }

    /// Returns the narrative captured after review.
    #[must_use]
    pub fn description_after(&self) -> Option<&str> {
        self.description_after.as_deref()
    }

    /// Returns the reason text.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Returns the revision text.
    #[must_use]
    pub fn revision(&self) -> Option<&str> {
        self.revision.as_deref()
    }

    /// Returns the priority lookup id.
    #[must_use]
    pub const fn priority(&self) -> ReferenceId {
        self.priority
    }

    /// Returns the type lookup id.
    #[must_use]
    pub const fn task_type(&self) -> Option<ReferenceId> {
        self.task_type
    }

    /// Returns the stack lookup id.
    #[must_use]
    pub const fn stack(&self) -> Option<ReferenceId> {
        self.stack
    }

    /// Returns the assignee.
    #[must_use]
    pub const fn assigned_to(&self) -> Option<UserId> {
        self.assigned_to
    }

    /// Returns the creator.
    #[must_use]
    pub const fn created_by(&self) -> UserId {
        self.created_by
    }

    /// Returns the last editor.
    #[must_use]
    pub const fn updated_by(&self) -> Option<UserId> {
        self.updated_by
    }

    /// Returns the final approver.
    #[must_use]
    pub const fn approved_by(&self) -> Option<UserId> {
        self.approved_by
    }

    /// Returns the completing user.
    #[must_use]
    pub const fn completed_by(&self) -> Option<UserId> {
        self.completed_by
    }

    /// Returns the user who marked the task done.
    #[must_use]
    pub const fn done_by(&self) -> Option<UserId> {
        self.done_by
    }

    /// Returns the execution status.
    #[must_use]
    pub const fn status(&self) -> ExecutionStatus {
        self.status
    }

    /// Returns the soft usability flag.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Returns the aggregate approval status.
    #[must_use]
    pub const fn approval_status(&self) -> ApprovalStatus {
        self.approval_status
    }

    /// Returns the final approval timestamp.
    #[must_use]
    pub const fn approval_date(&self) -> Option<DateTime<Utc>> {
        self.approval_date
    }

    /// Returns the work start date.
    #[must_use]
    pub const fn start_date(&self) -> Option<DateTime<Utc>> {
        self.start_date
    }

    /// Returns the due date.
    #[must_use]
    pub const fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    /// Returns the completion date.
    #[must_use]
    pub const fn completed_date(&self) -> Option<DateTime<Utc>> {
        self.completed_date
    }

    /// Returns when the task was marked done.
    #[must_use]
    pub const fn done_at(&self) -> Option<DateTime<Utc>> {
        self.done_at
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the soft-delete marker.
    #[must_use]
    pub const fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    /// Returns `true` once the task has been soft deleted.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Returns the attachment rows in insertion order.
    #[must_use]
    pub fn attachments(&self) -> &[TaskFile] {
        &self.attachments
    }

    /// Returns the approval slots.
    #[must_use]
    pub const fn approvals(&self) -> &ApprovalPipeline {
        &self.approvals
    }

    /// Writes every field present in `patch` and appends its attachments.
    pub fn apply_patch(&mut self, patch: &TaskPatch) {
        assign(&mut self.title, patch.title.as_ref());
        assign(&mut self.description, patch.description.as_ref());
        assign(&mut self.description_before, patch.description_before.as_ref());
        assign(&mut self.description_after, patch.description_after.as_ref());
        assign(&mut self.reason, patch.reason.as_ref());
        assign(&mut self.revision, patch.revision.as_ref());
        assign(&mut self.project_id, patch.project_id.as_ref());
        assign(&mut self.priority, patch.priority.as_ref());
        assign(&mut self.task_type, patch.task_type.as_ref());
        assign(&mut self.stack, patch.stack.as_ref());
        assign(&mut self.assigned_to, patch.assigned_to.as_ref());
        assign(&mut self.status, patch.status.as_ref());
        assign(&mut self.due_date, patch.due_date.as_ref());
        if let Some((done_by, done_at)) = patch.done {
            self.done_by = Some(done_by);
            self.done_at = Some(done_at);
        }
        if let Some((updated_by, updated_at)) = patch.touched {
            self.updated_by = Some(updated_by);
            self.updated_at = updated_at;
        }
        self.attachments
            .extend(patch.new_attachments.iter().cloned());
    }

    /// Applies a persisted approval resolution.
    pub fn apply_approval(&mut self, resolution: &ApprovalResolution) {
        self.approvals.apply(resolution);
        self.approval_status = resolution.task_status;
        if let Some((approver, at)) = resolution.final_approval {
            self.approved_by = Some(approver);
            self.approval_date = Some(at);
        }
        self.updated_by = Some(resolution.actor);
        self.updated_at = resolution.resolved_at;
    }

    /// Sets the soft-delete marker.
    pub const fn mark_deleted(&mut self, at: DateTime<Utc>) {
        self.deleted_at = Some(at);
    }
}

fn assign<T: Clone>(field: &mut T, value: Option<&T>) {
    if let Some(new_value) = value {
        field.clone_from(new_value);
    }
}

/// Partial set of task field writes, applied as one unit.
///
/// A `None` field is left untouched. Nullable fields use a nested option:
/// `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    /// New title.
    pub title: Option<TaskTitle>,
    /// New description.
    pub description: Option<Option<String>>,
    /// New pre-review narrative.
    pub description_before: Option<Option<String>>,
    /// New post-review narrative.
    pub description_after: Option<Option<String>>,
    /// New reason text.
    pub reason: Option<Option<String>>,
    /// New revision text.
    pub revision: Option<Option<String>>,
    /// New owning project; the task code is unaffected.
    pub project_id: Option<ProjectId>,
    /// New priority.
    pub priority: Option<ReferenceId>,
    /// New type.
    pub task_type: Option<Option<ReferenceId>>,
    /// New stack.
    pub stack: Option<Option<ReferenceId>>,
    /// New assignee.
    pub assigned_to: Option<Option<UserId>>,
    /// New execution status.
    pub status: Option<ExecutionStatus>,
    /// New due date.
    pub due_date: Option<Option<DateTime<Utc>>>,
    /// Done stamp (user and time).
    pub done: Option<(UserId, DateTime<Utc>)>,
    /// Editor stamp (user and time).
    pub touched: Option<(UserId, DateTime<Utc>)>,
    /// Attachment rows to append.
    pub new_attachments: Vec<TaskFile>,
}

impl TaskPatch {
    /// Creates a patch stamped with the acting user and time.
    #[must_use]
    pub fn touched_by(actor: UserId, at: DateTime<Utc>) -> Self {
        Self {
            touched: Some((actor, at)),
            ..Self::default()
        }
    }

    /// Returns `true` when the patch writes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
