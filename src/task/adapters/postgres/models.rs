//! Diesel row models for task persistence.

use super::schema::{approval_tasks, task_files, tasks};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Row of the `tasks` table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Internal task identifier.
    pub id: uuid::Uuid,
    /// Owning tenant.
    pub tenant_id: i64,
    /// Owning project.
    pub project_id: i64,
    /// Task code.
    pub code: String,
    /// Title.
    pub title: String,
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
    pub priority_id: i64,
    /// Type lookup id.
    pub type_id: Option<i64>,
    /// Stack lookup id.
    pub stack_id: Option<i64>,
    /// Assignee.
    pub assigned_to: Option<i64>,
    /// Creator.
    pub created_by: i64,
    /// Last editor.
    pub updated_by: Option<i64>,
    /// Final approver.
    pub approved_by: Option<i64>,
    /// Completing user.
    pub completed_by: Option<i64>,
    /// User who marked the task done.
    pub done_by: Option<i64>,
    /// Execution status reference id.
    pub status_id: i64,
    /// Soft usability flag.
    pub is_active: bool,
    /// Aggregate approval status reference id.
    pub approval_status_id: i64,
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
}

/// Partial update of a `tasks` row.
///
/// `None` leaves a column untouched; `Some(None)` writes `NULL`.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = tasks)]
pub struct TaskChangeset {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub description_before: Option<Option<String>>,
    pub description_after: Option<Option<String>>,
    pub reason: Option<Option<String>>,
    pub revision: Option<Option<String>>,
    pub project_id: Option<i64>,
    pub priority_id: Option<i64>,
    pub type_id: Option<Option<i64>>,
    pub stack_id: Option<Option<i64>>,
    pub assigned_to: Option<Option<i64>>,
    pub status_id: Option<i64>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub done_by: Option<Option<i64>>,
    pub done_at: Option<Option<DateTime<Utc>>>,
    pub updated_by: Option<Option<i64>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TaskChangeset {
    /// Returns `true` when no column would be written.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.description_before.is_none()
            && self.description_after.is_none()
            && self.reason.is_none()
            && self.revision.is_none()
            && self.project_id.is_none()
            && self.priority_id.is_none()
            && self.type_id.is_none()
            && self.stack_id.is_none()
            && self.assigned_to.is_none()
            && self.status_id.is_none()
            && self.due_date.is_none()
            && self.done_by.is_none()
            && self.done_at.is_none()
            && self.updated_by.is_none()
            && self.updated_at.is_none()
    }
}

/// Aggregate approval columns written alongside slot changes.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = tasks)]
pub struct TaskApprovalChangeset {
    pub approval_status_id: i64,
    pub approved_by: Option<Option<i64>>,
    pub approval_date: Option<Option<DateTime<Utc>>>,
    pub updated_by: i64,
    pub updated_at: DateTime<Utc>,
}

/// Row of the `approval_tasks` table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = approval_tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ApprovalSlotRow {
    /// Slot identifier.
    pub id: uuid::Uuid,
    /// Owning task.
    pub task_id: uuid::Uuid,
    /// Pipeline position.
    pub sequence: i16,
    /// Approver.
    pub approved_by: Option<i64>,
    /// Slot status reference id.
    pub status_id: i64,
    /// Resolution timestamp.
    pub approval_date: Option<DateTime<Utc>>,
    /// Approver note.
    pub note: Option<String>,
    /// Soft usability flag.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Resolution columns of an approval slot.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = approval_tasks)]
#[diesel(treat_none_as_null = true)]
pub struct ApprovalSlotChangeset {
    pub approved_by: Option<i64>,
    pub status_id: i64,
    pub approval_date: Option<DateTime<Utc>>,
    pub note: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Row of the `task_files` table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = task_files)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskFileRow {
    /// Attachment identifier.
    pub id: uuid::Uuid,
    /// Owning task.
    pub task_id: uuid::Uuid,
    /// Original file name.
    pub file_name: String,
    /// Storage path.
    pub file_path: String,
    /// Size in bytes.
    pub file_size: i64,
    /// MIME type.
    pub file_type: String,
    /// Attachment category reference id.
    pub category_id: i64,
    /// Soft usability flag.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
