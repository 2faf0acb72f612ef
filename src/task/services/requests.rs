//! Request payloads accepted by the lifecycle service.

use crate::task::domain::{AttachmentUpload, ProjectId, ReferenceId, UserId};
use chrono::{DateTime, Utc};

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    pub(crate) project_id: ProjectId,
    pub(crate) title: String,
    pub(crate) priority: ReferenceId,
    pub(crate) description: Option<String>,
    pub(crate) stack: Option<ReferenceId>,
    pub(crate) assigned_to: Option<UserId>,
    pub(crate) due_date: Option<DateTime<Utc>>,
    pub(crate) attachments: Vec<AttachmentUpload>,
}

impl CreateTaskRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(project_id: ProjectId, title: impl Into<String>, priority: ReferenceId) -> Self {
        Self {
            project_id,
            title: title.into(),
            priority,
            description: None,
            stack: None,
            assigned_to: None,
            due_date: None,
            attachments: Vec::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the stack.
    #[must_use]
    pub const fn with_stack(mut self, stack: ReferenceId) -> Self {
        self.stack = Some(stack);
        self
    }

    /// Sets the assignee.
    #[must_use]
    pub const fn with_assignee(mut self, assignee: UserId) -> Self {
        self.assigned_to = Some(assignee);
        self
    }

    /// Sets the due date.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Adds creation attachments.
    #[must_use]
    pub fn with_attachments(
        mut self,
        uploads: impl IntoIterator<Item = AttachmentUpload>,
    ) -> Self {
        self.attachments.extend(uploads);
        self
    }
}

/// Partial update of a task's editable fields.
///
/// Only fields set on the request are written. Nullable fields can be
/// cleared explicitly with the `clear_*` methods.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateTaskRequest {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<Option<String>>,
    pub(crate) project_id: Option<ProjectId>,
    pub(crate) priority: Option<ReferenceId>,
    pub(crate) assigned_to: Option<Option<UserId>>,
    pub(crate) stack: Option<Option<ReferenceId>>,
    pub(crate) due_date: Option<Option<DateTime<Utc>>>,
    pub(crate) description_before: Option<Option<String>>,
    pub(crate) description_after: Option<Option<String>>,
    pub(crate) attachments: Vec<AttachmentUpload>,
}

impl UpdateTaskRequest {
    /// Creates an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Replaces the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(Some(description.into()));
        self
    }

    /// Removes the description.
    #[must_use]
    pub fn clear_description(mut self) -> Self {
        self.description = Some(None);
        self
    }

    /// Moves the task to another project. The task code is kept.
    #[must_use]
    pub const fn with_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    /// Replaces the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: ReferenceId) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Replaces the assignee.
    #[must_use]
    pub const fn with_assignee(mut self, assignee: UserId) -> Self {
        self.assigned_to = Some(Some(assignee));
        self
    }

    /// Removes the assignee.
    #[must_use]
    pub const fn clear_assignee(mut self) -> Self {
        self.assigned_to = Some(None);
        self
    }

    /// Replaces the stack.
    #[must_use]
    pub const fn with_stack(mut self, stack: ReferenceId) -> Self {
        self.stack = Some(Some(stack));
        self
    }

    /// Removes the stack.
    #[must_use]
    pub const fn clear_stack(mut self) -> Self {
        self.stack = Some(None);
        self
    }

    /// Replaces the due date.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(Some(due_date));
        self
    }

    /// Removes the due date.
    #[must_use]
    pub const fn clear_due_date(mut self) -> Self {
        self.due_date = Some(None);
        self
    }

    /// Replaces the narrative of the state before the work.
    #[must_use]
    pub fn with_description_before(mut self, text: impl Into<String>) -> Self {
        self.description_before = Some(Some(text.into()));
        self
    }

    /// Replaces the narrative of the state after the work.
    #[must_use]
    pub fn with_description_after(mut self, text: impl Into<String>) -> Self {
        self.description_after = Some(Some(text.into()));
        self
    }

    /// Removes both review narratives.
    #[must_use]
    pub fn clear_review_narrative(mut self) -> Self {
        self.description_before = Some(None);
        self.description_after = Some(None);
        self
    }

    /// Adds attachments, stored under the creation category.
    #[must_use]
    pub fn with_attachments(
        mut self,
        uploads: impl IntoIterator<Item = AttachmentUpload>,
    ) -> Self {
        self.attachments.extend(uploads);
        self
    }
}

/// Narrative and evidence submitted when a task enters review.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewSubmission {
    pub(crate) description_before: Option<String>,
    pub(crate) description_after: Option<String>,
    pub(crate) attachments: Vec<AttachmentUpload>,
}

impl ReviewSubmission {
    /// Creates a submission with both narratives.
    #[must_use]
    pub fn new(
        description_before: impl Into<String>,
        description_after: impl Into<String>,
    ) -> Self {
        Self {
            description_before: Some(description_before.into()),
            description_after: Some(description_after.into()),
            attachments: Vec::new(),
        }
    }

    /// Adds review attachments.
    #[must_use]
    pub fn with_attachments(
        mut self,
        uploads: impl IntoIterator<Item = AttachmentUpload>,
    ) -> Self {
        self.attachments.extend(uploads);
        self
    }
}
