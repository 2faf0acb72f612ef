//! Service-level error type and its stable classification.

use crate::task::{
    domain::{ProjectId, TaskCode, TaskDomainError, TaskId},
    ports::{AttachmentStorageError, ProjectDirectoryError, TaskRepositoryError},
};
use std::fmt;
use thiserror::Error;

/// Stable classification of lifecycle failures, for mapping onto transport
/// status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required field is missing or invalid.
    Validation,
    /// The task, project or approval slot is absent or not visible to the
    /// tenant.
    NotFound,
    /// The approval slot has already been resolved.
    AlreadyResolved,
    /// No unique task code could be allocated.
    Conflict,
    /// The persistence collaborator failed.
    Storage,
    /// An attachment could not be validated or saved.
    Attachment,
    /// Stage two was resolved before stage one under strict ordering.
    OutOfOrder,
}

impl ErrorKind {
    /// Returns the snake-case name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::AlreadyResolved => "already_resolved",
            Self::Conflict => "conflict",
            Self::Storage => "storage",
            Self::Attachment => "attachment",
            Self::OutOfOrder => "out_of_order",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Service-level errors for task lifecycle operations.
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// No live task with this identifier exists for the tenant.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    /// No live task with this code exists for the tenant.
    #[error("task not found: {0}")]
    TaskCodeNotFound(TaskCode),
    /// The project does not exist for the tenant.
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),
    /// Every allocated code collided with an existing task.
    #[error("could not allocate a unique task code for project {project} after {attempts} attempts")]
    CodeConflict {
        /// Project the task was created in.
        project: ProjectId,
        /// Codes tried.
        attempts: u32,
    },
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
    /// Project lookup failed.
    #[error(transparent)]
    Project(#[from] ProjectDirectoryError),
    /// Attachment storage failed.
    #[error(transparent)]
    Attachment(#[from] AttachmentStorageError),
}

impl TaskLifecycleError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(err) => match err {
                TaskDomainError::ApprovalSlotNotFound { .. } => ErrorKind::NotFound,
                TaskDomainError::SlotAlreadyResolved { .. } => ErrorKind::AlreadyResolved,
                TaskDomainError::ApprovalOutOfOrder(_) => ErrorKind::OutOfOrder,
                TaskDomainError::MalformedApprovalPipeline { .. } => ErrorKind::Storage,
                _ => ErrorKind::Validation,
            },
            Self::TaskNotFound(_) | Self::TaskCodeNotFound(_) | Self::ProjectNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::CodeConflict { .. } => ErrorKind::Conflict,
            Self::Repository(err) => match err {
                TaskRepositoryError::NotFound(_) => ErrorKind::NotFound,
                TaskRepositoryError::SlotConflict(_) => ErrorKind::AlreadyResolved,
                TaskRepositoryError::DuplicateCode(_) | TaskRepositoryError::DuplicateTask(_) => {
                    ErrorKind::Conflict
                }
                TaskRepositoryError::Persistence(_) => ErrorKind::Storage,
            },
            Self::Project(_) => ErrorKind::Storage,
            Self::Attachment(_) => ErrorKind::Attachment,
        }
    }
}

/// Result type for task lifecycle service operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;
