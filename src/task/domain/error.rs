//! Error types for task domain validation and parsing.

use super::{ApprovalSlotId, SlotStatus, TaskId};
use thiserror::Error;

/// Errors returned while constructing or mutating domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// An externally supplied identifier is not a positive integer.
    #[error("invalid {kind} identifier {value}, expected a positive integer")]
    InvalidIdentifier {
        /// Identifier family, for example `tenant` or `project`.
        kind: &'static str,
        /// Rejected raw value.
        value: i64,
    },

    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The task title exceeds the storage limit.
    #[error("task title exceeds {max} characters (got {actual})")]
    TitleTooLong {
        /// Maximum accepted length.
        max: usize,
        /// Length of the rejected title.
        actual: usize,
    },

    /// The project short code is empty, too long or contains whitespace.
    #[error("invalid project code '{0}'")]
    InvalidProjectCode(String),

    /// The task code does not follow `{project}-TASK-{n}`.
    #[error("invalid task code '{0}'")]
    InvalidTaskCode(String),

    /// An attachment upload has no file name.
    #[error("attachment file name must not be empty")]
    EmptyFileName,

    /// The requested approval slot does not belong to the task.
    #[error("approval slot {slot_id} not found on task {task_id}")]
    ApprovalSlotNotFound {
        /// Owning task.
        task_id: TaskId,
        /// Requested slot.
        slot_id: ApprovalSlotId,
    },

    /// The approval slot has already been approved or rejected.
    #[error("approval slot {slot_id} is already resolved as {status}")]
    SlotAlreadyResolved {
        /// Resolved slot.
        slot_id: ApprovalSlotId,
        /// Outcome recorded on the slot.
        status: SlotStatus,
    },

    /// The second approval stage was resolved before the first.
    #[error("task {0} must be resolved at approval stage 1 before stage 2")]
    ApprovalOutOfOrder(TaskId),

    /// Persisted approval slots do not form the sequence-1/sequence-2 pair.
    #[error("task {task_id} has a malformed approval pipeline ({found} slots)")]
    MalformedApprovalPipeline {
        /// Owning task.
        task_id: TaskId,
        /// Number of slots found.
        found: usize,
    },

    /// Page numbers start at one.
    #[error("page must be at least 1 (got {0})")]
    InvalidPage(u32),

    /// Page size is outside the accepted range.
    #[error("limit must be between 1 and {max} (got {actual})")]
    InvalidLimit {
        /// Largest accepted page size.
        max: u32,
        /// Rejected page size.
        actual: u32,
    },

    /// The creation-date range ends before it starts.
    #[error("creation-date range ends before it starts")]
    InvalidDateRange,
}

/// Error returned while parsing reference-backed values from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind} reference id: {value}")]
pub struct ParseReferenceError {
    /// Value family, for example `execution status`.
    pub kind: &'static str,
    /// Unrecognised reference id.
    pub value: i64,
}
