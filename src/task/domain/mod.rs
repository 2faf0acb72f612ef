//! Domain model for the task lifecycle and two-stage approval engine.
//!
//! The domain keeps execution status, approval status, task codes and
//! attachment metadata free of infrastructure concerns.

mod approval;
mod attachment;
mod code;
mod error;
mod ids;
mod query;
mod status;
mod task;

pub use approval::{
    ApprovalDecision, ApprovalOrdering, ApprovalPipeline, ApprovalResolution, ApprovalSequence,
    ApprovalSlot, PersistedApprovalSlotData, SlotWrite,
};
pub use attachment::{AttachmentUpload, StoredAttachment, TaskFile};
pub use code::{ProjectCode, TaskCode};
pub use error::{ParseReferenceError, TaskDomainError};
pub use ids::{ApprovalSlotId, ProjectId, ReferenceId, TaskFileId, TaskId, TenantId, UserId};
pub use query::{ListMode, TaskListQuery, TaskPage};
pub use status::{ApprovalStatus, AttachmentCategory, ExecutionStatus, SlotStatus};
pub use task::{NewTaskData, PersistedTaskData, Task, TaskPatch, TaskTitle};
