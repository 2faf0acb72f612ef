//! Application services for task lifecycle orchestration.

mod approval;
mod attachments;
mod code;
mod error;
mod lifecycle;
mod requests;

pub use approval::ApprovalSequencer;
pub use code::CodeGenerator;
pub use error::{ErrorKind, TaskLifecycleError, TaskLifecycleResult};
pub use lifecycle::TaskLifecycleService;
pub use requests::{CreateTaskRequest, ReviewSubmission, UpdateTaskRequest};
