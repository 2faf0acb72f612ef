//! In-memory adapters for the task ports.

mod project;
mod storage;
mod task;

pub use project::InMemoryProjectDirectory;
pub use storage::InMemoryAttachmentStorage;
pub use task::InMemoryTaskRepository;
