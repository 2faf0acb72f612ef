//! Port contracts for the task lifecycle engine.
//!
//! Ports define infrastructure-agnostic interfaces used by task services.

pub mod project;
pub mod repository;
pub mod storage;

pub use project::{ProjectDirectory, ProjectDirectoryError, ProjectDirectoryResult};
pub use repository::{TaskRepository, TaskRepositoryError, TaskRepositoryResult};
pub use storage::{AttachmentStorage, AttachmentStorageError, AttachmentStorageResult};
