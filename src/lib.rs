//! Permitdesk: multi-tenant task lifecycle and two-stage approval engine.
//!
//! Tasks belong to a tenant and a project, carry a generated
//! `{project}-TASK-{n}` code and move through an execution status while a
//! separate two-slot pipeline tracks approval. Attachments are stored as
//! blobs with metadata rows linked to the task.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for persistence, project lookup
//!   and blob storage
//! - **Adapters**: In-memory, filesystem and `PostgreSQL` implementations
//!
//! # Modules
//!
//! - [`config`]: Engine settings loaded from the environment
//! - [`task`]: Task lifecycle, approvals and attachments

pub mod config;
pub mod task;
