//! `PostgreSQL` adapters for task lifecycle persistence.
//!
//! The tables are created by the SQL migrations under `migrations/`.

mod models;
mod project;
mod repository;
mod schema;

pub use project::PostgresProjectDirectory;
pub use repository::{PostgresTaskRepository, TaskPgPool};
