//! Adapters implementing the task ports.
//!
//! - [`memory`]: thread-safe in-memory implementations of every port, used by
//!   tests and local runs
//! - [`postgres`]: Diesel-backed task repository and project directory
//! - [`filesystem`]: attachment storage rooted in a capability-scoped
//!   directory

mod attachment_rules;
pub mod filesystem;
pub mod memory;
pub mod postgres;
