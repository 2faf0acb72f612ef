//! Task lifecycle and approval management.
//!
//! Tasks are created with a unique code and two waiting approval slots,
//! edited field by field, moved through review and revision, approved or
//! rejected stage by stage, and soft deleted. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
