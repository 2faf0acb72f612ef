//! Step definitions for task approval scenarios.

pub mod then;
pub mod world;
