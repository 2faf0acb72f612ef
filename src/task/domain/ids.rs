//! Identifier types for the task domain.
//!
//! Identifiers minted by this crate are UUID newtypes. Identifiers owned by
//! the surrounding system (tenants, users, projects and lookup rows) arrive
//! as opaque positive integers and are wrapped without interpretation.

use super::TaskDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the wrapped UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

macro_rules! external_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a positive identifier.
            ///
            /// # Errors
            ///
            /// Returns [`TaskDomainError::InvalidIdentifier`] when the value
            /// is zero or negative.
            pub const fn new(value: i64) -> Result<Self, TaskDomainError> {
                if value <= 0 {
                    return Err(TaskDomainError::InvalidIdentifier { kind: $kind, value });
                }
                Ok(Self(value))
            }

            /// Returns the raw identifier.
            #[must_use]
            pub const fn value(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a task record.
    TaskId
);

uuid_id!(
    /// Unique identifier for one approval slot.
    ApprovalSlotId
);

uuid_id!(
    /// Unique identifier for a task attachment row.
    TaskFileId
);

external_id!(
    /// Tenant ("domain") boundary supplied by the auth layer.
    TenantId,
    "tenant"
);

external_id!(
    /// Acting or referenced user.
    UserId,
    "user"
);

external_id!(
    /// Owning project.
    ProjectId,
    "project"
);

external_id!(
    /// Row in the external lookup table (priority, type or stack).
    ReferenceId,
    "reference"
);
