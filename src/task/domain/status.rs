//! Reference-backed status and category values.
//!
//! The wider system stores these as rows of a generic reference table; the
//! numeric ids below are the rows this engine relies on.

use super::ParseReferenceError;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! reference_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident = $id:literal => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Returns the reference-table id for this value.
            #[must_use]
            pub const fn reference_id(self) -> i64 {
                match self {
                    $( Self::$variant => $id ),+
                }
            }

            /// Returns the canonical textual representation.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $text ),+
                }
            }
        }

        impl TryFrom<i64> for $name {
            type Error = ParseReferenceError;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                match value {
                    $( $id => Ok(Self::$variant), )+
                    _ => Err(ParseReferenceError { kind: $kind, value }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

reference_enum!(
    /// Where a task is in its work lifecycle.
    ExecutionStatus, "execution status" {
        /// Not started.
        ToDo = 1 => "to_do",
        /// Parked.
        OnHold = 2 => "on_hold",
        /// Being worked on.
        OnProgress = 3 => "on_progress",
        /// Finished.
        Done = 4 => "done",
        /// Waiting for review of the delivered work.
        InReview = 37 => "in_review",
        /// Sent back for correction.
        Revision = 39 => "revision",
    }
);

reference_enum!(
    /// Aggregate outcome of the two-stage sign-off pipeline.
    ApprovalStatus, "approval status" {
        /// Neither stage has signed off.
        Waiting = 20 => "waiting",
        /// One of the stages rejected the task.
        Rejected = 21 => "rejected",
        /// Both stages approved the task.
        Approved = 22 => "approved",
        /// Stage one approved; stage two has not decided.
        PendingSecondApproval = 23 => "pending_second_approval",
    }
);

reference_enum!(
    /// Outcome recorded on a single approval slot.
    SlotStatus, "approval slot status" {
        /// Not yet decided.
        Waiting = 20 => "waiting",
        /// Rejected by the approver.
        Rejected = 21 => "rejected",
        /// Approved by the approver.
        Approved = 22 => "approved",
    }
);

reference_enum!(
    /// Why a file was attached to a task.
    AttachmentCategory, "attachment category" {
        /// Uploaded with the task at creation or edit time.
        Creation = 30 => "creation",
        /// Before/after evidence uploaded when entering review.
        Review = 31 => "review",
        /// Uploaded when a correction cycle starts.
        Revision = 38 => "revision",
    }
);

impl SlotStatus {
    /// Returns `true` once the slot has been approved or rejected.
    #[must_use]
    pub const fn is_resolved(self) -> bool {
        !matches!(self, Self::Waiting)
    }
}
