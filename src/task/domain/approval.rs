//! Two-stage sequential approval pipeline.
//!
//! Every task owns exactly two approval slots. Stage one acts as a gate:
//! rejecting it closes both slots, while rejecting stage two leaves the
//! stage-one outcome in place for audit. The pipeline computes an
//! [`ApprovalResolution`] describing every slot write and the resulting
//! aggregate [`ApprovalStatus`]; callers persist it as one unit.

use super::{ApprovalSlotId, ApprovalStatus, SlotStatus, TaskDomainError, TaskId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Position of a slot in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalSequence {
    /// Stage one, the gate.
    First,
    /// Stage two, the final sign-off.
    Second,
}

impl ApprovalSequence {
    /// Returns the persisted sequence number (1 or 2).
    #[must_use]
    pub const fn value(self) -> i16 {
        match self {
            Self::First => 1,
            Self::Second => 2,
        }
    }
}

impl TryFrom<i16> for ApprovalSequence {
    type Error = i16;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::First),
            2 => Ok(Self::Second),
            other => Err(other),
        }
    }
}

/// Decision an approver makes on a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalDecision {
    /// Sign off.
    Approve,
    /// Send the task back.
    Reject,
}

impl ApprovalDecision {
    const fn slot_status(self) -> SlotStatus {
        match self {
            Self::Approve => SlotStatus::Approved,
            Self::Reject => SlotStatus::Rejected,
        }
    }
}

/// Whether stage two may be resolved while stage one is still waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApprovalOrdering {
    /// Slots may be resolved in any order.
    #[default]
    Lenient,
    /// Stage one must be resolved before stage two.
    Sequential,
}

/// One slot in the two-stage pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalSlot {
    id: ApprovalSlotId,
    task_id: TaskId,
    sequence: ApprovalSequence,
    approved_by: Option<UserId>,
    status: SlotStatus,
    approval_date: Option<DateTime<Utc>>,
    note: Option<String>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted approval slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedApprovalSlotData {
    /// Slot identifier.
    pub id: ApprovalSlotId,
    /// Owning task.
    pub task_id: TaskId,
    /// Pipeline position.
    pub sequence: ApprovalSequence,
    /// Approver who resolved the slot.
    pub approved_by: Option<UserId>,
    /// Recorded outcome.
    pub status: SlotStatus,
    /// Resolution timestamp.
    pub approval_date: Option<DateTime<Utc>>,
    /// Approver note.
    pub note: Option<String>,
    /// Soft usability flag.
    pub active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl ApprovalSlot {
    fn waiting(task_id: TaskId, sequence: ApprovalSequence, at: DateTime<Utc>) -> Self {
        Self {
            id: ApprovalSlotId::new(),
            task_id,
            sequence,
            approved_by: None,
            status: SlotStatus::Waiting,
            approval_date: None,
            note: None,
            active: true,
            created_at: at,
            updated_at: at,
        }
    }

    /// Reconstructs a slot from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedApprovalSlotData) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            sequence: data.sequence,
            approved_by: data.approved_by,
            status: data.status,
            approval_date: data.approval_date,
            note: data.note,
            active: data.active,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the slot identifier.
    #[must_use]
    pub const fn id(&self) -> ApprovalSlotId {
        self.id
    }

    /// Returns the owning task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the pipeline position.
    #[must_use]
    pub const fn sequence(&self) -> ApprovalSequence {
        self.sequence
    }

    /// Returns the approver who resolved the slot, if any.
    #[must_use]
    pub const fn approved_by(&self) -> Option<UserId> {
        self.approved_by
    }

    /// Returns the recorded outcome.
    #[must_use]
    pub const fn status(&self) -> SlotStatus {
        self.status
    }

    /// Returns when the slot was resolved, if it has been.
    #[must_use]
    pub const fn approval_date(&self) -> Option<DateTime<Utc>> {
        self.approval_date
    }

    /// Returns the approver note.
    #[must_use]
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    /// Returns the soft usability flag.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn resolved(
        &self,
        status: SlotStatus,
        approver: UserId,
        note: Option<&str>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            approved_by: Some(approver),
            status,
            approval_date: Some(at),
            note: note.map(str::to_owned),
            updated_at: at,
            ..self.clone()
        }
    }
}

/// A single compare-and-swap slot write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotWrite {
    /// Slot state after the write.
    pub slot: ApprovalSlot,
    /// Status the slot must still hold for the write to apply.
    pub expected: SlotStatus,
}

/// Everything one approve or reject call changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalResolution {
    /// Owning task.
    pub task_id: TaskId,
    /// Slot the caller resolved.
    pub slot_id: ApprovalSlotId,
    /// Position of that slot.
    pub sequence: ApprovalSequence,
    /// Decision taken.
    pub decision: ApprovalDecision,
    /// Slot writes, in sequence order.
    pub slot_writes: Vec<SlotWrite>,
    /// Aggregate approval status the task moves to.
    pub task_status: ApprovalStatus,
    /// Set when the task became fully approved.
    pub final_approval: Option<(UserId, DateTime<Utc>)>,
    /// Acting approver.
    pub actor: UserId,
    /// Resolution timestamp.
    pub resolved_at: DateTime<Utc>,
}

/// The pair of approval slots owned by a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalPipeline {
    first: ApprovalSlot,
    second: ApprovalSlot,
}

impl ApprovalPipeline {
    /// Seeds two waiting slots for a new task.
    #[must_use]
    pub fn seed(task_id: TaskId, at: DateTime<Utc>) -> Self {
        Self {
            first: ApprovalSlot::waiting(task_id, ApprovalSequence::First, at),
            second: ApprovalSlot::waiting(task_id, ApprovalSequence::Second, at),
        }
    }

    /// Rebuilds the pipeline from persisted slots.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::MalformedApprovalPipeline`] unless the
    /// slots are exactly one sequence-1 and one sequence-2 slot owned by
    /// `task_id`.
    pub fn from_slots(
        task_id: TaskId,
        slots: impl IntoIterator<Item = ApprovalSlot>,
    ) -> Result<Self, TaskDomainError> {
        let collected: Vec<ApprovalSlot> = slots.into_iter().collect();
        let found = collected.len();
        let malformed = TaskDomainError::MalformedApprovalPipeline { task_id, found };
        if found != 2 || collected.iter().any(|slot| slot.task_id != task_id) {
            return Err(malformed);
        }

        let mut first = None;
        let mut second = None;
        for slot in collected {
            match slot.sequence {
                ApprovalSequence::First => first = Some(slot),
                ApprovalSequence::Second => second = Some(slot),
            }
        }
        match (first, second) {
            (Some(first_slot), Some(second_slot)) => Ok(Self {
                first: first_slot,
                second: second_slot,
            }),
            _ => Err(malformed),
        }
    }

    /// Returns the stage-one slot.
    #[must_use]
    pub const fn first(&self) -> &ApprovalSlot {
        &self.first
    }

    /// Returns the stage-two slot.
    #[must_use]
    pub const fn second(&self) -> &ApprovalSlot {
        &self.second
    }

    /// Returns both slots in sequence order.
    #[must_use]
    pub const fn slots(&self) -> [&ApprovalSlot; 2] {
        [&self.first, &self.second]
    }

    /// Finds a slot by identifier.
    #[must_use]
    pub fn find(&self, slot_id: ApprovalSlotId) -> Option<&ApprovalSlot> {
        self.slots().into_iter().find(|slot| slot.id == slot_id)
    }

    /// Returns the slot at the given position.
    #[must_use]
    pub const fn at(&self, sequence: ApprovalSequence) -> &ApprovalSlot {
        match sequence {
            ApprovalSequence::First => &self.first,
            ApprovalSequence::Second => &self.second,
        }
    }

    /// Computes the writes for resolving `slot_id` with `decision`.
    ///
    /// The pipeline itself is not modified; apply the returned resolution
    /// once it has been persisted.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::ApprovalSlotNotFound`] when the slot does
    /// not belong to this pipeline, [`TaskDomainError::SlotAlreadyResolved`]
    /// when it is no longer waiting, and
    /// [`TaskDomainError::ApprovalOutOfOrder`] when sequential ordering is
    /// required and stage one is still waiting.
    pub fn resolve(
        &self,
        slot_id: ApprovalSlotId,
        decision: ApprovalDecision,
        approver: UserId,
        note: Option<&str>,
        at: DateTime<Utc>,
        ordering: ApprovalOrdering,
    ) -> Result<ApprovalResolution, TaskDomainError> {
        let task_id = self.first.task_id;
        let target = self
            .find(slot_id)
            .ok_or(TaskDomainError::ApprovalSlotNotFound { task_id, slot_id })?;
        if target.status.is_resolved() {
            return Err(TaskDomainError::SlotAlreadyResolved {
                slot_id,
                status: target.status,
            });
        }
        if ordering == ApprovalOrdering::Sequential
            && target.sequence == ApprovalSequence::Second
            && !self.first.status.is_resolved()
        {
            return Err(TaskDomainError::ApprovalOutOfOrder(task_id));
        }

        let new_status = decision.slot_status();
        let write_for = |slot: &ApprovalSlot| SlotWrite {
            slot: slot.resolved(new_status, approver, note, at),
            expected: slot.status,
        };

        let (slot_writes, task_status) = match (target.sequence, decision) {
            (ApprovalSequence::First, ApprovalDecision::Approve) => {
                // A stage two outcome reached first under lenient ordering stands.
                let status = match self.second.status {
                    SlotStatus::Approved => ApprovalStatus::Approved,
                    SlotStatus::Rejected => ApprovalStatus::Rejected,
                    SlotStatus::Waiting => ApprovalStatus::PendingSecondApproval,
                };
                (vec![write_for(&self.first)], status)
            }
            (ApprovalSequence::Second, ApprovalDecision::Approve) => {
                (vec![write_for(&self.second)], ApprovalStatus::Approved)
            }
            (ApprovalSequence::First, ApprovalDecision::Reject) => (
                vec![write_for(&self.first), write_for(&self.second)],
                ApprovalStatus::Rejected,
            ),
            (ApprovalSequence::Second, ApprovalDecision::Reject) => {
                (vec![write_for(&self.second)], ApprovalStatus::Rejected)
            }
        };

        let final_approval =
            (task_status == ApprovalStatus::Approved).then_some((approver, at));

        Ok(ApprovalResolution {
            task_id,
            slot_id,
            sequence: target.sequence,
            decision,
            slot_writes,
            task_status,
            final_approval,
            actor: approver,
            resolved_at: at,
        })
    }

    /// Applies persisted slot writes to this pipeline.
    pub fn apply(&mut self, resolution: &ApprovalResolution) {
        for write in &resolution.slot_writes {
            match write.slot.sequence {
                ApprovalSequence::First => self.first = write.slot.clone(),
                ApprovalSequence::Second => self.second = write.slot.clone(),
            }
        }
    }
}
