//! In-memory repository for task lifecycle tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::task::{
    domain::{
        ApprovalResolution, ApprovalSequence, ApprovalSlot, ProjectId, Task, TaskCode, TaskId,
        TaskListQuery, TaskPage, TaskPatch, TenantId,
    },
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};

/// Thread-safe in-memory task repository.
///
/// Soft-deleted tasks stay in the store so their codes are never reissued.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: HashMap<TaskId, Task>,
    code_index: HashMap<(TenantId, TaskCode), TaskId>,
    sequences: HashMap<(TenantId, ProjectId), u32>,
}

impl InMemoryTaskState {
    fn live(&self, tenant: TenantId, id: TaskId) -> Option<&Task> {
        self.tasks
            .get(&id)
            .filter(|task| task.tenant_id() == tenant && !task.is_deleted())
    }

    fn live_mut(&mut self, tenant: TenantId, id: TaskId) -> TaskRepositoryResult<&mut Task> {
        self.tasks
            .get_mut(&id)
            .filter(|task| task.tenant_id() == tenant && !task.is_deleted())
            .ok_or(TaskRepositoryError::NotFound(id))
    }
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a stored task whether or not it has been soft deleted.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::Persistence`] if the lock is poisoned.
    pub fn raw_task(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        Ok(self.read()?.tasks.get(&id).cloned())
    }

    /// Overrides the last issued code sequence for a project.
    ///
    /// Rewinding the counter makes the next allocation collide with an
    /// existing code.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::Persistence`] if the lock is poisoned.
    pub fn set_code_sequence(
        &self,
        tenant: TenantId,
        project: ProjectId,
        last_issued: u32,
    ) -> TaskRepositoryResult<()> {
        self.write()?.sequences.insert((tenant, project), last_issued);
        Ok(())
    }

    fn read(&self) -> TaskRepositoryResult<RwLockReadGuard<'_, InMemoryTaskState>> {
        self.state.read().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> TaskRepositoryResult<RwLockWriteGuard<'_, InMemoryTaskState>> {
        self.state.write().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn next_code_sequence(
        &self,
        tenant: TenantId,
        project: ProjectId,
    ) -> TaskRepositoryResult<u32> {
        let mut state = self.write()?;
        let seed = state
            .tasks
            .values()
            .filter(|task| task.tenant_id() == tenant && task.project_id() == project)
            .count();
        let seeded = u32::try_from(seed).map_err(TaskRepositoryError::persistence)?;
        let counter = state.sequences.entry((tenant, project)).or_insert(seeded);
        *counter = counter.checked_add(1).ok_or_else(|| {
            TaskRepositoryError::persistence(std::io::Error::other(
                "task code sequence exhausted",
            ))
        })?;
        Ok(*counter)
    }

    async fn create_with_approval_slots(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        if state.tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }

        let code_key = (task.tenant_id(), task.code().clone());
        if state.code_index.contains_key(&code_key) {
            return Err(TaskRepositoryError::DuplicateCode(task.code().clone()));
        }

        state.code_index.insert(code_key, task.id());
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        tenant: TenantId,
        id: TaskId,
    ) -> TaskRepositoryResult<Option<Task>> {
        let state = self.read()?;
        Ok(state.live(tenant, id).cloned())
    }

    async fn find_by_code(
        &self,
        tenant: TenantId,
        code: &TaskCode,
    ) -> TaskRepositoryResult<Option<Task>> {
        let state = self.read()?;
        let task = state
            .code_index
            .get(&(tenant, code.clone()))
            .and_then(|id| state.live(tenant, *id))
            .cloned();
        Ok(task)
    }

    async fn list(
        &self,
        tenant: TenantId,
        query: &TaskListQuery,
    ) -> TaskRepositoryResult<TaskPage> {
        let state = self.read()?;
        let mut matching: Vec<&Task> = state
            .tasks
            .values()
            .filter(|task| task.tenant_id() == tenant && query.matches(task))
            .collect();
        matching.sort_by(|left, right| {
            right
                .created_at()
                .cmp(&left.created_at())
                .then_with(|| right.code().cmp(left.code()))
        });

        let total = u64::try_from(matching.len()).map_err(TaskRepositoryError::persistence)?;
        let skip = usize::try_from(query.offset()).map_err(TaskRepositoryError::persistence)?;
        let take = usize::try_from(query.limit()).map_err(TaskRepositoryError::persistence)?;
        let items = matching
            .into_iter()
            .skip(skip)
            .take(take)
            .cloned()
            .collect();

        Ok(TaskPage {
            items,
            total,
            page: query.page(),
            limit: query.limit(),
        })
    }

    async fn update_fields(
        &self,
        tenant: TenantId,
        id: TaskId,
        patch: &TaskPatch,
    ) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        state.live_mut(tenant, id)?.apply_patch(patch);
        Ok(())
    }

    async fn soft_delete(
        &self,
        tenant: TenantId,
        id: TaskId,
        deleted_at: DateTime<Utc>,
    ) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        state.live_mut(tenant, id)?.mark_deleted(deleted_at);
        Ok(())
    }

    async fn list_approval_slots(
        &self,
        task_id: TaskId,
    ) -> TaskRepositoryResult<Vec<ApprovalSlot>> {
        let state = self.read()?;
        Ok(state
            .tasks
            .get(&task_id)
            .map(|task| {
                task.approvals()
                    .slots()
                    .into_iter()
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find_approval_slot(
        &self,
        task_id: TaskId,
        sequence: ApprovalSequence,
    ) -> TaskRepositoryResult<Option<ApprovalSlot>> {
        let state = self.read()?;
        Ok(state
            .tasks
            .get(&task_id)
            .map(|task| task.approvals().at(sequence).clone()))
    }

    async fn update_approval_slots(
        &self,
        tenant: TenantId,
        resolution: &ApprovalResolution,
    ) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        let task = state.live_mut(tenant, resolution.task_id)?;

        for write in &resolution.slot_writes {
            let current = task.approvals().at(write.slot.sequence());
            if current.id() != write.slot.id() || current.status() != write.expected {
                return Err(TaskRepositoryError::SlotConflict(write.slot.id()));
            }
        }

        task.apply_approval(resolution);
        Ok(())
    }
}
