//! Shared world state for task approval BDD scenarios.

use std::sync::Arc;

use mockable::DefaultClock;
use permitdesk::config::EngineConfig;
use permitdesk::task::{
    adapters::memory::{InMemoryAttachmentStorage, InMemoryProjectDirectory, InMemoryTaskRepository},
    domain::{ApprovalSequence, ApprovalSlotId, ProjectId, ReferenceId, Task, TenantId, UserId},
    services::{TaskLifecycleError, TaskLifecycleService},
};
use rstest::fixture;

/// Service type used by the BDD world.
pub type TestTaskService = TaskLifecycleService<
    InMemoryTaskRepository,
    InMemoryProjectDirectory,
    InMemoryAttachmentStorage,
    DefaultClock,
>;

/// Scenario world for task approval behaviour tests.
pub struct TaskApprovalWorld {
    pub service: TestTaskService,
    pub projects: Arc<InMemoryProjectDirectory>,
    pub tenant: TenantId,
    pub project: ProjectId,
    pub requester: UserId,
    pub priority: ReferenceId,
    pub last_task: Option<Task>,
    pub last_error: Option<TaskLifecycleError>,
}

impl TaskApprovalWorld {
    /// Creates a world with an empty tenant.
    ///
    /// # Panics
    ///
    /// Panics if the fixed identifiers are invalid.
    #[must_use]
    pub fn new() -> Self {
        let projects = Arc::new(InMemoryProjectDirectory::new());
        let service = TaskLifecycleService::new(
            Arc::new(InMemoryTaskRepository::new()),
            Arc::clone(&projects),
            Arc::new(InMemoryAttachmentStorage::default()),
            Arc::new(DefaultClock),
            &EngineConfig::default(),
        );

        Self {
            service,
            projects,
            tenant: TenantId::new(1).expect("valid tenant"),
            project: ProjectId::new(1).expect("valid project"),
            requester: UserId::new(10).expect("valid user"),
            priority: ReferenceId::new(2).expect("valid priority"),
            last_task: None,
            last_error: None,
        }
    }

    /// Returns the task the scenario is working on.
    ///
    /// # Errors
    ///
    /// Returns an error if no task has been created yet.
    pub fn task(&self) -> Result<&Task, eyre::Report> {
        self.last_task
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing task in scenario world"))
    }

    /// Returns the slot id at a 1-based approval stage.
    ///
    /// # Errors
    ///
    /// Returns an error if no task exists or the stage is not 1 or 2.
    pub fn slot_id(&self, stage: i16) -> Result<ApprovalSlotId, eyre::Report> {
        let sequence = ApprovalSequence::try_from(stage)
            .map_err(|value| eyre::eyre!("approval stage {value} does not exist"))?;
        Ok(self.task()?.approvals().at(sequence).id())
    }

    /// Returns the user acting at a 1-based approval stage.
    ///
    /// # Errors
    ///
    /// Returns an error if the derived identifier is invalid.
    pub fn approver(stage: i16) -> Result<UserId, eyre::Report> {
        Ok(UserId::new(100 + i64::from(stage))?)
    }
}

impl Default for TaskApprovalWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> TaskApprovalWorld {
    TaskApprovalWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
