//! Shared fixtures for in-memory lifecycle tests.

use std::sync::Arc;

use mockable::DefaultClock;
use permitdesk::config::EngineConfig;
use permitdesk::task::{
    adapters::memory::{InMemoryAttachmentStorage, InMemoryProjectDirectory, InMemoryTaskRepository},
    domain::{ProjectCode, ProjectId, ReferenceId, Task, TenantId, UserId},
    services::{CreateTaskRequest, TaskLifecycleService},
};
use rstest::fixture;

/// Service type wired to in-memory adapters.
pub type TestService = TaskLifecycleService<
    InMemoryTaskRepository,
    InMemoryProjectDirectory,
    InMemoryAttachmentStorage,
    DefaultClock,
>;

/// A wired service together with handles on its adapters.
pub struct Engine {
    pub service: TestService,
    pub repository: Arc<InMemoryTaskRepository>,
    pub storage: Arc<InMemoryAttachmentStorage>,
    pub tenant: TenantId,
    pub other_tenant: TenantId,
    pub project: ProjectId,
    pub ops_project: ProjectId,
    pub requester: UserId,
    pub first_approver: UserId,
    pub second_approver: UserId,
    pub priority: ReferenceId,
}

impl Engine {
    /// Builds an engine with the given configuration.
    ///
    /// # Panics
    ///
    /// Panics if fixture identifiers are invalid.
    #[must_use]
    pub fn with_config(config: &EngineConfig) -> Self {
        let tenant = TenantId::new(1).expect("valid tenant");
        let other_tenant = TenantId::new(2).expect("valid tenant");
        let project = ProjectId::new(10).expect("valid project");
        let ops_project = ProjectId::new(11).expect("valid project");

        let projects = Arc::new(InMemoryProjectDirectory::new());
        for (owner, id, code) in [
            (tenant, project, "ENG"),
            (tenant, ops_project, "OPS"),
            (other_tenant, project, "ENG"),
        ] {
            projects
                .insert(owner, id, ProjectCode::new(code).expect("valid project code"))
                .expect("project registration");
        }

        let repository = Arc::new(InMemoryTaskRepository::new());
        let storage = Arc::new(InMemoryAttachmentStorage::new(config.attachments.clone()));
        let service = TaskLifecycleService::new(
            Arc::clone(&repository),
            projects,
            Arc::clone(&storage),
            Arc::new(DefaultClock),
            config,
        );

        Self {
            service,
            repository,
            storage,
            tenant,
            other_tenant,
            project,
            ops_project,
            requester: UserId::new(100).expect("valid user"),
            first_approver: UserId::new(200).expect("valid user"),
            second_approver: UserId::new(300).expect("valid user"),
            priority: ReferenceId::new(5).expect("valid priority"),
        }
    }

    /// Builds a request for a task in the default project.
    #[must_use]
    pub fn request(&self, title: &str) -> CreateTaskRequest {
        CreateTaskRequest::new(self.project, title, self.priority)
    }

    /// Creates a task in the default project.
    ///
    /// # Errors
    ///
    /// Returns an error if creation fails.
    pub async fn create(&self, title: &str) -> Result<Task, eyre::Report> {
        Ok(self
            .service
            .create(self.tenant, self.requester, self.request(title))
            .await?)
    }
}

/// Provides an engine with default configuration.
#[fixture]
pub fn engine() -> Engine {
    Engine::with_config(&EngineConfig::default())
}

/// Provides an engine that requires stage one before stage two.
#[fixture]
pub fn strict_engine() -> Engine {
    let config = EngineConfig {
        enforce_approval_order: true,
        ..EngineConfig::default()
    };
    Engine::with_config(&config)
}
