//! Task code generation.

use super::error::{TaskLifecycleError, TaskLifecycleResult};
use crate::task::{
    domain::{ProjectCode, ProjectId, TaskCode, TenantId},
    ports::{ProjectDirectory, TaskRepository},
};
use std::sync::Arc;
use tracing::debug;

/// Derives `{project_code}-TASK-{n}` codes from an atomic per-project
/// counter.
///
/// The counter only makes collisions unlikely; uniqueness is still enforced
/// by the repository when the task is inserted.
#[derive(Clone)]
pub struct CodeGenerator<R, P>
where
    R: TaskRepository,
    P: ProjectDirectory,
{
    repository: Arc<R>,
    projects: Arc<P>,
    width: usize,
}

impl<R, P> CodeGenerator<R, P>
where
    R: TaskRepository,
    P: ProjectDirectory,
{
    /// Creates a generator padding numbers to `width` digits.
    #[must_use]
    pub const fn new(repository: Arc<R>, projects: Arc<P>, width: usize) -> Self {
        Self {
            repository,
            projects,
            width,
        }
    }

    /// Resolves the short code of a project.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::ProjectNotFound`] when the project does
    /// not exist for the tenant.
    pub async fn project_code(
        &self,
        tenant: TenantId,
        project: ProjectId,
    ) -> TaskLifecycleResult<ProjectCode> {
        self.projects
            .find_code(tenant, project)
            .await?
            .ok_or(TaskLifecycleError::ProjectNotFound(project))
    }

    /// Generates the next code for a project.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::ProjectNotFound`] for an unknown
    /// project, or a repository error when the counter cannot be advanced.
    pub async fn generate(
        &self,
        tenant: TenantId,
        project: ProjectId,
    ) -> TaskLifecycleResult<TaskCode> {
        let project_code = self.project_code(tenant, project).await?;
        self.next_code(tenant, project, &project_code).await
    }

    /// Generates the next code for a project whose code is already known.
    ///
    /// # Errors
    ///
    /// Returns a repository error when the counter cannot be advanced.
    pub async fn next_code(
        &self,
        tenant: TenantId,
        project: ProjectId,
        project_code: &ProjectCode,
    ) -> TaskLifecycleResult<TaskCode> {
        let sequence = self.repository.next_code_sequence(tenant, project).await?;
        let code = TaskCode::format(project_code, sequence, self.width);
        debug!(%tenant, %project, %code, "task code allocated");
        Ok(code)
    }
}
