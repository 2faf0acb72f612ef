//! `PostgreSQL` project directory.

use super::{repository::TaskPgPool, schema::projects};
use crate::task::{
    domain::{ProjectCode, ProjectId, TenantId},
    ports::{ProjectDirectory, ProjectDirectoryError, ProjectDirectoryResult},
};
use async_trait::async_trait;
use diesel::prelude::*;

/// Reads project codes from the `projects` table.
#[derive(Debug, Clone)]
pub struct PostgresProjectDirectory {
    pool: TaskPgPool,
}

impl PostgresProjectDirectory {
    /// Creates a directory from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectDirectory for PostgresProjectDirectory {
    async fn find_code(
        &self,
        tenant: TenantId,
        project: ProjectId,
    ) -> ProjectDirectoryResult<Option<ProjectCode>> {
        let pool = self.pool.clone();
        let stored = tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(ProjectDirectoryError::lookup)?;
            projects::table
                .filter(projects::id.eq(project.value()))
                .filter(projects::tenant_id.eq(tenant.value()))
                .filter(projects::deleted_at.is_null())
                .select(projects::code)
                .first::<String>(&mut connection)
                .optional()
                .map_err(ProjectDirectoryError::lookup)
        })
        .await
        .map_err(ProjectDirectoryError::lookup)??;

        stored
            .map(|code| {
                ProjectCode::new(code).map_err(|err| ProjectDirectoryError::InvalidCode {
                    project,
                    reason: err.to_string(),
                })
            })
            .transpose()
    }
}
