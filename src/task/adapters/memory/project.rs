//! In-memory project directory.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::task::{
    domain::{ProjectCode, ProjectId, TenantId},
    ports::{ProjectDirectory, ProjectDirectoryError, ProjectDirectoryResult},
};

/// Thread-safe in-memory project directory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProjectDirectory {
    projects: Arc<RwLock<HashMap<(TenantId, ProjectId), ProjectCode>>>,
}

impl InMemoryProjectDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces a project code.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectDirectoryError::Lookup`] if the lock is poisoned.
    pub fn insert(
        &self,
        tenant: TenantId,
        project: ProjectId,
        code: ProjectCode,
    ) -> ProjectDirectoryResult<()> {
        let mut projects = self.projects.write().map_err(|err| {
            ProjectDirectoryError::lookup(std::io::Error::other(err.to_string()))
        })?;
        projects.insert((tenant, project), code);
        Ok(())
    }
}

#[async_trait]
impl ProjectDirectory for InMemoryProjectDirectory {
    async fn find_code(
        &self,
        tenant: TenantId,
        project: ProjectId,
    ) -> ProjectDirectoryResult<Option<ProjectCode>> {
        let projects = self.projects.read().map_err(|err| {
            ProjectDirectoryError::lookup(std::io::Error::other(err.to_string()))
        })?;
        Ok(projects.get(&(tenant, project)).cloned())
    }
}
