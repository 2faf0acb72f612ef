//! Read-only port onto the project reference data.

use crate::task::domain::{ProjectCode, ProjectId, TenantId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for project lookups.
pub type ProjectDirectoryResult<T> = Result<T, ProjectDirectoryError>;

/// Resolves the short code of a project visible to a tenant.
#[async_trait]
pub trait ProjectDirectory: Send + Sync {
    /// Returns the project code, or `None` when the project does not exist
    /// for the tenant.
    async fn find_code(
        &self,
        tenant: TenantId,
        project: ProjectId,
    ) -> ProjectDirectoryResult<Option<ProjectCode>>;
}

/// Errors returned by project directory implementations.
#[derive(Debug, Clone, Error)]
pub enum ProjectDirectoryError {
    /// A stored project code failed validation.
    #[error("project {project} has an unusable code: {reason}")]
    InvalidCode {
        /// Offending project.
        project: ProjectId,
        /// Validation message.
        reason: String,
    },

    /// Lookup-layer failure.
    #[error("project lookup error: {0}")]
    Lookup(Arc<dyn std::error::Error + Send + Sync>),
}

impl ProjectDirectoryError {
    /// Wraps a lookup error.
    pub fn lookup(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Lookup(Arc::new(err))
    }
}
