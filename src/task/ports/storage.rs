//! Blob storage port for task attachments.

use crate::task::domain::{AttachmentCategory, AttachmentUpload, StoredAttachment};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for attachment storage operations.
pub type AttachmentStorageResult<T> = Result<T, AttachmentStorageError>;

/// Stores and removes attachment content.
#[async_trait]
pub trait AttachmentStorage: Send + Sync {
    /// Validates and writes an upload, returning where it landed.
    async fn save(
        &self,
        upload: &AttachmentUpload,
        category: AttachmentCategory,
    ) -> AttachmentStorageResult<StoredAttachment>;

    /// Removes a previously saved blob. Missing blobs are not an error.
    async fn delete(&self, path: &str) -> AttachmentStorageResult<()>;
}

/// Errors returned by attachment storage implementations.
#[derive(Debug, Clone, Error)]
pub enum AttachmentStorageError {
    /// The file extension is not on the allow list.
    #[error("file type not allowed for '{file_name}'")]
    DisallowedType {
        /// Rejected file name.
        file_name: String,
    },

    /// The file exceeds the size limit.
    #[error("'{file_name}' is {size} bytes, exceeding the {max} byte limit")]
    TooLarge {
        /// Rejected file name.
        file_name: String,
        /// Actual size.
        size: u64,
        /// Configured limit.
        max: u64,
    },

    /// The storage path is not one this adapter issued.
    #[error("invalid storage path '{0}'")]
    InvalidPath(String),

    /// Underlying I/O failure.
    #[error("attachment storage error: {0}")]
    Io(Arc<dyn std::error::Error + Send + Sync>),
}

impl AttachmentStorageError {
    /// Wraps an I/O error.
    pub fn io(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Io(Arc::new(err))
    }
}
