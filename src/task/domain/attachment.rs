//! Task attachment metadata.

use super::{AttachmentCategory, TaskDomainError, TaskFileId, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A file received from the caller, not yet written to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentUpload {
    file_name: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

impl AttachmentUpload {
    /// Creates an upload from its original name and content.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyFileName`] when the name is blank.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, TaskDomainError> {
        let name = file_name.into().trim().to_owned();
        if name.is_empty() {
            return Err(TaskDomainError::EmptyFileName);
        }
        Ok(Self {
            file_name: name,
            content_type: None,
            bytes,
        })
    }

    /// Sets the MIME type declared by the client.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        let declared = content_type.into().trim().to_owned();
        self.content_type = (!declared.is_empty()).then_some(declared);
        self
    }

    /// Returns the original file name.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Returns the declared MIME type, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Returns the file content.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Location and properties of a blob written by the storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAttachment {
    /// Storage path of the blob.
    pub path: String,
    /// Size in bytes.
    pub size: u64,
    /// MIME type of the content.
    pub mime_type: String,
}

/// Attachment row linked to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFile {
    /// Attachment identifier.
    pub id: TaskFileId,
    /// Owning task.
    pub task_id: TaskId,
    /// Original file name.
    pub file_name: String,
    /// Storage path.
    pub file_path: String,
    /// Size in bytes.
    pub file_size: u64,
    /// MIME type.
    pub file_type: String,
    /// Why the file was attached.
    pub category: AttachmentCategory,
    /// Soft usability flag.
    pub active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl TaskFile {
    /// Records metadata for a blob the storage collaborator has written.
    #[must_use]
    pub fn from_stored(
        task_id: TaskId,
        upload: &AttachmentUpload,
        stored: StoredAttachment,
        category: AttachmentCategory,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TaskFileId::new(),
            task_id,
            file_name: upload.file_name().to_owned(),
            file_path: stored.path,
            file_size: stored.size,
            file_type: stored.mime_type,
            category,
            active: true,
            created_at,
        }
    }
}
