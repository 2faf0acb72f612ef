//! In-memory attachment storage.

use async_trait::async_trait;
use camino::Utf8Path;
use mockable::{Clock, DefaultClock};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::AttachmentLimits;
use crate::task::{
    adapters::attachment_rules,
    domain::{AttachmentCategory, AttachmentUpload, StoredAttachment},
    ports::{AttachmentStorage, AttachmentStorageError, AttachmentStorageResult},
};

/// Attachment storage that keeps blobs in memory.
///
/// Applies the same validation and naming as the filesystem adapter.
/// Individual file names can be marked as failing to exercise partial
/// upload failures.
#[derive(Clone)]
pub struct InMemoryAttachmentStorage {
    limits: AttachmentLimits,
    clock: Arc<dyn Clock + Send + Sync>,
    state: Arc<RwLock<InMemoryBlobState>>,
}

#[derive(Debug, Default)]
struct InMemoryBlobState {
    blobs: HashMap<String, Vec<u8>>,
    failing_names: HashSet<String>,
    deleted: Vec<String>,
}

impl Default for InMemoryAttachmentStorage {
    fn default() -> Self {
        Self::new(AttachmentLimits::default())
    }
}

impl std::fmt::Debug for InMemoryAttachmentStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryAttachmentStorage")
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl InMemoryAttachmentStorage {
    /// Creates empty storage enforcing `limits`.
    #[must_use]
    pub fn new(limits: AttachmentLimits) -> Self {
        Self {
            limits,
            clock: Arc::new(DefaultClock),
            state: Arc::default(),
        }
    }

    /// Makes every later save of `file_name` fail with an I/O error.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentStorageError::Io`] if the lock is poisoned.
    pub fn fail_saves_of(&self, file_name: impl Into<String>) -> AttachmentStorageResult<()> {
        self.write()?.failing_names.insert(file_name.into());
        Ok(())
    }

    /// Returns the content stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentStorageError::Io`] if the lock is poisoned.
    pub fn blob(&self, path: &str) -> AttachmentStorageResult<Option<Vec<u8>>> {
        Ok(self.read()?.blobs.get(path).cloned())
    }

    /// Returns how many blobs are currently stored.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentStorageError::Io`] if the lock is poisoned.
    pub fn blob_count(&self) -> AttachmentStorageResult<usize> {
        Ok(self.read()?.blobs.len())
    }

    /// Returns every path passed to `delete`, in call order.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentStorageError::Io`] if the lock is poisoned.
    pub fn deleted_paths(&self) -> AttachmentStorageResult<Vec<String>> {
        Ok(self.read()?.deleted.clone())
    }

    fn read(&self) -> AttachmentStorageResult<RwLockReadGuard<'_, InMemoryBlobState>> {
        self.state
            .read()
            .map_err(|err| AttachmentStorageError::io(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> AttachmentStorageResult<RwLockWriteGuard<'_, InMemoryBlobState>> {
        self.state
            .write()
            .map_err(|err| AttachmentStorageError::io(std::io::Error::other(err.to_string())))
    }
}

#[async_trait]
impl AttachmentStorage for InMemoryAttachmentStorage {
    async fn save(
        &self,
        upload: &AttachmentUpload,
        category: AttachmentCategory,
    ) -> AttachmentStorageResult<StoredAttachment> {
        let accepted =
            attachment_rules::accept(&self.limits, upload, category, self.clock.utc())?;
        let mut state = self.write()?;
        if state.failing_names.contains(upload.file_name()) {
            return Err(AttachmentStorageError::io(std::io::Error::other(format!(
                "simulated write failure for '{}'",
                upload.file_name()
            ))));
        }

        let path = accepted.relative_path.into_string();
        state.blobs.insert(path.clone(), upload.bytes().to_vec());
        Ok(StoredAttachment {
            path,
            size: accepted.size,
            mime_type: accepted.mime_type,
        })
    }

    async fn delete(&self, path: &str) -> AttachmentStorageResult<()> {
        if !attachment_rules::is_issued_path(&self.limits, Utf8Path::new(path)) {
            return Err(AttachmentStorageError::InvalidPath(path.to_owned()));
        }
        let mut state = self.write()?;
        state.blobs.remove(path);
        state.deleted.push(path.to_owned());
        Ok(())
    }
}
