//! Attachment storage on a capability-scoped directory.
//!
//! Every path is resolved against a base [`Dir`], so stored paths can never
//! escape it. Blocking filesystem calls run on the Tokio blocking pool.

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use mockable::{Clock, DefaultClock};
use std::sync::Arc;
use tracing::debug;

use crate::config::AttachmentLimits;
use crate::task::{
    adapters::attachment_rules,
    domain::{AttachmentCategory, AttachmentUpload, StoredAttachment},
    ports::{AttachmentStorage, AttachmentStorageError, AttachmentStorageResult},
};

/// Attachment storage writing under `{base}/{root}/{category}/`.
#[derive(Clone)]
pub struct FilesystemAttachmentStorage {
    base: Arc<Dir>,
    limits: AttachmentLimits,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl std::fmt::Debug for FilesystemAttachmentStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilesystemAttachmentStorage")
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl FilesystemAttachmentStorage {
    /// Creates storage rooted in an already opened directory.
    #[must_use]
    pub fn new(base: Dir, limits: AttachmentLimits) -> Self {
        Self {
            base: Arc::new(base),
            limits,
            clock: Arc::new(DefaultClock),
        }
    }

    /// Opens `base` with ambient authority and roots storage there.
    ///
    /// The configured attachment root must be relative to `base`.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentStorageError::Io`] when the directory cannot be
    /// opened.
    pub fn open_ambient(
        base: &Utf8Path,
        limits: AttachmentLimits,
    ) -> AttachmentStorageResult<Self> {
        let dir = Dir::open_ambient_dir(base, ambient_authority())
            .map_err(AttachmentStorageError::io)?;
        Ok(Self::new(dir, limits))
    }

    /// Replaces the clock used to timestamp stored names.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = clock;
        self
    }

    async fn run_blocking<F, T>(&self, f: F) -> AttachmentStorageResult<T>
    where
        F: FnOnce(&Dir) -> std::io::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let base = Arc::clone(&self.base);
        tokio::task::spawn_blocking(move || f(&base))
            .await
            .map_err(|err| AttachmentStorageError::io(std::io::Error::other(err.to_string())))?
            .map_err(AttachmentStorageError::io)
    }
}

#[async_trait]
impl AttachmentStorage for FilesystemAttachmentStorage {
    async fn save(
        &self,
        upload: &AttachmentUpload,
        category: AttachmentCategory,
    ) -> AttachmentStorageResult<StoredAttachment> {
        let accepted =
            attachment_rules::accept(&self.limits, upload, category, self.clock.utc())?;
        let directory = attachment_rules::category_dir(&self.limits, category);
        let target = accepted.relative_path.clone();
        let bytes = upload.bytes().to_vec();

        self.run_blocking(move |base| {
            base.create_dir_all(&directory)?;
            base.write(&target, bytes)
        })
        .await?;

        debug!(path = %accepted.relative_path, size = accepted.size, "attachment stored");
        Ok(StoredAttachment {
            path: accepted.relative_path.into_string(),
            size: accepted.size,
            mime_type: accepted.mime_type,
        })
    }

    async fn delete(&self, path: &str) -> AttachmentStorageResult<()> {
        let target = Utf8PathBuf::from(path);
        if !attachment_rules::is_issued_path(&self.limits, &target) {
            return Err(AttachmentStorageError::InvalidPath(path.to_owned()));
        }

        self.run_blocking(move |base| match base.remove_file(&target) {
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            other => other,
        })
        .await?;

        debug!(path, "attachment removed");
        Ok(())
    }
}
