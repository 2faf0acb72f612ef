//! Batch attachment saving with compensation.

use super::error::TaskLifecycleResult;
use crate::task::{
    domain::{AttachmentCategory, AttachmentUpload, TaskFile, TaskId},
    ports::AttachmentStorage,
};
use chrono::{DateTime, Utc};
use tracing::warn;

/// Saves every upload, or none.
///
/// When one save fails the blobs already written are deleted before the
/// error is returned.
pub(super) async fn save_all<S>(
    storage: &S,
    task_id: TaskId,
    uploads: &[AttachmentUpload],
    category: AttachmentCategory,
    at: DateTime<Utc>,
) -> TaskLifecycleResult<Vec<TaskFile>>
where
    S: AttachmentStorage + ?Sized,
{
    let mut saved = Vec::with_capacity(uploads.len());
    for upload in uploads {
        match storage.save(upload, category).await {
            Ok(stored) => saved.push(TaskFile::from_stored(
                task_id, upload, stored, category, at,
            )),
            Err(err) => {
                discard(storage, task_id, &saved).await;
                return Err(err.into());
            }
        }
    }
    Ok(saved)
}

/// Deletes blobs whose metadata was never committed.
///
/// Delete failures are logged; the caller is already returning an error.
pub(super) async fn discard<S>(storage: &S, task_id: TaskId, files: &[TaskFile])
where
    S: AttachmentStorage + ?Sized,
{
    if files.is_empty() {
        return;
    }
    warn!(%task_id, count = files.len(), "discarding attachments of an aborted write");
    for file in files {
        if let Err(err) = storage.delete(&file.file_path).await {
            warn!(%task_id, path = %file.file_path, error = %err, "attachment cleanup failed");
        }
    }
}
