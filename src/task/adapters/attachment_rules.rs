//! Upload validation and naming shared by the storage adapters.

use crate::config::AttachmentLimits;
use crate::task::domain::{AttachmentCategory, AttachmentUpload};
use crate::task::ports::AttachmentStorageError;
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// An upload that passed the configured limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AcceptedUpload {
    pub(crate) relative_path: Utf8PathBuf,
    pub(crate) size: u64,
    pub(crate) mime_type: String,
}

/// Checks extension and size, then picks the storage path.
pub(crate) fn accept(
    limits: &AttachmentLimits,
    upload: &AttachmentUpload,
    category: AttachmentCategory,
    at: DateTime<Utc>,
) -> Result<AcceptedUpload, AttachmentStorageError> {
    let extension = Utf8Path::new(upload.file_name())
        .extension()
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .filter(|ext| limits.allows_extension(ext))
        .ok_or_else(|| AttachmentStorageError::DisallowedType {
            file_name: upload.file_name().to_owned(),
        })?;

    let size = u64::try_from(upload.bytes().len()).unwrap_or(u64::MAX);
    if size > limits.max_file_size {
        return Err(AttachmentStorageError::TooLarge {
            file_name: upload.file_name().to_owned(),
            size,
            max: limits.max_file_size,
        });
    }

    let mime_type = upload
        .content_type()
        .map_or_else(|| mime_for(&extension).to_owned(), str::to_owned);
    let stored_name = format!(
        "{}_{}{extension}",
        at.format("%Y%m%d%H%M%S"),
        Uuid::new_v4()
    );

    Ok(AcceptedUpload {
        relative_path: category_dir(limits, category).join(stored_name),
        size,
        mime_type,
    })
}

/// Directory holding attachments of one category.
pub(crate) fn category_dir(
    limits: &AttachmentLimits,
    category: AttachmentCategory,
) -> Utf8PathBuf {
    limits.root.join(category.as_str())
}

/// Returns `true` when `path` names a file this adapter could have written.
pub(crate) fn is_issued_path(limits: &AttachmentLimits, path: &Utf8Path) -> bool {
    path.starts_with(&limits.root)
        && path.file_name().is_some()
        && !path.components().any(|component| {
            matches!(
                component,
                Utf8Component::ParentDir | Utf8Component::CurDir
            )
        })
}

fn mime_for(extension: &str) -> &'static str {
    match extension {
        ".pdf" => "application/pdf",
        ".doc" => "application/msword",
        ".docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ".jpg" | ".jpeg" => "image/jpeg",
        ".png" => "image/png",
        _ => "application/octet-stream",
    }
}
