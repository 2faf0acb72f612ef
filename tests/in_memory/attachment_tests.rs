//! Attachment categories and cleanup against in-memory adapters.

use super::helpers::{Engine, engine};
use permitdesk::config::{AttachmentLimits, EngineConfig};
use permitdesk::task::{
    domain::{AttachmentCategory, AttachmentUpload, ExecutionStatus, TaskListQuery},
    ports::AttachmentStorageError,
    services::{ErrorKind, ReviewSubmission, TaskLifecycleError, UpdateTaskRequest},
};
use rstest::rstest;

fn upload(name: &str) -> Result<AttachmentUpload, eyre::Report> {
    Ok(AttachmentUpload::new(name, format!("content of {name}").into_bytes())?)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn creation_attachments_are_stored_and_linked(engine: Engine) -> Result<(), eyre::Report> {
    let created = engine
        .service
        .create(
            engine.tenant,
            engine.requester,
            engine
                .request("Install sign")
                .with_attachments([upload("Permit.PDF")?, upload("site.png")?]),
        )
        .await?;

    let files = created.attachments();
    assert_eq!(files.len(), 2);
    for file in files {
        assert_eq!(file.task_id, created.id());
        assert_eq!(file.category, AttachmentCategory::Creation);
        assert!(file.active);
        assert!(file.file_path.starts_with("file/tasks/creation/"));
        let blob = engine
            .storage
            .blob(&file.file_path)?
            .ok_or_else(|| eyre::eyre!("blob missing for {}", file.file_name))?;
        assert_eq!(blob, format!("content of {}", file.file_name).into_bytes());
    }
    let pdf = files
        .iter()
        .find(|file| file.file_name == "Permit.PDF")
        .ok_or_else(|| eyre::eyre!("pdf metadata missing"))?;
    assert_eq!(pdf.file_type, "application/pdf");
    assert!(pdf.file_path.ends_with(".pdf"));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn entering_review_records_evidence(engine: Engine) -> Result<(), eyre::Report> {
    let created = engine.create("Fix leak").await?;

    let reviewed = engine
        .service
        .enter_review(
            engine.tenant,
            engine.requester,
            created.id(),
            ReviewSubmission::new("Pipe dripping", "Joint resealed")
                .with_attachments([upload("before.jpg")?, upload("after.jpg")?]),
        )
        .await?;

    assert_eq!(reviewed.status(), ExecutionStatus::InReview);
    assert_eq!(reviewed.description_before(), Some("Pipe dripping"));
    assert_eq!(reviewed.description_after(), Some("Joint resealed"));
    assert_eq!(reviewed.attachments().len(), 2);
    assert!(
        reviewed
            .attachments()
            .iter()
            .all(|file| file.category == AttachmentCategory::Review
                && file.file_path.starts_with("file/tasks/review/"))
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn revision_moves_task_back_with_files(engine: Engine) -> Result<(), eyre::Report> {
    let created = engine.create("Draft report").await?;

    let revised = engine
        .service
        .set_revision(
            engine.tenant,
            engine.requester,
            created.id(),
            "Add load calculations",
            &[upload("calc.docx")?],
        )
        .await?;

    assert_eq!(revised.status(), ExecutionStatus::Revision);
    assert_eq!(revised.revision(), Some("Add load calculations"));
    let file = revised
        .attachments()
        .first()
        .ok_or_else(|| eyre::eyre!("revision attachment missing"))?;
    assert_eq!(file.category, AttachmentCategory::Revision);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn update_appends_creation_attachments(engine: Engine) -> Result<(), eyre::Report> {
    let created = engine
        .service
        .create(
            engine.tenant,
            engine.requester,
            engine
                .request("Order valves")
                .with_attachments([upload("quote.pdf")?]),
        )
        .await?;

    let updated = engine
        .service
        .update(
            engine.tenant,
            engine.requester,
            created.id(),
            UpdateTaskRequest::new().with_attachments([upload("invoice.pdf")?]),
        )
        .await?;

    let names: Vec<&str> = updated
        .attachments()
        .iter()
        .map(|file| file.file_name.as_str())
        .collect();
    assert_eq!(names, vec!["quote.pdf", "invoice.pdf"]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn disallowed_type_aborts_the_review(engine: Engine) -> Result<(), eyre::Report> {
    let created = engine.create("Upload check").await?;

    let result = engine
        .service
        .enter_review(
            engine.tenant,
            engine.requester,
            created.id(),
            ReviewSubmission::new("before", "after")
                .with_attachments([upload("notes.pdf")?, upload("script.sh")?]),
        )
        .await;

    let err = result.err().ok_or_else(|| eyre::eyre!("script upload should fail"))?;
    assert!(matches!(
        err,
        TaskLifecycleError::Attachment(AttachmentStorageError::DisallowedType { ref file_name })
            if file_name == "script.sh"
    ));
    assert_eq!(err.kind(), ErrorKind::Attachment);
    assert_eq!(engine.storage.blob_count()?, 0);

    let unchanged = engine.service.get(engine.tenant, created.id()).await?;
    assert_eq!(unchanged.status(), ExecutionStatus::ToDo);
    assert_eq!(unchanged.description_before(), None);
    assert!(unchanged.attachments().is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn storage_failure_rolls_back_saved_blobs(engine: Engine) -> Result<(), eyre::Report> {
    let created = engine.create("Partial upload").await?;
    engine.storage.fail_saves_of("after.png")?;

    let result = engine
        .service
        .enter_review(
            engine.tenant,
            engine.requester,
            created.id(),
            ReviewSubmission::new("before", "after")
                .with_attachments([upload("before.png")?, upload("after.png")?]),
        )
        .await;

    let err = result.err().ok_or_else(|| eyre::eyre!("failing save should surface"))?;
    assert_eq!(err.kind(), ErrorKind::Attachment);
    assert_eq!(engine.storage.blob_count()?, 0);
    assert_eq!(engine.storage.deleted_paths()?.len(), 1);

    let unchanged = engine.service.get(engine.tenant, created.id()).await?;
    assert_eq!(unchanged.status(), ExecutionStatus::ToDo);
    assert!(unchanged.attachments().is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_create_leaves_no_task_or_blob(engine: Engine) -> Result<(), eyre::Report> {
    engine.storage.fail_saves_of("second.pdf")?;

    let result = engine
        .service
        .create(
            engine.tenant,
            engine.requester,
            engine
                .request("Never stored")
                .with_attachments([upload("first.pdf")?, upload("second.pdf")?]),
        )
        .await;

    assert!(result.is_err());
    assert_eq!(engine.storage.blob_count()?, 0);
    let page = engine
        .service
        .list_requests(engine.tenant, TaskListQuery::new())
        .await?;
    assert_eq!(page.total, 0);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn oversized_upload_is_rejected() -> Result<(), eyre::Report> {
    let config = EngineConfig {
        attachments: AttachmentLimits {
            max_file_size: 8,
            ..AttachmentLimits::default()
        },
        ..EngineConfig::default()
    };
    let engine = Engine::with_config(&config);

    let result = engine
        .service
        .create(
            engine.tenant,
            engine.requester,
            engine
                .request("Big scan")
                .with_attachments([upload("scan.pdf")?]),
        )
        .await;

    assert!(matches!(
        result,
        Err(TaskLifecycleError::Attachment(
            AttachmentStorageError::TooLarge { max: 8, .. }
        ))
    ));
    Ok(())
}
