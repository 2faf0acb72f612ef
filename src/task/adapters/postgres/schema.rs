//! Diesel schema for task lifecycle persistence.

diesel::table! {
    /// Project reference data; only the code is read here.
    projects (id) {
        /// Project identifier.
        id -> Int8,
        /// Owning tenant.
        tenant_id -> Int8,
        /// Short code used as the task code prefix.
        #[max_length = 100]
        code -> Varchar,
        /// Soft-delete marker.
        deleted_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Task records.
    tasks (id) {
        /// Internal task identifier.
        id -> Uuid,
        /// Owning tenant.
        tenant_id -> Int8,
        /// Owning project.
        project_id -> Int8,
        /// Human-readable code, unique per tenant.
        #[max_length = 128]
        code -> Varchar,
        /// Title.
        #[max_length = 255]
        title -> Varchar,
        /// Description.
        description -> Nullable<Text>,
        /// Narrative captured before review.
        description_before -> Nullable<Text>,
        /// Narrative captured after review.
        description_after -> Nullable<Text>,
        /// Reason text.
        reason -> Nullable<Text>,
        /// Revision text.
        revision -> Nullable<Text>,
        /// Priority lookup id.
        priority_id -> Int8,
        /// Type lookup id.
        type_id -> Nullable<Int8>,
        /// Stack lookup id.
        stack_id -> Nullable<Int8>,
        /// Assignee.
        assigned_to -> Nullable<Int8>,
        /// Creator.
        created_by -> Int8,
        /// Last editor.
        updated_by -> Nullable<Int8>,
        /// Final approver.
        approved_by -> Nullable<Int8>,
        /// Completing user.
        completed_by -> Nullable<Int8>,
        /// User who marked the task done.
        done_by -> Nullable<Int8>,
        /// Execution status reference id.
        status_id -> Int8,
        /// Soft usability flag.
        is_active -> Bool,
        /// Aggregate approval status reference id.
        approval_status_id -> Int8,
        /// Final approval timestamp.
        approval_date -> Nullable<Timestamptz>,
        /// Work start date.
        start_date -> Nullable<Timestamptz>,
        /// Due date.
        due_date -> Nullable<Timestamptz>,
        /// Completion date.
        completed_date -> Nullable<Timestamptz>,
        /// Done timestamp.
        done_at -> Nullable<Timestamptz>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
        /// Soft-delete marker.
        deleted_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Approval slots, two per task.
    approval_tasks (id) {
        /// Slot identifier.
        id -> Uuid,
        /// Owning task.
        task_id -> Uuid,
        /// Pipeline position (1 or 2).
        sequence -> Int2,
        /// Approver who resolved the slot.
        approved_by -> Nullable<Int8>,
        /// Slot status reference id.
        status_id -> Int8,
        /// Resolution timestamp.
        approval_date -> Nullable<Timestamptz>,
        /// Approver note.
        note -> Nullable<Text>,
        /// Soft usability flag.
        is_active -> Bool,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Attachment metadata rows.
    task_files (id) {
        /// Attachment identifier.
        id -> Uuid,
        /// Owning task.
        task_id -> Uuid,
        /// Original file name.
        #[max_length = 255]
        file_name -> Varchar,
        /// Storage path.
        file_path -> Text,
        /// Size in bytes.
        file_size -> Int8,
        /// MIME type.
        #[max_length = 255]
        file_type -> Varchar,
        /// Attachment category reference id.
        category_id -> Int8,
        /// Soft usability flag.
        is_active -> Bool,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Last issued task code number per tenant and project.
    task_code_sequences (tenant_id, project_id) {
        /// Owning tenant.
        tenant_id -> Int8,
        /// Owning project.
        project_id -> Int8,
        /// Last issued number.
        last_value -> Int4,
    }
}

diesel::joinable!(approval_tasks -> tasks (task_id));
diesel::joinable!(task_files -> tasks (task_id));

diesel::allow_tables_to_appear_in_same_query!(
    approval_tasks,
    projects,
    task_code_sequences,
    task_files,
    tasks,
);
