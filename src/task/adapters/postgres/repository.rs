//! `PostgreSQL` repository implementation for task lifecycle storage.

use super::{
    models::{
        ApprovalSlotChangeset, ApprovalSlotRow, TaskApprovalChangeset, TaskChangeset,
        TaskFileRow, TaskRow,
    },
    schema::{approval_tasks, task_files, tasks},
};
use crate::task::{
    domain::{
        ApprovalPipeline, ApprovalResolution, ApprovalSequence, ApprovalSlot, ApprovalSlotId,
        ApprovalStatus, AttachmentCategory, ExecutionStatus, PersistedApprovalSlotData,
        PersistedTaskData, ProjectId, ReferenceId, SlotStatus, Task, TaskCode, TaskFile,
        TaskFileId, TaskId, TaskListQuery, TaskPage, TaskPatch, TaskTitle, TenantId, UserId,
    },
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
use std::collections::HashMap;

/// `PostgreSQL` connection pool type used by task adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

const TASK_CODE_UNIQUE_CONSTRAINT: &str = "idx_tasks_tenant_code_unique";

/// `PostgreSQL`-backed task repository.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: TaskPgPool,
}

impl PostgresTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }
}

impl From<DieselError> for TaskRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

#[derive(Debug, QueryableByName)]
struct IssuedSequence {
    #[diesel(sql_type = diesel::sql_types::Int4)]
    last_value: i32,
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn next_code_sequence(
        &self,
        tenant: TenantId,
        project: ProjectId,
    ) -> TaskRepositoryResult<u32> {
        self.run_blocking(move |connection| {
            // The counter row is created on first use, seeded from every task
            // ever stored for the project so soft-deleted codes stay retired.
            let issued = diesel::sql_query(concat!(
                "INSERT INTO task_code_sequences (tenant_id, project_id, last_value) ",
                "VALUES ($1, $2, (SELECT COUNT(*)::INT4 FROM tasks ",
                "WHERE tenant_id = $1 AND project_id = $2) + 1) ",
                "ON CONFLICT (tenant_id, project_id) ",
                "DO UPDATE SET last_value = task_code_sequences.last_value + 1 ",
                "RETURNING last_value",
            ))
            .bind::<diesel::sql_types::BigInt, _>(tenant.value())
            .bind::<diesel::sql_types::BigInt, _>(project.value())
            .get_result::<IssuedSequence>(connection)?;
            u32::try_from(issued.last_value).map_err(TaskRepositoryError::persistence)
        })
        .await
    }

    async fn create_with_approval_slots(&self, task: &Task) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let code = task.code().clone();
        let task_row = to_task_row(task);
        let slot_rows: Vec<ApprovalSlotRow> = task
            .approvals()
            .slots()
            .into_iter()
            .map(to_slot_row)
            .collect();
        let file_rows = to_file_rows(task.attachments())?;

        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                diesel::insert_into(tasks::table)
                    .values(&task_row)
                    .execute(tx)
                    .map_err(|err| match err {
                        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                            if is_task_code_unique_violation(info.as_ref()) =>
                        {
                            TaskRepositoryError::DuplicateCode(code.clone())
                        }
                        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                            TaskRepositoryError::DuplicateTask(task_id)
                        }
                        _ => TaskRepositoryError::persistence(err),
                    })?;
                diesel::insert_into(approval_tasks::table)
                    .values(&slot_rows)
                    .execute(tx)?;
                if !file_rows.is_empty() {
                    diesel::insert_into(task_files::table)
                        .values(&file_rows)
                        .execute(tx)?;
                }
                Ok(())
            })
        })
        .await
    }

    async fn find_by_id(
        &self,
        tenant: TenantId,
        id: TaskId,
    ) -> TaskRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = live_tasks(tenant)
                .filter(tasks::id.eq(id.into_inner()))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()?;
            row.map(|found| load_aggregate(connection, found)).transpose()
        })
        .await
    }

    async fn find_by_code(
        &self,
        tenant: TenantId,
        code: &TaskCode,
    ) -> TaskRepositoryResult<Option<Task>> {
        let lookup_code = code.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = live_tasks(tenant)
                .filter(tasks::code.eq(lookup_code))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()?;
            row.map(|found| load_aggregate(connection, found)).transpose()
        })
        .await
    }

    async fn list(
        &self,
        tenant: TenantId,
        query: &TaskListQuery,
    ) -> TaskRepositoryResult<TaskPage> {
        let filters = query.clone();
        self.run_blocking(move |connection| {
            let total: i64 = filtered_tasks(tenant, &filters)
                .count()
                .get_result(connection)?;
            let offset =
                i64::try_from(filters.offset()).map_err(TaskRepositoryError::persistence)?;
            let rows = filtered_tasks(tenant, &filters)
                .order((tasks::created_at.desc(), tasks::code.desc()))
                .limit(i64::from(filters.limit()))
                .offset(offset)
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            let items = load_aggregates(connection, rows)?;

            Ok(TaskPage {
                items,
                total: u64::try_from(total).map_err(TaskRepositoryError::persistence)?,
                page: filters.page(),
                limit: filters.limit(),
            })
        })
        .await
    }

    async fn update_fields(
        &self,
        tenant: TenantId,
        id: TaskId,
        patch: &TaskPatch,
    ) -> TaskRepositoryResult<()> {
        let changeset = to_changeset(patch);
        let file_rows = to_file_rows(&patch.new_attachments)?;

        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                let matched = if changeset.is_empty() {
                    live_tasks(tenant)
                        .filter(tasks::id.eq(id.into_inner()))
                        .count()
                        .get_result::<i64>(tx)?
                } else {
                    let updated = diesel::update(tasks::table)
                        .filter(tasks::id.eq(id.into_inner()))
                        .filter(tasks::tenant_id.eq(tenant.value()))
                        .filter(tasks::deleted_at.is_null())
                        .set(&changeset)
                        .execute(tx)?;
                    i64::try_from(updated).map_err(TaskRepositoryError::persistence)?
                };
                if matched == 0 {
                    return Err(TaskRepositoryError::NotFound(id));
                }
                if !file_rows.is_empty() {
                    diesel::insert_into(task_files::table)
                        .values(&file_rows)
                        .execute(tx)?;
                }
                Ok(())
            })
        })
        .await
    }

    async fn soft_delete(
        &self,
        tenant: TenantId,
        id: TaskId,
        deleted_at: DateTime<Utc>,
    ) -> TaskRepositoryResult<()> {
        self.run_blocking(move |connection| {
            let updated = diesel::update(tasks::table)
                .filter(tasks::id.eq(id.into_inner()))
                .filter(tasks::tenant_id.eq(tenant.value()))
                .filter(tasks::deleted_at.is_null())
                .set(tasks::deleted_at.eq(Some(deleted_at)))
                .execute(connection)?;
            if updated == 0 {
                return Err(TaskRepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn list_approval_slots(
        &self,
        task_id: TaskId,
    ) -> TaskRepositoryResult<Vec<ApprovalSlot>> {
        self.run_blocking(move |connection| {
            approval_tasks::table
                .filter(approval_tasks::task_id.eq(task_id.into_inner()))
                .order(approval_tasks::sequence.asc())
                .select(ApprovalSlotRow::as_select())
                .load::<ApprovalSlotRow>(connection)?
                .into_iter()
                .map(row_to_slot)
                .collect()
        })
        .await
    }

    async fn find_approval_slot(
        &self,
        task_id: TaskId,
        sequence: ApprovalSequence,
    ) -> TaskRepositoryResult<Option<ApprovalSlot>> {
        self.run_blocking(move |connection| {
            approval_tasks::table
                .filter(approval_tasks::task_id.eq(task_id.into_inner()))
                .filter(approval_tasks::sequence.eq(sequence.value()))
                .select(ApprovalSlotRow::as_select())
                .first::<ApprovalSlotRow>(connection)
                .optional()?
                .map(row_to_slot)
                .transpose()
        })
        .await
    }

    async fn update_approval_slots(
        &self,
        tenant: TenantId,
        resolution: &ApprovalResolution,
    ) -> TaskRepositoryResult<()> {
        let task_id = resolution.task_id;
        let slot_updates: Vec<(ApprovalSlotId, i64, ApprovalSlotChangeset)> = resolution
            .slot_writes
            .iter()
            .map(|write| {
                let slot = &write.slot;
                let changeset = ApprovalSlotChangeset {
                    approved_by: slot.approved_by().map(UserId::value),
                    status_id: slot.status().reference_id(),
                    approval_date: slot.approval_date(),
                    note: slot.note().map(str::to_owned),
                    updated_at: slot.updated_at(),
                };
                (slot.id(), write.expected.reference_id(), changeset)
            })
            .collect();
        let task_changeset = TaskApprovalChangeset {
            approval_status_id: resolution.task_status.reference_id(),
            approved_by: resolution
                .final_approval
                .map(|(approver, _)| Some(approver.value())),
            approval_date: resolution.final_approval.map(|(_, at)| Some(at)),
            updated_by: resolution.actor.value(),
            updated_at: resolution.resolved_at,
        };

        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                let touched = diesel::update(tasks::table)
                    .filter(tasks::id.eq(task_id.into_inner()))
                    .filter(tasks::tenant_id.eq(tenant.value()))
                    .filter(tasks::deleted_at.is_null())
                    .set(&task_changeset)
                    .execute(tx)?;
                if touched == 0 {
                    return Err(TaskRepositoryError::NotFound(task_id));
                }

                for (slot_id, expected_status, changeset) in &slot_updates {
                    let swapped = diesel::update(approval_tasks::table)
                        .filter(approval_tasks::id.eq(slot_id.into_inner()))
                        .filter(approval_tasks::task_id.eq(task_id.into_inner()))
                        .filter(approval_tasks::status_id.eq(expected_status))
                        .set(changeset)
                        .execute(tx)?;
                    if swapped == 0 {
                        return Err(TaskRepositoryError::SlotConflict(*slot_id));
                    }
                }
                Ok(())
            })
        })
        .await
    }
}

fn live_tasks(tenant: TenantId) -> tasks::BoxedQuery<'static, Pg> {
    tasks::table
        .filter(tasks::tenant_id.eq(tenant.value()))
        .filter(tasks::deleted_at.is_null())
        .into_boxed()
}

fn filtered_tasks(tenant: TenantId, query: &TaskListQuery) -> tasks::BoxedQuery<'static, Pg> {
    let mut statement = live_tasks(tenant);
    if let Some(needle) = query.search() {
        let pattern = format!("%{}%", escape_like(needle));
        statement = statement.filter(
            tasks::code
                .ilike(pattern.clone())
                .or(tasks::title.ilike(pattern)),
        );
    }
    if let Some(project) = query.project_id() {
        statement = statement.filter(tasks::project_id.eq(project.value()));
    }
    if let Some(status) = query.status() {
        statement = statement.filter(tasks::status_id.eq(status.reference_id()));
    }
    if let Some(approval) = query.approval_status() {
        statement = statement.filter(tasks::approval_status_id.eq(approval.reference_id()));
    }
    if let Some(assignee) = query.assigned_to() {
        statement = statement.filter(tasks::assigned_to.eq(assignee.value()));
    }
    if let Some(from) = query.created_from() {
        statement = statement.filter(tasks::created_at.ge(from));
    }
    if let Some(to) = query.created_to() {
        statement = statement.filter(tasks::created_at.le(to));
    }
    statement
}

fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for ch in needle.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn load_aggregate(connection: &mut PgConnection, row: TaskRow) -> TaskRepositoryResult<Task> {
    let mut loaded = load_aggregates(connection, vec![row])?;
    loaded
        .pop()
        .ok_or_else(|| TaskRepositoryError::persistence(std::io::Error::other("task row vanished")))
}

fn load_aggregates(
    connection: &mut PgConnection,
    rows: Vec<TaskRow>,
) -> TaskRepositoryResult<Vec<Task>> {
    let ids: Vec<uuid::Uuid> = rows.iter().map(|row| row.id).collect();

    let mut slots_by_task: HashMap<uuid::Uuid, Vec<ApprovalSlotRow>> = HashMap::new();
    for slot in approval_tasks::table
        .filter(approval_tasks::task_id.eq_any(&ids))
        .select(ApprovalSlotRow::as_select())
        .load::<ApprovalSlotRow>(connection)?
    {
        slots_by_task.entry(slot.task_id).or_default().push(slot);
    }

    let mut files_by_task: HashMap<uuid::Uuid, Vec<TaskFileRow>> = HashMap::new();
    for file in task_files::table
        .filter(task_files::task_id.eq_any(&ids))
        .order(task_files::created_at.asc())
        .select(TaskFileRow::as_select())
        .load::<TaskFileRow>(connection)?
    {
        files_by_task.entry(file.task_id).or_default().push(file);
    }

    rows.into_iter()
        .map(|row| {
            let slots = slots_by_task.remove(&row.id).unwrap_or_default();
            let files = files_by_task.remove(&row.id).unwrap_or_default();
            row_to_task(row, slots, files)
        })
        .collect()
}

fn to_task_row(task: &Task) -> TaskRow {
    TaskRow {
        id: task.id().into_inner(),
        tenant_id: task.tenant_id().value(),
        project_id: task.project_id().value(),
        code: task.code().as_str().to_owned(),
        title: task.title().as_str().to_owned(),
        description: task.description().map(str::to_owned),
        description_before: task.description_before().map(str::to_owned),
        description_after: task.description_after().map(str::to_owned),
        reason: task.reason().map(str::to_owned),
        revision: task.revision().map(str::to_owned),
        priority_id: task.priority().value(),
        type_id: task.task_type().map(ReferenceId::value),
        stack_id: task.stack().map(ReferenceId::value),
        assigned_to: task.assigned_to().map(UserId::value),
        created_by: task.created_by().value(),
        updated_by: task.updated_by().map(UserId::value),
        approved_by: task.approved_by().map(UserId::value),
        completed_by: task.completed_by().map(UserId::value),
        done_by: task.done_by().map(UserId::value),
        status_id: task.status().reference_id(),
        is_active: task.is_active(),
        approval_status_id: task.approval_status().reference_id(),
        approval_date: task.approval_date(),
        start_date: task.start_date(),
        due_date: task.due_date(),
        completed_date: task.completed_date(),
        done_at: task.done_at(),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
        deleted_at: task.deleted_at(),
    }
}

fn to_slot_row(slot: &ApprovalSlot) -> ApprovalSlotRow {
    ApprovalSlotRow {
        id: slot.id().into_inner(),
        task_id: slot.task_id().into_inner(),
        sequence: slot.sequence().value(),
        approved_by: slot.approved_by().map(UserId::value),
        status_id: slot.status().reference_id(),
        approval_date: slot.approval_date(),
        note: slot.note().map(str::to_owned),
        is_active: slot.is_active(),
        created_at: slot.created_at(),
        updated_at: slot.updated_at(),
    }
}

fn to_file_rows(files: &[TaskFile]) -> TaskRepositoryResult<Vec<TaskFileRow>> {
    files
        .iter()
        .map(|file| {
            Ok(TaskFileRow {
                id: file.id.into_inner(),
                task_id: file.task_id.into_inner(),
                file_name: file.file_name.clone(),
                file_path: file.file_path.clone(),
                file_size: i64::try_from(file.file_size)
                    .map_err(TaskRepositoryError::persistence)?,
                file_type: file.file_type.clone(),
                category_id: file.category.reference_id(),
                is_active: file.active,
                created_at: file.created_at,
            })
        })
        .collect()
}

fn to_changeset(patch: &TaskPatch) -> TaskChangeset {
    TaskChangeset {
        title: patch.title.as_ref().map(|title| title.as_str().to_owned()),
        description: patch.description.clone(),
        description_before: patch.description_before.clone(),
        description_after: patch.description_after.clone(),
        reason: patch.reason.clone(),
        revision: patch.revision.clone(),
        project_id: patch.project_id.map(ProjectId::value),
        priority_id: patch.priority.map(ReferenceId::value),
        type_id: patch.task_type.map(|value| value.map(ReferenceId::value)),
        stack_id: patch.stack.map(|value| value.map(ReferenceId::value)),
        assigned_to: patch.assigned_to.map(|value| value.map(UserId::value)),
        status_id: patch.status.map(ExecutionStatus::reference_id),
        due_date: patch.due_date,
        done_by: patch.done.map(|(user, _)| Some(user.value())),
        done_at: patch.done.map(|(_, at)| Some(at)),
        updated_by: patch.touched.map(|(user, _)| Some(user.value())),
        updated_at: patch.touched.map(|(_, at)| at),
    }
}

fn row_to_task(
    row: TaskRow,
    slot_rows: Vec<ApprovalSlotRow>,
    file_rows: Vec<TaskFileRow>,
) -> TaskRepositoryResult<Task> {
    let id = TaskId::from_uuid(row.id);
    let slots = slot_rows
        .into_iter()
        .map(row_to_slot)
        .collect::<TaskRepositoryResult<Vec<_>>>()?;
    let approvals =
        ApprovalPipeline::from_slots(id, slots).map_err(TaskRepositoryError::persistence)?;
    let attachments = file_rows
        .into_iter()
        .map(row_to_file)
        .collect::<TaskRepositoryResult<Vec<_>>>()?;

    let data = PersistedTaskData {
        id,
        tenant_id: TenantId::new(row.tenant_id).map_err(TaskRepositoryError::persistence)?,
        project_id: ProjectId::new(row.project_id).map_err(TaskRepositoryError::persistence)?,
        code: TaskCode::parse(row.code).map_err(TaskRepositoryError::persistence)?,
        title: TaskTitle::new(row.title).map_err(TaskRepositoryError::persistence)?,
        description: row.description,
        description_before: row.description_before,
        description_after: row.description_after,
        reason: row.reason,
        revision: row.revision,
        priority: reference(row.priority_id)?,
        task_type: row.type_id.map(reference).transpose()?,
        stack: row.stack_id.map(reference).transpose()?,
        assigned_to: row.assigned_to.map(user).transpose()?,
        created_by: user(row.created_by)?,
        updated_by: row.updated_by.map(user).transpose()?,
        approved_by: row.approved_by.map(user).transpose()?,
        completed_by: row.completed_by.map(user).transpose()?,
        done_by: row.done_by.map(user).transpose()?,
        status: ExecutionStatus::try_from(row.status_id)
            .map_err(TaskRepositoryError::persistence)?,
        active: row.is_active,
        approval_status: ApprovalStatus::try_from(row.approval_status_id)
            .map_err(TaskRepositoryError::persistence)?,
        approval_date: row.approval_date,
        start_date: row.start_date,
        due_date: row.due_date,
        completed_date: row.completed_date,
        done_at: row.done_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
        deleted_at: row.deleted_at,
        attachments,
        approvals,
    };
    Ok(Task::from_persisted(data))
}

fn row_to_slot(row: ApprovalSlotRow) -> TaskRepositoryResult<ApprovalSlot> {
    let sequence = ApprovalSequence::try_from(row.sequence).map_err(|value| {
        TaskRepositoryError::persistence(std::io::Error::other(format!(
            "invalid approval sequence {value}"
        )))
    })?;
    Ok(ApprovalSlot::from_persisted(PersistedApprovalSlotData {
        id: ApprovalSlotId::from_uuid(row.id),
        task_id: TaskId::from_uuid(row.task_id),
        sequence,
        approved_by: row.approved_by.map(user).transpose()?,
        status: SlotStatus::try_from(row.status_id).map_err(TaskRepositoryError::persistence)?,
        approval_date: row.approval_date,
        note: row.note,
        active: row.is_active,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

fn row_to_file(row: TaskFileRow) -> TaskRepositoryResult<TaskFile> {
    Ok(TaskFile {
        id: TaskFileId::from_uuid(row.id),
        task_id: TaskId::from_uuid(row.task_id),
        file_name: row.file_name,
        file_path: row.file_path,
        file_size: u64::try_from(row.file_size).map_err(TaskRepositoryError::persistence)?,
        file_type: row.file_type,
        category: AttachmentCategory::try_from(row.category_id)
            .map_err(TaskRepositoryError::persistence)?,
        active: row.is_active,
        created_at: row.created_at,
    })
}

fn user(value: i64) -> TaskRepositoryResult<UserId> {
    UserId::new(value).map_err(TaskRepositoryError::persistence)
}

fn reference(value: i64) -> TaskRepositoryResult<ReferenceId> {
    ReferenceId::new(value).map_err(TaskRepositoryError::persistence)
}

fn is_task_code_unique_violation(info: &dyn DatabaseErrorInformation) -> bool {
    info.constraint_name()
        .is_some_and(|name| name == TASK_CODE_UNIQUE_CONSTRAINT)
}
