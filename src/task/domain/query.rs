//! Task listing filters and pagination.

use super::{ApprovalStatus, ExecutionStatus, ProjectId, Task, TaskDomainError, UserId};
use chrono::{DateTime, Utc};

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 100;

/// Which listing a caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
    /// The task board: only fully approved tasks, whatever the caller asked.
    Tasks,
    /// The approver inbox: every approval state, honouring the caller's
    /// approval filter.
    Requests,
}

/// Filters and page window for task listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListQuery {
    search: Option<String>,
    project_id: Option<ProjectId>,
    status: Option<ExecutionStatus>,
    approval_status: Option<ApprovalStatus>,
    assigned_to: Option<UserId>,
    created_from: Option<DateTime<Utc>>,
    created_to: Option<DateTime<Utc>>,
    page: u32,
    limit: u32,
}

impl Default for TaskListQuery {
    fn default() -> Self {
        Self {
            search: None,
            project_id: None,
            status: None,
            approval_status: None,
            assigned_to: None,
            created_from: None,
            created_to: None,
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl TaskListQuery {
    /// Creates an unfiltered query for the first page.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters by a case-insensitive substring of code or title.
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let needle = search.into().trim().to_owned();
        self.search = (!needle.is_empty()).then_some(needle);
        self
    }

    /// Filters by project.
    #[must_use]
    pub const fn with_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    /// Filters by execution status.
    #[must_use]
    pub const fn with_status(mut self, status: ExecutionStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Filters by aggregate approval status.
    #[must_use]
    pub const fn with_approval_status(mut self, approval_status: ApprovalStatus) -> Self {
        self.approval_status = Some(approval_status);
        self
    }

    /// Filters by assignee.
    #[must_use]
    pub const fn with_assignee(mut self, assigned_to: UserId) -> Self {
        self.assigned_to = Some(assigned_to);
        self
    }

    /// Restricts creation time to an inclusive range; either end may be open.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidDateRange`] when `to` precedes
    /// `from`.
    pub fn with_created_between(
        mut self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Self, TaskDomainError> {
        if let (Some(start), Some(end)) = (from, to)
            && end < start
        {
            return Err(TaskDomainError::InvalidDateRange);
        }
        self.created_from = from;
        self.created_to = to;
        Ok(self)
    }

    /// Selects a page window.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidPage`] for page zero and
    /// [`TaskDomainError::InvalidLimit`] for a limit outside `1..=100`.
    pub fn with_page(mut self, page: u32, limit: u32) -> Result<Self, TaskDomainError> {
        if page == 0 {
            return Err(TaskDomainError::InvalidPage(page));
        }
        if limit == 0 || limit > MAX_LIMIT {
            return Err(TaskDomainError::InvalidLimit {
                max: MAX_LIMIT,
                actual: limit,
            });
        }
        self.page = page;
        self.limit = limit;
        Ok(self)
    }

    /// Returns the query a listing mode actually runs.
    ///
    /// [`ListMode::Tasks`] always narrows to approved tasks.
    #[must_use]
    pub fn for_mode(mut self, mode: ListMode) -> Self {
        if mode == ListMode::Tasks {
            self.approval_status = Some(ApprovalStatus::Approved);
        }
        self
    }

    /// Returns the search needle.
    #[must_use]
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Returns the project filter.
    #[must_use]
    pub const fn project_id(&self) -> Option<ProjectId> {
        self.project_id
    }

    /// Returns the execution status filter.
    #[must_use]
    pub const fn status(&self) -> Option<ExecutionStatus> {
        self.status
    }

    /// Returns the approval status filter.
    #[must_use]
    pub const fn approval_status(&self) -> Option<ApprovalStatus> {
        self.approval_status
    }

    /// Returns the assignee filter.
    #[must_use]
    pub const fn assigned_to(&self) -> Option<UserId> {
        self.assigned_to
    }

    /// Returns the inclusive lower creation bound.
    #[must_use]
    pub const fn created_from(&self) -> Option<DateTime<Utc>> {
        self.created_from
    }

    /// Returns the inclusive upper creation bound.
    #[must_use]
    pub const fn created_to(&self) -> Option<DateTime<Utc>> {
        self.created_to
    }

    /// Returns the 1-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Returns the page size.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Returns the number of rows skipped before this page.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }

    /// Returns `true` when `task` passes every filter of this query.
    ///
    /// Soft-deleted tasks never match.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        let search_hit = self.search.as_deref().is_none_or(|needle| {
            let lowered = needle.to_lowercase();
            task.code().as_str().to_lowercase().contains(&lowered)
                || task.title().as_str().to_lowercase().contains(&lowered)
        });
        !task.is_deleted()
            && search_hit
            && self.project_id.is_none_or(|id| task.project_id() == id)
            && self.status.is_none_or(|status| task.status() == status)
            && self
                .approval_status
                .is_none_or(|status| task.approval_status() == status)
            && self
                .assigned_to
                .is_none_or(|user| task.assigned_to() == Some(user))
            && self.created_from.is_none_or(|from| task.created_at() >= from)
            && self.created_to.is_none_or(|to| task.created_at() <= to)
    }
}

/// One page of listing results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPage {
    /// Tasks on this page, newest first.
    pub items: Vec<Task>,
    /// Number of tasks matching the filters across all pages.
    pub total: u64,
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
}
