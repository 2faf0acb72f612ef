//! Human-readable task codes.

use super::TaskDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

const TASK_CODE_INFIX: &str = "-TASK-";
const MAX_PROJECT_CODE_LENGTH: usize = 100;

/// Short code of the project that owns a task, for example `ENG`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectCode(String);

impl ProjectCode {
    /// Creates a validated project code.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidProjectCode`] when the trimmed value
    /// is empty, longer than 100 characters or contains whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        let is_valid = !trimmed.is_empty()
            && trimmed.chars().count() <= MAX_PROJECT_CODE_LENGTH
            && !trimmed.chars().any(char::is_whitespace);
        if !is_valid {
            return Err(TaskDomainError::InvalidProjectCode(raw));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the code as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Durable task code, unique within a tenant and immutable once assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskCode(String);

impl TaskCode {
    /// Formats the code for the `sequence`-th task of a project.
    ///
    /// The sequence is zero-padded to `width` digits; wider numbers are
    /// printed in full.
    #[must_use]
    pub fn format(project_code: &ProjectCode, sequence: u32, width: usize) -> Self {
        Self(format!("{project_code}{TASK_CODE_INFIX}{sequence:0width$}"))
    }

    /// Parses a code received from a caller or from storage.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTaskCode`] when the value does not
    /// consist of a project code, the `-TASK-` infix and a decimal number.
    pub fn parse(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        let is_valid = trimmed
            .rsplit_once(TASK_CODE_INFIX)
            .is_some_and(|(project, number)| {
                ProjectCode::new(project).is_ok()
                    && !number.is_empty()
                    && number.chars().all(|ch| ch.is_ascii_digit())
            });
        if !is_valid {
            return Err(TaskDomainError::InvalidTaskCode(raw));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the code as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TaskCode {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for TaskCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
