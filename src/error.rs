//! Error types for practask.

use crate::storage::StoreError;

/// Top-level error type for task and task-item operations.
///
/// Validation and not-found errors are raised before anything is written.
/// Store errors mean the unit of work was rolled back and the call can be retried.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required input field was not supplied.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A value is not one of the accepted choices.
    #[error("invalid {field} '{value}', expected one of: {expected}")]
    InvalidValue {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    /// A date or timestamp could not be parsed.
    #[error("invalid date for {field}: '{value}'. Use YYYY-MM-DD or RFC 3339")]
    InvalidDate { field: &'static str, value: String },

    /// The plan end date lies before the plan start date.
    #[error("end date {end} is before start date {start}")]
    EndBeforeStart { start: String, end: String },

    /// Scores must be finite numbers.
    #[error("invalid score {0}")]
    InvalidScore(f64),

    /// The referenced row does not exist or belongs to another user.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    /// The terminal could not be read from, written to or restored.
    #[error("terminal error: {0}")]
    Terminal(#[source] std::io::Error),

    /// Storage failure; nothing from the failed unit of work was persisted.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl Error {
    pub(crate) fn task_not_found(id: impl Into<String>) -> Self {
        Self::NotFound { kind: "task", id: id.into() }
    }

    pub(crate) fn item_not_found(id: u64) -> Self {
        Self::NotFound { kind: "task item", id: id.to_string() }
    }

    /// Returns `true` when retrying the same call might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, Error>;
