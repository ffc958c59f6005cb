//! Error types shared by the domain layer.

use thiserror::Error;

/// Failure to interpret a user-facing token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Unknown filter key.
    #[error("invalid filter: {0} (expected all, today, week, high, medium or low)")]
    Filter(String),
    /// Unknown completion filter key.
    #[error("invalid status: {0} (expected all, pending or completed)")]
    Completion(String),
    /// Unknown sort key.
    #[error("invalid sort order: {0} (expected newest, oldest or priority)")]
    Sort(String),
    /// Unknown priority.
    #[error("invalid priority: {0} (expected low, medium or high)")]
    Priority(String),
    /// Blank or malformed task identifier.
    #[error("invalid task id: {0:?}")]
    TaskId(String),
    /// Date not in `YYYY-MM-DD` form.
    #[error("invalid date: {0} (expected YYYY-MM-DD)")]
    Date(String),
}

/// Client-side validation failure. Raised before any network call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Task title is blank.
    #[error("Task title is required.")]
    EmptyTitle,
    /// Due date lies before today.
    #[error("Due date cannot be in the past.")]
    DueDateInPast,
    /// New password and confirmation differ.
    #[error("Passwords do not match")]
    PasswordMismatch,
    /// Required form field left blank.
    #[error("{0} is required.")]
    MissingField(&'static str),
}
