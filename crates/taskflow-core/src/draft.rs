//! Outgoing task payloads and their client-side validation.

use serde::{Serialize, Serializer};
use time::Date;
use time::macros::format_description;

use crate::error::ValidationError;
use crate::priority::Priority;
use crate::task::completion_to_wire;

/// Fields of a task about to be created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    /// Required title.
    pub title: String,
    /// Optional description.
    pub description: String,
    /// Priority, `Low` unless chosen.
    pub priority: Priority,
    /// Due day.
    #[serde(serialize_with = "serialize_date")]
    pub due_date: Date,
    /// Whether the task starts out completed.
    #[serde(serialize_with = "serialize_completion")]
    pub completed: bool,
}

impl TaskDraft {
    /// Draft with default priority and pending state.
    #[must_use]
    pub fn new(title: impl Into<String>, due_date: Date) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            priority: Priority::default(),
            due_date,
            completed: false,
        }
    }

    /// Check the draft before it is sent.
    ///
    /// # Errors
    /// Returns an error when the title is blank or the due date lies before `today`.
    pub fn validate(&self, today: Date) -> Result<(), ValidationError> {
        require_field("Title", &self.title).map_err(|_| ValidationError::EmptyTitle)?;
        if self.due_date < today {
            return Err(ValidationError::DueDateInPast);
        }
        Ok(())
    }
}

/// Partial update; only `Some` fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    /// New title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New priority.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// New due day.
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_optional_date"
    )]
    pub due_date: Option<Date>,
    /// New completion state.
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_optional_completion"
    )]
    pub completed: Option<bool>,
}

impl TaskPatch {
    /// Patch touching only the completion flag.
    #[must_use]
    pub fn completion(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    /// Returns true when nothing would be sent.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.completed.is_none()
    }

    /// Check the fields that are present.
    ///
    /// # Errors
    /// Returns an error when a new title is blank or a new due date lies before `today`.
    pub fn validate(&self, today: Date) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            require_field("Title", title).map_err(|_| ValidationError::EmptyTitle)?;
        }
        if self.due_date.is_some_and(|due| due < today) {
            return Err(ValidationError::DueDateInPast);
        }
        Ok(())
    }
}

/// Reject blank form values.
///
/// # Errors
/// Returns [`ValidationError::MissingField`] naming `field` when `value` is blank.
pub fn require_field(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(())
    }
}

fn format_date(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| date.to_string())
}

fn serialize_date<S: Serializer>(date: &Date, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_date(*date))
}

#[allow(clippy::ref_option)]
fn serialize_optional_date<S: Serializer>(date: &Option<Date>, s: S) -> Result<S::Ok, S::Error> {
    match date {
        Some(date) => serialize_date(date, s),
        None => s.serialize_none(),
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn serialize_completion<S: Serializer>(completed: &bool, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(completion_to_wire(*completed))
}

#[allow(clippy::ref_option)]
fn serialize_optional_completion<S: Serializer>(
    completed: &Option<bool>,
    s: S,
) -> Result<S::Ok, S::Error> {
    match completed {
        Some(completed) => serialize_completion(completed, s),
        None => s.serialize_none(),
    }
}
