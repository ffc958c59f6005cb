//! Task model and the ingestion boundary that normalizes server payloads.
//!
//! The backend is loose about encodings: completion arrives as a boolean, a
//! number or a `"Yes"`/`"No"` string, identifiers as `_id` or `id`, and dates
//! as RFC 3339 strings, bare dates or epoch milliseconds. Everything is
//! converted here, once, into canonical Rust types. Code past this module never
//! looks at the raw encodings again.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, UtcOffset};

use crate::id::TaskId;
use crate::priority::Priority;

/// A task as held by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TaskRecord", rename_all = "camelCase")]
pub struct Task {
    /// Server-assigned identifier.
    pub id: TaskId,
    /// Short title.
    pub title: String,
    /// Free-form description (empty when absent).
    pub description: String,
    /// Priority; `None` when missing or unrecognized.
    pub priority: Option<Priority>,
    /// Due timestamp.
    #[serde(serialize_with = "time::serde::rfc3339::option::serialize")]
    pub due_date: Option<OffsetDateTime>,
    /// Canonical completion flag.
    pub completed: bool,
    /// Creation timestamp.
    #[serde(serialize_with = "time::serde::rfc3339::option::serialize")]
    pub created_at: Option<OffsetDateTime>,
    /// Ordered checklist.
    pub subtasks: Vec<Subtask>,
}

impl Task {
    /// Create a pending task with no optional fields set.
    #[must_use]
    pub fn new(id: TaskId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: String::new(),
            priority: None,
            due_date: None,
            completed: false,
            created_at: None,
            subtasks: Vec::new(),
        }
    }

    /// Calendar day of the due date as seen from `offset`.
    #[must_use]
    pub fn due_day(&self, offset: UtcOffset) -> Option<Date> {
        self.due_date.map(|due| due.to_offset(offset).date())
    }

    /// Share of completed subtasks in percent, 0 without subtasks.
    #[must_use]
    pub fn subtask_progress(&self) -> u32 {
        let done = self.subtasks.iter().filter(|sub| sub.completed).count();
        crate::stats::percentage(done, self.subtasks.len())
    }
}

/// Checklist entry inside a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SubtaskRecord")]
pub struct Subtask {
    /// Display text.
    pub label: String,
    /// Completion flag, normalized like the task flag.
    pub completed: bool,
}

/// Interpret any server encoding of a completion flag.
///
/// `true`, the number `1` and the string `"yes"` (any case) mean completed;
/// everything else, including a missing value, means pending.
#[must_use]
pub fn completion_from_wire(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => {
            number.as_i64() == Some(1)
                || number
                    .as_f64()
                    .is_some_and(|float| (float - 1.0).abs() < f64::EPSILON)
        }
        Some(Value::String(text)) => text.eq_ignore_ascii_case("yes"),
        _ => false,
    }
}

/// Encoding used when sending a completion flag to the server.
#[must_use]
pub const fn completion_to_wire(completed: bool) -> &'static str {
    if completed { "Yes" } else { "No" }
}

/// Parse a server timestamp: RFC 3339, `YYYY-MM-DD` (midnight UTC) or epoch
/// milliseconds. Unparseable values yield `None`.
#[must_use]
pub fn timestamp_from_wire(value: Option<&Value>) -> Option<OffsetDateTime> {
    match value? {
        Value::String(text) => parse_timestamp_text(text),
        Value::Number(number) => {
            let millis = number.as_i64()?;
            OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok()
        }
        _ => None,
    }
}

fn parse_timestamp_text(text: &str) -> Option<OffsetDateTime> {
    let trimmed = text.trim();
    if let Ok(parsed) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Some(parsed);
    }
    parse_date(trimmed).map(|date| date.midnight().assume_utc())
}

/// Parse a bare `YYYY-MM-DD` date.
#[must_use]
pub fn parse_date(text: &str) -> Option<Date> {
    Date::parse(text.trim(), format_description!("[year]-[month]-[day]")).ok()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskRecord {
    #[serde(rename = "_id")]
    mongo_id: Option<Value>,
    id: Option<Value>,
    title: Option<String>,
    description: Option<String>,
    priority: Option<Value>,
    due_date: Option<Value>,
    completed: Option<Value>,
    created_at: Option<Value>,
    subtasks: Option<Vec<Value>>,
}

impl TryFrom<TaskRecord> for Task {
    type Error = String;

    fn try_from(record: TaskRecord) -> Result<Self, Self::Error> {
        let id = record
            .mongo_id
            .as_ref()
            .and_then(id_text)
            .or_else(|| record.id.as_ref().and_then(id_text))
            .ok_or_else(|| "task record has no _id or id".to_owned())?
            .parse::<TaskId>()
            .map_err(|err| err.to_string())?;

        let priority = record
            .priority
            .as_ref()
            .and_then(Value::as_str)
            .and_then(Priority::from_wire);

        let subtasks = record
            .subtasks
            .unwrap_or_default()
            .into_iter()
            .filter_map(|raw| serde_json::from_value::<Subtask>(raw).ok())
            .collect();

        Ok(Self {
            id,
            title: record.title.unwrap_or_default(),
            description: record.description.unwrap_or_default(),
            priority,
            due_date: timestamp_from_wire(record.due_date.as_ref()),
            completed: completion_from_wire(record.completed.as_ref()),
            created_at: timestamp_from_wire(record.created_at.as_ref()),
            subtasks,
        })
    }
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct SubtaskRecord {
    #[serde(alias = "title", alias = "text")]
    label: Option<String>,
    completed: Option<Value>,
}

impl From<SubtaskRecord> for Subtask {
    fn from(record: SubtaskRecord) -> Self {
        Self {
            label: record.label.unwrap_or_default(),
            completed: completion_from_wire(record.completed.as_ref()),
        }
    }
}
