//! Task repository client.

use serde_json::Value;
use taskflow_core::{Task, TaskDraft, TaskId, TaskPatch};
use tracing::warn;

use crate::error::ApiError;
use crate::http::{ApiClient, Auth};

const TASKS_PATH: &str = "/tasks/gp";
const LOAD_FAILED: &str = "Could not load tasks.";
const SAVE_FAILED: &str = "Failed to save task";
const UPDATE_FAILED: &str = "Failed to update task";
const DELETE_FAILED: &str = "Failed to delete task";

/// Remote task collection.
///
/// `create` and `update` return the server's copy of the task when the
/// response carries one; callers refresh the collection either way.
#[allow(async_fn_in_trait)]
pub trait TaskApi: Send + Sync {
    /// Fetch every task of the signed-in user.
    ///
    /// # Errors
    /// Returns an [`ApiError`] when the request fails or is rejected.
    async fn list(&self) -> Result<Vec<Task>, ApiError>;

    /// Create a task.
    ///
    /// # Errors
    /// Returns an [`ApiError`] when the request fails or is rejected.
    async fn create(&self, draft: &TaskDraft) -> Result<Option<Task>, ApiError>;

    /// Send a partial update.
    ///
    /// # Errors
    /// Returns an [`ApiError`] when the request fails or is rejected.
    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<Option<Task>, ApiError>;

    /// Delete a task.
    ///
    /// # Errors
    /// Returns an [`ApiError`] when the request fails or is rejected.
    async fn delete(&self, id: &TaskId) -> Result<(), ApiError>;

    /// Set the completion flag of a task.
    ///
    /// # Errors
    /// Returns an [`ApiError`] when the request fails or is rejected.
    async fn toggle_complete(&self, id: &TaskId, completed: bool) -> Result<(), ApiError> {
        self.update(id, &TaskPatch::completion(completed)).await.map(|_| ())
    }
}

/// [`TaskApi`] over the REST endpoints under `/tasks/gp`.
#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    client: ApiClient,
}

impl HttpTaskApi {
    /// Repository client sharing `client`'s session.
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

fn task_path(id: &TaskId) -> String {
    format!("/tasks/{}/gp", urlencoding::encode(id.as_str()))
}

impl TaskApi for HttpTaskApi {
    async fn list(&self) -> Result<Vec<Task>, ApiError> {
        let body = self.client.get(TASKS_PATH, Auth::Session, LOAD_FAILED).await?;
        Ok(tasks_from_body(body))
    }

    async fn create(&self, draft: &TaskDraft) -> Result<Option<Task>, ApiError> {
        let body = self
            .client
            .post(TASKS_PATH, draft, Auth::Session, SAVE_FAILED)
            .await?;
        Ok(task_from_body(body))
    }

    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<Option<Task>, ApiError> {
        let body = self
            .client
            .put(&task_path(id), patch, Auth::Session, UPDATE_FAILED)
            .await?;
        Ok(task_from_body(body))
    }

    async fn delete(&self, id: &TaskId) -> Result<(), ApiError> {
        self.client
            .delete(&task_path(id), Auth::Session, DELETE_FAILED)
            .await?;
        Ok(())
    }
}

/// Normalize the list response: a bare array, `{tasks}` or `{data}`.
/// Any other shape is an empty collection.
pub(crate) fn tasks_from_body(body: Value) -> Vec<Task> {
    let records = match body {
        Value::Array(records) => records,
        Value::Object(mut map) => ["tasks", "data"]
            .into_iter()
            .find_map(|key| match map.remove(key) {
                Some(Value::Array(records)) => Some(records),
                _ => None,
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    };
    records
        .into_iter()
        .filter_map(|record| match serde_json::from_value::<Task>(record) {
            Ok(task) => Some(task),
            Err(err) => {
                warn!(error = %err, "skipping malformed task record");
                None
            }
        })
        .collect()
}

/// Single task, bare or wrapped in `{task}` / `{data}`.
fn task_from_body(body: Value) -> Option<Task> {
    let record = match body {
        Value::Object(mut map) => {
            let inner = ["task", "data"]
                .into_iter()
                .find(|key| map.get(*key).is_some_and(Value::is_object))
                .and_then(|key| map.remove(key));
            inner.unwrap_or(Value::Object(map))
        }
        _ => return None,
    };
    serde_json::from_value(record).ok()
}
