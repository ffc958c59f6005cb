//! Board service: the mutation flow shared by every front end.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use taskflow_core::stats::recent;
use taskflow_core::{FilterClock, Task, TaskDraft, TaskId, TaskPatch, TaskQuery, TaskStats};
use tracing::warn;

use crate::board::{LoadOutcome, LoadStatus, TaskBoard};
use crate::error::ApiError;
use crate::task_api::TaskApi;

type Clock = Box<dyn Fn() -> FilterClock + Send + Sync>;

/// Owns the board and routes every mutation through the repository client.
///
/// The board lock is never held across an `.await`.
pub struct BoardService<A> {
    api: A,
    board: RwLock<TaskBoard>,
    clock: Clock,
}

impl<A: TaskApi> BoardService<A> {
    /// Service using the local clock for date filters and due-date validation.
    #[must_use]
    pub fn new(api: A) -> Self {
        Self {
            api,
            board: RwLock::new(TaskBoard::new()),
            clock: Box::new(FilterClock::local),
        }
    }

    /// Pin "today" to a fixed clock.
    #[must_use]
    pub fn with_clock(mut self, clock: FilterClock) -> Self {
        self.clock = Box::new(move || clock);
        self
    }

    /// Repository client in use.
    #[must_use]
    pub const fn api(&self) -> &A {
        &self.api
    }

    fn read(&self) -> RwLockReadGuard<'_, TaskBoard> {
        self.board.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TaskBoard> {
        self.board.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current clock.
    #[must_use]
    pub fn clock(&self) -> FilterClock {
        (self.clock)()
    }

    /// Reload the collection from the server.
    ///
    /// # Errors
    /// Returns the repository error; the board keeps its previous collection
    /// and records the failure in its status.
    pub async fn refresh(&self) -> Result<LoadOutcome, ApiError> {
        let ticket = self.write().begin_load();
        match self.api.list().await {
            Ok(tasks) => Ok(self.write().finish_load(ticket, tasks)),
            Err(err) => {
                self.write().fail_load(ticket, err.user_message());
                Err(err)
            }
        }
    }

    async fn refresh_after_mutation(&self) {
        if let Err(err) = self.refresh().await {
            warn!(error = %err, "refresh after mutation failed");
        }
    }

    /// Snapshot of the collection in server order.
    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        self.read().tasks().to_vec()
    }

    /// Loading state of the board.
    #[must_use]
    pub fn status(&self) -> LoadStatus {
        self.read().status().clone()
    }

    /// Look a task up by id.
    #[must_use]
    pub fn find(&self, id: &TaskId) -> Option<Task> {
        self.read().get(id).cloned()
    }

    /// Statistics over the whole collection.
    #[must_use]
    pub fn stats(&self) -> TaskStats {
        TaskStats::from_tasks(self.read().tasks())
    }

    /// The first `limit` tasks in server order.
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<Task> {
        recent(self.read().tasks(), limit).to_vec()
    }

    /// Filtered and sorted view of the collection.
    #[must_use]
    pub fn query(&self, query: &TaskQuery) -> Vec<Task> {
        let clock = self.clock();
        query.apply(self.read().tasks(), &clock)
    }

    /// Validate and create a task, then reload.
    ///
    /// # Errors
    /// Returns a validation error without contacting the server, or the
    /// repository error.
    pub async fn create(&self, draft: &TaskDraft) -> Result<Option<Task>, ApiError> {
        draft.validate(self.clock().today)?;
        let created = self.api.create(draft).await?;
        self.refresh_after_mutation().await;
        Ok(created)
    }

    /// Validate and send a partial update, then reload.
    ///
    /// # Errors
    /// Returns a validation error without contacting the server, or the
    /// repository error.
    pub async fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<Option<Task>, ApiError> {
        patch.validate(self.clock().today)?;
        let updated = self.api.update(id, patch).await?;
        self.refresh_after_mutation().await;
        Ok(updated)
    }

    /// Delete a task, then reload.
    ///
    /// # Errors
    /// Returns the repository error.
    pub async fn delete(&self, id: &TaskId) -> Result<(), ApiError> {
        self.api.delete(id).await?;
        self.refresh_after_mutation().await;
        Ok(())
    }

    /// Flip completion optimistically, confirming with the server.
    ///
    /// Returns the new completion value. On failure the local flip is undone.
    ///
    /// # Errors
    /// Returns [`ApiError::UnknownTask`] when the task is not loaded, or the
    /// repository error after rolling back.
    pub async fn toggle_complete(&self, id: &TaskId) -> Result<bool, ApiError> {
        let toggle = self
            .write()
            .begin_toggle(id)
            .ok_or_else(|| ApiError::UnknownTask(id.clone()))?;
        let target = toggle.target();
        match self.api.toggle_complete(id, target).await {
            Ok(()) => {
                self.write().commit(toggle);
                self.refresh_after_mutation().await;
                Ok(target)
            }
            Err(err) => {
                self.write().rollback(toggle);
                Err(err)
            }
        }
    }
}
