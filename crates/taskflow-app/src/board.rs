//! Transient task collection with stale-load protection and optimistic toggles.

use taskflow_core::{Task, TaskId};
use tracing::warn;

/// Loading state of the board.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadStatus {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// A load is in flight.
    Loading,
    /// The collection reflects a successful load.
    Ready,
    /// The latest load failed; the previous collection is kept.
    Failed(String),
}

/// Generation number handed out by [`TaskBoard::begin_load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(u64);

/// Result of [`TaskBoard::finish_load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The response replaced the collection.
    Applied,
    /// A newer load was already applied; the response was dropped.
    Stale,
}

/// Lifecycle of an [`OptimisticToggle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Applied locally, waiting for the server.
    Pending,
    /// The server accepted the change.
    Committed,
    /// The server refused; the previous value was restored.
    RolledBack,
}

/// A completion flip applied locally before the server confirmed it.
///
/// Resolved exactly once through [`TaskBoard::commit`] or [`TaskBoard::rollback`].
#[derive(Debug)]
#[must_use = "an optimistic toggle must be committed or rolled back"]
pub struct OptimisticToggle {
    id: TaskId,
    previous: bool,
    target: bool,
    base_generation: u64,
    state: TransactionState,
}

impl OptimisticToggle {
    /// Task being toggled.
    #[must_use]
    pub const fn id(&self) -> &TaskId {
        &self.id
    }

    /// Completion value being requested.
    #[must_use]
    pub const fn target(&self) -> bool {
        self.target
    }

    /// Current state; `Pending` until resolved.
    #[must_use]
    pub const fn state(&self) -> TransactionState {
        self.state
    }
}

/// Client-side copy of the collection, re-derived from each successful load.
#[derive(Debug, Default)]
pub struct TaskBoard {
    tasks: Vec<Task>,
    issued: u64,
    applied: u64,
    status: LoadStatus,
}

impl TaskBoard {
    /// Empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current collection in server order.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Loading state.
    #[must_use]
    pub const fn status(&self) -> &LoadStatus {
        &self.status
    }

    /// Look a task up by id.
    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == id)
    }

    /// Register a new load request.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.issued += 1;
        self.status = LoadStatus::Loading;
        LoadTicket(self.issued)
    }

    /// Apply a load result unless a newer one is already in place.
    pub fn finish_load(&mut self, ticket: LoadTicket, tasks: Vec<Task>) -> LoadOutcome {
        if ticket.0 <= self.applied {
            warn!(
                generation = ticket.0,
                applied = self.applied,
                "discarding stale task list"
            );
            return LoadOutcome::Stale;
        }
        self.applied = ticket.0;
        self.tasks = tasks;
        if ticket.0 == self.issued {
            self.status = LoadStatus::Ready;
        }
        LoadOutcome::Applied
    }

    /// Record a failed load. Only the newest request decides the status.
    pub fn fail_load(&mut self, ticket: LoadTicket, message: impl Into<String>) {
        if ticket.0 == self.issued {
            self.status = LoadStatus::Failed(message.into());
        }
    }

    /// Flip the completion flag of `id` locally.
    ///
    /// Returns `None` when the task is not on the board.
    pub fn begin_toggle(&mut self, id: &TaskId) -> Option<OptimisticToggle> {
        let base_generation = self.applied;
        let task = self.tasks.iter_mut().find(|task| &task.id == id)?;
        let previous = task.completed;
        task.completed = !previous;
        Some(OptimisticToggle {
            id: id.clone(),
            previous,
            target: !previous,
            base_generation,
            state: TransactionState::Pending,
        })
    }

    /// Accept the optimistic value.
    pub fn commit(&mut self, mut toggle: OptimisticToggle) -> TransactionState {
        if self.applied == toggle.base_generation
            && let Some(task) = self.tasks.iter_mut().find(|task| task.id == toggle.id)
        {
            task.completed = toggle.target;
        }
        toggle.state = TransactionState::Committed;
        toggle.state
    }

    /// Restore the value the task had before the toggle.
    ///
    /// A collection loaded after the toggle began already holds server truth
    /// and is left alone.
    pub fn rollback(&mut self, mut toggle: OptimisticToggle) -> TransactionState {
        if self.applied == toggle.base_generation
            && let Some(task) = self.tasks.iter_mut().find(|task| task.id == toggle.id)
        {
            task.completed = toggle.previous;
        }
        toggle.state = TransactionState::RolledBack;
        toggle.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, completed: bool) -> Task {
        let mut task = Task::new(id.parse().unwrap_or_else(|err| panic!("id: {err}")), id);
        task.completed = completed;
        task
    }

    fn id(raw: &str) -> TaskId {
        raw.parse().unwrap_or_else(|err| panic!("id: {err}"))
    }

    #[test]
    fn older_responses_cannot_overwrite_newer_ones() {
        let mut board = TaskBoard::new();
        let first = board.begin_load();
        let second = board.begin_load();
        assert!(second > first);

        assert_eq!(board.finish_load(second, vec![task("new", false)]), LoadOutcome::Applied);
        assert_eq!(board.status(), &LoadStatus::Ready);
        assert_eq!(board.finish_load(first, vec![task("old", false)]), LoadOutcome::Stale);
        assert_eq!(board.tasks()[0].id, id("new"));
    }

    #[test]
    fn out_of_order_older_response_is_applied_until_newer_arrives() {
        let mut board = TaskBoard::new();
        let first = board.begin_load();
        let second = board.begin_load();
        assert_eq!(board.finish_load(first, vec![task("a", false)]), LoadOutcome::Applied);
        assert_eq!(board.status(), &LoadStatus::Loading);
        assert_eq!(board.finish_load(second, vec![task("b", false)]), LoadOutcome::Applied);
        assert_eq!(board.status(), &LoadStatus::Ready);
    }

    #[test]
    fn failure_keeps_previous_collection() {
        let mut board = TaskBoard::new();
        let ticket = board.begin_load();
        let _ = board.finish_load(ticket, vec![task("a", false)]);
        let retry = board.begin_load();
        board.fail_load(retry, "Could not load tasks.");
        assert_eq!(board.status(), &LoadStatus::Failed("Could not load tasks.".into()));
        assert_eq!(board.tasks().len(), 1);
    }

    #[test]
    fn toggle_commits_or_rolls_back() {
        let mut board = TaskBoard::new();
        let ticket = board.begin_load();
        let _ = board.finish_load(ticket, vec![task("a", false)]);

        let toggle = board
            .begin_toggle(&id("a"))
            .unwrap_or_else(|| panic!("task a is on the board"));
        assert_eq!(toggle.state(), TransactionState::Pending);
        assert!(toggle.target());
        assert!(board.get(&id("a")).is_some_and(|task| task.completed));
        assert_eq!(board.commit(toggle), TransactionState::Committed);
        assert!(board.get(&id("a")).is_some_and(|task| task.completed));

        let toggle = board
            .begin_toggle(&id("a"))
            .unwrap_or_else(|| panic!("task a is on the board"));
        assert!(!toggle.target());
        assert_eq!(board.rollback(toggle), TransactionState::RolledBack);
        assert!(board.get(&id("a")).is_some_and(|task| task.completed));
    }

    #[test]
    fn rollback_leaves_newer_server_state_alone() {
        let mut board = TaskBoard::new();
        let ticket = board.begin_load();
        let _ = board.finish_load(ticket, vec![task("a", false)]);
        let toggle = board
            .begin_toggle(&id("a"))
            .unwrap_or_else(|| panic!("task a is on the board"));

        let reload = board.begin_load();
        let _ = board.finish_load(reload, vec![task("a", true)]);
        let _ = board.rollback(toggle);
        assert!(board.get(&id("a")).is_some_and(|task| task.completed));
    }

    #[test]
    fn toggling_unknown_task_does_nothing() {
        let mut board = TaskBoard::new();
        assert!(board.begin_toggle(&id("missing")).is_none());
    }
}
