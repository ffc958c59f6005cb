use crate::filter::{CompletionFilter, FilterClock, TaskFilter};
use crate::sort::{SortKey, sort_tasks};
use crate::task::Task;

/// Combined selection used by the listing views: completion page, dashboard
/// filter tab and an optional sort order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskQuery {
    /// Completion page.
    pub completion: CompletionFilter,
    /// Date / priority tab.
    pub filter: TaskFilter,
    /// Ordering; `None` keeps server order.
    pub sort: Option<SortKey>,
}

impl TaskQuery {
    /// Query matching everything in server order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to a completion page.
    #[must_use]
    pub const fn completion(mut self, completion: CompletionFilter) -> Self {
        self.completion = completion;
        self
    }

    /// Restrict to a dashboard tab.
    #[must_use]
    pub const fn filter(mut self, filter: TaskFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Order the result.
    #[must_use]
    pub const fn sort(mut self, sort: Option<SortKey>) -> Self {
        self.sort = sort;
        self
    }

    /// Run the query against `tasks`.
    #[must_use]
    pub fn apply(&self, tasks: &[Task], clock: &FilterClock) -> Vec<Task> {
        let selected: Vec<Task> = tasks
            .iter()
            .filter(|task| self.completion.matches(task) && self.filter.matches(task, clock))
            .cloned()
            .collect();
        match self.sort {
            Some(key) => sort_tasks(&selected, key),
            None => selected,
        }
    }
}
