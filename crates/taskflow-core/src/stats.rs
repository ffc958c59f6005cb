//! Statistics derived from a task collection.

use serde::Serialize;

use crate::priority::Priority;
use crate::task::Task;

/// Counters shown on the dashboard and sidebar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    /// Number of tasks.
    pub total: usize,
    /// Completed tasks.
    pub completed: usize,
    /// Tasks not yet completed.
    pub pending: usize,
    /// `round(completed / total * 100)`, or 0 for an empty collection.
    pub completion_percentage: u32,
    /// Tasks with low priority.
    pub low: usize,
    /// Tasks with medium priority.
    pub medium: usize,
    /// Tasks with high priority.
    pub high: usize,
}

impl TaskStats {
    /// Compute statistics for `tasks`.
    #[must_use]
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut stats = Self {
            total: tasks.len(),
            ..Self::default()
        };
        for task in tasks {
            if task.completed {
                stats.completed += 1;
            }
            match task.priority {
                Some(Priority::Low) => stats.low += 1,
                Some(Priority::Medium) => stats.medium += 1,
                Some(Priority::High) => stats.high += 1,
                None => {}
            }
        }
        stats.pending = stats.total - stats.completed;
        stats.completion_percentage = percentage(stats.completed, stats.total);
        stats
    }

    /// Count of tasks with the given priority.
    #[must_use]
    pub const fn by_priority(&self, priority: Priority) -> usize {
        match priority {
            Priority::Low => self.low,
            Priority::Medium => self.medium,
            Priority::High => self.high,
        }
    }
}

/// `round(part / whole * 100)` computed in `f64`, as the web dashboard does;
/// 0 when `whole` is 0.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn percentage(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as u32
}

/// The first `limit` tasks in collection order ("recent activity").
#[must_use]
pub fn recent(tasks: &[Task], limit: usize) -> &[Task] {
    &tasks[..tasks.len().min(limit)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tasks(values: serde_json::Value) -> Vec<Task> {
        serde_json::from_value(values).unwrap_or_else(|err| panic!("tasks must parse: {err}"))
    }

    #[test]
    fn mixed_completion_encodings_are_counted_once() {
        let tasks = tasks(json!([
            { "_id": "a", "completed": "Yes" },
            { "_id": "b", "completed": 1 },
            { "_id": "c", "completed": true },
            { "_id": "d", "completed": "No" }
        ]));
        let stats = TaskStats::from_tasks(&tasks);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.completed, 3);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.completion_percentage, 75);
    }

    #[test]
    fn empty_collection_has_zero_percentage() {
        let stats = TaskStats::from_tasks(&[]);
        assert_eq!(stats, TaskStats::default());
        assert_eq!(stats.completion_percentage, 0);
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(3, 3), 100);
        assert_eq!(percentage(0, 7), 0);
        assert_eq!(percentage(5, 0), 0);
    }

    #[test]
    fn counts_add_up_and_priorities_are_bucketed() {
        let tasks = tasks(json!([
            { "_id": "a", "priority": "low" },
            { "_id": "b", "priority": "High", "completed": true },
            { "_id": "c", "priority": "HIGH" },
            { "_id": "d", "priority": "someday" },
            { "_id": "e", "priority": "Medium", "completed": "yes" }
        ]));
        let stats = TaskStats::from_tasks(&tasks);
        assert_eq!(stats.completed + stats.pending, stats.total);
        assert_eq!(stats.by_priority(Priority::Low), 1);
        assert_eq!(stats.by_priority(Priority::Medium), 1);
        assert_eq!(stats.by_priority(Priority::High), 2);
        assert_eq!(stats.completion_percentage, 40);
        assert_eq!(TaskStats::from_tasks(&tasks), stats);
    }

    #[test]
    fn recent_takes_leading_tasks() {
        let tasks = tasks(json!([{ "_id": "a" }, { "_id": "b" }, { "_id": "c" }, { "_id": "d" }]));
        let ids: Vec<_> = recent(&tasks, 3).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(recent(&tasks[..1], 3).len(), 1);
    }
}
