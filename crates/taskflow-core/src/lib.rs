//! Domain types and pure derivations for the TaskFlow client.
//!
//! Nothing in this crate performs I/O: statistics, filters and sort orders are
//! plain functions over a task slice, so every front end derives the same view
//! from the same collection.

/// Outgoing payloads and validation.
pub mod draft;
/// Error types.
pub mod error;
/// Filter predicates.
pub mod filter;
/// Identifier types.
pub mod id;
/// Task priorities.
pub mod priority;
mod query;
/// Sort orders.
pub mod sort;
/// Derived statistics.
pub mod stats;
/// Task model and wire normalization.
pub mod task;

pub use draft::{TaskDraft, TaskPatch};
pub use error::{ParseError, ValidationError};
pub use filter::{CompletionFilter, FilterClock, TaskFilter, filter_tasks};
pub use id::TaskId;
pub use priority::Priority;
pub use query::TaskQuery;
pub use sort::{SortKey, sort_tasks};
pub use stats::TaskStats;
pub use task::{Subtask, Task};
