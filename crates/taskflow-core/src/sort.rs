//! Orderings for task listings.

use std::cmp::Ordering;
use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::priority::rank_of;
use crate::task::Task;

/// Sort orders offered by the pending and completed pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Most recently created first. Tasks without a creation time go last.
    #[default]
    Newest,
    /// Oldest first. Tasks without a creation time go first.
    Oldest,
    /// High, medium, low, then tasks without a recognized priority.
    Priority,
}

impl SortKey {
    /// Key used on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::Priority => "priority",
        }
    }

    /// Comparator implementing this order.
    #[must_use]
    pub fn compare(self, a: &Task, b: &Task) -> Ordering {
        match self {
            Self::Newest => b.created_at.cmp(&a.created_at),
            Self::Oldest => a.created_at.cmp(&b.created_at),
            Self::Priority => rank_of(b.priority).cmp(&rank_of(a.priority)),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            "priority" => Ok(Self::Priority),
            _ => Err(ParseError::Sort(s.to_owned())),
        }
    }
}

/// Return a sorted copy of `tasks`. The sort is stable.
#[must_use]
pub fn sort_tasks(tasks: &[Task], key: SortKey) -> Vec<Task> {
    let mut sorted = tasks.to_vec();
    sorted.sort_by(|a, b| key.compare(a, b));
    sorted
}
