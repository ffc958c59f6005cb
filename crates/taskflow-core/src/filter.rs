//! Predicates selecting a subset of the task collection.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::{Date, Duration, OffsetDateTime, UtcOffset};

use crate::error::ParseError;
use crate::priority::Priority;
use crate::task::Task;

/// Dashboard filter tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskFilter {
    /// Every task.
    #[default]
    All,
    /// Tasks due on the current calendar day.
    Today,
    /// Tasks due between today and seven days from now, inclusive.
    Week,
    /// High priority tasks.
    High,
    /// Medium priority tasks.
    Medium,
    /// Low priority tasks.
    Low,
}

impl TaskFilter {
    /// Every filter in tab order.
    pub const ALL: [Self; 6] = [
        Self::All,
        Self::Today,
        Self::Week,
        Self::High,
        Self::Medium,
        Self::Low,
    ];

    /// Key used on the command line and in configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Today => "today",
            Self::Week => "week",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Heading shown above the filtered list.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "All Tasks",
            Self::Today => "Today's Tasks",
            Self::Week => "This Week",
            Self::High => "High Priority",
            Self::Medium => "Medium Priority",
            Self::Low => "Low Priority",
        }
    }

    /// Priority selected by this filter, if it is a priority tab.
    #[must_use]
    pub const fn priority(self) -> Option<Priority> {
        match self {
            Self::High => Some(Priority::High),
            Self::Medium => Some(Priority::Medium),
            Self::Low => Some(Priority::Low),
            Self::All | Self::Today | Self::Week => None,
        }
    }

    /// Whether `task` passes this filter on the day described by `clock`.
    #[must_use]
    pub fn matches(self, task: &Task, clock: &FilterClock) -> bool {
        match self {
            Self::All => true,
            Self::Today => task.due_day(clock.offset) == Some(clock.today),
            Self::Week => task
                .due_day(clock.offset)
                .is_some_and(|day| day >= clock.today && day <= clock.week_end()),
            Self::High | Self::Medium | Self::Low => task.priority == self.priority(),
        }
    }
}

impl fmt::Display for TaskFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskFilter {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|filter| filter.as_str() == normalized)
            .ok_or_else(|| ParseError::Filter(s.to_owned()))
    }
}

/// Completion pages: everything, pending only or completed only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionFilter {
    /// Both pending and completed tasks.
    #[default]
    All,
    /// Tasks not yet completed.
    Pending,
    /// Completed tasks.
    Completed,
}

impl CompletionFilter {
    /// Key used on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }

    /// Whether `task` belongs on this page.
    #[must_use]
    pub const fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Pending => !task.completed,
            Self::Completed => task.completed,
        }
    }
}

impl fmt::Display for CompletionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompletionFilter {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "pending" => Ok(Self::Pending),
            "completed" | "complete" | "done" => Ok(Self::Completed),
            _ => Err(ParseError::Completion(s.to_owned())),
        }
    }
}

/// The "current day" against which date filters are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterClock {
    /// Current calendar day in `offset`.
    pub today: Date,
    /// Offset used to turn due timestamps into calendar days.
    pub offset: UtcOffset,
}

impl FilterClock {
    /// Clock for an explicit day and offset.
    #[must_use]
    pub const fn new(today: Date, offset: UtcOffset) -> Self {
        Self { today, offset }
    }

    /// Clock derived from an instant, keeping the instant's offset.
    #[must_use]
    pub fn at(now: OffsetDateTime) -> Self {
        Self::new(now.date(), now.offset())
    }

    /// Clock for the local time zone, falling back to UTC when the platform
    /// cannot report the local offset.
    #[must_use]
    pub fn local() -> Self {
        Self::at(OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc()))
    }

    /// Last day included by [`TaskFilter::Week`].
    #[must_use]
    pub fn week_end(&self) -> Date {
        self.today
            .checked_add(Duration::days(7))
            .unwrap_or(Date::MAX)
    }
}

/// Apply `filter` to `tasks`, keeping input order.
#[must_use]
pub fn filter_tasks(tasks: &[Task], filter: TaskFilter, clock: &FilterClock) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| filter.matches(task, clock))
        .cloned()
        .collect()
}
