use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Task priority as understood by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Priority {
    /// Low urgency. Default for new tasks.
    #[default]
    Low,
    /// Medium urgency.
    Medium,
    /// High urgency.
    High,
}

impl Priority {
    /// Every priority, lowest first.
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    /// Wire / display representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    /// Ordering weight used by the priority sort.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    /// Lenient parser used for server payloads; unknown values become `None`.
    #[must_use]
    pub fn from_wire(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }
}

/// Rank of an optional priority; tasks without one rank below `Low`.
#[must_use]
pub fn rank_of(priority: Option<Priority>) -> u8 {
    priority.map_or(0, Priority::rank)
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ParseError::Priority(s.to_owned())),
        }
    }
}
