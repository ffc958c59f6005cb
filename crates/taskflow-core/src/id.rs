use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

use crate::error::ParseError;

/// Server-assigned identifier of a task.
///
/// The backend hands out opaque strings (Mongo object ids in practice), so the
/// client never generates or interprets them.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct TaskId(String);

impl TaskId {
    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TaskId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.contains('/') {
            return Err(ParseError::TaskId(s.to_owned()));
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl Serialize for TaskId {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_id_trims_input() {
        let id: TaskId = " 665f1c0e9b1d ".parse().unwrap_or_else(|err| panic!("parse: {err}"));
        assert_eq!(id.as_str(), "665f1c0e9b1d");
    }

    #[test]
    fn task_id_rejects_blank_and_path_like_values() {
        assert!("".parse::<TaskId>().is_err());
        assert!("   ".parse::<TaskId>().is_err());
        assert!("a/b".parse::<TaskId>().is_err());
    }
}
