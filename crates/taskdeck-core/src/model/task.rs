use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::Tag;

/// The three lifecycle states.
///
/// There is no enforced transition graph: any status may be set to any other
/// status directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl Status {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "TODO",
            Self::InProgress => "IN_PROGRESS",
            Self::Done => "DONE",
        }
    }
}

/// The four priority levels, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

/// All persisted fields for a task, with resolved tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: Status,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub assigned_to: Option<i64>,
    pub tags: Vec<Tag>,
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize(input: &str) -> String {
    input.trim().to_ascii_uppercase()
}

impl FromStr for Status {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "TODO" => Ok(Self::Todo),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "DONE" => Ok(Self::Done),
            _ => Err(ParseEnumError {
                expected: "status",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            "CRITICAL" => Ok(Self::Critical),
            _ => Err(ParseEnumError {
                expected: "priority",
                got: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Priority, Status};
    use std::str::FromStr;

    #[test]
    fn enum_json_uses_screaming_snake_wire_form() {
        assert_eq!(serde_json::to_string(&Status::Todo).unwrap(), "\"TODO\"");
        assert_eq!(
            serde_json::to_string(&Status::InProgress).unwrap(),
            "\"IN_PROGRESS\""
        );
        assert_eq!(
            serde_json::to_string(&Priority::Critical).unwrap(),
            "\"CRITICAL\""
        );

        assert_eq!(
            serde_json::from_str::<Status>("\"DONE\"").unwrap(),
            Status::Done
        );
        assert_eq!(
            serde_json::from_str::<Priority>("\"MEDIUM\"").unwrap(),
            Priority::Medium
        );
    }

    #[test]
    fn display_parse_roundtrips() {
        for value in [Status::Todo, Status::InProgress, Status::Done] {
            let rendered = value.to_string();
            let reparsed = Status::from_str(&rendered).unwrap();
            assert_eq!(value, reparsed);
        }

        for value in [
            Priority::Low,
            Priority::Medium,
            Priority::High,
            Priority::Critical,
        ] {
            let rendered = value.to_string();
            let reparsed = Priority::from_str(&rendered).unwrap();
            assert_eq!(value, reparsed);
        }
    }

    #[test]
    fn parse_is_case_insensitive_and_trims() {
        assert_eq!(Status::from_str(" in_progress ").unwrap(), Status::InProgress);
        assert_eq!(Priority::from_str("critical").unwrap(), Priority::Critical);
    }

    #[test]
    fn parse_rejects_unknown_values() {
        assert!(Status::from_str("BLOCKED").is_err());
        assert!(Priority::from_str("URGENT").is_err());
        assert!(Status::from_str("").is_err());
    }

    #[test]
    fn defaults_match_the_schema_defaults() {
        assert_eq!(Status::default(), Status::Todo);
        assert_eq!(Priority::default(), Priority::Low);
    }
}
