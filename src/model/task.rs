use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Task priority, quadrant-style: I is the most urgent, IV the least.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    I,
    II,
    III,
    IV,
}

impl Priority {
    /// Parse a priority label. Anything other than the four roman
    /// numerals is treated as "no priority" by callers.
    pub fn parse(s: &str) -> Option<Priority> {
        match s {
            "I" => Some(Priority::I),
            "II" => Some(Priority::II),
            "III" => Some(Priority::III),
            "IV" => Some(Priority::IV),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::I => "I",
            Priority::II => "II",
            Priority::III => "III",
            Priority::IV => "IV",
        }
    }
}

/// A single checklist item on a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub text: String,
    #[serde(default)]
    pub done: bool,
}

impl Subtask {
    pub fn new(text: impl Into<String>) -> Self {
        Subtask {
            text: text.into(),
            done: false,
        }
    }
}

/// A task on the board. Belongs to exactly one column at a time; its
/// position within that column lives in the store's column-task-order
/// index, not on the task itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub column_id: String,
    pub title: String,
    /// Deduplicated, first-seen order preserved.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub color: String,
    /// Opaque ISO `YYYY-MM-DD` string; not date-validated.
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Create a new open task with empty optional fields.
    pub fn new(id: String, column_id: String, title: String, now: DateTime<Utc>) -> Self {
        Task {
            id,
            column_id,
            title,
            tags: Vec::new(),
            priority: None,
            description: String::new(),
            color: String::new(),
            due_date: None,
            subtasks: Vec::new(),
            is_completed: false,
            completed_at: None,
            created_at: now,
        }
    }
}
