use serde::{Deserialize, Serialize};

use super::task::{Priority, Subtask};

/// Top-level board container. Owns its columns (by id, in display
/// order) and its task templates. The store guarantees at least one
/// workspace exists at all times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: String,
    pub name: String,
    /// Column ids in display order.
    #[serde(default)]
    pub columns: Vec<String>,
    /// Templates ride inside the workspace so they are covered by the
    /// `workspaces` snapshot key.
    #[serde(default)]
    pub templates: Vec<TaskTemplate>,
}

impl Workspace {
    pub fn new(id: String, name: String) -> Self {
        Workspace {
            id,
            name,
            columns: Vec::new(),
            templates: Vec::new(),
        }
    }
}

/// A named bucket of tasks within a workspace. Titles are unique
/// case-insensitively within the owning workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: String,
    pub workspace_id: String,
    pub title: String,
    /// Whether the completed-tasks list is expanded in this column.
    #[serde(default)]
    pub show_completed: bool,
}

impl Column {
    pub fn new(id: String, workspace_id: String, title: String) -> Self {
        Column {
            id,
            workspace_id,
            title,
            show_completed: false,
        }
    }
}

/// A reusable task skeleton, scoped to a workspace and instantiated
/// through the `/name` command when adding a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskTemplate {
    pub id: String,
    pub workspace_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}
