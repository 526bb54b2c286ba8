use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::board::{Column, Workspace};
use super::new_id;
use super::task::{Priority, Task};

/// Snapshot format version. Version 1 stored `activeFilters` as a bare
/// array of tag names; hydration migrates that shape forward.
pub const APP_VERSION: u32 = 2;

/// Column titles seeded into every new workspace.
pub const DEFAULT_COLUMN_TITLES: [&str; 3] = ["To Do", "In Progress", "Done"];

/// Active filter sets, shared across workspaces. Tag entries are pruned
/// against the current workspace's tag vocabulary on workspace switch;
/// priority filters are never pruned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveFilters {
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub priorities: BTreeSet<Priority>,
}

impl ActiveFilters {
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.priorities.is_empty()
    }
}

/// Visual flavor of the confirm/prompt dialog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DialogVariant {
    #[default]
    Confirm,
    Danger,
    Prompt,
}

/// The closed table of mutations a dialog confirm can dispatch to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogAction {
    CreateWorkspace,
    RenameWorkspace { workspace_id: String },
    DeleteWorkspace { workspace_id: String },
    DeleteColumn { column_id: String },
    DeleteTask { task_id: String },
    ResetAllData,
}

/// The single transient confirm/prompt request. Never persisted; always
/// reset on hydration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dialog {
    pub is_open: bool,
    pub variant: DialogVariant,
    pub title: String,
    pub message: String,
    pub confirm_label: String,
    pub cancel_label: String,
    /// Whether the dialog carries a text input (prompt-style).
    pub has_input: bool,
    pub input: String,
    pub action: Option<DialogAction>,
    /// Inline validation error from the last failed confirm.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastVariant {
    Success,
    Error,
    Warning,
    Info,
}

/// A transient notification. The host event loop owns the auto-dismiss
/// timer; the store only records the requested timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: String,
    pub message: String,
    pub variant: ToastVariant,
    pub dismissible: bool,
    pub timeout_ms: Option<u64>,
}

/// The whole application state: the domain entities plus the transient
/// UI fields that never reach persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub app_version: u32,
    pub theme: String,
    pub current_workspace_id: String,
    pub workspaces: Vec<Workspace>,
    pub columns: IndexMap<String, Column>,
    pub tasks: IndexMap<String, Task>,
    /// Authoritative manual ordering and membership index: a task id
    /// appears in exactly one column's list, and that column id equals
    /// the task's own `column_id`.
    pub column_task_order: IndexMap<String, Vec<String>>,
    pub active_filters: ActiveFilters,

    // Transient UI state, reset on every hydration.
    pub active_task_id: Option<String>,
    pub dialog: Dialog,
    pub toasts: Vec<Toast>,
    /// Set when a persistence write fails (e.g. quota); cleared by the
    /// next successful write.
    pub storage_warning: bool,
}

/// The persisted subset of [`AppState`] — also the backup file format.
/// Exactly these keys, nothing transient.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot<'a> {
    pub app_version: u32,
    pub theme: &'a str,
    pub current_workspace_id: &'a str,
    pub workspaces: &'a [Workspace],
    pub columns: &'a IndexMap<String, Column>,
    pub tasks: &'a IndexMap<String, Task>,
    pub column_task_order: &'a IndexMap<String, Vec<String>>,
    pub active_filters: &'a ActiveFilters,
}

impl AppState {
    /// The single construction/reset entry point: one workspace named
    /// "Personal" with the three default columns and no tasks.
    pub fn default_data() -> AppState {
        let workspace_id = new_id();
        let mut workspace = Workspace::new(workspace_id.clone(), "Personal".to_string());
        let mut columns = IndexMap::new();
        let mut column_task_order = IndexMap::new();

        for title in DEFAULT_COLUMN_TITLES {
            let column_id = new_id();
            workspace.columns.push(column_id.clone());
            columns.insert(
                column_id.clone(),
                Column::new(column_id.clone(), workspace_id.clone(), title.to_string()),
            );
            column_task_order.insert(column_id, Vec::new());
        }

        AppState {
            app_version: APP_VERSION,
            theme: "light".to_string(),
            current_workspace_id: workspace_id,
            workspaces: vec![workspace],
            columns,
            tasks: IndexMap::new(),
            column_task_order,
            active_filters: ActiveFilters::default(),
            active_task_id: None,
            dialog: Dialog::default(),
            toasts: Vec::new(),
            storage_warning: false,
        }
    }

    /// Borrow the persisted subset for serialization.
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            app_version: self.app_version,
            theme: &self.theme,
            current_workspace_id: &self.current_workspace_id,
            workspaces: &self.workspaces,
            columns: &self.columns,
            tasks: &self.tasks,
            column_task_order: &self.column_task_order,
            active_filters: &self.active_filters,
        }
    }

    pub fn workspace(&self, id: &str) -> Option<&Workspace> {
        self.workspaces.iter().find(|w| w.id == id)
    }

    pub fn workspace_mut(&mut self, id: &str) -> Option<&mut Workspace> {
        self.workspaces.iter_mut().find(|w| w.id == id)
    }

    pub fn column(&self, id: &str) -> Option<&Column> {
        self.columns.get(id)
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    /// The workspace owning the given column.
    pub fn column_workspace(&self, column_id: &str) -> Option<&Workspace> {
        let column = self.columns.get(column_id)?;
        self.workspace(&column.workspace_id)
    }

    /// Every tag used by any task in the given workspace.
    pub fn workspace_tags(&self, workspace_id: &str) -> BTreeSet<String> {
        let mut tags = BTreeSet::new();
        for task in self.tasks.values() {
            let in_workspace = self
                .columns
                .get(&task.column_id)
                .is_some_and(|c| c.workspace_id == workspace_id);
            if in_workspace {
                tags.extend(task.tags.iter().cloned());
            }
        }
        tags
    }

    /// Drop active tag filters that no task in the current workspace
    /// carries. Priority filters are left untouched.
    pub fn prune_tag_filters(&mut self) {
        let vocabulary = self.workspace_tags(&self.current_workspace_id);
        self.active_filters.tags.retain(|t| vocabulary.contains(t));
    }

    /// Reset all transient UI fields to their defaults.
    pub fn reset_transient(&mut self) {
        self.active_task_id = None;
        self.dialog = Dialog::default();
        self.toasts.clear();
        self.storage_warning = false;
    }
}
