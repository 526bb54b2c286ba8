//! The mutation API. Every operation validates its inputs, applies the
//! change to [`AppState`](crate::model::AppState), and returns a typed
//! result — expected failures are never panics.
//!
//! Persistence is *not* triggered here; the [`Store`](crate::store::Store)
//! wrapper schedules a write after every successful mutation.

pub mod column_ops;
pub mod task_ops;
pub mod template_ops;
pub mod ui_ops;
pub mod workspace_ops;

pub use column_ops::{create_column, delete_column, rename_column, reorder_columns, set_show_completed};
pub use task_ops::{
    add_subtask, create_task_from_payload, create_task_from_text, delete_subtask, delete_task,
    move_task, reorder_column_tasks, reorder_subtasks, set_completed, set_due_date, set_priority,
    update_subtask, update_task, TaskPatch, TaskPayload,
};
pub use template_ops::{create_template, delete_template, find_template, update_template, TemplatePayload};
pub use ui_ops::{
    clear_filters, clear_toasts, close_dialog, dismiss_toast, open_dialog, push_toast,
    set_active_task, set_dialog_input, set_theme, toggle_priority_filter, toggle_tag_filter,
    DialogRequest,
};
pub use workspace_ops::{create_workspace, delete_workspace, rename_workspace, switch_workspace};

/// Uniform mutation failure. `code()` is the stable machine-readable
/// identifier; the `Display` impl is the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OpError {
    #[error("{field} is required")]
    Required { field: &'static str },
    #[error("{field} must be {max} characters or fewer")]
    MaxLengthExceeded { field: &'static str, max: usize },
    #[error("a column named \"{title}\" already exists in this workspace")]
    DuplicateColumnName { title: String },
    #[error("{what} not found")]
    InvalidTarget { what: &'static str },
    #[error("the last workspace cannot be deleted")]
    LastWorkspace,
}

impl OpError {
    pub fn code(&self) -> &'static str {
        match self {
            OpError::Required { .. } => "required",
            OpError::MaxLengthExceeded { .. } => "max_length_exceeded",
            OpError::DuplicateColumnName { .. } => "duplicate_column_name",
            OpError::InvalidTarget { .. } => "invalid_target",
            OpError::LastWorkspace => "last_workspace",
        }
    }

    /// The offending input field, when the failure concerns one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            OpError::Required { field } | OpError::MaxLengthExceeded { field, .. } => Some(field),
            _ => None,
        }
    }

    /// The violated limit for `max_length_exceeded`.
    pub fn max_length(&self) -> Option<usize> {
        match self {
            OpError::MaxLengthExceeded { max, .. } => Some(*max),
            _ => None,
        }
    }
}
