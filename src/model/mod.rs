pub mod board;
pub mod config;
pub mod state;
pub mod task;

pub use board::{Column, TaskTemplate, Workspace};
pub use state::{
    ActiveFilters, AppState, Dialog, DialogAction, DialogVariant, Snapshot, Toast, ToastVariant,
    APP_VERSION, DEFAULT_COLUMN_TITLES,
};
pub use task::{Priority, Subtask, Task};

use uuid::Uuid;

/// Generate an opaque entity id. Imported snapshots may carry ids of
/// any shape; nothing in the store assumes this format.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}
