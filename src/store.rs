//! The top-level controller: owns the [`AppState`], applies mutations
//! through the ops layer, and drives the persistence policy — every
//! successful state-changing mutation schedules a debounced write,
//! destructive resets flush synchronously.

use std::time::{Duration, Instant};

use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};

use crate::hydrate::repair_snapshot;
use crate::io::backup::{export_backup, parse_backup, BackupError};
use crate::io::persist::Persister;
use crate::io::storage::StorageBackend;
use crate::model::config::StoreConfig;
use crate::model::{AppState, DialogAction, Priority, Subtask, ToastVariant};
use crate::ops::{self, DialogRequest, OpError, TaskPatch, TaskPayload, TemplatePayload};

pub struct Store {
    pub state: AppState,
    persister: Persister,
}

impl Store {
    /// Open the store against a storage backend: hydrate the persisted
    /// snapshot, or seed (and synchronously persist) default state when
    /// storage is empty or unreadable.
    pub fn open(backend: Box<dyn StorageBackend>, config: &StoreConfig) -> Store {
        let persister = Persister::new(backend, Duration::from_millis(config.debounce_ms));

        let state = match persister.load() {
            Some(bytes) => match serde_json::from_slice::<Value>(&bytes) {
                Ok(snapshot) => repair_snapshot(&snapshot, Utc::now()),
                Err(e) => {
                    warn!(error = %e, "persisted snapshot unreadable; starting fresh");
                    let mut state = AppState::default_data();
                    state.theme = config.theme.clone();
                    state
                }
            },
            None => {
                info!("no persisted snapshot; seeding default state");
                let mut state = AppState::default_data();
                state.theme = config.theme.clone();
                state
            }
        };

        let mut store = Store { state, persister };
        // The first-run seed is durable before anything else happens.
        store.flush_now();
        store
    }

    /// Re-hydrate from an explicit snapshot value, replacing all state.
    pub fn hydrate(&mut self, snapshot: &Value) {
        self.state = repair_snapshot(snapshot, Utc::now());
        self.flush_now();
    }

    // -----------------------------------------------------------------
    // Persistence plumbing
    // -----------------------------------------------------------------

    /// Drive the debounce clock. Call from the host event loop.
    pub fn tick(&mut self, now: Instant) {
        if let Some(ok) = self.persister.flush_if_due(&self.state, now) {
            self.state.storage_warning = !ok;
        }
    }

    /// Whether a debounced write is still waiting to land.
    pub fn persist_pending(&self) -> bool {
        self.persister.pending()
    }

    fn schedule_persist(&mut self) {
        self.persister.schedule(Instant::now());
    }

    fn flush_now(&mut self) {
        let ok = self.persister.flush_now(&self.state);
        self.state.storage_warning = !ok;
    }

    /// Wrap a mutation: persistence is scheduled only on success.
    fn persisting<T>(&mut self, result: Result<T, OpError>) -> Result<T, OpError> {
        if result.is_ok() {
            self.schedule_persist();
        }
        result
    }

    // -----------------------------------------------------------------
    // Workspaces
    // -----------------------------------------------------------------

    pub fn create_workspace(&mut self, name: &str) -> Result<String, OpError> {
        let result = ops::create_workspace(&mut self.state, name);
        self.persisting(result)
    }

    pub fn rename_workspace(&mut self, workspace_id: &str, name: &str) -> Result<(), OpError> {
        let result = ops::rename_workspace(&mut self.state, workspace_id, name);
        self.persisting(result)
    }

    pub fn delete_workspace(&mut self, workspace_id: &str) -> Result<(), OpError> {
        let result = ops::delete_workspace(&mut self.state, workspace_id);
        self.persisting(result)
    }

    pub fn switch_workspace(&mut self, workspace_id: &str) -> Result<(), OpError> {
        let result = ops::switch_workspace(&mut self.state, workspace_id);
        self.persisting(result)
    }

    // -----------------------------------------------------------------
    // Columns
    // -----------------------------------------------------------------

    pub fn create_column(&mut self, workspace_id: &str, title: &str) -> Result<String, OpError> {
        let result = ops::create_column(&mut self.state, workspace_id, title);
        self.persisting(result)
    }

    pub fn rename_column(&mut self, column_id: &str, title: &str) -> Result<(), OpError> {
        let result = ops::rename_column(&mut self.state, column_id, title);
        self.persisting(result)
    }

    pub fn delete_column(&mut self, column_id: &str) -> Result<(), OpError> {
        let result = ops::delete_column(&mut self.state, column_id);
        self.persisting(result)
    }

    pub fn reorder_columns(
        &mut self,
        workspace_id: &str,
        new_order: Vec<String>,
    ) -> Result<(), OpError> {
        let result = ops::reorder_columns(&mut self.state, workspace_id, new_order);
        self.persisting(result)
    }

    pub fn set_show_completed(&mut self, column_id: &str, show: bool) -> Result<(), OpError> {
        let result = ops::set_show_completed(&mut self.state, column_id, show);
        self.persisting(result)
    }

    // -----------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------

    pub fn add_task(&mut self, column_id: &str, text: &str) -> Result<String, OpError> {
        let result = ops::create_task_from_text(&mut self.state, column_id, text, Utc::now());
        self.persisting(result)
    }

    pub fn add_task_from_payload(
        &mut self,
        column_id: &str,
        payload: TaskPayload,
    ) -> Result<String, OpError> {
        let result =
            ops::create_task_from_payload(&mut self.state, column_id, payload, Utc::now());
        self.persisting(result)
    }

    pub fn update_task(&mut self, task_id: &str, patch: TaskPatch) -> Result<(), OpError> {
        let result = ops::update_task(&mut self.state, task_id, patch, Utc::now());
        self.persisting(result)
    }

    pub fn delete_task(&mut self, task_id: &str) -> Result<(), OpError> {
        let result = ops::delete_task(&mut self.state, task_id);
        self.persisting(result)
    }

    pub fn move_task(
        &mut self,
        task_id: &str,
        from_column_id: &str,
        to_column_id: &str,
        index: usize,
    ) -> Result<(), OpError> {
        let result = ops::move_task(
            &mut self.state,
            task_id,
            from_column_id,
            to_column_id,
            index,
        );
        self.persisting(result)
    }

    pub fn reorder_column_tasks(
        &mut self,
        column_id: &str,
        order: Vec<String>,
    ) -> Result<(), OpError> {
        let result = ops::reorder_column_tasks(&mut self.state, column_id, order);
        self.persisting(result)
    }

    pub fn set_due_date(
        &mut self,
        task_id: &str,
        due_date: Option<String>,
    ) -> Result<(), OpError> {
        let result = ops::set_due_date(&mut self.state, task_id, due_date);
        self.persisting(result)
    }

    pub fn set_priority(
        &mut self,
        task_id: &str,
        priority: Option<Priority>,
    ) -> Result<(), OpError> {
        let result = ops::set_priority(&mut self.state, task_id, priority);
        self.persisting(result)
    }

    pub fn set_completed(&mut self, task_id: &str, done: bool) -> Result<(), OpError> {
        let result = ops::set_completed(&mut self.state, task_id, done, Utc::now());
        self.persisting(result)
    }

    // -----------------------------------------------------------------
    // Subtasks
    // -----------------------------------------------------------------

    pub fn add_subtask(&mut self, task_id: &str, text: &str) -> Result<(), OpError> {
        let result = ops::add_subtask(&mut self.state, task_id, text);
        self.persisting(result)
    }

    pub fn update_subtask(
        &mut self,
        task_id: &str,
        index: usize,
        text: Option<&str>,
        done: Option<bool>,
    ) -> Result<(), OpError> {
        let result = ops::update_subtask(&mut self.state, task_id, index, text, done);
        self.persisting(result)
    }

    pub fn delete_subtask(&mut self, task_id: &str, index: usize) -> Result<(), OpError> {
        let result = ops::delete_subtask(&mut self.state, task_id, index);
        self.persisting(result)
    }

    pub fn reorder_subtasks(
        &mut self,
        task_id: &str,
        subtasks: Vec<Subtask>,
    ) -> Result<(), OpError> {
        let result = ops::reorder_subtasks(&mut self.state, task_id, subtasks);
        self.persisting(result)
    }

    // -----------------------------------------------------------------
    // Templates
    // -----------------------------------------------------------------

    pub fn create_template(
        &mut self,
        workspace_id: &str,
        payload: TemplatePayload,
    ) -> Result<String, OpError> {
        let result = ops::create_template(&mut self.state, workspace_id, payload);
        self.persisting(result)
    }

    pub fn update_template(
        &mut self,
        template_id: &str,
        payload: TemplatePayload,
    ) -> Result<(), OpError> {
        let result = ops::update_template(&mut self.state, template_id, payload);
        self.persisting(result)
    }

    pub fn delete_template(&mut self, template_id: &str) -> Result<(), OpError> {
        let result = ops::delete_template(&mut self.state, template_id);
        self.persisting(result)
    }

    // -----------------------------------------------------------------
    // Filters, selection, toasts
    // -----------------------------------------------------------------

    pub fn toggle_tag_filter(&mut self, tag: &str) {
        ops::toggle_tag_filter(&mut self.state, tag);
        self.schedule_persist();
    }

    pub fn toggle_priority_filter(&mut self, priority: Priority) {
        ops::toggle_priority_filter(&mut self.state, priority);
        self.schedule_persist();
    }

    pub fn clear_filters(&mut self) {
        ops::clear_filters(&mut self.state);
        self.schedule_persist();
    }

    pub fn set_theme(&mut self, theme: &str) {
        ops::set_theme(&mut self.state, theme);
        self.schedule_persist();
    }

    pub fn set_active_task(&mut self, task_id: Option<&str>) -> Result<(), OpError> {
        // Selection is transient; nothing to persist.
        ops::set_active_task(&mut self.state, task_id)
    }

    pub fn push_toast(
        &mut self,
        message: &str,
        variant: ToastVariant,
        timeout_ms: Option<u64>,
    ) -> String {
        ops::push_toast(&mut self.state, message, variant, timeout_ms)
    }

    pub fn dismiss_toast(&mut self, toast_id: &str) {
        ops::dismiss_toast(&mut self.state, toast_id);
    }

    pub fn clear_toasts(&mut self) {
        ops::clear_toasts(&mut self.state);
    }

    // -----------------------------------------------------------------
    // Dialog lifecycle
    // -----------------------------------------------------------------

    pub fn open_dialog(&mut self, request: DialogRequest) {
        ops::open_dialog(&mut self.state, request);
    }

    pub fn set_dialog_input(&mut self, input: &str) {
        ops::set_dialog_input(&mut self.state, input);
    }

    pub fn close_dialog(&mut self) {
        ops::close_dialog(&mut self.state);
    }

    /// Dispatch the open dialog's action. Failures land in
    /// `dialog.error` and keep the dialog open for correction; success
    /// closes it.
    pub fn confirm_dialog(&mut self) -> Result<(), OpError> {
        let Some(action) = self.state.dialog.action.clone() else {
            let err = OpError::InvalidTarget {
                what: "dialog action",
            };
            self.state.dialog.error = Some(err.to_string());
            return Err(err);
        };
        let input = self.state.dialog.input.clone();

        let result = match action {
            DialogAction::CreateWorkspace => self.create_workspace(&input).map(|_| ()),
            DialogAction::RenameWorkspace { workspace_id } => {
                self.rename_workspace(&workspace_id, &input)
            }
            DialogAction::DeleteWorkspace { workspace_id } => {
                self.delete_workspace(&workspace_id)
            }
            DialogAction::DeleteColumn { column_id } => self.delete_column(&column_id),
            DialogAction::DeleteTask { task_id } => self.delete_task(&task_id),
            DialogAction::ResetAllData => {
                self.reset_all_data();
                Ok(())
            }
        };

        match result {
            Ok(()) => {
                self.close_dialog();
                Ok(())
            }
            Err(err) => {
                self.state.dialog.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    // -----------------------------------------------------------------
    // Backup and reset
    // -----------------------------------------------------------------

    /// Serialize the current snapshot, pretty-printed.
    pub fn export_backup(&self) -> String {
        export_backup(&self.state)
    }

    /// Validate and load a backup file, replacing all state. The
    /// replacement is persisted immediately — like a reset, it must be
    /// durable even if the page goes away right after.
    pub fn import_backup(&mut self, text: &str) -> Result<(), BackupError> {
        let snapshot = parse_backup(text)?;
        self.hydrate(&snapshot);
        Ok(())
    }

    /// Wipe everything back to the default single-workspace state and
    /// persist synchronously.
    pub fn reset_all_data(&mut self) {
        info!("resetting all data to defaults");
        self.state = AppState::default_data();
        self.flush_now();
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("persister", &self.persister)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::storage::{MemoryStorage, StorageBackend, StorageError, STORAGE_KEY};
    use crate::model::DialogVariant;

    fn open_store() -> Store {
        Store::open(Box::new(MemoryStorage::new()), &StoreConfig::default())
    }

    #[test]
    fn open_on_empty_storage_seeds_and_persists_defaults() {
        let store = open_store();
        assert_eq!(store.state.workspaces.len(), 1);
        let bytes = store.persister.load().unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["workspaces"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn open_on_corrupt_storage_recovers_with_defaults() {
        let mut backend = MemoryStorage::new();
        backend.write(STORAGE_KEY, b"}{ not json").unwrap();
        let store = Store::open(Box::new(backend), &StoreConfig::default());
        assert_eq!(store.state.workspaces.len(), 1);
        assert!(!store.state.storage_warning);
    }

    #[test]
    fn mutations_schedule_a_debounced_persist() {
        let mut store = open_store();
        let column = store.state.workspaces[0].columns[0].clone();
        assert!(!store.persist_pending());
        store.add_task(&column, "hello").unwrap();
        assert!(store.persist_pending());
        store.tick(Instant::now() + Duration::from_secs(1));
        assert!(!store.persist_pending());
    }

    #[test]
    fn failed_mutations_do_not_schedule() {
        let mut store = open_store();
        assert!(store.add_task("no-such-column", "x").is_err());
        assert!(!store.persist_pending());
    }

    #[test]
    fn prompt_dialog_confirm_creates_workspace() {
        let mut store = open_store();
        store.open_dialog(DialogRequest {
            variant: DialogVariant::Prompt,
            title: "New workspace".into(),
            has_input: true,
            action: Some(DialogAction::CreateWorkspace),
            ..DialogRequest::default()
        });
        store.set_dialog_input("   ");
        let err = store.confirm_dialog().unwrap_err();
        assert_eq!(err.code(), "required");
        assert!(store.state.dialog.is_open);
        assert!(store.state.dialog.error.is_some());

        store.set_dialog_input("Work");
        store.confirm_dialog().unwrap();
        assert!(!store.state.dialog.is_open);
        assert!(store.state.workspaces.iter().any(|w| w.name == "Work"));
    }

    #[test]
    fn confirm_without_action_is_invalid_target() {
        let mut store = open_store();
        store.open_dialog(DialogRequest::default());
        let err = store.confirm_dialog().unwrap_err();
        assert_eq!(err.code(), "invalid_target");
    }

    #[test]
    fn reset_persists_synchronously() {
        let mut store = open_store();
        let column = store.state.workspaces[0].columns[0].clone();
        store.add_task(&column, "doomed").unwrap();
        store.reset_all_data();
        assert!(store.state.tasks.is_empty());
        // The reset write did not wait for the debounce window.
        let bytes = store.persister.load().unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["tasks"].as_object().unwrap().len(), 0);
    }

    #[test]
    fn storage_warning_flips_on_write_failure() {
        struct FailingStorage;
        impl StorageBackend for FailingStorage {
            fn read(&self, _key: &str) -> Result<Option<Vec<u8>>, StorageError> {
                Ok(None)
            }
            fn write(&mut self, _key: &str, _bytes: &[u8]) -> Result<(), StorageError> {
                Err(StorageError::Write(std::io::Error::other("quota")))
            }
        }
        let mut store = Store::open(Box::new(FailingStorage), &StoreConfig::default());
        assert!(store.state.storage_warning);
        // The mutation itself still succeeds.
        let column = store.state.workspaces[0].columns[0].clone();
        store.add_task(&column, "kept in memory").unwrap();
        assert_eq!(store.state.tasks.len(), 1);
    }
}
