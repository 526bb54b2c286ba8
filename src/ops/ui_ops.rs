//! Transient UI state mutations: filters, the confirm/prompt dialog,
//! toasts, and the active-task selection.

use crate::model::{
    new_id, AppState, Dialog, DialogAction, DialogVariant, Priority, Toast, ToastVariant,
};
use crate::ops::OpError;
use crate::parse::normalize_tag;

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Toggle a tag in the active filter set. The tag is normalized first;
/// degenerate input that normalizes to nothing is ignored.
pub fn toggle_tag_filter(state: &mut AppState, raw: &str) {
    let tag = normalize_tag(raw);
    if tag.is_empty() {
        return;
    }
    if !state.active_filters.tags.remove(&tag) {
        state.active_filters.tags.insert(tag);
    }
}

pub fn toggle_priority_filter(state: &mut AppState, priority: Priority) {
    if !state.active_filters.priorities.remove(&priority) {
        state.active_filters.priorities.insert(priority);
    }
}

/// Clear both filter sets. Idempotent.
pub fn clear_filters(state: &mut AppState) {
    state.active_filters.tags.clear();
    state.active_filters.priorities.clear();
}

/// Switch the UI theme. The value is opaque to the store; it is
/// persisted and restored verbatim.
pub fn set_theme(state: &mut AppState, theme: &str) {
    state.theme = theme.to_string();
}

// ---------------------------------------------------------------------------
// Dialog lifecycle
// ---------------------------------------------------------------------------

/// Everything needed to open the dialog. Confirm dispatch itself lives
/// on the store, where the persistence policy is.
#[derive(Debug, Clone, Default)]
pub struct DialogRequest {
    pub variant: DialogVariant,
    pub title: String,
    pub message: String,
    pub confirm_label: String,
    pub cancel_label: String,
    pub has_input: bool,
    pub input: String,
    pub action: Option<DialogAction>,
}

pub fn open_dialog(state: &mut AppState, request: DialogRequest) {
    state.dialog = Dialog {
        is_open: true,
        variant: request.variant,
        title: request.title,
        message: request.message,
        confirm_label: request.confirm_label,
        cancel_label: request.cancel_label,
        has_input: request.has_input,
        input: request.input,
        action: request.action,
        error: None,
    };
}

/// Update the prompt's input text. Typing clears a stale inline error.
pub fn set_dialog_input(state: &mut AppState, input: &str) {
    state.dialog.input = input.to_string();
    state.dialog.error = None;
}

/// Close and reset the dialog. Always safe, idempotent.
pub fn close_dialog(state: &mut AppState) {
    state.dialog = Dialog::default();
}

// ---------------------------------------------------------------------------
// Toasts
// ---------------------------------------------------------------------------

/// Push a notification; returns its id. Toasts are dismissible by
/// default; the host owns the auto-dismiss timer.
pub fn push_toast(
    state: &mut AppState,
    message: &str,
    variant: ToastVariant,
    timeout_ms: Option<u64>,
) -> String {
    let id = new_id();
    state.toasts.push(Toast {
        id: id.clone(),
        message: message.to_string(),
        variant,
        dismissible: true,
        timeout_ms,
    });
    id
}

/// Dismissing an unknown id is a no-op.
pub fn dismiss_toast(state: &mut AppState, toast_id: &str) {
    state.toasts.retain(|t| t.id != toast_id);
}

pub fn clear_toasts(state: &mut AppState) {
    state.toasts.clear();
}

// ---------------------------------------------------------------------------
// Active task
// ---------------------------------------------------------------------------

pub fn set_active_task(state: &mut AppState, task_id: Option<&str>) -> Result<(), OpError> {
    match task_id {
        Some(id) if state.task(id).is_none() => Err(OpError::InvalidTarget { what: "task" }),
        Some(id) => {
            state.active_task_id = Some(id.to_string());
            Ok(())
        }
        None => {
            state.active_task_id = None;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_filter_toggles_with_normalization() {
        let mut state = AppState::default_data();
        toggle_tag_filter(&mut state, "#Urgent");
        assert!(state.active_filters.tags.contains("urgent"));
        toggle_tag_filter(&mut state, "urgent");
        assert!(state.active_filters.tags.is_empty());
        toggle_tag_filter(&mut state, "!!");
        assert!(state.active_filters.tags.is_empty());
    }

    #[test]
    fn clear_filters_is_idempotent() {
        let mut state = AppState::default_data();
        toggle_tag_filter(&mut state, "a");
        toggle_priority_filter(&mut state, Priority::I);
        clear_filters(&mut state);
        let cleared = state.active_filters.clone();
        clear_filters(&mut state);
        assert_eq!(state.active_filters, cleared);
        assert!(state.active_filters.is_empty());
    }

    #[test]
    fn dialog_open_set_input_close() {
        let mut state = AppState::default_data();
        open_dialog(
            &mut state,
            DialogRequest {
                variant: DialogVariant::Prompt,
                title: "New workspace".into(),
                has_input: true,
                action: Some(DialogAction::CreateWorkspace),
                ..DialogRequest::default()
            },
        );
        assert!(state.dialog.is_open);
        state.dialog.error = Some("boom".into());
        set_dialog_input(&mut state, "Work");
        assert_eq!(state.dialog.input, "Work");
        assert_eq!(state.dialog.error, None);

        close_dialog(&mut state);
        assert!(!state.dialog.is_open);
        // Idempotent.
        close_dialog(&mut state);
        assert_eq!(state.dialog, Dialog::default());
    }

    #[test]
    fn toast_dismiss_unknown_is_noop() {
        let mut state = AppState::default_data();
        let id = push_toast(&mut state, "saved", ToastVariant::Success, Some(3000));
        dismiss_toast(&mut state, "not-a-toast");
        assert_eq!(state.toasts.len(), 1);
        dismiss_toast(&mut state, &id);
        assert!(state.toasts.is_empty());
    }

    #[test]
    fn active_task_must_exist() {
        let mut state = AppState::default_data();
        assert!(set_active_task(&mut state, Some("ghost")).is_err());
        assert!(set_active_task(&mut state, None).is_ok());
    }
}
