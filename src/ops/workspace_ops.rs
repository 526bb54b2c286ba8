use tracing::debug;

use crate::model::{new_id, AppState, Column, Workspace, DEFAULT_COLUMN_TITLES};
use crate::ops::OpError;
use crate::validate::{validate_name, ColumnContext, NameKind};

/// Create a workspace seeded with the three default columns, switch to
/// it, and return its id.
pub fn create_workspace(state: &mut AppState, name: &str) -> Result<String, OpError> {
    let name = validate_name(state, NameKind::Workspace, name, ColumnContext::default())?;

    let workspace_id = new_id();
    let mut workspace = Workspace::new(workspace_id.clone(), name);
    for title in DEFAULT_COLUMN_TITLES {
        let column_id = new_id();
        workspace.columns.push(column_id.clone());
        state.columns.insert(
            column_id.clone(),
            Column::new(column_id.clone(), workspace_id.clone(), title.to_string()),
        );
        state.column_task_order.insert(column_id, Vec::new());
    }
    state.workspaces.push(workspace);
    debug!(%workspace_id, "created workspace");

    // A new workspace becomes the active one.
    state.current_workspace_id = workspace_id.clone();
    state.prune_tag_filters();
    Ok(workspace_id)
}

pub fn rename_workspace(state: &mut AppState, workspace_id: &str, name: &str) -> Result<(), OpError> {
    let name = validate_name(state, NameKind::Workspace, name, ColumnContext::default())?;
    let workspace = state
        .workspace_mut(workspace_id)
        .ok_or(OpError::InvalidTarget { what: "workspace" })?;
    workspace.name = name;
    Ok(())
}

/// Delete a workspace and everything it owns: its columns, and their
/// tasks. Refuses when it is the last workspace remaining. If the
/// deleted workspace was active, activation moves to the first
/// remaining workspace and stale tag filters are pruned.
pub fn delete_workspace(state: &mut AppState, workspace_id: &str) -> Result<(), OpError> {
    let index = state
        .workspaces
        .iter()
        .position(|w| w.id == workspace_id)
        .ok_or(OpError::InvalidTarget { what: "workspace" })?;
    if state.workspaces.len() == 1 {
        return Err(OpError::LastWorkspace);
    }

    // Explicit ownership-tree walk: workspace → columns → tasks.
    let column_ids = state.workspaces[index].columns.clone();
    for column_id in &column_ids {
        if let Some(order) = state.column_task_order.shift_remove(column_id) {
            for task_id in order {
                state.tasks.shift_remove(&task_id);
            }
        }
        state.columns.shift_remove(column_id);
    }
    state.workspaces.remove(index);
    debug!(workspace_id, columns = column_ids.len(), "deleted workspace");

    if state.current_workspace_id == workspace_id {
        state.current_workspace_id = state.workspaces[0].id.clone();
    }
    state.prune_tag_filters();

    if state
        .active_task_id
        .as_ref()
        .is_some_and(|id| !state.tasks.contains_key(id))
    {
        state.active_task_id = None;
    }
    Ok(())
}

/// Make a workspace the active one and re-derive the valid tag filters
/// for it. Priority filters carry over untouched.
pub fn switch_workspace(state: &mut AppState, workspace_id: &str) -> Result<(), OpError> {
    if state.workspace(workspace_id).is_none() {
        return Err(OpError::InvalidTarget { what: "workspace" });
    }
    state.current_workspace_id = workspace_id.to_string();
    state.prune_tag_filters();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Priority;
    use crate::ops::task_ops::{create_task_from_text, TaskPayload};
    use crate::ops::{create_task_from_payload, toggle_tag_filter};
    use chrono::Utc;

    #[test]
    fn create_seeds_default_columns_and_switches() {
        let mut state = AppState::default_data();
        let original = state.current_workspace_id.clone();
        let id = create_workspace(&mut state, "Work").unwrap();
        assert_ne!(id, original);
        assert_eq!(state.current_workspace_id, id);
        let workspace = state.workspace(&id).unwrap();
        assert_eq!(workspace.columns.len(), 3);
        for column_id in &workspace.columns {
            assert!(state.column_task_order.contains_key(column_id));
        }
    }

    #[test]
    fn delete_refuses_last_workspace() {
        let mut state = AppState::default_data();
        let id = state.current_workspace_id.clone();
        assert_eq!(
            delete_workspace(&mut state, &id),
            Err(OpError::LastWorkspace)
        );
    }

    #[test]
    fn delete_cascades_columns_and_tasks() {
        let mut state = AppState::default_data();
        let doomed = state.current_workspace_id.clone();
        let column_id = state.workspaces[0].columns[0].clone();
        create_task_from_text(&mut state, &column_id, "goner #gone", Utc::now()).unwrap();
        create_workspace(&mut state, "Survivor").unwrap();

        delete_workspace(&mut state, &doomed).unwrap();
        assert!(state.workspace(&doomed).is_none());
        assert!(state.tasks.is_empty());
        assert!(!state.columns.values().any(|c| c.workspace_id == doomed));
        assert!(!state.column_task_order.contains_key(&column_id));
    }

    #[test]
    fn deleting_active_workspace_switches_and_prunes_tag_filters() {
        let mut state = AppState::default_data();
        let first = state.current_workspace_id.clone();
        let first_col = state.workspaces[0].columns[0].clone();
        create_task_from_text(&mut state, &first_col, "keep #shared", Utc::now()).unwrap();

        let second = create_workspace(&mut state, "Second").unwrap();
        let second_col = state.workspace(&second).unwrap().columns[0].clone();
        create_task_from_text(&mut state, &second_col, "x #shared #only-here", Utc::now()).unwrap();

        toggle_tag_filter(&mut state, "shared");
        toggle_tag_filter(&mut state, "only-here");
        state.active_filters.priorities.insert(Priority::III);

        delete_workspace(&mut state, &second).unwrap();
        assert_eq!(state.current_workspace_id, first);
        assert!(state.active_filters.tags.contains("shared"));
        assert!(!state.active_filters.tags.contains("only-here"));
        // Priority filters are never pruned.
        assert!(state.active_filters.priorities.contains(&Priority::III));
    }

    #[test]
    fn switch_prunes_tags_missing_from_new_workspace() {
        let mut state = AppState::default_data();
        let first = state.current_workspace_id.clone();
        let first_col = state.workspaces[0].columns[0].clone();
        let payload = TaskPayload {
            title: "tagged".into(),
            tags: vec!["homework".into()],
            ..TaskPayload::default()
        };
        create_task_from_payload(&mut state, &first_col, payload, Utc::now()).unwrap();
        toggle_tag_filter(&mut state, "homework");

        let second = create_workspace(&mut state, "Empty").unwrap();
        switch_workspace(&mut state, &second).unwrap();
        assert!(state.active_filters.tags.is_empty());

        // Switching back does not resurrect the filter.
        switch_workspace(&mut state, &first).unwrap();
        assert!(state.active_filters.tags.is_empty());
    }

    #[test]
    fn switch_to_unknown_workspace_fails() {
        let mut state = AppState::default_data();
        let err = switch_workspace(&mut state, "nope").unwrap_err();
        assert_eq!(err.code(), "invalid_target");
    }
}
