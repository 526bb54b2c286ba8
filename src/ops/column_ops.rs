use std::collections::HashSet;

use tracing::debug;

use crate::model::{new_id, AppState, Column};
use crate::ops::OpError;
use crate::validate::{validate_name, ColumnContext, NameKind};

pub fn create_column(
    state: &mut AppState,
    workspace_id: &str,
    title: &str,
) -> Result<String, OpError> {
    let title = validate_name(
        state,
        NameKind::Column,
        title,
        ColumnContext {
            workspace_id: Some(workspace_id),
            exclude_column_id: None,
        },
    )?;

    let column_id = new_id();
    state.columns.insert(
        column_id.clone(),
        Column::new(column_id.clone(), workspace_id.to_string(), title),
    );
    state
        .column_task_order
        .insert(column_id.clone(), Vec::new());
    // validate_name established the workspace exists.
    if let Some(workspace) = state.workspace_mut(workspace_id) {
        workspace.columns.push(column_id.clone());
    }
    Ok(column_id)
}

pub fn rename_column(state: &mut AppState, column_id: &str, title: &str) -> Result<(), OpError> {
    let workspace_id = state
        .column(column_id)
        .map(|c| c.workspace_id.clone())
        .ok_or(OpError::InvalidTarget { what: "column" })?;
    let title = validate_name(
        state,
        NameKind::Column,
        title,
        ColumnContext {
            workspace_id: Some(&workspace_id),
            exclude_column_id: Some(column_id),
        },
    )?;
    if let Some(column) = state.columns.get_mut(column_id) {
        column.title = title;
    }
    Ok(())
}

/// Delete a column and every task it holds.
pub fn delete_column(state: &mut AppState, column_id: &str) -> Result<(), OpError> {
    let column = state
        .columns
        .shift_remove(column_id)
        .ok_or(OpError::InvalidTarget { what: "column" })?;

    if let Some(order) = state.column_task_order.shift_remove(column_id) {
        for task_id in order {
            state.tasks.shift_remove(&task_id);
        }
    }
    // Belt and braces: drop any task still claiming this column.
    state.tasks.retain(|_, task| task.column_id != column_id);

    if let Some(workspace) = state.workspace_mut(&column.workspace_id) {
        workspace.columns.retain(|id| id != column_id);
    }

    if state
        .active_task_id
        .as_ref()
        .is_some_and(|id| !state.tasks.contains_key(id))
    {
        state.active_task_id = None;
    }
    debug!(column_id, "deleted column");
    Ok(())
}

/// Replace a workspace's column order wholesale. The caller supplies
/// the full new order; it must be a permutation of the existing one.
pub fn reorder_columns(
    state: &mut AppState,
    workspace_id: &str,
    new_order: Vec<String>,
) -> Result<(), OpError> {
    let workspace = state
        .workspace(workspace_id)
        .ok_or(OpError::InvalidTarget { what: "workspace" })?;

    let current: HashSet<&str> = workspace.columns.iter().map(String::as_str).collect();
    let proposed: HashSet<&str> = new_order.iter().map(String::as_str).collect();
    if new_order.len() != workspace.columns.len() || current != proposed {
        return Err(OpError::InvalidTarget { what: "column" });
    }

    if let Some(workspace) = state.workspace_mut(workspace_id) {
        workspace.columns = new_order;
    }
    Ok(())
}

/// Toggle whether a column's completed-tasks list is expanded.
pub fn set_show_completed(
    state: &mut AppState,
    column_id: &str,
    show: bool,
) -> Result<(), OpError> {
    let column = state
        .columns
        .get_mut(column_id)
        .ok_or(OpError::InvalidTarget { what: "column" })?;
    column.show_completed = show;
    Ok(())
}
