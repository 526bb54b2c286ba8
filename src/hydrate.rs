//! Snapshot repair: a pure function from any JSON value to a valid
//! [`AppState`]. All hydration input — persisted, imported, or
//! test-supplied — is untrusted and flows through the same pipeline.
//!
//! Repair order:
//! 1. scalars restored, transient fields reset
//! 2. legacy filter shapes migrated, malformed entries dropped
//! 3. column defaults backfilled
//! 4. task fields defaulted/re-normalized, titles re-validated
//! 5. tasks with dangling `columnId` re-pointed to a fallback column
//! 6. column-task-order rebuilt from scratch (first occurrence wins)
//! 7. active workspace validated, with fallback
//! 8. active tag filters pruned against the active workspace

use std::collections::HashSet;

use chrono::{DateTime, TimeZone, Utc};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};

use crate::model::{
    ActiveFilters, AppState, Column, Priority, Subtask, Task, TaskTemplate, Workspace, new_id,
    APP_VERSION,
};
use crate::parse::{collapse_whitespace, normalize_tag};
use crate::validate::NameKind;

/// Placeholder for tasks whose persisted title fails validation.
const FALLBACK_TASK_TITLE: &str = "Untitled task";

/// Repair an arbitrary snapshot value into valid state. Never fails:
/// anything unusable degrades to defaults, down to full default state
/// when no workspace survives.
pub fn repair_snapshot(snapshot: &Value, now: DateTime<Utc>) -> AppState {
    let Some(root) = snapshot.as_object() else {
        warn!("snapshot is not a JSON object; falling back to default state");
        return AppState::default_data();
    };

    // Step 1 — scalars. Transient fields are reset by construction:
    // the snapshot is never asked for them.
    let theme = root
        .get("theme")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| "light".to_string());
    let requested_workspace = root
        .get("currentWorkspaceId")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    // Step 2 — active filters, migrating the legacy bare-array shape.
    let active_filters = repair_filters(root.get("activeFilters"));

    let mut workspaces = repair_workspaces(root.get("workspaces"));
    let mut columns = repair_columns(root.get("columns"));
    let mut tasks = repair_tasks(root.get("tasks"), now);

    // Step 7 (pulled forward so later fallbacks can use it) — no
    // workspace at all means nothing else can be owned by anything.
    if workspaces.is_empty() {
        warn!("snapshot has no usable workspace; falling back to default state");
        return AppState::default_data();
    }

    reconcile_workspace_columns(&mut workspaces, &mut columns);

    let current_workspace_id = if workspaces.iter().any(|w| w.id == requested_workspace) {
        requested_workspace
    } else {
        warn!("active workspace did not resolve; falling back to the first workspace");
        workspaces[0].id.clone()
    };

    // Step 5 — re-point tasks whose column is gone. Fallback: the first
    // column of the active workspace, or the first column overall.
    let fallback_column = workspaces
        .iter()
        .find(|w| w.id == current_workspace_id)
        .and_then(|w| w.columns.first().cloned())
        .or_else(|| columns.keys().next().cloned());
    tasks.retain(|task_id, task| {
        if columns.contains_key(&task.column_id) {
            return true;
        }
        match &fallback_column {
            Some(fallback) => {
                warn!(%task_id, "task column missing; re-pointing to fallback column");
                task.column_id = fallback.clone();
                true
            }
            None => {
                // No column anywhere to own it: the task is unreachable.
                warn!(%task_id, "task has no reachable column; dropping");
                false
            }
        }
    });

    // Step 6 — rebuild the order index from scratch.
    let column_task_order =
        rebuild_column_task_order(root.get("columnTaskOrder"), &columns, &tasks);

    let mut state = AppState {
        app_version: APP_VERSION,
        theme,
        current_workspace_id,
        workspaces,
        columns,
        tasks,
        column_task_order,
        active_filters,
        active_task_id: None,
        dialog: Default::default(),
        toasts: Vec::new(),
        storage_warning: false,
    };

    // Step 8 — filters may reference tags from another workspace's life.
    state.prune_tag_filters();
    debug!(
        workspaces = state.workspaces.len(),
        columns = state.columns.len(),
        tasks = state.tasks.len(),
        "hydrated snapshot"
    );
    state
}

fn repair_filters(value: Option<&Value>) -> ActiveFilters {
    let mut filters = ActiveFilters::default();
    match value {
        // Current shape: {tags: [...], priorities: [...]}.
        Some(Value::Object(map)) => {
            if let Some(Value::Array(tags)) = map.get("tags") {
                for tag in tags.iter().filter_map(Value::as_str) {
                    let tag = normalize_tag(tag);
                    if !tag.is_empty() {
                        filters.tags.insert(tag);
                    }
                }
            }
            if let Some(Value::Array(priorities)) = map.get("priorities") {
                for p in priorities.iter().filter_map(Value::as_str) {
                    if let Some(p) = Priority::parse(p) {
                        filters.priorities.insert(p);
                    }
                }
            }
        }
        // Legacy shape: a bare array of tag names.
        Some(Value::Array(tags)) => {
            warn!("migrating legacy tag-filter array");
            for tag in tags.iter().filter_map(Value::as_str) {
                let tag = normalize_tag(tag);
                if !tag.is_empty() {
                    filters.tags.insert(tag);
                }
            }
        }
        _ => {}
    }
    filters
}

fn repair_workspaces(value: Option<&Value>) -> Vec<Workspace> {
    let Some(Value::Array(entries)) = value else {
        return Vec::new();
    };
    let mut workspaces: Vec<Workspace> = Vec::with_capacity(entries.len());
    let mut seen = HashSet::new();
    for entry in entries {
        let Some(object) = entry.as_object() else {
            warn!("dropping non-object workspace entry");
            continue;
        };
        let id = match object.get("id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => new_id(),
        };
        if !seen.insert(id.clone()) {
            warn!(workspace_id = %id, "dropping duplicate workspace entry");
            continue;
        }
        let name = object
            .get("name")
            .and_then(Value::as_str)
            .map(collapse_whitespace)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Workspace".to_string());

        let mut workspace = Workspace::new(id.clone(), name);
        if let Some(Value::Array(column_ids)) = object.get("columns") {
            for column_id in column_ids.iter().filter_map(Value::as_str) {
                if !column_id.is_empty() && !workspace.columns.contains(&column_id.to_string()) {
                    workspace.columns.push(column_id.to_string());
                }
            }
        }
        if let Some(Value::Array(templates)) = object.get("templates") {
            for template in templates {
                if let Some(template) = repair_template(template, &id) {
                    workspace.templates.push(template);
                }
            }
        }
        workspaces.push(workspace);
    }
    workspaces
}

fn repair_template(value: &Value, workspace_id: &str) -> Option<TaskTemplate> {
    let object = value.as_object()?;
    let name = object
        .get("name")
        .and_then(Value::as_str)
        .map(collapse_whitespace)
        .filter(|n| !n.is_empty())?;
    Some(TaskTemplate {
        id: match object.get("id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => new_id(),
        },
        workspace_id: workspace_id.to_string(),
        name,
        description: string_or_default(object.get("description")),
        tags: repair_tags(object.get("tags")),
        priority: repair_priority(object.get("priority")),
        color: string_or_default(object.get("color")),
        subtasks: repair_subtasks(object.get("subtasks")),
    })
}

fn repair_columns(value: Option<&Value>) -> IndexMap<String, Column> {
    let mut columns = IndexMap::new();
    let Some(Value::Object(entries)) = value else {
        return columns;
    };
    for (key, entry) in entries {
        if key.is_empty() {
            continue;
        }
        let Some(object) = entry.as_object() else {
            warn!(column_id = %key, "dropping non-object column entry");
            continue;
        };
        let title = object
            .get("title")
            .and_then(Value::as_str)
            .map(collapse_whitespace)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Column".to_string());
        columns.insert(
            key.clone(),
            Column {
                id: key.clone(),
                workspace_id: string_or_default(object.get("workspaceId")),
                title,
                // Step 3 — default a missing showCompleted to false.
                show_completed: object
                    .get("showCompleted")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
            },
        );
    }
    columns
}

fn repair_tasks(value: Option<&Value>, now: DateTime<Utc>) -> IndexMap<String, Task> {
    let mut tasks = IndexMap::new();
    let Some(Value::Object(entries)) = value else {
        return tasks;
    };
    for (key, entry) in entries {
        if key.is_empty() {
            continue;
        }
        let Some(object) = entry.as_object() else {
            warn!(task_id = %key, "dropping non-object task entry");
            continue;
        };

        // Step 4 — defaults and re-normalization, field by field.
        let raw_title = object
            .get("title")
            .and_then(Value::as_str)
            .map(collapse_whitespace)
            .unwrap_or_default();
        let title = if raw_title.is_empty()
            || raw_title.chars().count() > NameKind::TaskTitle.max_len()
        {
            warn!(task_id = %key, "task title invalid; using placeholder");
            FALLBACK_TASK_TITLE.to_string()
        } else {
            raw_title
        };

        let created_at = parse_timestamp(object.get("createdAt")).unwrap_or(now);
        let is_completed = object
            .get("isCompleted")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        // Backfill: a completed task without a stamp inherits creation time.
        let completed_at = match parse_timestamp(object.get("completedAt")) {
            Some(at) => Some(at),
            None if is_completed => Some(created_at),
            None => None,
        };

        tasks.insert(
            key.clone(),
            Task {
                id: key.clone(),
                column_id: string_or_default(object.get("columnId")),
                title,
                tags: repair_tags(object.get("tags")),
                priority: repair_priority(object.get("priority")),
                description: string_or_default(object.get("description")),
                color: string_or_default(object.get("color")),
                due_date: object
                    .get("dueDate")
                    .and_then(Value::as_str)
                    .filter(|d| !d.trim().is_empty())
                    .map(str::to_string),
                subtasks: repair_subtasks(object.get("subtasks")),
                is_completed,
                completed_at,
                created_at,
            },
        );
    }
    tasks
}

/// Make workspace column listings and column ownership agree: a column
/// listed by a workspace belongs to it (first listing wins); a column
/// listed nowhere is appended to the workspace it claims, or to the
/// first workspace when that claim dangles.
fn reconcile_workspace_columns(
    workspaces: &mut [Workspace],
    columns: &mut IndexMap<String, Column>,
) {
    let mut placed = HashSet::new();
    for workspace in workspaces.iter_mut() {
        workspace
            .columns
            .retain(|column_id| columns.contains_key(column_id) && placed.insert(column_id.clone()));
        for column_id in &workspace.columns {
            if let Some(column) = columns.get_mut(column_id) {
                column.workspace_id = workspace.id.clone();
            }
        }
    }

    let unplaced: Vec<String> = columns
        .keys()
        .filter(|id| !placed.contains(*id))
        .cloned()
        .collect();
    for column_id in unplaced {
        let claimed = columns[&column_id].workspace_id.clone();
        if let Some(workspace) = workspaces.iter_mut().find(|w| w.id == claimed) {
            workspace.columns.push(column_id);
            continue;
        }
        warn!(column_id = %column_id, "column ownership dangling; attaching to first workspace");
        workspaces[0].columns.push(column_id.clone());
        if let Some(column) = columns.get_mut(&column_id) {
            column.workspace_id = workspaces[0].id.clone();
        }
    }
}

/// Step 6 — rebuild the order index. Keeps a snapshot entry only when
/// the task exists, lives in that column, and has not been placed yet;
/// every unplaced task is appended to its own column's list.
fn rebuild_column_task_order(
    value: Option<&Value>,
    columns: &IndexMap<String, Column>,
    tasks: &IndexMap<String, Task>,
) -> IndexMap<String, Vec<String>> {
    let mut order: IndexMap<String, Vec<String>> = columns
        .keys()
        .map(|id| (id.clone(), Vec::new()))
        .collect();
    let mut placed: HashSet<String> = HashSet::new();

    if let Some(Value::Object(entries)) = value {
        for (column_id, list) in entries {
            let Some(rebuilt) = order.get_mut(column_id) else {
                continue;
            };
            let Value::Array(list) = list else {
                continue;
            };
            for task_id in list.iter().filter_map(Value::as_str) {
                let belongs = tasks
                    .get(task_id)
                    .is_some_and(|task| task.column_id == *column_id);
                // First occurrence wins; duplicates across (or within)
                // columns are silently dropped.
                if belongs && placed.insert(task_id.to_string()) {
                    rebuilt.push(task_id.to_string());
                }
            }
        }
    }

    for (task_id, task) in tasks {
        if !placed.contains(task_id) {
            if let Some(rebuilt) = order.get_mut(&task.column_id) {
                rebuilt.push(task_id.clone());
            }
        }
    }
    order
}

// ---------------------------------------------------------------------------
// Field-level repair helpers
// ---------------------------------------------------------------------------

fn string_or_default(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default()
}

fn repair_tags(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(raw)) = value else {
        return Vec::new();
    };
    let mut tags = Vec::with_capacity(raw.len());
    for tag in raw.iter().filter_map(Value::as_str) {
        let tag = normalize_tag(tag);
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

fn repair_priority(value: Option<&Value>) -> Option<Priority> {
    value.and_then(Value::as_str).and_then(Priority::parse)
}

fn repair_subtasks(value: Option<&Value>) -> Vec<Subtask> {
    let Some(Value::Array(raw)) = value else {
        return Vec::new();
    };
    raw.iter()
        .filter_map(|entry| {
            let object = entry.as_object()?;
            let text = collapse_whitespace(object.get("text").and_then(Value::as_str)?);
            if text.is_empty() {
                return None;
            }
            Some(Subtask {
                text,
                done: object.get("done").and_then(Value::as_bool).unwrap_or(false),
            })
        })
        .collect()
}

/// Timestamps arrive as RFC 3339 strings from current snapshots or as
/// epoch milliseconds from legacy ones.
fn parse_timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    match value? {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn garbage_input_falls_back_to_defaults() {
        for value in [json!(null), json!(42), json!("nope"), json!([1, 2])] {
            let state = repair_snapshot(&value, now());
            assert_eq!(state.workspaces.len(), 1);
            assert_eq!(state.columns.len(), 3);
        }
    }

    #[test]
    fn empty_workspace_list_falls_back_to_defaults() {
        let state = repair_snapshot(&json!({"workspaces": []}), now());
        assert_eq!(state.workspaces.len(), 1);
        assert_eq!(state.columns.len(), 3);
    }

    #[test]
    fn transient_fields_are_never_trusted() {
        let snapshot = json!({
            "workspaces": [{"id": "w1", "name": "W", "columns": ["c1"]}],
            "columns": {"c1": {"workspaceId": "w1", "title": "Col"}},
            "tasks": {},
            "currentWorkspaceId": "w1",
            "toasts": [{"id": "t", "message": "stale"}],
            "dialog": {"isOpen": true},
            "activeTaskId": "ghost"
        });
        let state = repair_snapshot(&snapshot, now());
        assert!(state.toasts.is_empty());
        assert!(!state.dialog.is_open);
        assert_eq!(state.active_task_id, None);
    }

    #[test]
    fn legacy_filter_array_migrates_to_tags() {
        let snapshot = json!({
            "workspaces": [{"id": "w1", "name": "W", "columns": ["c1"]}],
            "columns": {"c1": {"workspaceId": "w1", "title": "Col"}},
            "tasks": {
                "t1": {"columnId": "c1", "title": "x", "tags": ["kept"],
                        "createdAt": "2026-02-01T00:00:00Z"}
            },
            "currentWorkspaceId": "w1",
            "activeFilters": ["kept", "gone", 7, null]
        });
        let state = repair_snapshot(&snapshot, now());
        // Malformed entries dropped; "gone" pruned against the vocabulary.
        assert_eq!(
            state.active_filters.tags.iter().cloned().collect::<Vec<_>>(),
            vec!["kept"]
        );
        assert!(state.active_filters.priorities.is_empty());
    }

    #[test]
    fn task_field_repairs_and_completed_at_backfill() {
        let snapshot = json!({
            "workspaces": [{"id": "w1", "name": "W", "columns": ["c1"]}],
            "columns": {"c1": {"workspaceId": "w1", "title": "Col"}},
            "currentWorkspaceId": "w1",
            "tasks": {
                "t1": {
                    "columnId": "c1",
                    "title": "  needs   fixing  ",
                    "tags": ["#Weird Tag", 5],
                    "priority": "nonsense",
                    "isCompleted": true,
                    "createdAt": 1767225600000i64,
                    "subtasks": [{"text": " ok "}, {"nope": true}, "junk"]
                },
                "t2": {"columnId": "c1", "title": ""}
            }
        });
        let state = repair_snapshot(&snapshot, now());
        let t1 = state.task("t1").unwrap();
        assert_eq!(t1.title, "needs fixing");
        assert_eq!(t1.tags, vec!["weird-tag"]);
        assert_eq!(t1.priority, None);
        assert_eq!(t1.subtasks, vec![Subtask::new("ok")]);
        assert_eq!(t1.created_at.timestamp_millis(), 1767225600000);
        assert_eq!(t1.completed_at, Some(t1.created_at));

        let t2 = state.task("t2").unwrap();
        assert_eq!(t2.title, FALLBACK_TASK_TITLE);
        assert_eq!(t2.created_at, now());
    }

    #[test]
    fn orphan_task_repoints_to_first_column_of_active_workspace() {
        let snapshot = json!({
            "workspaces": [{"id": "w1", "name": "W", "columns": ["c1", "c2"]}],
            "columns": {
                "c1": {"workspaceId": "w1", "title": "A"},
                "c2": {"workspaceId": "w1", "title": "B"}
            },
            "currentWorkspaceId": "w1",
            "tasks": {
                "t1": {"columnId": "deleted-col", "title": "orphan",
                        "createdAt": "2026-02-01T00:00:00Z"}
            },
            "columnTaskOrder": {"deleted-col": ["t1"]}
        });
        let state = repair_snapshot(&snapshot, now());
        assert_eq!(state.task("t1").unwrap().column_id, "c1");
        // Included in c1's order exactly once.
        assert_eq!(state.column_task_order["c1"], vec!["t1"]);
        assert_eq!(state.column_task_order["c2"], Vec::<String>::new());
    }

    #[test]
    fn order_rebuild_dedupes_and_appends_missing() {
        let snapshot = json!({
            "workspaces": [{"id": "w1", "name": "W", "columns": ["c1", "c2"]}],
            "columns": {
                "c1": {"workspaceId": "w1", "title": "A"},
                "c2": {"workspaceId": "w1", "title": "B"}
            },
            "currentWorkspaceId": "w1",
            "tasks": {
                "t1": {"columnId": "c1", "title": "one", "createdAt": "2026-02-01T00:00:00Z"},
                "t2": {"columnId": "c1", "title": "two", "createdAt": "2026-02-01T00:00:00Z"},
                "t3": {"columnId": "c2", "title": "three", "createdAt": "2026-02-01T00:00:00Z"}
            },
            // t1 listed twice (and once under the wrong column), t2 never listed.
            "columnTaskOrder": {
                "c1": ["t1", "ghost", "t1"],
                "c2": ["t1", "t3"]
            }
        });
        let state = repair_snapshot(&snapshot, now());
        assert_eq!(state.column_task_order["c1"], vec!["t1", "t2"]);
        assert_eq!(state.column_task_order["c2"], vec!["t3"]);
    }

    #[test]
    fn unknown_active_workspace_falls_back_to_first() {
        let snapshot = json!({
            "workspaces": [
                {"id": "w1", "name": "First", "columns": []},
                {"id": "w2", "name": "Second", "columns": []}
            ],
            "columns": {},
            "tasks": {},
            "currentWorkspaceId": "gone"
        });
        let state = repair_snapshot(&snapshot, now());
        assert_eq!(state.current_workspace_id, "w1");
    }

    #[test]
    fn unlisted_column_is_attached_to_its_claimed_workspace() {
        let snapshot = json!({
            "workspaces": [{"id": "w1", "name": "W", "columns": []}],
            "columns": {"c9": {"workspaceId": "w1", "title": "Lost"}},
            "tasks": {},
            "currentWorkspaceId": "w1"
        });
        let state = repair_snapshot(&snapshot, now());
        assert_eq!(state.workspaces[0].columns, vec!["c9"]);
    }

    #[test]
    fn show_completed_defaults_to_false() {
        let snapshot = json!({
            "workspaces": [{"id": "w1", "name": "W", "columns": ["c1"]}],
            "columns": {"c1": {"workspaceId": "w1", "title": "Col", "showCompleted": null}},
            "tasks": {},
            "currentWorkspaceId": "w1"
        });
        let state = repair_snapshot(&snapshot, now());
        assert!(!state.column("c1").unwrap().show_completed);
    }

    #[test]
    fn templates_survive_hydration_inside_workspaces() {
        let snapshot = json!({
            "workspaces": [{
                "id": "w1", "name": "W", "columns": [],
                "templates": [
                    {"id": "tp1", "name": "Bug", "tags": ["#BUG"], "priority": "II"},
                    {"name": ""},
                    17
                ]
            }],
            "columns": {},
            "tasks": {},
            "currentWorkspaceId": "w1"
        });
        let state = repair_snapshot(&snapshot, now());
        let templates = &state.workspaces[0].templates;
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].name, "Bug");
        assert_eq!(templates[0].tags, vec!["bug"]);
        assert_eq!(templates[0].priority, Some(Priority::II));
        assert_eq!(templates[0].workspace_id, "w1");
    }
}
