use chrono::{DateTime, Utc};
use tracing::debug;

use crate::model::{new_id, AppState, Priority, Subtask, Task};
use crate::ops::template_ops::find_template;
use crate::ops::OpError;
use crate::parse::{collapse_whitespace, extract_tags, normalize_tag, parse_template_command};
use crate::validate::{validate_name, ColumnContext, NameKind};

/// Structured task creation input. Also the shape a template expands to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPayload {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub priority: Option<Priority>,
    pub color: String,
    pub due_date: Option<String>,
    pub subtasks: Vec<Subtask>,
}

/// Partial update: only provided fields change. The double-`Option`
/// fields distinguish "leave alone" from "clear".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub priority: Option<Option<Priority>>,
    pub color: Option<String>,
    pub due_date: Option<Option<String>>,
    pub column_id: Option<String>,
    pub is_completed: Option<bool>,
}

/// Create a task from raw input text. A leading `/name` invokes the
/// workspace template of that name; hashtag tokens become tags; the
/// remaining text is the title.
pub fn create_task_from_text(
    state: &mut AppState,
    column_id: &str,
    text: &str,
    now: DateTime<Utc>,
) -> Result<String, OpError> {
    let workspace_id = state
        .column(column_id)
        .map(|c| c.workspace_id.clone())
        .ok_or(OpError::InvalidTarget { what: "column" })?;

    let mut payload = TaskPayload::default();
    let mut title_text = text.to_string();
    if let Some((name, rest)) = parse_template_command(text) {
        if let Some(template) = find_template(state, &workspace_id, name) {
            payload = TaskPayload {
                title: String::new(),
                description: template.description.clone(),
                tags: template.tags.clone(),
                priority: template.priority,
                color: template.color.clone(),
                due_date: None,
                subtasks: template.subtasks.clone(),
            };
            // An empty remainder falls back to the template's own name.
            title_text = if rest.is_empty() {
                template.name.clone()
            } else {
                rest.to_string()
            };
        }
    }

    let (title, extracted) = extract_tags(&title_text);
    payload.title = title;
    for tag in extracted {
        if !payload.tags.contains(&tag) {
            payload.tags.push(tag);
        }
    }
    create_task_from_payload(state, column_id, payload, now)
}

/// Create a task from a structured payload. Tags and subtasks are
/// re-normalized; the title is validated like any other name.
pub fn create_task_from_payload(
    state: &mut AppState,
    column_id: &str,
    payload: TaskPayload,
    now: DateTime<Utc>,
) -> Result<String, OpError> {
    if state.column(column_id).is_none() {
        return Err(OpError::InvalidTarget { what: "column" });
    }
    let title = validate_name(state, NameKind::TaskTitle, &payload.title, ColumnContext::default())?;

    let task_id = new_id();
    let mut task = Task::new(task_id.clone(), column_id.to_string(), title, now);
    task.tags = normalize_tags(&payload.tags);
    task.priority = payload.priority;
    task.description = payload.description;
    task.color = payload.color;
    task.due_date = payload.due_date.filter(|d| !d.trim().is_empty());
    task.subtasks = normalize_subtasks(payload.subtasks);

    state.tasks.insert(task_id.clone(), task);
    state
        .column_task_order
        .entry(column_id.to_string())
        .or_default()
        .push(task_id.clone());
    debug!(%task_id, column_id, "created task");
    Ok(task_id)
}

/// Apply a partial patch. A `column_id` change atomically moves the
/// task between the two order lists (appending at the target's end).
pub fn update_task(
    state: &mut AppState,
    task_id: &str,
    patch: TaskPatch,
    now: DateTime<Utc>,
) -> Result<(), OpError> {
    if !state.tasks.contains_key(task_id) {
        return Err(OpError::InvalidTarget { what: "task" });
    }

    let title = match &patch.title {
        Some(raw) => Some(validate_name(
            state,
            NameKind::TaskTitle,
            raw,
            ColumnContext::default(),
        )?),
        None => None,
    };

    if let Some(target_column) = &patch.column_id {
        if state.column(target_column).is_none() {
            return Err(OpError::InvalidTarget { what: "column" });
        }
        let source_column = state.tasks[task_id].column_id.clone();
        if *target_column != source_column {
            detach_from_order(state, &source_column, task_id);
            state
                .column_task_order
                .entry(target_column.clone())
                .or_default()
                .push(task_id.to_string());
            if let Some(task) = state.tasks.get_mut(task_id) {
                task.column_id = target_column.clone();
            }
        }
    }

    let task = state
        .tasks
        .get_mut(task_id)
        .ok_or(OpError::InvalidTarget { what: "task" })?;
    if let Some(title) = title {
        task.title = title;
    }
    if let Some(description) = patch.description {
        task.description = description;
    }
    if let Some(tags) = patch.tags {
        task.tags = normalize_tags(&tags);
    }
    if let Some(priority) = patch.priority {
        task.priority = priority;
    }
    if let Some(color) = patch.color {
        task.color = color;
    }
    if let Some(due_date) = patch.due_date {
        task.due_date = due_date.filter(|d| !d.trim().is_empty());
    }
    if let Some(done) = patch.is_completed {
        set_completed_fields(task, done, now);
    }
    Ok(())
}

pub fn delete_task(state: &mut AppState, task_id: &str) -> Result<(), OpError> {
    let task = state
        .tasks
        .shift_remove(task_id)
        .ok_or(OpError::InvalidTarget { what: "task" })?;
    detach_from_order(state, &task.column_id, task_id);
    if state.active_task_id.as_deref() == Some(task_id) {
        state.active_task_id = None;
    }
    debug!(task_id, "deleted task");
    Ok(())
}

/// Move a task between columns (or within one) to an explicit index.
/// The index is clamped to `[0, target length]`.
pub fn move_task(
    state: &mut AppState,
    task_id: &str,
    from_column_id: &str,
    to_column_id: &str,
    index: usize,
) -> Result<(), OpError> {
    let actual_column = state
        .task(task_id)
        .map(|t| t.column_id.clone())
        .ok_or(OpError::InvalidTarget { what: "task" })?;
    if actual_column != from_column_id {
        return Err(OpError::InvalidTarget { what: "task" });
    }
    if state.column(to_column_id).is_none() {
        return Err(OpError::InvalidTarget { what: "column" });
    }

    detach_from_order(state, from_column_id, task_id);
    let order = state
        .column_task_order
        .entry(to_column_id.to_string())
        .or_default();
    let index = index.min(order.len());
    order.insert(index, task_id.to_string());
    if let Some(task) = state.tasks.get_mut(task_id) {
        task.column_id = to_column_id.to_string();
    }
    Ok(())
}

/// Replace a column's task order wholesale. The caller's list carries
/// the open tasks as the views see them; any of the column's tasks it
/// omits (typically the completed ones, which live in a separate view
/// list) keep their relative order, appended after the supplied order.
pub fn reorder_column_tasks(
    state: &mut AppState,
    column_id: &str,
    order: Vec<String>,
) -> Result<(), OpError> {
    let current = state
        .column_task_order
        .get(column_id)
        .cloned()
        .ok_or(OpError::InvalidTarget { what: "column" })?;

    let mut rebuilt = Vec::with_capacity(current.len());
    for task_id in order {
        let is_member = current.contains(&task_id);
        if is_member && !rebuilt.contains(&task_id) {
            rebuilt.push(task_id);
        }
    }
    for task_id in current {
        if !rebuilt.contains(&task_id) {
            rebuilt.push(task_id);
        }
    }
    state
        .column_task_order
        .insert(column_id.to_string(), rebuilt);
    Ok(())
}

// ---------------------------------------------------------------------------
// Scheduling and priority
// ---------------------------------------------------------------------------

/// Attach or clear a due date. The value is an opaque string; nothing
/// beyond emptiness is validated.
pub fn set_due_date(
    state: &mut AppState,
    task_id: &str,
    due_date: Option<String>,
) -> Result<(), OpError> {
    let task = state
        .tasks
        .get_mut(task_id)
        .ok_or(OpError::InvalidTarget { what: "task" })?;
    task.due_date = due_date.filter(|d| !d.trim().is_empty());
    Ok(())
}

pub fn set_priority(
    state: &mut AppState,
    task_id: &str,
    priority: Option<Priority>,
) -> Result<(), OpError> {
    let task = state
        .tasks
        .get_mut(task_id)
        .ok_or(OpError::InvalidTarget { what: "task" })?;
    task.priority = priority;
    Ok(())
}

pub fn set_completed(
    state: &mut AppState,
    task_id: &str,
    done: bool,
    now: DateTime<Utc>,
) -> Result<(), OpError> {
    let task = state
        .tasks
        .get_mut(task_id)
        .ok_or(OpError::InvalidTarget { what: "task" })?;
    set_completed_fields(task, done, now);
    Ok(())
}

// ---------------------------------------------------------------------------
// Subtasks
// ---------------------------------------------------------------------------

pub fn add_subtask(state: &mut AppState, task_id: &str, text: &str) -> Result<(), OpError> {
    let text = collapse_whitespace(text);
    if text.is_empty() {
        return Err(OpError::Required { field: "text" });
    }
    let task = state
        .tasks
        .get_mut(task_id)
        .ok_or(OpError::InvalidTarget { what: "task" })?;
    task.subtasks.push(Subtask::new(text));
    Ok(())
}

pub fn update_subtask(
    state: &mut AppState,
    task_id: &str,
    index: usize,
    text: Option<&str>,
    done: Option<bool>,
) -> Result<(), OpError> {
    let task = state
        .tasks
        .get_mut(task_id)
        .ok_or(OpError::InvalidTarget { what: "task" })?;
    let subtask = task
        .subtasks
        .get_mut(index)
        .ok_or(OpError::InvalidTarget { what: "subtask" })?;
    if let Some(text) = text {
        let text = collapse_whitespace(text);
        if text.is_empty() {
            return Err(OpError::Required { field: "text" });
        }
        subtask.text = text;
    }
    if let Some(done) = done {
        subtask.done = done;
    }
    Ok(())
}

pub fn delete_subtask(state: &mut AppState, task_id: &str, index: usize) -> Result<(), OpError> {
    let task = state
        .tasks
        .get_mut(task_id)
        .ok_or(OpError::InvalidTarget { what: "task" })?;
    if index >= task.subtasks.len() {
        return Err(OpError::InvalidTarget { what: "subtask" });
    }
    task.subtasks.remove(index);
    Ok(())
}

/// Replace the whole subtask list. Each element is re-normalized and
/// blank entries are dropped, so a stale caller list cannot smuggle in
/// malformed rows.
pub fn reorder_subtasks(
    state: &mut AppState,
    task_id: &str,
    subtasks: Vec<Subtask>,
) -> Result<(), OpError> {
    let task = state
        .tasks
        .get_mut(task_id)
        .ok_or(OpError::InvalidTarget { what: "task" })?;
    task.subtasks = normalize_subtasks(subtasks);
    Ok(())
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

pub(crate) fn normalize_tags(raw: &[String]) -> Vec<String> {
    let mut tags = Vec::with_capacity(raw.len());
    for tag in raw {
        let tag = normalize_tag(tag);
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

pub(crate) fn normalize_subtasks(raw: Vec<Subtask>) -> Vec<Subtask> {
    raw.into_iter()
        .filter_map(|s| {
            let text = collapse_whitespace(&s.text);
            (!text.is_empty()).then_some(Subtask { text, done: s.done })
        })
        .collect()
}

fn set_completed_fields(task: &mut Task, done: bool, now: DateTime<Utc>) {
    task.is_completed = done;
    if done {
        if task.completed_at.is_none() {
            task.completed_at = Some(now);
        }
    } else {
        task.completed_at = None;
    }
}

fn detach_from_order(state: &mut AppState, column_id: &str, task_id: &str) {
    if let Some(order) = state.column_task_order.get_mut(column_id) {
        order.retain(|id| id != task_id);
    }
}
