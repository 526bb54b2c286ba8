use crate::model::{new_id, AppState, Priority, Subtask, TaskTemplate};
use crate::ops::task_ops::{normalize_subtasks, normalize_tags};
use crate::ops::OpError;
use crate::validate::{validate_name, ColumnContext, NameKind};

/// Structured template input, for create and wholesale update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplatePayload {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub priority: Option<Priority>,
    pub color: String,
    pub subtasks: Vec<Subtask>,
}

pub fn create_template(
    state: &mut AppState,
    workspace_id: &str,
    payload: TemplatePayload,
) -> Result<String, OpError> {
    if state.workspace(workspace_id).is_none() {
        return Err(OpError::InvalidTarget { what: "workspace" });
    }
    let name = validate_name(state, NameKind::Workspace, &payload.name, ColumnContext::default())?;

    let template_id = new_id();
    let template = TaskTemplate {
        id: template_id.clone(),
        workspace_id: workspace_id.to_string(),
        name,
        description: payload.description,
        tags: normalize_tags(&payload.tags),
        priority: payload.priority,
        color: payload.color,
        subtasks: normalize_subtasks(payload.subtasks),
    };
    if let Some(workspace) = state.workspace_mut(workspace_id) {
        workspace.templates.push(template);
    }
    Ok(template_id)
}

/// Replace a template's contents (the id and owning workspace stay).
pub fn update_template(
    state: &mut AppState,
    template_id: &str,
    payload: TemplatePayload,
) -> Result<(), OpError> {
    let name = validate_name(state, NameKind::Workspace, &payload.name, ColumnContext::default())?;
    let tags = normalize_tags(&payload.tags);
    let subtasks = normalize_subtasks(payload.subtasks);

    let template = state
        .workspaces
        .iter_mut()
        .flat_map(|w| w.templates.iter_mut())
        .find(|t| t.id == template_id)
        .ok_or(OpError::InvalidTarget { what: "template" })?;
    template.name = name;
    template.description = payload.description;
    template.tags = tags;
    template.priority = payload.priority;
    template.color = payload.color;
    template.subtasks = subtasks;
    Ok(())
}

pub fn delete_template(state: &mut AppState, template_id: &str) -> Result<(), OpError> {
    for workspace in &mut state.workspaces {
        let before = workspace.templates.len();
        workspace.templates.retain(|t| t.id != template_id);
        if workspace.templates.len() < before {
            return Ok(());
        }
    }
    Err(OpError::InvalidTarget { what: "template" })
}

/// Look a template up by name within a workspace, case-insensitively.
/// The first match wins when names collide.
pub fn find_template<'a>(
    state: &'a AppState,
    workspace_id: &str,
    name: &str,
) -> Option<&'a TaskTemplate> {
    let workspace = state.workspace(workspace_id)?;
    workspace
        .templates
        .iter()
        .find(|t| t.name.eq_ignore_ascii_case(name))
}
