//! Name validation for workspaces, columns, and task titles. Pure:
//! reads state for uniqueness checks, never mutates it.

use crate::model::AppState;
use crate::ops::OpError;
use crate::parse::collapse_whitespace;

/// What kind of name is being validated; decides the field label and
/// length limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Workspace,
    Column,
    TaskTitle,
}

impl NameKind {
    pub fn max_len(self) -> usize {
        match self {
            NameKind::Workspace | NameKind::Column => 80,
            NameKind::TaskTitle => 200,
        }
    }

    fn field(self) -> &'static str {
        match self {
            NameKind::Workspace => "name",
            NameKind::Column => "title",
            NameKind::TaskTitle => "title",
        }
    }
}

/// Extra context for column validation: the owning workspace, and an
/// optional column to exclude from the duplicate check (rename-in-place).
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnContext<'a> {
    pub workspace_id: Option<&'a str>,
    pub exclude_column_id: Option<&'a str>,
}

/// Validate and normalize a name. Whitespace runs collapse to single
/// spaces; the result is trimmed. Column names must additionally be
/// unique (case-insensitive) within their workspace.
pub fn validate_name(
    state: &AppState,
    kind: NameKind,
    raw: &str,
    ctx: ColumnContext<'_>,
) -> Result<String, OpError> {
    let normalized = collapse_whitespace(raw);
    if normalized.is_empty() {
        return Err(OpError::Required {
            field: kind.field(),
        });
    }
    if normalized.chars().count() > kind.max_len() {
        return Err(OpError::MaxLengthExceeded {
            field: kind.field(),
            max: kind.max_len(),
        });
    }

    if kind == NameKind::Column {
        let workspace = ctx
            .workspace_id
            .and_then(|id| state.workspace(id))
            .ok_or(OpError::InvalidTarget { what: "workspace" })?;

        let lowered = normalized.to_lowercase();
        let duplicate = workspace
            .columns
            .iter()
            .filter(|id| Some(id.as_str()) != ctx.exclude_column_id)
            .filter_map(|id| state.column(id))
            .any(|column| column.title.to_lowercase() == lowered);
        if duplicate {
            return Err(OpError::DuplicateColumnName { title: normalized });
        }
    }

    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_column() -> (AppState, String, String) {
        let state = AppState::default_data();
        let workspace_id = state.current_workspace_id.clone();
        let column_id = state.workspaces[0].columns[0].clone();
        (state, workspace_id, column_id)
    }

    #[test]
    fn normalizes_whitespace_runs() {
        let state = AppState::default_data();
        let name = validate_name(
            &state,
            NameKind::Workspace,
            "  My   board \t name ",
            ColumnContext::default(),
        )
        .unwrap();
        assert_eq!(name, "My board name");
    }

    #[test]
    fn empty_after_normalization_is_required() {
        let state = AppState::default_data();
        let err = validate_name(&state, NameKind::TaskTitle, "   ", ColumnContext::default())
            .unwrap_err();
        assert_eq!(err.code(), "required");
        assert_eq!(err.field(), Some("title"));
    }

    #[test]
    fn length_limits_per_kind() {
        let state = AppState::default_data();
        let long = "x".repeat(81);
        let err = validate_name(&state, NameKind::Workspace, &long, ColumnContext::default())
            .unwrap_err();
        assert_eq!(err.max_length(), Some(80));

        // 81 chars is fine for a task title; 201 is not.
        assert!(validate_name(&state, NameKind::TaskTitle, &long, ColumnContext::default()).is_ok());
        let longer = "x".repeat(201);
        let err = validate_name(&state, NameKind::TaskTitle, &longer, ColumnContext::default())
            .unwrap_err();
        assert_eq!(err.max_length(), Some(200));
    }

    #[test]
    fn column_requires_a_workspace() {
        let state = AppState::default_data();
        let err =
            validate_name(&state, NameKind::Column, "Fine", ColumnContext::default()).unwrap_err();
        assert_eq!(err.code(), "invalid_target");
    }

    #[test]
    fn duplicate_column_is_case_insensitive() {
        let (state, workspace_id, _) = state_with_column();
        let err = validate_name(
            &state,
            NameKind::Column,
            "to do",
            ColumnContext {
                workspace_id: Some(&workspace_id),
                exclude_column_id: None,
            },
        )
        .unwrap_err();
        assert_eq!(err.code(), "duplicate_column_name");
    }

    #[test]
    fn rename_in_place_excludes_itself() {
        let (state, workspace_id, column_id) = state_with_column();
        let name = validate_name(
            &state,
            NameKind::Column,
            "TO DO",
            ColumnContext {
                workspace_id: Some(&workspace_id),
                exclude_column_id: Some(&column_id),
            },
        )
        .unwrap();
        assert_eq!(name, "TO DO");
    }

    #[test]
    fn validation_never_mutates_state() {
        let (mut state, workspace_id, _) = state_with_column();
        let before = state.clone();
        let _ = validate_name(
            &mut state,
            NameKind::Column,
            "Fresh",
            ColumnContext {
                workspace_id: Some(&workspace_id),
                exclude_column_id: None,
            },
        );
        assert_eq!(state, before);
    }
}
