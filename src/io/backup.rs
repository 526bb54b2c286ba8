//! Backup import/export: the snapshot JSON, pretty-printed on the way
//! out, shape-checked on the way in before the hydration engine ever
//! sees it.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::model::AppState;

/// Import-time failure. Malformed JSON syntax is reported distinctly
/// from valid JSON of the wrong shape.
#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error("backup file is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("unsupported backup structure: {0}")]
    UnsupportedStructure(&'static str),
    #[error("backup is missing required fields: {0}")]
    MissingRequiredFields(String),
}

impl BackupError {
    pub fn code(&self) -> &'static str {
        match self {
            BackupError::InvalidJson(_) => "invalid_json",
            BackupError::UnsupportedStructure(_) => "unsupported_structure",
            BackupError::MissingRequiredFields(_) => "missing_required_fields",
        }
    }
}

/// Parse and shape-check a backup file. A structurally valid backup has
/// `workspaces` as a list and `columns`/`tasks` as keyed maps; anything
/// else is rejected here, before hydration.
pub fn parse_backup(text: &str) -> Result<Value, BackupError> {
    let value: Value = serde_json::from_str(text)?;
    let Some(root) = value.as_object() else {
        return Err(BackupError::UnsupportedStructure(
            "top level must be an object",
        ));
    };

    let missing: Vec<&str> = ["workspaces", "columns", "tasks"]
        .into_iter()
        .filter(|key| !root.contains_key(*key))
        .collect();
    if !missing.is_empty() {
        return Err(BackupError::MissingRequiredFields(missing.join(", ")));
    }

    if !root["workspaces"].is_array() {
        return Err(BackupError::UnsupportedStructure("workspaces must be a list"));
    }
    if !root["columns"].is_object() {
        return Err(BackupError::UnsupportedStructure("columns must be a map"));
    }
    if !root["tasks"].is_object() {
        return Err(BackupError::UnsupportedStructure("tasks must be a map"));
    }
    Ok(value)
}

/// Serialize the current persisted subset, pretty-printed.
pub fn export_backup(state: &AppState) -> String {
    // Snapshot serialization cannot fail: every field is plain data.
    serde_json::to_string_pretty(&state.snapshot()).unwrap_or_default()
}

/// The suggested download name, dated with the current day.
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!("slate-backup-{}.json", now.format("%Y-%m-%d"))
}
