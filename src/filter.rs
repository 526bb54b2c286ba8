//! Filter predicate: does a task match the active filter sets and the
//! free-text search query?

use crate::model::{ActiveFilters, Task};

/// A task matches when every active dimension admits it:
/// - no tag filter is active, or the task carries at least one filtered tag;
/// - no priority filter is active, or the task's priority is in the set;
/// - the query is empty, or is a case-insensitive substring of the
///   title, description, or any tag. Subtask text is never searched.
pub fn task_matches_filters(task: &Task, filters: &ActiveFilters, query: &str) -> bool {
    if !filters.tags.is_empty() && !task.tags.iter().any(|t| filters.tags.contains(t)) {
        return false;
    }

    if !filters.priorities.is_empty()
        && !task
            .priority
            .is_some_and(|p| filters.priorities.contains(&p))
    {
        return false;
    }

    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }
    task.title.to_lowercase().contains(&query)
        || task.description.to_lowercase().contains(&query)
        || task.tags.iter().any(|t| t.to_lowercase().contains(&query))
}
