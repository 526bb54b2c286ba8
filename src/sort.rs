//! Deterministic task orderings. Whatever the mode, ties break by
//! manual rank, then creation time (newest first), then task id — so
//! every sort is total and reproducible.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::model::{AppState, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    /// Precomputed manual rank (column-task-order traversal).
    #[default]
    Manual,
    /// Due date ascending; tasks without a due date sort last.
    DueDate,
    /// I < II < III < IV; unassigned sorts last.
    Priority,
    /// Creation time descending — newest first.
    CreatedAt,
}

/// Derive manual ranks for a workspace: walk its columns in order and
/// each column's order list in order, assigning increasing integers to
/// first-seen task ids.
pub fn manual_ranks(state: &AppState, workspace_id: &str) -> HashMap<String, usize> {
    let mut ranks = HashMap::new();
    let Some(workspace) = state.workspace(workspace_id) else {
        return ranks;
    };
    let mut next = 0;
    for column_id in &workspace.columns {
        let Some(order) = state.column_task_order.get(column_id) else {
            continue;
        };
        for task_id in order {
            if !ranks.contains_key(task_id) {
                ranks.insert(task_id.clone(), next);
                next += 1;
            }
        }
    }
    ranks
}

/// Total comparison of two tasks under the given mode.
pub fn compare_tasks(
    a: &Task,
    b: &Task,
    mode: SortMode,
    ranks: &HashMap<String, usize>,
) -> Ordering {
    let primary = match mode {
        // Manual is the rank itself, which also leads the tie-break chain.
        SortMode::Manual => Ordering::Equal,
        SortMode::DueDate => match (&a.due_date, &b.due_date) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        SortMode::Priority => priority_rank(a).cmp(&priority_rank(b)),
        SortMode::CreatedAt => b.created_at.cmp(&a.created_at),
    };

    primary
        .then_with(|| rank_of(a, ranks).cmp(&rank_of(b, ranks)))
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Sort borrowed task objects in place.
pub fn sort_task_objects(tasks: &mut [&Task], mode: SortMode, ranks: &HashMap<String, usize>) {
    tasks.sort_by(|a, b| compare_tasks(a, b, mode, ranks));
}

/// Sort task ids by looking the tasks up in the store. Ids that do not
/// resolve are dropped.
pub fn sort_task_ids(
    state: &AppState,
    ids: &[String],
    mode: SortMode,
    ranks: &HashMap<String, usize>,
) -> Vec<String> {
    let mut tasks: Vec<&Task> = ids.iter().filter_map(|id| state.task(id)).collect();
    sort_task_objects(&mut tasks, mode, ranks);
    tasks.into_iter().map(|t| t.id.clone()).collect()
}

fn rank_of(task: &Task, ranks: &HashMap<String, usize>) -> usize {
    ranks.get(&task.id).copied().unwrap_or(usize::MAX)
}

fn priority_rank(task: &Task) -> u8 {
    match task.priority {
        Some(p) => p as u8,
        None => 4,
    }
}
