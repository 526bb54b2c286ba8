//! slate — the state engine behind a local-first task board.
//!
//! Workspaces contain columns contain tasks; the store owns the single
//! in-memory model, its mutation API, validation, snapshot hydration
//! with referential-integrity repair, tag/template parsing,
//! deterministic sorting, and debounced persistence to a key-value
//! byte store. Views read entities by id and call mutations; they
//! never touch entities directly.

pub mod filter;
pub mod hydrate;
pub mod io;
pub mod model;
pub mod ops;
pub mod parse;
pub mod sort;
pub mod store;
pub mod validate;

pub use filter::task_matches_filters;
pub use hydrate::repair_snapshot;
pub use model::config::StoreConfig;
pub use model::{AppState, Priority, Task};
pub use ops::OpError;
pub use sort::{manual_ranks, sort_task_ids, sort_task_objects, SortMode};
pub use store::Store;
