//! Repositories for database operations
//!
//! Each repository wraps the shared pool and owns the SQL for one
//! aggregate: tasks, status history, sync runs, and the link-graph
//! hierarchy walk.

pub mod hierarchy_repository;
pub mod history_repository;
pub mod sync_run_repository;
pub mod task_repository;

pub use hierarchy_repository::HierarchyRepository;
pub use history_repository::HistoryRepository;
pub use sync_run_repository::SyncRunRepository;
pub use task_repository::{TaskRepository, TaskSyncOutcome};
