//! Data models
//!
//! Row types for the tracker store plus the configuration value objects
//! (quarters, status mapping) the metrics engine consumes.

pub mod history;
pub mod quarter;
pub mod status_mapping;
pub mod sync_run;
pub mod task;

pub use history::{StatusHistoryEntry, StatusInterval};
pub use quarter::Quarter;
pub use status_mapping::{GroupBy, MetricKind, StatusMapping};
pub use sync_run::{SyncCounters, SyncRun, SyncRunStatus};
pub use task::{TaskLink, TaskRecord, TaskRow};
