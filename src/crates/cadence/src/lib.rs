//! # Cadence - Tracker Sync & Delivery Metrics
//!
//! Ingests issue-tracking data from a remote tracker REST API into a
//! local relational store and derives delivery-lifecycle metrics from
//! the resulting status history.
//!
//! ## Features
//!
//! - **Scroll-paginated sync** - lazy search producer feeding a bounded
//!   worker pool, one write transaction per task
//! - **History replay** - the remote changelog is the authority; a
//!   task's intervals are rebuilt from scratch on every refresh
//! - **Pause-aware metrics** - TTD, TTM, DevLT, Tail and status-duration
//!   sums, all excluding configured pause statuses
//! - **Hierarchy returns** - testing-return counts across the
//!   cross-queue link graph via one recursive SQL walk
//! - **CSV reports** - per-task details, per-root returns and
//!   time-in-status, with an optional quarter-aggregated view
//!
//! ## Architecture
//!
//! The sync side (`tracker`, `sync`) talks to the network; the metric
//! side (`metrics`, `reports`) reads snapshots from the store. The two
//! meet only at the persistence layer (`db`, `repositories`) and are
//! never entangled: no metric pass reaches back to the network.

pub mod cli;
pub mod config;
pub mod db;
pub mod metrics;
pub mod models;
pub mod reports;
pub mod repositories;
pub mod shutdown;
pub mod sync;
pub mod tracker;
pub mod version;

// Error types and utilities
mod error;

// Re-export key types for convenience
pub use config::{load_config, CadenceConfig};
pub use db::Database;
pub use error::{CadenceError, Result};
pub use metrics::{MetricsEngine, TaskMetrics};
pub use models::{
    GroupBy, MetricKind, Quarter, StatusHistoryEntry, StatusInterval, StatusMapping,
    SyncCounters, SyncRun, SyncRunStatus, TaskLink, TaskRecord, TaskRow,
};
pub use repositories::{
    HierarchyRepository, HistoryRepository, SyncRunRepository, TaskRepository,
};
pub use shutdown::ShutdownCoordinator;
pub use sync::{build_history, SingleInstance, SyncOptions, SyncOrchestrator};
pub use tracker::{TrackerClient, TrackerError};
