//! Sync engine
//!
//! Pulls task data from the remote tracker into the store: a scroll
//! producer feeds a bounded worker pool, each worker writes one task per
//! transaction, and the run is bracketed by the single-instance lock and
//! a sync run log row.

pub mod history_builder;
pub mod lock;
pub mod orchestrator;

pub use history_builder::{build_history, ReconstructedHistory};
pub use lock::SingleInstance;
pub use orchestrator::{SyncOptions, SyncOrchestrator, SyncOutcome};
