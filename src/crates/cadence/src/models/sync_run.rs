//! Sync run log rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Sync run status enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncRunStatus {
    /// Run is in progress.
    Running,
    /// Run finished and counters are final.
    Completed,
    /// Run aborted; `error_message` carries the reason.
    Failed,
}

impl SyncRunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for SyncRunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for SyncRunStatus {
    fn from(s: &str) -> Self {
        match s {
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            _ => Self::Running,
        }
    }
}

/// Audit row for one sync invocation.
#[derive(Debug, Clone, FromRow)]
pub struct SyncRun {
    /// Run id (UUID string).
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: String,
    pub tasks_processed: i64,
    pub tasks_created: i64,
    pub tasks_updated: i64,
    pub history_entries_processed: i64,
    pub errors_count: i64,
    pub error_message: Option<String>,
}

/// Counters aggregated across workers during one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncCounters {
    pub tasks_processed: u64,
    pub tasks_created: u64,
    pub tasks_updated: u64,
    pub history_entries_processed: u64,
    pub errors_count: u64,
}

impl SyncCounters {
    /// Fold a per-task outcome into the totals.
    pub fn record_task(&mut self, created: bool, history_entries: u64) {
        self.tasks_processed += 1;
        if created {
            self.tasks_created += 1;
        } else {
            self.tasks_updated += 1;
        }
        self.history_entries_processed += history_entries;
    }

    pub fn record_error(&mut self) {
        self.errors_count += 1;
    }
}
