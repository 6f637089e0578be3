//! Sync run log repository.

use crate::db::Database;
use crate::error::{CadenceError, Result};
use crate::models::{SyncCounters, SyncRun, SyncRunStatus};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Repository for the append-only sync run log.
#[derive(Clone, Debug)]
pub struct SyncRunRepository {
    db: Arc<Database>,
}

impl SyncRunRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create a `running` log row and return its id.
    pub async fn start_run(&self) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO sync_runs (id, started_at, status) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(Utc::now())
            .bind(SyncRunStatus::Running.as_str())
            .execute(self.db.pool())
            .await
            .map_err(|e| CadenceError::Database(format!("failed to create sync run: {}", e)))?;

        Ok(id)
    }

    /// Finalize a run as completed with its counters.
    pub async fn complete_run(&self, id: &str, counters: &SyncCounters) -> Result<()> {
        self.finalize(id, SyncRunStatus::Completed, counters, None)
            .await
    }

    /// Finalize a run as failed with its counters and a short reason.
    pub async fn fail_run(&self, id: &str, counters: &SyncCounters, error: &str) -> Result<()> {
        self.finalize(id, SyncRunStatus::Failed, counters, Some(error))
            .await
    }

    async fn finalize(
        &self,
        id: &str,
        status: SyncRunStatus,
        counters: &SyncCounters,
        error: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE sync_runs
             SET completed_at = ?, status = ?, tasks_processed = ?, tasks_created = ?,
                 tasks_updated = ?, history_entries_processed = ?, errors_count = ?,
                 error_message = ?
             WHERE id = ?",
        )
        .bind(Utc::now())
        .bind(status.as_str())
        .bind(counters.tasks_processed as i64)
        .bind(counters.tasks_created as i64)
        .bind(counters.tasks_updated as i64)
        .bind(counters.history_entries_processed as i64)
        .bind(counters.errors_count as i64)
        .bind(error)
        .bind(id)
        .execute(self.db.pool())
        .await
        .map_err(|e| CadenceError::Database(format!("failed to finalize sync run: {}", e)))?;

        Ok(())
    }

    /// Flip stale `running` rows to failed.
    ///
    /// A crashed process cannot finalize its row; anything older than
    /// `max_age` is considered orphaned.
    pub async fn fail_orphaned_runs(&self, max_age: Duration) -> Result<u64> {
        let cutoff = Utc::now() - max_age;
        let result = sqlx::query(
            "UPDATE sync_runs
             SET status = ?, completed_at = ?, error_message = 'orphaned'
             WHERE status = ? AND started_at < ?",
        )
        .bind(SyncRunStatus::Failed.as_str())
        .bind(Utc::now())
        .bind(SyncRunStatus::Running.as_str())
        .bind(cutoff)
        .execute(self.db.pool())
        .await
        .map_err(|e| CadenceError::Database(format!("failed to sweep orphaned runs: {}", e)))?;

        let swept = result.rows_affected();
        if swept > 0 {
            warn!(count = swept, "marked orphaned sync runs as failed");
        }
        Ok(swept)
    }

    /// Load a run row by id.
    pub async fn find_by_id(&self, id: &str) -> Result<SyncRun> {
        let run = sqlx::query_as::<_, SyncRun>(
            "SELECT id, started_at, completed_at, status, tasks_processed, tasks_created,
                    tasks_updated, history_entries_processed, errors_count, error_message
             FROM sync_runs WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await
        .map_err(|e| CadenceError::Database(format!("failed to load sync run: {}", e)))?
        .ok_or_else(|| CadenceError::Database(format!("sync run not found: {}", id)))?;

        Ok(run)
    }

    /// Count rows in the log, for tests and health checks.
    pub async fn count(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sync_runs")
            .fetch_one(self.db.pool())
            .await
            .map_err(|e| CadenceError::Database(format!("failed to count sync runs: {}", e)))?;
        Ok(row.0)
    }
}
