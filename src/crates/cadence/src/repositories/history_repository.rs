//! Status history repository.

use crate::db::Database;
use crate::error::{CadenceError, Result};
use crate::models::{StatusHistoryEntry, StatusInterval};
use sqlx::Row;
use std::collections::HashMap;
use std::sync::Arc;

/// Repository for status history reads and maintenance.
///
/// History writes go through `TaskRepository::sync_task`, which replaces
/// a task's rows inside the same transaction as the task upsert.
#[derive(Clone, Debug)]
pub struct HistoryRepository {
    db: Arc<Database>,
}

impl HistoryRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Ordered intervals for one task.
    pub async fn history_for_task(&self, task_id: i64) -> Result<Vec<StatusInterval>> {
        let intervals = sqlx::query_as::<_, StatusInterval>(
            "SELECT status, status_display, start_date, end_date
             FROM task_history
             WHERE task_id = ?
             ORDER BY start_date",
        )
        .bind(task_id)
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| CadenceError::Database(format!("failed to load history: {}", e)))?;

        Ok(intervals)
    }

    /// Ordered intervals for many tasks, keyed by task key.
    ///
    /// One JOIN query for the whole batch; per-task lookups during a
    /// metric pass are a correctness smell.
    pub async fn histories_for_keys(
        &self,
        keys: &[String],
    ) -> Result<HashMap<String, Vec<StatusInterval>>> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }
        let keys_json = serde_json::to_string(keys)
            .map_err(|e| CadenceError::Database(format!("failed to encode keys: {}", e)))?;

        let rows = sqlx::query(
            "SELECT t.key AS key, h.status, h.status_display, h.start_date, h.end_date
             FROM task_history h
             JOIN tasks t ON t.id = h.task_id
             WHERE t.key IN (SELECT value FROM json_each(?))
             ORDER BY t.key, h.start_date",
        )
        .bind(&keys_json)
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| CadenceError::Database(format!("failed to load batched histories: {}", e)))?;

        let mut result: HashMap<String, Vec<StatusInterval>> = HashMap::new();
        for row in rows {
            let key: String = row.get("key");
            result.entry(key).or_default().push(StatusInterval {
                status: row.get("status"),
                status_display: row.get("status_display"),
                start_date: row.get("start_date"),
                end_date: row.get("end_date"),
            });
        }

        Ok(result)
    }

    /// Full stored rows for one task, insertion bookkeeping included.
    pub async fn rows_for_task(&self, task_id: i64) -> Result<Vec<StatusHistoryEntry>> {
        let rows = sqlx::query_as::<_, StatusHistoryEntry>(
            "SELECT id, task_id, tracker_id, status, status_display,
                    start_date, end_date, created_at
             FROM task_history
             WHERE task_id = ?
             ORDER BY start_date",
        )
        .bind(task_id)
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| CadenceError::Database(format!("failed to load history rows: {}", e)))?;

        Ok(rows)
    }

    /// Remove exact duplicates on `(task_id, status, start_date)`.
    ///
    /// Keeps the oldest row by insertion time. One window-function
    /// statement; idempotent.
    pub async fn cleanup_duplicate_history(&self) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM task_history
             WHERE id IN (
                 SELECT id FROM (
                     SELECT id,
                            ROW_NUMBER() OVER (
                                PARTITION BY task_id, status, start_date
                                ORDER BY created_at ASC, id ASC
                            ) AS row_num
                     FROM task_history
                 )
                 WHERE row_num > 1
             )",
        )
        .execute(self.db.pool())
        .await
        .map_err(|e| CadenceError::Database(format!("failed to clean duplicates: {}", e)))?;

        Ok(result.rows_affected())
    }
}
