//! Task repository for database operations.

use crate::db::Database;
use crate::error::{CadenceError, Result};
use crate::models::{GroupBy, MetricKind, StatusInterval, StatusMapping, TaskRecord, TaskRow};
use chrono::{DateTime, Utc};
use sqlx::Row;
use std::sync::Arc;
use uuid::Uuid;

/// Result of writing one task during sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSyncOutcome {
    /// Local row id.
    pub task_id: i64,
    /// Whether the row was newly created.
    pub created: bool,
    /// History rows written (0 when history was skipped).
    pub history_entries: u64,
}

/// Repository for task rows and the per-task sync write path.
#[derive(Clone, Debug)]
pub struct TaskRepository {
    db: Arc<Database>,
}

impl TaskRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Write one synced task in a single transaction.
    ///
    /// Upserts the task row by its natural key, optionally replaces the
    /// full status history, and stamps `last_sync_at`. Nothing of the
    /// task survives a failure inside the transaction.
    pub async fn sync_task(
        &self,
        record: &TaskRecord,
        history: Option<&[StatusInterval]>,
    ) -> Result<TaskSyncOutcome> {
        let links_json = record
            .links_json()
            .map_err(|e| CadenceError::Database(format!("failed to encode links: {}", e)))?;
        let now = Utc::now();

        let mut tx = self
            .db
            .pool()
            .begin()
            .await
            .map_err(|e| CadenceError::Database(format!("failed to begin transaction: {}", e)))?;

        let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM tasks WHERE tracker_id = ?")
            .bind(&record.tracker_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| CadenceError::Database(format!("failed to look up task: {}", e)))?;

        let (task_id, created) = match existing {
            Some((id,)) => {
                sqlx::query(
                    "UPDATE tasks
                     SET key = ?, summary = ?, description = ?, status = ?, status_display = ?,
                         author = ?, assignee = ?, business_client = ?, team = ?,
                         product_team = ?, profit_forecast = ?, links = ?,
                         created_at = ?, updated_at = ?, last_sync_at = ?
                     WHERE id = ?",
                )
                .bind(&record.key)
                .bind(&record.summary)
                .bind(&record.description)
                .bind(&record.status)
                .bind(&record.status_display)
                .bind(&record.author)
                .bind(&record.assignee)
                .bind(&record.business_client)
                .bind(&record.team)
                .bind(&record.product_team)
                .bind(&record.profit_forecast)
                .bind(&links_json)
                .bind(record.created_at)
                .bind(record.updated_at)
                .bind(now)
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|e| CadenceError::Database(format!("failed to update task: {}", e)))?;
                (id, false)
            }
            None => {
                let result = sqlx::query(
                    "INSERT INTO tasks (tracker_id, key, summary, description, status,
                                        status_display, author, assignee, business_client,
                                        team, product_team, profit_forecast, links,
                                        created_at, updated_at, last_sync_at)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(&record.tracker_id)
                .bind(&record.key)
                .bind(&record.summary)
                .bind(&record.description)
                .bind(&record.status)
                .bind(&record.status_display)
                .bind(&record.author)
                .bind(&record.assignee)
                .bind(&record.business_client)
                .bind(&record.team)
                .bind(&record.product_team)
                .bind(&record.profit_forecast)
                .bind(&links_json)
                .bind(record.created_at)
                .bind(record.updated_at)
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(|e| CadenceError::Database(format!("failed to insert task: {}", e)))?;
                (result.last_insert_rowid(), true)
            }
        };

        let mut history_entries = 0u64;
        if let Some(intervals) = history {
            // Changelog replay is authoritative: drop and re-materialize.
            sqlx::query("DELETE FROM task_history WHERE task_id = ?")
                .bind(task_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    CadenceError::Database(format!("failed to clear history: {}", e))
                })?;

            for interval in intervals {
                sqlx::query(
                    "INSERT INTO task_history (id, task_id, tracker_id, status, status_display,
                                               start_date, end_date, created_at)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(Uuid::new_v4().to_string())
                .bind(task_id)
                .bind(&record.tracker_id)
                .bind(&interval.status)
                .bind(&interval.status_display)
                .bind(interval.start_date)
                .bind(interval.end_date)
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    CadenceError::Database(format!("failed to insert history row: {}", e))
                })?;
                history_entries += 1;
            }
        }

        tx.commit()
            .await
            .map_err(|e| CadenceError::Database(format!("failed to commit task: {}", e)))?;

        Ok(TaskSyncOutcome {
            task_id,
            created,
            history_entries,
        })
    }

    /// Load a task row by its human key.
    pub async fn find_by_key(&self, key: &str) -> Result<Option<TaskRow>> {
        let row = sqlx::query_as::<_, TaskRow>(
            "SELECT id, tracker_id, key, summary, author, team, created_at
             FROM tasks WHERE key = ?",
        )
        .bind(key)
        .fetch_optional(self.db.pool())
        .await
        .map_err(|e| CadenceError::Database(format!("failed to load task: {}", e)))?;

        Ok(row)
    }

    /// Last recorded sync time for a task, for staleness checks.
    pub async fn last_sync_at(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        let row = sqlx::query("SELECT last_sync_at FROM tasks WHERE key = ?")
            .bind(key)
            .fetch_optional(self.db.pool())
            .await
            .map_err(|e| CadenceError::Database(format!("failed to read last_sync_at: {}", e)))?;

        Ok(row.and_then(|r| r.get("last_sync_at")))
    }

    /// Tasks whose anchor-status transition falls inside the window.
    ///
    /// One JOIN query for the whole reporting scope; the status list is
    /// bound as a JSON array to keep the statement static.
    pub async fn tasks_for_period(
        &self,
        queue_prefix: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        group_by: GroupBy,
        mapping: &StatusMapping,
        metric: MetricKind,
    ) -> Result<Vec<TaskRow>> {
        let targets = metric.target_statuses(mapping);
        if targets.is_empty() {
            return Ok(Vec::new());
        }
        let targets_json = serde_json::to_string(&targets)
            .map_err(|e| CadenceError::Database(format!("failed to encode statuses: {}", e)))?;

        let sql = format!(
            "SELECT DISTINCT t.id, t.tracker_id, t.key, t.summary, t.author, t.team, t.created_at
             FROM tasks t
             JOIN task_history h ON h.task_id = t.id
             WHERE t.key LIKE ? || '%'
               AND t.{group} IS NOT NULL
               AND h.status IN (SELECT value FROM json_each(?))
               AND h.start_date >= ? AND h.start_date <= ?
             ORDER BY t.key",
            group = group_by.column()
        );

        let rows = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(queue_prefix)
            .bind(&targets_json)
            .bind(start)
            .bind(end)
            .fetch_all(self.db.pool())
            .await
            .map_err(|e| CadenceError::Database(format!("failed to load period tasks: {}", e)))?;

        Ok(rows)
    }

    /// All tasks in a queue, optionally created since a date.
    pub async fn tasks_in_queue(
        &self,
        queue_prefix: &str,
        created_since: Option<DateTime<Utc>>,
    ) -> Result<Vec<TaskRow>> {
        let rows = sqlx::query_as::<_, TaskRow>(
            "SELECT id, tracker_id, key, summary, author, team, created_at
             FROM tasks
             WHERE key LIKE ? || '%' AND (? IS NULL OR created_at >= ?)
             ORDER BY key",
        )
        .bind(queue_prefix)
        .bind(created_since)
        .bind(created_since)
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| CadenceError::Database(format!("failed to list queue tasks: {}", e)))?;

        Ok(rows)
    }
}
