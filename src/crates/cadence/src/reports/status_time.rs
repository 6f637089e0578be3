//! Time-in-status matrix report.
//!
//! One row per task in the queue, one column per status observed across
//! the scope, each cell the whole days the task spent there. Blank means
//! the task never held the status.

use crate::config::CadenceConfig;
use crate::db::Database;
use crate::error::Result;
use crate::models::StatusInterval;
use crate::repositories::{HistoryRepository, TaskRepository};
use crate::reports::csv::CsvWriter;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Generator for the status-time CSV.
pub struct StatusTimeReport {
    tasks: TaskRepository,
    history: HistoryRepository,
}

impl StatusTimeReport {
    pub fn new(db: Arc<Database>, _config: CadenceConfig) -> Self {
        Self {
            tasks: TaskRepository::new(db.clone()),
            history: HistoryRepository::new(db),
        }
    }

    /// Generate the report. Returns the number of task rows written.
    pub async fn generate(
        &self,
        queue: &str,
        created_since: Option<DateTime<Utc>>,
        output: &Path,
    ) -> Result<usize> {
        let prefix = format!("{}-", queue.trim_end_matches('-'));
        let tasks = self.tasks.tasks_in_queue(&prefix, created_since).await?;

        if tasks.is_empty() {
            warn!(queue, "no tasks found for status-time report");
            let mut writer = CsvWriter::create(output)?;
            writer.write_row(&["key"])?;
            writer.finish()?;
            return Ok(0);
        }

        let keys: Vec<String> = tasks.iter().map(|t| t.key.clone()).collect();
        let histories = self.history.histories_for_keys(&keys).await?;

        let mut statuses: BTreeSet<String> = BTreeSet::new();
        for history in histories.values() {
            for interval in history {
                statuses.insert(interval.status.clone());
            }
        }

        let mut writer = CsvWriter::create(output)?;
        let mut header = vec!["key".to_string()];
        header.extend(statuses.iter().cloned());
        writer.write_row(&header)?;

        let empty = Vec::new();
        for task in &tasks {
            let history = histories.get(&task.key).unwrap_or(&empty);
            let times = status_times(history);

            let mut row = vec![task.key.clone()];
            for status in &statuses {
                row.push(
                    times
                        .get(status)
                        .map(|days| days.to_string())
                        .unwrap_or_default(),
                );
            }
            writer.write_row(&row)?;
        }

        writer.finish()?;
        info!(rows = tasks.len(), output = %output.display(), "status-time report written");
        Ok(tasks.len())
    }
}

/// Whole days per status, closed intervals only.
fn status_times(history: &[StatusInterval]) -> BTreeMap<String, i64> {
    let mut times = BTreeMap::new();
    for interval in history {
        let Some(end) = interval.end_date else {
            continue;
        };
        let days = (end - interval.start_date).num_days().max(0);
        *times.entry(interval.status.clone()).or_insert(0) += days;
    }
    times
}
