//! Per-root downstream return counts.
//!
//! One row per downstream root (sub-epic): how many times work bounced
//! back into testing or external test anywhere in the hierarchy below
//! it.

use crate::config::mappings::load_status_mapping;
use crate::config::CadenceConfig;
use crate::db::Database;
use crate::error::Result;
use crate::metrics::MetricsEngine;
use crate::repositories::{HierarchyRepository, HistoryRepository, TaskRepository};
use crate::reports::csv::CsvWriter;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Generator for the sub-epic returns CSV.
pub struct SubepicReturnsReport {
    config: CadenceConfig,
    tasks: TaskRepository,
    history: HistoryRepository,
    hierarchy: HierarchyRepository,
}

impl SubepicReturnsReport {
    pub fn new(db: Arc<Database>, config: CadenceConfig) -> Self {
        Self {
            config,
            tasks: TaskRepository::new(db.clone()),
            history: HistoryRepository::new(db.clone()),
            hierarchy: HierarchyRepository::new(db),
        }
    }

    /// Generate the report. Returns the number of root rows written.
    pub async fn generate(
        &self,
        start_date: Option<DateTime<Utc>>,
        output: &Path,
    ) -> Result<usize> {
        let mapping = load_status_mapping(&self.config.metrics.status_mapping_file)?;
        let hierarchy = &self.config.hierarchy;

        let roots = self
            .tasks
            .tasks_in_queue(&hierarchy.downstream_prefix(), start_date)
            .await?;
        info!(count = roots.len(), "downstream roots in scope");

        let root_keys: Vec<String> = roots.iter().map(|t| t.key.clone()).collect();
        let closures = self
            .hierarchy
            .downstream_closures(
                &root_keys,
                &hierarchy.subtask_link_type,
                &hierarchy.downstream_prefix(),
                hierarchy.max_depth,
            )
            .await?;

        let all_members: Vec<String> = closures
            .values()
            .flatten()
            .cloned()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let histories = self.history.histories_for_keys(&all_members).await?;

        let engine = MetricsEngine::new(
            mapping,
            self.config.metrics.min_status_duration(),
            None,
        );

        let mut writer = CsvWriter::create(output)?;
        writer.write_row(&[
            "key",
            "summary",
            "author",
            "team",
            "testing_returns",
            "external_test_returns",
            "total_returns",
        ])?;

        let mut rows = 0usize;
        for root in &roots {
            let mut testing = 0i64;
            let mut external = 0i64;

            if let Some(members) = closures.get(&root.key) {
                for member in members {
                    let Some(history) = histories.get(member) else {
                        continue;
                    };
                    testing += engine.count_entries_into(history, &hierarchy.testing_status);
                    external += engine.count_external_test_entries(history);
                }
            }

            writer.write_row(&[
                root.key.clone(),
                root.summary.clone().unwrap_or_default(),
                root.author.clone().unwrap_or_default(),
                root.team.clone().unwrap_or_default(),
                testing.to_string(),
                external.to_string(),
                (testing + external).to_string(),
            ])?;
            rows += 1;
        }

        writer.finish()?;
        info!(rows, output = %output.display(), "sub-epic returns report written");
        Ok(rows)
    }
}
