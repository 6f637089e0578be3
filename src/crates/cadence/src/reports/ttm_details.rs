//! Per-task delivery metrics report.
//!
//! One CSV row per upstream task that reached a done status inside the
//! configured quarter span. Loading follows the batching discipline: one
//! scope query, one batched history load, one hierarchy walk and one
//! downstream history load for the return counts.

use crate::config::mappings::{load_quarters, load_status_mapping};
use crate::config::CadenceConfig;
use crate::db::Database;
use crate::error::Result;
use crate::metrics::{MetricsEngine, SeriesSummary, TaskMetrics};
use crate::models::{GroupBy, MetricKind, TaskRow};
use crate::repositories::{HierarchyRepository, HistoryRepository, TaskRepository};
use crate::reports::csv::{opt_days, opt_mean, CsvWriter};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

const DETAIL_COLUMNS: [&str; 17] = [
    "key",
    "summary",
    "author",
    "team",
    "group_key",
    "quarter_ttd",
    "quarter_ttm",
    "ttd",
    "ttm",
    "devlt",
    "tail",
    "pause",
    "ttd_pause",
    "discovery_backlog_days",
    "ready_for_dev_days",
    "testing_returns",
    "external_test_returns",
];

/// Generator for the per-task details CSV and the optional
/// quarter-aggregated view.
pub struct TtmDetailsReport {
    config: CadenceConfig,
    tasks: TaskRepository,
    history: HistoryRepository,
    hierarchy: HierarchyRepository,
}

struct TaskLine {
    task: TaskRow,
    group_key: String,
    metrics: TaskMetrics,
    testing_returns: i64,
    external_test_returns: i64,
}

impl TtmDetailsReport {
    pub fn new(db: Arc<Database>, config: CadenceConfig) -> Self {
        Self {
            config,
            tasks: TaskRepository::new(db.clone()),
            history: HistoryRepository::new(db.clone()),
            hierarchy: HierarchyRepository::new(db),
        }
    }

    /// Generate the report. Returns the number of task rows written.
    pub async fn generate(
        &self,
        group_by: GroupBy,
        as_of: Option<DateTime<Utc>>,
        output: &Path,
        aggregate_output: Option<&Path>,
    ) -> Result<usize> {
        let quarters = load_quarters(&self.config.metrics.quarters_file)?;
        let mapping = load_status_mapping(&self.config.metrics.status_mapping_file)?;

        let window_start = quarters.iter().map(|q| q.start_date).min().unwrap();
        let window_end = quarters.iter().map(|q| q.end_date).max().unwrap();

        let tasks = self
            .tasks
            .tasks_for_period(
                &self.config.hierarchy.upstream_prefix(),
                window_start,
                window_end,
                group_by,
                &mapping,
                MetricKind::Ttm,
            )
            .await?;
        info!(count = tasks.len(), "tasks in reporting scope");

        let keys: Vec<String> = tasks.iter().map(|t| t.key.clone()).collect();
        let histories = self.history.histories_for_keys(&keys).await?;

        let engine = MetricsEngine::new(
            mapping,
            self.config.metrics.min_status_duration(),
            as_of,
        );

        let returns = self.compute_returns(&engine, &keys).await?;

        let mut lines = Vec::new();
        for task in tasks {
            let empty = Vec::new();
            let history = histories.get(&task.key).unwrap_or(&empty);
            let metrics = engine.compute(task.created_at, history, &quarters);

            // Tasks whose done anchor falls outside every quarter (or
            // after the as-of date) are out of scope.
            if metrics.quarter_ttm.is_none() {
                continue;
            }

            let group_key = match group_by {
                GroupBy::Author => task.author.clone(),
                GroupBy::Team => task.team.clone(),
            }
            .unwrap_or_default();

            let (testing_returns, external_test_returns) =
                returns.get(&task.key).copied().unwrap_or((0, 0));

            lines.push(TaskLine {
                task,
                group_key,
                metrics,
                testing_returns,
                external_test_returns,
            });
        }

        self.write_details(output, &lines)?;
        if let Some(path) = aggregate_output {
            self.write_aggregate(path, &lines)?;
        }

        info!(rows = lines.len(), output = %output.display(), "details report written");
        Ok(lines.len())
    }

    /// Downstream return counts per upstream key.
    ///
    /// Three round trips for the whole batch: roots, transitive
    /// closures, downstream histories.
    async fn compute_returns(
        &self,
        engine: &MetricsEngine,
        upstream_keys: &[String],
    ) -> Result<HashMap<String, (i64, i64)>> {
        let hierarchy = &self.config.hierarchy;

        let roots_by_task = self
            .hierarchy
            .downstream_roots_for(
                upstream_keys,
                &hierarchy.relates_link_type,
                &hierarchy.downstream_prefix(),
            )
            .await?;

        let all_roots: Vec<String> = roots_by_task
            .values()
            .flatten()
            .cloned()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let closures = self
            .hierarchy
            .downstream_closures(
                &all_roots,
                &hierarchy.subtask_link_type,
                &hierarchy.downstream_prefix(),
                hierarchy.max_depth,
            )
            .await?;

        let all_downstream: Vec<String> = closures
            .values()
            .flatten()
            .cloned()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let downstream_histories = self.history.histories_for_keys(&all_downstream).await?;

        let mut result = HashMap::new();
        let empty_roots = Vec::new();
        for key in upstream_keys {
            let roots = roots_by_task.get(key).unwrap_or(&empty_roots);
            let mut testing = 0i64;
            let mut external = 0i64;
            let mut seen = HashSet::new();

            for root in roots {
                let Some(members) = closures.get(root) else {
                    continue;
                };
                for member in members {
                    if !seen.insert(member.clone()) {
                        continue;
                    }
                    let Some(history) = downstream_histories.get(member) else {
                        continue;
                    };
                    testing +=
                        engine.count_entries_into(history, &hierarchy.testing_status);
                    external += engine.count_external_test_entries(history);
                }
            }
            result.insert(key.clone(), (testing, external));
        }
        Ok(result)
    }

    fn write_details(&self, path: &Path, lines: &[TaskLine]) -> Result<()> {
        let mut writer = CsvWriter::create(path)?;
        writer.write_row(&DETAIL_COLUMNS)?;

        for line in lines {
            let m = &line.metrics;
            writer.write_row(&[
                line.task.key.clone(),
                line.task.summary.clone().unwrap_or_default(),
                line.task.author.clone().unwrap_or_default(),
                line.task.team.clone().unwrap_or_default(),
                line.group_key.clone(),
                m.quarter_ttd.clone().unwrap_or_default(),
                m.quarter_ttm.clone().unwrap_or_default(),
                opt_days(m.ttd),
                opt_days(m.ttm),
                opt_days(m.devlt),
                opt_days(m.tail),
                opt_days(m.pause),
                opt_days(m.ttd_pause),
                opt_days(m.discovery_backlog_days),
                opt_days(m.ready_for_dev_days),
                line.testing_returns.to_string(),
                line.external_test_returns.to_string(),
            ])?;
        }

        writer.finish()
    }

    /// Quarter × group aggregate: one row per metric per cell.
    fn write_aggregate(&self, path: &Path, lines: &[TaskLine]) -> Result<()> {
        #[derive(Default)]
        struct Cell {
            ttd: Vec<i64>,
            ttd_pause: Vec<i64>,
            ttm: Vec<i64>,
            ttm_pause: Vec<i64>,
            devlt: Vec<i64>,
            tail: Vec<i64>,
        }

        let mut cells: BTreeMap<(String, String), Cell> = BTreeMap::new();
        for line in lines {
            let m = &line.metrics;
            let Some(quarter) = m.quarter_ttm.clone() else {
                continue;
            };
            let cell = cells
                .entry((quarter, line.group_key.clone()))
                .or_default();

            // Pause series are the exact deductions applied to the
            // matching metric, so the aggregate never reports a pause
            // that was not subtracted.
            if let Some(ttm) = m.ttm {
                cell.ttm.push(ttm);
                cell.ttm_pause.push(m.pause.unwrap_or(0));
            }
            if let Some(ttd) = m.ttd {
                cell.ttd.push(ttd);
                cell.ttd_pause.push(m.ttd_pause.unwrap_or(0));
            }
            if let Some(devlt) = m.devlt {
                cell.devlt.push(devlt);
            }
            if let Some(tail) = m.tail {
                cell.tail.push(tail);
            }
        }

        let mut writer = CsvWriter::create(path)?;
        writer.write_row(&[
            "quarter",
            "group_key",
            "metric",
            "count",
            "mean",
            "p85",
            "pause_mean",
            "pause_p85",
        ])?;

        for ((quarter, group), cell) in &cells {
            let rows: [(&str, SeriesSummary); 4] = [
                ("ttd", SeriesSummary::with_pauses(&cell.ttd, &cell.ttd_pause)),
                ("ttm", SeriesSummary::with_pauses(&cell.ttm, &cell.ttm_pause)),
                ("devlt", SeriesSummary::of(&cell.devlt)),
                ("tail", SeriesSummary::of(&cell.tail)),
            ];
            for (metric, summary) in rows {
                writer.write_row(&[
                    quarter.clone(),
                    group.clone(),
                    metric.to_string(),
                    summary.count.to_string(),
                    opt_mean(summary.mean),
                    opt_days(summary.p85),
                    opt_mean(summary.pause_mean),
                    opt_days(summary.pause_p85),
                ])?;
            }
        }

        writer.finish()
    }
}

impl std::fmt::Debug for TtmDetailsReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtmDetailsReport").finish()
    }
}
