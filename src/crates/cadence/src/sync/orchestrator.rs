//! Sync orchestration.
//!
//! Run shape: acquire the single-instance lock, open a sync run row, let
//! one producer drive the scroll search into a bounded channel, fan out
//! to the worker pool, and finalize the run row with the aggregated
//! counters. Per-task failures are counted and skipped; only lock,
//! configuration and producer-level failures abort the run.

use crate::config::CadenceConfig;
use crate::db::Database;
use crate::error::{CadenceError, Result};
use crate::models::SyncCounters;
use crate::repositories::{HistoryRepository, SyncRunRepository, TaskRepository};
use crate::shutdown::ShutdownCoordinator;
use crate::sync::history_builder::build_history;
use crate::sync::lock::SingleInstance;
use crate::tracker::types::TaskId;
use crate::tracker::TrackerClient;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Age after which a `running` log row is considered orphaned.
const ORPHAN_RUN_MAX_AGE_HOURS: i64 = 24;

/// Inputs for one sync invocation.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Tracker query filter, passed through verbatim. Incremental sync is
    /// a filter convention (`Updated: >...`), not a separate code path.
    pub filter: String,

    /// Maximum number of tasks to process.
    pub limit: Option<usize>,

    /// Skip changelog fetch and history replacement.
    pub skip_history: bool,

    /// Kept for explicit intent; replacement is always full-per-task.
    pub force_full_history: bool,
}

/// Result of a finished run.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub run_id: String,
    pub counters: SyncCounters,
}

/// Drives one sync run end to end.
pub struct SyncOrchestrator {
    config: CadenceConfig,
    client: TrackerClient,
    tasks: TaskRepository,
    history: HistoryRepository,
    runs: SyncRunRepository,
    shutdown: ShutdownCoordinator,
}

struct WorkerContext {
    client: TrackerClient,
    tasks: TaskRepository,
    shutdown: ShutdownCoordinator,
    counters: Arc<Mutex<SyncCounters>>,
    skip_history: bool,
}

impl SyncOrchestrator {
    pub fn new(
        config: CadenceConfig,
        db: Arc<Database>,
        client: TrackerClient,
        shutdown: ShutdownCoordinator,
    ) -> Self {
        Self {
            config,
            client,
            tasks: TaskRepository::new(db.clone()),
            history: HistoryRepository::new(db.clone()),
            runs: SyncRunRepository::new(db),
            shutdown,
        }
    }

    /// Run the sync to completion.
    ///
    /// Returns `Err(CadenceError::LockContention)` without creating a log
    /// row when another instance is active, and `Err(Cancelled)` after
    /// finalizing the row when a signal or the run timeout interrupted
    /// the run.
    pub async fn run(&self, options: SyncOptions) -> Result<SyncOutcome> {
        let _lock = SingleInstance::acquire(&self.config.tracker.lock_path)?;

        if let Some(secs) = self.config.tracker.run_timeout_secs {
            self.shutdown.install_timeout(Duration::from_secs(secs));
        }

        self.runs
            .fail_orphaned_runs(chrono::Duration::hours(ORPHAN_RUN_MAX_AGE_HOURS))
            .await?;
        let run_id = self.runs.start_run().await?;
        info!(run_id = %run_id, filter = %options.filter, limit = ?options.limit, "sync run started");
        if options.force_full_history {
            info!("full history replay requested (this is also the default behavior)");
        }

        let counters = Arc::new(Mutex::new(SyncCounters::default()));
        let producer_error: Arc<Mutex<Option<CadenceError>>> = Arc::new(Mutex::new(None));

        let workers = self.config.tracker.max_workers;
        let (tx, rx) = mpsc::channel::<TaskId>(workers * 2);
        let rx = Arc::new(tokio::sync::Mutex::new(rx));

        // Producer: drive the scroll lazily, stop on shutdown.
        let producer = {
            let client = self.client.clone();
            let shutdown = self.shutdown.clone();
            let filter = options.filter.clone();
            let limit = options.limit;
            let producer_error = producer_error.clone();
            tokio::spawn(async move {
                let mut scroll = client.search(filter, limit);
                loop {
                    if shutdown.is_shutdown_requested() {
                        break;
                    }
                    match scroll.next_page().await {
                        Ok(Some(page)) => {
                            for id in page {
                                if shutdown.is_shutdown_requested() {
                                    return;
                                }
                                if tx.send(id).await.is_err() {
                                    return;
                                }
                            }
                        }
                        Ok(None) => break,
                        Err(e) => {
                            *producer_error.lock().unwrap() =
                                Some(CadenceError::Tracker(e));
                            break;
                        }
                    }
                }
            })
        };

        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            let ctx = WorkerContext {
                client: self.client.clone(),
                tasks: self.tasks.clone(),
                shutdown: self.shutdown.clone(),
                counters: counters.clone(),
                skip_history: options.skip_history,
            };
            let rx = rx.clone();
            handles.push(tokio::spawn(worker_loop(ctx, rx)));
        }

        let _ = producer.await;
        for handle in handles {
            let _ = handle.await;
        }

        if !options.skip_history {
            let cleaned = self.history.cleanup_duplicate_history().await?;
            if cleaned > 0 {
                info!(count = cleaned, "removed duplicate history rows");
            }
        }

        let counters = *counters.lock().unwrap();

        if self.shutdown.is_shutdown_requested() {
            self.runs.fail_run(&run_id, &counters, "cancelled").await?;
            warn!(run_id = %run_id, "sync run cancelled");
            return Err(CadenceError::Cancelled);
        }

        if let Some(error) = producer_error.lock().unwrap().take() {
            self.runs
                .fail_run(&run_id, &counters, &error.to_string())
                .await?;
            return Err(error);
        }

        self.runs.complete_run(&run_id, &counters).await?;
        println!(
            "sync completed: {} processed, {} created, {} updated, {} history entries, {} errors",
            counters.tasks_processed,
            counters.tasks_created,
            counters.tasks_updated,
            counters.history_entries_processed,
            counters.errors_count
        );
        info!(run_id = %run_id, "sync run completed");

        Ok(SyncOutcome { run_id, counters })
    }
}

/// One worker: pull identifiers off the channel until it closes.
async fn worker_loop(ctx: WorkerContext, rx: Arc<tokio::sync::Mutex<mpsc::Receiver<TaskId>>>) {
    loop {
        if ctx.shutdown.is_shutdown_requested() {
            break;
        }
        let next = { rx.lock().await.recv().await };
        let Some(task) = next else { break };
        process_task(&ctx, &task).await;
    }
}

/// Fetch, reconstruct and write one task.
///
/// All remote reads happen before the single write transaction, so a
/// failure anywhere leaves no partial rows for the task.
async fn process_task(ctx: &WorkerContext, task: &TaskId) {
    let issue = match ctx.client.get_issue(&task.key).await {
        Ok(issue) => issue,
        Err(e) => {
            warn!(task = %task.key, error = %e, "failed to fetch task");
            ctx.counters.lock().unwrap().record_error();
            return;
        }
    };

    let record = match issue.to_record() {
        Ok(record) => record,
        Err(e) => {
            warn!(task = %task.key, error = %e, "failed to extract task data");
            ctx.counters.lock().unwrap().record_error();
            return;
        }
    };

    let history = if ctx.skip_history {
        None
    } else {
        match ctx.client.get_changelog(&task.key).await {
            Ok(changelog) => {
                let rebuilt = build_history(&record, &changelog);
                if rebuilt.skipped_events > 0 {
                    warn!(
                        task = %task.key,
                        skipped = rebuilt.skipped_events,
                        "skipped malformed changelog events"
                    );
                }
                Some(rebuilt.intervals)
            }
            Err(e) => {
                warn!(task = %task.key, error = %e, "failed to fetch changelog");
                ctx.counters.lock().unwrap().record_error();
                return;
            }
        }
    };

    match ctx.tasks.sync_task(&record, history.as_deref()).await {
        Ok(outcome) => {
            ctx.counters
                .lock()
                .unwrap()
                .record_task(outcome.created, outcome.history_entries);
            println!(
                "{} {} ({} history entries)",
                if outcome.created { "created" } else { "updated" },
                record.key,
                outcome.history_entries
            );
        }
        Err(e) => {
            warn!(task = %task.key, error = %e, "failed to persist task");
            ctx.counters.lock().unwrap().record_error();
        }
    }
}
