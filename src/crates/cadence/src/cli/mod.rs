//! CLI command handlers
//!
//! Thin glue between the parsed command line and the engine: load
//! configuration, open the database, run the requested operation. Exit
//! codes are derived from `CadenceError::exit_code` in the binary.

use crate::config::loader::{load_config, require_tracker_credentials};
use crate::db::Database;
use crate::error::{CadenceError, Result};
use crate::models::GroupBy;
use crate::reports::csv::timestamped_path;
use crate::reports::{StatusTimeReport, SubepicReturnsReport, TtmDetailsReport};
use crate::shutdown::ShutdownCoordinator;
use crate::sync::{SyncOptions, SyncOrchestrator};
use crate::tracker::TrackerClient;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::path::PathBuf;
use std::sync::Arc;

/// Parse a `YYYY-MM-DD` CLI date as UTC midnight.
pub fn parse_cli_date(raw: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| CadenceError::Config(format!("invalid date '{}': {}", raw, e)))?;
    Ok(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap()))
}

/// Parse the `--group-by` value.
pub fn parse_group_by(raw: &str) -> Result<GroupBy> {
    match raw {
        "author" => Ok(GroupBy::Author),
        "team" => Ok(GroupBy::Team),
        other => Err(CadenceError::Config(format!(
            "invalid group-by '{}', expected author or team",
            other
        ))),
    }
}

async fn open_database(config: &crate::config::CadenceConfig) -> Result<Arc<Database>> {
    let pool_size = config.tracker.max_workers as u32 + 2;
    Ok(Arc::new(
        Database::initialize(&config.database.path, pool_size).await?,
    ))
}

/// `cadence sync`
pub async fn run_sync(options: SyncOptions) -> Result<()> {
    let config = load_config()?;
    require_tracker_credentials(&config)?;

    let db = open_database(&config).await?;
    let client = TrackerClient::new(&config.tracker)?;
    let shutdown = ShutdownCoordinator::new();
    shutdown.install_signal_handlers();

    let orchestrator = SyncOrchestrator::new(config, db, client, shutdown);
    orchestrator.run(options).await?;
    Ok(())
}

/// `cadence ttm-details`
pub async fn run_ttm_details(
    output: Option<PathBuf>,
    aggregate_output: Option<PathBuf>,
    as_of: Option<String>,
    group_by: String,
) -> Result<()> {
    let config = load_config()?;
    let db = open_database(&config).await?;

    let as_of = as_of.as_deref().map(parse_cli_date).transpose()?;
    let group_by = parse_group_by(&group_by)?;
    let output =
        output.unwrap_or_else(|| timestamped_path(&config.metrics.reports_dir, "ttm_details"));

    let report = TtmDetailsReport::new(db, config);
    let rows = report
        .generate(group_by, as_of, &output, aggregate_output.as_deref())
        .await?;
    println!("ttm details report generated: {} ({} rows)", output.display(), rows);
    Ok(())
}

/// `cadence fullstack-subepic-returns`
pub async fn run_subepic_returns(
    output: Option<PathBuf>,
    start_date: Option<String>,
) -> Result<()> {
    let config = load_config()?;
    let db = open_database(&config).await?;

    let start_date = start_date.as_deref().map(parse_cli_date).transpose()?;
    let output = output.unwrap_or_else(|| {
        timestamped_path(&config.metrics.reports_dir, "fullstack_subepic_returns")
    });

    let report = SubepicReturnsReport::new(db, config);
    let rows = report.generate(start_date, &output).await?;
    println!(
        "sub-epic returns report generated: {} ({} rows)",
        output.display(),
        rows
    );
    Ok(())
}

/// `cadence status-time`
pub async fn run_status_time(
    queue: String,
    created_since: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let config = load_config()?;
    let db = open_database(&config).await?;

    let created_since = created_since.as_deref().map(parse_cli_date).transpose()?;
    let output =
        output.unwrap_or_else(|| timestamped_path(&config.metrics.reports_dir, "status_time"));

    let report = StatusTimeReport::new(db, config);
    let rows = report.generate(&queue, created_since, &output).await?;
    println!(
        "status-time report generated: {} ({} rows)",
        output.display(),
        rows
    );
    Ok(())
}
