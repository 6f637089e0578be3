//! Configuration loading from environment variables.

use super::schema::{
    CadenceConfig, DatabaseConfig, HierarchyConfig, MetricsConfig, TrackerConfig,
};
use crate::error::{CadenceError, Result};
use std::path::PathBuf;
use tooling::config::{get_env_or, get_env_parse, get_env_parse_or};
use tracing::debug;

/// Load the full configuration from the environment.
///
/// Everything has a default except the tracker credentials, which are
/// validated separately by `require_tracker_credentials` so that the
/// report commands can run without a token.
pub fn load_config() -> Result<CadenceConfig> {
    let tracker = TrackerConfig {
        base_url: get_env_or("TRACKER_BASE_URL", "https://api.tracker.yandex.net/v3")?,
        api_token: get_env_or("TRACKER_API_TOKEN", "")?,
        org_id: get_env_or("TRACKER_ORG_ID", "")?,
        max_workers: get_env_parse_or("TRACKER_MAX_WORKERS", 10)?,
        request_delay_ms: get_env_parse_or("TRACKER_REQUEST_DELAY_MS", 100)?,
        scroll_page_size: get_env_parse_or("TRACKER_SCROLL_PAGE_SIZE", 100)?,
        scroll_ttl_ms: get_env_parse_or("TRACKER_SCROLL_TTL_MS", 300_000)?,
        http_timeout_secs: get_env_parse_or("TRACKER_HTTP_TIMEOUT_SECS", 30)?,
        run_timeout_secs: get_env_parse("CADENCE_RUN_TIMEOUT_SECS")?,
        lock_path: PathBuf::from(get_env_or(
            "CADENCE_LOCK_PATH",
            "/tmp/cadence_sync.lock",
        )?),
    };

    let database = DatabaseConfig {
        path: PathBuf::from(get_env_or("CADENCE_DATABASE_PATH", "cadence.db")?),
    };

    let metrics = MetricsConfig {
        min_status_duration_secs: get_env_parse_or("CADENCE_MIN_STATUS_DURATION_SECS", 300)?,
        reports_dir: PathBuf::from(get_env_or("CADENCE_REPORTS_DIR", "data/reports")?),
        quarters_file: PathBuf::from(get_env_or(
            "CADENCE_QUARTERS_FILE",
            "data/config/quarters.txt",
        )?),
        status_mapping_file: PathBuf::from(get_env_or(
            "CADENCE_STATUS_MAPPING_FILE",
            "data/config/status_mapping.txt",
        )?),
    };

    let hierarchy = HierarchyConfig {
        upstream_queue: get_env_or("CADENCE_UPSTREAM_QUEUE", "CPO")?,
        downstream_queue: get_env_or("CADENCE_DOWNSTREAM_QUEUE", "FULLSTACK")?,
        subtask_link_type: get_env_or("CADENCE_SUBTASK_LINK_TYPE", "subtask")?,
        relates_link_type: get_env_or("CADENCE_RELATES_LINK_TYPE", "relates")?,
        testing_status: get_env_or("CADENCE_TESTING_STATUS", "Testing")?,
        max_depth: get_env_parse_or("CADENCE_HIERARCHY_MAX_DEPTH", 10)?,
    };

    if tracker.max_workers == 0 {
        return Err(CadenceError::Config(
            "TRACKER_MAX_WORKERS must be at least 1".to_string(),
        ));
    }

    debug!(
        workers = tracker.max_workers,
        page_size = tracker.scroll_page_size,
        "configuration loaded"
    );

    Ok(CadenceConfig {
        tracker,
        database,
        metrics,
        hierarchy,
    })
}

/// Fail fast when the sync credentials are missing.
///
/// Called before any work, so no sync run row exists for a
/// misconfigured invocation.
pub fn require_tracker_credentials(config: &CadenceConfig) -> Result<()> {
    if config.tracker.api_token.is_empty() {
        return Err(CadenceError::Config(
            "TRACKER_API_TOKEN environment variable is required".to_string(),
        ));
    }
    if config.tracker.org_id.is_empty() {
        return Err(CadenceError::Config(
            "TRACKER_ORG_ID environment variable is required".to_string(),
        ));
    }
    Ok(())
}
