//! Configuration schema.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main cadence configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CadenceConfig {
    #[serde(default)]
    pub tracker: TrackerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,

    #[serde(default)]
    pub hierarchy: HierarchyConfig,
}

/// Remote tracker API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// API base URL, e.g. `https://api.tracker.yandex.net/v3`.
    pub base_url: String,

    /// OAuth token. Required for sync; reports never touch the network.
    pub api_token: String,

    /// Organization id sent in the `X-Org-ID` header.
    pub org_id: String,

    /// Worker pool size for the sync fan-out.
    pub max_workers: usize,

    /// Minimum delay between outbound requests in milliseconds.
    pub request_delay_ms: u64,

    /// Page size for scroll search. The server is known to 504 on large
    /// pages, keep this conservative.
    pub scroll_page_size: usize,

    /// Scroll cursor TTL in milliseconds.
    pub scroll_ttl_ms: u64,

    /// Per-request HTTP timeout in seconds (connect + read).
    pub http_timeout_secs: u64,

    /// Optional global run timeout in seconds; expiry behaves like an
    /// external cancellation signal.
    pub run_timeout_secs: Option<u64>,

    /// Single-instance lock file path.
    pub lock_path: PathBuf,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.tracker.yandex.net/v3".to_string(),
            api_token: String::new(),
            org_id: String::new(),
            max_workers: 10,
            request_delay_ms: 100,
            scroll_page_size: 100,
            scroll_ttl_ms: 300_000,
            http_timeout_secs: 30,
            run_timeout_secs: None,
            lock_path: PathBuf::from("/tmp/cadence_sync.lock"),
        }
    }
}

impl TrackerConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file path.
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("cadence.db"),
        }
    }
}

/// Metrics and reporting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Intervals shorter than this are treated as bounce noise at metric
    /// time. Storage always keeps the full history.
    pub min_status_duration_secs: u64,

    /// Directory for generated CSV reports.
    pub reports_dir: PathBuf,

    /// Quarters file (`name;YYYY-MM-DD;YYYY-MM-DD` per line).
    pub quarters_file: PathBuf,

    /// Status mapping file (`status;block` per line).
    pub status_mapping_file: PathBuf,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            min_status_duration_secs: 300,
            reports_dir: PathBuf::from("data/reports"),
            quarters_file: PathBuf::from("data/config/quarters.txt"),
            status_mapping_file: PathBuf::from("data/config/status_mapping.txt"),
        }
    }
}

impl MetricsConfig {
    pub fn min_status_duration(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.min_status_duration_secs as i64)
    }
}

/// Cross-queue hierarchy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchyConfig {
    /// Upstream queue prefix, e.g. "CPO".
    pub upstream_queue: String,

    /// Downstream queue prefix, e.g. "FULLSTACK".
    pub downstream_queue: String,

    /// Link type id that denotes a subtask edge.
    pub subtask_link_type: String,

    /// Link type id that connects an upstream task to downstream roots.
    pub relates_link_type: String,

    /// Status counted as a testing return in the downstream queue.
    pub testing_status: String,

    /// Depth bound for the recursive walk.
    pub max_depth: u32,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            upstream_queue: "CPO".to_string(),
            downstream_queue: "FULLSTACK".to_string(),
            subtask_link_type: "subtask".to_string(),
            relates_link_type: "relates".to_string(),
            testing_status: "Testing".to_string(),
            max_depth: 10,
        }
    }
}

impl HierarchyConfig {
    /// `LIKE` pattern for downstream keys.
    pub fn downstream_prefix(&self) -> String {
        format!("{}-", self.downstream_queue)
    }

    /// `LIKE` pattern for upstream keys.
    pub fn upstream_prefix(&self) -> String {
        format!("{}-", self.upstream_queue)
    }
}
