//! Task row and remote task record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One link between two tasks, as stored in the `links` JSON column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskLink {
    /// Link type identifier, e.g. "subtask" or "relates".
    pub type_id: String,

    /// Link direction as reported by the tracker: "inward" or "outward".
    pub direction: String,

    /// Key of the task on the other end, e.g. "DOWN-17".
    pub target_key: String,
}

/// Task data extracted from a remote tracker response.
///
/// This is the shape the sync pipeline writes; `TaskRow` is what queries
/// read back (with the local id and sync bookkeeping).
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRecord {
    /// Opaque remote identifier.
    pub tracker_id: String,

    /// Human key, `QUEUE-N`.
    pub key: String,

    pub summary: Option<String>,
    pub description: Option<String>,

    /// Current status system name.
    pub status: Option<String>,

    /// Current status localized name.
    pub status_display: Option<String>,

    pub author: Option<String>,
    pub assignee: Option<String>,
    pub business_client: Option<String>,
    pub team: Option<String>,
    pub product_team: Option<String>,
    pub profit_forecast: Option<String>,

    /// Links to other tasks, preserved for the hierarchy walk.
    pub links: Vec<TaskLink>,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TaskRecord {
    /// Serialize links for the JSON column.
    pub fn links_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.links)
    }
}

/// Task row as stored.
#[derive(Debug, Clone, FromRow)]
pub struct TaskRow {
    pub id: i64,
    pub tracker_id: String,
    pub key: String,
    pub summary: Option<String>,
    pub author: Option<String>,
    pub team: Option<String>,
    pub created_at: DateTime<Utc>,
}
