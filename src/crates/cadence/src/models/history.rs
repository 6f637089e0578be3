//! Status history rows and intervals.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Stored history row: one interval during which a task held one status.
#[derive(Debug, Clone, FromRow)]
pub struct StatusHistoryEntry {
    /// Row id (UUID string).
    pub id: String,
    pub task_id: i64,
    pub tracker_id: String,
    pub status: String,
    pub status_display: String,
    pub start_date: DateTime<Utc>,
    /// `None` marks the current (open) interval.
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A status interval without storage bookkeeping.
///
/// The history reconstructor produces these and the metrics engine
/// consumes them; the persistence layer maps them to and from
/// `StatusHistoryEntry` rows.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct StatusInterval {
    pub status: String,
    pub status_display: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

impl StatusInterval {
    pub fn new(
        status: impl Into<String>,
        status_display: impl Into<String>,
        start_date: DateTime<Utc>,
        end_date: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            status: status.into(),
            status_display: status_display.into(),
            start_date,
            end_date,
        }
    }

    /// Interval duration against an optional cutoff for the open tail.
    ///
    /// Returns `None` for an open interval when no cutoff is supplied.
    pub fn duration_until(&self, cutoff: Option<DateTime<Utc>>) -> Option<chrono::Duration> {
        let end = self.end_date.or(cutoff)?;
        Some(end - self.start_date)
    }
}

impl From<&StatusHistoryEntry> for StatusInterval {
    fn from(row: &StatusHistoryEntry) -> Self {
        Self {
            status: row.status.clone(),
            status_display: row.status_display.clone(),
            start_date: row.start_date,
            end_date: row.end_date,
        }
    }
}
