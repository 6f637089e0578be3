//! History reconstruction from changelog events.
//!
//! Deterministic, pure transformation: the same changelog always yields
//! the same interval sequence. Events are visited in server order; each
//! status diff closes the open interval and opens the next one. The
//! initial interval starts at the task's creation date with the first
//! event's `from` status (or the task's current status when the changelog
//! carries no status events at all). Zero-duration intervals are kept —
//! storage stays faithful and the metric-side bounce filter decides what
//! counts.

use crate::models::{StatusInterval, TaskRecord};
use crate::tracker::types::{parse_tracker_date, ChangelogEntry};
use chrono::{DateTime, Utc};
use tracing::warn;

/// Result of replaying a changelog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconstructedHistory {
    /// Start-sorted, non-overlapping intervals; the last one is open.
    pub intervals: Vec<StatusInterval>,
    /// Malformed events dropped during replay.
    pub skipped_events: u64,
}

struct StatusChange {
    at: DateTime<Utc>,
    from: Option<(String, String)>,
    to: (String, String),
}

/// Replay a changelog into status intervals.
pub fn build_history(record: &TaskRecord, changelog: &[ChangelogEntry]) -> ReconstructedHistory {
    let mut skipped_events = 0u64;
    let mut changes = Vec::new();

    for entry in changelog {
        let status_diffs: Vec<_> = entry
            .fields
            .iter()
            .filter(|f| f.is_status_change())
            .collect();
        if status_diffs.is_empty() {
            continue;
        }

        let Some(at) = entry.updated_at.as_deref().and_then(parse_tracker_date) else {
            warn!(task = %record.key, "changelog event without usable timestamp, skipping");
            skipped_events += 1;
            continue;
        };

        for diff in status_diffs {
            let to = diff.to.as_ref().and_then(|r| {
                Some((
                    r.system_name()?.to_string(),
                    r.display_name().unwrap_or_default().to_string(),
                ))
            });
            let Some(to) = to else {
                warn!(task = %record.key, "status change without target status, skipping");
                skipped_events += 1;
                continue;
            };

            let from = diff.from.as_ref().and_then(|r| {
                Some((
                    r.system_name()?.to_string(),
                    r.display_name().unwrap_or_default().to_string(),
                ))
            });

            changes.push(StatusChange { at, from, to });
        }
    }

    let current_status = record.status.as_ref().map(|s| {
        (
            s.clone(),
            record.status_display.clone().unwrap_or_else(|| s.clone()),
        )
    });

    // The first interval covers creation up to the first transition.
    let initial = changes
        .first()
        .and_then(|c| c.from.clone())
        .or(current_status);

    let mut intervals = Vec::with_capacity(changes.len() + 1);
    if let Some((status, display)) = initial {
        intervals.push(StatusInterval::new(status, display, record.created_at, None));
    }

    for change in &changes {
        if let Some(open) = intervals.last_mut() {
            open.end_date = Some(change.at);
        }
        intervals.push(StatusInterval::new(
            change.to.0.clone(),
            change.to.1.clone(),
            change.at,
            None,
        ));
    }

    ReconstructedHistory {
        intervals,
        skipped_events,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(status: Option<&str>) -> TaskRecord {
        TaskRecord {
            tracker_id: "t1".into(),
            key: "UP-1".into(),
            summary: None,
            description: None,
            status: status.map(str::to_string),
            status_display: status.map(str::to_string),
            author: None,
            assignee: None,
            business_client: None,
            team: None,
            product_team: None,
            profit_forecast: None,
            links: Vec::new(),
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            updated_at: None,
        }
    }

    fn status_event(at: &str, from: Option<&str>, to: &str) -> ChangelogEntry {
        let mut fields = serde_json::Map::new();
        fields.insert("field".into(), serde_json::json!({"id": "status"}));
        if let Some(from) = from {
            fields.insert("from".into(), serde_json::json!({"key": from, "display": from}));
        }
        fields.insert("to".into(), serde_json::json!({"key": to, "display": to}));

        serde_json::from_value(serde_json::json!({
            "id": "e",
            "updatedAt": at,
            "fields": [serde_json::Value::Object(fields)]
        }))
        .unwrap()
    }

    #[test]
    fn reconstructs_interval_chain() {
        let events = vec![
            status_event("2025-01-05T00:00:00Z", Some("open"), "discovery"),
            status_event("2025-01-15T00:00:00Z", Some("discovery"), "ready_for_dev"),
        ];
        let history = build_history(&record(Some("ready_for_dev")), &events);

        assert_eq!(history.skipped_events, 0);
        let intervals = &history.intervals;
        assert_eq!(intervals.len(), 3);

        assert_eq!(intervals[0].status, "open");
        assert_eq!(
            intervals[0].start_date,
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            intervals[0].end_date,
            Some(Utc.with_ymd_and_hms(2025, 1, 5, 0, 0, 0).unwrap())
        );

        assert_eq!(intervals[1].status, "discovery");
        assert_eq!(intervals[1].end_date, Some(intervals[2].start_date));

        assert_eq!(intervals[2].status, "ready_for_dev");
        assert!(intervals[2].end_date.is_none());
    }

    #[test]
    fn replay_is_deterministic() {
        let events = vec![
            status_event("2025-01-05T00:00:00Z", Some("open"), "discovery"),
            status_event("2025-01-15T00:00:00Z", Some("discovery"), "done"),
        ];
        let record = record(Some("done"));
        let first = build_history(&record, &events);
        let second = build_history(&record, &events);
        assert_eq!(first, second);
    }

    #[test]
    fn no_status_events_yields_single_open_interval() {
        let history = build_history(&record(Some("open")), &[]);
        assert_eq!(history.intervals.len(), 1);
        assert_eq!(history.intervals[0].status, "open");
        assert!(history.intervals[0].end_date.is_none());
    }

    #[test]
    fn no_events_and_no_status_yields_empty_history() {
        let history = build_history(&record(None), &[]);
        assert!(history.intervals.is_empty());
    }

    #[test]
    fn malformed_events_are_skipped_with_counter() {
        let mut missing_ts = status_event("2025-01-05T00:00:00Z", Some("open"), "discovery");
        missing_ts.updated_at = None;

        let missing_to: ChangelogEntry = serde_json::from_value(serde_json::json!({
            "updatedAt": "2025-01-06T00:00:00Z",
            "fields": [{"field": {"id": "status"}, "from": {"key": "open"}}]
        }))
        .unwrap();

        let good = status_event("2025-01-07T00:00:00Z", Some("open"), "discovery");

        let history = build_history(&record(Some("discovery")), &[missing_ts, missing_to, good]);
        assert_eq!(history.skipped_events, 2);
        assert_eq!(history.intervals.len(), 2);
    }

    #[test]
    fn zero_duration_intervals_are_kept() {
        let events = vec![
            status_event("2025-01-05T00:00:00Z", Some("open"), "discovery"),
            status_event("2025-01-05T00:00:00Z", Some("discovery"), "in_work"),
        ];
        let history = build_history(&record(Some("in_work")), &events);

        assert_eq!(history.intervals.len(), 3);
        assert_eq!(
            history.intervals[1].start_date,
            history.intervals[1].end_date.unwrap()
        );
    }

    #[test]
    fn non_status_events_are_ignored_silently() {
        let assignee_event: ChangelogEntry = serde_json::from_value(serde_json::json!({
            "updatedAt": "2025-01-03T00:00:00Z",
            "fields": [{"field": {"id": "assignee"}, "to": {"display": "Bob"}}]
        }))
        .unwrap();

        let history = build_history(&record(Some("open")), &[assignee_event]);
        assert_eq!(history.skipped_events, 0);
        assert_eq!(history.intervals.len(), 1);
    }

    #[test]
    fn intervals_are_contiguous_and_sorted() {
        let events = vec![
            status_event("2025-01-05T00:00:00Z", Some("open"), "discovery"),
            status_event("2025-01-10T00:00:00Z", Some("discovery"), "in_work"),
            status_event("2025-01-20T00:00:00Z", Some("in_work"), "done"),
        ];
        let history = build_history(&record(Some("done")), &events);

        for pair in history.intervals.windows(2) {
            assert_eq!(pair[0].end_date, Some(pair[1].start_date));
        }
        let open_count = history
            .intervals
            .iter()
            .filter(|i| i.end_date.is_none())
            .count();
        assert_eq!(open_count, 1);
    }
}
