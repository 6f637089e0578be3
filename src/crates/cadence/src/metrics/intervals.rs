//! Interval filters applied before metric computation.
//!
//! Both filters are pure: they never modify their input, never reorder
//! entries, and never introduce a status the raw history did not contain.
//! Storage keeps the full history; these run metric-side only.

use crate::models::StatusInterval;
use chrono::{DateTime, Duration, Utc};

/// Drop sub-threshold "bounce" intervals.
///
/// An accidental click produces a near-instant state flip that would
/// otherwise corrupt "first time in status X" reasoning. The first entry
/// (creation) and the last entry (current state) are always kept; an
/// intermediate interval survives only when it lasted at least
/// `min_duration`.
pub fn filter_short_transitions(
    history: &[StatusInterval],
    min_duration: Duration,
) -> Vec<StatusInterval> {
    let last = history.len().saturating_sub(1);
    history
        .iter()
        .enumerate()
        .filter(|(i, interval)| {
            if *i == 0 || *i == last {
                return true;
            }
            match interval.end_date {
                Some(end) => end - interval.start_date >= min_duration,
                // An open interval mid-history only appears in malformed
                // data; keep it rather than invent a gap.
                None => true,
            }
        })
        .map(|(_, interval)| interval.clone())
        .collect()
}

/// Cut the history at a historical date.
///
/// Entries starting after `as_of` are dropped; entries ending after it
/// are re-opened so open-interval handling sees the state as it was at
/// that moment.
pub fn filter_as_of(history: &[StatusInterval], as_of: DateTime<Utc>) -> Vec<StatusInterval> {
    history
        .iter()
        .filter(|interval| interval.start_date <= as_of)
        .map(|interval| {
            let mut interval = interval.clone();
            if matches!(interval.end_date, Some(end) if end > as_of) {
                interval.end_date = None;
            }
            interval
        })
        .collect()
}
