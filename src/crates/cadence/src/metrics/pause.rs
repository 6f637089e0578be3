//! Pause accounting.
//!
//! Time a task sits in a pause status is excluded from delivery metrics.
//! Both helpers count whole days and clip pause intervals to the window
//! under consideration: an interval crossing the cutoff contributes only
//! its portion before it.

use crate::models::{StatusInterval, StatusMapping};
use chrono::{DateTime, Utc};

/// Days spent in pause statuses before `cutoff`.
pub fn pause_up_to(
    history: &[StatusInterval],
    mapping: &StatusMapping,
    cutoff: DateTime<Utc>,
) -> i64 {
    let mut total = 0i64;
    for interval in history {
        if !mapping.is_pause(&interval.status) || interval.start_date >= cutoff {
            continue;
        }
        let end = interval.end_date.unwrap_or(cutoff).min(cutoff);
        total += (end - interval.start_date).num_days().max(0);
    }
    total
}

/// Days spent in pause statuses inside `[from, to]`.
pub fn pause_between(
    history: &[StatusInterval],
    mapping: &StatusMapping,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> i64 {
    let mut total = 0i64;
    for interval in history {
        if !mapping.is_pause(&interval.status) {
            continue;
        }
        let pause_end = interval.end_date.unwrap_or(to);
        let overlap_start = interval.start_date.max(from);
        let overlap_end = pause_end.min(to);
        if overlap_start < overlap_end {
            total += (overlap_end - overlap_start).num_days().max(0);
        }
    }
    total
}

/// Days spent in closed pause intervals over the whole history.
///
/// Used when neither a done anchor nor an as-of date bounds the
/// calculation; an open pause tail has no measurable length then.
pub fn pause_total(history: &[StatusInterval], mapping: &StatusMapping) -> i64 {
    let mut total = 0i64;
    for interval in history {
        if !mapping.is_pause(&interval.status) {
            continue;
        }
        if let Some(end) = interval.end_date {
            total += (end - interval.start_date).num_days().max(0);
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, day, 0, 0, 0).unwrap()
    }

    fn mapping() -> StatusMapping {
        StatusMapping {
            pause_statuses: vec!["paused".into()],
            ..StatusMapping::default()
        }
    }

    fn interval(status: &str, start: u32, end: Option<u32>) -> StatusInterval {
        StatusInterval::new(status, status, date(start), end.map(date))
    }

    #[test]
    fn counts_closed_pause_before_cutoff() {
        let history = vec![
            interval("discovery", 1, Some(8)),
            interval("paused", 8, Some(10)),
            interval("discovery", 10, Some(15)),
        ];
        assert_eq!(pause_up_to(&history, &mapping(), date(15)), 2);
    }

    #[test]
    fn pause_crossing_cutoff_is_clipped() {
        let history = vec![interval("paused", 8, Some(20))];
        assert_eq!(pause_up_to(&history, &mapping(), date(10)), 2);
    }

    #[test]
    fn pause_starting_after_cutoff_is_ignored() {
        let history = vec![interval("paused", 12, Some(14))];
        assert_eq!(pause_up_to(&history, &mapping(), date(10)), 0);
    }

    #[test]
    fn open_pause_runs_to_cutoff() {
        let history = vec![interval("paused", 8, None)];
        assert_eq!(pause_up_to(&history, &mapping(), date(11)), 3);
    }

    #[test]
    fn between_counts_only_the_window() {
        let history = vec![
            interval("paused", 2, Some(4)),
            interval("work", 4, Some(10)),
            interval("paused", 10, Some(16)),
        ];
        // Window [5, 12]: first pause outside, second clipped to 2 days.
        assert_eq!(pause_between(&history, &mapping(), date(5), date(12)), 2);
    }

    #[test]
    fn total_skips_open_tail() {
        let history = vec![
            interval("paused", 2, Some(5)),
            interval("paused", 10, None),
        ];
        assert_eq!(pause_total(&history, &mapping()), 3);
    }

    #[test]
    fn non_pause_statuses_never_count() {
        let history = vec![interval("discovery", 1, Some(20))];
        assert_eq!(pause_up_to(&history, &mapping(), date(25)), 0);
        assert_eq!(pause_between(&history, &mapping(), date(1), date(20)), 0);
        assert_eq!(pause_total(&history, &mapping()), 0);
    }
}
