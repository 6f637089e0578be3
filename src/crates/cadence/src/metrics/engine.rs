//! Per-task metric computation.
//!
//! Every metric runs on a prepared copy of the history: cut at the
//! optional as-of date, then stripped of bounce intervals. "First entry
//! into status X" always means the first entry in that prepared history;
//! a task that regressed and re-entered keeps its original anchor.

use crate::metrics::intervals::{filter_as_of, filter_short_transitions};
use crate::metrics::pause::{pause_between, pause_total, pause_up_to};
use crate::models::quarter::quarter_for;
use crate::models::{Quarter, StatusInterval, StatusMapping};
use chrono::{DateTime, Duration, Utc};

/// Scalar metrics for one task, in whole days.
///
/// `None` means "not applicable": the task has not reached the anchor
/// status (and no as-of date stands in for the open end).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskMetrics {
    pub quarter_ttd: Option<String>,
    pub quarter_ttm: Option<String>,
    pub ttd: Option<i64>,
    pub ttm: Option<i64>,
    pub devlt: Option<i64>,
    pub tail: Option<i64>,
    pub pause: Option<i64>,
    pub ttd_pause: Option<i64>,
    pub discovery_backlog_days: Option<i64>,
    pub ready_for_dev_days: Option<i64>,
}

/// Metric computation over prepared histories.
#[derive(Debug, Clone)]
pub struct MetricsEngine {
    mapping: StatusMapping,
    min_status_duration: Duration,
    as_of: Option<DateTime<Utc>>,
}

impl MetricsEngine {
    pub fn new(
        mapping: StatusMapping,
        min_status_duration: Duration,
        as_of: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            mapping,
            min_status_duration,
            as_of,
        }
    }

    pub fn mapping(&self) -> &StatusMapping {
        &self.mapping
    }

    pub fn as_of(&self) -> Option<DateTime<Utc>> {
        self.as_of
    }

    /// As-of cut followed by the bounce filter.
    pub fn prepare(&self, history: &[StatusInterval]) -> Vec<StatusInterval> {
        let cut = match self.as_of {
            Some(as_of) => filter_as_of(history, as_of),
            None => history.to_vec(),
        };
        filter_short_transitions(&cut, self.min_status_duration)
    }

    /// Compute the full metric row for one task.
    pub fn compute(
        &self,
        created_at: DateTime<Utc>,
        history: &[StatusInterval],
        quarters: &[Quarter],
    ) -> TaskMetrics {
        let h = self.prepare(history);
        if h.is_empty() {
            return TaskMetrics::default();
        }

        let ttd_anchor = self.ttd_anchor(&h);
        let ttm_anchor = self.ttm_anchor(&h);

        let ttd = ttd_anchor.map(|anchor| {
            clamp_days((anchor - created_at).num_days() - pause_up_to(&h, &self.mapping, anchor))
        });
        let ttm = ttm_anchor.map(|anchor| {
            clamp_days((anchor - created_at).num_days() - pause_up_to(&h, &self.mapping, anchor))
        });

        let pause_cutoff = ttm_anchor.or(self.as_of);
        let pause = Some(match pause_cutoff {
            Some(cutoff) => pause_up_to(&h, &self.mapping, cutoff),
            None => pause_total(&h, &self.mapping),
        });
        let ttd_pause = ttd_anchor.map(|anchor| pause_up_to(&h, &self.mapping, anchor));

        TaskMetrics {
            quarter_ttd: ttd_anchor
                .and_then(|a| quarter_for(quarters, a))
                .map(|q| q.name.clone()),
            quarter_ttm: ttm_anchor
                .and_then(|a| quarter_for(quarters, a))
                .map(|q| q.name.clone()),
            ttd,
            ttm,
            devlt: self.devlt(&h),
            tail: self.tail(&h),
            pause,
            ttd_pause,
            discovery_backlog_days: self.status_set_days(&h, |s| self.mapping.is_discovery(s)),
            ready_for_dev_days: self
                .status_set_days(&h, |s| s == self.mapping.ready_for_dev_status),
        }
    }

    /// Anchor for TTD: first entry into the ready-for-dev status. When
    /// the task still sits there (open interval) and an as-of date is
    /// given, the as-of date stands in for the open end.
    fn ttd_anchor(&self, h: &[StatusInterval]) -> Option<DateTime<Utc>> {
        let entry = h
            .iter()
            .find(|i| i.status == self.mapping.ready_for_dev_status)?;
        match (entry.end_date, self.as_of) {
            (None, Some(as_of)) => Some(as_of),
            _ => Some(entry.start_date),
        }
    }

    /// Anchor for TTM: first entry into any done status.
    fn ttm_anchor(&self, h: &[StatusInterval]) -> Option<DateTime<Utc>> {
        h.iter()
            .find(|i| self.mapping.is_done(&i.status))
            .map(|i| i.start_date)
    }

    /// Development lead time: first entry into the in-work status up to
    /// the first entry into an external-test status. An as-of date closes
    /// the open end for tasks still in development.
    fn devlt(&self, h: &[StatusInterval]) -> Option<i64> {
        let start = h
            .iter()
            .find(|i| i.status == self.mapping.in_work_status)?
            .start_date;

        let end = h
            .iter()
            .find(|i| self.mapping.is_external_test(&i.status) && i.start_date >= start)
            .map(|i| i.start_date)
            .or_else(|| self.as_of.filter(|&as_of| as_of > start))?;

        Some(clamp_days(
            (end - start).num_days() - pause_between(h, &self.mapping, start, end),
        ))
    }

    /// Tail: first exit from external test up to the first done entry.
    fn tail(&self, h: &[StatusInterval]) -> Option<i64> {
        let exit = h
            .iter()
            .find(|i| self.mapping.is_external_test(&i.status) && i.end_date.is_some())?
            .end_date?;

        let end = h
            .iter()
            .find(|i| self.mapping.is_done(&i.status) && i.start_date >= exit)
            .map(|i| i.start_date)
            .or_else(|| self.as_of.filter(|&as_of| as_of > exit))?;

        Some(clamp_days(
            (end - exit).num_days() - pause_between(h, &self.mapping, exit, end),
        ))
    }

    /// Summed days across every interval matching the predicate.
    ///
    /// Open intervals are measured to the as-of date when one is given
    /// and skipped otherwise.
    fn status_set_days(
        &self,
        h: &[StatusInterval],
        matches: impl Fn(&str) -> bool,
    ) -> Option<i64> {
        let mut any = false;
        let mut total = 0i64;
        for interval in h.iter().filter(|i| matches(&i.status)) {
            any = true;
            if let Some(duration) = interval.duration_until(self.as_of) {
                total += duration.num_days().max(0);
            }
        }
        any.then_some(total)
    }

    /// Transitions into `status` on the prepared history.
    ///
    /// Counts every entry whose predecessor held a different status; a
    /// task bouncing in and out N times counts N.
    pub fn count_entries_into(&self, history: &[StatusInterval], status: &str) -> i64 {
        let h = self.prepare(history);
        let mut count = 0i64;
        let mut prev: Option<&str> = None;
        for interval in &h {
            if interval.status == status && prev != Some(status) {
                count += 1;
            }
            prev = Some(interval.status.as_str());
        }
        count
    }

    /// Transitions into any status of the external-test set.
    pub fn count_external_test_entries(&self, history: &[StatusInterval]) -> i64 {
        let h = self.prepare(history);
        let mut count = 0i64;
        let mut prev_in_set = false;
        for interval in &h {
            let in_set = self.mapping.is_external_test(&interval.status);
            if in_set && !prev_in_set {
                count += 1;
            }
            prev_in_set = in_set;
        }
        count
    }
}

fn clamp_days(days: i64) -> i64 {
    days.max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
    }

    fn jan(day: u32) -> DateTime<Utc> {
        date(2025, 1, day)
    }

    fn mapping() -> StatusMapping {
        StatusMapping {
            discovery_statuses: vec!["discovery".into()],
            done_statuses: vec!["done".into()],
            pause_statuses: vec!["paused".into()],
            external_test_statuses: vec!["external_test".into()],
            ready_for_dev_status: "ready_for_dev".into(),
            in_work_status: "in_work".into(),
        }
    }

    fn engine(as_of: Option<DateTime<Utc>>) -> MetricsEngine {
        MetricsEngine::new(mapping(), Duration::minutes(5), as_of)
    }

    fn interval(status: &str, start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> StatusInterval {
        StatusInterval::new(status, status, start, end)
    }

    #[test]
    fn ttd_basic() {
        // Created Jan 1; ready-for-dev entered Jan 15, still open.
        let history = vec![
            interval("open", jan(1), Some(jan(5))),
            interval("discovery", jan(5), Some(jan(15))),
            interval("ready_for_dev", jan(15), None),
        ];
        let metrics = engine(None).compute(jan(1), &history, &[]);
        assert_eq!(metrics.ttd, Some(14));
        assert_eq!(metrics.ttd_pause, Some(0));
    }

    #[test]
    fn ttd_deducts_pause() {
        // A pause slice splits discovery; two days come off TTD.
        let history = vec![
            interval("open", jan(1), Some(jan(5))),
            interval("discovery", jan(5), Some(jan(8))),
            interval("paused", jan(8), Some(jan(10))),
            interval("discovery", jan(10), Some(jan(15))),
            interval("ready_for_dev", jan(15), None),
        ];
        let metrics = engine(None).compute(jan(1), &history, &[]);
        assert_eq!(metrics.ttd, Some(12));
        assert_eq!(metrics.ttd_pause, Some(2));
    }

    #[test]
    fn bounce_filter_keeps_first_real_entry() {
        // A two-minute ready-for-dev blip on Jan 6 must not become the
        // TTD anchor.
        let blip_start = Utc.with_ymd_and_hms(2025, 1, 6, 0, 0, 0).unwrap();
        let blip_end = Utc.with_ymd_and_hms(2025, 1, 6, 0, 2, 0).unwrap();
        let history = vec![
            interval("open", jan(1), Some(jan(5))),
            interval("discovery", jan(5), Some(blip_start)),
            interval("ready_for_dev", blip_start, Some(blip_end)),
            interval("discovery", blip_end, Some(jan(15))),
            interval("ready_for_dev", jan(15), None),
        ];
        let metrics = engine(None).compute(jan(1), &history, &[]);
        assert_eq!(metrics.ttd, Some(14));
    }

    #[test]
    fn as_of_closes_open_ready_for_dev() {
        // In ready-for-dev since Dec 1, still open.
        let history = vec![interval("ready_for_dev", date(2025, 12, 1), None)];

        let metrics = engine(Some(date(2026, 1, 18))).compute(date(2025, 12, 1), &history, &[]);
        assert_eq!(metrics.ttd, Some(48));

        let later = engine(Some(date(2026, 2, 6))).compute(date(2025, 12, 1), &history, &[]);
        assert!(later.ttd.unwrap() > metrics.ttd.unwrap());
    }

    #[test]
    fn as_of_monotonicity_for_open_interval() {
        let history = vec![interval("ready_for_dev", jan(10), None)];
        let early = engine(Some(jan(20))).compute(jan(1), &history, &[]);
        let late = engine(Some(jan(25))).compute(jan(1), &history, &[]);
        assert!(early.ttd.unwrap() <= late.ttd.unwrap());
    }

    #[test]
    fn ttm_uses_first_done_entry() {
        let history = vec![
            interval("open", jan(1), Some(jan(10))),
            interval("done", jan(10), Some(jan(12))),
            interval("in_work", jan(12), Some(jan(20))),
            interval("done", jan(20), None),
        ];
        let metrics = engine(None).compute(jan(1), &history, &[]);
        assert_eq!(metrics.ttm, Some(9));
    }

    #[test]
    fn devlt_spans_work_to_external_test() {
        let history = vec![
            interval("open", jan(1), Some(jan(5))),
            interval("in_work", jan(5), Some(jan(12))),
            interval("external_test", jan(12), Some(jan(18))),
            interval("done", jan(18), None),
        ];
        let metrics = engine(None).compute(jan(1), &history, &[]);
        assert_eq!(metrics.devlt, Some(7));
    }

    #[test]
    fn devlt_open_requires_as_of() {
        let history = vec![interval("in_work", jan(5), None)];
        assert_eq!(engine(None).compute(jan(1), &history, &[]).devlt, None);
        assert_eq!(
            engine(Some(jan(15))).compute(jan(1), &history, &[]).devlt,
            Some(10)
        );
    }

    #[test]
    fn tail_spans_external_test_exit_to_done() {
        let history = vec![
            interval("in_work", jan(1), Some(jan(5))),
            interval("external_test", jan(5), Some(jan(10))),
            interval("approval", jan(10), Some(jan(14))),
            interval("done", jan(14), None),
        ];
        let metrics = engine(None).compute(jan(1), &history, &[]);
        assert_eq!(metrics.tail, Some(4));
    }

    #[test]
    fn tail_absent_while_still_in_external_test() {
        let history = vec![
            interval("in_work", jan(1), Some(jan(5))),
            interval("external_test", jan(5), None),
        ];
        assert_eq!(engine(None).compute(jan(1), &history, &[]).tail, None);
    }

    #[test]
    fn pause_matches_ttm_anchor() {
        // Property: the reported pause is the deduction applied to TTM.
        let history = vec![
            interval("open", jan(1), Some(jan(3))),
            interval("paused", jan(3), Some(jan(7))),
            interval("in_work", jan(7), Some(jan(15))),
            interval("paused", jan(15), Some(jan(16))),
            interval("done", jan(16), None),
        ];
        let metrics = engine(None).compute(jan(1), &history, &[]);
        let raw_days = (jan(16) - jan(1)).num_days();
        assert_eq!(metrics.pause, Some(5));
        assert_eq!(metrics.ttm, Some(raw_days - 5));
    }

    #[test]
    fn status_duration_sums_all_visits() {
        let history = vec![
            interval("discovery", jan(1), Some(jan(4))),
            interval("in_work", jan(4), Some(jan(8))),
            interval("discovery", jan(8), Some(jan(10))),
            interval("done", jan(10), None),
        ];
        let metrics = engine(None).compute(jan(1), &history, &[]);
        assert_eq!(metrics.discovery_backlog_days, Some(5));
        assert_eq!(metrics.ready_for_dev_days, None);
    }

    #[test]
    fn quarter_bucketing_can_differ_per_metric() {
        let quarters = vec![
            Quarter {
                name: "Q1".into(),
                start_date: jan(1),
                end_date: date(2025, 3, 31),
            },
            Quarter {
                name: "Q2".into(),
                start_date: date(2025, 4, 1),
                end_date: date(2025, 6, 30),
            },
        ];
        let history = vec![
            interval("open", jan(1), Some(jan(20))),
            interval("ready_for_dev", jan(20), Some(date(2025, 4, 10))),
            interval("done", date(2025, 4, 10), None),
        ];
        let metrics = engine(None).compute(jan(1), &history, &quarters);
        assert_eq!(metrics.quarter_ttd.as_deref(), Some("Q1"));
        assert_eq!(metrics.quarter_ttm.as_deref(), Some("Q2"));
    }

    #[test]
    fn counts_every_entry_into_status() {
        let e = engine(None);
        let history = vec![
            interval("in_work", jan(1), Some(jan(3))),
            interval("testing", jan(3), Some(jan(5))),
            interval("in_work", jan(5), Some(jan(7))),
            interval("testing", jan(7), Some(jan(9))),
            interval("done", jan(9), None),
        ];
        assert_eq!(e.count_entries_into(&history, "testing"), 2);
        assert_eq!(e.count_entries_into(&history, "done"), 1);
        assert_eq!(e.count_entries_into(&history, "review"), 0);
    }

    #[test]
    fn counts_external_test_entries_as_a_set() {
        let e = engine(None);
        let history = vec![
            interval("in_work", jan(1), Some(jan(3))),
            interval("external_test", jan(3), Some(jan(5))),
            interval("in_work", jan(5), Some(jan(7))),
            interval("external_test", jan(7), None),
        ];
        assert_eq!(e.count_external_test_entries(&history), 2);
    }

    #[test]
    fn empty_history_yields_default_metrics() {
        let metrics = engine(None).compute(jan(1), &[], &[]);
        assert_eq!(metrics, TaskMetrics::default());
    }

    #[test]
    fn negative_results_clamp_to_zero() {
        // Pause longer than the elapsed window.
        let history = vec![
            interval("paused", jan(1), Some(jan(14))),
            interval("ready_for_dev", jan(14), None),
        ];
        let metrics = engine(None).compute(jan(1), &history, &[]);
        assert_eq!(metrics.ttd, Some(0));
    }
}
