//! Quarter buckets for report grouping.

use chrono::{DateTime, Utc};

/// One reporting period, inclusive on both ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quarter {
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl Quarter {
    pub fn contains(&self, date: DateTime<Utc>) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// Find the quarter whose `[start, end]` contains the anchor date.
pub fn quarter_for(quarters: &[Quarter], date: DateTime<Utc>) -> Option<&Quarter> {
    quarters.iter().find(|q| q.contains(date))
}

/// Reject overlapping quarters.
///
/// Gaps are allowed; an anchor landing in a gap simply leaves the task
/// unbucketed for that metric.
pub fn check_non_overlapping(quarters: &[Quarter]) -> std::result::Result<(), String> {
    let mut sorted: Vec<&Quarter> = quarters.iter().collect();
    sorted.sort_by_key(|q| q.start_date);

    for pair in sorted.windows(2) {
        if pair[1].start_date <= pair[0].end_date {
            return Err(format!(
                "quarters '{}' and '{}' overlap",
                pair[0].name, pair[1].name
            ));
        }
    }
    Ok(())
}
