//! Aggregate statistics for quarter × group cells.
//!
//! Nearest-rank percentile on whole-day series. The pause summary for a
//! cell is computed from exactly the pause values deducted from the
//! corresponding delivery metric, never from a broader series.

/// Arithmetic mean.
pub fn mean(values: &[i64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<i64>() as f64 / values.len() as f64)
}

/// Nearest-rank percentile: the ⌈p/100 · n⌉-th smallest value.
pub fn percentile_nearest_rank(values: &[i64], percentile: f64) -> Option<i64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();

    let rank = ((percentile / 100.0) * sorted.len() as f64).ceil() as usize;
    let index = rank.clamp(1, sorted.len()) - 1;
    Some(sorted[index])
}

/// Count, mean and P85 of one metric series plus its paired pause series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesSummary {
    pub count: usize,
    pub mean: Option<f64>,
    pub p85: Option<i64>,
    pub pause_mean: Option<f64>,
    pub pause_p85: Option<i64>,
}

impl SeriesSummary {
    /// Summarize a metric series without pause pairing.
    pub fn of(values: &[i64]) -> Self {
        Self {
            count: values.len(),
            mean: mean(values),
            p85: percentile_nearest_rank(values, 85.0),
            pause_mean: None,
            pause_p85: None,
        }
    }

    /// Summarize a metric series with the pause values that were
    /// deducted from it.
    pub fn with_pauses(values: &[i64], pauses: &[i64]) -> Self {
        Self {
            count: values.len(),
            mean: mean(values),
            p85: percentile_nearest_rank(values, 85.0),
            pause_mean: mean(pauses),
            pause_p85: percentile_nearest_rank(pauses, 85.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_empty_is_none() {
        assert_eq!(mean(&[]), None);
        assert_eq!(percentile_nearest_rank(&[], 85.0), None);
    }

    #[test]
    fn mean_of_series() {
        assert_eq!(mean(&[2, 4, 6]), Some(4.0));
    }

    #[test]
    fn nearest_rank_small_series() {
        // n=1: rank ceil(0.85) = 1.
        assert_eq!(percentile_nearest_rank(&[7], 85.0), Some(7));
        // n=2: rank ceil(1.7) = 2 -> larger value.
        assert_eq!(percentile_nearest_rank(&[3, 9], 85.0), Some(9));
    }

    #[test]
    fn nearest_rank_ten_values() {
        let values: Vec<i64> = (1..=10).collect();
        // rank ceil(8.5) = 9 -> value 9.
        assert_eq!(percentile_nearest_rank(&values, 85.0), Some(9));
        // Median by nearest rank: ceil(5.0) = 5 -> value 5.
        assert_eq!(percentile_nearest_rank(&values, 50.0), Some(5));
    }

    #[test]
    fn order_does_not_matter() {
        assert_eq!(
            percentile_nearest_rank(&[9, 1, 5, 3, 7], 85.0),
            percentile_nearest_rank(&[1, 3, 5, 7, 9], 85.0)
        );
    }

    #[test]
    fn summary_pairs_pause_series() {
        let summary = SeriesSummary::with_pauses(&[10, 20], &[1, 3]);
        assert_eq!(summary.count, 2);
        assert_eq!(summary.mean, Some(15.0));
        assert_eq!(summary.pause_mean, Some(2.0));
        assert_eq!(summary.pause_p85, Some(3));
    }
}
