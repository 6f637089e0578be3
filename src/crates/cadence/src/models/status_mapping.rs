//! Status classification used by the metrics engine.

use serde::{Deserialize, Serialize};

/// Externally provided classification of tracker statuses.
///
/// Set membership is by system status name. The two anchors name single
/// statuses: `ready_for_dev` ends the discovery phase, `in_work` starts
/// the development lead time clock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusMapping {
    pub discovery_statuses: Vec<String>,
    pub done_statuses: Vec<String>,
    pub pause_statuses: Vec<String>,
    pub external_test_statuses: Vec<String>,
    pub ready_for_dev_status: String,
    pub in_work_status: String,
}

impl StatusMapping {
    pub fn is_discovery(&self, status: &str) -> bool {
        self.discovery_statuses.iter().any(|s| s == status)
    }

    pub fn is_done(&self, status: &str) -> bool {
        self.done_statuses.iter().any(|s| s == status)
    }

    pub fn is_pause(&self, status: &str) -> bool {
        self.pause_statuses.iter().any(|s| s == status)
    }

    pub fn is_external_test(&self, status: &str) -> bool {
        self.external_test_statuses.iter().any(|s| s == status)
    }
}

/// Grouping dimension for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    Author,
    Team,
}

impl GroupBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Author => "author",
            Self::Team => "team",
        }
    }

    /// Column the scope query groups on.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Author => "author",
            Self::Team => "team",
        }
    }
}

impl std::fmt::Display for GroupBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which metric's anchor statuses select tasks into a reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Time to delivery: the ready-for-dev anchor status.
    Ttd,
    /// Time to market: the done statuses.
    Ttm,
    /// Either anchor.
    Both,
}

impl MetricKind {
    /// Target statuses for the scope query.
    pub fn target_statuses(&self, mapping: &StatusMapping) -> Vec<String> {
        match self {
            Self::Ttd => vec![mapping.ready_for_dev_status.clone()],
            Self::Ttm => mapping.done_statuses.clone(),
            Self::Both => {
                let mut statuses = vec![mapping.ready_for_dev_status.clone()];
                statuses.extend(mapping.done_statuses.iter().cloned());
                statuses
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping() -> StatusMapping {
        StatusMapping {
            discovery_statuses: vec!["discovery".into(), "discovery_backlog".into()],
            done_statuses: vec!["done".into(), "closed".into()],
            pause_statuses: vec!["paused".into()],
            external_test_statuses: vec!["external_test".into()],
            ready_for_dev_status: "ready_for_dev".into(),
            in_work_status: "in_work".into(),
        }
    }

    #[test]
    fn set_membership() {
        let m = mapping();
        assert!(m.is_discovery("discovery_backlog"));
        assert!(m.is_done("closed"));
        assert!(m.is_pause("paused"));
        assert!(m.is_external_test("external_test"));
        assert!(!m.is_done("paused"));
    }

    #[test]
    fn metric_kind_targets() {
        let m = mapping();
        assert_eq!(MetricKind::Ttd.target_statuses(&m), vec!["ready_for_dev"]);
        assert_eq!(MetricKind::Ttm.target_statuses(&m), vec!["done", "closed"]);
        assert_eq!(MetricKind::Both.target_statuses(&m).len(), 3);
    }
}
