//! Quarters and status-mapping file parsers.
//!
//! Both files are operator-maintained `;`-separated text. Quarters:
//! `name;YYYY-MM-DD;YYYY-MM-DD`. Status mapping: `status;block` where
//! block is one of `discovery`, `done`, `pause`, `external_test`,
//! `ready_for_dev`, `in_work`. Blank lines and `#` comments are skipped.

use crate::error::{CadenceError, Result};
use crate::models::quarter::{check_non_overlapping, Quarter};
use crate::models::StatusMapping;
use chrono::{NaiveDate, TimeZone, Utc};
use std::path::Path;
use tracing::{info, warn};

fn parse_date(s: &str, line: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| CadenceError::Config(format!("bad date in quarter line '{}': {}", line, e)))
}

/// Load quarter buckets from the configured file.
///
/// Overlapping quarters are a fatal configuration error.
pub fn load_quarters(path: &Path) -> Result<Vec<Quarter>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        CadenceError::Config(format!("cannot read quarters file {}: {}", path.display(), e))
    })?;

    let mut quarters = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut parts = line.splitn(3, ';');
        let (name, start, end) = match (parts.next(), parts.next(), parts.next()) {
            (Some(n), Some(s), Some(e)) => (n, s, e),
            _ => {
                warn!(line, "skipping malformed quarter line");
                continue;
            }
        };

        let start = parse_date(start, line)?;
        let end = parse_date(end, line)?;

        quarters.push(Quarter {
            name: name.trim().to_string(),
            start_date: Utc.from_utc_datetime(&start.and_hms_opt(0, 0, 0).unwrap()),
            // Inclusive upper bound covers the whole last day.
            end_date: Utc.from_utc_datetime(&end.and_hms_opt(23, 59, 59).unwrap()),
        });
    }

    if quarters.is_empty() {
        return Err(CadenceError::Config(format!(
            "no quarters found in {}",
            path.display()
        )));
    }

    check_non_overlapping(&quarters).map_err(CadenceError::Config)?;

    info!(count = quarters.len(), "loaded quarters");
    Ok(quarters)
}

/// Load the status classification from the configured file.
pub fn load_status_mapping(path: &Path) -> Result<StatusMapping> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        CadenceError::Config(format!(
            "cannot read status mapping file {}: {}",
            path.display(),
            e
        ))
    })?;

    let mut mapping = StatusMapping::default();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((status, block)) = line.split_once(';') else {
            warn!(line, "skipping malformed status mapping line");
            continue;
        };
        let status = status.trim().to_string();

        match block.trim() {
            "discovery" => mapping.discovery_statuses.push(status),
            "done" => mapping.done_statuses.push(status),
            "pause" => mapping.pause_statuses.push(status),
            "external_test" => mapping.external_test_statuses.push(status),
            "ready_for_dev" => mapping.ready_for_dev_status = status,
            "in_work" => mapping.in_work_status = status,
            other => warn!(block = other, status = %status, "unknown status block"),
        }
    }

    if mapping.ready_for_dev_status.is_empty() {
        return Err(CadenceError::Config(format!(
            "status mapping {} has no ready_for_dev anchor",
            path.display()
        )));
    }

    info!(
        discovery = mapping.discovery_statuses.len(),
        done = mapping.done_statuses.len(),
        pause = mapping.pause_statuses.len(),
        external_test = mapping.external_test_statuses.len(),
        "loaded status mapping"
    );
    Ok(mapping)
}
