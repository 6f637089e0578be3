//! Shared fixtures for integration tests.
#![allow(dead_code)]

use cadence::models::{StatusInterval, TaskLink, TaskRecord};
use cadence::Database;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;

pub async fn setup_db() -> Arc<Database> {
    Arc::new(Database::in_memory().await.unwrap())
}

pub fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

pub fn jan(day: u32) -> DateTime<Utc> {
    date(2025, 1, day)
}

pub fn record(key: &str, created_at: DateTime<Utc>) -> TaskRecord {
    TaskRecord {
        tracker_id: format!("id-{}", key),
        key: key.to_string(),
        summary: Some(format!("Task {}", key)),
        description: None,
        status: Some("open".to_string()),
        status_display: Some("Open".to_string()),
        author: Some("alice".to_string()),
        assignee: None,
        business_client: None,
        team: Some("payments".to_string()),
        product_team: None,
        profit_forecast: None,
        links: Vec::new(),
        created_at,
        updated_at: None,
    }
}

pub fn record_with_links(
    key: &str,
    created_at: DateTime<Utc>,
    links: Vec<(&str, &str, &str)>,
) -> TaskRecord {
    let mut record = record(key, created_at);
    record.links = links
        .into_iter()
        .map(|(type_id, direction, target_key)| TaskLink {
            type_id: type_id.to_string(),
            direction: direction.to_string(),
            target_key: target_key.to_string(),
        })
        .collect();
    record
}

pub fn interval(
    status: &str,
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
) -> StatusInterval {
    StatusInterval::new(status, status, start, end)
}
