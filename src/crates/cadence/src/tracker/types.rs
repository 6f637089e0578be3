//! Wire types for the tracker API.
//!
//! Shapes follow the tracker's JSON: nested `{key, display}` references,
//! camelCase fields, dates as ISO strings with or without a colon in the
//! offset. Extraction into `TaskRecord` lives here so the client stays a
//! thin transport.

use crate::models::{TaskLink, TaskRecord};
use crate::tracker::error::TrackerError;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Task identifier pair yielded by search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskId {
    pub id: String,
    pub key: String,
}

/// Reference to a named tracker entity (`{id?, key?, display?}`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueRef {
    pub id: Option<serde_json::Value>,
    pub key: Option<String>,
    pub display: Option<String>,
}

impl IssueRef {
    /// System name: `key` preferred, `display` as fallback.
    pub fn system_name(&self) -> Option<&str> {
        self.key.as_deref().or(self.display.as_deref())
    }

    /// Localized name: `display` preferred, `key` as fallback.
    pub fn display_name(&self) -> Option<&str> {
        self.display.as_deref().or(self.key.as_deref())
    }
}

/// One link in an issue's `links` array.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkDto {
    #[serde(rename = "type")]
    pub link_type: Option<IssueRef>,
    pub direction: Option<String>,
    pub object: Option<IssueRef>,
}

/// Issue payload from search or single-issue fetch.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueDto {
    pub id: serde_json::Value,
    pub key: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub status: Option<IssueRef>,
    #[serde(rename = "createdBy")]
    pub created_by: Option<IssueRef>,
    pub assignee: Option<IssueRef>,
    #[serde(rename = "businessClient")]
    pub business_client: Option<serde_json::Value>,
    pub team: Option<serde_json::Value>,
    #[serde(rename = "prodteam")]
    pub product_team: Option<serde_json::Value>,
    #[serde(rename = "profitForecast")]
    pub profit_forecast: Option<serde_json::Value>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<String>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<String>,
    pub links: Option<Vec<LinkDto>>,
}

/// One changelog event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangelogEntry {
    pub id: Option<serde_json::Value>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldChange>,
}

/// One field diff inside a changelog event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldChange {
    pub field: Option<IssueRef>,
    pub from: Option<IssueRef>,
    pub to: Option<IssueRef>,
}

impl FieldChange {
    /// Whether this diff is a status change.
    pub fn is_status_change(&self) -> bool {
        self.field
            .as_ref()
            .and_then(|f| f.id.as_ref())
            .map(|id| id.as_str() == Some("status"))
            .unwrap_or(false)
    }
}

/// Parse a tracker timestamp.
///
/// The API emits both `2025-01-01T10:00:00.000+0000` and proper RFC 3339
/// with `Z` or `+00:00`.
pub fn parse_tracker_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .or_else(|| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z").ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn value_to_display(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Object(map) => map
            .get("display")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| map.get("id").map(value_to_plain).unwrap_or_default()),
        serde_json::Value::Array(items) => {
            let names: Vec<String> = items
                .iter()
                .map(value_to_display)
                .filter(|s| !s.is_empty())
                .collect();
            names.join(", ")
        }
        other => value_to_plain(other),
    }
}

fn value_to_plain(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn optional_display(value: &Option<serde_json::Value>) -> Option<String> {
    value
        .as_ref()
        .map(value_to_display)
        .filter(|s| !s.is_empty())
}

impl IssueDto {
    /// Opaque remote id as a string regardless of wire type.
    pub fn id_string(&self) -> String {
        value_to_plain(&self.id)
    }

    /// Extract the storable record from the wire payload.
    ///
    /// Fails only when the fields the store cannot do without (id, key,
    /// creation date) are missing or unparseable.
    pub fn to_record(&self) -> Result<TaskRecord, TrackerError> {
        let tracker_id = self.id_string();
        if tracker_id.is_empty() {
            return Err(TrackerError::Payload(format!(
                "issue {} has no id",
                self.key
            )));
        }

        let created_at = self
            .created_at
            .as_deref()
            .and_then(parse_tracker_date)
            .ok_or_else(|| {
                TrackerError::Payload(format!("issue {} has no usable createdAt", self.key))
            })?;

        let links = self
            .links
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .filter_map(|link| {
                let type_id = link
                    .link_type
                    .as_ref()
                    .and_then(|t| t.id.as_ref())
                    .map(value_to_plain)?;
                let target_key = link.object.as_ref().and_then(|o| o.key.clone())?;
                Some(TaskLink {
                    type_id,
                    direction: link.direction.clone().unwrap_or_default(),
                    target_key,
                })
            })
            .collect();

        Ok(TaskRecord {
            tracker_id,
            key: self.key.clone(),
            // The summary column is capped at 500 chars.
            summary: self
                .summary
                .as_ref()
                .map(|s| s.chars().take(500).collect()),
            description: self.description.clone(),
            status: self
                .status
                .as_ref()
                .and_then(|s| s.system_name())
                .map(str::to_string),
            status_display: self
                .status
                .as_ref()
                .and_then(|s| s.display_name())
                .map(str::to_string),
            author: self
                .created_by
                .as_ref()
                .and_then(|u| u.display_name())
                .map(str::to_string),
            assignee: self
                .assignee
                .as_ref()
                .and_then(|u| u.display_name())
                .map(str::to_string),
            business_client: optional_display(&self.business_client),
            team: optional_display(&self.team),
            product_team: optional_display(&self.product_team),
            profit_forecast: optional_display(&self.profit_forecast),
            links,
            created_at,
            updated_at: self.updated_at.as_deref().and_then(parse_tracker_date),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue_json() -> serde_json::Value {
        serde_json::json!({
            "id": "abc-123",
            "key": "UP-7",
            "summary": "Improve onboarding",
            "status": {"key": "inProgress", "display": "In Progress"},
            "createdBy": {"display": "Alice"},
            "businessClient": [{"display": "North"}, {"display": "South"}],
            "team": "growth",
            "createdAt": "2025-03-01T09:30:00.000+0000",
            "updatedAt": "2025-03-05T10:00:00Z",
            "links": [
                {"type": {"id": "subtask"}, "direction": "inward",
                 "object": {"key": "DOWN-1", "display": "Backend part"}},
                {"type": {"id": "relates"}, "direction": "outward",
                 "object": {"key": "DOWN-9"}}
            ]
        })
    }

    #[test]
    fn parses_both_offset_styles() {
        assert!(parse_tracker_date("2025-01-01T10:00:00.000+0000").is_some());
        assert!(parse_tracker_date("2025-01-01T10:00:00+00:00").is_some());
        assert!(parse_tracker_date("2025-01-01T10:00:00Z").is_some());
        assert!(parse_tracker_date("yesterday").is_none());
    }

    #[test]
    fn extracts_record_from_wire_shape() {
        let issue: IssueDto = serde_json::from_value(issue_json()).unwrap();
        let record = issue.to_record().unwrap();

        assert_eq!(record.tracker_id, "abc-123");
        assert_eq!(record.key, "UP-7");
        assert_eq!(record.status.as_deref(), Some("inProgress"));
        assert_eq!(record.status_display.as_deref(), Some("In Progress"));
        assert_eq!(record.author.as_deref(), Some("Alice"));
        assert_eq!(record.business_client.as_deref(), Some("North, South"));
        assert_eq!(record.team.as_deref(), Some("growth"));
        assert_eq!(record.links.len(), 2);
        assert_eq!(record.links[0].type_id, "subtask");
        assert_eq!(record.links[0].direction, "inward");
        assert_eq!(record.links[0].target_key, "DOWN-1");
    }

    #[test]
    fn numeric_id_becomes_string() {
        let issue: IssueDto = serde_json::from_value(serde_json::json!({
            "id": 42,
            "key": "UP-1",
            "createdAt": "2025-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(issue.to_record().unwrap().tracker_id, "42");
    }

    #[test]
    fn missing_created_at_is_payload_error() {
        let issue: IssueDto =
            serde_json::from_value(serde_json::json!({"id": "x", "key": "UP-2"})).unwrap();
        assert!(matches!(
            issue.to_record(),
            Err(TrackerError::Payload(_))
        ));
    }

    #[test]
    fn summary_is_truncated_to_500_chars() {
        let long: String = "я".repeat(600);
        let issue: IssueDto = serde_json::from_value(serde_json::json!({
            "id": "x",
            "key": "UP-3",
            "summary": long,
            "createdAt": "2025-01-01T00:00:00Z"
        }))
        .unwrap();
        let record = issue.to_record().unwrap();
        assert_eq!(record.summary.unwrap().chars().count(), 500);
    }

    #[test]
    fn status_field_change_detection() {
        let change: FieldChange = serde_json::from_value(serde_json::json!({
            "field": {"id": "status"},
            "from": {"key": "open", "display": "Open"},
            "to": {"key": "inProgress", "display": "In Progress"}
        }))
        .unwrap();
        assert!(change.is_status_change());

        let other: FieldChange = serde_json::from_value(serde_json::json!({
            "field": {"id": "assignee"}
        }))
        .unwrap();
        assert!(!other.is_status_change());
    }
}
