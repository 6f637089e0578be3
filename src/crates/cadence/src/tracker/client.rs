//! Tracker API client.
//!
//! Thin transport over reqwest: every request passes the shared request
//! gate, failures are classified by `TrackerError::is_retryable` and
//! retried with exponential backoff, and a 429 doubles the gate delay for
//! the remainder of the run.

use crate::config::TrackerConfig;
use crate::tracker::error::TrackerError;
use crate::tracker::types::{ChangelogEntry, IssueDto, TaskId};
use futures::stream::{self, StreamExt};
use reqwest::{Method, Response, StatusCode};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tooling::async_utils::{with_retry_if, RetryPolicy};
use tooling::rate_limit::RequestGate;
use tracing::{error, warn};

const CHANGELOG_PAGE_SIZE: usize = 50;
const CHANGELOG_MAX_PAGES: usize = 100;
const ERROR_BODY_LIMIT: usize = 512;

/// Client for the remote tracker API.
#[derive(Clone)]
pub struct TrackerClient {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
    org_id: String,
    gate: RequestGate,
    retry: RetryPolicy,
    scroll_page_size: usize,
    scroll_ttl_ms: u64,
    delay_doubled: Arc<AtomicBool>,
}

impl TrackerClient {
    /// Build a client from configuration.
    pub fn new(config: &TrackerConfig) -> Result<Self, TrackerError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .connect_timeout(config.http_timeout())
            .pool_max_idle_per_host(config.max_workers + 2)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            org_id: config.org_id.clone(),
            gate: RequestGate::new(config.request_delay()),
            retry: RetryPolicy::new(3).with_initial_interval(1.0),
            scroll_page_size: config.scroll_page_size,
            scroll_ttl_ms: config.scroll_ttl_ms,
            delay_doubled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// The shared request gate, for tests and diagnostics.
    pub fn gate(&self) -> &RequestGate {
        &self.gate
    }

    /// Override the retry policy.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Open a scroll search over the given query.
    pub fn search(&self, query: impl Into<String>, limit: Option<usize>) -> ScrollSearch<'_> {
        ScrollSearch {
            client: self,
            query: query.into(),
            limit,
            scroll_id: None,
            yielded: 0,
            done: false,
        }
    }

    /// Fetch one issue with links expanded.
    pub async fn get_issue(&self, key: &str) -> Result<IssueDto, TrackerError> {
        let path = format!("/issues/{}", key);
        let query = [("expand".to_string(), "links".to_string())];
        let response = self.request(Method::GET, &path, &query, None).await?;
        decode_json(response, &path).await
    }

    /// Fetch many issues concurrently, bounded by `concurrency`.
    ///
    /// All requests still share the process-global gate, so the aggregate
    /// rate stays within the configured ceiling. Per-key failures are
    /// reported individually instead of failing the batch.
    pub async fn get_issues_batch(
        &self,
        keys: &[String],
        concurrency: usize,
    ) -> Vec<(String, Result<IssueDto, TrackerError>)> {
        stream::iter(keys.iter().cloned())
            .map(|key| async move {
                let result = self.get_issue(&key).await;
                (key, result)
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await
    }

    /// Fetch the full ordered changelog for one issue.
    pub async fn get_changelog(&self, key: &str) -> Result<Vec<ChangelogEntry>, TrackerError> {
        let path = format!("/issues/{}/changelog", key);
        let mut entries = Vec::new();
        let mut page = 1usize;

        loop {
            let query = [
                ("perPage".to_string(), CHANGELOG_PAGE_SIZE.to_string()),
                ("page".to_string(), page.to_string()),
            ];
            let response = self.request(Method::GET, &path, &query, None).await?;

            let total_pages: Option<usize> = response
                .headers()
                .get("X-Total-Pages")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());

            let page_entries: Vec<ChangelogEntry> = decode_json(response, &path).await?;
            if page_entries.is_empty() {
                break;
            }
            entries.extend(page_entries);

            if let Some(total) = total_pages {
                if page >= total {
                    break;
                }
            }

            page += 1;
            if page > CHANGELOG_MAX_PAGES {
                warn!(issue = key, "changelog page cap reached, truncating");
                break;
            }
        }

        Ok(entries)
    }

    /// One gated, retried request.
    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<Response, TrackerError> {
        let result = with_retry_if(&self.retry, TrackerError::is_retryable, || {
            self.execute(method.clone(), path, query, body)
        })
        .await;

        if let Err(ref err) = result {
            error!(
                method = %method,
                path,
                query = ?query,
                has_body = body.is_some(),
                %err,
                "tracker request failed"
            );
        }
        result
    }

    /// Single attempt: gate, send, classify.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<Response, TrackerError> {
        self.gate.acquire().await;

        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .http
            .request(method.clone(), &url)
            .header("Authorization", format!("OAuth {}", self.api_token))
            .header("X-Org-ID", &self.org_id)
            .query(query);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            self.slow_down().await;
            let text = truncate_body(response.text().await.unwrap_or_default());
            return Err(TrackerError::RateLimited(format!(
                "{} {}: {}",
                method, path, text
            )));
        }

        if !status.is_success() {
            let text = truncate_body(response.text().await.unwrap_or_default());
            return Err(TrackerError::Status {
                status: status.as_u16(),
                method: method.to_string(),
                path: path.to_string(),
                body: text,
            });
        }

        Ok(response)
    }

    /// Double the gate delay once per run when the remote pushes back.
    async fn slow_down(&self) {
        if !self.delay_doubled.swap(true, Ordering::SeqCst) {
            let current = self.gate.min_delay().await;
            let doubled = current.checked_mul(2).unwrap_or(current);
            self.gate.set_min_delay(doubled).await;
            warn!(
                new_delay_ms = doubled.as_millis() as u64,
                "remote returned 429, request delay doubled for this run"
            );
        }
    }

}

async fn decode_json<T: serde::de::DeserializeOwned>(
    response: Response,
    path: &str,
) -> Result<T, TrackerError> {
    response.json().await.map_err(|e| TrackerError::Decode {
        path: path.to_string(),
        message: e.to_string(),
    })
}

fn truncate_body(mut body: String) -> String {
    if body.len() > ERROR_BODY_LIMIT {
        let mut cut = ERROR_BODY_LIMIT;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push_str("...");
    }
    body
}

/// Lazy scroll-paginated search.
///
/// The first `next_page` opens the scroll (`scrollType=unsorted`); later
/// calls continue it with the `X-Scroll-Id` the server returned. The
/// consumer may simply stop calling to abandon the scroll early.
pub struct ScrollSearch<'a> {
    client: &'a TrackerClient,
    query: String,
    limit: Option<usize>,
    scroll_id: Option<String>,
    yielded: usize,
    done: bool,
}

impl ScrollSearch<'_> {
    /// Identifiers yielded so far.
    pub fn yielded(&self) -> usize {
        self.yielded
    }

    /// Fetch the next page of task identifiers.
    ///
    /// Returns `Ok(None)` once the scroll is exhausted or the limit has
    /// been reached.
    pub async fn next_page(&mut self) -> Result<Option<Vec<TaskId>>, TrackerError> {
        if self.done {
            return Ok(None);
        }

        let path = "/issues/_search";
        let response = match &self.scroll_id {
            None => {
                let query = [
                    ("scrollType".to_string(), "unsorted".to_string()),
                    (
                        "perScroll".to_string(),
                        self.client.scroll_page_size.to_string(),
                    ),
                    (
                        "scrollTTLMillis".to_string(),
                        self.client.scroll_ttl_ms.to_string(),
                    ),
                    ("expand".to_string(), "links".to_string()),
                ];
                let body = serde_json::json!({ "query": self.query });
                self.client
                    .request(Method::POST, path, &query, Some(&body))
                    .await?
            }
            Some(scroll_id) => {
                let query = [("scrollId".to_string(), scroll_id.clone())];
                self.client.request(Method::POST, path, &query, None).await?
            }
        };

        let next_scroll_id = response
            .headers()
            .get("X-Scroll-Id")
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let issues: Vec<IssueDto> = decode_json(response, path).await?;
        let page_len = issues.len();

        let mut ids: Vec<TaskId> = issues
            .into_iter()
            .map(|issue| TaskId {
                id: issue.id_string(),
                key: issue.key,
            })
            .collect();

        if let Some(limit) = self.limit {
            let remaining = limit.saturating_sub(self.yielded);
            if ids.len() >= remaining {
                ids.truncate(remaining);
                self.done = true;
            }
        }
        self.yielded += ids.len();

        // A short page or a missing continuation header ends the scroll.
        if next_scroll_id.is_none() || page_len < self.client.scroll_page_size {
            self.done = true;
        }
        self.scroll_id = next_scroll_id;

        if ids.is_empty() {
            self.done = true;
            return Ok(None);
        }
        Ok(Some(ids))
    }
}
