//! Error types for the tracker client.

use thiserror::Error;

/// Errors that can occur when talking to the remote tracker.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status with request context.
    #[error("{method} {path} returned {status}: {body}")]
    Status {
        status: u16,
        method: String,
        path: String,
        body: String,
    },

    /// 429 from the remote; the request gate has been slowed down.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Response body did not match the expected shape.
    #[error("failed to decode response from {path}: {message}")]
    Decode { path: String, message: String },

    /// Issue payload missing a field the sync cannot proceed without.
    #[error("malformed issue payload: {0}")]
    Payload(String),
}

impl TrackerError {
    /// Whether the retry policy should re-attempt this failure.
    ///
    /// 429 and 5xx (the scroll endpoint is known to 504) are transient;
    /// other client errors and decode failures fail fast.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::RateLimited(_) => true,
            Self::Decode { .. } | Self::Payload(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_error(status: u16) -> TrackerError {
        TrackerError::Status {
            status,
            method: "GET".into(),
            path: "/issues/X-1".into(),
            body: String::new(),
        }
    }

    #[test]
    fn server_errors_are_retryable() {
        assert!(status_error(500).is_retryable());
        assert!(status_error(502).is_retryable());
        assert!(status_error(504).is_retryable());
        assert!(status_error(429).is_retryable());
    }

    #[test]
    fn client_errors_fail_fast() {
        assert!(!status_error(400).is_retryable());
        assert!(!status_error(403).is_retryable());
        assert!(!status_error(404).is_retryable());
    }

    #[test]
    fn decode_and_payload_fail_fast() {
        let decode = TrackerError::Decode {
            path: "/issues".into(),
            message: "not json".into(),
        };
        assert!(!decode.is_retryable());
        assert!(!TrackerError::Payload("missing key".into()).is_retryable());
    }

    #[test]
    fn status_display_carries_request_context() {
        let err = status_error(504);
        let msg = err.to_string();
        assert!(msg.contains("GET"));
        assert!(msg.contains("/issues/X-1"));
        assert!(msg.contains("504"));
    }
}
