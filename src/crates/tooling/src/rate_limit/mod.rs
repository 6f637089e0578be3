//! Outbound request rate limiting.
//!
//! Two limiters: `RequestGate` enforces a minimum delay between
//! consecutive operations (the shape remote APIs with per-request quotas
//! expect), and `SlidingWindowLimiter` bounds the number of operations in
//! a rolling window.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Minimum-delay gate shared by every worker in a process.
///
/// `acquire` sleeps until at least the configured delay has elapsed since
/// the previous acquisition, so the aggregate request rate stays bounded
/// no matter how many workers share the gate. The delay can be raised at
/// runtime when the remote starts answering 429.
#[derive(Clone)]
pub struct RequestGate {
    state: Arc<Mutex<GateState>>,
}

struct GateState {
    min_delay: Duration,
    last_pass: Option<Instant>,
}

impl RequestGate {
    /// Create a gate with the given minimum delay between operations.
    pub fn new(min_delay: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(GateState {
                min_delay,
                last_pass: None,
            })),
        }
    }

    /// Wait for a slot. Returns once the caller may issue its request.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                let now = Instant::now();
                match state.last_pass {
                    Some(last) => {
                        let elapsed = now.duration_since(last);
                        if elapsed >= state.min_delay {
                            state.last_pass = Some(now);
                            None
                        } else {
                            Some(state.min_delay - elapsed)
                        }
                    }
                    None => {
                        state.last_pass = Some(now);
                        None
                    }
                }
            };

            match wait {
                None => return,
                Some(d) => tokio::time::sleep(d).await,
            }
        }
    }

    /// Current minimum delay.
    pub async fn min_delay(&self) -> Duration {
        self.state.lock().await.min_delay
    }

    /// Replace the minimum delay for all future acquisitions.
    pub async fn set_min_delay(&self, min_delay: Duration) {
        self.state.lock().await.min_delay = min_delay;
    }
}

/// Sliding window rate limiter.
///
/// Tracks operation timestamps in a rolling window; `check` admits an
/// operation only while fewer than the configured maximum happened inside
/// the window.
#[derive(Clone)]
pub struct SlidingWindowLimiter {
    state: Arc<Mutex<WindowState>>,
}

struct WindowState {
    max_operations: usize,
    window: Duration,
    operations: Vec<Instant>,
}

impl SlidingWindowLimiter {
    /// Create a limiter allowing `max_operations` per `window`.
    pub fn new(max_operations: usize, window: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(WindowState {
                max_operations,
                window,
                operations: Vec::new(),
            })),
        }
    }

    /// Record and admit an operation if the window has room.
    pub async fn check(&self) -> bool {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        let window = state.window;

        state
            .operations
            .retain(|&t| now.duration_since(t) < window);

        if state.operations.len() < state.max_operations {
            state.operations.push(now);
            true
        } else {
            false
        }
    }

    /// Operations currently inside the window.
    pub async fn count(&self) -> usize {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        let window = state.window;
        state
            .operations
            .retain(|&t| now.duration_since(t) < window);
        state.operations.len()
    }
}
