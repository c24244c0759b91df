// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fixed-window rate limiter for contact submissions.
//!
//! Each client identifier owns at most one window entry. The first request
//! opens a window of `window` length; requests inside it count up to the
//! configured maximum; the first request after the window closes replaces
//! the entry with a fresh one. Expired entries are dropped by a sweeper task
//! whose lifetime is owned by the caller through [`SweeperHandle`].
//!
//! State is per process. Several instances behind a load balancer each keep
//! their own windows, so the effective limit scales with the instance count.

use crate::clock::{Clock, SystemClock};
use crate::config::{RateLimitConfig, MAX_SWEEP_INTERVAL_SECS};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, RwLock};
use tokio::task::JoinHandle;
use tracing::debug;

/// Result of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Request is allowed
    Allowed {
        /// Remaining requests in current window
        remaining: u32,
        /// When the current window closes
        reset_at: DateTime<Utc>,
    },
    /// Request is rate limited
    Limited {
        /// When the current window closes
        reset_at: DateTime<Utc>,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed { .. })
    }

    /// Requests left in the window; zero once limited.
    pub fn remaining(&self) -> u32 {
        match self {
            RateLimitResult::Allowed { remaining, .. } => *remaining,
            RateLimitResult::Limited { .. } => 0,
        }
    }

    pub fn reset_at(&self) -> DateTime<Utc> {
        match self {
            RateLimitResult::Allowed { reset_at, .. } | RateLimitResult::Limited { reset_at } => {
                *reset_at
            }
        }
    }

    /// Window end as Unix epoch milliseconds.
    pub fn reset_time_ms(&self) -> i64 {
        self.reset_at().timestamp_millis()
    }

    /// Whole seconds until the window closes, rounded up.
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> u64 {
        let millis = (self.reset_at() - now).num_milliseconds().max(0) as u64;
        millis.div_ceil(1000)
    }
}

/// `now + window`, saturating at the latest representable instant.
fn window_end(now: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(window)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Request count for one identifier inside one window.
#[derive(Debug, Clone, Copy)]
struct RateLimitEntry {
    count: u32,
    reset_at: DateTime<Utc>,
}

/// Thread-safe fixed-window rate limiter.
pub struct RateLimiter {
    /// Configuration
    config: RateLimitConfig,
    /// Time source for window arithmetic
    clock: Arc<dyn Clock>,
    /// Identifier -> current window
    entries: RwLock<HashMap<String, RateLimitEntry>>,
}

impl RateLimiter {
    /// Create a new rate limiter on the system clock.
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a rate limiter on a caller-provided clock.
    pub fn with_clock(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Check an identifier against the configured limit and window.
    pub async fn check(&self, identifier: &str) -> RateLimitResult {
        self.check_with(
            identifier,
            self.config.max_requests,
            self.config.window_duration(),
        )
        .await
    }

    /// Count one request for `identifier` against `max_requests` per `window`.
    ///
    /// The whole read-modify-write happens under one write lock, so
    /// concurrent checks for the same identifier are serialized.
    pub async fn check_with(
        &self,
        identifier: &str,
        max_requests: u32,
        window: Duration,
    ) -> RateLimitResult {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;

        if let Some(entry) = entries.get_mut(identifier) {
            if now <= entry.reset_at {
                if entry.count >= max_requests {
                    debug!(identifier, count = entry.count, "Rate limit exceeded");
                    return RateLimitResult::Limited {
                        reset_at: entry.reset_at,
                    };
                }
                entry.count += 1;
                return RateLimitResult::Allowed {
                    remaining: max_requests.saturating_sub(entry.count),
                    reset_at: entry.reset_at,
                };
            }
        }

        // New identifier or closed window: replace, never merge.
        let reset_at = window_end(now, window);
        entries.insert(
            identifier.to_string(),
            RateLimitEntry { count: 1, reset_at },
        );
        RateLimitResult::Allowed {
            remaining: max_requests.saturating_sub(1),
            reset_at,
        }
    }

    /// Remove every entry whose window has closed. Returns how many went.
    pub async fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| now <= entry.reset_at);
        before - entries.len()
    }

    /// Number of tracked identifiers.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Start the periodic sweep on the current Tokio runtime.
    ///
    /// The first sweep runs one `interval` after the call. The interval is
    /// capped at [`MAX_SWEEP_INTERVAL_SECS`]. The task stops when the handle
    /// is stopped or dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> SweeperHandle {
        let interval = interval.min(Duration::from_secs(MAX_SWEEP_INTERVAL_SECS));
        let limiter = Arc::clone(self);
        let (shutdown, mut stopped) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = limiter.sweep().await;
                        if removed > 0 {
                            debug!(removed, "Swept expired rate limit entries");
                        }
                    }
                    _ = &mut stopped => break,
                }
            }
        });

        SweeperHandle {
            shutdown: Some(shutdown),
            task,
        }
    }
}

/// Owner of a running sweeper task.
pub struct SweeperHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signal the sweeper and wait for it to exit.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        let _ = (&mut self.task).await;
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
