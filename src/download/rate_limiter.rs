//! Per-host rate limiting for asset requests.
//!
//! Requests to different hosts proceed in parallel; only requests to the
//! *same* host are spaced by the configured delay. A server-mandated pause
//! (`Retry-After`) pushes the host's next slot further out.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use comic_dl_core::download::RateLimiter;
//!
//! # async fn example() {
//! let limiter = Arc::new(RateLimiter::new(Duration::from_millis(200)));
//! limiter.acquire("https://img.example.com/1.jpg").await; // immediate
//! limiter.acquire("https://img.example.com/2.jpg").await; // waits ~200ms
//! limiter.acquire("https://cdn.other.com/1.jpg").await;   // immediate
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use super::constants::{CUMULATIVE_DELAY_WARNING_THRESHOLD, MAX_RETRY_AFTER};

/// Per-host rate limiter, shared behind an `Arc` by every asset task.
#[derive(Debug)]
pub struct RateLimiter {
    default_delay: Duration,
    disabled: bool,
    /// Arc'd so the `DashMap` shard lock is released before awaiting the inner mutex.
    hosts: DashMap<String, Arc<HostState>>,
}

#[derive(Debug)]
struct HostState {
    /// Earliest instant the next request may start; `None` before the first request.
    next_allowed: Mutex<Option<Instant>>,
    /// Total time requests to this host have spent waiting.
    waited_ms: AtomicU64,
}

impl HostState {
    fn new() -> Self {
        Self {
            next_allowed: Mutex::new(None),
            waited_ms: AtomicU64::new(0),
        }
    }

    fn note_wait(&self, wait: Duration) -> Duration {
        let wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX);
        let before = self.waited_ms.fetch_add(wait_ms, Ordering::Relaxed);
        Duration::from_millis(before.saturating_add(wait_ms))
    }
}

impl RateLimiter {
    /// Creates a limiter spacing same-host requests by `default_delay`.
    #[must_use]
    #[instrument(skip_all, fields(delay_ms = default_delay.as_millis()))]
    pub fn new(default_delay: Duration) -> Self {
        debug!("per-host limiter ready");
        Self {
            default_delay,
            disabled: default_delay.is_zero(),
            hosts: DashMap::new(),
        }
    }

    /// Creates a limiter that never delays.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            default_delay: Duration::ZERO,
            disabled: true,
            hosts: DashMap::new(),
        }
    }

    /// True when no spacing is applied at all.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Waits until a request to `url`'s host is allowed, then claims the slot.
    ///
    /// The first request to any host proceeds immediately.
    #[instrument(skip(self), fields(host))]
    pub async fn acquire(&self, url: &str) {
        if self.disabled {
            return;
        }

        let host = extract_host(url);
        tracing::Span::current().record("host", &host);
        let state = self.state_for(&host);

        let mut next_allowed = state.next_allowed.lock().await;
        if let Some(at) = *next_allowed {
            let now = Instant::now();
            if at > now {
                let wait = at - now;
                let waited = state.note_wait(wait);
                debug!(
                    host = %host,
                    wait_ms = wait.as_millis(),
                    waited_ms = waited.as_millis(),
                    "waiting for host slot"
                );
                if waited >= CUMULATIVE_DELAY_WARNING_THRESHOLD {
                    warn!(
                        host = %host,
                        waited_secs = waited.as_secs(),
                        "excessive rate limiting - consider a lower asset concurrency"
                    );
                }
                tokio::time::sleep_until(at).await;
            }
        }
        *next_allowed = Some(Instant::now() + self.default_delay);
    }

    /// Records a server-mandated pause for `url`'s host.
    #[instrument(skip(self), fields(host))]
    pub async fn record_rate_limit(&self, url: &str, delay: Duration) {
        if self.disabled {
            return;
        }

        let host = extract_host(url);
        tracing::Span::current().record("host", &host);
        let state = self.state_for(&host);

        let until = Instant::now() + delay.min(MAX_RETRY_AFTER);
        let mut next_allowed = state.next_allowed.lock().await;
        if next_allowed.is_none_or(|at| at < until) {
            *next_allowed = Some(until);
        }
        debug!(host = %host, delay_ms = delay.as_millis(), "recorded server rate limit");
    }

    fn state_for(&self, host: &str) -> Arc<HostState> {
        self.hosts
            .entry(host.to_string())
            .or_insert_with(|| Arc::new(HostState::new()))
            .clone()
    }
}

/// Extracts the lowercase host from a URL, or `"unknown"` when unparseable.
#[must_use]
pub fn extract_host(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_ascii_lowercase))
        .unwrap_or_else(|| String::from("unknown"))
}

/// Parses a `Retry-After` header value (seconds or HTTP-date).
///
/// Returns `None` when unparseable; caps values at one hour; a past date
/// yields zero.
///
/// ```
/// use std::time::Duration;
/// use comic_dl_core::download::parse_retry_after;
///
/// assert_eq!(parse_retry_after("120"), Some(Duration::from_secs(120)));
/// assert_eq!(parse_retry_after("soon"), None);
/// ```
#[must_use]
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();

    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds).min(MAX_RETRY_AFTER));
    }

    match httpdate::parse_http_date(value) {
        Ok(datetime) => Some(
            datetime
                .duration_since(std::time::SystemTime::now())
                .map_or(Duration::ZERO, |d| d.min(MAX_RETRY_AFTER)),
        ),
        Err(_) => {
            debug!(value, "ignoring malformed Retry-After");
            None
        }
    }
}
