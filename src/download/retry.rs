//! Retry logic with exponential backoff for transient asset failures.
//!
//! A failed transfer is classified into a [`FailureType`]; the
//! [`RetryPolicy`] then decides whether another attempt is worthwhile and how
//! long to wait first. Every attempt starts from scratch.
//!
//! # Example
//!
//! ```
//! use comic_dl_core::download::{
//!     DownloadError, RetryPolicy, RetryDecision, classify_error
//! };
//!
//! let policy = RetryPolicy::default();
//! let error = DownloadError::http_status("https://img.example.com/1.jpg", 503);
//!
//! match policy.should_retry(classify_error(&error), 1) {
//!     RetryDecision::Retry { delay, attempt } => {
//!         println!("Retrying in {delay:?} (attempt {attempt})");
//!     }
//!     RetryDecision::DoNotRetry { reason } => {
//!         println!("Not retrying: {reason}");
//!     }
//! }
//! ```

use std::time::Duration;

use rand::Rng;
use tracing::{debug, instrument};

use super::DownloadError;

/// Default maximum attempts per asset (including the first).
pub const DEFAULT_MAX_RETRIES: u32 = 3;

const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(32);
const DEFAULT_BACKOFF_MULTIPLIER: f32 = 2.0;
const MAX_JITTER: Duration = Duration::from_millis(500);

/// How an asset failure should be treated by the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Temporary failure that may succeed on retry (timeouts, 5xx, resets).
    Transient,

    /// Failure that will not succeed regardless of retries (404, bad URL, disk).
    Permanent,

    /// HTTP 429; the host asked us to slow down.
    RateLimited,
}

/// Outcome of [`RetryPolicy::should_retry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the specified delay.
    Retry {
        /// Pause before the next attempt.
        delay: Duration,
        /// Attempt number of the retry (1-indexed, so first retry is attempt 2).
        attempt: u32,
    },

    /// Give up.
    DoNotRetry {
        /// Human-readable reason.
        reason: String,
    },
}

/// Exponential backoff configuration.
///
/// ```text
/// delay = min(base_delay * multiplier^(attempt-1), max_delay) + jitter
/// ```
///
/// With defaults delays are roughly 1s, 2s before the third attempt fails for good.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    backoff_multiplier: f32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with custom settings. `max_attempts` is at least 1.
    #[must_use]
    pub fn new(
        max_attempts: u32,
        base_delay: Duration,
        max_delay: Duration,
        backoff_multiplier: f32,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
            backoff_multiplier,
        }
    }

    /// Creates a policy with a custom `max_attempts`, defaults otherwise.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Attempts allowed per asset, the first one included.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Determines whether to retry after `attempt` (1-indexed) failed.
    #[instrument(skip(self), fields(max_attempts = self.max_attempts))]
    pub fn should_retry(&self, failure_type: FailureType, attempt: u32) -> RetryDecision {
        if failure_type == FailureType::Permanent {
            return RetryDecision::DoNotRetry {
                reason: "failure is permanent".to_string(),
            };
        }

        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "asset out of attempts");
            return RetryDecision::DoNotRetry {
                reason: format!("all {} attempts exhausted", self.max_attempts),
            };
        }

        let delay = self.calculate_delay(attempt);
        debug!(
            attempt,
            next_attempt = attempt + 1,
            delay_ms = delay.as_millis(),
            "scheduling another attempt"
        );
        RetryDecision::Retry {
            delay,
            attempt: attempt + 1,
        }
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let growth = f64::from(self.backoff_multiplier).powi(attempt.saturating_sub(1) as i32);
        let backoff_ms = (self.base_delay.as_millis() as f64 * growth)
            .min(self.max_delay.as_millis() as f64) as u64;

        let jitter = rand::thread_rng().gen_range(0..=MAX_JITTER.as_millis() as u64);
        Duration::from_millis(backoff_ms.saturating_add(jitter))
    }
}

/// Maps an asset error onto a [`FailureType`].
///
/// | Error | Type |
/// |-------|------|
/// | 408, 5xx | Transient |
/// | 429 | RateLimited |
/// | other 4xx | Permanent |
/// | Timeout, Network (non-TLS), Truncated | Transient |
/// | Network (TLS) | Permanent |
/// | Io, InvalidUrl | Permanent |
#[instrument]
pub fn classify_error(error: &DownloadError) -> FailureType {
    match error {
        DownloadError::HttpStatus { status, .. } => classify_http_status(*status),
        DownloadError::Timeout { .. } | DownloadError::Truncated { .. } => FailureType::Transient,
        DownloadError::Network { source, .. } if looks_like_tls(source) => FailureType::Permanent,
        DownloadError::Network { .. } => FailureType::Transient,
        DownloadError::Io { .. } | DownloadError::InvalidUrl { .. } => FailureType::Permanent,
    }
}

fn classify_http_status(status: u16) -> FailureType {
    match status {
        429 => FailureType::RateLimited,
        408 | 500..=599 => FailureType::Transient,
        _ => FailureType::Permanent,
    }
}

/// Certificate and handshake problems do not heal between attempts.
fn looks_like_tls(error: &reqwest::Error) -> bool {
    const MARKERS: [&str; 4] = ["certificate", "tls", "ssl", "handshake"];
    let text = error.to_string().to_lowercase();
    MARKERS.iter().any(|marker| text.contains(marker))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_default_policy_allows_three_attempts() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), DEFAULT_MAX_RETRIES);
        assert_eq!(policy.base_delay, DEFAULT_BASE_DELAY);
        assert_eq!(policy.max_delay, DEFAULT_MAX_DELAY);
    }

    #[test]
    fn test_zero_attempts_is_raised_to_one() {
        assert_eq!(RetryPolicy::with_max_attempts(0).max_attempts(), 1);
    }

    #[test]
    fn test_delay_grows_and_is_capped() {
        let policy = RetryPolicy::new(10, Duration::from_secs(1), Duration::from_secs(4), 2.0);
        let first = policy.calculate_delay(1);
        assert!(first >= Duration::from_secs(1) && first <= Duration::from_millis(1500));
        let second = policy.calculate_delay(2);
        assert!(second >= Duration::from_secs(2) && second <= Duration::from_millis(2500));
        let capped = policy.calculate_delay(8);
        assert!(capped >= Duration::from_secs(4) && capped <= Duration::from_millis(4500));
    }

    #[test]
    fn test_should_retry_transient_until_exhausted() {
        let policy = RetryPolicy::with_max_attempts(3);
        assert!(matches!(
            policy.should_retry(FailureType::Transient, 1),
            RetryDecision::Retry { attempt: 2, .. }
        ));
        assert!(matches!(
            policy.should_retry(FailureType::RateLimited, 2),
            RetryDecision::Retry { attempt: 3, .. }
        ));
        match policy.should_retry(FailureType::Transient, 3) {
            RetryDecision::DoNotRetry { reason } => {
                assert!(reason.contains("exhausted"), "Expected 'exhausted' in: {reason}");
            }
            other => panic!("Expected DoNotRetry, got: {other:?}"),
        }
    }

    #[test]
    fn test_should_not_retry_permanent() {
        let policy = RetryPolicy::default();
        assert!(matches!(
            policy.should_retry(FailureType::Permanent, 1),
            RetryDecision::DoNotRetry { .. }
        ));
    }

    #[test]
    fn test_classify_http_statuses() {
        let classify = |status| classify_error(&DownloadError::http_status("u", status));
        assert_eq!(classify(404), FailureType::Permanent);
        assert_eq!(classify(403), FailureType::Permanent);
        assert_eq!(classify(408), FailureType::Transient);
        assert_eq!(classify(429), FailureType::RateLimited);
        assert_eq!(classify(500), FailureType::Transient);
        assert_eq!(classify(503), FailureType::Transient);
        assert_eq!(classify(302), FailureType::Permanent);
    }

    #[test]
    fn test_classify_non_http_errors() {
        assert_eq!(
            classify_error(&DownloadError::timeout("u")),
            FailureType::Transient
        );
        assert_eq!(
            classify_error(&DownloadError::truncated("u", 10, 5)),
            FailureType::Transient
        );
        assert_eq!(
            classify_error(&DownloadError::invalid_url("")),
            FailureType::Permanent
        );
        let io = std::io::Error::other("disk full");
        assert_eq!(
            classify_error(&DownloadError::io(PathBuf::from("/tmp/x"), io)),
            FailureType::Permanent
        );
    }
}
