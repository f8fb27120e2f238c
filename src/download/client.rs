//! HTTP asset fetcher with streaming writes, retry and per-host pacing.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::{CONTENT_LENGTH, RETRY_AFTER};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::DownloadError;
use super::filename::{asset_file_name, part_path};
use super::rate_limiter::{RateLimiter, parse_retry_after};
use super::retry::{DEFAULT_MAX_RETRIES, FailureType, RetryDecision, RetryPolicy, classify_error};
use crate::user_agent::default_asset_user_agent;

/// Saves one remote asset into a directory.
///
/// Implementations must stream to disk and never leave a partially written
/// file under the final name.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Fetches `url` into `dest_dir` and returns the saved file name.
    ///
    /// `fixed_name` replaces the file stem derived from the URL.
    async fn fetch(
        &self,
        url: &str,
        dest_dir: &Path,
        fixed_name: Option<&str>,
    ) -> Result<String, DownloadError>;
}

/// Transport settings for [`HttpFetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetcherConfig {
    /// TCP/TLS connect timeout.
    pub connect_timeout_secs: u64,
    /// Whole-request timeout (headers and body).
    pub read_timeout_secs: u64,
    /// Maximum attempts per asset, including the first.
    pub max_retries: u32,
    /// Minimum spacing between requests to one host; 0 disables.
    pub rate_limit_ms: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            rate_limit_ms: 0,
        }
    }
}

/// Default [`AssetFetcher`] backed by a pooled reqwest client.
///
/// Create once and share behind an `Arc`; connections are reused across assets.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    retry_policy: RetryPolicy,
    rate_limiter: Arc<RateLimiter>,
}

impl HttpFetcher {
    /// Builds a fetcher from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Network`] if the HTTP client cannot be built.
    pub fn new(config: &FetcherConfig) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.read_timeout_secs))
            .user_agent(default_asset_user_agent())
            .gzip(true)
            .build()
            .map_err(|e| DownloadError::network("<client>", e))?;

        let rate_limiter = if config.rate_limit_ms == 0 {
            RateLimiter::disabled()
        } else {
            RateLimiter::new(Duration::from_millis(config.rate_limit_ms))
        };

        Ok(Self {
            client,
            retry_policy: RetryPolicy::with_max_attempts(config.max_retries),
            rate_limiter: Arc::new(rate_limiter),
        })
    }

    /// Replaces the retry policy (tests use zero-delay policies).
    #[must_use]
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// One attempt: request, stream into a part file, sync, rename.
    async fn fetch_once(
        &self,
        url: &str,
        dest_dir: &Path,
        file_name: &str,
    ) -> Result<(), DownloadError> {
        self.rate_limiter.acquire(url).await;

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                DownloadError::timeout(url)
            } else {
                DownloadError::network(url, e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string);
            return Err(DownloadError::http_status_with_retry_after(
                url,
                status.as_u16(),
                retry_after,
            ));
        }

        let expected_len = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        let part = part_path(dest_dir, file_name);
        let final_path = dest_dir.join(file_name);

        let result = async {
            let mut file = File::create(&part)
                .await
                .map_err(|e| DownloadError::io(&part, e))?;
            let written = stream_to_file(&mut file, response, url, &part).await?;
            if let Some(expected) = expected_len.filter(|expected| *expected != written) {
                return Err(DownloadError::truncated(url, expected, written));
            }
            file.sync_all()
                .await
                .map_err(|e| DownloadError::io(&part, e))?;
            drop(file);
            tokio::fs::rename(&part, &final_path)
                .await
                .map_err(|e| DownloadError::io(&final_path, e))?;
            Ok::<u64, DownloadError>(written)
        }
        .await;

        match result {
            Ok(bytes) => {
                debug!(path = %final_path.display(), bytes, "asset saved");
                Ok(())
            }
            Err(error) => {
                debug!(path = %part.display(), "cleaning up partial file after error");
                let _ = tokio::fs::remove_file(&part).await;
                Err(error)
            }
        }
    }
}

#[async_trait]
impl AssetFetcher for HttpFetcher {
    #[instrument(skip(self, dest_dir), fields(dest = %dest_dir.display()))]
    async fn fetch(
        &self,
        url: &str,
        dest_dir: &Path,
        fixed_name: Option<&str>,
    ) -> Result<String, DownloadError> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(DownloadError::invalid_url(url));
        }
        let parsed = Url::parse(trimmed).map_err(|_| DownloadError::invalid_url(url))?;
        let file_name = asset_file_name(&parsed, fixed_name);

        let mut attempt = 1;
        loop {
            let error = match self.fetch_once(trimmed, dest_dir, &file_name).await {
                Ok(()) => return Ok(file_name),
                Err(error) => error,
            };

            let failure_type = classify_error(&error);
            match self.retry_policy.should_retry(failure_type, attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next,
                } => {
                    let delay = match (&error, failure_type) {
                        (
                            DownloadError::HttpStatus {
                                retry_after: Some(value),
                                ..
                            },
                            FailureType::RateLimited,
                        ) => {
                            let server_delay = parse_retry_after(value).unwrap_or(delay);
                            self.rate_limiter.record_rate_limit(trimmed, server_delay).await;
                            server_delay.max(delay)
                        }
                        _ => delay,
                    };
                    warn!(
                        url = trimmed,
                        attempt,
                        delay_ms = delay.as_millis(),
                        error = %error,
                        "asset fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt = next;
                }
                RetryDecision::DoNotRetry { reason } => {
                    info!(url = trimmed, attempt, %reason, error = %error, "asset fetch failed");
                    return Err(error);
                }
            }
        }
    }
}

/// Streams the response body into `file`, returning bytes written.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| {
            if e.is_timeout() {
                DownloadError::timeout(url)
            } else {
                DownloadError::network(url, e)
            }
        })?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path, e))?;
        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;
    Ok(bytes_written)
}
