//! Asset transfer failures.
//!
//! Every variant names the asset URL or the file it concerns, so the
//! orchestrator can turn any failure into an error record as is.

use std::path::PathBuf;

use thiserror::Error;

/// Why one asset could not be saved.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Connection, DNS or TLS failure, or the body stream broke off.
    #[error("cannot reach {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Connect or read deadline passed.
    #[error("timeout fetching {url}")]
    Timeout { url: String },

    /// Server answered with a non-2xx status.
    #[error("HTTP {status} for {url}")]
    HttpStatus {
        url: String,
        status: u16,
        /// Raw `Retry-After` header, kept for 429 handling.
        retry_after: Option<String>,
    },

    /// Creating, writing, syncing or renaming the file failed.
    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Empty or unparsable asset URL; nothing was requested.
    #[error("invalid URL: '{url}'")]
    InvalidUrl { url: String },

    /// Fewer bytes arrived than `Content-Length` announced.
    #[error("{url} ended early: {received} of {announced} bytes")]
    Truncated {
        url: String,
        announced: u64,
        received: u64,
    },
}

impl DownloadError {
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::http_status_with_retry_after(url, status, None)
    }

    /// Status error carrying the server's `Retry-After` value.
    pub fn http_status_with_retry_after(
        url: impl Into<String>,
        status: u16,
        retry_after: Option<String>,
    ) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
            retry_after,
        }
    }

    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    pub fn truncated(url: impl Into<String>, announced: u64, received: u64) -> Self {
        Self::Truncated {
            url: url.into(),
            announced,
            received,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ASSET: &str = "https://img.example.com/0001.jpg";

    #[test]
    fn test_http_status_names_asset_and_status() {
        let msg = DownloadError::http_status(ASSET, 404).to_string();
        assert!(msg.contains("HTTP 404"), "Expected status in: {msg}");
        assert!(msg.contains(ASSET), "Expected URL in: {msg}");
    }

    #[test]
    fn test_http_status_has_no_retry_after_by_default() {
        let error = DownloadError::http_status(ASSET, 429);
        assert!(matches!(
            error,
            DownloadError::HttpStatus {
                retry_after: None,
                ..
            }
        ));
    }

    #[test]
    fn test_io_names_path() {
        let source = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let msg = DownloadError::io("/books/A/chapters/0_x/1.jpg", source).to_string();
        assert!(msg.contains("/books/A/chapters/0_x/1.jpg"), "Expected path in: {msg}");
    }

    #[test]
    fn test_invalid_url_quotes_empty_url() {
        let msg = DownloadError::invalid_url("").to_string();
        assert!(msg.contains("''"), "Expected quoted empty URL in: {msg}");
    }

    #[test]
    fn test_truncated_reports_both_sizes() {
        let msg = DownloadError::truncated(ASSET, 100, 40).to_string();
        assert!(msg.contains("40 of 100"), "Expected sizes in: {msg}");
    }
}
