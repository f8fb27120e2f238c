//! Shared HTTP client policy for catalog page requests.
//!
//! Adapters fetch small HTML pages; they share one timeout, user-agent and
//! compression policy so site adapters stay consistent.

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use super::CatalogError;
use crate::user_agent::BROWSER_USER_AGENT;

const CONNECT_TIMEOUT_SECS: u64 = 10;
const READ_TIMEOUT_SECS: u64 = 30;

/// HTTP client for catalog and chapter pages.
#[derive(Debug, Clone)]
pub(crate) struct PageClient {
    client: Client,
}

impl PageClient {
    /// Builds a page client with the shared catalog policy.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Fetch`] when the underlying client cannot be built.
    pub(crate) fn new(adapter_name: &str) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
            .user_agent(BROWSER_USER_AGENT)
            .gzip(true)
            .build()
            .map_err(|e| {
                CatalogError::fetch(adapter_name, format!("HTTP client construction failed: {e}"))
            })?;
        Ok(Self { client })
    }

    /// Fetches a page body as text.
    ///
    /// Redirects are followed; the final URL is returned alongside the body so
    /// relative links can be resolved against it.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Fetch`] for transport failures and non-2xx statuses.
    pub(crate) async fn get_text(&self, url: &str) -> Result<(String, url::Url), CatalogError> {
        debug!(url, "fetching catalog page");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CatalogError::fetch(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::fetch(url, format!("HTTP {}", status.as_u16())));
        }

        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| CatalogError::fetch(url, e.to_string()))?;
        Ok((body, final_url))
    }
}
