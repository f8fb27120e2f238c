//! Asset fetching: streaming HTTP downloads into a chapter directory.
//!
//! # Features
//!
//! - Streaming writes into a hidden `.part` file, synced then renamed, so a
//!   failed transfer never leaves a file under its final name
//! - Retry with exponential backoff for transient failures, honouring `Retry-After`
//! - Optional per-host request spacing
//! - Percent-decoded, filesystem-safe file names from the URL
//!
//! # Example
//!
//! ```no_run
//! use comic_dl_core::download::{AssetFetcher, FetcherConfig, HttpFetcher};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = HttpFetcher::new(&FetcherConfig::default())?;
//! let name = fetcher
//!     .fetch("https://img.example.com/0001.jpg", Path::new("./chapters/0_A"), None)
//!     .await?;
//! println!("saved {name}");
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod error;
mod filename;
pub mod rate_limiter;
mod retry;

pub use client::{AssetFetcher, FetcherConfig, HttpFetcher};
pub use error::DownloadError;
pub(crate) use filename::unique_asset_stems;
pub use rate_limiter::{RateLimiter, extract_host, parse_retry_after};
pub use retry::{DEFAULT_MAX_RETRIES, FailureType, RetryDecision, RetryPolicy, classify_error};
