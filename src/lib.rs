//! Comic Downloader Core Library
//!
//! This library fetches a book (ordered chapters made of ordered image
//! assets) from a remote source into a local directory, recording each fully
//! downloaded chapter so a later run only redoes what is missing.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`catalog`] - Book/chapter data model and per-source catalog adapters
//! - [`download`] - Streaming asset fetcher with retry and per-host rate limiting
//! - [`pool`] - Bounded work pool that runs every task and collects every outcome
//! - [`progress`] - Durable `progress.json` store of completed chapters
//! - [`orchestrator`] - Resume-aware download run for one book
//! - [`library`] - Scanning previously downloaded books for update runs

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod download;
pub mod library;
pub mod orchestrator;
mod persist;
pub mod pool;
pub mod progress;
#[cfg(test)]
pub mod test_support;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use catalog::{
    AdapterRegistry, AssetRef, BaoziAdapter, BookInfo, CatalogAdapter, CatalogError, Chapter,
    GodamangaAdapter, build_default_adapter_registry, sanitize_path_name,
};
pub use download::{
    AssetFetcher, DEFAULT_MAX_RETRIES, DownloadError, FailureType, FetcherConfig, HttpFetcher,
    RateLimiter, RetryDecision, RetryPolicy, classify_error,
};
pub use library::{BOOK_INFO_FILE_NAME, read_book_info, scan_books, write_book_info};
pub use orchestrator::{
    BookDownloader, DEFAULT_ASSET_CONCURRENCY, DEFAULT_CHAPTER_CONCURRENCY, ErrorRecord,
    IgnoreRule, NoopObserver, RunConfig, RunError, RunObserver, RunOutcome, RunRequest,
};
pub use pool::{BoundedPool, MAX_CONCURRENCY, MIN_CONCURRENCY, PoolError};
pub use progress::{PROGRESS_FILE_NAME, ProgressRecord, ProgressStore, RunState, StoreError};
