//! Download orchestrator: resume-aware run for one book.
//!
//! A run moves through `Init -> CatalogResolved -> Reconciled -> Running ->
//! Finalized`:
//!
//! 1. The adapter resolves the catalog. Failure ends the run with
//!    [`RunOutcome::CatalogParseFailed`] before anything is written.
//! 2. `progress.json` is loaded. A complete book short-circuits with
//!    [`RunOutcome::AlreadyComplete`]. After an interrupted run, records whose
//!    chapter no longer appears in the catalog are pruned with their
//!    directories. Remaining chapters are those without a record matching
//!    both href and title, minus ignored ones.
//! 3. Remaining chapters run in a bounded pool; each resolves its assets and
//!    fetches them in its own bounded pool. A chapter is recorded only when
//!    every asset succeeded.
//! 4. `bookInfo.json` is written and the outcome reports every error.
//!
//! Only storage failures abort a run ([`RunError::Storage`]).

mod chapter_task;
mod config;
mod outcome;
mod runner;

pub use config::{
    DEFAULT_ASSET_CONCURRENCY, DEFAULT_CHAPTER_CONCURRENCY, IgnoreRule, RunConfig, RunRequest,
};
pub use outcome::{ErrorRecord, NoopObserver, RunError, RunObserver, RunOutcome};
pub use runner::BookDownloader;
