//! Run results, error records and progress callbacks.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::catalog::{BookInfo, CatalogError, Chapter};
use crate::progress::StoreError;

/// Errors that abort a run after it started.
///
/// Asset and chapter failures never surface here; they become
/// [`ErrorRecord`]s inside [`RunOutcome::CompleteWithErrors`].
#[derive(Debug, Error)]
pub enum RunError {
    /// A configuration value is out of range.
    #[error("invalid {field}: {value} (must be between 1 and 100)")]
    InvalidConfig {
        /// Which setting.
        field: &'static str,
        /// The rejected value.
        value: String,
    },

    /// Directory creation or progress persistence failed.
    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// One failed asset, or one chapter whose asset list could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    /// Book the failure belongs to.
    pub book_name: String,
    /// Identity of the chapter (assets cleared).
    pub chapter: Chapter,
    /// Failed asset, or `None` when the chapter's asset list itself failed.
    pub asset_url: Option<String>,
    /// Human-readable cause.
    pub reason: String,
}

/// Terminal state of one run.
#[derive(Debug)]
pub enum RunOutcome {
    /// The catalog could not be resolved; nothing was written.
    CatalogParseFailed {
        /// Target as requested.
        target_ref: String,
        /// Why resolution failed.
        error: CatalogError,
    },

    /// Nothing left to do; no chapter was attempted.
    AlreadyComplete {
        /// Book display name.
        book_name: String,
        /// Book directory (may not exist for a wholly ignored book).
        book_dir: PathBuf,
    },

    /// Every attempted chapter finished cleanly.
    AllComplete {
        /// Book display name.
        book_name: String,
        /// Book directory.
        book_dir: PathBuf,
        /// Chapters attempted this run, in catalog order.
        attempted: Vec<Chapter>,
    },

    /// The run finished but some chapters or assets failed.
    CompleteWithErrors {
        /// Book display name.
        book_name: String,
        /// Book directory.
        book_dir: PathBuf,
        /// Chapters attempted this run, in catalog order.
        attempted: Vec<Chapter>,
        /// Every failure, one per asset or unresolved chapter.
        errors: Vec<ErrorRecord>,
    },
}

impl RunOutcome {
    /// True for `AlreadyComplete` and `AllComplete`.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::AlreadyComplete { .. } | Self::AllComplete { .. })
    }

    /// Error records of the run; empty unless `CompleteWithErrors`.
    #[must_use]
    pub fn errors(&self) -> &[ErrorRecord] {
        match self {
            Self::CompleteWithErrors { errors, .. } => errors,
            _ => &[],
        }
    }

    /// Chapters attempted this run; `None` for the short-circuit outcomes.
    #[must_use]
    pub fn attempted(&self) -> Option<&[Chapter]> {
        match self {
            Self::AllComplete { attempted, .. } | Self::CompleteWithErrors { attempted, .. } => {
                Some(attempted)
            }
            Self::CatalogParseFailed { .. } | Self::AlreadyComplete { .. } => None,
        }
    }
}

/// Callbacks fired as a run progresses. All methods default to no-ops.
///
/// `chapter_finished` is called from concurrent chapter tasks.
pub trait RunObserver: Send + Sync {
    /// The catalog could not be resolved.
    fn catalog_resolution_failed(&self, _target_ref: &str, _error: &CatalogError) {}

    /// Reports whether a previous run of this book stopped part way.
    fn run_was_interrupted(&self, _interrupted: bool) {}

    /// Chapter tasks are about to start.
    fn run_started(&self, _book: &BookInfo, _remaining: usize) {}

    /// One chapter task finished; `recorded` is true if it was added to progress.
    fn chapter_finished(&self, _chapter: &Chapter, _recorded: bool) {}

    /// The run finished with at least one error record.
    fn run_finished_with_errors(
        &self,
        _book: &BookInfo,
        _attempted: &[Chapter],
        _errors: &[ErrorRecord],
    ) {
    }

    /// The run finished cleanly; `attempted` is `None` for an already complete book.
    fn run_finished_success(
        &self,
        _book_name: &str,
        _book_dir: &Path,
        _attempted: Option<&[Chapter]>,
    ) {
    }
}

/// Observer that ignores every callback.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}
