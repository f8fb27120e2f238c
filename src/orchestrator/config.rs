//! Run configuration, requests and ignore rules.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::RunError;
use crate::catalog::{BookInfo, Chapter};
use crate::pool::{MAX_CONCURRENCY, MIN_CONCURRENCY};

/// Default number of chapters downloaded at once.
pub const DEFAULT_CHAPTER_CONCURRENCY: usize = 6;

/// Default number of assets downloaded at once within one chapter.
pub const DEFAULT_ASSET_CONCURRENCY: usize = 10;

/// Tuning for one orchestrator.
///
/// At most `chapter_concurrency * asset_concurrency` asset transfers are in
/// flight at any time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Chapter tasks in flight.
    pub chapter_concurrency: usize,
    /// Asset transfers in flight per chapter task.
    pub asset_concurrency: usize,
    /// Prune stale records on every run, not only after an interrupted one.
    pub always_reconcile: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            chapter_concurrency: DEFAULT_CHAPTER_CONCURRENCY,
            asset_concurrency: DEFAULT_ASSET_CONCURRENCY,
            always_reconcile: false,
        }
    }
}

impl RunConfig {
    /// Checks both concurrency limits are within `1..=100`.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> Result<(), RunError> {
        for (field, value) in [
            ("chapter_concurrency", self.chapter_concurrency),
            ("asset_concurrency", self.asset_concurrency),
        ] {
            if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&value) {
                return Err(RunError::InvalidConfig {
                    field,
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// User rule excluding a whole book or some of its chapters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IgnoreRule {
    /// Book name (display name or directory name).
    pub name: String,
    /// Chapter names or titles to skip; `None` skips the whole book.
    #[serde(default)]
    pub chapters: Option<Vec<String>>,
}

impl IgnoreRule {
    /// True if this rule is about `book`.
    #[must_use]
    pub fn matches_book(&self, book: &BookInfo) -> bool {
        self.name == book.name || self.name == book.path_name
    }

    /// True if the rule skips every chapter of the book.
    #[must_use]
    pub fn ignores_whole_book(&self) -> bool {
        self.chapters.is_none()
    }

    /// True if `chapter` is listed by name or title.
    #[must_use]
    pub fn ignores_chapter(&self, chapter: &Chapter) -> bool {
        self.chapters.as_ref().is_none_or(|listed| {
            listed
                .iter()
                .any(|entry| *entry == chapter.name || *entry == chapter.raw_name)
        })
    }
}

/// Input of one orchestrator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    /// Catalog URL of the book.
    pub target_ref: String,
    /// Directory that holds one sub-directory per book.
    pub destination_root: PathBuf,
    /// Optional ignore rules; only the one matching the book applies.
    pub ignore: Vec<IgnoreRule>,
}

impl RunRequest {
    /// Creates a request without ignore rules.
    #[must_use]
    pub fn new(target_ref: impl Into<String>, destination_root: impl Into<PathBuf>) -> Self {
        Self {
            target_ref: target_ref.into(),
            destination_root: destination_root.into(),
            ignore: Vec::new(),
        }
    }

    /// Adds ignore rules.
    #[must_use]
    pub fn with_ignore(mut self, ignore: Vec<IgnoreRule>) -> Self {
        self.ignore = ignore;
        self
    }
}
