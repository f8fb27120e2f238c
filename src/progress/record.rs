//! Progress records and per-run counters.

use serde::{Deserialize, Serialize};

use crate::catalog::{AssetRef, Chapter};

/// One fully downloaded chapter as stored in `progress.json`.
///
/// Carries a copy of the chapter's identity and its saved assets, so a
/// resumed run never has to resolve this chapter again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    /// Chapter directory name (`<index>_<title>`).
    pub name: String,
    /// Title as the source displayed it.
    pub raw_name: String,
    /// Chapter locator at the time it was downloaded.
    pub href: String,
    /// Catalog position at the time it was downloaded.
    pub index: usize,
    /// Saved assets with paths relative to the book directory.
    #[serde(default)]
    pub assets: Vec<AssetRef>,
}

impl ProgressRecord {
    /// Builds the record for a chapter whose assets were all saved.
    #[must_use]
    pub fn from_chapter(chapter: &Chapter, assets: Vec<AssetRef>) -> Self {
        Self {
            name: chapter.name.clone(),
            raw_name: chapter.raw_name.clone(),
            href: chapter.href.clone(),
            index: chapter.index,
            assets,
        }
    }

    /// True if this record already covers `chapter`.
    ///
    /// Both the locator and the title must match: a republished chapter
    /// can keep its URL while its content changes.
    #[must_use]
    pub fn matches_chapter(&self, chapter: &Chapter) -> bool {
        self.href == chapter.href && self.raw_name == chapter.raw_name
    }

    /// True if `chapter` still exists unchanged, name included.
    ///
    /// Used for stale-record pruning, where a shifted index also means the
    /// on-disk directory no longer lines up with the catalog.
    #[must_use]
    pub fn same_identity(&self, chapter: &Chapter) -> bool {
        self.matches_chapter(chapter) && self.name == chapter.name
    }

    /// Directory of this chapter relative to the book directory.
    #[must_use]
    pub fn relative_dir(&self) -> String {
        format!("chapters/{}", self.name)
    }
}

/// Counters computed when the store is loaded; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunState {
    /// Records present in the store.
    pub completed: usize,
    /// Chapters in the current catalog.
    pub total: usize,
    /// A previous run stopped part way.
    pub interrupted: bool,
}

impl RunState {
    /// Derives the state from the loaded record count and the catalog size.
    ///
    /// Any non-zero count that differs from the catalog size counts as
    /// interrupted, including a catalog that shrank below the recorded count.
    #[must_use]
    pub fn at_load(completed: usize, total: usize) -> Self {
        Self {
            completed,
            total,
            interrupted: completed > 0 && completed != total,
        }
    }

    /// True if every catalog chapter is already recorded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed == self.total
    }
}
