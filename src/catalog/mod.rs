//! Book catalog model and per-source catalog adapters.
//!
//! A catalog is what a source says a book looks like right now: its name,
//! cover, and the ordered list of chapters. Each content source gets one
//! [`CatalogAdapter`] that scrapes its pages into that shape; everything
//! downstream works on the normalized model only.
//!
//! # Architecture
//!
//! - [`BookInfo`] / [`Chapter`] / [`AssetRef`] - normalized catalog model
//! - [`CatalogAdapter`] - async trait each source implements
//! - [`AdapterRegistry`] - host-based adapter lookup
//! - [`BaoziAdapter`] - adapter for the Baozi comic site family
//! - [`GodamangaAdapter`] - adapter for Godamanga and `baozimh.one`
//!
//! # Example
//!
//! ```no_run
//! use comic_dl_core::catalog::build_default_adapter_registry;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = build_default_adapter_registry()?;
//! let target = "https://www.baozimh.com/comic/some-book";
//! if let Some(adapter) = registry.find(target) {
//!     let target = adapter.preprocess_target_ref(target);
//!     let book = adapter.resolve_catalog(&target).await?;
//!     println!("{} has {} chapters", book.name, book.chapters.len());
//! }
//! # Ok(())
//! # }
//! ```

mod baozi;
mod error;
mod godamanga;
mod http;
mod registry;
mod scrape;

pub use baozi::BaoziAdapter;
pub use error::CatalogError;
pub use godamanga::GodamangaAdapter;
pub use registry::{AdapterRegistry, build_default_adapter_registry};

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::download::AssetFetcher;

/// One fetchable asset of a chapter and where it was saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRef {
    /// Remote URL of the asset.
    pub url: String,
    /// Path relative to the book directory, once saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl AssetRef {
    /// Creates an unsaved asset reference.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            path: None,
        }
    }

    /// Creates a reference to an asset saved at `path`.
    #[must_use]
    pub fn saved(url: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            path: Some(path.into()),
        }
    }
}

/// One chapter of a book as listed by the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    /// Filesystem-safe unique name, prefixed with the catalog index.
    pub name: String,
    /// Title exactly as the source displays it.
    pub raw_name: String,
    /// Position in catalog order, dense from 0.
    pub index: usize,
    /// Locator the adapter resolves into the asset list.
    pub href: String,
    /// Resolved assets; empty until the chapter has been fetched.
    #[serde(default)]
    pub assets: Vec<AssetRef>,
}

impl Chapter {
    /// Creates a chapter whose `name` is derived from its index and title.
    ///
    /// The `<index>_` prefix keeps lexicographic and catalog order aligned
    /// and makes names unique even when two titles sanitize to the same text.
    #[must_use]
    pub fn new(index: usize, raw_name: impl Into<String>, href: impl Into<String>) -> Self {
        let raw_name = raw_name.into();
        Self {
            name: format!("{index}_{}", sanitize_path_name(&raw_name)),
            raw_name,
            index,
            href: href.into(),
            assets: Vec::new(),
        }
    }

    /// Returns the chapter directory relative to the book directory.
    #[must_use]
    pub fn relative_dir(&self) -> String {
        format!("chapters/{}", self.name)
    }

    /// Returns a copy without resolved assets, used where only identity matters.
    #[must_use]
    pub fn identity(&self) -> Self {
        Self {
            assets: Vec::new(),
            ..self.clone()
        }
    }
}

/// Normalized description of a book, also persisted as `bookInfo.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookInfo {
    /// Display name.
    pub name: String,
    /// Filesystem-safe directory name for the book.
    pub path_name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub cover_url: String,
    /// Cover file name inside the book directory; empty until saved.
    #[serde(default)]
    pub cover_path: String,
    /// Chapters in catalog order.
    pub chapters: Vec<Chapter>,
    /// Catalog URL after preprocessing; update runs start from here.
    pub url: String,
    #[serde(default)]
    pub language: String,
    /// Catalog URL as the user supplied it.
    #[serde(default)]
    pub raw_url: String,
}

impl BookInfo {
    /// Checks the structural invariants the orchestrator relies on.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::Unrecognized`] when the book has no name
    /// - [`CatalogError::Empty`] when there are no chapters
    /// - [`CatalogError::Inconsistent`] when indices are not `0..N` in order
    ///   or two chapters share a name
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::unrecognized(&self.url, "book has no name"));
        }
        if self.chapters.is_empty() {
            return Err(CatalogError::empty(&self.url));
        }

        let mut names = HashSet::with_capacity(self.chapters.len());
        for (position, chapter) in self.chapters.iter().enumerate() {
            if chapter.index != position {
                return Err(CatalogError::inconsistent(
                    &self.url,
                    format!(
                        "chapter '{}' has index {} at position {position}",
                        chapter.raw_name, chapter.index
                    ),
                ));
            }
            if !names.insert(chapter.name.as_str()) {
                return Err(CatalogError::inconsistent(
                    &self.url,
                    format!("duplicate chapter name '{}'", chapter.name),
                ));
            }
        }
        Ok(())
    }

    /// Returns the directory name to use for this book, never empty.
    #[must_use]
    pub fn dir_name(&self) -> String {
        let from_path = sanitize_path_name(&self.path_name);
        if !from_path.is_empty() {
            return from_path;
        }
        let from_name = sanitize_path_name(&self.name);
        if from_name.is_empty() {
            "book".to_string()
        } else {
            from_name
        }
    }
}

/// Capability interface every content source implements.
///
/// Adapters only parse; saving assets is shared behavior supplied by the
/// orchestrator's default [`AssetFetcher`]. A source with transfer quirks
/// (referer checks, its own rate limit) overrides [`asset_fetcher`].
///
/// [`asset_fetcher`]: CatalogAdapter::asset_fetcher
#[async_trait]
pub trait CatalogAdapter: Send + Sync {
    /// Returns the adapter's name (e.g. "baozi").
    fn name(&self) -> &str;

    /// Returns true if this adapter understands the target URL.
    fn can_handle(&self, target: &str) -> bool;

    /// Normalizes the target before resolution (mirror host, scheme, ...).
    fn preprocess_target_ref(&self, target: &str) -> String {
        target.to_string()
    }

    /// Resolves the book page into a catalog.
    async fn resolve_catalog(&self, target: &str) -> Result<BookInfo, CatalogError>;

    /// Resolves one chapter's ordered asset URL list.
    async fn resolve_chapter_assets(&self, chapter_ref: &str) -> Result<Vec<String>, CatalogError>;

    /// Source-specific fetcher, or `None` to use the shared one.
    fn asset_fetcher(&self) -> Option<Arc<dyn AssetFetcher>> {
        None
    }
}

/// Makes a display title safe to use as a single path component.
///
/// Path separators and characters reserved on common filesystems become `_`;
/// all whitespace is removed.
#[must_use]
pub fn sanitize_path_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() || matches!(c, '\n' | '\r'))
        .map(|c| match c {
            '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\n' | '\r' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .trim_matches('.')
        .to_string()
}
