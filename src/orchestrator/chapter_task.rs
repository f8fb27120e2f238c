//! One chapter: resolve assets, fetch them, record on full success.
//!
//! Assets of a chapter always land under distinct file names, and a chapter
//! whose source lists no assets is recorded as complete.

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, instrument, warn};

use super::{ErrorRecord, RunObserver};
use crate::catalog::{AssetRef, CatalogAdapter, Chapter};
use crate::download::{AssetFetcher, DownloadError, unique_asset_stems};
use crate::pool::BoundedPool;
use crate::progress::{ProgressRecord, ProgressStore, StoreError};

/// Everything a chapter task borrows from its run.
pub(super) struct ChapterContext<'a> {
    pub adapter: &'a dyn CatalogAdapter,
    pub fetcher: &'a dyn AssetFetcher,
    pub store: &'a ProgressStore,
    pub observer: &'a dyn RunObserver,
    pub book_name: &'a str,
    pub book_dir: &'a Path,
    /// Template for the per-chapter asset pool.
    pub asset_pool: &'a BoundedPool,
    /// Set after a storage failure; tasks not yet started return `Skipped`.
    pub abort: &'a AtomicBool,
}

/// How one chapter task ended.
#[derive(Debug)]
pub(super) enum ChapterResult {
    /// Every asset saved and the record appended.
    Recorded,
    /// Asset list or some assets failed; nothing recorded.
    Failed(Vec<ErrorRecord>),
    /// Not started because the run is aborting.
    Skipped,
    /// Chapter directory or progress write failed.
    Storage(StoreError),
}

impl ChapterContext<'_> {
    fn error(&self, chapter: &Chapter, asset_url: Option<&str>, reason: String) -> ErrorRecord {
        ErrorRecord {
            book_name: self.book_name.to_string(),
            chapter: chapter.identity(),
            asset_url: asset_url.map(ToString::to_string),
            reason,
        }
    }
}

#[instrument(skip_all, fields(chapter = %chapter.name))]
pub(super) async fn run_chapter(ctx: &ChapterContext<'_>, chapter: &Chapter) -> ChapterResult {
    if ctx.abort.load(Ordering::SeqCst) {
        return ChapterResult::Skipped;
    }

    let result = download_chapter(ctx, chapter).await;
    match &result {
        ChapterResult::Recorded => ctx.observer.chapter_finished(chapter, true),
        ChapterResult::Failed(_) => ctx.observer.chapter_finished(chapter, false),
        ChapterResult::Storage(e) => {
            warn!(error = %e, "storage failure, stopping new chapter tasks");
            ctx.abort.store(true, Ordering::SeqCst);
        }
        ChapterResult::Skipped => {}
    }
    result
}

async fn download_chapter(ctx: &ChapterContext<'_>, chapter: &Chapter) -> ChapterResult {
    let relative_dir = chapter.relative_dir();
    let chapter_dir = ctx.book_dir.join(&relative_dir);
    if let Err(e) = tokio::fs::create_dir_all(&chapter_dir).await {
        return ChapterResult::Storage(StoreError::io(chapter_dir, e));
    }

    let urls = match ctx.adapter.resolve_chapter_assets(&chapter.href).await {
        Ok(urls) => dedup_preserving_order(urls),
        Err(e) => {
            debug!(error = %e, "asset list resolution failed");
            return ChapterResult::Failed(vec![ctx.error(chapter, None, e.to_string())]);
        }
    };

    if urls.is_empty() {
        debug!("chapter lists no assets");
    }
    let stems = unique_asset_stems(&urls);

    let outcomes = ctx
        .asset_pool
        .detached()
        .run_all(urls.into_iter().zip(stems), |(url, stem)| {
            let chapter_dir = &chapter_dir;
            async move {
                let result = if url.trim().is_empty() {
                    Err(DownloadError::invalid_url(url.as_str()))
                } else {
                    ctx.fetcher.fetch(&url, chapter_dir, stem.as_deref()).await
                };
                (url, result)
            }
        })
        .await;

    let mut assets = Vec::with_capacity(outcomes.len());
    let mut errors = Vec::new();
    for (url, result) in outcomes {
        match result {
            Ok(file_name) => {
                let path = format!("{relative_dir}/{file_name}");
                assets.push(AssetRef::saved(url, path));
            }
            Err(e) => errors.push(ctx.error(chapter, Some(&url), e.to_string())),
        }
    }

    if !errors.is_empty() {
        debug!(
            failed = errors.len(),
            saved = assets.len(),
            "chapter incomplete, not recorded"
        );
        return ChapterResult::Failed(errors);
    }

    match ctx
        .store
        .append(ProgressRecord::from_chapter(chapter, assets))
        .await
    {
        Ok(()) => ChapterResult::Recorded,
        Err(e) => ChapterResult::Storage(e),
    }
}

/// Drops repeated URLs, keeping the first occurrence.
fn dedup_preserving_order(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(urls.len());
    urls.into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect()
}
