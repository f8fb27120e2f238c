//! The resume-aware run for one book.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tracing::{debug, info, instrument, warn};

use super::chapter_task::{ChapterContext, ChapterResult, run_chapter};
use super::{IgnoreRule, RunConfig, RunError, RunObserver, RunOutcome, RunRequest};
use crate::catalog::{AdapterRegistry, BookInfo, CatalogAdapter, CatalogError, Chapter};
use crate::download::AssetFetcher;
use crate::library::write_book_info;
use crate::pool::BoundedPool;
use crate::progress::{ProgressRecord, ProgressStore, StoreError};

/// Fixed stem of the saved cover image.
const COVER_FILE_STEM: &str = "cover";

/// Downloads books chapter by chapter, resuming from `progress.json`.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use comic_dl_core::{
///     BookDownloader, FetcherConfig, HttpFetcher, NoopObserver, RunConfig, RunRequest,
///     build_default_adapter_registry,
/// };
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let downloader = BookDownloader::new(
///     Arc::new(build_default_adapter_registry()?),
///     Arc::new(HttpFetcher::new(&FetcherConfig::default())?),
///     RunConfig::default(),
/// )?;
/// let request = RunRequest::new("https://www.baozimh.com/comic/some-book", "comic-dist");
/// let outcome = downloader.run(&request, &NoopObserver).await?;
/// println!("success: {}", outcome.is_success());
/// # Ok(())
/// # }
/// ```
pub struct BookDownloader {
    registry: Arc<AdapterRegistry>,
    fetcher: Arc<dyn AssetFetcher>,
    config: RunConfig,
}

impl std::fmt::Debug for BookDownloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookDownloader")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl BookDownloader {
    /// Creates an orchestrator.
    ///
    /// `fetcher` is used for every adapter that does not supply its own.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::InvalidConfig`] if a concurrency limit is out of range.
    pub fn new(
        registry: Arc<AdapterRegistry>,
        fetcher: Arc<dyn AssetFetcher>,
        config: RunConfig,
    ) -> Result<Self, RunError> {
        config.validate()?;
        Ok(Self {
            registry,
            fetcher,
            config,
        })
    }

    /// Returns the run configuration.
    #[must_use]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Runs one book to a terminal outcome.
    ///
    /// Catalog failures come back as [`RunOutcome::CatalogParseFailed`]
    /// without touching the filesystem. Asset and chapter failures are
    /// collected into [`RunOutcome::CompleteWithErrors`].
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Storage`] when a directory cannot be created or the
    /// progress/book files cannot be read or written.
    #[instrument(skip_all, fields(target = %request.target_ref))]
    pub async fn run(
        &self,
        request: &RunRequest,
        observer: &dyn RunObserver,
    ) -> Result<RunOutcome, RunError> {
        let (adapter, mut book) = match self.resolve_catalog(&request.target_ref).await {
            Ok(resolved) => resolved,
            Err(error) => {
                warn!(error = %error, "catalog resolution failed");
                observer.catalog_resolution_failed(&request.target_ref, &error);
                return Ok(RunOutcome::CatalogParseFailed {
                    target_ref: request.target_ref.clone(),
                    error,
                });
            }
        };

        let book_dir = request.destination_root.join(book.dir_name());
        let ignore = request.ignore.iter().find(|rule| rule.matches_book(&book));
        if ignore.is_some_and(IgnoreRule::ignores_whole_book) {
            info!(book = %book.name, "book is ignored");
            observer.run_finished_success(&book.name, &book_dir, None);
            return Ok(already_complete(book, book_dir));
        }

        tokio::fs::create_dir_all(&book_dir)
            .await
            .map_err(|e| StoreError::io(&book_dir, e))?;
        let total = book.chapters.len();
        let (store, state) = ProgressStore::load(&book_dir, total).await?;

        if state.is_complete() && !self.config.always_reconcile {
            info!(book = %book.name, total, "already complete");
            observer.run_finished_success(&book.name, &book_dir, None);
            return Ok(already_complete(book, book_dir));
        }

        observer.run_was_interrupted(state.interrupted);
        if state.interrupted || self.config.always_reconcile {
            prune_stale_records(&store, &book.chapters).await?;
        }

        let records = store.records().await;
        let remaining: Vec<Chapter> = book
            .chapters
            .iter()
            .filter(|chapter| !records.iter().any(|r| r.matches_chapter(chapter)))
            .filter(|chapter| !ignore.is_some_and(|rule| rule.ignores_chapter(chapter)))
            .cloned()
            .collect();

        if remaining.is_empty() {
            info!(book = %book.name, completed = records.len(), total, "nothing left to download");
            observer.run_finished_success(&book.name, &book_dir, None);
            return Ok(already_complete(book, book_dir));
        }

        info!(
            book = %book.name,
            remaining = remaining.len(),
            completed = records.len(),
            total,
            "starting chapter downloads"
        );
        observer.run_started(&book, remaining.len());

        let fetcher = adapter
            .asset_fetcher()
            .unwrap_or_else(|| Arc::clone(&self.fetcher));
        let errors = self
            .run_chapters(&*adapter, &*fetcher, &store, observer, &book, &book_dir, &remaining)
            .await?;

        self.finalize_book_info(&*fetcher, &store, &mut book, &book_dir)
            .await?;

        let attempted: Vec<Chapter> = remaining.iter().map(Chapter::identity).collect();
        if errors.is_empty() {
            info!(book = %book.name, chapters = attempted.len(), "download complete");
            observer.run_finished_success(&book.name, &book_dir, Some(&attempted));
            Ok(RunOutcome::AllComplete {
                book_name: book.name,
                book_dir,
                attempted,
            })
        } else {
            warn!(book = %book.name, errors = errors.len(), "download finished with errors");
            observer.run_finished_with_errors(&book, &attempted, &errors);
            Ok(RunOutcome::CompleteWithErrors {
                book_name: book.name,
                book_dir,
                attempted,
                errors,
            })
        }
    }

    async fn resolve_catalog(
        &self,
        target_ref: &str,
    ) -> Result<(Arc<dyn CatalogAdapter>, BookInfo), CatalogError> {
        let adapter = self
            .registry
            .find(target_ref)
            .ok_or_else(|| CatalogError::no_adapter(target_ref))?;
        let target = adapter.preprocess_target_ref(target_ref);
        debug!(adapter = adapter.name(), target = %target, "resolving catalog");

        let mut book = adapter.resolve_catalog(&target).await?;
        book.validate()?;
        if book.url.is_empty() {
            book.url = target;
        }
        if book.raw_url.is_empty() {
            book.raw_url = target_ref.to_string();
        }
        Ok((adapter, book))
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_chapters(
        &self,
        adapter: &dyn CatalogAdapter,
        fetcher: &dyn AssetFetcher,
        store: &ProgressStore,
        observer: &dyn RunObserver,
        book: &BookInfo,
        book_dir: &Path,
        remaining: &[Chapter],
    ) -> Result<Vec<super::ErrorRecord>, RunError> {
        let chapter_pool = BoundedPool::new(self.config.chapter_concurrency).map_err(|_| {
            RunError::InvalidConfig {
                field: "chapter_concurrency",
                value: self.config.chapter_concurrency.to_string(),
            }
        })?;
        let asset_pool = BoundedPool::new(self.config.asset_concurrency).map_err(|_| {
            RunError::InvalidConfig {
                field: "asset_concurrency",
                value: self.config.asset_concurrency.to_string(),
            }
        })?;
        let abort = AtomicBool::new(false);
        let ctx = ChapterContext {
            adapter,
            fetcher,
            store,
            observer,
            book_name: &book.name,
            book_dir,
            asset_pool: &asset_pool,
            abort: &abort,
        };

        let results = chapter_pool
            .run_all(remaining, |chapter| run_chapter(&ctx, chapter))
            .await;

        let mut errors = Vec::new();
        let mut storage_error = None;
        for result in results {
            match result {
                ChapterResult::Recorded | ChapterResult::Skipped => {}
                ChapterResult::Failed(chapter_errors) => errors.extend(chapter_errors),
                ChapterResult::Storage(e) => {
                    storage_error.get_or_insert(e);
                }
            }
        }

        match storage_error {
            Some(e) => Err(RunError::Storage(e)),
            None => Ok(errors),
        }
    }

    /// Fills saved assets from progress, fetches the cover, writes `bookInfo.json`.
    async fn finalize_book_info(
        &self,
        fetcher: &dyn AssetFetcher,
        store: &ProgressStore,
        book: &mut BookInfo,
        book_dir: &Path,
    ) -> Result<(), RunError> {
        let records = store.records().await;
        for chapter in &mut book.chapters {
            chapter.assets = records
                .iter()
                .find(|r| r.matches_chapter(chapter))
                .map(|r| r.assets.clone())
                .unwrap_or_default();
        }

        if !book.cover_url.is_empty() {
            match fetcher
                .fetch(&book.cover_url, book_dir, Some(COVER_FILE_STEM))
                .await
            {
                Ok(name) => book.cover_path = name,
                Err(e) => warn!(error = %e, "cover download failed"),
            }
        }

        write_book_info(book_dir, book).await?;
        Ok(())
    }
}

fn already_complete(book: BookInfo, book_dir: std::path::PathBuf) -> RunOutcome {
    RunOutcome::AlreadyComplete {
        book_name: book.name,
        book_dir,
    }
}

/// Drops records whose chapter no longer appears unchanged in `catalog`.
async fn prune_stale_records(store: &ProgressStore, catalog: &[Chapter]) -> Result<(), StoreError> {
    let records = store.records().await;
    let keep: Vec<ProgressRecord> = records
        .iter()
        .filter(|record| catalog.iter().any(|chapter| record.same_identity(chapter)))
        .cloned()
        .collect();

    if keep.len() == records.len() {
        return Ok(());
    }
    let pruned = store.replace_and_prune(keep).await?;
    for record in &pruned {
        debug!(chapter = %record.name, "stale record removed");
    }
    Ok(())
}
