//! Shared fixtures for integration tests: a scripted catalog source and an
//! in-memory asset fetcher that records every call.

#![allow(dead_code)]

pub mod socket_guard;

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use comic_dl_core::{
    AdapterRegistry, AssetFetcher, BookDownloader, BookInfo, CatalogAdapter, CatalogError,
    Chapter, DownloadError, RunConfig,
};

/// Scheme every scripted target uses.
pub const SCRIPTED_TARGET: &str = "scripted://book";

/// Catalog source whose pages are set by the test.
#[derive(Default)]
pub struct ScriptedAdapter {
    catalog: Mutex<Option<BookInfo>>,
    assets: Mutex<HashMap<String, Result<Vec<String>, String>>>,
    pub catalog_calls: AtomicUsize,
    asset_calls: Mutex<Vec<String>>,
}

impl ScriptedAdapter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Replaces the catalog with `chapters` given as `(title, href)` pairs.
    pub fn set_catalog(&self, name: &str, chapters: &[(&str, &str)]) {
        let chapters = chapters
            .iter()
            .enumerate()
            .map(|(index, (title, href))| Chapter::new(index, *title, *href))
            .collect();
        let book = BookInfo {
            name: name.to_string(),
            path_name: name.to_string(),
            author: "Author".to_string(),
            desc: String::new(),
            cover_url: String::new(),
            cover_path: String::new(),
            chapters,
            url: String::new(),
            language: String::new(),
            raw_url: String::new(),
        };
        *self.catalog.lock().unwrap() = Some(book);
    }

    /// Makes the catalog unresolvable.
    pub fn clear_catalog(&self) {
        *self.catalog.lock().unwrap() = None;
    }

    pub fn set_cover(&self, url: &str) {
        if let Some(book) = self.catalog.lock().unwrap().as_mut() {
            book.cover_url = url.to_string();
        }
    }

    pub fn set_assets(&self, href: &str, urls: &[&str]) {
        self.assets.lock().unwrap().insert(
            href.to_string(),
            Ok(urls.iter().map(ToString::to_string).collect()),
        );
    }

    pub fn fail_assets(&self, href: &str, reason: &str) {
        self.assets
            .lock()
            .unwrap()
            .insert(href.to_string(), Err(reason.to_string()));
    }

    /// Chapter refs whose asset lists were requested, in call order.
    pub fn asset_calls(&self) -> Vec<String> {
        self.asset_calls.lock().unwrap().clone()
    }

    pub fn reset_calls(&self) {
        self.catalog_calls.store(0, Ordering::SeqCst);
        self.asset_calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl CatalogAdapter for ScriptedAdapter {
    fn name(&self) -> &str {
        "scripted"
    }

    fn can_handle(&self, target: &str) -> bool {
        target.starts_with("scripted://")
    }

    async fn resolve_catalog(&self, target: &str) -> Result<BookInfo, CatalogError> {
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);
        self.catalog
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| CatalogError::unrecognized(target, "scripted catalog unavailable"))
    }

    async fn resolve_chapter_assets(&self, chapter_ref: &str) -> Result<Vec<String>, CatalogError> {
        self.asset_calls.lock().unwrap().push(chapter_ref.to_string());
        match self.assets.lock().unwrap().get(chapter_ref) {
            Some(Ok(urls)) => Ok(urls.clone()),
            Some(Err(reason)) => Err(CatalogError::unrecognized(chapter_ref, reason.clone())),
            None => Err(CatalogError::unrecognized(chapter_ref, "no scripted assets")),
        }
    }
}

/// Fetcher that writes the URL as file content and records every call.
#[derive(Default)]
pub struct RecordingFetcher {
    failing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
    latency: Mutex<Option<Duration>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

/// Decrements the in-flight count however a fetch ends.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RecordingFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail(&self, url: &str) {
        self.failing.lock().unwrap().insert(url.to_string());
    }

    pub fn heal(&self, url: &str) {
        self.failing.lock().unwrap().remove(url);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Makes every fetch sleep before writing its file.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = Some(latency);
    }

    /// Highest number of fetches seen running at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssetFetcher for RecordingFetcher {
    async fn fetch(
        &self,
        url: &str,
        dest_dir: &Path,
        fixed_name: Option<&str>,
    ) -> Result<String, DownloadError> {
        self.calls.lock().unwrap().push(url.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _in_flight = InFlight(&self.in_flight);
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.failing.lock().unwrap().contains(url) {
            return Err(DownloadError::http_status(url, 404));
        }
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let last = path.rsplit('/').next().unwrap_or("asset.jpg");
        let name = match fixed_name {
            Some(stem) => format!("{stem}.jpg"),
            None => last.to_string(),
        };
        tokio::fs::write(dest_dir.join(&name), url.as_bytes())
            .await
            .map_err(|e| DownloadError::io(dest_dir.join(&name), e))?;
        Ok(name)
    }
}

/// Builds an orchestrator over the scripted source with small pools.
pub fn downloader(adapter: &Arc<ScriptedAdapter>, fetcher: &Arc<RecordingFetcher>) -> BookDownloader {
    downloader_with(adapter, fetcher, RunConfig {
        chapter_concurrency: 2,
        asset_concurrency: 2,
        always_reconcile: false,
    })
}

pub fn downloader_with(
    adapter: &Arc<ScriptedAdapter>,
    fetcher: &Arc<RecordingFetcher>,
    config: RunConfig,
) -> BookDownloader {
    let mut registry = AdapterRegistry::new();
    registry.register(Arc::clone(adapter) as Arc<dyn CatalogAdapter>);
    BookDownloader::new(
        Arc::new(registry),
        Arc::clone(fetcher) as Arc<dyn AssetFetcher>,
        config,
    )
    .expect("valid run config")
}
