//! Integration tests for resume-aware book runs.
//!
//! Every test drives `BookDownloader` against a scripted catalog source and a
//! recording fetcher, then inspects `progress.json` and the book directory.

mod support;

use std::path::Path;
use std::sync::atomic::Ordering;

use comic_dl_core::{
    BOOK_INFO_FILE_NAME, IgnoreRule, NoopObserver, PROGRESS_FILE_NAME, ProgressRecord, RunConfig,
    RunError, RunOutcome, RunRequest, StoreError, read_book_info,
};
use support::{RecordingFetcher, SCRIPTED_TARGET, ScriptedAdapter, downloader, downloader_with};
use tempfile::TempDir;

fn request(root: &Path) -> RunRequest {
    RunRequest::new(SCRIPTED_TARGET, root)
}

fn read_progress(book_dir: &Path) -> Vec<ProgressRecord> {
    let raw = std::fs::read(book_dir.join(PROGRESS_FILE_NAME)).expect("progress.json exists");
    serde_json::from_slice(&raw).expect("progress.json is valid")
}

/// Three chapters, two images each.
fn three_chapter_book(adapter: &ScriptedAdapter) {
    adapter.set_catalog("Book", &[("A", "u1"), ("B", "u2"), ("C", "u3")]);
    adapter.set_assets("u1", &["https://img/a1.jpg", "https://img/a2.jpg"]);
    adapter.set_assets("u2", &["https://img/b1.jpg", "https://img/b2.jpg"]);
    adapter.set_assets("u3", &["https://img/c1.jpg", "https://img/c2.jpg"]);
}

#[tokio::test]
async fn test_fresh_run_records_every_chapter() {
    let root = TempDir::new().expect("failed to create temp dir");
    let adapter = ScriptedAdapter::new();
    let fetcher = RecordingFetcher::new();
    three_chapter_book(&adapter);

    let outcome = downloader(&adapter, &fetcher)
        .run(&request(root.path()), &NoopObserver)
        .await
        .expect("run should not fail");

    let RunOutcome::AllComplete {
        book_dir, attempted, ..
    } = &outcome
    else {
        panic!("expected AllComplete, got {outcome:?}");
    };
    assert_eq!(attempted.len(), 3);
    assert_eq!(book_dir, &root.path().join("Book"));

    let records = read_progress(book_dir);
    assert_eq!(records.len(), 3);
    let b = records.iter().find(|r| r.href == "u2").expect("B recorded");
    assert_eq!(b.name, "1_B");
    assert_eq!(
        b.assets.iter().map(|a| a.path.as_deref()).collect::<Vec<_>>(),
        [Some("chapters/1_B/b1.jpg"), Some("chapters/1_B/b2.jpg")]
    );
    assert!(book_dir.join("chapters/1_B/b2.jpg").exists());
    assert_eq!(fetcher.calls().len(), 6);
}

#[tokio::test]
async fn test_book_info_written_with_assets_and_cover() {
    let root = TempDir::new().expect("failed to create temp dir");
    let adapter = ScriptedAdapter::new();
    let fetcher = RecordingFetcher::new();
    three_chapter_book(&adapter);
    adapter.set_cover("https://img/cover-art.png");
    fetcher.fail("https://img/c2.jpg");

    downloader(&adapter, &fetcher)
        .run(&request(root.path()), &NoopObserver)
        .await
        .expect("run should not fail");

    let book_dir = root.path().join("Book");
    assert!(book_dir.join(BOOK_INFO_FILE_NAME).exists());
    let info = read_book_info(&book_dir).await.expect("bookInfo.json readable");
    assert_eq!(info.url, SCRIPTED_TARGET);
    assert_eq!(info.raw_url, SCRIPTED_TARGET);
    assert_eq!(info.cover_path, "cover.jpg");
    assert!(book_dir.join("cover.jpg").exists());
    assert_eq!(info.chapters[0].assets.len(), 2);
    assert!(
        info.chapters[2].assets.is_empty(),
        "unrecorded chapter must not list assets"
    );
}

#[tokio::test]
async fn test_failed_asset_keeps_chapter_unrecorded_then_resume_redoes_only_it() {
    let root = TempDir::new().expect("failed to create temp dir");
    let adapter = ScriptedAdapter::new();
    let fetcher = RecordingFetcher::new();
    three_chapter_book(&adapter);
    fetcher.fail("https://img/b2.jpg");
    let downloader = downloader(&adapter, &fetcher);

    let first = downloader
        .run(&request(root.path()), &NoopObserver)
        .await
        .expect("run should not fail");
    let RunOutcome::CompleteWithErrors { errors, .. } = &first else {
        panic!("expected CompleteWithErrors, got {first:?}");
    };
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].chapter.raw_name, "B");
    assert_eq!(errors[0].asset_url.as_deref(), Some("https://img/b2.jpg"));
    assert_eq!(errors[0].book_name, "Book");

    let book_dir = root.path().join("Book");
    let records = read_progress(&book_dir);
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.href != "u2"), "B must not be recorded");

    fetcher.heal("https://img/b2.jpg");
    fetcher.reset_calls();
    adapter.reset_calls();

    let second = downloader
        .run(&request(root.path()), &NoopObserver)
        .await
        .expect("run should not fail");
    assert_eq!(second.attempted().map(<[_]>::len), Some(1));
    assert!(second.is_success());
    assert_eq!(adapter.asset_calls(), ["u2"]);
    let mut calls = fetcher.calls();
    calls.sort();
    assert_eq!(calls, ["https://img/b1.jpg", "https://img/b2.jpg"]);

    let records = read_progress(&book_dir);
    assert_eq!(records.len(), 3);
    let mut hrefs: Vec<_> = records.iter().map(|r| r.href.as_str()).collect();
    hrefs.sort_unstable();
    assert_eq!(hrefs, ["u1", "u2", "u3"], "no duplicate records");
}

#[tokio::test]
async fn test_resume_runs_only_missing_chapter() {
    let root = TempDir::new().expect("failed to create temp dir");
    let adapter = ScriptedAdapter::new();
    let fetcher = RecordingFetcher::new();
    three_chapter_book(&adapter);
    let downloader = downloader(&adapter, &fetcher);

    // A and B finished earlier; C never ran.
    adapter.fail_assets("u3", "page timed out");
    downloader
        .run(&request(root.path()), &NoopObserver)
        .await
        .expect("run should not fail");
    adapter.set_assets("u3", &["https://img/c1.jpg", "https://img/c2.jpg"]);
    fetcher.reset_calls();
    adapter.reset_calls();

    let outcome = downloader
        .run(&request(root.path()), &NoopObserver)
        .await
        .expect("run should not fail");

    let RunOutcome::AllComplete { attempted, .. } = &outcome else {
        panic!("expected AllComplete, got {outcome:?}");
    };
    assert_eq!(attempted.len(), 1);
    assert_eq!(attempted[0].raw_name, "C");
    assert_eq!(adapter.asset_calls(), ["u3"]);
    assert_eq!(fetcher.calls().len(), 2);
    assert_eq!(read_progress(&root.path().join("Book")).len(), 3);
}

#[tokio::test]
async fn test_resume_reports_each_failed_asset_of_remaining_chapter() {
    let root = TempDir::new().expect("failed to create temp dir");
    let adapter = ScriptedAdapter::new();
    let fetcher = RecordingFetcher::new();
    three_chapter_book(&adapter);
    fetcher.fail("https://img/c1.jpg");
    fetcher.fail("https://img/c2.jpg");

    let outcome = downloader(&adapter, &fetcher)
        .run(&request(root.path()), &NoopObserver)
        .await
        .expect("run should not fail");

    let mut failed: Vec<_> = outcome
        .errors()
        .iter()
        .filter_map(|e| e.asset_url.as_deref())
        .collect();
    failed.sort_unstable();
    assert_eq!(failed, ["https://img/c1.jpg", "https://img/c2.jpg"]);
    assert_eq!(read_progress(&root.path().join("Book")).len(), 2);
}

#[tokio::test]
async fn test_chapter_resolution_failure_does_not_stop_siblings() {
    let root = TempDir::new().expect("failed to create temp dir");
    let adapter = ScriptedAdapter::new();
    let fetcher = RecordingFetcher::new();
    three_chapter_book(&adapter);
    adapter.fail_assets("u1", "page layout changed");

    let outcome = downloader(&adapter, &fetcher)
        .run(&request(root.path()), &NoopObserver)
        .await
        .expect("run should not fail");

    let errors = outcome.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].chapter.href, "u1");
    assert!(errors[0].asset_url.is_none());
    assert!(
        errors[0].reason.contains("page layout changed"),
        "Expected cause in: {}",
        errors[0].reason
    );

    let records = read_progress(&root.path().join("Book"));
    let mut hrefs: Vec<_> = records.iter().map(|r| r.href.as_str()).collect();
    hrefs.sort_unstable();
    assert_eq!(hrefs, ["u2", "u3"]);
}

#[tokio::test]
async fn test_empty_asset_list_is_recorded_as_complete() {
    let root = TempDir::new().expect("failed to create temp dir");
    let adapter = ScriptedAdapter::new();
    let fetcher = RecordingFetcher::new();
    adapter.set_catalog("Book", &[("A", "u1")]);
    adapter.set_assets("u1", &[]);

    let outcome = downloader(&adapter, &fetcher)
        .run(&request(root.path()), &NoopObserver)
        .await
        .expect("run should not fail");

    assert!(
        matches!(outcome, RunOutcome::AllComplete { .. }),
        "expected AllComplete, got {outcome:?}"
    );
    assert!(fetcher.calls().is_empty());
    let records = read_progress(&root.path().join("Book"));
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].href, "u1");
    assert!(records[0].assets.is_empty());

    let again = downloader(&adapter, &fetcher)
        .run(&request(root.path()), &NoopObserver)
        .await
        .expect("second run should not fail");
    assert!(
        matches!(again, RunOutcome::AlreadyComplete { .. }),
        "expected AlreadyComplete, got {again:?}"
    );
}

#[tokio::test]
async fn test_assets_sharing_a_file_name_are_all_kept() {
    let root = TempDir::new().expect("failed to create temp dir");
    let adapter = ScriptedAdapter::new();
    let fetcher = RecordingFetcher::new();
    adapter.set_catalog("Book", &[("A", "u1")]);
    adapter.set_assets(
        "u1",
        &[
            "https://s1/p1/1.jpg",
            "https://s1/p2/1.jpg",
            "https://s1/p3/1.jpg?v=2",
        ],
    );

    let outcome = downloader(&adapter, &fetcher)
        .run(&request(root.path()), &NoopObserver)
        .await
        .expect("run should not fail");
    assert!(
        matches!(outcome, RunOutcome::AllComplete { .. }),
        "expected AllComplete, got {outcome:?}"
    );

    let book_dir = root.path().join("Book");
    let records = read_progress(&book_dir);
    assert_eq!(records.len(), 1);
    let paths: Vec<_> = records[0]
        .assets
        .iter()
        .map(|a| a.path.as_deref())
        .collect();
    assert_eq!(
        paths,
        [
            Some("chapters/0_A/1.jpg"),
            Some("chapters/0_A/1_2.jpg"),
            Some("chapters/0_A/1_3.jpg"),
        ]
    );
    for (asset, path) in records[0].assets.iter().zip(&paths) {
        let saved = std::fs::read(book_dir.join(path.expect("path recorded")))
            .expect("asset file exists");
        assert_eq!(saved, asset.url.as_bytes(), "file holds its own asset");
    }
}

#[tokio::test]
async fn test_in_flight_fetches_bounded_by_both_pools() {
    let root = TempDir::new().expect("failed to create temp dir");
    let adapter = ScriptedAdapter::new();
    let fetcher = RecordingFetcher::new();
    fetcher.set_latency(std::time::Duration::from_millis(25));
    let chapters: Vec<(String, String)> = (0..4)
        .map(|i| (format!("C{i}"), format!("u{i}")))
        .collect();
    let catalog: Vec<(&str, &str)> = chapters
        .iter()
        .map(|(title, href)| (title.as_str(), href.as_str()))
        .collect();
    adapter.set_catalog("Book", &catalog);
    for (i, (_, href)) in chapters.iter().enumerate() {
        let urls: Vec<String> = (0..5).map(|n| format!("https://img/{i}-{n}.jpg")).collect();
        let urls: Vec<&str> = urls.iter().map(String::as_str).collect();
        adapter.set_assets(href, &urls);
    }
    let config = RunConfig {
        chapter_concurrency: 2,
        asset_concurrency: 3,
        always_reconcile: false,
    };

    let outcome = downloader_with(&adapter, &fetcher, config)
        .run(&request(root.path()), &NoopObserver)
        .await
        .expect("run should not fail");

    assert!(matches!(outcome, RunOutcome::AllComplete { .. }));
    assert_eq!(fetcher.calls().len(), 20);
    let peak = fetcher.peak_in_flight();
    assert!(peak <= 6, "peak {peak} exceeds chapter x asset concurrency");
    assert!(peak > 3, "chapters should fetch side by side, peak was {peak}");
}

#[tokio::test]
async fn test_empty_asset_url_fails_without_fetch() {
    let root = TempDir::new().expect("failed to create temp dir");
    let adapter = ScriptedAdapter::new();
    let fetcher = RecordingFetcher::new();
    adapter.set_catalog("Book", &[("A", "u1")]);
    adapter.set_assets("u1", &["https://img/a1.jpg", ""]);

    let outcome = downloader(&adapter, &fetcher)
        .run(&request(root.path()), &NoopObserver)
        .await
        .expect("run should not fail");

    assert_eq!(outcome.errors().len(), 1);
    assert_eq!(outcome.errors()[0].asset_url.as_deref(), Some(""));
    assert_eq!(fetcher.calls(), ["https://img/a1.jpg"]);
}

#[tokio::test]
async fn test_duplicate_asset_urls_fetched_once() {
    let root = TempDir::new().expect("failed to create temp dir");
    let adapter = ScriptedAdapter::new();
    let fetcher = RecordingFetcher::new();
    adapter.set_catalog("Book", &[("D", "u4")]);
    adapter.set_assets("u4", &["https://img/x.jpg", "https://img/x.jpg", "https://img/y.jpg"]);

    let outcome = downloader(&adapter, &fetcher)
        .run(&request(root.path()), &NoopObserver)
        .await
        .expect("run should not fail");
    assert!(outcome.is_success());

    let mut calls = fetcher.calls();
    calls.sort();
    assert_eq!(calls, ["https://img/x.jpg", "https://img/y.jpg"]);

    let chapter_dir = root.path().join("Book/chapters/0_D");
    let mut files: Vec<_> = std::fs::read_dir(&chapter_dir)
        .expect("chapter dir exists")
        .map(|e| e.expect("dir entry").file_name().into_string().expect("utf-8"))
        .collect();
    files.sort();
    assert_eq!(files, ["x.jpg", "y.jpg"]);
    assert_eq!(read_progress(&root.path().join("Book"))[0].assets.len(), 2);
}

#[tokio::test]
async fn test_already_complete_short_circuits_without_work() {
    let root = TempDir::new().expect("failed to create temp dir");
    let adapter = ScriptedAdapter::new();
    let fetcher = RecordingFetcher::new();
    three_chapter_book(&adapter);
    let downloader = downloader(&adapter, &fetcher);

    downloader
        .run(&request(root.path()), &NoopObserver)
        .await
        .expect("run should not fail");
    let progress_path = root.path().join("Book").join(PROGRESS_FILE_NAME);
    let before = std::fs::read(&progress_path).expect("progress exists");
    fetcher.reset_calls();
    adapter.reset_calls();

    let outcome = downloader
        .run(&request(root.path()), &NoopObserver)
        .await
        .expect("run should not fail");

    assert!(matches!(outcome, RunOutcome::AlreadyComplete { .. }));
    assert!(outcome.attempted().is_none());
    assert_eq!(adapter.catalog_calls.load(Ordering::SeqCst), 1);
    assert!(adapter.asset_calls().is_empty());
    assert!(fetcher.calls().is_empty());
    assert_eq!(std::fs::read(&progress_path).expect("progress exists"), before);
}

#[tokio::test]
async fn test_interrupted_run_prunes_stale_records_and_directories() {
    let root = TempDir::new().expect("failed to create temp dir");
    let adapter = ScriptedAdapter::new();
    let fetcher = RecordingFetcher::new();
    three_chapter_book(&adapter);
    fetcher.fail("https://img/c1.jpg");
    let downloader = downloader(&adapter, &fetcher);

    downloader
        .run(&request(root.path()), &NoopObserver)
        .await
        .expect("run should not fail");
    let book_dir = root.path().join("Book");
    assert!(book_dir.join("chapters/1_B/b1.jpg").exists());

    // B was republished under a new locator.
    adapter.set_catalog("Book", &[("A", "u1"), ("B", "u2-v2"), ("C", "u3")]);
    adapter.set_assets("u2-v2", &["https://img/b1-v2.jpg"]);
    fetcher.heal("https://img/c1.jpg");
    adapter.reset_calls();

    let outcome = downloader
        .run(&request(root.path()), &NoopObserver)
        .await
        .expect("run should not fail");
    assert!(outcome.is_success(), "unexpected outcome {outcome:?}");

    let mut attempted: Vec<_> = outcome
        .attempted()
        .expect("chapters attempted")
        .iter()
        .map(|c| c.href.clone())
        .collect();
    attempted.sort();
    assert_eq!(attempted, ["u2-v2", "u3"]);
    assert!(
        !book_dir.join("chapters/1_B/b1.jpg").exists(),
        "stale chapter content must be removed"
    );
    assert!(book_dir.join("chapters/1_B/b1-v2.jpg").exists());

    let records = read_progress(&book_dir);
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.href != "u2"));
}

#[tokio::test]
async fn test_retitled_chapter_with_same_href_is_downloaded_again() {
    let root = TempDir::new().expect("failed to create temp dir");
    let adapter = ScriptedAdapter::new();
    let fetcher = RecordingFetcher::new();
    adapter.set_catalog("Book", &[("A", "u1"), ("B", "u2")]);
    adapter.set_assets("u1", &["https://img/a1.jpg"]);
    adapter.set_assets("u2", &["https://img/b1.jpg"]);
    fetcher.fail("https://img/b1.jpg");
    let downloader = downloader(&adapter, &fetcher);

    downloader
        .run(&request(root.path()), &NoopObserver)
        .await
        .expect("run should not fail");

    adapter.set_catalog("Book", &[("A (remastered)", "u1"), ("B", "u2")]);
    fetcher.heal("https://img/b1.jpg");
    adapter.reset_calls();

    let outcome = downloader
        .run(&request(root.path()), &NoopObserver)
        .await
        .expect("run should not fail");
    assert!(outcome.is_success());

    let mut calls = adapter.asset_calls();
    calls.sort();
    assert_eq!(calls, ["u1", "u2"]);
    let records = read_progress(&root.path().join("Book"));
    assert_eq!(records.len(), 2);
    assert!(records.iter().any(|r| r.raw_name == "A (remastered)"));
}

#[tokio::test]
async fn test_always_reconcile_prunes_after_clean_run() {
    let root = TempDir::new().expect("failed to create temp dir");
    let adapter = ScriptedAdapter::new();
    let fetcher = RecordingFetcher::new();
    adapter.set_catalog("Book", &[("A", "u1"), ("B", "u2")]);
    adapter.set_assets("u1", &["https://img/a1.jpg"]);
    adapter.set_assets("u2", &["https://img/b1.jpg"]);
    let config = RunConfig {
        chapter_concurrency: 2,
        asset_concurrency: 2,
        always_reconcile: true,
    };
    let downloader = downloader_with(&adapter, &fetcher, config);

    downloader
        .run(&request(root.path()), &NoopObserver)
        .await
        .expect("run should not fail");

    // Same count, but B was replaced upstream.
    adapter.set_catalog("Book", &[("A", "u1"), ("B", "u2-new")]);
    adapter.set_assets("u2-new", &["https://img/b2.jpg"]);

    let outcome = downloader
        .run(&request(root.path()), &NoopObserver)
        .await
        .expect("run should not fail");
    assert_eq!(outcome.attempted().map(<[_]>::len), Some(1));

    let records = read_progress(&root.path().join("Book"));
    let mut hrefs: Vec<_> = records.iter().map(|r| r.href.as_str()).collect();
    hrefs.sort_unstable();
    assert_eq!(hrefs, ["u1", "u2-new"]);
}

#[tokio::test]
async fn test_catalog_failure_writes_nothing() {
    let root = TempDir::new().expect("failed to create temp dir");
    let adapter = ScriptedAdapter::new();
    let fetcher = RecordingFetcher::new();
    adapter.clear_catalog();

    let outcome = downloader(&adapter, &fetcher)
        .run(&request(root.path()), &NoopObserver)
        .await
        .expect("run should not fail");

    assert!(matches!(outcome, RunOutcome::CatalogParseFailed { .. }));
    assert_eq!(
        std::fs::read_dir(root.path()).expect("root readable").count(),
        0,
        "no files may be written"
    );
}

#[tokio::test]
async fn test_unknown_host_is_catalog_failure() {
    let root = TempDir::new().expect("failed to create temp dir");
    let adapter = ScriptedAdapter::new();
    let fetcher = RecordingFetcher::new();
    three_chapter_book(&adapter);

    let outcome = downloader(&adapter, &fetcher)
        .run(
            &RunRequest::new("https://unknown.example/book", root.path()),
            &NoopObserver,
        )
        .await
        .expect("run should not fail");

    let RunOutcome::CatalogParseFailed { target_ref, .. } = &outcome else {
        panic!("expected CatalogParseFailed, got {outcome:?}");
    };
    assert_eq!(target_ref, "https://unknown.example/book");
    assert_eq!(adapter.catalog_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_malformed_progress_is_storage_error() {
    let root = TempDir::new().expect("failed to create temp dir");
    let adapter = ScriptedAdapter::new();
    let fetcher = RecordingFetcher::new();
    three_chapter_book(&adapter);
    let book_dir = root.path().join("Book");
    std::fs::create_dir_all(&book_dir).expect("create book dir");
    std::fs::write(book_dir.join(PROGRESS_FILE_NAME), b"{not json").expect("write progress");

    let result = downloader(&adapter, &fetcher)
        .run(&request(root.path()), &NoopObserver)
        .await;

    assert!(
        matches!(result, Err(RunError::Storage(StoreError::Malformed { .. }))),
        "unexpected result {result:?}"
    );
    assert!(fetcher.calls().is_empty());
    assert_eq!(
        std::fs::read(book_dir.join(PROGRESS_FILE_NAME)).expect("progress kept"),
        b"{not json",
        "user data must not be overwritten"
    );
}

#[tokio::test]
async fn test_ignored_chapters_are_skipped() {
    let root = TempDir::new().expect("failed to create temp dir");
    let adapter = ScriptedAdapter::new();
    let fetcher = RecordingFetcher::new();
    three_chapter_book(&adapter);
    let req = request(root.path()).with_ignore(vec![IgnoreRule {
        name: "Book".to_string(),
        chapters: Some(vec!["B".to_string()]),
    }]);
    let downloader = downloader(&adapter, &fetcher);

    let outcome = downloader
        .run(&req, &NoopObserver)
        .await
        .expect("run should not fail");
    assert_eq!(outcome.attempted().map(<[_]>::len), Some(2));
    assert!(!adapter.asset_calls().contains(&"u2".to_string()));

    adapter.reset_calls();
    let again = downloader
        .run(&req, &NoopObserver)
        .await
        .expect("run should not fail");
    assert!(
        matches!(again, RunOutcome::AlreadyComplete { .. }),
        "only ignored chapters remain, got {again:?}"
    );
    assert!(adapter.asset_calls().is_empty());
}

#[tokio::test]
async fn test_ignored_book_is_not_created() {
    let root = TempDir::new().expect("failed to create temp dir");
    let adapter = ScriptedAdapter::new();
    let fetcher = RecordingFetcher::new();
    three_chapter_book(&adapter);
    let req = request(root.path()).with_ignore(vec![IgnoreRule {
        name: "Book".to_string(),
        chapters: None,
    }]);

    let outcome = downloader(&adapter, &fetcher)
        .run(&req, &NoopObserver)
        .await
        .expect("run should not fail");

    assert!(matches!(outcome, RunOutcome::AlreadyComplete { .. }));
    assert!(!root.path().join("Book").exists());
    assert!(fetcher.calls().is_empty());
}

#[tokio::test]
async fn test_chapter_concurrency_one_still_completes() {
    let root = TempDir::new().expect("failed to create temp dir");
    let adapter = ScriptedAdapter::new();
    let fetcher = RecordingFetcher::new();
    three_chapter_book(&adapter);
    let config = RunConfig {
        chapter_concurrency: 1,
        asset_concurrency: 1,
        always_reconcile: false,
    };

    let outcome = downloader_with(&adapter, &fetcher, config)
        .run(&request(root.path()), &NoopObserver)
        .await
        .expect("run should not fail");
    assert!(outcome.is_success());
    assert_eq!(read_progress(&root.path().join("Book")).len(), 3);
}
