//! Previously downloaded books on disk.
//!
//! Every finished or partially finished run leaves a `bookInfo.json` in its
//! book directory. Update runs scan a destination root for these files to
//! recover each book's catalog URL.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};

use crate::catalog::BookInfo;
use crate::persist::write_atomic;
use crate::pool::BoundedPool;
use crate::progress::StoreError;

/// File name of the book metadata file inside a book directory.
pub const BOOK_INFO_FILE_NAME: &str = "bookInfo.json";

const SCAN_CONCURRENCY: usize = 10;

/// Writes `book` as `bookInfo.json` in `book_dir`, replacing any previous one.
///
/// # Errors
///
/// Returns [`StoreError`] if encoding or the atomic write fails.
pub async fn write_book_info(book_dir: &Path, book: &BookInfo) -> Result<(), StoreError> {
    let path = book_dir.join(BOOK_INFO_FILE_NAME);
    let bytes = serde_json::to_vec_pretty(book).map_err(|e| StoreError::encode(&path, e))?;
    write_atomic(&path, &bytes)
        .await
        .map_err(|e| StoreError::io(&path, e))
}

/// Reads `bookInfo.json` from `book_dir`.
///
/// # Errors
///
/// - [`StoreError::Io`] if the file cannot be read
/// - [`StoreError::Malformed`] if it is not valid book metadata
pub async fn read_book_info(book_dir: &Path) -> Result<BookInfo, StoreError> {
    let path = book_dir.join(BOOK_INFO_FILE_NAME);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| StoreError::io(&path, e))?;
    serde_json::from_slice(&bytes).map_err(|e| StoreError::malformed(&path, e))
}

/// Returns the metadata of every book directory directly under `root`.
///
/// Directories without a readable `bookInfo.json` are skipped; a missing
/// root yields an empty list. Results are sorted by directory name.
#[instrument(skip_all, fields(root = %root.display()))]
pub async fn scan_books(root: &Path) -> Vec<BookInfo> {
    let dirs = match list_subdirectories(root).await {
        Ok(dirs) => dirs,
        Err(e) => {
            debug!(error = %e, "cannot list destination root");
            return Vec::new();
        }
    };

    let Ok(pool) = BoundedPool::new(SCAN_CONCURRENCY) else {
        return Vec::new();
    };
    let results = pool
        .run_all(dirs, |dir| async move {
            match read_book_info(&dir).await {
                Ok(book) => Some(book),
                Err(e) => {
                    if !matches!(&e, StoreError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
                    {
                        warn!(dir = %dir.display(), error = %e, "skipping unreadable book");
                    }
                    None
                }
            }
        })
        .await;

    let books: Vec<BookInfo> = results.into_iter().flatten().collect();
    debug!(books = books.len(), "scan complete");
    books
}

async fn list_subdirectories(root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(root).await?;
    let mut dirs = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}
