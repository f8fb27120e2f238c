//! Durable `progress.json` store with single-writer mutation.

use std::path::{Component, Path, PathBuf};

use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::{PROGRESS_FILE_NAME, ProgressRecord, RunState, StoreError};
use crate::persist::write_atomic;

/// Completed-chapter records for one book directory.
///
/// All mutation goes through [`append`](Self::append) and
/// [`replace_and_prune`](Self::replace_and_prune); both hold the same lock
/// across the disk write, so concurrent chapter tasks never interleave writes.
#[derive(Debug)]
pub struct ProgressStore {
    book_dir: PathBuf,
    file_path: PathBuf,
    records: Mutex<Vec<ProgressRecord>>,
}

impl ProgressStore {
    /// Loads the store for `book_dir`, creating an empty file if none exists.
    ///
    /// `total` is the size of the freshly resolved catalog and is only used
    /// to derive the returned [`RunState`].
    ///
    /// # Errors
    ///
    /// - [`StoreError::Malformed`] if the file is not a record array
    /// - [`StoreError::Io`] if it cannot be read or created
    #[instrument(skip_all, fields(book_dir = %book_dir.display(), total))]
    pub async fn load(book_dir: &Path, total: usize) -> Result<(Self, RunState), StoreError> {
        let file_path = book_dir.join(PROGRESS_FILE_NAME);

        let records: Vec<ProgressRecord> = match tokio::fs::read(&file_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| StoreError::malformed(&file_path, e))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no progress file yet, creating empty store");
                write_atomic(&file_path, b"[]")
                    .await
                    .map_err(|e| StoreError::io(&file_path, e))?;
                Vec::new()
            }
            Err(e) => return Err(StoreError::io(&file_path, e)),
        };

        let state = RunState::at_load(records.len(), total);
        debug!(
            completed = state.completed,
            interrupted = state.interrupted,
            "progress loaded"
        );

        Ok((
            Self {
                book_dir: book_dir.to_path_buf(),
                file_path,
                records: Mutex::new(records),
            },
            state,
        ))
    }

    /// Returns the book directory this store belongs to.
    #[must_use]
    pub fn book_dir(&self) -> &Path {
        &self.book_dir
    }

    /// Returns a snapshot of the current records.
    pub async fn records(&self) -> Vec<ProgressRecord> {
        self.records.lock().await.clone()
    }

    /// Returns the number of recorded chapters.
    pub async fn completed_count(&self) -> usize {
        self.records.lock().await.len()
    }

    /// Adds `record` and rewrites the file before returning.
    ///
    /// A record for the same chapter (same href and title) is replaced
    /// rather than duplicated. Memory is only updated once the write
    /// succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file cannot be written.
    #[instrument(skip_all, fields(chapter = %record.name))]
    pub async fn append(&self, record: ProgressRecord) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;

        let mut next = records.clone();
        match next
            .iter_mut()
            .find(|existing| existing.href == record.href && existing.raw_name == record.raw_name)
        {
            Some(existing) => *existing = record,
            None => next.push(record),
        }

        self.persist(&next).await?;
        *records = next;
        debug!(completed = records.len(), "chapter recorded");
        Ok(())
    }

    /// Keeps only `keep`, deletes the directories of every dropped record,
    /// and rewrites the file. Returns the dropped records.
    ///
    /// A dropped record whose directory name is still used by a kept record
    /// keeps its directory.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if a directory cannot be removed or the file
    /// cannot be written.
    #[instrument(skip_all, fields(keep = keep.len()))]
    pub async fn replace_and_prune(
        &self,
        keep: Vec<ProgressRecord>,
    ) -> Result<Vec<ProgressRecord>, StoreError> {
        let mut records = self.records.lock().await;

        let (kept, pruned): (Vec<_>, Vec<_>) = records
            .iter()
            .cloned()
            .partition(|record| keep.contains(record));

        for record in &pruned {
            if kept.iter().any(|k| k.name == record.name) {
                continue;
            }
            self.remove_chapter_dir(record).await?;
        }

        self.persist(&kept).await?;
        *records = kept;

        if !pruned.is_empty() {
            info!(
                pruned = pruned.len(),
                remaining = records.len(),
                "pruned stale progress records"
            );
        }
        Ok(pruned)
    }

    async fn remove_chapter_dir(&self, record: &ProgressRecord) -> Result<(), StoreError> {
        let relative = PathBuf::from(record.relative_dir());
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            warn!(chapter = %record.name, "refusing to delete directory outside the book");
            return Ok(());
        }

        let dir = self.book_dir.join(relative);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {
                debug!(dir = %dir.display(), "removed stale chapter directory");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(dir, e)),
        }
    }

    async fn persist(&self, records: &[ProgressRecord]) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(records)
            .map_err(|e| StoreError::encode(&self.file_path, e))?;
        write_atomic(&self.file_path, &bytes)
            .await
            .map_err(|e| StoreError::io(&self.file_path, e))
    }
}
