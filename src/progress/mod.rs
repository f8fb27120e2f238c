//! Durable record of which chapters of a book are fully downloaded.
//!
//! One `progress.json` per book directory holds an array of
//! [`ProgressRecord`]s. A record is written only after every asset of its
//! chapter is on disk, so anything missing from the file is redone on the
//! next run and nothing in it is fetched again.

mod error;
mod record;
mod store;

pub use error::StoreError;
pub use record::{ProgressRecord, RunState};
pub use store::ProgressStore;

/// File name of the progress store inside a book directory.
pub const PROGRESS_FILE_NAME: &str = "progress.json";
