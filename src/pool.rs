//! Bounded work pool that runs every task and collects every outcome.
//!
//! A [`BoundedPool`] caps how many futures are in flight at once. It never
//! short-circuits: a task that returns an error (as its `T`) does not stop
//! its siblings, and the result vector has one entry per submitted item, in
//! submission order.
//!
//! # Example
//!
//! ```
//! use comic_dl_core::pool::BoundedPool;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = BoundedPool::new(2)?;
//! let results = pool
//!     .run_all(1..=5, |n| async move {
//!         if n % 2 == 0 { Err(n) } else { Ok(n * 10) }
//!     })
//!     .await;
//! assert_eq!(results, vec![Ok(10), Err(2), Ok(30), Err(4), Ok(50)]);
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::Semaphore;
use tracing::debug;

/// Minimum allowed concurrency value.
pub const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
pub const MAX_CONCURRENCY: usize = 100;

/// Error type for pool construction.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PoolError {
    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },
}

/// Concurrency limiter over a batch of async tasks.
///
/// Cheap to clone; clones share the same permits.
#[derive(Debug, Clone)]
pub struct BoundedPool {
    semaphore: Arc<Semaphore>,
    concurrency: usize,
}

impl BoundedPool {
    /// Creates a pool allowing at most `concurrency` tasks in flight.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConcurrency`] outside `1..=100`.
    pub fn new(concurrency: usize) -> Result<Self, PoolError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(PoolError::InvalidConcurrency { value: concurrency });
        }
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(concurrency)),
            concurrency,
        })
    }

    /// Returns the configured concurrency limit.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Returns a new pool with the same limit but its own permits.
    #[must_use]
    pub fn detached(&self) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(self.concurrency)),
            concurrency: self.concurrency,
        }
    }

    /// Runs `task` for every item with at most `concurrency` in flight.
    ///
    /// A task's future is only created once it holds a permit, so no work
    /// starts early. Results are returned in submission order.
    pub async fn run_all<I, F, Fut, T>(&self, items: I, task: F) -> Vec<T>
    where
        I: IntoIterator,
        F: Fn(I::Item) -> Fut,
        Fut: Future<Output = T>,
    {
        let task = &task;
        let semaphore = &self.semaphore;
        let futures: Vec<_> = items
            .into_iter()
            .map(|item| async move {
                // The semaphore is owned here and never closed, so acquire cannot fail.
                let _permit = semaphore.acquire().await.ok();
                task(item).await
            })
            .collect();

        debug!(
            tasks = futures.len(),
            concurrency = self.concurrency,
            "running pool batch"
        );
        join_all(futures).await
    }
}
