//! Error types for catalog resolution.
//!
//! A catalog error aborts a run only when it happens while resolving the
//! book itself; the same type returned from a chapter's asset lookup is
//! recorded and the run moves on.

use thiserror::Error;

/// Errors raised by [`CatalogAdapter`](super::CatalogAdapter) implementations.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// No registered adapter recognizes the target's host.
    #[error("no catalog adapter for '{target}'\n  Suggestion: check the URL points at a supported site")]
    NoAdapter {
        /// The target reference that matched nothing.
        target: String,
    },

    /// The target is not a valid URL.
    #[error("invalid catalog URL '{url}'")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
    },

    /// The page could not be fetched.
    #[error("failed to fetch '{url}': {reason}")]
    Fetch {
        /// The page URL.
        url: String,
        /// Transport error or HTTP status description.
        reason: String,
    },

    /// The page was fetched but did not look like the expected layout.
    #[error("unrecognized page '{url}': {reason}")]
    Unrecognized {
        /// The page URL.
        url: String,
        /// What was missing.
        reason: String,
    },

    /// The catalog resolved but contains no chapters.
    #[error("catalog '{url}' has no chapters")]
    Empty {
        /// The catalog URL.
        url: String,
    },

    /// The catalog breaks a structural invariant (dense indices, unique names).
    #[error("inconsistent catalog '{url}': {reason}")]
    Inconsistent {
        /// The catalog URL.
        url: String,
        /// Which invariant was broken.
        reason: String,
    },
}

impl CatalogError {
    /// Creates a `NoAdapter` error.
    #[must_use]
    pub fn no_adapter(target: impl Into<String>) -> Self {
        Self::NoAdapter {
            target: target.into(),
        }
    }

    /// Creates an `InvalidUrl` error.
    #[must_use]
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a `Fetch` error.
    #[must_use]
    pub fn fetch(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates an `Unrecognized` error.
    #[must_use]
    pub fn unrecognized(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unrecognized {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates an `Empty` error.
    #[must_use]
    pub fn empty(url: impl Into<String>) -> Self {
        Self::Empty { url: url.into() }
    }

    /// Creates an `Inconsistent` error.
    #[must_use]
    pub fn inconsistent(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Inconsistent {
            url: url.into(),
            reason: reason.into(),
        }
    }
}
