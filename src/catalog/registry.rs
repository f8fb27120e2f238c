//! Adapter registry with host-based lookup.
//!
//! The [`AdapterRegistry`] holds every known [`CatalogAdapter`] and picks the
//! first one (in registration order) that claims a target URL.

use std::sync::Arc;

use tracing::debug;

use super::{BaoziAdapter, CatalogAdapter, CatalogError, GodamangaAdapter};

/// Ordered collection of catalog adapters.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: Vec<Arc<dyn CatalogAdapter>>,
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.adapters.iter().map(|a| a.name()))
            .finish()
    }
}

impl AdapterRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an adapter. Earlier registrations win on overlapping hosts.
    #[tracing::instrument(skip(self, adapter), fields(adapter_name = adapter.name()))]
    pub fn register(&mut self, adapter: Arc<dyn CatalogAdapter>) {
        debug!("registering catalog adapter");
        self.adapters.push(adapter);
    }

    /// Returns the number of registered adapters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    /// Returns true if no adapters are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Returns the first adapter that can handle `target`.
    #[must_use]
    pub fn find(&self, target: &str) -> Option<Arc<dyn CatalogAdapter>> {
        self.adapters
            .iter()
            .find(|adapter| adapter.can_handle(target))
            .cloned()
    }
}

/// Builds the registry used by the CLI.
///
/// # Errors
///
/// Returns [`CatalogError`] when an adapter's HTTP client cannot be built.
pub fn build_default_adapter_registry() -> Result<AdapterRegistry, CatalogError> {
    let mut registry = AdapterRegistry::new();
    // `baozimh.one` hosts would also match the baozi host rule.
    registry.register(Arc::new(GodamangaAdapter::new()?));
    registry.register(Arc::new(BaoziAdapter::new()?));
    Ok(registry)
}
