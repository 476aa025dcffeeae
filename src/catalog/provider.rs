//! Trait definition for catalog providers.
//!
//! This module defines the [`CatalogProvider`] trait that all catalog
//! backends (IGDB, GiantBomb, a local Calibre library, ...) implement. The
//! orchestrator only ever sees this capability set, so providers can be
//! tried in priority order without any knowledge of provider-specific
//! request shapes.

use async_trait::async_trait;

use loreforge_common::{CatalogRecord, CoverRef, CoverSource, Result};

/// Async trait that all catalog providers must implement.
///
/// Providers are expected to be wrapped in an `Arc` so they can be shared
/// across enrichment requests.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Short, lowercase identifier for this provider (e.g. `"igdb"`).
    fn name(&self) -> &'static str;

    /// Returns `true` when the provider has been configured with valid
    /// credentials (or a reachable library) and is ready to serve requests.
    fn is_available(&self) -> bool;

    /// Search for items matching `title`, best match first.
    ///
    /// The returned sequence is finite and not restartable; a fresh call
    /// re-queries the provider. Results may be summaries — callers follow up
    /// with [`fetch_by_id`](Self::fetch_by_id) for full detail.
    async fn search(&self, title: &str, limit: usize) -> Result<Vec<CatalogRecord>>;

    /// Fetch the full-detail record for a provider-specific id.
    async fn fetch_by_id(&self, external_id: &str) -> Result<CatalogRecord>;

    /// Map a record's cover handle to a fetchable source.
    ///
    /// Returns `None` (not an error) when the handle cannot be resolved —
    /// e.g. a local cover file that no longer exists.
    fn resolve_cover(&self, cover: &CoverRef) -> Option<CoverSource>;
}

impl std::fmt::Debug for dyn CatalogProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogProvider")
            .field("name", &self.name())
            .finish()
    }
}
