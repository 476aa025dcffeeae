//! Provider registry with priority-ordered fallback.
//!
//! The [`ProviderRegistry`] holds [`CatalogProvider`] instances in priority
//! order (primary first). A search walks that order until one provider
//! returns a non-empty result set; unreachable providers are skipped with a
//! warning rather than failing the whole lookup.

use std::sync::Arc;

use tracing::{debug, warn};

use loreforge_common::{CatalogRecord, Error, NotFoundReason, Result};

use super::provider::CatalogProvider;

/// A registry that manages multiple [`CatalogProvider`] implementations.
///
/// Providers are stored in registration order; the first registered,
/// available provider is the *primary*.
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn CatalogProvider>>,
}

impl ProviderRegistry {
    /// Create an empty registry with no providers.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Register a provider. Registration order is priority order.
    pub fn register(&mut self, provider: Arc<dyn CatalogProvider>) {
        self.providers.push(provider);
    }

    /// Return the first available provider, or `None` if no providers are
    /// configured / available.
    pub fn primary(&self) -> Option<Arc<dyn CatalogProvider>> {
        self.providers.iter().find(|p| p.is_available()).cloned()
    }

    /// Look up a provider by its [`CatalogProvider::name`].
    pub fn get(&self, name: &str) -> Option<Arc<dyn CatalogProvider>> {
        self.providers.iter().find(|p| p.name() == name).cloned()
    }

    /// Search providers in priority order until one returns matches.
    ///
    /// Semantics per provider:
    /// - unavailable (unconfigured) — skipped silently
    /// - non-empty result set — returned together with the owning provider
    /// - empty result set — next provider is tried
    /// - [`Error::ProviderUnavailable`] — logged, next provider is tried
    /// - [`Error::AuthUnavailable`] or any other error — fatal, surfaced
    ///   immediately
    ///
    /// When no provider produced a match the result is [`Error::NotFound`],
    /// with the reason distinguishing "everyone answered empty" from
    /// "nobody could be reached".
    pub async fn search(
        &self,
        title: &str,
        limit: usize,
    ) -> Result<(Arc<dyn CatalogProvider>, Vec<CatalogRecord>)> {
        let mut queried = 0usize;
        let mut unavailable = 0usize;

        for provider in &self.providers {
            if !provider.is_available() {
                debug!(provider = provider.name(), "skipping unconfigured provider");
                continue;
            }
            queried += 1;

            match provider.search(title, limit).await {
                Ok(results) if !results.is_empty() => {
                    debug!(
                        provider = provider.name(),
                        count = results.len(),
                        "search matched"
                    );
                    return Ok((provider.clone(), results));
                }
                Ok(_) => {
                    debug!(provider = provider.name(), title, "no matches, trying next");
                }
                Err(Error::AuthUnavailable(reason)) => {
                    return Err(Error::AuthUnavailable(reason));
                }
                Err(e @ Error::ProviderUnavailable { .. }) => {
                    warn!(
                        provider = provider.name(),
                        error = %e,
                        "provider unreachable, trying next"
                    );
                    unavailable += 1;
                }
                // Anything else is a bug or bad input, not an outage.
                Err(e) => return Err(e),
            }
        }

        let reason = if queried > 0 && unavailable == queried {
            NotFoundReason::ProvidersUnavailable
        } else {
            NotFoundReason::NoMatches
        };
        Err(Error::not_found(title, reason))
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
