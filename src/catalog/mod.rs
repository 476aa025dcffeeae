//! Catalog providers and the priority-ordered registry.

pub mod provider;
pub mod providers;
pub mod registry;

pub use provider::CatalogProvider;
pub use registry::ProviderRegistry;
