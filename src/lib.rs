//! Loreforge - vault note enrichment from game and media catalogs.
//!
//! The crate wires four concerns together: provider-agnostic catalog lookups
//! with fallback ordering ([`catalog`]), a persistent auto-refreshing bearer
//! token ([`auth`]), best-effort cover-art caching ([`covers`]), and a
//! frontmatter merge that refreshes catalog facts without clobbering
//! user-owned fields ([`frontmatter`]). The [`enrich`] module drives the
//! whole pipeline against a [`vault::VaultStore`] collaborator.

pub mod auth;
pub mod catalog;
pub mod config;
pub mod covers;
pub mod enrich;
pub mod frontmatter;
pub mod vault;
