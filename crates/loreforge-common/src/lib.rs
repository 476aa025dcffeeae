//! Shared types, identity, and errors for loreforge.
//!
//! This crate is the dependency leaf of the workspace: the error taxonomy,
//! the slug identity type, and the catalog/token value types live here so
//! every other part of loreforge can agree on them.

pub mod error;
pub mod slug;
pub mod types;

pub use error::{Error, NotFoundReason, Result};
pub use slug::Slug;
pub use types::{AssetReference, CatalogRecord, CoverRef, CoverSource, FieldValue, Token};
