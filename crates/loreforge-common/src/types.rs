//! Shared value types for catalog records, cover assets, and auth tokens.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single frontmatter-destined value.
///
/// Deliberately narrower than arbitrary JSON: catalog fields are strings,
/// numbers, booleans, or lists of strings, which is what the vault's
/// structured header can represent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Boolean flag (e.g. `enriched`).
    Bool(bool),
    /// Whole number (e.g. a provider id).
    Integer(i64),
    /// Floating point number (e.g. a rating).
    Float(f64),
    /// Free text.
    Text(String),
    /// Ordered list of strings (e.g. platforms).
    List(Vec<String>),
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(v: Vec<String>) -> Self {
        Self::List(v)
    }
}

/// Provider-specific handle for a record's cover artwork.
///
/// Resolution to something fetchable is the owning provider's job; a record
/// without cover artwork simply carries `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CoverRef {
    /// An opaque image id the provider can expand into a URL (IGDB style).
    ImageId(String),
    /// A fully-qualified image URL (GiantBomb style).
    Url(String),
    /// A file inside a local library (Calibre style).
    Path(PathBuf),
}

/// A fetchable cover source produced by resolving a [`CoverRef`].
#[derive(Debug, Clone, PartialEq)]
pub enum CoverSource {
    /// Download over HTTP(S).
    Url(String),
    /// Copy from the local filesystem.
    File(PathBuf),
}

/// One catalog item as returned by a provider.
///
/// Immutable once returned; search results may be summaries that a later
/// `fetch_by_id` call expands into full detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogRecord {
    /// Name of the provider that produced this record.
    pub provider: String,
    /// Provider-specific identifier, usable with `fetch_by_id`.
    pub external_id: String,
    /// Display title.
    pub title: String,
    /// Long-form description, destined for the document body.
    pub summary: Option<String>,
    /// Cover artwork handle, if the provider has one.
    pub cover: Option<CoverRef>,
    /// Frontmatter-destined descriptive fields.
    pub fields: BTreeMap<String, FieldValue>,
}

/// A cover asset that was written to the local cache.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetReference {
    /// Where the bytes came from (URL or source file path, for logging).
    pub source: String,
    /// Deterministic cache location, derived from the document slug.
    pub local_path: PathBuf,
    /// Size of the written file in bytes.
    pub size_bytes: u64,
}

/// A bearer token with its expiry instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Opaque token value, sent as `Authorization: Bearer <value>`.
    pub value: String,
    /// Instant after which the provider will reject the token.
    pub expires_at: DateTime<Utc>,
}
