//! Structured document headers and the merge policy.
//!
//! A document's header is a flat map of field name to [`FieldValue`]. The
//! merge policy is asymmetric on purpose: catalog-sourced facts (title,
//! genres, release date) are refreshed on every enrichment pass, while the
//! user's own tracked state (status, rating, personal tags, dates) is never
//! overwritten once set.

mod codec;

pub use codec::{parse, render};

use std::collections::BTreeMap;

use loreforge_common::FieldValue;

/// A document's structured header.
pub type Frontmatter = BTreeMap<String, FieldValue>;

/// Field names that enrichment must never overwrite once the document has a
/// value for them. These carry user-tracked state, not catalog facts.
pub const PROTECTED_FIELDS: &[&str] = &[
    "play_status",
    "status",
    "star_rating",
    "rating",
    "tags",
    "date_started",
    "date_completed",
    "notes",
];

/// Whether a field belongs to the never-overwrite set.
pub fn is_protected(field: &str) -> bool {
    PROTECTED_FIELDS.contains(&field)
}

/// Merge incoming enrichment fields into an existing header.
///
/// Per incoming field:
/// - no existing document, or no existing value: set verbatim
/// - existing value on an unprotected field: overwritten (catalog refresh)
/// - existing value on a protected field: preserved unconditionally
///
/// Fields present only in `existing` are carried over unchanged; merging
/// never deletes.
pub fn merge(existing: Option<&Frontmatter>, incoming: Frontmatter) -> Frontmatter {
    let mut merged = existing.cloned().unwrap_or_default();
    for (field, value) in incoming {
        if merged.contains_key(&field) && is_protected(&field) {
            continue;
        }
        merged.insert(field, value);
    }
    merged
}
