//! Slug identity derived from a title.
//!
//! A slug is the join key between a document, its cached cover asset, and
//! later re-enrichment calls. The derivation is deterministic and lossy, so
//! two different titles can collide; callers treat a collision as "likely the
//! same item", never as a correctness guarantee.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Fallback when a title normalizes to nothing (e.g. all punctuation).
const EMPTY_SLUG: &str = "untitled";

/// A normalized, filesystem-safe identity derived from a title.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Derive a slug from a display title.
    ///
    /// Case-folds, drops punctuation, and collapses whitespace, dashes, and
    /// underscores into single `-` separators:
    /// `"The Witcher 3: Wild Hunt"` becomes `the-witcher-3-wild-hunt`.
    pub fn from_title(title: &str) -> Self {
        let mut out = String::with_capacity(title.len());
        let mut pending_separator = false;

        for ch in title.chars() {
            if ch.is_alphanumeric() {
                if pending_separator && !out.is_empty() {
                    out.push('-');
                }
                pending_separator = false;
                for lower in ch.to_lowercase() {
                    out.push(lower);
                }
            } else if ch.is_whitespace() || ch == '-' || ch == '_' {
                pending_separator = true;
            }
            // Everything else (punctuation, symbols) is dropped outright.
        }

        if out.is_empty() {
            out.push_str(EMPTY_SLUG);
        }
        Self(out)
    }

    /// View the slug as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_title() {
        assert_eq!(Slug::from_title("Celeste").as_str(), "celeste");
    }

    #[test]
    fn punctuation_and_case() {
        assert_eq!(
            Slug::from_title("The Witcher 3: Wild Hunt").as_str(),
            "the-witcher-3-wild-hunt"
        );
        assert_eq!(Slug::from_title("NieR:Automata").as_str(), "nierautomata");
    }

    #[test]
    fn collapses_separator_runs() {
        assert_eq!(Slug::from_title("a  -  b__c").as_str(), "a-b-c");
        assert_eq!(Slug::from_title("  padded  ").as_str(), "padded");
    }

    #[test]
    fn deterministic() {
        let a = Slug::from_title("Hollow Knight");
        let b = Slug::from_title("Hollow Knight");
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_titles_can_collide() {
        // Lossy by design: punctuation-only differences disappear.
        assert_eq!(
            Slug::from_title("Portal 2"),
            Slug::from_title("Portal: 2!")
        );
    }

    #[test]
    fn degenerate_title_gets_fallback() {
        assert_eq!(Slug::from_title("!!!").as_str(), "untitled");
        assert_eq!(Slug::from_title("").as_str(), "untitled");
    }

    #[test]
    fn unicode_is_case_folded() {
        assert_eq!(Slug::from_title("Pokémon GO").as_str(), "pokémon-go");
    }
}
