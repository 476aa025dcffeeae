//! Common error types used throughout loreforge.
//!
//! Every fatal outcome of an enrichment request is a variant here, so the
//! caller can render a user-facing message without digging through nested
//! error chains. Asset (cover) failures are deliberately *not* represented:
//! they degrade to a missing field, never to an error.

use std::fmt;

/// Why a search produced no usable result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundReason {
    /// Every available provider answered, but none had a match.
    NoMatches,
    /// No provider could be reached; the title may well exist.
    ProvidersUnavailable,
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMatches => write!(f, "no matches"),
            Self::ProvidersUnavailable => write!(f, "all providers unavailable"),
        }
    }
}

/// Common error type for loreforge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Token acquisition failed; the request cannot proceed.
    #[error("Authentication unavailable: {0}")]
    AuthUnavailable(String),

    /// No provider returned a match for the requested title.
    #[error("No catalog match for '{title}': {reason}")]
    NotFound {
        /// The title that was searched for.
        title: String,
        /// Whether providers answered empty or were unreachable.
        reason: NotFoundReason,
    },

    /// A single provider could not be reached (network error or 5xx).
    #[error("Provider '{provider}' unavailable: {reason}")]
    ProviderUnavailable {
        /// Name of the failing provider.
        provider: &'static str,
        /// Transport-level detail.
        reason: String,
    },

    /// Writing the final document to the vault failed.
    #[error("Failed to persist document '{path}': {reason}")]
    Persistence {
        /// Vault-relative path of the document.
        path: String,
        /// Store-reported detail.
        reason: String,
    },

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input was provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new AuthUnavailable error.
    pub fn auth_unavailable<S: Into<String>>(msg: S) -> Self {
        Self::AuthUnavailable(msg.into())
    }

    /// Create a new NotFound error.
    pub fn not_found<S: Into<String>>(title: S, reason: NotFoundReason) -> Self {
        Self::NotFound {
            title: title.into(),
            reason,
        }
    }

    /// Create a new ProviderUnavailable error.
    pub fn provider_unavailable<S: Into<String>>(provider: &'static str, reason: S) -> Self {
        Self::ProviderUnavailable {
            provider,
            reason: reason.into(),
        }
    }

    /// Create a new Persistence error.
    pub fn persistence<P: Into<String>, S: Into<String>>(path: P, reason: S) -> Self {
        Self::Persistence {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new Internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
