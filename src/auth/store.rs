//! Persistent, auto-refreshing token store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use loreforge_common::{Error, Result, Token};

/// Tokens within this many seconds of expiry are treated as already expired,
/// so a request started now cannot race the provider's clock.
pub const EXPIRY_MARGIN_SECS: i64 = 60;

/// Network re-authentication seam.
///
/// Production code uses [`TwitchAuthenticator`](super::TwitchAuthenticator);
/// tests substitute counting stubs to observe refresh behavior.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Short provider identity, used to key the persisted token file.
    fn provider(&self) -> &'static str;

    /// Acquire a brand-new token from the network.
    async fn authenticate(&self) -> Result<Token>;
}

/// Persists and refreshes the bearer token for a single provider.
///
/// Concurrent `get()` calls are single-flight: the refresh runs under the
/// store's mutex, so the first caller performs the network round trip and
/// every waiter reuses its result.
pub struct TokenStore {
    authenticator: Box<dyn Authenticator>,
    cache_path: PathBuf,
    current: Mutex<Option<Token>>,
}

impl TokenStore {
    /// Create a store persisting under `token_dir`, one JSON file keyed by
    /// the authenticator's provider name.
    pub fn new(authenticator: Box<dyn Authenticator>, token_dir: &Path) -> Self {
        let cache_path = token_dir.join(format!("{}.json", authenticator.provider()));
        Self {
            authenticator,
            cache_path,
            current: Mutex::new(None),
        }
    }

    /// Return a token guaranteed fresh for at least [`EXPIRY_MARGIN_SECS`].
    ///
    /// Falls back through: in-memory token, persisted token, network
    /// re-authentication. A successful refresh is written through to disk.
    pub async fn get(&self) -> Result<Token> {
        let mut slot = self.current.lock().await;
        let now = Utc::now();

        if let Some(token) = slot.as_ref() {
            if is_fresh(token, now) {
                return Ok(token.clone());
            }
            debug!(
                provider = self.authenticator.provider(),
                expires_at = %token.expires_at,
                "cached token inside expiry margin, refreshing"
            );
        }

        if let Some(token) = self.load_persisted() {
            if is_fresh(&token, now) {
                *slot = Some(token.clone());
                return Ok(token);
            }
        }

        let token = self.authenticator.authenticate().await?;
        debug!(
            provider = self.authenticator.provider(),
            expires_at = %token.expires_at,
            "acquired fresh token"
        );

        // Cache write failure only costs a re-auth on the next run.
        if let Err(e) = self.persist(&token) {
            warn!(
                provider = self.authenticator.provider(),
                error = %e,
                "failed to persist token cache"
            );
        }

        *slot = Some(token.clone());
        Ok(token)
    }

    /// Force the next `get()` to re-authenticate.
    ///
    /// Called when a provider rejects the current token as unauthorized.
    pub async fn invalidate(&self) {
        let mut slot = self.current.lock().await;
        *slot = None;
        if self.cache_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.cache_path) {
                warn!(
                    path = %self.cache_path.display(),
                    error = %e,
                    "failed to remove persisted token"
                );
            }
        }
    }

    /// Read the persisted token; absence or corruption is a cold start.
    fn load_persisted(&self) -> Option<Token> {
        let content = match std::fs::read_to_string(&self.cache_path) {
            Ok(content) => content,
            Err(_) => return None,
        };
        match serde_json::from_str::<Token>(&content) {
            Ok(token) => Some(token),
            Err(e) => {
                debug!(
                    path = %self.cache_path.display(),
                    error = %e,
                    "ignoring corrupt token cache"
                );
                None
            }
        }
    }

    /// Crash-safe write: temp file in the same directory, then rename.
    fn persist(&self, token: &Token) -> Result<()> {
        if let Some(parent) = self.cache_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_vec_pretty(token)
            .map_err(|e| Error::internal(format!("failed to encode token: {e}")))?;
        let tmp_path = self.cache_path.with_extension("json.tmp");
        std::fs::write(&tmp_path, payload)?;
        std::fs::rename(&tmp_path, &self.cache_path)?;
        Ok(())
    }
}

fn is_fresh(token: &Token, at: DateTime<Utc>) -> bool {
    token.expires_at - at > Duration::seconds(EXPIRY_MARGIN_SECS)
}
