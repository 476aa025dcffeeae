//! Twitch OAuth client-credentials authenticator (backs the IGDB provider).

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

use loreforge_common::{Error, Result, Token};

use super::store::Authenticator;

const TWITCH_TOKEN_URL: &str = "https://id.twitch.tv/oauth2/token";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct TwitchTokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Acquires app access tokens from Twitch for the IGDB API.
pub struct TwitchAuthenticator {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    token_url: String,
}

impl TwitchAuthenticator {
    /// Create an authenticator for the given Twitch application credentials.
    pub fn new(client_id: String, client_secret: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {}", e);
                reqwest::Client::new()
            });

        Self {
            client,
            client_id,
            client_secret,
            token_url: TWITCH_TOKEN_URL.to_string(),
        }
    }

    /// Point the authenticator at a different token endpoint (test servers).
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }
}

#[async_trait]
impl Authenticator for TwitchAuthenticator {
    fn provider(&self) -> &'static str {
        "igdb"
    }

    async fn authenticate(&self) -> Result<Token> {
        debug!(url = %self.token_url, "requesting app access token");

        let response = self
            .client
            .post(&self.token_url)
            .query(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await
            .map_err(|e| Error::auth_unavailable(format!("token request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::auth_unavailable(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        let body: TwitchTokenResponse = response
            .json()
            .await
            .map_err(|e| Error::auth_unavailable(format!("malformed token response: {e}")))?;

        Ok(Token {
            value: body.access_token,
            expires_at: Utc::now() + chrono::Duration::seconds(body.expires_in),
        })
    }
}
