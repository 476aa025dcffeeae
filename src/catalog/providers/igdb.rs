//! IGDB (Internet Game Database) catalog provider — the primary catalog.
//!
//! Implements [`CatalogProvider`] against the IGDB v4 Apicalypse API.
//!
//! Features:
//! - Bearer-token auth via [`TokenStore`], with exactly one
//!   invalidate-and-retry on a 401 response.
//! - Token-bucket rate limiting at 4 requests / second via [`governor`].
//! - Automatic retry on HTTP 429 with `Retry-After` header support
//!   (max 3 retries).
//! - 30-second request timeout.

use std::collections::BTreeMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use governor::{Quota, RateLimiter};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use loreforge_common::{CatalogRecord, CoverRef, CoverSource, Error, FieldValue, Result};

use crate::auth::TokenStore;
use crate::catalog::provider::CatalogProvider;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const IGDB_BASE_URL: &str = "https://api.igdb.com/v4";
const IGDB_IMAGE_BASE: &str = "https://images.igdb.com/igdb/image/upload/t_cover_big";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RATE_RETRIES: u32 = 3;

const SEARCH_FIELDS: &str = "name,summary,first_release_date,platforms.name,genres.name,\
                             themes.name,cover.image_id";
const DETAIL_FIELDS: &str = "name,summary,first_release_date,platforms.name,genres.name,\
                             themes.name,cover.image_id,involved_companies.company.name,\
                             involved_companies.developer,involved_companies.publisher";

// ---------------------------------------------------------------------------
// IGDB API response types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct IgdbGame {
    id: u64,
    name: Option<String>,
    summary: Option<String>,
    first_release_date: Option<i64>,
    platforms: Option<Vec<IgdbNamed>>,
    genres: Option<Vec<IgdbNamed>>,
    themes: Option<Vec<IgdbNamed>>,
    cover: Option<IgdbCover>,
    involved_companies: Option<Vec<IgdbInvolvedCompany>>,
}

#[derive(Debug, Deserialize)]
struct IgdbNamed {
    name: String,
}

#[derive(Debug, Deserialize)]
struct IgdbCover {
    image_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IgdbInvolvedCompany {
    company: Option<IgdbNamed>,
    #[serde(default)]
    developer: bool,
    #[serde(default)]
    publisher: bool,
}

// ---------------------------------------------------------------------------
// Provider implementation
// ---------------------------------------------------------------------------

/// IGDB catalog provider.
///
/// Queries are POSTed as Apicalypse bodies with `Client-ID` and
/// `Authorization: Bearer` headers; the bearer token comes from the shared
/// [`TokenStore`] before every request.
pub struct IgdbProvider {
    client: reqwest::Client,
    client_id: String,
    tokens: Arc<TokenStore>,
    base_url: String,
    rate_limiter: governor::RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl IgdbProvider {
    /// Create a new IGDB provider with the given Twitch client id and token
    /// store. Rate limiting is configured at 4 requests per second.
    pub fn new(client_id: String, tokens: Arc<TokenStore>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build reqwest client");

        let quota = Quota::per_second(NonZeroU32::new(4).unwrap());
        let rate_limiter = RateLimiter::direct(quota);

        Self {
            client,
            client_id,
            tokens,
            base_url: IGDB_BASE_URL.to_string(),
            rate_limiter,
        }
    }

    /// Point the provider at a different API root (test servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Execute an Apicalypse query with rate limiting, 429 retry, and the
    /// bounded invalidate-then-retry-once dance on 401.
    async fn query(&self, body: &str) -> Result<Vec<IgdbGame>> {
        let url = format!("{}/games", self.base_url);
        let mut auth_retried = false;
        let mut rate_retries = 0u32;

        loop {
            let token = self.tokens.get().await?;
            self.rate_limiter.until_ready().await;

            let response = self
                .client
                .post(&url)
                .header("Client-ID", &self.client_id)
                .header("Authorization", format!("Bearer {}", token.value))
                .header("Accept", "application/json")
                .body(body.to_string())
                .send()
                .await
                .map_err(|e| Error::provider_unavailable("igdb", e.to_string()))?;

            let status = response.status();

            if status == StatusCode::UNAUTHORIZED {
                if auth_retried {
                    return Err(Error::auth_unavailable(
                        "IGDB rejected the refreshed token",
                    ));
                }
                warn!("IGDB returned 401, invalidating cached token and retrying once");
                self.tokens.invalidate().await;
                auth_retried = true;
                continue;
            }

            if status == StatusCode::TOO_MANY_REQUESTS && rate_retries < MAX_RATE_RETRIES {
                rate_retries += 1;
                let wait = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(1);
                warn!(
                    retry = rate_retries,
                    wait_secs = wait,
                    "IGDB returned 429, backing off"
                );
                tokio::time::sleep(Duration::from_secs(wait)).await;
                continue;
            }

            if !status.is_success() {
                return Err(Error::provider_unavailable(
                    "igdb",
                    format!("games endpoint returned {status}"),
                ));
            }

            return response
                .json::<Vec<IgdbGame>>()
                .await
                .map_err(|e| Error::provider_unavailable("igdb", format!("bad response: {e}")));
        }
    }
}

/// Escape a title for embedding in an Apicalypse `search "..."` clause.
fn escape_query(title: &str) -> String {
    title.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Convert IGDB's unix release timestamp to a `YYYY-MM-DD` string.
fn format_release_date(timestamp: i64) -> Option<String> {
    DateTime::from_timestamp(timestamp, 0).map(|dt| dt.format("%Y-%m-%d").to_string())
}

fn names(list: Option<Vec<IgdbNamed>>) -> Vec<String> {
    list.unwrap_or_default().into_iter().map(|n| n.name).collect()
}

/// Map an IGDB game payload onto the provider-agnostic record shape.
fn to_record(game: IgdbGame) -> CatalogRecord {
    let mut fields: BTreeMap<String, FieldValue> = BTreeMap::new();
    fields.insert("igdb_id".into(), FieldValue::Integer(game.id as i64));

    let platforms = names(game.platforms);
    if !platforms.is_empty() {
        fields.insert("platform".into(), FieldValue::List(platforms));
    }

    let genres = names(game.genres);
    if !genres.is_empty() {
        fields.insert("genre".into(), FieldValue::Text(genres.join(", ")));
    }

    let themes = names(game.themes);
    if !themes.is_empty() {
        fields.insert("theme".into(), FieldValue::List(themes));
    }

    if let Some(ts) = game.first_release_date {
        if let Some(date) = format_release_date(ts) {
            fields.insert("release_date".into(), FieldValue::Text(date));
        }
    }

    let mut developers = Vec::new();
    let mut publishers = Vec::new();
    for involved in game.involved_companies.unwrap_or_default() {
        let company = match involved.company {
            Some(c) => c.name,
            None => continue,
        };
        if involved.developer {
            developers.push(company.clone());
        }
        if involved.publisher {
            publishers.push(company);
        }
    }
    if !developers.is_empty() {
        fields.insert("developer".into(), FieldValue::List(developers));
    }
    if !publishers.is_empty() {
        fields.insert("publisher".into(), FieldValue::List(publishers));
    }

    let cover = game
        .cover
        .and_then(|c| c.image_id)
        .map(CoverRef::ImageId);

    CatalogRecord {
        provider: "igdb".to_string(),
        external_id: game.id.to_string(),
        title: game.name.unwrap_or_default(),
        summary: game.summary,
        cover,
        fields,
    }
}

#[async_trait]
impl CatalogProvider for IgdbProvider {
    fn name(&self) -> &'static str {
        "igdb"
    }

    fn is_available(&self) -> bool {
        !self.client_id.is_empty()
    }

    async fn search(&self, title: &str, limit: usize) -> Result<Vec<CatalogRecord>> {
        let body = format!(
            "search \"{}\"; fields {SEARCH_FIELDS}; limit {limit};",
            escape_query(title)
        );
        debug!(title, limit, "IGDB search");

        let games = self.query(&body).await?;
        Ok(games.into_iter().map(to_record).collect())
    }

    async fn fetch_by_id(&self, external_id: &str) -> Result<CatalogRecord> {
        let id: u64 = external_id
            .parse()
            .map_err(|_| Error::invalid_input(format!("not an IGDB id: '{external_id}'")))?;

        let body = format!("where id = {id}; fields {DETAIL_FIELDS};");
        debug!(id, "IGDB fetch by id");

        let games = self.query(&body).await?;
        games
            .into_iter()
            .next()
            .map(to_record)
            .ok_or_else(|| Error::invalid_input(format!("IGDB has no game with id {id}")))
    }

    fn resolve_cover(&self, cover: &CoverRef) -> Option<CoverSource> {
        match cover {
            CoverRef::ImageId(image_id) => Some(CoverSource::Url(format!(
                "{IGDB_IMAGE_BASE}/{image_id}.jpg"
            ))),
            CoverRef::Url(url) => Some(CoverSource::Url(url.clone())),
            CoverRef::Path(_) => None,
        }
    }
}
