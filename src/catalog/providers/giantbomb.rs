//! GiantBomb catalog provider — the fallback catalog.
//!
//! GiantBomb authenticates with a static API key passed as a query
//! parameter, so there is no token store involved. The API is strict about
//! request rates; a conservative 1 request / second limiter keeps us well
//! under its hourly quota.

use std::collections::BTreeMap;
use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use loreforge_common::{CatalogRecord, CoverRef, CoverSource, Error, FieldValue, Result};

use crate::catalog::provider::CatalogProvider;

const GIANTBOMB_BASE_URL: &str = "https://www.giantbomb.com/api";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RATE_RETRIES: u32 = 3;

// ---------------------------------------------------------------------------
// GiantBomb API response types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GbEnvelope<T> {
    error: String,
    results: T,
}

#[derive(Debug, Deserialize)]
struct GbGame {
    guid: Option<String>,
    name: Option<String>,
    deck: Option<String>,
    original_release_date: Option<String>,
    platforms: Option<Vec<GbNamed>>,
    genres: Option<Vec<GbNamed>>,
    image: Option<GbImage>,
}

#[derive(Debug, Deserialize)]
struct GbNamed {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GbImage {
    medium_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Provider implementation
// ---------------------------------------------------------------------------

/// GiantBomb catalog provider.
pub struct GiantBombProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    rate_limiter: governor::RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl GiantBombProvider {
    pub fn new(api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build reqwest client");

        let quota = Quota::per_second(NonZeroU32::new(1).unwrap());
        let rate_limiter = RateLimiter::direct(quota);

        Self {
            client,
            api_key,
            base_url: GIANTBOMB_BASE_URL.to_string(),
            rate_limiter,
        }
    }

    /// Point the provider at a different API root (test servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// GET `path` with auth and format parameters, retrying on 429.
    async fn request<T>(&self, path: &str, params: &[(&str, &str)]) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}/{path}", self.base_url);
        let mut rate_retries = 0u32;

        loop {
            self.rate_limiter.until_ready().await;

            let response = self
                .client
                .get(&url)
                .query(&[("api_key", self.api_key.as_str()), ("format", "json")])
                .query(params)
                .send()
                .await
                .map_err(|e| Error::provider_unavailable("giantbomb", e.to_string()))?;

            let status = response.status();

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
                    "GiantBomb returned 429, backing off"
                );
                tokio::time::sleep(Duration::from_secs(wait)).await;
                continue;
            }

            if !status.is_success() {
                return Err(Error::provider_unavailable(
                    "giantbomb",
                    format!("{path} returned {status}"),
                ));
            }

            return response
                .json::<T>()
                .await
                .map_err(|e| Error::provider_unavailable("giantbomb", format!("bad response: {e}")));
        }
    }
}

/// Map a GiantBomb game payload onto the provider-agnostic record shape.
fn to_record(game: GbGame) -> CatalogRecord {
    let mut fields: BTreeMap<String, FieldValue> = BTreeMap::new();

    let platforms: Vec<String> = game
        .platforms
        .unwrap_or_default()
        .into_iter()
        .map(|p| p.name)
        .collect();
    if !platforms.is_empty() {
        fields.insert("platform".into(), FieldValue::List(platforms));
    }

    let genres: Vec<String> = game
        .genres
        .unwrap_or_default()
        .into_iter()
        .map(|g| g.name)
        .collect();
    if !genres.is_empty() {
        fields.insert("genre".into(), FieldValue::Text(genres.join(", ")));
    }

    if let Some(date) = game.original_release_date {
        fields.insert("release_date".into(), FieldValue::Text(date));
    }

    let external_id = game.guid.unwrap_or_default();
    if !external_id.is_empty() {
        fields.insert(
            "giantbomb_guid".into(),
            FieldValue::Text(external_id.clone()),
        );
    }

    let cover = game
        .image
        .and_then(|i| i.medium_url)
        .map(CoverRef::Url);

    CatalogRecord {
        provider: "giantbomb".to_string(),
        external_id,
        title: game.name.unwrap_or_default(),
        summary: game.deck,
        cover,
        fields,
    }
}

#[async_trait]
impl CatalogProvider for GiantBombProvider {
    fn name(&self) -> &'static str {
        "giantbomb"
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn search(&self, title: &str, limit: usize) -> Result<Vec<CatalogRecord>> {
        debug!(title, limit, "GiantBomb search");
        let limit = limit.to_string();
        let envelope: GbEnvelope<Vec<GbGame>> = self
            .request(
                "search/",
                &[
                    ("query", title),
                    ("resources", "game"),
                    ("limit", limit.as_str()),
                ],
            )
            .await?;

        if envelope.error != "OK" {
            return Err(Error::provider_unavailable("giantbomb", envelope.error));
        }
        Ok(envelope.results.into_iter().map(to_record).collect())
    }

    async fn fetch_by_id(&self, external_id: &str) -> Result<CatalogRecord> {
        // GiantBomb game guids look like "3030-13053".
        if !external_id.starts_with("3030-") {
            return Err(Error::invalid_input(format!(
                "not a GiantBomb game guid: '{external_id}'"
            )));
        }
        debug!(guid = external_id, "GiantBomb fetch by guid");

        let path = format!("game/{external_id}/");
        let envelope: GbEnvelope<GbGame> = self.request(&path, &[]).await?;

        if envelope.error != "OK" {
            return Err(Error::provider_unavailable("giantbomb", envelope.error));
        }
        Ok(to_record(envelope.results))
    }

    fn resolve_cover(&self, cover: &CoverRef) -> Option<CoverSource> {
        match cover {
            CoverRef::Url(url) => Some(CoverSource::Url(url.clone())),
            CoverRef::ImageId(_) | CoverRef::Path(_) => None,
        }
    }
}
