//! Enrichment orchestration.
//!
//! The [`EnrichmentService`] drives one request through the whole flow:
//! search the catalogs in priority order, select a match, fetch its full
//! detail, cache its cover best-effort, merge the resulting fields into any
//! existing document, and persist. Cover failures degrade to a document
//! without an `image_url` field; persistence failures are fatal and
//! surfaced to the caller.

use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info, warn};

use loreforge_common::{AssetReference, CatalogRecord, Error, FieldValue, Result, Slug};

use crate::auth::{TokenStore, TwitchAuthenticator};
use crate::catalog::providers::{CalibreProvider, GiantBombProvider, IgdbProvider};
use crate::catalog::{CatalogProvider, ProviderRegistry};
use crate::config::Config;
use crate::covers::CoverFetcher;
use crate::frontmatter::{self, Frontmatter};
use crate::vault::{Document, VaultStore};

/// How many candidates to ask a provider for when searching by title.
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// One enrichment request.
#[derive(Debug, Clone)]
pub struct EnrichRequest {
    /// Title to search for. The document identity comes from the selected
    /// record's canonical title, not this raw query.
    pub title: String,
    /// Provider-specific id that skips search entirely when the caller
    /// already knows which record they want.
    pub external_id: Option<String>,
    /// Seed text for the Notes section of a newly created document. Ignored
    /// when the document already exists (its body is never touched).
    pub body_note: Option<String>,
}

impl EnrichRequest {
    pub fn by_title(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            external_id: None,
            body_note: None,
        }
    }

    pub fn by_external_id(title: impl Into<String>, external_id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            external_id: Some(external_id.into()),
            body_note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.body_note = Some(note.into());
        self
    }
}

/// What an enrichment request produced.
#[derive(Debug, Clone)]
pub struct EnrichmentOutcome {
    /// Vault-relative path of the written document.
    pub path: String,
    /// Identity the document is filed under.
    pub slug: Slug,
    /// `false` when an existing document was updated in place.
    pub created: bool,
    /// Canonical catalog title of the enriched record.
    pub title: String,
    /// The cached cover, when one could be acquired.
    pub cover: Option<AssetReference>,
}

/// Layout knobs for where documents and their cover links land.
#[derive(Debug, Clone)]
pub struct EnrichOptions {
    /// Vault-relative directory new documents are created in.
    pub notes_dir: String,
    /// Vault-relative prefix for the `image_url` frontmatter field.
    pub cover_link_prefix: String,
}

/// Service that enriches vault documents with catalog metadata and artwork.
pub struct EnrichmentService {
    registry: ProviderRegistry,
    covers: CoverFetcher,
    vault: Arc<dyn VaultStore>,
    options: EnrichOptions,
}

impl EnrichmentService {
    pub fn new(
        registry: ProviderRegistry,
        covers: CoverFetcher,
        vault: Arc<dyn VaultStore>,
        options: EnrichOptions,
    ) -> Self {
        Self {
            registry,
            covers,
            vault,
            options,
        }
    }

    /// Wire up the service from configuration: one provider per enabled
    /// catalog section, registered in priority order (IGDB, GiantBomb,
    /// Calibre).
    pub fn from_config(config: &Config, vault: Arc<dyn VaultStore>) -> anyhow::Result<Self> {
        let token_dir = expand(&config.cache.token_dir);
        let assets_dir = expand(&config.cache.assets_dir);

        let mut registry = ProviderRegistry::new();

        if config.igdb.enabled {
            let authenticator = TwitchAuthenticator::new(
                config.igdb.client_id.clone(),
                config.igdb.client_secret.clone(),
            );
            let tokens = Arc::new(TokenStore::new(Box::new(authenticator), &token_dir));
            registry.register(Arc::new(IgdbProvider::new(
                config.igdb.client_id.clone(),
                tokens,
            )));
        }
        if config.giantbomb.enabled {
            registry.register(Arc::new(GiantBombProvider::new(
                config.giantbomb.api_key.clone(),
            )));
        }
        if config.calibre.enabled {
            let library = expand(&config.calibre.library_path);
            registry.register(Arc::new(CalibreProvider::new(library)));
        }

        registry
            .primary()
            .context("no catalog provider is enabled and configured")?;

        Ok(Self::new(
            registry,
            CoverFetcher::new(assets_dir),
            vault,
            EnrichOptions {
                notes_dir: config.vault.notes_dir.clone(),
                cover_link_prefix: config.vault.cover_link_prefix.clone(),
            },
        ))
    }

    /// Search the catalogs without writing anything, for pick-a-match UIs.
    pub async fn search(&self, title: &str, limit: usize) -> Result<Vec<CatalogRecord>> {
        let (_, results) = self.registry.search(title, limit).await?;
        Ok(results)
    }

    /// Run one enrichment request end to end.
    pub async fn enrich(&self, request: &EnrichRequest) -> Result<EnrichmentOutcome> {
        info!(
            title = %request.title,
            external_id = ?request.external_id,
            "starting enrichment"
        );

        let (provider, record) = self.select(request).await?;
        debug!(
            provider = provider.name(),
            external_id = %record.external_id,
            title = %record.title,
            "selected catalog record"
        );

        let slug = Slug::from_title(&record.title);

        let cover = self.acquire_cover(provider.as_ref(), &record, &slug).await;

        let (path, existing) = match self.vault.find_by_slug(&slug).await? {
            Some(path) => {
                let existing = self.vault.read(&path).await?;
                (path, existing)
            }
            None => (format!("{}/{slug}.md", self.options.notes_dir), None),
        };
        let created = existing.is_none();

        let incoming = self.build_fields(&record, &slug, cover.is_some());
        let merged = frontmatter::merge(existing.as_ref().map(|d| &d.frontmatter), incoming);

        let body = match &existing {
            Some(doc) if !doc.body.trim().is_empty() => doc.body.clone(),
            _ => render_body(&record, request.body_note.as_deref()),
        };
        let document = Document {
            frontmatter: merged,
            body,
        };

        self.vault.write(&path, &document).await?;

        info!(
            path = %path,
            slug = %slug,
            created,
            cover = cover.is_some(),
            "enrichment complete"
        );
        Ok(EnrichmentOutcome {
            path,
            slug,
            created,
            title: record.title,
            cover,
        })
    }

    /// Select the record to enrich from: a direct id fetch when the caller
    /// supplied one, otherwise the best match from a priority-order search.
    async fn select(
        &self,
        request: &EnrichRequest,
    ) -> Result<(Arc<dyn CatalogProvider>, CatalogRecord)> {
        if let Some(external_id) = &request.external_id {
            let provider = self
                .registry
                .primary()
                .ok_or_else(|| Error::internal("no provider available for id fetch"))?;
            let record = provider.fetch_by_id(external_id).await?;
            return Ok((provider, record));
        }

        let (provider, results) = self
            .registry
            .search(&request.title, DEFAULT_SEARCH_LIMIT)
            .await?;
        // Search results may be summaries; re-fetch the winner in full.
        let best = results
            .into_iter()
            .next()
            .ok_or_else(|| Error::internal("registry returned an empty match set"))?;
        let record = provider.fetch_by_id(&best.external_id).await?;
        Ok((provider, record))
    }

    /// Best-effort cover acquisition; any failure becomes `None`.
    async fn acquire_cover(
        &self,
        provider: &dyn CatalogProvider,
        record: &CatalogRecord,
        slug: &Slug,
    ) -> Option<AssetReference> {
        let cover_ref = record.cover.as_ref()?;
        let Some(source) = provider.resolve_cover(cover_ref) else {
            warn!(
                provider = provider.name(),
                slug = %slug,
                "cover reference could not be resolved"
            );
            return None;
        };
        self.covers.fetch(&source, slug).await
    }

    /// Frontmatter fields for one enrichment pass. Protected user fields are
    /// included with their defaults; the merge policy keeps existing values.
    fn build_fields(&self, record: &CatalogRecord, slug: &Slug, has_cover: bool) -> Frontmatter {
        let mut fields = record.fields.clone();
        fields.insert("game_title".into(), FieldValue::Text(record.title.clone()));
        fields.insert("play_status".into(), FieldValue::Text("Not Played".into()));
        fields.insert("star_rating".into(), FieldValue::Text("Not Rated".into()));
        fields.insert("tags".into(), default_tags(record));
        fields.insert("enriched".into(), FieldValue::Bool(true));
        if has_cover {
            fields.insert(
                "image_url".into(),
                FieldValue::Text(format!("{}/{slug}.jpg", self.options.cover_link_prefix)),
            );
        }
        fields
    }
}

fn expand(path: &std::path::Path) -> std::path::PathBuf {
    let raw = path.to_string_lossy();
    std::path::PathBuf::from(shellexpand::tilde(raw.as_ref()).as_ref())
}

/// Default `tags` value: the base tags plus one per genre, lowercased.
fn default_tags(record: &CatalogRecord) -> FieldValue {
    let mut tags = vec!["game".to_string(), "games".to_string()];
    if let Some(FieldValue::Text(genres)) = record.fields.get("genre") {
        for genre in genres.split(',') {
            let tag = genre.trim().to_lowercase().replace(' ', "-");
            if !tag.is_empty() && !tags.contains(&tag) {
                tags.push(tag);
            }
        }
    }
    FieldValue::List(tags)
}

/// Initial markdown body for a freshly created document. Existing bodies
/// are never replaced.
fn render_body(record: &CatalogRecord, note: Option<&str>) -> String {
    let mut body = format!("# {}\n\n", record.title);

    body.push_str("## Details\n\n");
    body.push_str("- Platform: `=this.platform`\n");
    body.push_str("- Genre: `=this.genre`\n");
    body.push_str("- Release date: `=this.release_date`\n");
    body.push_str("- Status: `=this.play_status`\n");
    body.push_str("- Rating: `=this.star_rating`\n\n");

    if let Some(summary) = &record.summary {
        body.push_str("## Description\n\n");
        body.push_str(summary.trim());
        body.push_str("\n\n");
    }

    body.push_str("## My Experience\n\n\n");
    body.push_str("## Notes\n");
    if let Some(note) = note {
        body.push('\n');
        body.push_str(note.trim());
        body.push('\n');
    }
    body
}
