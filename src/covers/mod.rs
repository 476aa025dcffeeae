//! Best-effort cover artwork caching.
//!
//! The [`CoverFetcher`] downloads (or copies) a resolved cover source into a
//! deterministic cache location keyed by the document slug. Cover artwork is
//! strictly optional: every failure path logs a warning and degrades to "no
//! cover", never to an error the enrichment flow would see.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use tracing::{debug, warn};

use loreforge_common::{AssetReference, CoverSource, Slug};

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Downloads and caches cover artwork for enriched documents.
///
/// Covers live at `{assets_dir}/{slug}.jpg`; re-enriching a title overwrites
/// the cached file in place, so the path stays stable across refreshes.
pub struct CoverFetcher {
    client: reqwest::Client,
    assets_dir: PathBuf,
}

impl CoverFetcher {
    pub fn new(assets_dir: impl Into<PathBuf>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .expect("failed to build reqwest client");
        Self {
            client,
            assets_dir: assets_dir.into(),
        }
    }

    /// Deterministic cache path for a document's cover.
    pub fn asset_path(&self, slug: &Slug) -> PathBuf {
        self.assets_dir.join(format!("{slug}.jpg"))
    }

    /// Fetch a cover into the cache.
    ///
    /// Returns `None` on any failure; the cause is logged at `warn` and the
    /// caller proceeds without a cover.
    pub async fn fetch(&self, source: &CoverSource, slug: &Slug) -> Option<AssetReference> {
        match self.try_fetch(source, slug).await {
            Ok(asset) => {
                debug!(
                    slug = %slug,
                    path = %asset.local_path.display(),
                    size = asset.size_bytes,
                    "cached cover"
                );
                Some(asset)
            }
            Err(e) => {
                warn!(slug = %slug, error = %e, "cover unavailable, continuing without it");
                None
            }
        }
    }

    async fn try_fetch(&self, source: &CoverSource, slug: &Slug) -> anyhow::Result<AssetReference> {
        let bytes = match source {
            CoverSource::Url(url) => self.download(url).await?,
            CoverSource::File(path) => std::fs::read(path)
                .with_context(|| format!("failed to read cover file {}", path.display()))?,
        };

        if bytes.is_empty() {
            anyhow::bail!("cover source produced zero bytes");
        }
        // Reject truncated downloads and HTML error pages masquerading as
        // images before they land in the cache.
        image::load_from_memory(&bytes).context("cover bytes are not a decodable image")?;

        std::fs::create_dir_all(&self.assets_dir).with_context(|| {
            format!(
                "failed to create asset cache dir {}",
                self.assets_dir.display()
            )
        })?;

        let local_path = self.asset_path(slug);
        std::fs::write(&local_path, &bytes)
            .with_context(|| format!("failed to write cover {}", local_path.display()))?;

        Ok(AssetReference {
            source: describe(source),
            local_path,
            size_bytes: bytes.len() as u64,
        })
    }

    async fn download(&self, url: &str) -> anyhow::Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("failed to download cover from {url}"))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("cover download from {url} returned {status}");
        }

        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("failed to read cover body from {url}"))?;
        Ok(bytes.to_vec())
    }
}

fn describe(source: &CoverSource) -> String {
    match source {
        CoverSource::Url(url) => url.clone(),
        CoverSource::File(path) => path.display().to_string(),
    }
}

/// Encode a tiny valid JPEG, used by tests that need decodable image bytes.
#[cfg(test)]
pub(crate) fn jpeg_fixture() -> Vec<u8> {
    use image::{ImageFormat, RgbImage};
    use std::io::Cursor;

    let img = RgbImage::from_pixel(4, 4, image::Rgb([120, 40, 200]));
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Jpeg)
        .expect("jpeg encode");
    buf.into_inner()
}
