use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub vault: VaultConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub igdb: IgdbConfig,

    #[serde(default)]
    pub giantbomb: GiantBombConfig,

    #[serde(default)]
    pub calibre: CalibreConfig,
}

/// Where enriched documents and their cover links live inside the vault.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VaultConfig {
    /// Vault-relative directory new documents are created in
    #[serde(default = "default_notes_dir")]
    pub notes_dir: String,

    /// Vault-relative prefix used for the `image_url` frontmatter field
    #[serde(default = "default_cover_link_prefix")]
    pub cover_link_prefix: String,
}

fn default_notes_dir() -> String {
    "Gaming/Games".to_string()
}
fn default_cover_link_prefix() -> String {
    "Attachments/game_covers".to_string()
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            notes_dir: default_notes_dir(),
            cover_link_prefix: default_cover_link_prefix(),
        }
    }
}

/// Process-wide cache locations, passed in explicitly at construction time.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Directory holding one persisted token file per provider
    #[serde(default = "default_token_dir")]
    pub token_dir: PathBuf,

    /// Directory cover assets are written to, one `<slug>.jpg` per item
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,
}

fn default_token_dir() -> PathBuf {
    PathBuf::from("~/.cache/loreforge/tokens")
}
fn default_assets_dir() -> PathBuf {
    PathBuf::from("~/.cache/loreforge/covers")
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            token_dir: default_token_dir(),
            assets_dir: default_assets_dir(),
        }
    }
}

/// Primary game catalog (IGDB via Twitch OAuth client credentials).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IgdbConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Twitch application client id, also sent as the `Client-ID` header
    #[serde(default)]
    pub client_id: String,

    /// Twitch application client secret, used only for token acquisition
    #[serde(default)]
    pub client_secret: String,
}

/// Fallback game catalog (GiantBomb, plain API key).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GiantBombConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub api_key: String,
}

/// Local media-library catalog (a Calibre library directory).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CalibreConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Root of the Calibre library (the directory containing `metadata.db`)
    #[serde(default)]
    pub library_path: PathBuf,
}
