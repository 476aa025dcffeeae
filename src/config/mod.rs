pub mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./config.toml",
        "./loreforge.toml",
        "~/.config/loreforge/config.toml",
        "/etc/loreforge/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    // Return default config if no file found
    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.igdb.enabled
        && (config.igdb.client_id.is_empty() || config.igdb.client_secret.is_empty())
    {
        anyhow::bail!("IGDB is enabled but client_id/client_secret are not set");
    }

    if config.giantbomb.enabled && config.giantbomb.api_key.is_empty() {
        anyhow::bail!("GiantBomb is enabled but has no API key");
    }

    if config.calibre.enabled {
        let raw = config.calibre.library_path.to_string_lossy();
        let expanded = shellexpand::tilde(raw.as_ref());
        if !Path::new(expanded.as_ref()).exists() {
            tracing::warn!(
                "Calibre library path does not exist: {:?}",
                config.calibre.library_path
            );
        }
    }

    if config.vault.notes_dir.is_empty() {
        anyhow::bail!("vault.notes_dir cannot be empty");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn load_full_config() {
        let file = write_config(
            r#"
            [vault]
            notes_dir = "Gaming/Games"
            cover_link_prefix = "Attachments/game_covers"

            [cache]
            token_dir = "/tmp/loreforge/tokens"
            assets_dir = "/tmp/loreforge/covers"

            [igdb]
            enabled = true
            client_id = "abc"
            client_secret = "def"

            [giantbomb]
            enabled = true
            api_key = "gbkey"

            [calibre]
            enabled = false
            "#,
        );

        let config = load_config(file.path()).unwrap();
        assert!(config.igdb.enabled);
        assert_eq!(config.igdb.client_id, "abc");
        assert_eq!(config.giantbomb.api_key, "gbkey");
        assert_eq!(config.vault.notes_dir, "Gaming/Games");
        assert_eq!(
            config.cache.assets_dir,
            std::path::PathBuf::from("/tmp/loreforge/covers")
        );
    }

    #[test]
    fn defaults_apply_for_missing_sections() {
        let file = write_config("[igdb]\nenabled = false\n");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.vault.notes_dir, "Gaming/Games");
        assert_eq!(config.vault.cover_link_prefix, "Attachments/game_covers");
        assert!(!config.giantbomb.enabled);
    }

    #[test]
    fn igdb_enabled_without_credentials_fails() {
        let file = write_config("[igdb]\nenabled = true\n");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn giantbomb_enabled_without_key_fails() {
        let file = write_config("[giantbomb]\nenabled = true\n");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn missing_file_yields_default() {
        let config = load_config_or_default(None).unwrap();
        // No config file in the test environment's default locations.
        assert!(!config.igdb.enabled);
    }

    #[test]
    fn empty_notes_dir_rejected() {
        let file = write_config("[vault]\nnotes_dir = \"\"\n");
        assert!(load_config(file.path()).is_err());
    }
}
