use std::path::{Path, PathBuf};

use anyhow::Context;
use picshelf_core::ShelfConfig;
use picshelf_server::ServerConfig;
use serde::Deserialize;

/// Everything a config file can set: shelf settings at the top level and
/// an optional `[server]` table.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(flatten)]
    pub shelf: ShelfConfig,
    pub server: ServerConfig,
}

impl Settings {
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        let settings: Self = toml::from_str(text).context("invalid config")?;
        settings.shelf.validate()?;
        Ok(settings)
    }

    /// Load `config` if given, then apply the `--root` override.
    pub fn resolve(config: Option<&Path>, root: Option<PathBuf>) -> anyhow::Result<Self> {
        let mut settings = match config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                Self::from_toml_str(&text)?
            }
            None => Self::default(),
        };
        if let Some(root) = root {
            settings.shelf.storage_root = root;
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file() {
        let s = Settings::resolve(None, None).unwrap();
        assert_eq!(s.shelf, ShelfConfig::default());
        assert_eq!(s.server, ServerConfig::default());
    }

    #[test]
    fn file_with_server_table() {
        let s = Settings::from_toml_str(
            r#"
            storage_root = "/srv/pics"
            max_batch = 5

            [server]
            bind_addr = "0.0.0.0:8080"
            "#,
        )
        .unwrap();
        assert_eq!(s.shelf.storage_root, PathBuf::from("/srv/pics"));
        assert_eq!(s.shelf.max_batch, 5);
        assert_eq!(s.server.bind_addr.port(), 8080);
        assert_eq!(s.server.max_upload_bytes, ServerConfig::default().max_upload_bytes);
    }

    #[test]
    fn root_flag_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("picshelf.toml");
        std::fs::write(&path, "storage_root = \"from-file\"\nthumbnail_max = 64\n").unwrap();

        let s = Settings::resolve(Some(&path), Some(PathBuf::from("from-flag"))).unwrap();
        assert_eq!(s.shelf.storage_root, PathBuf::from("from-flag"));
        assert_eq!(s.shelf.thumbnail_max, 64);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Settings::resolve(Some(&dir.path().join("nope.toml")), None).is_err());
    }

    #[test]
    fn invalid_limits_are_rejected() {
        assert!(Settings::from_toml_str("derive_workers = 0").is_err());
    }
}
