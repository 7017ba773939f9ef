use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ShelfError, ShelfResult};

/// Coordinator configuration.
///
/// Every field has a default, so an empty TOML file is a valid config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShelfConfig {
    /// Directory holding blobs, documents and the tag log.
    pub storage_root: PathBuf,
    /// Maximum files accepted by one upload call.
    pub max_batch: usize,
    /// Concurrent thumbnail derivations within one upload call.
    pub derive_workers: usize,
    /// Thumbnail bounding box edge in pixels.
    pub thumbnail_max: u32,
    /// Vocabulary of the random classifier.
    pub tag_labels: Vec<String>,
}

impl Default for ShelfConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("storage"),
            max_batch: 10,
            derive_workers: 4,
            thumbnail_max: 200,
            tag_labels: vec!["apple".into(), "banana".into()],
        }
    }
}

impl ShelfConfig {
    /// Defaults with a different storage root.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            storage_root: root.into(),
            ..Default::default()
        }
    }

    pub fn from_toml_str(text: &str) -> ShelfResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| ShelfError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> ShelfResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ShelfError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> ShelfResult<()> {
        if self.max_batch == 0 {
            return Err(ShelfError::Config("max_batch must be at least 1".into()));
        }
        if self.derive_workers == 0 {
            return Err(ShelfError::Config("derive_workers must be at least 1".into()));
        }
        if self.thumbnail_max == 0 {
            return Err(ShelfError::Config("thumbnail_max must be at least 1".into()));
        }
        Ok(())
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.storage_root.join("metadata.json")
    }

    pub fn catalogues_path(&self) -> PathBuf {
        self.storage_root.join("catalogues.json")
    }

    pub fn tag_log_path(&self) -> PathBuf {
        self.storage_root.join("tags.log")
    }
}
