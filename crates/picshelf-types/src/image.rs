use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tags::TagSet;

/// Metadata entry describing one uploaded image.
///
/// Keyed by `name`, which is also the file name of the original blob.
/// A record is only written once both the original and the thumbnail exist
/// on disk, and it is removed when the original is deleted.
///
/// Reading goes through [`StoredImageRecord`] so `metadata.json` documents
/// written by earlier versions of the service still load.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredImageRecord")]
pub struct ImageRecord {
    pub name: String,
    pub original_path: PathBuf,
    pub thumbnail_path: PathBuf,
    pub upload_timestamp: DateTime<Utc>,
    pub tags: TagSet,
}

/// On-disk shape of an [`ImageRecord`], old and new.
///
/// Earlier versions used `originalName`, `path` and `uploadDate`, and kept a
/// single label in a string `tag` field. That label is folded into `tags`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredImageRecord {
    #[serde(alias = "originalName")]
    name: String,
    #[serde(alias = "path")]
    original_path: PathBuf,
    thumbnail_path: PathBuf,
    #[serde(alias = "uploadDate")]
    upload_timestamp: DateTime<Utc>,
    #[serde(default)]
    tags: TagSet,
    #[serde(default)]
    tag: Option<String>,
}

impl From<StoredImageRecord> for ImageRecord {
    fn from(stored: StoredImageRecord) -> Self {
        let mut tags = stored.tags;
        tags.extend_labels(stored.tag.filter(|label| !label.is_empty()));
        Self {
            name: stored.name,
            original_path: stored.original_path,
            thumbnail_path: stored.thumbnail_path,
            upload_timestamp: stored.upload_timestamp,
            tags,
        }
    }
}

impl ImageRecord {
    /// Create a record stamped with the current time and no tags.
    pub fn new(
        name: impl Into<String>,
        original_path: impl Into<PathBuf>,
        thumbnail_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            original_path: original_path.into(),
            thumbnail_path: thumbnail_path.into(),
            upload_timestamp: Utc::now(),
            tags: TagSet::new(),
        }
    }

    /// Builder-style helper attaching an initial tag set.
    pub fn with_tags<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend_labels(labels);
        self
    }
}
