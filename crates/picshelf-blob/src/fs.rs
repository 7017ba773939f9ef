use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use picshelf_types::thumbnail_file_name;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{BlobError, BlobResult};
use crate::thumbnail::Thumbnailer;
use crate::traits::{BlobKind, BlobStore, Derivation};

/// Directory under the storage root holding original images.
pub const ORIGINALS_DIR: &str = "originals";
/// Directory under the storage root holding derived thumbnails.
pub const THUMBNAILS_DIR: &str = "thumbnails";

/// Filesystem-backed blob store.
///
/// Layout under the storage root:
///
/// ```text
/// originals/<name>
/// thumbnails/thumbnail-<name>
/// ```
///
/// Every write goes to a temporary file in the destination directory which
/// is then persisted over the final name, so a crash mid-write leaves at
/// most a stray temp file, never a truncated blob.
pub struct FsBlobStore {
    originals: PathBuf,
    thumbnails: PathBuf,
    thumbnailer: Arc<dyn Thumbnailer>,
}

impl FsBlobStore {
    /// Open (or create) the blob directories under `root`.
    pub fn open(root: &Path, thumbnailer: Arc<dyn Thumbnailer>) -> BlobResult<Self> {
        let originals = root.join(ORIGINALS_DIR);
        let thumbnails = root.join(THUMBNAILS_DIR);
        fs::create_dir_all(&originals)?;
        fs::create_dir_all(&thumbnails)?;
        Ok(Self {
            originals,
            thumbnails,
            thumbnailer,
        })
    }

    fn write_atomic(dir: &Path, target: &Path, bytes: &[u8]) -> BlobResult<()> {
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(target).map_err(|e| BlobError::Io(e.error))?;
        Ok(())
    }

    fn not_found(kind: BlobKind, name: &str) -> BlobError {
        BlobError::NotFound {
            kind: kind.entity(),
            name: name.to_string(),
        }
    }

    fn map_io(kind: BlobKind, name: &str, err: io::Error) -> BlobError {
        if err.kind() == io::ErrorKind::NotFound {
            Self::not_found(kind, name)
        } else {
            BlobError::Io(err)
        }
    }
}

impl BlobStore for FsBlobStore {
    fn put(&self, name: &str, bytes: &[u8]) -> BlobResult<PathBuf> {
        let path = self.path(BlobKind::Original, name);
        Self::write_atomic(&self.originals, &path, bytes)?;
        debug!(name, bytes = bytes.len(), "stored original");
        Ok(path)
    }

    fn derive(&self, name: &str) -> BlobResult<Derivation> {
        let path = self.path(BlobKind::Thumbnail, name);
        if path.exists() {
            debug!(name, "thumbnail present, skipping render");
            return Ok(Derivation {
                path,
                created: false,
            });
        }

        let original = self.read(BlobKind::Original, name)?;
        let thumbnail = self.thumbnailer.render(name, &original)?;
        Self::write_atomic(&self.thumbnails, &path, &thumbnail)?;
        debug!(name, bytes = thumbnail.len(), "rendered thumbnail");
        Ok(Derivation {
            path,
            created: true,
        })
    }

    fn rename(&self, kind: BlobKind, old: &str, new: &str) -> BlobResult<()> {
        let from = self.path(kind, old);
        let to = self.path(kind, new);
        if !from.exists() {
            return Err(Self::not_found(kind, old));
        }
        if to.exists() {
            return Err(BlobError::AlreadyExists {
                kind: kind.entity(),
                name: new.to_string(),
            });
        }
        fs::rename(&from, &to).map_err(|e| Self::map_io(kind, old, e))?;
        debug!(%kind, old, new, "renamed blob");
        Ok(())
    }

    fn delete(&self, kind: BlobKind, name: &str) -> BlobResult<()> {
        fs::remove_file(self.path(kind, name)).map_err(|e| Self::map_io(kind, name, e))?;
        debug!(%kind, name, "deleted blob");
        Ok(())
    }

    fn exists(&self, kind: BlobKind, name: &str) -> BlobResult<bool> {
        Ok(self.path(kind, name).try_exists()?)
    }

    fn read(&self, kind: BlobKind, name: &str) -> BlobResult<Vec<u8>> {
        fs::read(self.path(kind, name)).map_err(|e| Self::map_io(kind, name, e))
    }

    fn path(&self, kind: BlobKind, name: &str) -> PathBuf {
        match kind {
            BlobKind::Original => self.originals.join(name),
            BlobKind::Thumbnail => self.thumbnails.join(thumbnail_file_name(name)),
        }
    }
}

impl std::fmt::Debug for FsBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsBlobStore")
            .field("originals", &self.originals)
            .field("thumbnails", &self.thumbnails)
            .finish()
    }
}
