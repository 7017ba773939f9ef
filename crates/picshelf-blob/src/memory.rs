use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use picshelf_types::thumbnail_file_name;

use crate::error::{BlobError, BlobResult};
use crate::fs::{ORIGINALS_DIR, THUMBNAILS_DIR};
use crate::thumbnail::Thumbnailer;
use crate::traits::{BlobKind, BlobStore, Derivation};

/// In-memory, HashMap-based blob store.
///
/// Intended for tests and embedding. Paths are virtual (relative to an
/// imaginary storage root) and follow the same layout as
/// [`FsBlobStore`](crate::FsBlobStore).
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<(BlobKind, String), Vec<u8>>>,
    thumbnailer: Arc<dyn Thumbnailer>,
}

impl InMemoryBlobStore {
    pub fn new(thumbnailer: Arc<dyn Thumbnailer>) -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            thumbnailer,
        }
    }

    /// Number of blobs of the given kind.
    pub fn count(&self, kind: BlobKind) -> usize {
        self.blobs
            .read()
            .map(|map| map.keys().filter(|(k, _)| *k == kind).count())
            .unwrap_or(0)
    }

    fn key(kind: BlobKind, name: &str) -> (BlobKind, String) {
        (kind, name.to_string())
    }

    fn not_found(kind: BlobKind, name: &str) -> BlobError {
        BlobError::NotFound {
            kind: kind.entity(),
            name: name.to_string(),
        }
    }
}

impl BlobStore for InMemoryBlobStore {
    fn put(&self, name: &str, bytes: &[u8]) -> BlobResult<PathBuf> {
        let mut map = self.blobs.write().map_err(|_| BlobError::Poisoned)?;
        map.insert(Self::key(BlobKind::Original, name), bytes.to_vec());
        Ok(self.path(BlobKind::Original, name))
    }

    fn derive(&self, name: &str) -> BlobResult<Derivation> {
        let path = self.path(BlobKind::Thumbnail, name);
        if self.exists(BlobKind::Thumbnail, name)? {
            return Ok(Derivation {
                path,
                created: false,
            });
        }
        // Render outside the lock; it is the slow part.
        let original = self.read(BlobKind::Original, name)?;
        let thumbnail = self.thumbnailer.render(name, &original)?;
        let mut map = self.blobs.write().map_err(|_| BlobError::Poisoned)?;
        map.insert(Self::key(BlobKind::Thumbnail, name), thumbnail);
        Ok(Derivation {
            path,
            created: true,
        })
    }

    fn rename(&self, kind: BlobKind, old: &str, new: &str) -> BlobResult<()> {
        let mut map = self.blobs.write().map_err(|_| BlobError::Poisoned)?;
        if map.contains_key(&Self::key(kind, new)) {
            return Err(BlobError::AlreadyExists {
                kind: kind.entity(),
                name: new.to_string(),
            });
        }
        let bytes = map
            .remove(&Self::key(kind, old))
            .ok_or_else(|| Self::not_found(kind, old))?;
        map.insert(Self::key(kind, new), bytes);
        Ok(())
    }

    fn delete(&self, kind: BlobKind, name: &str) -> BlobResult<()> {
        let mut map = self.blobs.write().map_err(|_| BlobError::Poisoned)?;
        map.remove(&Self::key(kind, name))
            .map(|_| ())
            .ok_or_else(|| Self::not_found(kind, name))
    }

    fn exists(&self, kind: BlobKind, name: &str) -> BlobResult<bool> {
        let map = self.blobs.read().map_err(|_| BlobError::Poisoned)?;
        Ok(map.contains_key(&Self::key(kind, name)))
    }

    fn read(&self, kind: BlobKind, name: &str) -> BlobResult<Vec<u8>> {
        let map = self.blobs.read().map_err(|_| BlobError::Poisoned)?;
        map.get(&Self::key(kind, name))
            .cloned()
            .ok_or_else(|| Self::not_found(kind, name))
    }

    fn path(&self, kind: BlobKind, name: &str) -> PathBuf {
        match kind {
            BlobKind::Original => PathBuf::from(ORIGINALS_DIR).join(name),
            BlobKind::Thumbnail => PathBuf::from(THUMBNAILS_DIR).join(thumbnail_file_name(name)),
        }
    }
}

impl std::fmt::Debug for InMemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlobStore")
            .field("originals", &self.count(BlobKind::Original))
            .field("thumbnails", &self.count(BlobKind::Thumbnail))
            .finish()
    }
}
