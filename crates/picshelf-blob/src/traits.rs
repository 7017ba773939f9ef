use std::path::PathBuf;

use picshelf_types::EntityKind;

use crate::error::BlobResult;

/// Which of the two blobs kept per image an operation targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlobKind {
    Original,
    Thumbnail,
}

impl BlobKind {
    pub fn entity(self) -> EntityKind {
        match self {
            Self::Original => EntityKind::Image,
            Self::Thumbnail => EntityKind::Thumbnail,
        }
    }
}

impl std::fmt::Display for BlobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Original => write!(f, "original"),
            Self::Thumbnail => write!(f, "thumbnail"),
        }
    }
}

/// Outcome of [`BlobStore::derive`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Derivation {
    pub path: PathBuf,
    /// `false` when a thumbnail already existed and rendering was skipped.
    pub created: bool,
}

/// Storage for original image bytes and their derived thumbnails, keyed by
/// image name.
///
/// All implementations must satisfy these invariants:
/// - Each name maps to at most one original and one thumbnail.
/// - Writes land atomically: a reader never observes a partially written
///   blob under its final name.
/// - `rename` never overwrites an existing target.
/// - Operations on distinct names are independent and may run in parallel.
///   Serializing operations on the same name is the caller's job.
pub trait BlobStore: Send + Sync {
    /// Store the original bytes for `name`, replacing any previous content.
    /// Returns the path of the original blob.
    fn put(&self, name: &str, bytes: &[u8]) -> BlobResult<PathBuf>;

    /// Render the thumbnail for `name` from its original, unless one already
    /// exists. This is the only expensive operation.
    ///
    /// Returns `NotFound` if the original is missing.
    fn derive(&self, name: &str) -> BlobResult<Derivation>;

    /// Move a blob from `old` to `new`.
    ///
    /// Returns `NotFound` if `old` is missing and `AlreadyExists` if `new` is
    /// taken.
    fn rename(&self, kind: BlobKind, old: &str, new: &str) -> BlobResult<()>;

    /// Delete a blob. Returns `NotFound` if it is missing.
    fn delete(&self, kind: BlobKind, name: &str) -> BlobResult<()>;

    /// Check whether a blob exists.
    fn exists(&self, kind: BlobKind, name: &str) -> BlobResult<bool>;

    /// Read a blob's bytes. Returns `NotFound` if it is missing.
    fn read(&self, kind: BlobKind, name: &str) -> BlobResult<Vec<u8>>;

    /// The storage path a blob has (or would have) for `name`.
    fn path(&self, kind: BlobKind, name: &str) -> PathBuf;
}
