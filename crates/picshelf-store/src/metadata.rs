//! The Metadata Store: the authoritative list of [`ImageRecord`]s.
//!
//! Persisted as one JSON array. Each mutation is a full read-modify-write
//! of that document, which is only safe under one writer at a time, so the
//! document sits behind a single mutex. Callers that must keep other work
//! (blob moves, deletes) atomic with a metadata change take the lock once
//! with [`MetadataStore::lock`] and run every step through the returned
//! [`MetadataGuard`].

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use picshelf_types::{EntityKind, ImageRecord};
use tracing::debug;

use crate::document::JsonDocument;
use crate::error::{StoreError, StoreResult};

/// New storage paths for a renamed image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordPaths {
    pub original: PathBuf,
    pub thumbnail: PathBuf,
}

/// Outcome of tagging one image inside [`MetadataGuard::add_tags_many`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TagUpdate {
    /// The record exists; `added` labels were new to it.
    Applied { added: usize },
    /// No record with that name.
    Missing,
}

/// JSON-backed store of image records.
pub struct MetadataStore {
    path: PathBuf,
    doc: Mutex<JsonDocument<Vec<ImageRecord>>>,
}

impl MetadataStore {
    /// Open the store backed by the document at `path`.
    pub fn open(path: &Path) -> StoreResult<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            doc: Mutex::new(JsonDocument::open(path)?),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Take the document lock for a multi-step operation.
    pub fn lock(&self) -> StoreResult<MetadataGuard<'_>> {
        let doc = self
            .doc
            .lock()
            .map_err(|_| StoreError::Poisoned("metadata"))?;
        Ok(MetadataGuard { doc })
    }

    pub fn list(&self) -> StoreResult<Vec<ImageRecord>> {
        self.lock()?.list()
    }

    pub fn get(&self, name: &str) -> StoreResult<ImageRecord> {
        self.lock()?.get(name)
    }

    pub fn upsert(&self, record: ImageRecord) -> StoreResult<()> {
        self.lock()?.upsert(record)
    }

    pub fn remove(&self, name: &str) -> StoreResult<ImageRecord> {
        self.lock()?.remove(name)
    }

    pub fn rename(&self, old: &str, new: &str, paths: RecordPaths) -> StoreResult<()> {
        self.lock()?.rename(old, new, paths)
    }

    pub fn add_tags<I, S>(&self, name: &str, labels: I) -> StoreResult<usize>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lock()?.add_tags(name, labels)
    }
}

impl std::fmt::Debug for MetadataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataStore")
            .field("path", &self.path)
            .finish()
    }
}

/// Exclusive access to the metadata document for the guard's lifetime.
pub struct MetadataGuard<'a> {
    doc: MutexGuard<'a, JsonDocument<Vec<ImageRecord>>>,
}

impl MetadataGuard<'_> {
    pub fn list(&self) -> StoreResult<Vec<ImageRecord>> {
        self.doc.load()
    }

    pub fn get(&self, name: &str) -> StoreResult<ImageRecord> {
        self.doc
            .load()?
            .into_iter()
            .find(|r| r.name == name)
            .ok_or_else(|| not_found(name))
    }

    pub fn contains(&self, name: &str) -> StoreResult<bool> {
        Ok(self.doc.load()?.iter().any(|r| r.name == name))
    }

    /// Replace the record with the same name, or append a new one.
    pub fn upsert(&mut self, record: ImageRecord) -> StoreResult<()> {
        let mut records = self.doc.load()?;
        match records.iter_mut().find(|r| r.name == record.name) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        self.doc.save(&records)
    }

    /// Remove and return the record for `name`.
    pub fn remove(&mut self, name: &str) -> StoreResult<ImageRecord> {
        let mut records = self.doc.load()?;
        let index = records
            .iter()
            .position(|r| r.name == name)
            .ok_or_else(|| not_found(name))?;
        let removed = records.remove(index);
        self.doc.save(&records)?;
        debug!(name, "record removed");
        Ok(removed)
    }

    /// Rename a record and point it at its new blob paths.
    ///
    /// `NotFound` if `old` is absent, `Conflict` if `new` is taken.
    pub fn rename(&mut self, old: &str, new: &str, paths: RecordPaths) -> StoreResult<()> {
        let mut records = self.doc.load()?;
        if records.iter().any(|r| r.name == new) {
            return Err(StoreError::Conflict {
                kind: EntityKind::Image,
                name: new.to_string(),
            });
        }
        let record = records
            .iter_mut()
            .find(|r| r.name == old)
            .ok_or_else(|| not_found(old))?;
        record.name = new.to_string();
        record.original_path = paths.original;
        record.thumbnail_path = paths.thumbnail;
        self.doc.save(&records)
    }

    /// Union `labels` into the record's tag set. Returns how many were new.
    pub fn add_tags<I, S>(&mut self, name: &str, labels: I) -> StoreResult<usize>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut records = self.doc.load()?;
        let record = records
            .iter_mut()
            .find(|r| r.name == name)
            .ok_or_else(|| not_found(name))?;
        let added = record.tags.extend_labels(labels);
        if added > 0 {
            self.doc.save(&records)?;
        }
        Ok(added)
    }

    /// Apply many tag unions in one read-modify-write.
    ///
    /// Names without a record are reported as [`TagUpdate::Missing`] rather
    /// than failing the batch.
    pub fn add_tags_many<I, L>(&mut self, updates: I) -> StoreResult<Vec<(String, TagUpdate)>>
    where
        I: IntoIterator<Item = (String, L)>,
        L: IntoIterator<Item = String>,
    {
        let mut records = self.doc.load()?;
        let mut outcomes = Vec::new();
        let mut changed = false;
        for (name, labels) in updates {
            let outcome = match records.iter_mut().find(|r| r.name == name) {
                Some(record) => {
                    let added = record.tags.extend_labels(labels);
                    changed |= added > 0;
                    TagUpdate::Applied { added }
                }
                None => TagUpdate::Missing,
            };
            outcomes.push((name, outcome));
        }
        if changed {
            self.doc.save(&records)?;
        }
        Ok(outcomes)
    }
}

fn not_found(name: &str) -> StoreError {
    StoreError::NotFound {
        kind: EntityKind::Image,
        name: name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn store() -> (tempfile::TempDir, MetadataStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = MetadataStore::open(&dir.path().join("metadata.json")).unwrap();
        (dir, store)
    }

    fn record(name: &str) -> ImageRecord {
        ImageRecord::new(
            name,
            format!("originals/{name}"),
            format!("thumbnails/thumbnail-{name}"),
        )
    }

    #[test]
    fn empty_store_lists_nothing() {
        let (_dir, store) = store();
        assert!(store.list().unwrap().is_empty());
        assert!(store.get("a.png").unwrap_err().is_not_found());
    }

    #[test]
    fn upsert_appends_then_replaces() {
        let (_dir, store) = store();
        store.upsert(record("a.png")).unwrap();
        store.upsert(record("b.png")).unwrap();
        store.upsert(record("a.png").with_tags(["apple"])).unwrap();

        let records = store.list().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "a.png");
        assert!(records[0].tags.contains("apple"));
    }

    #[test]
    fn remove_returns_record() {
        let (_dir, store) = store();
        store.upsert(record("a.png")).unwrap();
        assert_eq!(store.remove("a.png").unwrap().name, "a.png");
        assert!(store.remove("a.png").unwrap_err().is_not_found());
    }

    #[test]
    fn rename_updates_name_and_paths() {
        let (_dir, store) = store();
        store.upsert(record("a.png").with_tags(["apple"])).unwrap();
        store
            .rename(
                "a.png",
                "b.png",
                RecordPaths {
                    original: "originals/b.png".into(),
                    thumbnail: "thumbnails/thumbnail-b.png".into(),
                },
            )
            .unwrap();

        assert!(store.get("a.png").unwrap_err().is_not_found());
        let renamed = store.get("b.png").unwrap();
        assert_eq!(renamed.original_path, PathBuf::from("originals/b.png"));
        assert_eq!(renamed.thumbnail_path, PathBuf::from("thumbnails/thumbnail-b.png"));
        assert!(renamed.tags.contains("apple"));
    }

    #[test]
    fn rename_conflict_and_missing() {
        let (_dir, store) = store();
        store.upsert(record("a.png")).unwrap();
        store.upsert(record("b.png")).unwrap();
        let paths = RecordPaths {
            original: "x".into(),
            thumbnail: "y".into(),
        };
        assert!(store.rename("a.png", "b.png", paths.clone()).unwrap_err().is_conflict());
        assert!(store.rename("zzz.png", "c.png", paths).unwrap_err().is_not_found());
        assert_eq!(store.get("a.png").unwrap().original_path, PathBuf::from("originals/a.png"));
    }

    #[test]
    fn add_tags_is_idempotent() {
        let (_dir, store) = store();
        store.upsert(record("a.png")).unwrap();
        assert_eq!(store.add_tags("a.png", ["apple", "banana"]).unwrap(), 2);
        assert_eq!(store.add_tags("a.png", ["apple"]).unwrap(), 0);
        assert_eq!(store.get("a.png").unwrap().tags.len(), 2);
        assert!(store.add_tags("ghost.png", ["apple"]).unwrap_err().is_not_found());
    }

    #[test]
    fn add_tags_many_reports_missing() {
        let (_dir, store) = store();
        store.upsert(record("a.png")).unwrap();
        let outcomes = store
            .lock()
            .unwrap()
            .add_tags_many(vec![
                ("a.png".to_string(), vec!["apple".to_string()]),
                ("gone.png".to_string(), vec!["apple".to_string()]),
            ])
            .unwrap();
        assert_eq!(outcomes[0].1, TagUpdate::Applied { added: 1 });
        assert_eq!(outcomes[1].1, TagUpdate::Missing);
        assert!(store.get("a.png").unwrap().tags.contains("apple"));
    }

    #[test]
    fn records_survive_reopen() {
        let (dir, store) = store();
        store.upsert(record("a.png").with_tags(["apple"])).unwrap();
        drop(store);
        let reopened = MetadataStore::open(&dir.path().join("metadata.json")).unwrap();
        assert!(reopened.get("a.png").unwrap().tags.contains("apple"));
    }

    #[test]
    fn concurrent_upserts_lose_nothing() {
        let (_dir, store) = store();
        let store = Arc::new(store);
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.upsert(record(&format!("img-{i}.png"))).unwrap())
            })
            .collect();
        for h in handles {
            h.join().expect("thread should not panic");
        }
        assert_eq!(store.list().unwrap().len(), 16);
    }
}
