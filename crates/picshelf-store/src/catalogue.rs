//! The Catalogue Store: named, ordered groups of image names.
//!
//! Persisted as one JSON object keyed by catalogue name and guarded by a
//! single mutex, like the metadata document. Membership lists hold image
//! names only; whether those names still resolve is the reader's problem.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use picshelf_types::{validate_catalogue_name, CatalogueRecord, EntityKind};
use tracing::debug;

use crate::document::JsonDocument;
use crate::error::{StoreError, StoreResult};

/// Catalogues keyed by name.
pub type Catalogues = BTreeMap<String, CatalogueRecord>;

/// Result of removing images from a catalogue.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Removal {
    pub removed: usize,
    /// Requested names that were not members.
    pub not_found: Vec<String>,
}

/// JSON-backed store of catalogues.
pub struct CatalogueStore {
    path: PathBuf,
    doc: Mutex<JsonDocument<Catalogues>>,
}

impl CatalogueStore {
    pub fn open(path: &Path) -> StoreResult<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            doc: Mutex::new(JsonDocument::open(path)?),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock(&self) -> StoreResult<CatalogueGuard<'_>> {
        let doc = self
            .doc
            .lock()
            .map_err(|_| StoreError::Poisoned("catalogues"))?;
        Ok(CatalogueGuard { doc })
    }

    pub fn list(&self) -> StoreResult<Catalogues> {
        self.lock()?.list()
    }

    pub fn get(&self, name: &str) -> StoreResult<CatalogueRecord> {
        self.lock()?.get(name)
    }

    pub fn create<F, E>(
        &self,
        name: &str,
        images: &[String],
        blob_exists: F,
    ) -> Result<CatalogueRecord, E>
    where
        F: FnMut(&str) -> Result<bool, E>,
        E: From<StoreError>,
    {
        self.lock()?.create(name, images, blob_exists)
    }

    pub fn add_images(&self, name: &str, images: &[String]) -> StoreResult<Vec<String>> {
        self.lock()?.add_images(name, images)
    }

    pub fn remove_images(&self, name: &str, images: &[String]) -> StoreResult<Removal> {
        self.lock()?.remove_images(name, images)
    }

    pub fn rename(&self, old: &str, new: &str) -> StoreResult<()> {
        self.lock()?.rename(old, new)
    }

    pub fn delete(&self, name: &str) -> StoreResult<CatalogueRecord> {
        self.lock()?.delete(name)
    }
}

impl std::fmt::Debug for CatalogueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogueStore")
            .field("path", &self.path)
            .finish()
    }
}

/// Exclusive access to the catalogue document for the guard's lifetime.
pub struct CatalogueGuard<'a> {
    doc: MutexGuard<'a, JsonDocument<Catalogues>>,
}

impl CatalogueGuard<'_> {
    fn load(&self) -> StoreResult<Catalogues> {
        let mut catalogues = self.doc.load()?;
        for (key, record) in catalogues.iter_mut() {
            if record.name != *key {
                record.name = key.clone();
            }
        }
        Ok(catalogues)
    }

    pub fn list(&self) -> StoreResult<Catalogues> {
        self.load()
    }

    pub fn get(&self, name: &str) -> StoreResult<CatalogueRecord> {
        self.load()?.remove(name).ok_or_else(|| not_found(name))
    }

    /// Create a catalogue.
    ///
    /// Initial images for which `blob_exists` returns `false` are dropped:
    /// a new catalogue only references images present at creation time.
    /// Later deletions may still leave stale entries behind. An error from
    /// `blob_exists` aborts the creation and is returned as is.
    pub fn create<F, E>(
        &mut self,
        name: &str,
        images: &[String],
        mut blob_exists: F,
    ) -> Result<CatalogueRecord, E>
    where
        F: FnMut(&str) -> Result<bool, E>,
        E: From<StoreError>,
    {
        validate_catalogue_name(name).map_err(StoreError::from)?;
        let mut catalogues = self.load()?;
        if catalogues.contains_key(name) {
            return Err(StoreError::Conflict {
                kind: EntityKind::Catalogue,
                name: name.to_string(),
            }
            .into());
        }

        let mut existing = Vec::with_capacity(images.len());
        for image in images {
            if blob_exists(image.as_str())? {
                existing.push(image.clone());
            } else {
                debug!(catalogue = name, image = image.as_str(), "dropping image without blob");
            }
        }
        let record = CatalogueRecord::new(name, existing);
        catalogues.insert(name.to_string(), record.clone());
        self.doc.save(&catalogues)?;
        Ok(record)
    }

    /// Append images that are not already members, in first-seen order.
    ///
    /// Unlike [`create`](Self::create), names are not checked against the
    /// blob store. Returns the names actually appended.
    pub fn add_images(&mut self, name: &str, images: &[String]) -> StoreResult<Vec<String>> {
        let mut catalogues = self.load()?;
        let record = catalogues.get_mut(name).ok_or_else(|| not_found(name))?;
        let added = record.add_images(images.iter().cloned());
        if !added.is_empty() {
            self.doc.save(&catalogues)?;
        }
        Ok(added)
    }

    pub fn remove_images(&mut self, name: &str, images: &[String]) -> StoreResult<Removal> {
        let mut catalogues = self.load()?;
        let record = catalogues.get_mut(name).ok_or_else(|| not_found(name))?;
        let (removed, not_found) = record.remove_images(images);
        if removed > 0 {
            self.doc.save(&catalogues)?;
        }
        Ok(Removal { removed, not_found })
    }

    /// Rename a catalogue, keeping its timestamp and membership.
    pub fn rename(&mut self, old: &str, new: &str) -> StoreResult<()> {
        validate_catalogue_name(new)?;
        let mut catalogues = self.load()?;
        if !catalogues.contains_key(old) {
            return Err(not_found(old));
        }
        if catalogues.contains_key(new) {
            return Err(StoreError::Conflict {
                kind: EntityKind::Catalogue,
                name: new.to_string(),
            });
        }
        if let Some(mut record) = catalogues.remove(old) {
            record.name = new.to_string();
            catalogues.insert(new.to_string(), record);
        }
        self.doc.save(&catalogues)
    }

    pub fn delete(&mut self, name: &str) -> StoreResult<CatalogueRecord> {
        let mut catalogues = self.load()?;
        let removed = catalogues.remove(name).ok_or_else(|| not_found(name))?;
        self.doc.save(&catalogues)?;
        Ok(removed)
    }
}

fn not_found(name: &str) -> StoreError {
    StoreError::NotFound {
        kind: EntityKind::Catalogue,
        name: name.to_string(),
    }
}
