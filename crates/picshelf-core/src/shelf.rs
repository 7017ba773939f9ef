//! The consistency coordinator.
//!
//! Every operation that touches more than one store runs here, so that the
//! blob store, the metadata document and the catalogue document never
//! disagree in a way a caller can observe:
//!
//! - an image record exists only while its original blob exists;
//! - catalogues may hold stale image names, and readers tolerate them;
//! - tag sets only grow.
//!
//! Lock order is fixed: image name claims, then the metadata lock, then the
//! catalogue lock. No step takes them in any other order.

use std::sync::Arc;
use std::time::Instant;

use picshelf_blob::{BlobKind, BlobStore, FsBlobStore, ImageThumbnailer};
use picshelf_store::{CatalogueStore, Catalogues, MetadataStore, RecordPaths, TagUpdate};
use picshelf_tagger::{Classifier, RandomClassifier, TagLog};
use picshelf_types::{
    validate_catalogue_name, validate_image_name, CatalogueRecord, EntityKind, ImageRecord,
};
use tracing::{debug, error, info, warn};

use crate::config::ShelfConfig;
use crate::error::{ShelfError, ShelfResult};
use crate::locks::NameLocks;
use crate::pool::run_bounded;
use crate::report::{
    ItemFailure, RemovalReport, TagReport, TagScope, TagStatistics, TaggedImage, UploadFile,
    UploadReport, UploadedImage,
};

/// Coordinates the blob store, metadata store, catalogue store and tag
/// classifier. Safe to share across threads.
pub struct Shelf {
    config: ShelfConfig,
    blobs: Arc<dyn BlobStore>,
    classifier: Arc<dyn Classifier>,
    metadata: MetadataStore,
    catalogues: CatalogueStore,
    tag_log: TagLog,
    names: NameLocks,
}

impl Shelf {
    /// Open a filesystem-backed shelf under `config.storage_root`, with
    /// `image`-crate thumbnails and the random classifier.
    pub fn open(config: ShelfConfig) -> ShelfResult<Self> {
        config.validate()?;
        let thumbnailer = Arc::new(ImageThumbnailer::new(config.thumbnail_max));
        let blobs = Arc::new(FsBlobStore::open(&config.storage_root, thumbnailer)?);
        let classifier = Arc::new(RandomClassifier::new(config.tag_labels.iter().cloned()));
        Self::with_parts(config, blobs, classifier)
    }

    /// Build a shelf around caller-supplied blob storage and classifier.
    /// Documents and the tag log still live under `config.storage_root`.
    pub fn with_parts(
        config: ShelfConfig,
        blobs: Arc<dyn BlobStore>,
        classifier: Arc<dyn Classifier>,
    ) -> ShelfResult<Self> {
        config.validate()?;
        let metadata = MetadataStore::open(&config.metadata_path())?;
        let catalogues = CatalogueStore::open(&config.catalogues_path())?;
        let tag_log = TagLog::open(&config.tag_log_path())?;
        info!(root = %config.storage_root.display(), "shelf opened");
        Ok(Self {
            config,
            blobs,
            classifier,
            metadata,
            catalogues,
            tag_log,
            names: NameLocks::default(),
        })
    }

    pub fn config(&self) -> &ShelfConfig {
        &self.config
    }

    // ---- images ----

    /// Store a batch of originals, derive their thumbnails and record them.
    ///
    /// Files are processed on up to `derive_workers` threads. A failing file
    /// is reported and never affects the others.
    pub fn upload(&self, files: Vec<UploadFile>) -> ShelfResult<UploadReport> {
        if files.is_empty() {
            return Err(ShelfError::Validation("no files uploaded".into()));
        }
        if files.len() > self.config.max_batch {
            return Err(ShelfError::Validation(format!(
                "at most {} files per upload, got {}",
                self.config.max_batch,
                files.len()
            )));
        }

        let outcomes = run_bounded(files, self.config.derive_workers, |file| {
            let name = file.name.clone();
            (name, self.upload_one(file))
        });

        let mut report = UploadReport::default();
        for (name, outcome) in outcomes {
            match outcome {
                Ok(thumbnail_created) => report.processed.push(UploadedImage {
                    name,
                    thumbnail_created,
                }),
                Err(e) => {
                    warn!(name = %name, error = %e, "upload failed");
                    report.failed.push(ItemFailure {
                        name,
                        error: e.to_string(),
                    });
                }
            }
        }
        info!(
            processed = report.processed.len(),
            failed = report.failed.len(),
            "upload batch finished"
        );
        Ok(report)
    }

    fn upload_one(&self, file: UploadFile) -> ShelfResult<bool> {
        validate_image_name(&file.name)?;
        let name = file.name.as_str();
        let _claim = self.names.claim(&[name])?;

        let had_original = self.blobs.exists(BlobKind::Original, name)?;
        let original_path = self.blobs.put(name, &file.bytes)?;
        let derivation = match self.blobs.derive(name) {
            Ok(d) => d,
            Err(e) => {
                if !had_original {
                    self.discard_original(name);
                }
                return Err(e.into());
            }
        };

        let mut metadata = self.metadata.lock()?;
        let record = ImageRecord::new(name, original_path, derivation.path);
        let record = match metadata.get(name) {
            Ok(existing) => record.with_tags(existing.tags.iter()),
            Err(e) if e.is_not_found() => record,
            Err(e) => return Err(e.into()),
        };
        metadata.upsert(record)?;
        debug!(name, thumbnail_created = derivation.created, "image recorded");
        Ok(derivation.created)
    }

    fn discard_original(&self, name: &str) {
        if let Err(e) = self.blobs.delete(BlobKind::Original, name) {
            error!(name, error = %e, "could not remove original after failed derivation");
        }
    }

    pub fn list_images(&self) -> ShelfResult<Vec<ImageRecord>> {
        Ok(self.metadata.list()?)
    }

    pub fn get_image(&self, name: &str) -> ShelfResult<ImageRecord> {
        validate_image_name(name)?;
        Ok(self.metadata.get(name)?)
    }

    pub fn read_original(&self, name: &str) -> ShelfResult<Vec<u8>> {
        validate_image_name(name)?;
        Ok(self.blobs.read(BlobKind::Original, name)?)
    }

    pub fn read_thumbnail(&self, name: &str) -> ShelfResult<Vec<u8>> {
        validate_image_name(name)?;
        Ok(self.blobs.read(BlobKind::Thumbnail, name)?)
    }

    /// Delete an image's blobs and record.
    ///
    /// `NotFound` when neither the original nor a record exists. A missing
    /// thumbnail is logged and otherwise ignored. Catalogue references are
    /// left in place.
    pub fn delete_image(&self, name: &str) -> ShelfResult<()> {
        validate_image_name(name)?;
        let _claim = self.names.claim(&[name])?;
        let mut metadata = self.metadata.lock()?;

        let has_record = metadata.contains(name)?;
        match self.blobs.delete(BlobKind::Original, name) {
            Ok(()) => {}
            Err(e) if e.is_not_found() && has_record => {
                warn!(name, "original already missing, removing record");
            }
            Err(e) => return Err(e.into()),
        }

        if let Err(e) = self.blobs.delete(BlobKind::Thumbnail, name) {
            if e.is_not_found() {
                warn!(name, "thumbnail missing at delete");
            } else {
                warn!(name, error = %e, "thumbnail could not be deleted");
            }
        }

        if has_record {
            metadata.remove(name)?;
        } else {
            debug!(name, "deleted original had no record");
        }
        info!(name, "image deleted");
        Ok(())
    }

    /// Rename an image's blobs and record together.
    ///
    /// `Conflict` if `new` is taken by an original, a thumbnail or a record. Catalogues keep
    /// referring to `old`. When a later step fails, earlier blob moves are
    /// undone before the error is returned.
    pub fn rename_image(&self, old: &str, new: &str) -> ShelfResult<()> {
        validate_image_name(old)?;
        validate_image_name(new)?;
        if old == new {
            return Err(ShelfError::Validation(
                "new name must differ from the current name".into(),
            ));
        }
        let _claim = self.names.claim(&[old, new])?;
        let mut metadata = self.metadata.lock()?;

        if !self.blobs.exists(BlobKind::Original, old)? {
            return Err(ShelfError::not_found(EntityKind::Image, old));
        }
        if self.blobs.exists(BlobKind::Original, new)?
            || self.blobs.exists(BlobKind::Thumbnail, new)?
            || metadata.contains(new)?
        {
            return Err(ShelfError::conflict(EntityKind::Image, new));
        }

        self.blobs.rename(BlobKind::Original, old, new)?;

        let thumbnail_moved = if self.blobs.exists(BlobKind::Thumbnail, old)? {
            if let Err(e) = self.blobs.rename(BlobKind::Thumbnail, old, new) {
                self.undo_rename(BlobKind::Original, old, new);
                return Err(e.into());
            }
            true
        } else {
            warn!(name = old, "renaming image without a thumbnail");
            false
        };

        if metadata.contains(old)? {
            let paths = RecordPaths {
                original: self.blobs.path(BlobKind::Original, new),
                thumbnail: self.blobs.path(BlobKind::Thumbnail, new),
            };
            if let Err(e) = metadata.rename(old, new, paths) {
                if thumbnail_moved {
                    self.undo_rename(BlobKind::Thumbnail, old, new);
                }
                self.undo_rename(BlobKind::Original, old, new);
                return Err(e.into());
            }
        } else {
            debug!(old, new, "renamed original had no record");
        }

        info!(old, new, "image renamed");
        Ok(())
    }

    fn undo_rename(&self, kind: BlobKind, old: &str, new: &str) {
        if let Err(e) = self.blobs.rename(kind, new, old) {
            error!(%kind, old, new, error = %e, "could not undo rename");
        }
    }

    // ---- catalogues ----

    /// Create a catalogue. Initial images without an original blob are
    /// dropped.
    pub fn create_catalogue(
        &self,
        name: &str,
        images: &[String],
    ) -> ShelfResult<CatalogueRecord> {
        validate_catalogue_name(name)?;
        let record = self.catalogues.create(name, images, |image| -> ShelfResult<bool> {
            if validate_image_name(image).is_err() {
                return Ok(false);
            }
            Ok(self.blobs.exists(BlobKind::Original, image)?)
        })?;
        info!(name, images = record.images.len(), "catalogue created");
        Ok(record)
    }

    pub fn list_catalogues(&self) -> ShelfResult<Catalogues> {
        Ok(self.catalogues.list()?)
    }

    pub fn get_catalogue(&self, name: &str) -> ShelfResult<CatalogueRecord> {
        Ok(self.catalogues.get(name)?)
    }

    /// Append images to a catalogue. Names are not checked against the blob
    /// store. Returns the names actually appended.
    pub fn add_images_to_catalogue(
        &self,
        name: &str,
        images: &[String],
    ) -> ShelfResult<Vec<String>> {
        let added = self.catalogues.add_images(name, images)?;
        info!(name, added = added.len(), "images added to catalogue");
        Ok(added)
    }

    pub fn remove_images_from_catalogue(
        &self,
        name: &str,
        images: &[String],
    ) -> ShelfResult<RemovalReport> {
        let removal = self.catalogues.remove_images(name, images)?;
        if !removal.not_found.is_empty() {
            warn!(name, missing = ?removal.not_found, "images were not in catalogue");
        }
        info!(name, removed = removal.removed, "images removed from catalogue");
        Ok(RemovalReport {
            removed: removal.removed,
            not_found: removal.not_found,
        })
    }

    pub fn rename_catalogue(&self, old: &str, new: &str) -> ShelfResult<()> {
        self.catalogues.rename(old, new)?;
        info!(old, new, "catalogue renamed");
        Ok(())
    }

    /// Delete a catalogue. Its images are untouched.
    pub fn delete_catalogue(&self, name: &str) -> ShelfResult<CatalogueRecord> {
        let record = self.catalogues.delete(name)?;
        info!(name, "catalogue deleted");
        Ok(record)
    }

    // ---- tags ----

    /// Classify every image in `scope` and union the labels into its tags.
    ///
    /// Catalogue entries that no longer name a record are skipped. A
    /// classifier failure on one image is reported and the run continues.
    /// All tag changes are written in one metadata update, then appended to
    /// the tag log.
    pub fn tag_images(&self, scope: TagScope) -> ShelfResult<TagReport> {
        let mut metadata = self.metadata.lock()?;
        let records = metadata.list()?;

        let targets: Vec<&ImageRecord> = match &scope {
            TagScope::All => records.iter().collect(),
            TagScope::Catalogue(catalogue) => {
                let members = self.catalogues.lock()?.get(catalogue)?.images;
                members
                    .iter()
                    .filter_map(|image| {
                        let found = records.iter().find(|r| &r.name == image);
                        if found.is_none() {
                            debug!(
                                catalogue = %catalogue,
                                image = %image,
                                "skipping stale reference"
                            );
                        }
                        found
                    })
                    .collect()
            }
        };

        let mut report = TagReport::default();
        let mut updates = Vec::with_capacity(targets.len());
        let mut timings = Vec::with_capacity(targets.len());
        for record in targets {
            let started = Instant::now();
            match self.classifier.classify(record) {
                Ok(labels) => {
                    let labels: Vec<String> = labels.into_iter().collect();
                    timings.push(started.elapsed());
                    updates.push((record.name.clone(), labels));
                }
                Err(e) => {
                    warn!(name = %record.name, error = %e, "classification failed");
                    report.failed.push(ItemFailure {
                        name: record.name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let outcomes = metadata.add_tags_many(updates.iter().cloned())?;
        drop(metadata);

        for ((name, outcome), ((_, labels), elapsed)) in
            outcomes.into_iter().zip(updates.into_iter().zip(timings))
        {
            let TagUpdate::Applied { added } = outcome else {
                continue;
            };
            if let Err(e) = self.tag_log.record(&name, &labels, elapsed) {
                warn!(name = %name, error = %e, "tag log append failed");
            }
            report.tagged.push(TaggedImage {
                name,
                labels,
                added,
            });
        }
        info!(
            scope = ?scope,
            tagged = report.tagged.len(),
            failed = report.failed.len(),
            "tagging finished"
        );
        Ok(report)
    }

    /// Number of images carrying each tag.
    pub fn tag_statistics(&self) -> ShelfResult<TagStatistics> {
        let mut stats = TagStatistics::new();
        for record in self.metadata.list()? {
            for tag in record.tags.iter() {
                *stats.entry(tag.to_string()).or_default() += 1;
            }
        }
        Ok(stats)
    }

    /// The tag audit log as text.
    pub fn tag_log(&self) -> ShelfResult<String> {
        Ok(self.tag_log.read_all()?)
    }
}

impl std::fmt::Debug for Shelf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shelf")
            .field("root", &self.config.storage_root)
            .field("metadata", &self.metadata)
            .field("catalogues", &self.catalogues)
            .finish_non_exhaustive()
    }
}
