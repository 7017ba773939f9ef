//! Whole-document JSON stores for Picshelf.
//!
//! Two stores, each owning exactly one JSON document:
//!
//! - [`MetadataStore`] -- `metadata.json`, the array of image records
//! - [`CatalogueStore`] -- `catalogues.json`, the map of catalogues
//!
//! # Design Rules
//!
//! 1. Every mutation reads the whole document, modifies it, and writes the
//!    whole document back.
//! 2. One mutex per document. No read of one mutation interleaves with the
//!    write of another.
//! 3. Writes are atomic (temp file + rename); a crash never leaves a
//!    truncated document.
//! 4. The raw document is private. Callers only see store operations, either
//!    one-shot on the store or several in a row on a held guard.
//! 5. A missing or empty document is an empty collection, not an error.

mod document;

pub mod catalogue;
pub mod error;
pub mod metadata;

pub use catalogue::{CatalogueGuard, CatalogueStore, Catalogues, Removal};
pub use error::{StoreError, StoreResult};
pub use metadata::{MetadataGuard, MetadataStore, RecordPaths, TagUpdate};
