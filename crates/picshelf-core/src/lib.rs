//! Picshelf coordinator.
//!
//! [`Shelf`] is the single entry point for every operation that must keep
//! the blob store, the metadata document and the catalogue document
//! consistent. Interfaces (HTTP, CLI) only translate requests into calls on
//! a shared `Shelf`.
//!
//! - [`ShelfConfig`] -- TOML-loadable settings with defaults
//! - [`ShelfError`] -- NotFound / Conflict / Validation / I/O taxonomy
//! - [`UploadReport`], [`RemovalReport`], [`TagReport`] -- per-item outcomes
//!   of bulk operations

pub mod config;
pub mod error;
mod locks;
mod pool;
pub mod report;
pub mod shelf;

pub use config::ShelfConfig;
pub use error::{ShelfError, ShelfResult};
pub use report::{
    ItemFailure, RemovalReport, TagReport, TagScope, TagStatistics, TaggedImage, UploadFile,
    UploadReport, UploadedImage,
};
pub use shelf::Shelf;

pub use picshelf_store::Catalogues;
pub use picshelf_types::{CatalogueRecord, EntityKind, ImageRecord};
