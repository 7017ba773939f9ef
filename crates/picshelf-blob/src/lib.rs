//! Blob storage for Picshelf.
//!
//! The blob store owns the bytes: one original per image name and at most
//! one derived thumbnail next to it. It knows nothing about metadata or
//! catalogues.
//!
//! # Storage Backends
//!
//! All backends implement the [`BlobStore`] trait:
//!
//! - [`FsBlobStore`] -- `originals/` and `thumbnails/` directories on disk
//! - [`InMemoryBlobStore`] -- `HashMap`-based store for tests and embedding
//!
//! Thumbnail rendering is delegated to a [`Thumbnailer`];
//! [`ImageThumbnailer`] is the `image`-crate implementation.

pub mod error;
pub mod fs;
pub mod memory;
pub mod thumbnail;
pub mod traits;

pub use error::{BlobError, BlobResult};
pub use fs::FsBlobStore;
pub use memory::InMemoryBlobStore;
pub use thumbnail::{ImageThumbnailer, Thumbnailer, DEFAULT_THUMBNAIL_EDGE};
pub use traits::{BlobKind, BlobStore, Derivation};
