//! Foundation types for Picshelf.
//!
//! Every other crate in the workspace speaks in terms of these types:
//!
//! - [`ImageRecord`] -- the metadata entry describing one uploaded image
//! - [`CatalogueRecord`] -- a named, ordered, de-duplicated list of image
//!   names (weak references, resolved by lookup at use time)
//! - [`TagSet`] -- the set of classification labels attached to an image
//! - [`EntityKind`] -- which kind of entity an error refers to
//!
//! Name rules for images and catalogues live in [`names`].

pub mod catalogue;
pub mod error;
pub mod image;
pub mod names;
pub mod tags;

pub use catalogue::CatalogueRecord;
pub use error::{TypesError, TypesResult};
pub use image::ImageRecord;
pub use names::{thumbnail_file_name, validate_catalogue_name, validate_image_name};
pub use tags::TagSet;

/// The kind of entity an operation or error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Image,
    Thumbnail,
    Catalogue,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Thumbnail => write!(f, "thumbnail"),
            Self::Catalogue => write!(f, "catalogue"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_kind_display() {
        assert_eq!(EntityKind::Image.to_string(), "image");
        assert_eq!(EntityKind::Thumbnail.to_string(), "thumbnail");
        assert_eq!(EntityKind::Catalogue.to_string(), "catalogue");
    }
}
