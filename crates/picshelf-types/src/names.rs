//! Name rules for images and catalogues.
//!
//! Image names double as file names inside the originals and thumbnails
//! directories, so they must be a single path component:
//! - Must be non-empty
//! - Must not contain `/`, `\`, NUL or other control characters
//! - Must not be `.` or `..`
//!
//! Catalogue names only key a JSON object and just need to be non-empty
//! and free of control characters.

use crate::error::{TypesError, TypesResult};
use crate::EntityKind;

/// Prefix prepended to an image name to form its thumbnail file name.
pub const THUMBNAIL_PREFIX: &str = "thumbnail-";

/// Validate an image name, returning `Ok(())` if it is usable as a file name.
///
/// # Examples
///
/// ```
/// use picshelf_types::names::validate_image_name;
///
/// assert!(validate_image_name("cat.png").is_ok());
/// assert!(validate_image_name("").is_err());
/// assert!(validate_image_name("../etc/passwd").is_err());
/// ```
pub fn validate_image_name(name: &str) -> TypesResult<()> {
    let invalid = |reason: &str| TypesError::InvalidName {
        kind: EntityKind::Image,
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name required"));
    }
    if name == "." || name == ".." {
        return Err(invalid("must not be '.' or '..'"));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(invalid("must not contain path separators"));
    }
    if name.chars().any(char::is_control) {
        return Err(invalid("must not contain control characters"));
    }
    Ok(())
}

/// Validate a catalogue name.
pub fn validate_catalogue_name(name: &str) -> TypesResult<()> {
    if name.trim().is_empty() {
        return Err(TypesError::InvalidName {
            kind: EntityKind::Catalogue,
            name: name.to_string(),
            reason: "name required".into(),
        });
    }
    if name.chars().any(char::is_control) {
        return Err(TypesError::InvalidName {
            kind: EntityKind::Catalogue,
            name: name.to_string(),
            reason: "must not contain control characters".into(),
        });
    }
    Ok(())
}

/// File name of the thumbnail derived from the image `name`.
pub fn thumbnail_file_name(name: &str) -> String {
    format!("{THUMBNAIL_PREFIX}{name}")
}
