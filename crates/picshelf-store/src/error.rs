use std::path::PathBuf;

use picshelf_types::{EntityKind, TypesError};

/// Errors from metadata and catalogue store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The referenced record does not exist.
    #[error("{kind} not found: {name}")]
    NotFound { kind: EntityKind, name: String },

    /// A record with this name already exists.
    #[error("{kind} already exists: {name}")]
    Conflict { kind: EntityKind, name: String },

    /// A name failed validation.
    #[error(transparent)]
    InvalidName(#[from] TypesError),

    /// The document on disk could not be parsed or encoded.
    #[error("corrupt document {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    /// I/O error reading or writing the document.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document lock was poisoned by a panicking writer.
    #[error("document lock poisoned: {0}")]
    Poisoned(&'static str),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
