use picshelf_types::EntityKind;

/// Errors from blob store operations.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// The source blob does not exist.
    #[error("{kind} not found: {name}")]
    NotFound { kind: EntityKind, name: String },

    /// The target of a rename is already occupied.
    #[error("{kind} already exists: {name}")]
    AlreadyExists { kind: EntityKind, name: String },

    /// The thumbnailer could not decode or encode the image.
    #[error("thumbnail rendering failed for {name}: {reason}")]
    Render { name: String, reason: String },

    /// I/O error from the underlying filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A lock guarding in-memory state was poisoned by a panicking writer.
    #[error("blob store lock poisoned")]
    Poisoned,
}

impl BlobError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result alias for blob operations.
pub type BlobResult<T> = Result<T, BlobError>;
