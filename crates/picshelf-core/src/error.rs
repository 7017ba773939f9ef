use picshelf_blob::BlobError;
use picshelf_store::StoreError;
use picshelf_tagger::TaggerError;
use picshelf_types::{EntityKind, TypesError};
use thiserror::Error;

/// Errors surfaced by coordinator operations.
///
/// `NotFound`, `Conflict` and `Validation` are raised by checks that run
/// before anything is mutated. The remaining variants carry failures from
/// the underlying stores verbatim. Partial failures inside bulk operations
/// are not errors; they are reported in the operation's report.
#[derive(Debug, Error)]
pub enum ShelfError {
    #[error("{kind} not found: {name}")]
    NotFound { kind: EntityKind, name: String },

    #[error("{kind} already exists: {name}")]
    Conflict { kind: EntityKind, name: String },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("blob store error: {0}")]
    Blob(BlobError),

    #[error("document store error: {0}")]
    Store(StoreError),

    #[error("tagger error: {0}")]
    Tagger(#[from] TaggerError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ShelfError {
    pub fn not_found(kind: EntityKind, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn conflict(kind: EntityKind, name: impl Into<String>) -> Self {
        Self::Conflict {
            kind,
            name: name.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<BlobError> for ShelfError {
    fn from(err: BlobError) -> Self {
        match err {
            BlobError::NotFound { kind, name } => Self::NotFound { kind, name },
            BlobError::AlreadyExists { kind, name } => Self::Conflict { kind, name },
            other => Self::Blob(other),
        }
    }
}

impl From<StoreError> for ShelfError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { kind, name } => Self::NotFound { kind, name },
            StoreError::Conflict { kind, name } => Self::Conflict { kind, name },
            StoreError::InvalidName(e) => Self::Validation(e.to_string()),
            other => Self::Store(other),
        }
    }
}

impl From<TypesError> for ShelfError {
    fn from(err: TypesError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Result alias for coordinator operations.
pub type ShelfResult<T> = Result<T, ShelfError>;
