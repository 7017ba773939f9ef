use crate::EntityKind;

/// Errors raised while validating foundation types.
#[derive(Debug, thiserror::Error)]
pub enum TypesError {
    /// A name violates the naming rules for its entity kind.
    #[error("invalid {kind} name {name:?}: {reason}")]
    InvalidName {
        kind: EntityKind,
        name: String,
        reason: String,
    },
}

/// Result alias for type-level validation.
pub type TypesResult<T> = Result<T, TypesError>;
