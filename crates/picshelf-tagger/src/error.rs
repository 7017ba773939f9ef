use thiserror::Error;

/// Errors from classifiers and the tag log.
#[derive(Debug, Error)]
pub enum TaggerError {
    /// The classifier could not label this image.
    #[error("classification failed for {name}: {reason}")]
    Classification { name: String, reason: String },

    /// A random classifier was configured with no labels to choose from.
    #[error("classifier has no labels to choose from")]
    EmptyVocabulary,

    /// I/O error writing or reading the tag log.
    #[error("tag log I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("tag log lock poisoned")]
    Poisoned,
}

/// Result alias for tagger operations.
pub type TaggerResult<T> = Result<T, TaggerError>;
