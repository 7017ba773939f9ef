//! Tag classification for Picshelf.
//!
//! - [`Classifier`] -- the `classify(record) -> labels` capability
//! - [`RandomClassifier`] -- one label drawn uniformly from a vocabulary
//! - [`StaticClassifier`] -- table-driven, deterministic labels
//! - [`TagLog`] -- append-only audit log of assigned labels

pub mod classifier;
pub mod error;
pub mod log;

pub use classifier::{Classifier, Labels, RandomClassifier, StaticClassifier};
pub use error::{TaggerError, TaggerResult};
pub use log::TagLog;
