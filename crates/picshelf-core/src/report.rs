//! Inputs and per-item outcomes of the bulk operations.

use std::collections::BTreeMap;

use serde::Serialize;

/// One file handed to [`Shelf::upload`](crate::Shelf::upload).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// A named item that could not be processed, with the reason.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemFailure {
    pub name: String,
    pub error: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    pub name: String,
    /// `false` when an existing thumbnail was kept.
    pub thumbnail_created: bool,
}

/// Result of one upload batch. Failures never abort the other files.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReport {
    pub processed: Vec<UploadedImage>,
    pub failed: Vec<ItemFailure>,
}

impl UploadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Result of removing images from a catalogue.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovalReport {
    pub removed: usize,
    pub not_found: Vec<String>,
}

/// Which images a tagging run covers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TagScope {
    All,
    Catalogue(String),
}

impl TagScope {
    pub fn from_catalogue(name: Option<String>) -> Self {
        match name {
            Some(name) => Self::Catalogue(name),
            None => Self::All,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaggedImage {
    pub name: String,
    pub labels: Vec<String>,
    /// Labels that were not on the record before.
    pub added: usize,
}

/// Result of one tagging run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagReport {
    pub tagged: Vec<TaggedImage>,
    pub failed: Vec<ItemFailure>,
}

/// Tag label to number of images carrying it.
pub type TagStatistics = BTreeMap<String, usize>;
