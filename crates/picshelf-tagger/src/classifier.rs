use std::collections::{BTreeSet, HashMap};

use picshelf_types::ImageRecord;
use rand::seq::SliceRandom;
use tracing::trace;

use crate::error::{TaggerError, TaggerResult};

/// Labels assigned by one classification.
pub type Labels = BTreeSet<String>;

/// Pluggable `classify(record) -> labels` capability.
///
/// Classifiers only look at the record; they never touch storage. The
/// coordinator unions the returned labels into the record's tag set, so a
/// classifier may return labels the image already has.
pub trait Classifier: Send + Sync {
    fn classify(&self, record: &ImageRecord) -> TaggerResult<Labels>;
}

/// Picks one label uniformly at random from a fixed vocabulary.
#[derive(Clone, Debug)]
pub struct RandomClassifier {
    labels: Vec<String>,
}

impl RandomClassifier {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

impl Default for RandomClassifier {
    fn default() -> Self {
        Self::new(["apple", "banana"])
    }
}

impl Classifier for RandomClassifier {
    fn classify(&self, record: &ImageRecord) -> TaggerResult<Labels> {
        let label = self
            .labels
            .choose(&mut rand::thread_rng())
            .ok_or(TaggerError::EmptyVocabulary)?;
        trace!(image = %record.name, label = %label, "random label");
        Ok(Labels::from([label.clone()]))
    }
}

/// Deterministic classifier driven by a lookup table.
///
/// Images not in the table receive `fallback`, which defaults to no labels.
#[derive(Clone, Debug, Default)]
pub struct StaticClassifier {
    table: HashMap<String, Labels>,
    fallback: Labels,
}

impl StaticClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<I, S>(mut self, image: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.table
            .insert(image.into(), labels.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_fallback<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallback = labels.into_iter().map(Into::into).collect();
        self
    }
}

impl Classifier for StaticClassifier {
    fn classify(&self, record: &ImageRecord) -> TaggerResult<Labels> {
        Ok(self
            .table
            .get(&record.name)
            .unwrap_or(&self.fallback)
            .clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> ImageRecord {
        ImageRecord::new(name, name, name)
    }

    #[test]
    fn random_picks_from_vocabulary() {
        let classifier = RandomClassifier::default();
        for _ in 0..32 {
            let labels = classifier.classify(&record("a.png")).unwrap();
            assert_eq!(labels.len(), 1);
            let label = labels.iter().next().unwrap();
            assert!(label == "apple" || label == "banana");
        }
    }

    #[test]
    fn random_without_labels_errors() {
        let classifier = RandomClassifier::new(Vec::<String>::new());
        assert!(matches!(
            classifier.classify(&record("a.png")),
            Err(TaggerError::EmptyVocabulary)
        ));
    }

    #[test]
    fn static_uses_table_then_fallback() {
        let classifier = StaticClassifier::new()
            .with("a.png", ["apple"])
            .with_fallback(["misc"]);
        assert_eq!(
            classifier.classify(&record("a.png")).unwrap(),
            Labels::from(["apple".to_string()])
        );
        assert_eq!(
            classifier.classify(&record("b.png")).unwrap(),
            Labels::from(["misc".to_string()])
        );
    }
}
