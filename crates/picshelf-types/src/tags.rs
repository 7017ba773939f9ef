use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// The classification labels attached to one image.
///
/// A set: inserting a label that is already present is a no-op, so tagging
/// the same image twice never produces duplicates. Serialized as a JSON array
/// in sorted order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet(BTreeSet<String>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Union `labels` into the set. Returns how many labels were new.
    pub fn extend_labels<I, S>(&mut self, labels: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut added = 0;
        for label in labels {
            if self.0.insert(label.into()) {
                added += 1;
            }
        }
        added
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.contains(label)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<'a> IntoIterator for &'a TagSet {
    type Item = &'a String;
    type IntoIter = std::collections::btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn extend_reports_new_labels_only() {
        let mut tags = TagSet::new();
        assert_eq!(tags.extend_labels(["apple", "banana"]), 2);
        assert_eq!(tags.extend_labels(["apple", "cherry"]), 1);
        assert_eq!(tags.len(), 3);
        assert!(tags.contains("cherry"));
    }

    #[test]
    fn serializes_as_sorted_array() {
        let tags: TagSet = ["banana", "apple"].into_iter().collect();
        let json = serde_json::to_string(&tags).unwrap();
        assert_eq!(json, r#"["apple","banana"]"#);
    }

    #[test]
    fn duplicate_labels_in_json_collapse() {
        let tags: TagSet = serde_json::from_str(r#"["apple","apple"]"#).unwrap();
        assert_eq!(tags.len(), 1);
    }

    proptest! {
        #[test]
        fn union_is_idempotent(labels in proptest::collection::vec("[a-z]{1,6}", 0..12)) {
            let mut once = TagSet::new();
            once.extend_labels(labels.clone());
            let mut twice = once.clone();
            prop_assert_eq!(twice.extend_labels(labels.clone()), 0);
            prop_assert_eq!(&twice, &once);

            let distinct: BTreeSet<_> = labels.iter().cloned().collect();
            prop_assert_eq!(once.len(), distinct.len());
        }
    }
}
