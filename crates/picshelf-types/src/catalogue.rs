use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named, ordered, de-duplicated grouping of image names.
///
/// Image names are weak references: the catalogue never owns image data and
/// may list names that no longer resolve to a record. Readers filter such
/// stale entries at use time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogueRecord {
    /// Mirrors the key in the catalogue document. Older documents omit it,
    /// in which case the store fills it in from the key on load.
    #[serde(default)]
    pub name: String,
    #[serde(alias = "creationDate")]
    pub creation_timestamp: DateTime<Utc>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl CatalogueRecord {
    /// Create a catalogue stamped with the current time.
    ///
    /// Duplicate names in `images` are dropped, keeping the first occurrence.
    pub fn new<I, S>(name: impl Into<String>, images: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut record = Self {
            name: name.into(),
            creation_timestamp: Utc::now(),
            images: Vec::new(),
        };
        record.add_images(images);
        record
    }

    pub fn contains(&self, image: &str) -> bool {
        self.images.iter().any(|i| i == image)
    }

    /// Append images not already present, in first-seen order.
    /// Returns the names that were actually appended.
    pub fn add_images<I, S>(&mut self, images: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut added = Vec::new();
        for image in images {
            let image = image.into();
            if !self.contains(&image) {
                self.images.push(image.clone());
                added.push(image);
            }
        }
        added
    }

    /// Remove each named image. Returns the number removed and the names
    /// that were not members.
    pub fn remove_images<I, S>(&mut self, images: I) -> (usize, Vec<String>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut removed = 0;
        let mut not_found = Vec::new();
        for image in images {
            let image = image.as_ref();
            match self.images.iter().position(|i| i == image) {
                Some(index) => {
                    self.images.remove(index);
                    removed += 1;
                }
                None => not_found.push(image.to_string()),
            }
        }
        (removed, not_found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn new_drops_duplicates() {
        let c = CatalogueRecord::new("fruit", ["a.png", "b.png", "a.png"]);
        assert_eq!(c.images, vec!["a.png", "b.png"]);
    }

    #[test]
    fn add_skips_members_and_keeps_order() {
        let mut c = CatalogueRecord::new("fruit", ["b.png"]);
        let added = c.add_images(["c.png", "b.png", "a.png", "c.png"]);
        assert_eq!(added, vec!["c.png", "a.png"]);
        assert_eq!(c.images, vec!["b.png", "c.png", "a.png"]);
    }

    #[test]
    fn remove_reports_missing_names() {
        let mut c = CatalogueRecord::new("fruit", ["a.png", "b.png"]);
        let (removed, not_found) = c.remove_images(["b.png", "ghost.png"]);
        assert_eq!(removed, 1);
        assert_eq!(not_found, vec!["ghost.png"]);
        assert_eq!(c.images, vec!["a.png"]);
    }

    #[test]
    fn reads_legacy_layout() {
        let json = r#"{"creationDate":"2024-01-01T00:00:00Z","images":["x.png"]}"#;
        let c: CatalogueRecord = serde_json::from_str(json).unwrap();
        assert!(c.name.is_empty());
        assert_eq!(c.images, vec!["x.png"]);
    }

    proptest! {
        #[test]
        fn membership_stays_unique_and_ordered(
            initial in proptest::collection::vec("[a-e]\\.png", 0..6),
            added in proptest::collection::vec("[a-h]\\.png", 0..12),
        ) {
            let mut c = CatalogueRecord::new("p", initial.clone());
            c.add_images(added.clone());

            let mut seen = std::collections::HashSet::new();
            prop_assert!(c.images.iter().all(|i| seen.insert(i.clone())));

            let mut expected: Vec<String> = Vec::new();
            for name in initial.iter().chain(added.iter()) {
                if !expected.contains(name) {
                    expected.push(name.clone());
                }
            }
            prop_assert_eq!(c.images, expected);
        }
    }
}
