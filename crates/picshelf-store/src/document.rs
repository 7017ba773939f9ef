use std::fs;
use std::io::{self, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// A whole JSON document on disk.
///
/// Every read parses the entire file and every write replaces it. Writes go
/// through a temp file in the same directory followed by an atomic rename,
/// so readers see either the old document or the new one.
///
/// Not synchronized on its own: the owning store keeps it behind a mutex and
/// only touches it from inside its operations.
pub(crate) struct JsonDocument<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonDocument<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    /// Bind to `path`, creating its parent directory if needed.
    pub(crate) fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(Self {
            path: path.to_path_buf(),
            _marker: PhantomData,
        })
    }

    /// Read the whole document. A missing or blank file reads as `T::default()`.
    pub(crate) fn load(&self) -> StoreResult<T> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(T::default()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(T::default());
        }
        serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    /// Replace the whole document.
    pub(crate) fn save(&self, value: &T) -> StoreResult<()> {
        let encoded = serde_json::to_vec_pretty(value).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&encoded)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        debug!(path = %self.path.display(), bytes = encoded.len(), "document written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn missing_file_reads_default() {
        let dir = tempfile::tempdir().unwrap();
        let doc: JsonDocument<Vec<String>> =
            JsonDocument::open(&dir.path().join("x.json")).unwrap();
        assert!(doc.load().unwrap().is_empty());
    }

    #[test]
    fn blank_file_reads_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.json");
        fs::write(&path, "  \n").unwrap();
        let doc: JsonDocument<BTreeMap<String, u32>> = JsonDocument::open(&path).unwrap();
        assert!(doc.load().unwrap().is_empty());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let doc: JsonDocument<Vec<String>> =
            JsonDocument::open(&dir.path().join("nested/x.json")).unwrap();
        doc.save(&vec!["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(doc.load().unwrap(), vec!["a", "b"]);
        // Only the document itself remains; the temp file was renamed away.
        let entries: Vec<_> = fs::read_dir(dir.path().join("nested")).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn garbage_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.json");
        fs::write(&path, "{not json").unwrap();
        let doc: JsonDocument<Vec<String>> = JsonDocument::open(&path).unwrap();
        assert!(matches!(doc.load(), Err(StoreError::Corrupt { .. })));
    }
}
