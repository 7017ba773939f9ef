use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{TaggerError, TaggerResult};

/// Append-only audit log of assigned tags.
///
/// One line per label: `<image>, <tag>, <duration>ms`, where the duration is
/// how long the classifier took for that image. Lines are only ever
/// appended; the file is never rewritten.
pub struct TagLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl TagLog {
    /// Open (or create) the log at `path`.
    pub fn open(path: &Path) -> TaggerResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one line per label for `image`.
    pub fn record<'a, I>(&self, image: &str, labels: I, duration: Duration) -> TaggerResult<()>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut lines = String::new();
        for label in labels {
            lines.push_str(&format!("{image}, {label}, {}ms\n", duration.as_millis()));
        }
        if lines.is_empty() {
            return Ok(());
        }
        let mut file = self.file.lock().map_err(|_| TaggerError::Poisoned)?;
        file.write_all(lines.as_bytes())?;
        file.flush()?;
        tracing::debug!(image, "tag log appended");
        Ok(())
    }

    /// The whole log as text. Empty if nothing was logged yet.
    pub fn read_all(&self) -> TaggerResult<String> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl std::fmt::Debug for TagLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagLog").field("path", &self.path).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_one_line_per_label() {
        let dir = tempfile::tempdir().unwrap();
        let log = TagLog::open(&dir.path().join("tags.log")).unwrap();
        let labels = ["apple".to_string(), "banana".to_string()];
        log.record("a.png", &labels, Duration::from_millis(12)).unwrap();
        log.record("b.png", &labels[..1], Duration::from_millis(3)).unwrap();

        assert_eq!(
            log.read_all().unwrap(),
            "a.png, apple, 12ms\na.png, banana, 12ms\nb.png, apple, 3ms\n"
        );
    }

    #[test]
    fn reopening_keeps_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tags.log");
        let label = ["apple".to_string()];
        TagLog::open(&path).unwrap().record("a.png", &label, Duration::ZERO).unwrap();
        let log = TagLog::open(&path).unwrap();
        log.record("b.png", &label, Duration::ZERO).unwrap();
        assert_eq!(log.read_all().unwrap().lines().count(), 2);
    }

    #[test]
    fn no_labels_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let log = TagLog::open(&dir.path().join("tags.log")).unwrap();
        log.record("a.png", &Vec::new(), Duration::ZERO).unwrap();
        assert!(log.read_all().unwrap().is_empty());
    }
}
