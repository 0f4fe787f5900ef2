//! Durable file for the checklist document
//!
//! The document lives in a single pretty-printed JSON file,
//! `checklistData.json` under the platform data directory unless configured
//! otherwise. Reads are lenient: a missing or unreadable file yields an empty
//! document. An unreadable file is copied aside before it is overwritten.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use directories::ProjectDirs;

use crate::document::Document;
use crate::error::{Error, Result};
use crate::lock;

/// File name of the document inside the data directory
pub const DATA_FILE_NAME: &str = "checklistData.json";

/// Platform directories for this application.
pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "checklists")
}

/// `<platform data dir>/checklistData.json`, or the working directory when
/// no home directory can be determined.
pub fn default_data_file() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join(DATA_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(DATA_FILE_NAME))
}

/// Result of a lenient read.
#[derive(Debug, Default)]
pub struct Loaded {
    pub document: Document,
    /// Why the file on disk could not be used, if it exists but is unreadable.
    pub unreadable: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Storage {
    data_file: PathBuf,
}

impl Storage {
    pub fn new(data_file: impl Into<PathBuf>) -> Self {
        Self {
            data_file: data_file.into(),
        }
    }

    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    pub fn lock_file(&self) -> PathBuf {
        lock::lock_path_for(&self.data_file)
    }

    pub fn exists(&self) -> bool {
        self.data_file.exists()
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Read the document, falling back to an empty one.
    pub fn load(&self) -> Document {
        self.load_checked().document
    }

    /// Read the document, reporting whether the file had to be ignored.
    pub fn load_checked(&self) -> Loaded {
        let text = match fs::read_to_string(&self.data_file) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Loaded::default(),
            Err(err) => return self.unreadable(err.to_string()),
        };

        match Document::from_json(&text) {
            Ok(document) => Loaded {
                document,
                unreadable: None,
            },
            Err(err) => self.unreadable(err.to_string()),
        }
    }

    fn unreadable(&self, reason: String) -> Loaded {
        tracing::warn!(
            path = %self.data_file.display(),
            reason = %reason,
            "data file unreadable, starting from an empty document"
        );
        Loaded {
            document: Document::default(),
            unreadable: Some(reason),
        }
    }

    /// Copy the current data file to `<file>.corrupt-<timestamp>`.
    pub fn backup_unreadable(&self) -> Result<PathBuf> {
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3fZ");
        let mut name = self.data_file.as_os_str().to_owned();
        name.push(format!(".corrupt-{stamp}"));
        let backup = PathBuf::from(name);
        fs::copy(&self.data_file, &backup)?;
        tracing::warn!(
            path = %self.data_file.display(),
            backup = %backup.display(),
            "backed up unreadable data file"
        );
        Ok(backup)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    pub fn save(&self, document: &Document) -> Result<()> {
        let json = document.to_json_pretty()?;
        lock::write_atomic(&self.data_file, json.as_bytes()).map_err(|err| {
            tracing::error!(path = %self.data_file.display(), error = %err, "save failed");
            match err {
                Error::Io(io) => Error::OperationFailed(format!(
                    "cannot write {}: {io}",
                    self.data_file.display()
                )),
                other => other,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage_in(dir: &TempDir) -> Storage {
        Storage::new(dir.path().join(DATA_FILE_NAME))
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = TempDir::new().expect("tempdir");
        let loaded = storage_in(&dir).load_checked();
        assert!(loaded.document.is_empty());
        assert!(loaded.unreadable.is_none());
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().expect("tempdir");
        let storage = storage_in(&dir);
        let document = Document::sample();
        storage.save(&document).expect("save");

        let text = fs::read_to_string(storage.data_file()).expect("read");
        assert!(text.starts_with("{\n  \"checklists\""));
        assert_eq!(storage.load(), document);
    }

    #[test]
    fn garbage_loads_empty_and_is_reported() {
        let dir = TempDir::new().expect("tempdir");
        let storage = storage_in(&dir);
        fs::write(storage.data_file(), "not json at all").expect("write");

        let loaded = storage.load_checked();
        assert!(loaded.document.is_empty());
        assert!(loaded.unreadable.is_some());
    }

    #[test]
    fn backup_keeps_original_bytes() {
        let dir = TempDir::new().expect("tempdir");
        let storage = storage_in(&dir);
        fs::write(storage.data_file(), "{broken").expect("write");

        let backup = storage.backup_unreadable().expect("backup");
        assert_eq!(fs::read_to_string(&backup).expect("read"), "{broken");
        assert!(backup
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("checklistData.json.corrupt-")));
    }

    #[test]
    fn lock_file_sits_next_to_data() {
        let storage = Storage::new("/data/checklistData.json");
        assert_eq!(
            storage.lock_file(),
            PathBuf::from("/data/checklistData.json.lock")
        );
    }
}
