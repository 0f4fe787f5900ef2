//! Locked load, mutate, save cycle over the document file.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::document::Document;
use crate::error::Result;
use crate::lock::FileLock;
use crate::storage::Storage;

/// Outcome of a mutation: its value, plus a warning when the change could
/// not be written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Persisted<T> {
    pub value: T,
    pub warning: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DocumentStore {
    storage: Storage,
    lock_timeout_ms: u64,
}

impl DocumentStore {
    pub fn new(storage: Storage, lock_timeout_ms: u64) -> Self {
        Self {
            storage,
            lock_timeout_ms,
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Current document, read without locking. Writes are atomic renames, so
    /// a reader never sees a partial file.
    pub fn snapshot(&self) -> Document {
        self.storage.load()
    }

    /// Run `f` against the document under the exclusive lock and persist the
    /// result.
    ///
    /// An error from `f` leaves the file untouched. When `f` changes nothing
    /// the file is not rewritten, even an unreadable one. A failed save is
    /// returned as `Persisted::warning` rather than an error: the mutation
    /// itself succeeded.
    pub fn update<T, F>(&self, f: F) -> Result<Persisted<T>>
    where
        F: FnOnce(&mut Document) -> Result<T>,
    {
        let _lock = FileLock::acquire(self.storage.lock_file(), self.lock_timeout_ms)?;
        self.apply(f)
    }

    /// Like `update`, but returns `Ok(None)` without waiting when another
    /// process holds the lock.
    pub fn try_update<T, F>(&self, f: F) -> Result<Option<Persisted<T>>>
    where
        F: FnOnce(&mut Document) -> Result<T>,
    {
        match FileLock::try_acquire(self.storage.lock_file())? {
            Some(_lock) => self.apply(f).map(Some),
            None => Ok(None),
        }
    }

    /// Load, mutate and save. The caller holds the lock.
    fn apply<T, F>(&self, f: F) -> Result<Persisted<T>>
    where
        F: FnOnce(&mut Document) -> Result<T>,
    {
        let loaded = self.storage.load_checked();
        let mut document = loaded.document.clone();
        let value = f(&mut document)?;

        if document == loaded.document && self.storage.exists() {
            return Ok(Persisted {
                value,
                warning: None,
            });
        }

        if loaded.unreadable.is_some() {
            if let Err(err) = self.storage.backup_unreadable() {
                return Ok(Persisted {
                    value,
                    warning: Some(format!(
                        "not saved: could not back up unreadable {}: {err}",
                        self.storage.data_file().display()
                    )),
                });
            }
        }

        let warning = match self.storage.save(&document) {
            Ok(()) => None,
            Err(err) => Some(format!("not saved: {err}")),
        };
        Ok(Persisted { value, warning })
    }

    /// One auto-reset pass at `now`. Returns the ids of reset checklists.
    pub fn sweep(&self, now: DateTime<Utc>) -> Result<Persisted<Vec<Uuid>>> {
        let outcome = self.update(|document| Ok(document.sweep_auto_reset(now)))?;
        log_sweep(&outcome.value);
        Ok(outcome)
    }

    /// Sweep only if the lock is free; `Ok(None)` when a mutation holds it.
    pub fn try_sweep(&self, now: DateTime<Utc>) -> Result<Option<Persisted<Vec<Uuid>>>> {
        let outcome = self.try_update(|document| Ok(document.sweep_auto_reset(now)))?;
        if let Some(outcome) = &outcome {
            log_sweep(&outcome.value);
        }
        Ok(outcome)
    }
}

fn log_sweep(reset: &[Uuid]) {
    if !reset.is_empty() {
        tracing::info!(count = reset.len(), "auto-reset checklists");
    }
}
