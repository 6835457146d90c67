//! Directory-backed transaction store.
//!
//! ```text
//! <transaction_dir>/
//! ├─ .lock                        # Advisory lock for single-writer
//! ├─ <config-name>.<id>           # Snapshot of an in-progress transaction
//! └─ failed/
//!    └─ <config-name>.<id>        # Snapshot set aside by recovery
//! ```
//!
//! The `.lock` file ensures only one process stages transactions in the
//! directory at a time.

use super::TransactionStore;
use crate::error::{ConfError, ConfResult};
use crate::types::TransactionId;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

const LOCK_FILE: &str = ".lock";
const FAILED_DIR: &str = "failed";
/// Suffix of in-flight atomic writes, never a transaction.
const TEMP_SUFFIX: &str = ".tmp";

/// Stores one snapshot file per transaction in a directory.
///
/// # Thread Safety
///
/// The store holds an exclusive lock on its directory for its lifetime.
/// Only one `DirTransactionStore` can exist per directory at a time.
#[derive(Debug)]
pub struct DirTransactionStore {
    /// Root directory path.
    path: PathBuf,
    /// `<config-name>.`, the prefix of every snapshot file name.
    prefix: String,
    /// Lock file handle (held for exclusive access).
    _lock_file: File,
}

impl DirTransactionStore {
    /// Opens or creates a transaction directory for `config_file`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `path` exists but is not a directory
    /// - Another store holds the lock (returns `StoreLocked`)
    /// - I/O errors occur
    pub fn open(path: &Path, config_file: &Path) -> ConfResult<Self> {
        let base = config_file
            .file_name()
            .ok_or_else(|| {
                ConfError::invalid_params(format!(
                    "configuration file has no file name: {}",
                    config_file.display()
                ))
            })?
            .to_string_lossy()
            .into_owned();

        fs::create_dir_all(path)?;
        if !path.is_dir() {
            return Err(ConfError::invalid_params(format!(
                "transaction path is not a directory: {}",
                path.display()
            )));
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join(LOCK_FILE))?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(ConfError::StoreLocked);
        }

        Ok(Self {
            path: path.to_path_buf(),
            prefix: format!("{base}."),
            _lock_file: lock_file,
        })
    }

    /// Returns the transaction directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the directory holding failed snapshots.
    #[must_use]
    pub fn failed_dir(&self) -> PathBuf {
        self.path.join(FAILED_DIR)
    }

    fn file_name(&self, id: &TransactionId) -> ConfResult<String> {
        let raw = id.as_str();
        if raw.is_empty() || raw.contains(['/', '\\']) || raw.contains("..") {
            return Err(ConfError::invalid_transaction(format!("malformed id {raw:?}")));
        }
        Ok(format!("{}{raw}", self.prefix))
    }

    fn snapshots_in(&self, dir: &Path) -> ConfResult<Vec<(TransactionId, PathBuf)>> {
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut found = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(TEMP_SUFFIX) {
                continue;
            }
            if let Some(id) = name.strip_prefix(&self.prefix) {
                if !id.is_empty() {
                    found.push((TransactionId::new(id), entry.path()));
                }
            }
        }
        found.sort();
        Ok(found)
    }

    /// Syncs a directory so file creation, rename and removal are durable.
    #[cfg(unix)]
    fn sync_directory(dir: &Path) -> ConfResult<()> {
        File::open(dir)?.sync_all()?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn sync_directory(_dir: &Path) -> ConfResult<()> {
        // NTFS journals metadata; directories cannot be fsynced on Windows.
        Ok(())
    }
}

impl TransactionStore for DirTransactionStore {
    fn allocate_id(&mut self) -> ConfResult<TransactionId> {
        loop {
            let id = TransactionId::new(Uuid::new_v4().to_string());
            let name = self.file_name(&id)?;
            if !self.path.join(&name).exists() && !self.failed_dir().join(&name).exists() {
                return Ok(id);
            }
        }
    }

    fn transaction_file(&self, id: &TransactionId) -> ConfResult<PathBuf> {
        Ok(self.path.join(self.file_name(id)?))
    }

    fn list_in_progress(&self) -> ConfResult<Vec<TransactionId>> {
        Ok(self
            .snapshots_in(&self.path)?
            .into_iter()
            .map(|(id, _)| id)
            .collect())
    }

    fn delete_transaction_files(&mut self, id: &TransactionId) -> ConfResult<()> {
        let name = self.file_name(id)?;
        let mut removed = false;
        for dir in [self.path.clone(), self.failed_dir()] {
            for candidate in [dir.join(&name), dir.join(format!("{name}{TEMP_SUFFIX}"))] {
                if candidate.exists() {
                    fs::remove_file(&candidate)?;
                    removed = true;
                }
            }
        }
        if removed {
            Self::sync_directory(&self.path)?;
            debug!(transaction = %id, "transaction files deleted");
        }
        Ok(())
    }

    fn mark_failed(&mut self, id: &TransactionId) -> ConfResult<()> {
        let name = self.file_name(id)?;
        let source = self.path.join(&name);
        if !source.exists() {
            return Ok(());
        }
        let failed = self.failed_dir();
        fs::create_dir_all(&failed)?;
        fs::rename(&source, failed.join(&name))?;
        Self::sync_directory(&self.path)?;
        Self::sync_directory(&failed)?;
        Ok(())
    }

    fn list_failed(&self) -> ConfResult<Vec<(TransactionId, PathBuf)>> {
        self.snapshots_in(&self.failed_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn open(temp: &Path) -> DirTransactionStore {
        DirTransactionStore::open(&temp.join("tx"), Path::new("/etc/haproxy/spoe.cfg")).unwrap()
    }

    #[test]
    fn open_creates_directory() {
        let temp = tempdir().unwrap();
        let store = open(temp.path());
        assert!(store.path().is_dir());
        assert!(store.list_in_progress().unwrap().is_empty());
    }

    #[test]
    fn lock_prevents_second_open() {
        let temp = tempdir().unwrap();
        let _store = open(temp.path());

        let result = DirTransactionStore::open(&temp.path().join("tx"), Path::new("spoe.cfg"));
        assert!(matches!(result, Err(ConfError::StoreLocked)));
    }

    #[test]
    fn lock_released_on_drop() {
        let temp = tempdir().unwrap();
        {
            let _store = open(temp.path());
        }
        let _again = open(temp.path());
    }

    #[test]
    fn snapshot_files_are_listed() {
        let temp = tempdir().unwrap();
        let mut store = open(temp.path());

        let id = store.allocate_id().unwrap();
        let file = store.transaction_file(&id).unwrap();
        assert_eq!(file, temp.path().join("tx").join(format!("spoe.cfg.{id}")));

        fs::write(&file, "# _version=1\n").unwrap();
        fs::write(store.path().join("spoe.cfg.abc.tmp"), "").unwrap();
        fs::write(store.path().join("other.cfg.xyz"), "").unwrap();

        assert_eq!(store.list_in_progress().unwrap(), vec![id.clone()]);

        store.delete_transaction_files(&id).unwrap();
        assert!(!file.exists());
        assert!(store.list_in_progress().unwrap().is_empty());
        // Deleting again is not an error.
        store.delete_transaction_files(&id).unwrap();
    }

    #[test]
    fn mark_failed_moves_snapshot() {
        let temp = tempdir().unwrap();
        let mut store = open(temp.path());

        let id = TransactionId::new("t1");
        fs::write(store.transaction_file(&id).unwrap(), "# _version=2\n").unwrap();

        store.mark_failed(&id).unwrap();
        assert!(store.list_in_progress().unwrap().is_empty());

        let failed = store.list_failed().unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].0, id);
        assert!(failed[0].1.starts_with(store.failed_dir()));

        store.delete_transaction_files(&id).unwrap();
        assert!(store.list_failed().unwrap().is_empty());
    }

    #[test]
    fn malformed_ids_are_rejected() {
        let temp = tempdir().unwrap();
        let store = open(temp.path());
        for raw in ["", "../escape", "a/b"] {
            let result = store.transaction_file(&TransactionId::new(raw));
            assert!(matches!(result, Err(ConfError::InvalidTransaction { .. })));
        }
    }
}
