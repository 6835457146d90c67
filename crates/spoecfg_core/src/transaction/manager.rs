//! Transaction lifecycle manager.

use crate::config::Params;
use crate::error::{ConfError, ConfResult};
use crate::master::ConfigurationStore;
use crate::store::TransactionStore;
use crate::transaction::registry::TransactionRegistry;
use crate::transaction::scoped::ScopedTransaction;
use crate::types::{TransactionId, TransactionInfo, TransactionRef, TransactionStatus, Version};
use crate::version;
use spoecfg_document::ConfigDocument;
use tracing::{debug, info, warn};

/// Owns master, the staged transactions and the backing store, and moves
/// documents between them.
///
/// ## Explicit and implicit transactions
///
/// Callers either hold a transaction id (`TransactionRef::Explicit`) and
/// mutate its staged copy across several calls, or supply the master version
/// they last read (`TransactionRef::Implicit`). An implicit reference is
/// turned into a fresh transaction that lives for exactly one operation; see
/// [`TransactionManager::scoped`].
///
/// ## Concurrency
///
/// The manager does no locking. Mutating calls must be serialized by the
/// caller; see [`crate::SharedClient`].
#[derive(Debug)]
pub struct TransactionManager<D, S> {
    master: ConfigurationStore<D>,
    registry: TransactionRegistry<D>,
    store: S,
    persistent: bool,
    skip_failed: bool,
}

impl<D: ConfigDocument, S: TransactionStore> TransactionManager<D, S> {
    /// Creates a manager over a loaded master and a backing store.
    ///
    /// Nothing is staged until [`TransactionManager::recover_on_startup`] or
    /// a transaction is started.
    pub fn new(master: ConfigurationStore<D>, store: S, params: &Params) -> Self {
        Self {
            master,
            registry: TransactionRegistry::new(),
            store,
            persistent: params.persistent_transactions,
            skip_failed: params.skip_failed_transactions,
        }
    }

    /// Returns master.
    #[must_use]
    pub fn master(&self) -> &ConfigurationStore<D> {
        &self.master
    }

    /// Returns master for direct edits.
    pub fn master_mut(&mut self) -> &mut ConfigurationStore<D> {
        &mut self.master
    }

    /// Returns the backing store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns true if staged documents are saved to transaction files.
    #[must_use]
    pub const fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// Returns true if `id` is staged.
    #[must_use]
    pub fn has_transaction(&self, id: &TransactionId) -> bool {
        self.registry.contains(id)
    }

    /// Resolves a transaction reference to a staged transaction id.
    ///
    /// An explicit id is returned unchanged if it is staged. An implicit
    /// reference starts a new transaction via
    /// [`TransactionManager::begin_transaction`].
    ///
    /// # Errors
    ///
    /// - `InvalidTransaction` for an empty explicit id
    /// - `TransactionNotFound` for an explicit id that is not staged
    /// - `VersionMismatch` if an implicit version is not master's version
    pub fn resolve(&mut self, txn: &TransactionRef) -> ConfResult<TransactionId> {
        match txn {
            TransactionRef::Explicit(id) => {
                check_id(id)?;
                if !self.registry.contains(id) {
                    return Err(ConfError::transaction_not_found(id));
                }
                Ok(id.clone())
            }
            TransactionRef::Implicit { version } => self.begin_transaction(*version),
        }
    }

    /// Starts a new transaction from master, if master is at `version`.
    ///
    /// Allocates an id, snapshots master into the transaction file (when
    /// persistent) and stages it. Anything created before a failure is
    /// removed again.
    pub fn begin_transaction(&mut self, version: Version) -> ConfResult<TransactionId> {
        version::check(version, self.master.current_version()?)?;

        let id = self.store.allocate_id()?;
        if self.persistent {
            let snapshot = self
                .store
                .transaction_file(&id)
                .and_then(|file| self.master.save_to(&file));
            if let Err(e) = snapshot {
                self.cleanup_files(&id);
                return Err(e);
            }
        }
        if let Err(e) = self.start_transaction(&id) {
            self.cleanup_files(&id);
            return Err(e);
        }

        debug!(transaction = %id, version = version.as_i64(), "transaction started");
        Ok(id)
    }

    /// Returns the document of a transaction, or master for `None` or an
    /// empty id.
    pub fn document(&self, id: Option<&TransactionId>) -> ConfResult<&D> {
        match id {
            Some(id) if !id.is_empty() => self.registry.get(id),
            _ => Ok(self.master.document()),
        }
    }

    /// Returns the document of a transaction for editing, or master for
    /// `None` or an empty id.
    pub fn document_mut(&mut self, id: Option<&TransactionId>) -> ConfResult<&mut D> {
        match id {
            Some(id) if !id.is_empty() => self.registry.get_mut(id),
            _ => Ok(self.master.document_mut()),
        }
    }

    /// Stages a transaction under `id`.
    ///
    /// The document is loaded from the transaction file when transactions
    /// are persistent, and from the master file otherwise.
    ///
    /// # Errors
    ///
    /// - `InvalidTransaction` if `id` is empty
    /// - `TransactionAlreadyExists` if `id` is already staged
    /// - `ConfigRead` if the source file cannot be loaded
    pub fn start_transaction(&mut self, id: &TransactionId) -> ConfResult<()> {
        check_id(id)?;
        if self.registry.contains(id) {
            return Err(ConfError::transaction_already_exists(id));
        }

        let file = if self.persistent {
            self.store.transaction_file(id)?
        } else {
            self.master.path().to_path_buf()
        };
        let doc = D::load(&file).map_err(|_| ConfError::config_read(file.display()))?;
        self.registry.insert(id.clone(), doc)
    }

    /// Unstages a transaction.
    ///
    /// Backing files are left alone; see
    /// [`TransactionManager::discard_transaction`].
    pub fn delete_transaction(&mut self, id: &TransactionId) -> ConfResult<()> {
        check_id(id)?;
        self.registry.remove(id)?;
        Ok(())
    }

    /// Unstages a transaction and removes its backing files.
    ///
    /// The files go first. If they cannot be removed the transaction stays
    /// staged, so memory and disk never disagree about it.
    pub fn discard_transaction(&mut self, id: &TransactionId) -> ConfResult<()> {
        check_id(id)?;
        if !self.registry.contains(id) {
            return Err(ConfError::transaction_not_found(id));
        }
        self.store.delete_transaction_files(id)?;
        self.registry.remove(id)?;
        debug!(transaction = %id, "transaction discarded");
        Ok(())
    }

    /// Makes a staged transaction the new master.
    ///
    /// The staged document must be at master's version. It is written to the
    /// master file with its version marker incremented, before it replaces
    /// master in memory, so a failed write leaves both master and the
    /// transaction as they were. Every other transaction based on the old
    /// version can no longer be committed. Returns the version of the new
    /// master.
    ///
    /// # Errors
    ///
    /// - `InvalidTransaction` / `TransactionNotFound` for a bad id
    /// - `VersionMismatch` if master moved on since the transaction started
    /// - `VersionWrite` if the version cannot be incremented
    /// - `ConfigWrite` if the master file cannot be written
    pub fn commit_transaction(&mut self, id: &TransactionId) -> ConfResult<Version> {
        check_id(id)?;
        let staged_version = version::read(self.registry.get(id)?)?;
        version::check(staged_version, self.master.current_version()?)?;
        let next = version::following(staged_version)?;

        let mut staged = self.registry.remove(id)?;
        staged.set_version(next.as_i64());
        if let Err((mut staged, e)) = self.master.replace(staged) {
            staged.set_version(staged_version.as_i64());
            self.registry.restore(id.clone(), staged);
            return Err(e);
        }
        self.cleanup_files(id);

        info!(transaction = %id, version = next.as_i64(), "transaction committed");
        Ok(next)
    }

    /// Saves a staged transaction to its transaction file.
    ///
    /// Does nothing when transactions are not persistent.
    pub fn persist(&self, id: &TransactionId) -> ConfResult<()> {
        if !self.persistent {
            return Ok(());
        }
        let doc = self.registry.get(id)?;
        let file = self.store.transaction_file(id)?;
        doc.save(&file).map_err(|e| ConfError::config_write(e))
    }

    /// Stages every in-progress transaction found in the backing store.
    ///
    /// A transaction is restored when its file loads and its version marker
    /// reads. With `skip_failed_transactions`, one that does not is skipped
    /// and moved to the failed area; otherwise the first failure aborts the
    /// recovery. Returns the number of transactions restored.
    pub fn recover_on_startup(&mut self) -> ConfResult<usize> {
        if !self.persistent {
            return Ok(0);
        }

        let mut restored = 0;
        for id in self.store.list_in_progress()? {
            if self.registry.contains(&id) {
                continue;
            }
            match self.restore(&id) {
                Ok(()) => restored += 1,
                Err(e) if self.skip_failed => {
                    warn!(transaction = %id, error = %e, "skipping transaction that cannot be restored");
                    if let Err(e) = self.store.mark_failed(&id) {
                        warn!(transaction = %id, error = %e, "cannot move transaction to failed");
                    }
                }
                Err(e) => return Err(e),
            }
        }

        if restored > 0 {
            info!(count = restored, "transactions restored");
        }
        Ok(restored)
    }

    fn restore(&mut self, id: &TransactionId) -> ConfResult<()> {
        self.start_transaction(id)?;
        let verified = self.registry.get(id).and_then(|doc| version::read(doc));
        if let Err(e) = verified {
            self.registry.remove(id)?;
            return Err(e);
        }
        Ok(())
    }

    /// Lists staged transactions, sorted by id.
    #[must_use]
    pub fn list_transactions(&self) -> Vec<TransactionInfo> {
        self.registry
            .ids()
            .into_iter()
            .filter_map(|id| {
                let version = self.registry.get(&id).and_then(|doc| version::read(doc)).ok()?;
                Some(TransactionInfo {
                    id,
                    status: TransactionStatus::InProgress,
                    version: Some(version),
                })
            })
            .collect()
    }

    /// Lists transactions set aside by recovery.
    pub fn list_failed_transactions(&self) -> ConfResult<Vec<TransactionInfo>> {
        Ok(self
            .store
            .list_failed()?
            .into_iter()
            .map(|(id, path)| TransactionInfo {
                id,
                status: TransactionStatus::Failed,
                version: version::read_file::<D>(&path).ok(),
            })
            .collect())
    }

    /// Returns the version of a transaction, or of master for `None` or an
    /// empty id.
    ///
    /// # Errors
    ///
    /// Returns `VersionRead` if the transaction is not staged or its marker
    /// cannot be read.
    pub fn current_version(&self, id: Option<&TransactionId>) -> ConfResult<Version> {
        let doc = self
            .document(id)
            .map_err(|e| ConfError::version_read(e))?;
        version::read(doc)
    }

    /// Increments master's version and persists master.
    pub fn increment_version(&mut self) -> ConfResult<Version> {
        self.master.increment_version()
    }

    /// Resolves `txn` and returns a guard over the resolved transaction.
    ///
    /// For an implicit reference the guard commits on
    /// [`ScopedTransaction::finish`] and discards the transaction if it is
    /// dropped unfinished, so the change is all-or-nothing.
    pub fn scoped(&mut self, txn: &TransactionRef) -> ConfResult<ScopedTransaction<'_, D, S>> {
        let id = self.resolve(txn)?;
        Ok(ScopedTransaction::new(self, id, txn.is_implicit()))
    }

    fn cleanup_files(&mut self, id: &TransactionId) {
        if let Err(e) = self.store.delete_transaction_files(id) {
            warn!(transaction = %id, error = %e, "cannot delete transaction files");
        }
    }
}

fn check_id(id: &TransactionId) -> ConfResult<()> {
    if id.is_empty() {
        return Err(ConfError::invalid_transaction("empty transaction id"));
    }
    Ok(())
}
