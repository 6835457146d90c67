//! Scoped access to a resolved transaction.

use crate::error::ConfResult;
use crate::store::TransactionStore;
use crate::transaction::manager::TransactionManager;
use crate::types::TransactionId;
use spoecfg_document::ConfigDocument;
use tracing::debug;

/// A resolved transaction held for the duration of one operation.
///
/// For an implicit transaction the guard guarantees the operation is
/// all-or-nothing: [`ScopedTransaction::finish`] persists and commits it,
/// and dropping the guard without finishing (including on any error path)
/// discards the staged transaction. Master is never touched by the discard.
///
/// For an explicit transaction `finish` only persists, and dropping the
/// guard leaves the transaction staged for the caller to retry or abandon.
///
/// ```rust,ignore
/// let mut scoped = manager.scoped(&TransactionRef::implicit(3))?;
/// scoped.document_mut()?.delete_section("scope", SectionKind::Agent, "a1")?;
/// scoped.finish()?;
/// ```
pub struct ScopedTransaction<'a, D: ConfigDocument, S: TransactionStore> {
    manager: &'a mut TransactionManager<D, S>,
    id: TransactionId,
    implicit: bool,
    finished: bool,
}

impl<'a, D: ConfigDocument, S: TransactionStore> ScopedTransaction<'a, D, S> {
    pub(crate) fn new(manager: &'a mut TransactionManager<D, S>, id: TransactionId, implicit: bool) -> Self {
        Self {
            manager,
            id,
            implicit,
            finished: false,
        }
    }

    /// Returns the resolved transaction id.
    #[must_use]
    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    /// Returns true if the transaction was created for this operation.
    #[must_use]
    pub const fn is_implicit(&self) -> bool {
        self.implicit
    }

    /// Returns the staged document.
    pub fn document(&self) -> ConfResult<&D> {
        self.manager.document(Some(&self.id))
    }

    /// Returns the staged document for editing.
    pub fn document_mut(&mut self) -> ConfResult<&mut D> {
        self.manager.document_mut(Some(&self.id))
    }

    /// Persists the transaction and, if implicit, commits it.
    pub fn finish(mut self) -> ConfResult<()> {
        self.manager.persist(&self.id)?;
        if self.implicit {
            self.manager.commit_transaction(&self.id)?;
        }
        self.finished = true;
        Ok(())
    }

    /// Runs `f` on the staged document, then finishes the transaction.
    pub fn run<T>(mut self, f: impl FnOnce(&mut D) -> ConfResult<T>) -> ConfResult<T> {
        let value = f(self.document_mut()?)?;
        self.finish()?;
        Ok(value)
    }
}

impl<D: ConfigDocument, S: TransactionStore> Drop for ScopedTransaction<'_, D, S> {
    fn drop(&mut self) {
        if !self.implicit || self.finished {
            return;
        }
        // The original error is what the caller sees; a failed discard is
        // only logged.
        if let Err(e) = self.manager.discard_transaction(&self.id) {
            debug!(transaction = %self.id, error = %e, "cannot discard implicit transaction");
        }
    }
}
