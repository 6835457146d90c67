//! Registry of staged transaction documents.

use crate::error::{ConfError, ConfResult};
use crate::types::TransactionId;
use std::collections::HashMap;

/// Maps transaction ids to their staged documents.
///
/// Holds at most one document per id.
#[derive(Debug)]
pub struct TransactionRegistry<D> {
    staged: HashMap<TransactionId, D>,
}

impl<D> Default for TransactionRegistry<D> {
    fn default() -> Self {
        Self {
            staged: HashMap::new(),
        }
    }
}

impl<D> TransactionRegistry<D> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `id` is registered.
    #[must_use]
    pub fn contains(&self, id: &TransactionId) -> bool {
        self.staged.contains_key(id)
    }

    /// Returns the staged document of `id`.
    pub fn get(&self, id: &TransactionId) -> ConfResult<&D> {
        self.staged
            .get(id)
            .ok_or_else(|| ConfError::transaction_not_found(id))
    }

    /// Returns the staged document of `id` for editing.
    pub fn get_mut(&mut self, id: &TransactionId) -> ConfResult<&mut D> {
        self.staged
            .get_mut(id)
            .ok_or_else(|| ConfError::transaction_not_found(id))
    }

    /// Registers a staged document.
    ///
    /// # Errors
    ///
    /// Returns `TransactionAlreadyExists` if `id` is already registered; the
    /// registry is left unchanged.
    pub fn insert(&mut self, id: TransactionId, doc: D) -> ConfResult<()> {
        if self.staged.contains_key(&id) {
            return Err(ConfError::transaction_already_exists(&id));
        }
        self.staged.insert(id, doc);
        Ok(())
    }

    /// Puts back a document that was just removed.
    pub(crate) fn restore(&mut self, id: TransactionId, doc: D) {
        self.staged.insert(id, doc);
    }

    /// Unregisters `id` and returns its staged document.
    pub fn remove(&mut self, id: &TransactionId) -> ConfResult<D> {
        self.staged
            .remove(id)
            .ok_or_else(|| ConfError::transaction_not_found(id))
    }

    /// Returns the registered ids, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<TransactionId> {
        let mut ids: Vec<_> = self.staged.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Returns the number of staged transactions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.staged.len()
    }

    /// Returns true if nothing is staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }
}
