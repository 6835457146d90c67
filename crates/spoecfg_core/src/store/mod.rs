//! Backing store for staged transactions.
//!
//! The store allocates transaction ids and owns the files that hold staged
//! snapshots. The engine only orchestrates these operations; it never builds
//! transaction paths itself.

mod dir;
mod ephemeral;

pub use dir::DirTransactionStore;
pub use ephemeral::EphemeralTransactionStore;

use crate::error::ConfResult;
use crate::types::TransactionId;
use std::path::PathBuf;

/// Allocation and persistence of transaction snapshots.
///
/// # Implementors
///
/// - [`DirTransactionStore`] - One snapshot file per transaction in a directory
/// - [`EphemeralTransactionStore`] - Ids only, for non-persistent transactions
pub trait TransactionStore: Send + Sync {
    /// Allocates a fresh, unused transaction id.
    fn allocate_id(&mut self) -> ConfResult<TransactionId>;

    /// Returns the path of the snapshot file for `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store keeps no files.
    fn transaction_file(&self, id: &TransactionId) -> ConfResult<PathBuf>;

    /// Lists transactions whose snapshots are in progress.
    fn list_in_progress(&self) -> ConfResult<Vec<TransactionId>>;

    /// Removes every file belonging to `id`. Removing nothing is not an error.
    fn delete_transaction_files(&mut self, id: &TransactionId) -> ConfResult<()>;

    /// Moves the snapshot of `id` out of the in-progress set.
    fn mark_failed(&mut self, id: &TransactionId) -> ConfResult<()>;

    /// Lists failed transactions with the paths of their snapshots.
    fn list_failed(&self) -> ConfResult<Vec<(TransactionId, PathBuf)>>;
}

impl<T: TransactionStore + ?Sized> TransactionStore for Box<T> {
    fn allocate_id(&mut self) -> ConfResult<TransactionId> {
        (**self).allocate_id()
    }

    fn transaction_file(&self, id: &TransactionId) -> ConfResult<PathBuf> {
        (**self).transaction_file(id)
    }

    fn list_in_progress(&self) -> ConfResult<Vec<TransactionId>> {
        (**self).list_in_progress()
    }

    fn delete_transaction_files(&mut self, id: &TransactionId) -> ConfResult<()> {
        (**self).delete_transaction_files(id)
    }

    fn mark_failed(&mut self, id: &TransactionId) -> ConfResult<()> {
        (**self).mark_failed(id)
    }

    fn list_failed(&self) -> ConfResult<Vec<(TransactionId, PathBuf)>> {
        (**self).list_failed()
    }
}
