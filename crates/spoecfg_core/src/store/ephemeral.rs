//! Id-only transaction store.

use super::TransactionStore;
use crate::error::{ConfError, ConfResult};
use crate::types::TransactionId;
use std::path::PathBuf;
use uuid::Uuid;

/// A transaction store that keeps no files.
///
/// Used when persistent transactions are disabled: staged documents live
/// only in memory and nothing survives a restart.
#[derive(Debug, Default)]
pub struct EphemeralTransactionStore;

impl EphemeralTransactionStore {
    /// Creates a new store.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl TransactionStore for EphemeralTransactionStore {
    fn allocate_id(&mut self) -> ConfResult<TransactionId> {
        Ok(TransactionId::new(Uuid::new_v4().to_string()))
    }

    fn transaction_file(&self, id: &TransactionId) -> ConfResult<PathBuf> {
        Err(ConfError::invalid_params(format!(
            "transaction {id} has no file: persistent transactions are disabled"
        )))
    }

    fn list_in_progress(&self) -> ConfResult<Vec<TransactionId>> {
        Ok(Vec::new())
    }

    fn delete_transaction_files(&mut self, _id: &TransactionId) -> ConfResult<()> {
        Ok(())
    }

    fn mark_failed(&mut self, _id: &TransactionId) -> ConfResult<()> {
        Ok(())
    }

    fn list_failed(&self) -> ConfResult<Vec<(TransactionId, PathBuf)>> {
        Ok(Vec::new())
    }
}
