//! Engine configuration.

use crate::error::{ConfError, ConfResult};
use std::path::{Path, PathBuf};

/// Directory name used for transactions when none is configured.
const DEFAULT_TRANSACTION_DIR: &str = "spoe-transactions";

/// Parameters for opening a configuration client.
#[derive(Debug, Clone)]
pub struct Params {
    /// Path of the master configuration file.
    pub configuration_file: PathBuf,

    /// Directory holding transaction snapshots. Defaults to
    /// `spoe-transactions` next to the configuration file.
    pub transaction_dir: Option<PathBuf>,

    /// Whether staged transactions are saved to files on every change.
    pub persistent_transactions: bool,

    /// Whether startup recovery skips transactions it cannot restore
    /// instead of failing.
    pub skip_failed_transactions: bool,

    /// Number of master backups to keep (0 = none).
    pub backups_number: usize,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            configuration_file: PathBuf::new(),
            transaction_dir: None,
            persistent_transactions: true,
            skip_failed_transactions: true,
            backups_number: 0,
        }
    }
}

impl Params {
    /// Creates parameters for the given configuration file.
    #[must_use]
    pub fn new(configuration_file: impl Into<PathBuf>) -> Self {
        Self {
            configuration_file: configuration_file.into(),
            ..Self::default()
        }
    }

    /// Sets the transaction directory.
    #[must_use]
    pub fn transaction_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.transaction_dir = Some(dir.into());
        self
    }

    /// Sets whether transactions are persisted to files.
    #[must_use]
    pub const fn persistent_transactions(mut self, value: bool) -> Self {
        self.persistent_transactions = value;
        self
    }

    /// Sets whether recovery skips broken transactions.
    #[must_use]
    pub const fn skip_failed_transactions(mut self, value: bool) -> Self {
        self.skip_failed_transactions = value;
        self
    }

    /// Sets how many master backups to keep.
    #[must_use]
    pub const fn backups_number(mut self, value: usize) -> Self {
        self.backups_number = value;
        self
    }

    /// Checks that the parameters can be used.
    pub fn validate(&self) -> ConfResult<()> {
        if self.configuration_file.as_os_str().is_empty() {
            return Err(ConfError::invalid_params("configuration file missing"));
        }
        if self.configuration_file.file_name().is_none() {
            return Err(ConfError::invalid_params(format!(
                "configuration file has no file name: {}",
                self.configuration_file.display()
            )));
        }
        Ok(())
    }

    /// Returns the effective transaction directory.
    #[must_use]
    pub fn resolved_transaction_dir(&self) -> PathBuf {
        match &self.transaction_dir {
            Some(dir) => dir.clone(),
            None => self
                .configuration_file
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(DEFAULT_TRANSACTION_DIR),
        }
    }
}
