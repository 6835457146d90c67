//! Error types for the spoecfg transaction engine.

use spoecfg_document::DocumentError;
use std::fmt;
use std::io;
use thiserror::Error;

/// Result type for engine operations.
pub type ConfResult<T> = Result<T, ConfError>;

/// The parent object of a nested configuration object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parent {
    /// Parent type, e.g. `spoe-agent`.
    pub kind: String,
    /// Parent name.
    pub name: String,
}

impl Parent {
    /// Creates a parent reference.
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Parent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.name)
    }
}

fn in_parent(parent: &Option<Parent>) -> String {
    parent
        .as_ref()
        .map(|p| format!(" in {p}"))
        .unwrap_or_default()
}

/// Errors that can occur in engine operations.
///
/// Parser-level failures never cross the engine boundary untranslated,
/// except for signals the translator has no mapping for (see
/// [`ConfError::Document`]).
#[derive(Debug, Error)]
pub enum ConfError {
    /// The configuration file could not be read or parsed.
    #[error("cannot read {path}")]
    ConfigRead {
        /// Path of the file.
        path: String,
    },

    /// The configuration could not be written.
    #[error("cannot write configuration: {message}")]
    ConfigWrite {
        /// Description of the failure.
        message: String,
    },

    /// The transaction id is empty or malformed.
    #[error("not a valid transaction: {message}")]
    InvalidTransaction {
        /// Description of the problem.
        message: String,
    },

    /// No transaction with this id is registered.
    #[error("transaction {id} does not exist")]
    TransactionNotFound {
        /// Transaction id.
        id: String,
    },

    /// A transaction with this id is already registered.
    #[error("transaction {id} already exists")]
    TransactionAlreadyExists {
        /// Transaction id.
        id: String,
    },

    /// The caller's version does not match the configuration version.
    #[error("version mismatch: expected {expected}, configuration is at {actual}")]
    VersionMismatch {
        /// Version the caller supplied.
        expected: i64,
        /// Version the configuration is at.
        actual: i64,
    },

    /// The version marker could not be read.
    #[error("cannot read version: {message}")]
    VersionRead {
        /// Description of the failure.
        message: String,
    },

    /// The incremented version could not be persisted.
    #[error("cannot set version: {message}")]
    VersionWrite {
        /// Description of the failure.
        message: String,
    },

    /// The object does not exist.
    #[error("object {id} does not exist{}", in_parent(.parent))]
    ObjectNotFound {
        /// Object id.
        id: String,
        /// Parent the object was looked up in, if any.
        parent: Option<Parent>,
    },

    /// The parent of the object does not exist.
    #[error("{parent} does not exist")]
    ParentNotFound {
        /// The missing parent.
        parent: Parent,
    },

    /// The object already exists.
    #[error("object {id} already exists")]
    ObjectAlreadyExists {
        /// Object id.
        id: String,
    },

    /// An index-addressed object is out of range.
    #[error("object with id {id}{} out of range", in_parent(.parent))]
    ObjectIndexOutOfRange {
        /// Object id (the index).
        id: String,
        /// Parent holding the indexed list, if any.
        parent: Option<Parent>,
    },

    /// Engine parameters are invalid.
    #[error("invalid parameters: {message}")]
    InvalidParams {
        /// Description of the problem.
        message: String,
    },

    /// Another process holds the transaction directory.
    #[error("transaction store locked: another process has exclusive access")]
    StoreLocked,

    /// I/O error in the transaction store.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A document failure with no domain mapping, passed through unchanged.
    #[error(transparent)]
    Document(DocumentError),
}

impl ConfError {
    /// Creates a configuration read error.
    pub fn config_read(path: impl fmt::Display) -> Self {
        Self::ConfigRead {
            path: path.to_string(),
        }
    }

    /// Creates a configuration write error.
    pub fn config_write(message: impl fmt::Display) -> Self {
        Self::ConfigWrite {
            message: message.to_string(),
        }
    }

    /// Creates an invalid transaction error.
    pub fn invalid_transaction(message: impl Into<String>) -> Self {
        Self::InvalidTransaction {
            message: message.into(),
        }
    }

    /// Creates a transaction not found error.
    pub fn transaction_not_found(id: impl fmt::Display) -> Self {
        Self::TransactionNotFound { id: id.to_string() }
    }

    /// Creates a transaction already exists error.
    pub fn transaction_already_exists(id: impl fmt::Display) -> Self {
        Self::TransactionAlreadyExists { id: id.to_string() }
    }

    /// Creates a version mismatch error.
    pub fn version_mismatch(expected: i64, actual: i64) -> Self {
        Self::VersionMismatch { expected, actual }
    }

    /// Creates a version read error.
    pub fn version_read(message: impl fmt::Display) -> Self {
        Self::VersionRead {
            message: message.to_string(),
        }
    }

    /// Creates a version write error.
    pub fn version_write(message: impl fmt::Display) -> Self {
        Self::VersionWrite {
            message: message.to_string(),
        }
    }

    /// Creates an object not found error without a parent.
    pub fn object_not_found(id: impl Into<String>) -> Self {
        Self::ObjectNotFound {
            id: id.into(),
            parent: None,
        }
    }

    /// Creates an invalid parameters error.
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }
}
