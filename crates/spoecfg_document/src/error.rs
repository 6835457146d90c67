//! Error types for document operations.

use std::io;
use thiserror::Error;

/// Result type for document operations.
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Low-level failures reported by a configuration document.
///
/// These are the raw signals of the parser layer. The transaction engine
/// translates the section-level ones into its own error taxonomy and never
/// lets them reach callers unchanged.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// An I/O error occurred while loading or saving.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The document text could not be parsed.
    #[error("parse error at line {line}: {message}")]
    Parse {
        /// 1-based line number of the offending line.
        line: usize,
        /// Description of the problem.
        message: String,
    },

    /// The requested section does not exist.
    #[error("section missing: {kind} {name}")]
    SectionMissing {
        /// Section keyword.
        kind: String,
        /// Section name.
        name: String,
    },

    /// A section with the same kind and name already exists.
    #[error("section already exists: {kind} {name}")]
    SectionAlreadyExists {
        /// Section keyword.
        kind: String,
        /// Section name.
        name: String,
    },

    /// The requested data could not be fetched from the document.
    #[error("cannot fetch {what}")]
    Fetch {
        /// What was being fetched.
        what: String,
    },

    /// An index-based access went past the end of a list.
    #[error("index {index} out of range (len {len})")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Current list length.
        len: usize,
    },

    /// The requested scope does not exist.
    #[error("scope missing: {0}")]
    ScopeMissing(String),

    /// A section or scope name the format cannot represent.
    #[error("invalid name {name:?}: {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A directive line the format cannot represent.
    #[error("invalid directive {directive:?}: {reason}")]
    InvalidDirective {
        /// The rejected line.
        directive: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A scope with the same name already exists.
    #[error("scope already exists: {0}")]
    ScopeAlreadyExists(String),
}

impl DocumentError {
    /// Creates a parse error.
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    /// Creates a fetch error.
    pub fn fetch(what: impl Into<String>) -> Self {
        Self::Fetch { what: what.into() }
    }
}
