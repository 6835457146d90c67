//! Core type definitions for spoecfg.

use serde::Serialize;
use std::fmt;

/// Identifier of a staged transaction.
///
/// Ids are allocated by the transaction store and are opaque to the engine.
/// An empty id is never valid for lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    /// Creates a transaction id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for the empty id.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TransactionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TransactionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Logical revision of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Version(pub i64);

impl Version {
    /// Creates a version.
    #[must_use]
    pub const fn new(version: i64) -> Self {
        Self(version)
    }

    /// Returns the raw version value.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }

    /// Returns the next version, or `None` once the counter is exhausted.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a mutating call addresses its transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionRef {
    /// Mutate a transaction the caller already holds.
    Explicit(TransactionId),
    /// Apply a single change to master, only if master is still at
    /// `version`. The change is staged, persisted and committed within the
    /// call, or discarded entirely.
    Implicit {
        /// Version the caller last read.
        version: Version,
    },
}

impl TransactionRef {
    /// An explicit reference.
    pub fn explicit(id: impl Into<TransactionId>) -> Self {
        Self::Explicit(id.into())
    }

    /// An implicit reference guarded by `version`.
    #[must_use]
    pub const fn implicit(version: i64) -> Self {
        Self::Implicit {
            version: Version(version),
        }
    }

    /// Returns true for implicit references.
    #[must_use]
    pub const fn is_implicit(&self) -> bool {
        matches!(self, Self::Implicit { .. })
    }
}

/// Lifecycle state of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Staged and editable.
    InProgress,
    /// Could not be restored and was set aside.
    Failed,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InProgress => f.write_str("in_progress"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

/// Summary of one transaction, as reported by listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionInfo {
    /// Transaction id.
    pub id: TransactionId,
    /// Current status.
    pub status: TransactionStatus,
    /// Version of the staged document, if it could be read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_next() {
        assert_eq!(Version::new(5).next(), Some(Version::new(6)));
        assert_eq!(Version::new(i64::MAX).next(), None);
    }

    #[test]
    fn transaction_ref_kinds() {
        assert!(TransactionRef::implicit(3).is_implicit());
        assert!(!TransactionRef::explicit("abc").is_implicit());
    }

    #[test]
    fn status_display() {
        assert_eq!(TransactionStatus::InProgress.to_string(), "in_progress");
        assert_eq!(TransactionStatus::Failed.to_string(), "failed");
    }
}
