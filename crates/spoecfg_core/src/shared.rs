//! Thread-safe client handle.

use crate::client::SpoeClient;
use crate::error::ConfResult;
use parking_lot::RwLock;
use spoecfg_document::{ConfigDocument, SpoeDocument};
use std::sync::Arc;

/// A cloneable, thread-safe handle to a [`SpoeClient`].
///
/// Reads share the lock; every mutation takes it exclusively, so the
/// registry and master are never observed mid-change.
pub struct SharedClient<D: ConfigDocument = SpoeDocument> {
    inner: Arc<RwLock<SpoeClient<D>>>,
}

impl<D: ConfigDocument> SharedClient<D> {
    /// Wraps a client.
    pub fn new(client: SpoeClient<D>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(client)),
        }
    }

    /// Runs a read-only operation under the shared lock.
    pub fn query<T>(&self, f: impl FnOnce(&SpoeClient<D>) -> ConfResult<T>) -> ConfResult<T> {
        f(&self.inner.read())
    }

    /// Runs a mutating operation under the exclusive lock.
    pub fn mutate<T>(&self, f: impl FnOnce(&mut SpoeClient<D>) -> ConfResult<T>) -> ConfResult<T> {
        f(&mut self.inner.write())
    }
}

impl<D: ConfigDocument> Clone for SharedClient<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: ConfigDocument> std::fmt::Debug for SharedClient<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedClient")
            .field("handles", &Arc::strong_count(&self.inner))
            .finish()
    }
}
