//! Staged transactions.
//!
//! Edits are made on a staged copy of master and only become visible when
//! the transaction is committed:
//! - **Isolation**: staged documents are private until commit
//! - **Optimistic concurrency**: every change is tied to the master version
//!   the caller last read
//! - **Atomic promotion**: commit swaps master as a whole, or not at all
//! - **Recovery**: persisted transactions are restaged on startup

mod manager;
mod registry;
mod scoped;

pub use manager::TransactionManager;
pub use registry::TransactionRegistry;
pub use scoped::ScopedTransaction;
