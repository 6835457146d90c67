//! # spoecfg core
//!
//! Staged configuration transactions for HAProxy SPOE configuration files.
//!
//! This crate provides:
//! - The master configuration store with optimistic version control
//! - A registry of staged transactions, persisted to a transaction directory
//! - Explicit and implicit (single-operation) transactions
//! - Recovery of persisted transactions on startup
//! - Translation of document failures into a stable error taxonomy
//!
//! ## Example
//!
//! ```rust,ignore
//! use spoecfg_core::{Params, SpoeClient, TransactionRef};
//! use spoecfg_document::SectionKind;
//!
//! let mut client = SpoeClient::open(Params::new("/etc/haproxy/spoe.cfg"))?;
//! let version = client.current_version(None)?;
//! client.delete_section("ip-rep", SectionKind::Agent, "a1", &TransactionRef::implicit(version.as_i64()))?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backup;
mod client;
mod config;
mod error;
mod master;
mod shared;
mod store;
mod transaction;
mod translate;
mod types;
mod version;

pub use backup::backup_path;
pub use client::{BoxedStore, SpoeClient};
pub use config::Params;
pub use error::{ConfError, ConfResult, Parent};
pub use master::ConfigurationStore;
pub use shared::SharedClient;
pub use store::{DirTransactionStore, EphemeralTransactionStore, TransactionStore};
pub use transaction::{ScopedTransaction, TransactionManager, TransactionRegistry};
pub use translate::{translate, ObjectRef};
pub use types::{TransactionId, TransactionInfo, TransactionRef, TransactionStatus, Version};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
