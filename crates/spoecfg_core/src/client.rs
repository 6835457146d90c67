//! Configuration client facade.

use crate::config::Params;
use crate::error::{ConfError, ConfResult};
use crate::master::ConfigurationStore;
use crate::store::{DirTransactionStore, EphemeralTransactionStore, TransactionStore};
use crate::transaction::TransactionManager;
use crate::translate::{translate, ObjectRef};
use crate::types::{TransactionId, TransactionInfo, TransactionRef, Version};
use spoecfg_document::{ConfigDocument, Section, SectionKind, SpoeDocument};
use tracing::debug;

/// The boxed transaction store used by [`SpoeClient`].
pub type BoxedStore = Box<dyn TransactionStore>;

/// The main configuration handle.
///
/// `SpoeClient` is the entry point for reading and editing a SPOE
/// configuration file through staged transactions. It provides:
/// - Section, scope and directive reads against master or a transaction
/// - Mutations addressed by [`TransactionRef`]
/// - Transaction lifecycle and version control
/// - Recovery of persisted transactions on open
///
/// # Mutations
///
/// Every mutation follows the same sequence: resolve the transaction, check
/// the target exists, mutate the staged document, persist it, and commit if
/// the transaction was implicit. Any failure on an implicit transaction
/// discards it; failures on an explicit transaction leave it staged.
///
/// ```rust,ignore
/// use spoecfg_core::{Params, SpoeClient, TransactionRef};
/// use spoecfg_document::SectionKind;
///
/// let mut client = SpoeClient::open(Params::new("/etc/haproxy/spoe.cfg"))?;
/// let version = client.current_version(None)?;
///
/// // Single-shot edit, committed on success.
/// client.delete_section("ip-rep", SectionKind::Agent, "agent1", &TransactionRef::implicit(version.as_i64()))?;
///
/// // Multi-step edit. The edit above moved the version on.
/// let id = client.begin_transaction(client.current_version(None)?)?;
/// client.delete_section("ip-rep", SectionKind::Message, "m1", &TransactionRef::explicit(id.clone()))?;
/// client.commit_transaction(&id)?;
/// ```
pub struct SpoeClient<D: ConfigDocument = SpoeDocument> {
    manager: TransactionManager<D, BoxedStore>,
}

impl<D: ConfigDocument> SpoeClient<D> {
    /// Opens a client with the default transaction store for `params`.
    ///
    /// Loads master, opens the transaction directory (or an ephemeral store
    /// when transactions are not persistent) and restages persisted
    /// transactions.
    ///
    /// # Errors
    ///
    /// - `InvalidParams` for unusable parameters
    /// - `ConfigRead` if master cannot be loaded
    /// - `StoreLocked` if another process holds the transaction directory
    pub fn open(params: Params) -> ConfResult<Self> {
        params.validate()?;
        let store: BoxedStore = if params.persistent_transactions {
            Box::new(DirTransactionStore::open(
                &params.resolved_transaction_dir(),
                &params.configuration_file,
            )?)
        } else {
            Box::new(EphemeralTransactionStore::new())
        };
        Self::open_with_store(params, store)
    }

    /// Opens a client over a caller-provided transaction store.
    pub fn open_with_store(params: Params, store: BoxedStore) -> ConfResult<Self> {
        params.validate()?;
        let master = ConfigurationStore::load(params.configuration_file.clone())?
            .with_backups(params.backups_number);
        let mut manager = TransactionManager::new(master, store, &params);
        manager.recover_on_startup()?;

        debug!(path = %params.configuration_file.display(), "configuration client opened");
        Ok(Self { manager })
    }

    /// Returns the transaction manager.
    #[must_use]
    pub fn manager(&self) -> &TransactionManager<D, BoxedStore> {
        &self.manager
    }

    /// Returns the transaction manager for lifecycle operations.
    pub fn manager_mut(&mut self) -> &mut TransactionManager<D, BoxedStore> {
        &mut self.manager
    }

    // === Version and transactions ===

    /// Returns the version of a transaction, or of master for `None`.
    pub fn current_version(&self, transaction: Option<&TransactionId>) -> ConfResult<Version> {
        self.manager.current_version(transaction)
    }

    /// Increments master's version and persists master.
    pub fn increment_version(&mut self) -> ConfResult<Version> {
        self.manager.increment_version()
    }

    /// Returns true if `id` is staged.
    #[must_use]
    pub fn has_transaction(&self, id: &TransactionId) -> bool {
        self.manager.has_transaction(id)
    }

    /// Lists staged transactions.
    #[must_use]
    pub fn list_transactions(&self) -> Vec<TransactionInfo> {
        self.manager.list_transactions()
    }

    /// Lists transactions set aside by recovery.
    pub fn list_failed_transactions(&self) -> ConfResult<Vec<TransactionInfo>> {
        self.manager.list_failed_transactions()
    }

    /// Starts a caller-managed transaction if master is at `version`.
    pub fn begin_transaction(&mut self, version: Version) -> ConfResult<TransactionId> {
        self.manager.begin_transaction(version)
    }

    /// Commits a transaction and returns the new configuration version.
    pub fn commit_transaction(&mut self, id: &TransactionId) -> ConfResult<Version> {
        self.manager.commit_transaction(id)
    }

    /// Abandons a transaction and removes its files.
    pub fn abort_transaction(&mut self, id: &TransactionId) -> ConfResult<()> {
        self.manager.discard_transaction(id)
    }

    // === Reads ===

    /// Lists scopes.
    pub fn list_scopes(&self, transaction: Option<&TransactionId>) -> ConfResult<Vec<String>> {
        Ok(self.manager.document(transaction)?.scopes())
    }

    /// Lists the sections of `kind` in `scope`.
    pub fn list_sections(
        &self,
        scope: &str,
        kind: SectionKind,
        transaction: Option<&TransactionId>,
    ) -> ConfResult<Vec<String>> {
        self.manager
            .document(transaction)?
            .sections(scope, kind)
            .map_err(|e| translate(e, &ObjectRef::new(scope)))
    }

    /// Returns a copy of a section.
    pub fn get_section(
        &self,
        scope: &str,
        kind: SectionKind,
        name: &str,
        transaction: Option<&TransactionId>,
    ) -> ConfResult<Section> {
        self.manager
            .document(transaction)?
            .section(scope, kind, name)
            .cloned()
            .map_err(|e| translate(e, &ObjectRef::new(name)))
    }

    /// Returns one directive of a section.
    pub fn get_directive(
        &self,
        scope: &str,
        kind: SectionKind,
        section: &str,
        index: usize,
        transaction: Option<&TransactionId>,
    ) -> ConfResult<String> {
        let object = ObjectRef::nested(index.to_string(), kind.keyword(), section);
        self.manager
            .document(transaction)?
            .section(scope, kind, section)
            .and_then(|s| s.directive(index).map(str::to_string))
            .map_err(|e| translate(e, &object))
    }

    // === Mutations ===

    /// Creates an empty scope.
    pub fn create_scope(&mut self, scope: &str, txn: &TransactionRef) -> ConfResult<()> {
        let object = ObjectRef::new(scope);
        self.manager
            .scoped(txn)?
            .run(|doc| doc.create_scope(scope).map_err(|e| translate(e, &object)))
    }

    /// Deletes a scope and all its sections.
    pub fn delete_scope(&mut self, scope: &str, txn: &TransactionRef) -> ConfResult<()> {
        self.manager.scoped(txn)?.run(|doc| {
            if !doc.scopes().iter().any(|s| s == scope) {
                return Err(ConfError::object_not_found(scope));
            }
            doc.delete_scope(scope)
                .map_err(|e| translate(e, &ObjectRef::new(scope)))
        })
    }

    /// Adds a new section.
    pub fn create_section(
        &mut self,
        scope: &str,
        kind: SectionKind,
        section: Section,
        txn: &TransactionRef,
    ) -> ConfResult<()> {
        let object = ObjectRef::new(section.name.clone());
        self.manager.scoped(txn)?.run(|doc| {
            if section_exists(doc, scope, kind, &section.name) {
                return Err(ConfError::ObjectAlreadyExists {
                    id: section.name.clone(),
                });
            }
            doc.create_section(scope, kind, section)
                .map_err(|e| translate(e, &object))
        })
    }

    /// Replaces an existing section.
    pub fn replace_section(
        &mut self,
        scope: &str,
        kind: SectionKind,
        section: Section,
        txn: &TransactionRef,
    ) -> ConfResult<()> {
        let object = ObjectRef::new(section.name.clone());
        self.manager.scoped(txn)?.run(|doc| {
            if !section_exists(doc, scope, kind, &section.name) {
                return Err(ConfError::object_not_found(format!("{kind} {}", section.name)));
            }
            doc.set_section(scope, kind, section)
                .map_err(|e| translate(e, &object))
        })
    }

    /// Deletes a section.
    pub fn delete_section(
        &mut self,
        scope: &str,
        kind: SectionKind,
        name: &str,
        txn: &TransactionRef,
    ) -> ConfResult<()> {
        self.manager.scoped(txn)?.run(|doc| {
            if !section_exists(doc, scope, kind, name) {
                return Err(ConfError::object_not_found(format!("{kind} {name}")));
            }
            doc.delete_section(scope, kind, name)
                .map_err(|e| translate(e, &ObjectRef::new(name)))
        })
    }

    /// Inserts a directive into a section before `index`.
    pub fn insert_directive(
        &mut self,
        scope: &str,
        kind: SectionKind,
        section: &str,
        index: usize,
        line: &str,
        txn: &TransactionRef,
    ) -> ConfResult<()> {
        let object = ObjectRef::nested(index.to_string(), kind.keyword(), section);
        self.manager.scoped(txn)?.run(|doc| {
            doc.section_mut(scope, kind, section)
                .and_then(|s| s.insert_directive(index, line))
                .map_err(|e| translate(e, &object))
        })
    }

    /// Removes the directive at `index` from a section.
    pub fn delete_directive(
        &mut self,
        scope: &str,
        kind: SectionKind,
        section: &str,
        index: usize,
        txn: &TransactionRef,
    ) -> ConfResult<()> {
        let object = ObjectRef::nested(index.to_string(), kind.keyword(), section);
        self.manager.scoped(txn)?.run(|doc| {
            doc.section_mut(scope, kind, section)
                .and_then(|s| s.remove_directive(index))
                .map(drop)
                .map_err(|e| translate(e, &object))
        })
    }
}

impl<D: ConfigDocument> std::fmt::Debug for SpoeClient<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpoeClient")
            .field("master", &self.manager.master().path())
            .field("transactions", &self.manager.list_transactions().len())
            .finish_non_exhaustive()
    }
}

fn section_exists<D: ConfigDocument>(doc: &D, scope: &str, kind: SectionKind, name: &str) -> bool {
    doc.sections(scope, kind)
        .map(|names| names.iter().any(|n| n == name))
        .unwrap_or(false)
}
