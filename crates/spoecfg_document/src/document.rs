//! Configuration document trait definition.

use crate::error::DocumentResult;
use crate::section::{Section, SectionKind};
use std::path::Path;

/// A parsed, in-memory configuration document.
///
/// Documents are **opaque handles** to the transaction engine: it loads them,
/// saves them, edits named sections and reads the version marker, but never
/// looks at the underlying text.
///
/// # Invariants
///
/// - After a successful `load`, `version()` succeeds and reports the revision
///   the document was loaded from.
/// - `save` followed by `load` yields identical scopes, sections and version.
/// - A failed mutation leaves the document unchanged.
///
/// # Implementors
///
/// - [`super::SpoeDocument`] - The SPOE text format
pub trait ConfigDocument: Send + Sync + Sized {
    /// Loads a document from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    fn load(path: &Path) -> DocumentResult<Self>;

    /// Saves the whole document to a file.
    ///
    /// Either the complete document is written or the previous file is left
    /// in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    fn save(&self, path: &Path) -> DocumentResult<()>;

    /// Returns the scope names in document order.
    fn scopes(&self) -> Vec<String>;

    /// Creates an empty scope.
    ///
    /// # Errors
    ///
    /// Returns `ScopeAlreadyExists` if the scope is already present.
    fn create_scope(&mut self, scope: &str) -> DocumentResult<()>;

    /// Deletes a scope and every section in it.
    ///
    /// # Errors
    ///
    /// Returns `ScopeMissing` if the scope does not exist.
    fn delete_scope(&mut self, scope: &str) -> DocumentResult<()>;

    /// Lists the names of all sections of `kind` in `scope`.
    ///
    /// # Errors
    ///
    /// Returns `Fetch` if the scope does not exist.
    fn sections(&self, scope: &str, kind: SectionKind) -> DocumentResult<Vec<String>>;

    /// Returns a section.
    ///
    /// # Errors
    ///
    /// Returns `SectionMissing` if the section (or its scope) does not exist.
    fn section(&self, scope: &str, kind: SectionKind, name: &str) -> DocumentResult<&Section>;

    /// Returns a section for in-place editing.
    ///
    /// # Errors
    ///
    /// Returns `SectionMissing` if the section (or its scope) does not exist.
    fn section_mut(
        &mut self,
        scope: &str,
        kind: SectionKind,
        name: &str,
    ) -> DocumentResult<&mut Section>;

    /// Adds a new section, creating the scope if needed.
    ///
    /// # Errors
    ///
    /// Returns `SectionAlreadyExists` if a section with that kind and name
    /// is already present in the scope.
    fn create_section(
        &mut self,
        scope: &str,
        kind: SectionKind,
        section: Section,
    ) -> DocumentResult<()>;

    /// Replaces an existing section with the same name.
    ///
    /// # Errors
    ///
    /// Returns `SectionMissing` if no such section exists.
    fn set_section(&mut self, scope: &str, kind: SectionKind, section: Section)
        -> DocumentResult<()>;

    /// Deletes a section.
    ///
    /// # Errors
    ///
    /// Returns `SectionMissing` if no such section exists.
    fn delete_section(&mut self, scope: &str, kind: SectionKind, name: &str)
        -> DocumentResult<()>;

    /// Returns the version marker.
    ///
    /// # Errors
    ///
    /// Returns an error if the document carries no readable marker.
    fn version(&self) -> DocumentResult<i64>;

    /// Sets the version marker.
    fn set_version(&mut self, version: i64);
}
