//! The master configuration.

use crate::backup;
use crate::error::{ConfError, ConfResult};
use crate::translate::{translate, ObjectRef};
use crate::types::Version;
use crate::version;
use spoecfg_document::{ConfigDocument, Section, SectionKind};
use std::path::{Path, PathBuf};
use tracing::debug;

/// The live configuration document and the file it is persisted to.
///
/// There is one store per client. Its content changes as a whole only when a
/// transaction is committed. Its version moves on each commit and through
/// [`ConfigurationStore::increment_version`].
#[derive(Debug)]
pub struct ConfigurationStore<D> {
    handle: D,
    path: PathBuf,
    backups_number: usize,
}

impl<D: ConfigDocument> ConfigurationStore<D> {
    /// Loads master from `path`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigRead` if the file cannot be read or parsed.
    pub fn load(path: impl Into<PathBuf>) -> ConfResult<Self> {
        let path = path.into();
        let handle = D::load(&path).map_err(|_| ConfError::config_read(path.display()))?;
        Ok(Self {
            handle,
            path,
            backups_number: 0,
        })
    }

    /// Keeps `n` versioned backups of the master file on every commit.
    #[must_use]
    pub fn with_backups(mut self, n: usize) -> Self {
        self.backups_number = n;
        self
    }

    /// Returns the master file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the master document.
    #[must_use]
    pub fn document(&self) -> &D {
        &self.handle
    }

    /// Returns the master document for direct edits.
    ///
    /// Direct edits bypass transactions and are not persisted until
    /// [`ConfigurationStore::save`] is called.
    pub fn document_mut(&mut self) -> &mut D {
        &mut self.handle
    }

    /// Reloads master from its file, replacing in-memory content.
    pub fn reload(&mut self) -> ConfResult<()> {
        self.handle =
            D::load(&self.path).map_err(|_| ConfError::config_read(self.path.display()))?;
        Ok(())
    }

    /// Saves master to its own file.
    pub fn save(&self) -> ConfResult<()> {
        self.save_to(&self.path)
    }

    /// Saves master to another file.
    pub fn save_to(&self, path: &Path) -> ConfResult<()> {
        self.handle.save(path).map_err(|e| ConfError::config_write(e))
    }

    /// Lists the sections of `kind` in `scope`.
    pub fn sections(&self, scope: &str, kind: SectionKind) -> ConfResult<Vec<String>> {
        self.handle
            .sections(scope, kind)
            .map_err(|e| translate(e, &ObjectRef::new(scope)))
    }

    /// Returns a section.
    pub fn section(&self, scope: &str, kind: SectionKind, name: &str) -> ConfResult<&Section> {
        self.handle
            .section(scope, kind, name)
            .map_err(|e| translate(e, &ObjectRef::new(name)))
    }

    /// Replaces an existing section in memory.
    pub fn set_section(&mut self, scope: &str, kind: SectionKind, section: Section) -> ConfResult<()> {
        let object = ObjectRef::new(section.name.clone());
        self.handle
            .set_section(scope, kind, section)
            .map_err(|e| translate(e, &object))
    }

    /// Deletes a section in memory.
    pub fn delete_section(&mut self, scope: &str, kind: SectionKind, name: &str) -> ConfResult<()> {
        self.handle
            .delete_section(scope, kind, name)
            .map_err(|e| translate(e, &ObjectRef::new(name)))
    }

    /// Returns master's version.
    pub fn current_version(&self) -> ConfResult<Version> {
        version::read(&self.handle)
    }

    /// Increments master's version by one and persists master.
    ///
    /// # Errors
    ///
    /// Returns `VersionWrite` if master cannot be saved; the version is then
    /// unchanged.
    pub fn increment_version(&mut self) -> ConfResult<Version> {
        version::increment(&mut self.handle, &self.path)
    }

    /// Persists `staged` as the new master file and swaps it in.
    ///
    /// On failure master is untouched and `staged` is handed back.
    pub(crate) fn replace(&mut self, staged: D) -> Result<(), (D, ConfError)> {
        if let Ok(current) = self.current_version() {
            backup::backup_master(&self.path, current, self.backups_number);
        }
        if let Err(e) = staged.save(&self.path) {
            return Err((staged, ConfError::config_write(e)));
        }
        self.handle = staged;
        debug!(path = %self.path.display(), "master configuration replaced");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spoecfg_document::SpoeDocument;
    use std::fs;
    use tempfile::tempdir;

    const MASTER: &str = "# _version=3\n[spoe-test]\nspoe-agent agent1\n    timeout hello 2s\n";

    fn setup() -> (tempfile::TempDir, ConfigurationStore<SpoeDocument>) {
        let temp = tempdir().unwrap();
        let path = temp.path().join("spoe.cfg");
        fs::write(&path, MASTER).unwrap();
        let store = ConfigurationStore::load(&path).unwrap();
        (temp, store)
    }

    #[test]
    fn load_reports_read_error() {
        let temp = tempdir().unwrap();
        let bad = temp.path().join("bad.cfg");
        fs::write(&bad, "not a section\n").unwrap();

        let result = ConfigurationStore::<SpoeDocument>::load(&bad);
        assert!(matches!(result, Err(ConfError::ConfigRead { .. })));

        let result = ConfigurationStore::<SpoeDocument>::load(temp.path().join("none.cfg"));
        assert!(matches!(result, Err(ConfError::ConfigRead { .. })));
    }

    #[test]
    fn increment_version_persists() {
        let (_temp, mut store) = setup();
        assert_eq!(store.current_version().unwrap(), Version::new(3));

        store.increment_version().unwrap();
        assert_eq!(store.current_version().unwrap(), Version::new(4));

        store.reload().unwrap();
        assert_eq!(store.current_version().unwrap(), Version::new(4));
    }

    #[test]
    fn section_errors_are_translated() {
        let (_temp, mut store) = setup();
        assert!(matches!(
            store.section("spoe-test", SectionKind::Agent, "nope"),
            Err(ConfError::ObjectNotFound { .. })
        ));
        assert!(matches!(
            store.sections("missing", SectionKind::Agent),
            Err(ConfError::ObjectNotFound { .. })
        ));

        store
            .delete_section("spoe-test", SectionKind::Agent, "agent1")
            .unwrap();
        assert!(store
            .sections("spoe-test", SectionKind::Agent)
            .unwrap()
            .is_empty());

        // Direct edits stay in memory until saved.
        store.reload().unwrap();
        assert_eq!(
            store.sections("spoe-test", SectionKind::Agent).unwrap(),
            vec!["agent1"]
        );
    }

    #[test]
    fn replace_writes_backup() {
        let (temp, store) = setup();
        let mut store = store.with_backups(2);

        let mut staged = SpoeDocument::load(store.path()).unwrap();
        staged
            .create_section("spoe-test", SectionKind::Group, Section::new("g"))
            .unwrap();

        assert!(store.replace(staged).is_ok());
        assert_eq!(
            store.sections("spoe-test", SectionKind::Group).unwrap(),
            vec!["g"]
        );
        assert!(temp.path().join("spoe.cfg.3").exists());

        let on_disk = SpoeDocument::load(store.path()).unwrap();
        assert_eq!(&on_disk, store.document());
    }
}
