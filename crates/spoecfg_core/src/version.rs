//! Version marker protocol.
//!
//! Every document carries a version marker. Master's marker moves one step
//! at a time, on every commit and on every explicit [`increment`], and only
//! when the incremented document has been written in full.

use crate::error::{ConfError, ConfResult};
use crate::types::Version;
use spoecfg_document::ConfigDocument;
use std::path::Path;
use tracing::info;

/// Reads the version marker of a document.
pub fn read<D: ConfigDocument>(doc: &D) -> ConfResult<Version> {
    doc.version().map(Version::new).map_err(|e| ConfError::version_read(e))
}

/// Reads the version marker of a document stored in a file.
///
/// Used for transactions that are not staged, such as failed ones.
pub fn read_file<D: ConfigDocument>(path: &Path) -> ConfResult<Version> {
    let doc = D::load(path).map_err(|_| ConfError::config_read(path.display()))?;
    read(&doc)
}

/// Checks the caller's expected version against the actual one.
pub fn check(expected: Version, actual: Version) -> ConfResult<()> {
    if expected != actual {
        return Err(ConfError::version_mismatch(expected.as_i64(), actual.as_i64()));
    }
    Ok(())
}

/// Returns the version after `current`.
///
/// # Errors
///
/// Returns `VersionWrite` if `current` is the largest representable version.
pub fn following(current: Version) -> ConfResult<Version> {
    current
        .next()
        .ok_or_else(|| ConfError::version_write(format!("version {current} cannot be incremented")))
}

/// Increments the marker by one and saves the whole document to `path`.
///
/// On a failed save the in-memory marker is restored, so a failure changes
/// nothing.
pub fn increment<D: ConfigDocument>(doc: &mut D, path: &Path) -> ConfResult<Version> {
    let current = read(doc)?;
    let next = following(current)?;
    doc.set_version(next.as_i64());

    if let Err(e) = doc.save(path) {
        doc.set_version(current.as_i64());
        return Err(ConfError::version_write(e));
    }

    info!(version = next.as_i64(), path = %path.display(), "configuration version incremented");
    Ok(next)
}
