//! Master configuration backups.
//!
//! Before master is overwritten, the current file is copied next to it as
//! `<config>.<version>`. Only the newest `keep` versions are retained.
//! Backups are best-effort: failures are logged and never block a write.

use crate::types::Version;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Returns the backup path of `config` for `version`.
#[must_use]
pub fn backup_path(config: &Path, version: Version) -> PathBuf {
    let mut name = OsString::from(config.as_os_str());
    name.push(format!(".{version}"));
    PathBuf::from(name)
}

/// Copies the current master file to its versioned backup and prunes the
/// backup that fell out of the retention window.
///
/// Returns the path of the new backup, or `None` if nothing was written.
pub fn backup_master(config: &Path, version: Version, keep: usize) -> Option<PathBuf> {
    if keep == 0 || !config.exists() {
        return None;
    }

    let backup = backup_path(config, version);
    if let Err(e) = fs::copy(config, &backup) {
        warn!(path = %backup.display(), error = %e, "cannot write configuration backup");
        return None;
    }
    debug!(path = %backup.display(), "configuration backup written");

    let stale = version.as_i64() - keep as i64;
    if stale > 0 {
        let old = backup_path(config, Version::new(stale));
        if old.exists() {
            if let Err(e) = fs::remove_file(&old) {
                warn!(path = %old.display(), error = %e, "cannot remove old configuration backup");
            }
        }
    }

    Some(backup)
}
