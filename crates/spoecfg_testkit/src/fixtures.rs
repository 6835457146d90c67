//! Test fixtures and client helpers.
//!
//! Provides a temporary configuration file and convenience functions for
//! opening clients over it.

use spoecfg_core::{Params, SpoeClient};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A small SPOE configuration at version 1.
pub const SAMPLE_CONFIG: &str = "\
# _version=1
[ip-reputation]
spoe-agent iprep-agent
    messages check-client-ip
    option var-prefix iprep
    timeout hello 2s
    timeout idle  2m
    timeout processing 10ms
    use-backend agents
    log global
spoe-message check-client-ip
    args ip=src
    event on-client-session if ! { src -f /etc/haproxy/whitelist.lst }
spoe-group grp-ip
    messages check-client-ip
";

/// Scope name used in [`SAMPLE_CONFIG`].
pub const SAMPLE_SCOPE: &str = "ip-reputation";

/// A configuration file in a temporary directory.
pub struct TestConfig {
    path: PathBuf,
    _temp_dir: TempDir,
}

impl TestConfig {
    /// Creates a temporary configuration holding [`SAMPLE_CONFIG`].
    pub fn sample() -> Self {
        Self::with_content(SAMPLE_CONFIG)
    }

    /// Creates a temporary configuration holding `content`.
    pub fn with_content(content: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("spoe.cfg");
        fs::write(&path, content).expect("Failed to write configuration");
        Self {
            path,
            _temp_dir: temp_dir,
        }
    }

    /// Returns the configuration file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the default transaction directory.
    pub fn transaction_dir(&self) -> PathBuf {
        self.params().resolved_transaction_dir()
    }

    /// Returns default parameters for this configuration.
    pub fn params(&self) -> Params {
        Params::new(&self.path)
    }

    /// Reads the configuration file as text.
    pub fn contents(&self) -> String {
        fs::read_to_string(&self.path).expect("Failed to read configuration")
    }

    /// Opens a client with default parameters.
    pub fn client(&self) -> SpoeClient {
        self.client_with(self.params())
    }

    /// Opens a client with `params`.
    pub fn client_with(&self, params: Params) -> SpoeClient {
        SpoeClient::open(params).expect("Failed to open client")
    }
}

/// Runs a test with a client over a temporary copy of [`SAMPLE_CONFIG`].
///
/// # Example
///
/// ```rust,ignore
/// use spoecfg_testkit::with_temp_client;
///
/// #[test]
/// fn my_test() {
///     with_temp_client(|client| {
///         assert_eq!(client.current_version(None).unwrap().as_i64(), 1);
///     });
/// }
/// ```
pub fn with_temp_client<F, R>(f: F) -> R
where
    F: FnOnce(&mut SpoeClient) -> R,
{
    let config = TestConfig::sample();
    let mut client = config.client();
    f(&mut client)
}

/// Lists the transaction files in `dir`, sorted. Hidden files are skipped
/// and a missing directory is empty.
pub fn transaction_files(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(Result::ok)
        .filter(|e| e.path().is_file())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| !name.starts_with('.'))
        .collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use spoecfg_document::SectionKind;

    #[test]
    fn sample_loads() {
        with_temp_client(|client| {
            assert_eq!(client.current_version(None).unwrap().as_i64(), 1);
            assert_eq!(
                client
                    .list_sections(SAMPLE_SCOPE, SectionKind::Agent, None)
                    .unwrap(),
                vec!["iprep-agent"]
            );
        });
    }

    #[test]
    fn transaction_dir_next_to_config() {
        let config = TestConfig::sample();
        assert_eq!(config.transaction_dir().parent(), config.path().parent());
        assert!(transaction_files(&config.transaction_dir()).is_empty());
    }
}
